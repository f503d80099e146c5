//! Conditional field expressions.
//!
//! Grammar: `<field_id> <op> <literal>` with `op` one of `contains`, `>=`,
//! `==`, `<`, surrounded by whitespace. Operators are tried in that order, so
//! a literal that itself contains `==` still parses as `contains`. Quotes
//! around the literal are stripped. There is no boolean composition.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::interview::{FieldValue, FilledFields};

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    Contains,
    AtLeast,
    Equals,
    LessThan,
}

impl ConditionOperator {
    /// Operators in parse precedence order.
    const PARSE_ORDER: [ConditionOperator; 4] = [
        ConditionOperator::Contains,
        ConditionOperator::AtLeast,
        ConditionOperator::Equals,
        ConditionOperator::LessThan,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::AtLeast => ">=",
            Self::Equals => "==",
            Self::LessThan => "<",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Self::AtLeast | Self::LessThan)
    }
}

/// Why an expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionParseError {
    #[error("no supported operator in '{0}'")]
    MissingOperator(String),

    #[error("empty field id in '{0}'")]
    EmptyFieldId(String),

    #[error("empty literal in '{0}'")]
    EmptyLiteral(String),

    #[error("numeric comparison needs an integer literal, got '{0}'")]
    NonIntegerLiteral(String),
}

/// A parsed `(field_id, operator, literal)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    field_id: String,
    operator: ConditionOperator,
    literal: String,
    threshold: Option<i64>,
}

impl Condition {
    /// Parses an expression such as `team_size >= 3`.
    pub fn parse(expression: &str) -> Result<Self, ConditionParseError> {
        let expression = expression.trim();
        let (field_id, operator, literal) = ConditionOperator::PARSE_ORDER
            .iter()
            .find_map(|op| {
                let needle = format!(" {} ", op.symbol());
                expression
                    .split_once(needle.as_str())
                    .map(|(left, right)| (left.trim(), *op, right.trim()))
            })
            .ok_or_else(|| ConditionParseError::MissingOperator(expression.to_string()))?;

        if field_id.is_empty() {
            return Err(ConditionParseError::EmptyFieldId(expression.to_string()));
        }
        let literal = strip_quotes(literal);
        if literal.is_empty() {
            return Err(ConditionParseError::EmptyLiteral(expression.to_string()));
        }

        let threshold = if operator.is_numeric() {
            Some(
                literal
                    .parse::<i64>()
                    .map_err(|_| ConditionParseError::NonIntegerLiteral(literal.to_string()))?,
            )
        } else {
            None
        };

        Ok(Self {
            field_id: field_id.to_string(),
            operator,
            literal: literal.to_string(),
            threshold,
        })
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Evaluates against the current field values.
    ///
    /// Numeric comparisons read an absent field as 0 and are false when the
    /// value is not an integer. Text comparisons read an absent field as "".
    pub fn evaluate(&self, filled: &FilledFields) -> bool {
        let value = filled.get(&self.field_id);
        match (self.operator, self.threshold) {
            (ConditionOperator::Contains, _) => {
                value.is_some_and(|v| v.contains(&self.literal))
            }
            (ConditionOperator::Equals, _) => {
                value.is_some_and(|v| v.matches_literal(&self.literal))
            }
            (ConditionOperator::AtLeast, Some(threshold)) => {
                integer_of(value).is_some_and(|n| n >= threshold)
            }
            (ConditionOperator::LessThan, Some(threshold)) => {
                integer_of(value).is_some_and(|n| n < threshold)
            }
            _ => false,
        }
    }
}

fn integer_of(value: Option<&FieldValue>) -> Option<i64> {
    match value {
        None => Some(0),
        Some(v) => v.as_integer(),
    }
}

fn strip_quotes(literal: &str) -> &str {
    literal.trim_matches(|c| c == '\'' || c == '"')
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field_id, self.operator.symbol(), self.literal)
    }
}

/// The `conditional` attribute of a field definition.
///
/// Keeps the source expression for display and the parse result for
/// evaluation. Parsing happens once, when the schema is read; an expression
/// that fails to parse is logged and always evaluates to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldCondition {
    expression: String,
    parsed: Option<Condition>,
}

impl FieldCondition {
    pub fn new(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let parsed = match Condition::parse(&expression) {
            Ok(condition) => Some(condition),
            Err(err) => {
                tracing::warn!(expression = %expression, error = %err, "malformed field condition; treating as false");
                None
            }
        };
        Self { expression, parsed }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.parsed.as_ref()
    }

    pub fn is_malformed(&self) -> bool {
        self.parsed.is_none()
    }

    pub fn is_active(&self, filled: &FilledFields) -> bool {
        self.parsed.as_ref().is_some_and(|c| c.evaluate(filled))
    }
}

impl From<String> for FieldCondition {
    fn from(expression: String) -> Self {
        Self::new(expression)
    }
}

impl From<FieldCondition> for String {
    fn from(condition: FieldCondition) -> Self {
        condition.expression
    }
}
