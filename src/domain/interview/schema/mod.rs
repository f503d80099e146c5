//! Per-role question schemas.
//!
//! A schema is an ordered list of themes, each an ordered list of field
//! definitions, plus the criteria that decide when the role-specific part of
//! an interview is complete. Schemas are immutable once loaded.

mod condition;
mod store;

pub use condition::{Condition, ConditionOperator, ConditionParseError, FieldCondition};
pub use store::SchemaStore;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{FilledFields, QuestionType, Role};

/// Schema loading and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("no schema configured for role '{0}'")]
    NotFound(Role),

    #[error("failed to read schema {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse schema {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("invalid schema for role '{role}': {reason}")]
    Invalid { role: Role, reason: String },
}

impl SchemaError {
    pub fn invalid(role: Role, reason: impl Into<String>) -> Self {
        Self::Invalid {
            role,
            reason: reason.into(),
        }
    }

    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Lower and upper bound of a scale question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleBounds {
    pub min: i64,
    pub max: i64,
}

/// One answerable item of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "id")]
    pub field_id: String,
    /// Canonical question text, used when no generated wording is available.
    pub question: String,
    #[serde(rename = "type", default)]
    pub field_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<FieldCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FieldDefinition {
    /// Required regardless of other answers.
    pub fn is_unconditionally_required(&self) -> bool {
        self.required && self.conditional.is_none()
    }

    /// Required given the current answers. Conditions are evaluated fresh.
    pub fn is_required_now(&self, filled: &FilledFields) -> bool {
        self.required
            && self
                .conditional
                .as_ref()
                .map_or(true, |condition| condition.is_active(filled))
    }
}

/// A named group of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// When the role-specific phase counts as done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCriteria {
    #[serde(default)]
    pub minimum_required_fields: usize,
    #[serde(default)]
    pub required_themes: Vec<String>,
}

/// Question schema for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSchema {
    pub role: Role,
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub completion_criteria: CompletionCriteria,
}

/// A field definition seen through its theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    pub theme_id: &'a str,
    pub theme_name: &'a str,
    pub definition: &'a FieldDefinition,
}

impl<'a> FieldRef<'a> {
    pub fn field_id(&self) -> &'a str {
        &self.definition.field_id
    }
}

/// Theme overview for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeSummary {
    pub id: String,
    pub name: String,
    pub field_count: usize,
    pub required_count: usize,
}

impl RoleSchema {
    /// Parses and validates a YAML document. JSON input is accepted as well.
    pub fn from_yaml(text: &str, source_name: &str) -> Result<Self, SchemaError> {
        let schema: RoleSchema = serde_yaml::from_str(text)
            .map_err(|e| SchemaError::parse(source_name, e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parses and validates a JSON document.
    pub fn from_json(text: &str, source_name: &str) -> Result<Self, SchemaError> {
        let schema: RoleSchema = serde_json::from_str(text)
            .map_err(|e| SchemaError::parse(source_name, e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Structural checks that would otherwise surface mid-interview.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for field in self.fields() {
            if !seen.insert(field.field_id()) {
                return Err(SchemaError::invalid(
                    self.role,
                    format!("duplicate field id '{}'", field.field_id()),
                ));
            }
        }

        for theme_id in &self.completion_criteria.required_themes {
            if !self.themes.iter().any(|t| &t.id == theme_id) {
                return Err(SchemaError::invalid(
                    self.role,
                    format!("required theme '{}' does not exist", theme_id),
                ));
            }
        }

        for (field_id, condition) in self.conditional_fields() {
            if let Some(parsed) = condition.condition() {
                if !seen.contains(parsed.field_id()) {
                    tracing::warn!(
                        role = %self.role,
                        field_id,
                        references = parsed.field_id(),
                        "condition references a field outside the schema"
                    );
                }
            }
        }
        Ok(())
    }

    /// All fields in theme and declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldRef<'_>> {
        self.themes.iter().flat_map(|theme| {
            theme.fields.iter().map(move |definition| FieldRef {
                theme_id: &theme.id,
                theme_name: &theme.name,
                definition,
            })
        })
    }

    pub fn field(&self, field_id: &str) -> Option<FieldRef<'_>> {
        self.fields().find(|f| f.field_id() == field_id)
    }

    /// Flattened field id → definition map.
    pub fn all_fields(&self) -> BTreeMap<&str, FieldRef<'_>> {
        self.fields().map(|f| (f.field_id(), f)).collect()
    }

    /// Unconditional required fields.
    pub fn required_fields(&self) -> BTreeSet<&str> {
        self.fields()
            .filter(|f| f.definition.is_unconditionally_required())
            .map(|f| f.field_id())
            .collect()
    }

    /// Field id → condition for every conditional field.
    pub fn conditional_fields(&self) -> BTreeMap<&str, &FieldCondition> {
        self.fields()
            .filter_map(|f| f.definition.conditional.as_ref().map(|c| (f.field_id(), c)))
            .collect()
    }

    /// Next required field still lacking a value.
    ///
    /// Unconditional required fields come first, in theme and declaration
    /// order; activated conditional fields follow in the same order.
    /// Optional fields are never selected.
    pub fn next_unfilled_field(&self, filled: &FilledFields) -> Option<FieldRef<'_>> {
        let open = |f: &FieldRef<'_>| !filled.is_filled(f.field_id());
        self.fields()
            .filter(open)
            .find(|f| f.definition.is_unconditionally_required())
            .or_else(|| {
                self.fields()
                    .filter(open)
                    .find(|f| f.definition.conditional.is_some() && f.definition.is_required_now(filled))
            })
    }

    pub fn theme_summaries(&self) -> Vec<ThemeSummary> {
        self.themes
            .iter()
            .map(|theme| ThemeSummary {
                id: theme.id.clone(),
                name: theme.name.clone(),
                field_count: theme.fields.len(),
                required_count: theme.fields.iter().filter(|f| f.required).count(),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Small IT schema: two themes, one conditional field.
    pub const IT_SCHEMA_YAML: &str = r#"
role: it
role_name: IT
completion_criteria:
  minimum_required_fields: 3
  required_themes: [systems]
themes:
  - id: systems
    name: Systems
    fields:
      - id: involved_systems
        question: Which systems are involved?
        required: true
      - id: team_size
        question: How many people maintain them?
        type: number
        required: true
      - id: escalation_process
        question: How are incidents escalated across teams?
        required: true
        conditional: "team_size >= 3"
      - id: favourite_tool
        question: Favourite tool?
  - id: security
    name: Security
    fields:
      - id: access_model
        question: How is access managed?
        type: choice
        options: [Roles, Individual grants]
        required: true
"#;

    pub fn it_schema() -> RoleSchema {
        RoleSchema::from_yaml(IT_SCHEMA_YAML, "fixture").unwrap()
    }
}
