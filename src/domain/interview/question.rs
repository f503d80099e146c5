//! Question value object handed to the interviewee.

use serde::{Deserialize, Serialize};

use super::FieldValue;

/// How a question expects to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Text,
    Choice,
    MultipleChoice,
    Scale,
    Number,
    Ranking,
}

impl QuestionType {
    /// True for types that present a fixed option list.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Choice | Self::MultipleChoice | Self::Ranking)
    }
}

/// A single question, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

fn default_required() -> bool {
    true
}

impl Question {
    /// Creates a required question without options or schema links.
    pub fn new(id: impl Into<String>, text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            question_type,
            options: Vec::new(),
            required: true,
            field_id: None,
            theme_id: None,
            theme_name: None,
            hint: None,
        }
    }

    /// Creates an open-text question.
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, QuestionType::Text)
    }

    /// Creates a single-choice question.
    pub fn choice<I, S>(id: impl Into<String>, text: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, text, QuestionType::Choice).with_options(options)
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Links the question to a schema field.
    pub fn with_field(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    pub fn with_theme(mut self, theme_id: impl Into<String>, theme_name: impl Into<String>) -> Self {
        self.theme_id = Some(theme_id.into());
        self.theme_name = Some(theme_name.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Returns a copy with different wording, keeping id and links.
    pub fn reworded(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    /// Turns raw user input into a typed answer for this question.
    ///
    /// Choice questions accept a 1-based option number or the option text
    /// (case-insensitive). Multiple choice and ranking split on commas.
    /// Numeric types keep the raw input next to the parsed number.
    pub fn interpret_answer(&self, raw: &str) -> FieldValue {
        let raw = raw.trim();
        match self.question_type {
            QuestionType::Text => FieldValue::scalar(raw),
            QuestionType::Choice => FieldValue::scalar(self.resolve_option(raw)),
            QuestionType::MultipleChoice | QuestionType::Ranking => FieldValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| self.resolve_option(part))
                    .collect(),
            ),
            QuestionType::Scale | QuestionType::Number => match leading_integer(raw) {
                Some(number) if number.to_string() != raw => {
                    FieldValue::structured(raw, number.to_string())
                }
                _ => FieldValue::scalar(raw),
            },
        }
    }

    fn resolve_option(&self, input: &str) -> String {
        if let Ok(index) = input.parse::<usize>() {
            if let Some(option) = index.checked_sub(1).and_then(|i| self.options.get(i)) {
                return option.clone();
            }
        }
        self.options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(input))
            .cloned()
            .unwrap_or_else(|| input.to_string())
    }
}

/// A question paired with the answer it received, in the order asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub question_text: String,
    pub answer: String,
}

/// First integer appearing in the text, e.g. `"about 4 people"` → 4.
fn leading_integer(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let negative = text[..start].ends_with('-');
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
