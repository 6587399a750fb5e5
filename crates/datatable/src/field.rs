//! Field kinds shared by columns, filter fields and form fields.
//!
//! Every kind carries one render strategy (row value to display text) and one
//! parse strategy (user input to JSON value). The kind is picked when the
//! descriptor is built, never per render.
use std::{fmt, sync::Arc};

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::Row;

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Clone)]
pub enum FieldKind {
    Text,
    /// Whole number, sent as a JSON number.
    Number,
    Toggle,
    Select(Vec<SelectOption>),
    Date,
    File,
    /// Read-only projection of the whole row.
    Computed(Arc<dyn Fn(&Row) -> String + Send + Sync>),
}

impl FieldKind {
    pub fn computed(f: impl Fn(&Row) -> String + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Computed(_))
    }

    /// Display text for `value`, the field value looked up in `row`.
    pub fn render(&self, value: Option<&Value>, row: &Row) -> String {
        match self {
            Self::Computed(f) => f(row),
            Self::Text | Self::Number => value.map(plain_text).unwrap_or_default(),
            Self::Toggle => match value {
                Some(Value::Bool(true)) => "yes".to_string(),
                Some(Value::Bool(false)) => "no".to_string(),
                other => other.map(plain_text).unwrap_or_default(),
            },
            Self::Select(options) => {
                let raw = value.map(plain_text).unwrap_or_default();
                options
                    .iter()
                    .find(|option| option.value == raw)
                    .map(|option| option.label.clone())
                    .unwrap_or(raw)
            }
            Self::Date => {
                let raw = value.map(plain_text).unwrap_or_default();
                if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
                    return ts.format(DATE_DISPLAY_FORMAT).to_string();
                }
                raw
            }
            Self::File => {
                let raw = value.map(plain_text).unwrap_or_default();
                raw.rsplit('/').next().unwrap_or_default().to_string()
            }
        }
    }

    /// Raw input text used to pre-fill an edit form.
    pub fn input_text(&self, value: Option<&Value>) -> String {
        match self {
            Self::Computed(_) => String::new(),
            Self::Toggle => match value {
                Some(Value::Bool(true)) => "yes".to_string(),
                _ => "no".to_string(),
            },
            Self::Date => {
                let raw = value.map(plain_text).unwrap_or_default();
                match DateTime::parse_from_rfc3339(&raw) {
                    Ok(ts) => ts.format(DATE_INPUT_FORMAT).to_string(),
                    Err(_) => raw,
                }
            }
            Self::Text | Self::Number | Self::Select(_) | Self::File => {
                value.map(plain_text).unwrap_or_default()
            }
        }
    }

    /// Parses user input. Blank input becomes `null`, except for toggles.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        match self {
            Self::Computed(_) => Err("read-only field".to_string()),
            Self::Toggle => parse_toggle(raw).map(Value::Bool),
            _ if raw.is_empty() => Ok(Value::Null),
            Self::Text | Self::File => Ok(Value::String(raw.to_string())),
            Self::Number => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| "expected a whole number".to_string()),
            Self::Select(options) => options
                .iter()
                .find(|option| option.value == raw || option.label.eq_ignore_ascii_case(raw))
                .map(|option| Value::String(option.value.clone()))
                .ok_or_else(|| {
                    let allowed: Vec<&str> =
                        options.iter().map(|option| option.value.as_str()).collect();
                    format!("must be one of: {}", allowed.join(", "))
                }),
            Self::Date => NaiveDate::parse_from_str(raw, DATE_INPUT_FORMAT)
                .map(|date| Value::String(date.format(DATE_INPUT_FORMAT).to_string()))
                .map_err(|_| "expected a date as YYYY-MM-DD".to_string()),
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("Text"),
            Self::Number => f.write_str("Number"),
            Self::Toggle => f.write_str("Toggle"),
            Self::Select(options) => f.debug_tuple("Select").field(options).finish(),
            Self::Date => f.write_str("Date"),
            Self::File => f.write_str("File"),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

pub(crate) fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "" | "false" | "no" | "n" | "0" | "off" => Ok(false),
        _ => Err("expected yes or no".to_string()),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(plain_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}
