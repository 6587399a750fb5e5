//! Filter form and the pipeline turning its values into a table reload.
use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::{FieldKind, SelectOption, TableHandle, field::parse_toggle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Null,
}

impl FilterValue {
    /// Empty text, `false` and `null` are blank and never sent.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(flag) => !flag,
            Self::Null => true,
        }
    }

    pub fn to_param(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Self::Text(text) => Some(text.trim().to_string()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Null => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Bool(flag) => flag.to_string(),
            Self::Null => String::new(),
        }
    }
}

pub type FilterValues = BTreeMap<String, FilterValue>;

/// Drops blank values and renders the rest as query parameters.
pub fn clean(values: &FilterValues) -> BTreeMap<String, String> {
    values
        .iter()
        .filter_map(|(key, value)| value.to_param().map(|param| (key.clone(), param)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct FilterField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FilterField {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn toggle(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Toggle)
    }

    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::new(name, label, FieldKind::Select(options))
    }

    pub fn date(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    fn blank(&self) -> FilterValue {
        match self.kind {
            FieldKind::Toggle => FilterValue::Bool(false),
            _ => FilterValue::Text(String::new()),
        }
    }
}

/// State of a filter sidebar: declared fields, their empty defaults and the
/// values being edited.
#[derive(Debug, Clone)]
pub struct FilterForm {
    fields: Vec<FilterField>,
    defaults: FilterValues,
    values: FilterValues,
    focus: usize,
}

impl FilterForm {
    /// Fields missing from `defaults` default to blank.
    pub fn new(fields: Vec<FilterField>, mut defaults: FilterValues) -> Self {
        for field in &fields {
            defaults
                .entry(field.name.clone())
                .or_insert_with(|| field.blank());
        }
        Self {
            values: defaults.clone(),
            fields,
            defaults,
            focus: 0,
        }
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn defaults(&self) -> &FilterValues {
        &self.defaults
    }

    pub fn values(&self) -> &FilterValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FilterValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: FilterValue) {
        if self.fields.iter().any(|field| field.name == name) {
            self.values.insert(name.to_string(), value);
        }
    }

    /// Sets a field from raw input text, interpreted by its kind.
    pub fn set_input(&mut self, name: &str, raw: &str) {
        let Some(field) = self.fields.iter().find(|field| field.name == name) else {
            return;
        };
        let value = match field.kind {
            FieldKind::Toggle => FilterValue::Bool(parse_toggle(raw).unwrap_or(false)),
            _ => FilterValue::Text(raw.to_string()),
        };
        self.values.insert(name.to_string(), value);
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> Option<&FilterField> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, ch: char) {
        let Some(field) = self.fields.get(self.focus) else {
            return;
        };
        if let FieldKind::Text | FieldKind::Number | FieldKind::Date = field.kind {
            let name = field.name.clone();
            let mut text = self.values.get(&name).map(FilterValue::as_text).unwrap_or_default();
            text.push(ch);
            self.values.insert(name, FilterValue::Text(text));
        }
    }

    pub fn pop_char(&mut self) {
        let Some(field) = self.fields.get(self.focus) else {
            return;
        };
        if let FieldKind::Text | FieldKind::Number | FieldKind::Date = field.kind {
            let name = field.name.clone();
            let mut text = self.values.get(&name).map(FilterValue::as_text).unwrap_or_default();
            text.pop();
            self.values.insert(name, FilterValue::Text(text));
        }
    }

    /// Flips a toggle or cycles a select (blank, then each option).
    pub fn cycle_focused(&mut self) {
        let Some(field) = self.fields.get(self.focus) else {
            return;
        };
        let name = field.name.clone();
        let next = match &field.kind {
            FieldKind::Toggle => {
                let on = matches!(self.values.get(&name), Some(FilterValue::Bool(true)));
                FilterValue::Bool(!on)
            }
            FieldKind::Select(options) => {
                let current = self.values.get(&name).map(FilterValue::as_text).unwrap_or_default();
                let position = options.iter().position(|option| option.value == current);
                let next = match position {
                    None => options.first(),
                    Some(index) => options.get(index + 1),
                };
                FilterValue::Text(next.map(|option| option.value.clone()).unwrap_or_default())
            }
            _ => return,
        };
        self.values.insert(name, next);
    }

    /// Per-field problems with the current values (e.g. malformed dates).
    pub fn validate(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|field| {
                let FilterValue::Text(text) = self.values.get(&field.name)? else {
                    return None;
                };
                if text.trim().is_empty() || !field.kind.is_editable() {
                    return None;
                }
                field
                    .kind
                    .parse(text)
                    .err()
                    .map(|err| (field.name.clone(), err))
            })
            .collect()
    }

    /// Raw values to hand to the "on filter" handler.
    pub fn submit(&self) -> FilterValues {
        self.values.clone()
    }

    /// Resets to the declared defaults and returns them, so the caller runs
    /// the same pipeline as for a submit.
    pub fn clear(&mut self) -> FilterValues {
        self.values = self.defaults.clone();
        self.values.clone()
    }
}

/// Outcome of running filter values through a [`FilterPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFilter {
    /// Cleaned parameters, scoping included.
    pub params: BTreeMap<String, String>,
    /// Whether the submission differs from the form's empty defaults.
    pub has_active_filters: bool,
    /// Resource path with the encoded query string, as passed to `reload`.
    pub target: String,
}

/// Stock "on filter" handler: cleans the values, adds scoping parameters,
/// compares against the defaults and reloads the table.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    resource: String,
    defaults: FilterValues,
    scope: BTreeMap<String, String>,
}

impl FilterPipeline {
    pub fn new(resource: impl Into<String>, defaults: FilterValues) -> Self {
        Self {
            resource: resource.into(),
            defaults,
            scope: BTreeMap::new(),
        }
    }

    /// Parameter sent with every filter, e.g. the owning user.
    pub fn with_scope(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.insert(key.into(), value.into());
        self
    }

    pub fn build(&self, values: &FilterValues) -> AppliedFilter {
        let cleaned = clean(values);
        let has_active_filters = cleaned != clean(&self.defaults);

        let mut params = cleaned;
        for (key, value) in &self.scope {
            params.insert(key.clone(), value.clone());
        }

        let target = if params.is_empty() {
            self.resource.clone()
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter())
                .finish();
            format!("{}?{query}", self.resource)
        };

        AppliedFilter {
            params,
            has_active_filters,
            target,
        }
    }

    pub async fn apply<H: TableHandle>(
        &self,
        handle: &mut H,
        values: &FilterValues,
    ) -> AppliedFilter {
        let applied = self.build(values);
        tracing::debug!("applying filter {}", applied.target);
        handle.reload(Some(&applied.target)).await;
        applied
    }
}
