//! Generic paginated table over a REST resource.
//!
//! The crate is split the same way the console composes a screen:
//!
//! - [`DataSource`] turns a [`QueryState`] into one GET and normalizes the
//!   answer into a [`PageEnvelope`].
//! - [`TableController`] owns pagination, sort and selection for one table.
//! - [`Selection`] tracks selected row identities on the visible page.
//! - [`CrudOrchestrator`] wires create/edit/delete dialogs to a [`TableHandle`].
//! - [`FilterForm`] and [`FilterPipeline`] turn an arbitrary filter field set
//!   into a `reload` of the table.
use std::{fmt, sync::Arc};

use serde_json::Value;

pub use backend::{Backend, HttpBackend};
pub use column::{Align, ColumnBuilder, ColumnDescriptor};
pub use controller::{FetchRequest, TableController, TableStatus};
pub use crud::{
    CrudOrchestrator, DeleteOutcome, Dialog, FormDialog, FormField, FormMode, Notice, NoticeLevel,
    Notices,
};
pub use error::{ClientError, TableError};
pub use field::{FieldKind, SelectOption};
pub use filter::{AppliedFilter, FilterField, FilterForm, FilterPipeline, FilterValue, FilterValues};
pub use page::PageEnvelope;
pub use query::{QueryState, Sort, SortDirection};
pub use selection::Selection;
pub use source::{DataSource, FetchFailure};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use table::{DataTable, TableHandle};

mod backend;
mod column;
mod controller;
mod crud;
mod error;
mod field;
mod filter;
mod page;
mod query;
mod selection;
mod source;
pub mod store;
mod table;

/// A record as returned by the backend. The table never enforces a schema.
pub type Row = Value;

/// Identity of a row, normalized to its string rendering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strings are taken verbatim and numbers by their decimal rendering;
    /// anything else has no identity.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) if !id.is_empty() => Some(Self(id.clone())),
            Value::Number(id) => Some(Self(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the identity of a row.
#[derive(Clone)]
pub enum IdentityAccessor {
    /// Field path, dotted for nested objects (`owner.id`).
    Field(String),
    Custom(Arc<dyn Fn(&Row) -> Option<RowId> + Send + Sync>),
}

impl IdentityAccessor {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn custom(f: impl Fn(&Row) -> Option<RowId> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn identify(&self, row: &Row) -> Option<RowId> {
        match self {
            Self::Field(path) => lookup(row, path).and_then(RowId::from_value),
            Self::Custom(f) => f(row),
        }
    }
}

impl Default for IdentityAccessor {
    fn default() -> Self {
        Self::Field("id".to_string())
    }
}

impl fmt::Debug for IdentityAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Resolves a dotted field path inside a row.
pub fn lookup<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let pointer = format!("/{}", path.replace('.', "/"));
    row.pointer(&pointer)
}
