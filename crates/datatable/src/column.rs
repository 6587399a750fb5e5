use crate::{FieldKind, Row, TableError, lookup};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// How one column projects a row and whether its header sorts.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    label: String,
    field: Option<String>,
    kind: FieldKind,
    sort_key: Option<String>,
    align: Align,
}

impl ColumnDescriptor {
    /// Column reading a (dotted) field of the row.
    pub fn field(label: impl Into<String>, field: impl Into<String>) -> ColumnBuilder {
        ColumnBuilder {
            label: label.into(),
            field: Some(field.into()),
            kind: FieldKind::Text,
            sort_key: None,
            sortable: false,
            align: Align::Left,
        }
    }

    /// Column computed from the whole row.
    pub fn computed(
        label: impl Into<String>,
        f: impl Fn(&Row) -> String + Send + Sync + 'static,
    ) -> ColumnBuilder {
        ColumnBuilder {
            label: label.into(),
            field: None,
            kind: FieldKind::computed(f),
            sort_key: None,
            sortable: false,
            align: Align::Left,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Resolved sort key; `None` means the header does not sort.
    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub fn is_sortable(&self) -> bool {
        self.sort_key.is_some()
    }

    pub fn align(&self) -> Align {
        self.align
    }

    pub fn render(&self, row: &Row) -> String {
        let value = self.field.as_deref().and_then(|field| lookup(row, field));
        self.kind.render(value, row)
    }
}

#[derive(Debug)]
pub struct ColumnBuilder {
    label: String,
    field: Option<String>,
    kind: FieldKind,
    sort_key: Option<String>,
    sortable: bool,
    align: Align,
}

impl ColumnBuilder {
    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sorts by the field name unless an explicit key is given.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn sort_key(mut self, key: impl Into<String>) -> Self {
        self.sort_key = Some(key.into());
        self.sortable = true;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn build(self) -> Result<ColumnDescriptor, TableError> {
        let sort_key = if self.sortable {
            let key = self.sort_key.or_else(|| self.field.clone());
            match key {
                Some(key) if !key.trim().is_empty() => Some(key),
                _ => return Err(TableError::UnresolvedSortKey(self.label)),
            }
        } else {
            None
        };

        Ok(ColumnDescriptor {
            label: self.label,
            field: self.field,
            kind: self.kind,
            sort_key,
            align: self.align,
        })
    }
}
