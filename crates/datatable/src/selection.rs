use std::collections::BTreeSet;

use crate::{IdentityAccessor, Row, RowId};

/// Selected row identities, always a subset of the visible page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RowId>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &RowId> {
        self.ids.iter()
    }

    /// Selects every row of the visible page (never other pages).
    pub fn select_all(&mut self, rows: &[Row], identity: &IdentityAccessor) {
        self.ids = rows.iter().filter_map(|row| identity.identify(row)).collect();
    }

    pub fn select_none(&mut self) {
        self.ids.clear();
    }

    /// Flips one row. Returns `false` when `id` is not on the visible page.
    pub fn toggle(&mut self, id: &RowId, rows: &[Row], identity: &IdentityAccessor) -> bool {
        if !self.ids.remove(id) {
            let visible = rows
                .iter()
                .any(|row| identity.identify(row).as_ref() == Some(id));
            if !visible {
                return false;
            }
            self.ids.insert(id.clone());
        }
        true
    }

    pub fn is_selected(&self, row: &Row, identity: &IdentityAccessor) -> bool {
        identity
            .identify(row)
            .is_some_and(|id| self.ids.contains(&id))
    }

    /// True iff the page is non-empty and every visible row is selected.
    pub fn all_visible_selected(&self, rows: &[Row], identity: &IdentityAccessor) -> bool {
        !rows.is_empty() && rows.iter().all(|row| self.is_selected(row, identity))
    }

    /// Selected rows in page order.
    pub fn selected_rows<'a>(&self, rows: &'a [Row], identity: &IdentityAccessor) -> Vec<&'a Row> {
        rows.iter()
            .filter(|row| self.is_selected(row, identity))
            .collect()
    }

    /// Drops identities that are no longer visible.
    pub fn retain_visible(&mut self, rows: &[Row], identity: &IdentityAccessor) {
        let visible: BTreeSet<RowId> = rows
            .iter()
            .filter_map(|row| identity.identify(row))
            .collect();
        self.ids.retain(|id| visible.contains(id));
    }
}
