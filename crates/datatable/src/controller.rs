//! Pagination, sort and selection state for one table.
//!
//! Every state change that needs data returns a [`FetchRequest`]. The caller
//! runs it through a [`DataSource`] and hands the page back with
//! [`TableController::complete_fetch`]. Requests are numbered; only the
//! latest issued one is allowed to land, so a slow response can never
//! overwrite a newer page.
//!
//!  [`DataSource`]: crate::DataSource
use reqwest::Url;

use crate::{
    ColumnDescriptor, IdentityAccessor, PageEnvelope, QueryState, Row, RowId, Selection,
    TableError, query::RESERVED_PARAMS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Idle,
    Loading,
    Loaded,
    Empty,
}

#[derive(Debug, Clone)]
#[must_use = "a fetch request does nothing until it is run and completed"]
pub struct FetchRequest {
    pub seq: u64,
    pub target: Url,
    pub query: QueryState,
}

#[derive(Debug)]
pub struct TableController {
    columns: Vec<ColumnDescriptor>,
    identity: IdentityAccessor,
    target: Url,
    query: QueryState,
    status: TableStatus,
    page: PageEnvelope,
    selection: Selection,
    issued: u64,
}

impl TableController {
    /// `target` is the resource URL; any query string on it becomes the
    /// initial filter set.
    pub fn new(
        target: Url,
        page_size: u64,
        columns: Vec<ColumnDescriptor>,
    ) -> Result<Self, TableError> {
        if page_size == 0 {
            return Err(TableError::ZeroPageSize);
        }
        let mut controller = Self {
            columns,
            identity: IdentityAccessor::default(),
            target: target.clone(),
            query: QueryState::new(page_size),
            status: TableStatus::Idle,
            page: PageEnvelope::empty(0, page_size),
            selection: Selection::default(),
            issued: 0,
        };
        controller.retarget(target);
        Ok(controller)
    }

    pub fn with_identity(mut self, identity: IdentityAccessor) -> Self {
        self.identity = identity;
        self
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn identity(&self) -> &IdentityAccessor {
        &self.identity
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn page(&self) -> &PageEnvelope {
        &self.page
    }

    pub fn rows(&self) -> &[Row] {
        &self.page.items
    }

    pub fn page_count(&self) -> u64 {
        self.page.page_count()
    }

    /// The current page lies past the end of the result set, which happens
    /// when a reload shrinks the result while keeping the page index.
    pub fn is_stranded(&self) -> bool {
        matches!(self.status, TableStatus::Loaded | TableStatus::Empty)
            && (self.page.is_out_of_range()
                || (self.page.items.is_empty()
                    && self.page.total_count == 0
                    && self.query.page_index > 0))
    }

    /// First fetch after the table is shown.
    pub fn mount(&mut self) -> FetchRequest {
        self.begin_fetch()
    }

    /// Enters `Loading`, clears the selection and issues the next request.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.selection.select_none();
        self.issue()
    }

    fn issue(&mut self) -> FetchRequest {
        self.issued += 1;
        self.status = TableStatus::Loading;
        FetchRequest {
            seq: self.issued,
            target: self.target.clone(),
            query: self.query.clone(),
        }
    }

    /// Applies a fetched page. Returns `false` if `seq` is stale and the page
    /// was discarded.
    pub fn complete_fetch(&mut self, seq: u64, page: PageEnvelope) -> bool {
        if seq != self.issued {
            tracing::warn!(
                "discarding stale page response (seq {seq}, latest {})",
                self.issued
            );
            return false;
        }
        self.status = if page.items.is_empty() {
            TableStatus::Empty
        } else {
            TableStatus::Loaded
        };
        self.page = page;
        self.selection.retain_visible(&self.page.items, &self.identity);
        true
    }

    pub fn go_to_page(&mut self, page_index: u64) -> Option<FetchRequest> {
        if page_index == self.query.page_index {
            return None;
        }
        self.query.page_index = page_index;
        Some(self.begin_fetch())
    }

    pub fn next_page(&mut self) -> Option<FetchRequest> {
        let next = self.query.page_index.checked_add(1)?;
        if next >= self.page_count() {
            return None;
        }
        self.go_to_page(next)
    }

    pub fn prev_page(&mut self) -> Option<FetchRequest> {
        let prev = self.query.page_index.checked_sub(1)?;
        self.go_to_page(prev)
    }

    pub fn go_to_last_page(&mut self) -> Option<FetchRequest> {
        let last = self.page_count().saturating_sub(1);
        self.go_to_page(last)
    }

    /// Changing the page size restarts from the first page.
    pub fn set_page_size(&mut self, page_size: u64) -> Result<Option<FetchRequest>, TableError> {
        if page_size == 0 {
            return Err(TableError::ZeroPageSize);
        }
        if page_size == self.query.page_size {
            return Ok(None);
        }
        self.query.page_size = page_size;
        self.query.page_index = 0;
        Ok(Some(self.begin_fetch()))
    }

    /// Header click on column `index`; non-sortable headers do nothing.
    pub fn header_click(&mut self, index: usize) -> Option<FetchRequest> {
        let key = self.columns.get(index)?.sort_key()?.to_string();
        self.query.toggle_sort(&key);
        Some(self.begin_fetch())
    }

    /// Re-fetches at the current page. A new target replaces the resource
    /// path and its query pairs replace the filters; the page index is kept.
    ///
    /// Retargeting clears the selection like any other navigation. A plain
    /// refresh keeps it, and the completed page trims it to the rows that
    /// are still visible.
    pub fn reload(&mut self, target: Option<Url>) -> FetchRequest {
        match target {
            Some(target) => {
                self.retarget(target);
                self.begin_fetch()
            }
            None => self.issue(),
        }
    }

    fn retarget(&mut self, mut target: Url) {
        self.query.filters = target
            .query_pairs()
            .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        target.set_query(None);
        self.target = target;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.page.items, &self.identity);
    }

    pub fn select_none(&mut self) {
        self.selection.select_none();
    }

    pub fn toggle_row(&mut self, id: &RowId) -> bool {
        self.selection.toggle(id, &self.page.items, &self.identity)
    }

    /// Toggles the row at `index` on the visible page.
    pub fn toggle_row_at(&mut self, index: usize) -> bool {
        let Some(id) = self
            .page
            .items
            .get(index)
            .and_then(|row| self.identity.identify(row))
        else {
            return false;
        };
        self.toggle_row(&id)
    }

    pub fn is_row_selected(&self, row: &Row) -> bool {
        self.selection.is_selected(row, &self.identity)
    }

    pub fn all_visible_selected(&self) -> bool {
        self.selection
            .all_visible_selected(&self.page.items, &self.identity)
    }

    pub fn selected_rows(&self) -> Vec<Row> {
        self.selection
            .selected_rows(&self.page.items, &self.identity)
            .into_iter()
            .cloned()
            .collect()
    }
}
