use std::future::Future;

use crate::{Backend, DataSource, FetchRequest, Row, TableController, TableError};

/// Command interface a parent screen holds on a table.
pub trait TableHandle {
    /// Re-fetches at the current page, optionally against a new target
    /// (resource path plus query string).
    fn reload(&mut self, target: Option<&str>) -> impl Future<Output = ()>;

    /// Rows currently selected on the visible page.
    fn selection(&self) -> Vec<Row>;

    fn clear_selection(&mut self);
}

/// A [`TableController`] wired to the [`DataSource`] that feeds it.
#[derive(Debug)]
pub struct DataTable<B> {
    controller: TableController,
    source: DataSource<B>,
}

impl<B: Backend> DataTable<B> {
    pub fn new(controller: TableController, source: DataSource<B>) -> Self {
        Self { controller, source }
    }

    pub fn controller(&self) -> &TableController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TableController {
        &mut self.controller
    }

    pub fn source(&self) -> &DataSource<B> {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut DataSource<B> {
        &mut self.source
    }

    /// Runs one request and applies its page. Returns whether it landed.
    pub async fn run(&mut self, request: FetchRequest) -> bool {
        let page = self
            .source
            .fetch_page(&request.target, &request.query)
            .await;
        self.controller.complete_fetch(request.seq, page)
    }

    async fn run_opt(&mut self, request: Option<FetchRequest>) {
        if let Some(request) = request {
            self.run(request).await;
        }
    }

    pub async fn mount(&mut self) {
        let request = self.controller.mount();
        self.run(request).await;
    }

    pub async fn go_to_page(&mut self, page_index: u64) {
        let request = self.controller.go_to_page(page_index);
        self.run_opt(request).await;
    }

    pub async fn next_page(&mut self) {
        let request = self.controller.next_page();
        self.run_opt(request).await;
    }

    pub async fn prev_page(&mut self) {
        let request = self.controller.prev_page();
        self.run_opt(request).await;
    }

    pub async fn go_to_last_page(&mut self) {
        let request = self.controller.go_to_last_page();
        self.run_opt(request).await;
    }

    pub async fn header_click(&mut self, index: usize) {
        let request = self.controller.header_click(index);
        self.run_opt(request).await;
    }

    pub async fn set_page_size(&mut self, page_size: u64) -> Result<(), TableError> {
        let request = self.controller.set_page_size(page_size)?;
        self.run_opt(request).await;
        Ok(())
    }

    /// Like [`TableHandle::reload`], but reports an unusable target instead
    /// of falling back to the current one.
    pub async fn try_reload(&mut self, target: Option<&str>) -> Result<(), TableError> {
        let target = match target {
            Some(target) => Some(self.source.backend().endpoint(target).map_err(|err| {
                TableError::InvalidTarget {
                    target: target.to_string(),
                    reason: err.to_string(),
                }
            })?),
            None => None,
        };
        let request = self.controller.reload(target);
        self.run(request).await;
        Ok(())
    }
}

impl<B: Backend> TableHandle for DataTable<B> {
    async fn reload(&mut self, target: Option<&str>) {
        if let Err(err) = self.try_reload(target).await {
            tracing::error!("{err}, reloading the current target");
            let request = self.controller.reload(None);
            self.run(request).await;
        }
    }

    fn selection(&self) -> Vec<Row> {
        self.controller.selected_rows()
    }

    fn clear_selection(&mut self) {
        self.controller.select_none();
    }
}
