use reqwest::Url;
use tokio::sync::mpsc;

use crate::{Backend, ClientError, PageEnvelope, QueryState};

/// A list fetch that was degraded to an empty page.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub url: Url,
    pub message: String,
}

/// Turns a [`QueryState`] into one GET against a [`Backend`].
#[derive(Debug, Clone)]
pub struct DataSource<B> {
    backend: B,
    failures: Option<mpsc::UnboundedSender<FetchFailure>>,
}

impl<B: Backend> DataSource<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            failures: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Opens the failure side channel. Only the latest receiver gets reports.
    pub fn subscribe_failures(&mut self) -> mpsc::UnboundedReceiver<FetchFailure> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.failures = Some(tx);
        rx
    }

    /// Fetches a page, returning the failure to the caller.
    pub async fn try_fetch_page(
        &self,
        target: &Url,
        query: &QueryState,
    ) -> Result<PageEnvelope, ClientError> {
        let url = query.apply_to(target);
        tracing::debug!("fetching page {url}");
        let response = self.backend.get_page(url).await?;
        Ok(PageEnvelope::from_response(response, query))
    }

    /// Fetches a page; failures never leave this call. They are logged and
    /// reported on the side channel, and an empty page is returned instead.
    pub async fn fetch_page(&self, target: &Url, query: &QueryState) -> PageEnvelope {
        match self.try_fetch_page(target, query).await {
            Ok(page) => page,
            Err(err) => {
                let url = query.apply_to(target);
                tracing::error!("failed to fetch {url}: {err}");
                if let Some(tx) = &self.failures {
                    let _ = tx.send(FetchFailure {
                        url,
                        message: err.user_message(),
                    });
                }
                PageEnvelope::empty(query.page_index, query.page_size)
            }
        }
    }
}
