use std::future::Future;

use api_types::{error::ApiErrorBody, page::PageResponse};
use reqwest::{RequestBuilder, Response, Url};
use serde_json::Value;

use crate::{ClientError, Row, RowId};

/// The REST contract the table talks to: one paginated list endpoint plus
/// create/update/delete on the same resource path.
pub trait Backend: Send + Sync {
    /// Resolves a resource path (optionally with a query string) against the
    /// backend root.
    fn endpoint(&self, path: &str) -> Result<Url, ClientError>;

    fn get_page(
        &self,
        url: Url,
    ) -> impl Future<Output = Result<PageResponse<Row>, ClientError>> + Send;

    fn create(
        &self,
        resource: &str,
        body: &Value,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn update(
        &self,
        resource: &str,
        id: &RowId,
        body: &Value,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn delete(
        &self,
        resource: &str,
        id: &RowId,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`Backend`] over HTTP with an optional bearer token.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // Without the trailing slash `join` would drop the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            token: None,
        })
    }

    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|token| !token.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn record_url(&self, resource: &str, id: &RowId) -> Result<Url, ClientError> {
        self.endpoint(&format!("{}/{}", resource.trim_end_matches('/'), id))
    }

    async fn check(res: Response) -> Result<Response, ClientError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.json::<ApiErrorBody>().await.unwrap_or_default();
        Err(ClientError::from_status(status.as_u16(), body))
    }
}

impl Backend for HttpBackend {
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }

    async fn get_page(&self, url: Url) -> Result<PageResponse<Row>, ClientError> {
        let res = self.authorize(self.http.get(url)).send().await?;
        let res = Self::check(res).await?;
        Ok(res.json::<PageResponse<Row>>().await?)
    }

    async fn create(&self, resource: &str, body: &Value) -> Result<(), ClientError> {
        let url = self.endpoint(resource)?;
        let res = self.authorize(self.http.post(url)).json(body).send().await?;
        Self::check(res).await?;
        Ok(())
    }

    async fn update(&self, resource: &str, id: &RowId, body: &Value) -> Result<(), ClientError> {
        let url = self.record_url(resource, id)?;
        let res = self.authorize(self.http.put(url)).json(body).send().await?;
        Self::check(res).await?;
        Ok(())
    }

    async fn delete(&self, resource: &str, id: &RowId) -> Result<(), ClientError> {
        let url = self.record_url(resource, id)?;
        let res = self.authorize(self.http.delete(url)).send().await?;
        Self::check(res).await?;
        Ok(())
    }
}
