//! reqwest-backed access to one REST collection.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{error::ErrorBody, protocol::PageEnvelope};
use tracing::debug;
use url::Url;

use crate::{
    error::FetchError,
    query::QueryState,
    source::{PageSource, ResultPage},
};

pub const ACTIVITIES_PATH: &str = "api/marketing/activities";
pub const CLIENTS_PATH: &str = "api/marketing/clients";

pub struct HttpCollection<T> {
    http: Client,
    endpoint: Url,
    _rows: PhantomData<fn() -> T>,
}

impl<T> HttpCollection<T> {
    /// `base` must end with `/`; `path` is joined relative to it.
    pub fn new(http: Client, base: &Url, path: &str) -> Result<Self, FetchError> {
        let endpoint = base.join(path.trim_start_matches('/'))?;
        if endpoint.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(endpoint.to_string()));
        }
        Ok(Self {
            http,
            endpoint,
            _rows: PhantomData,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn member_url(&self, id: &str) -> Result<Url, FetchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    pub async fn create<B>(&self, body: &B) -> Result<(), FetchError>
    where
        B: Serialize + ?Sized,
    {
        debug!(endpoint = %self.endpoint, "POST collection member");
        let res = self.http.post(self.endpoint.clone()).json(body).send().await?;
        ensure_success(res).await?;
        Ok(())
    }

    pub async fn update<B>(&self, id: &str, body: &B) -> Result<(), FetchError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.member_url(id)?;
        debug!(endpoint = %url, "PUT collection member");
        let res = self.http.put(url).json(body).send().await?;
        ensure_success(res).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), FetchError> {
        let url = self.member_url(id)?;
        debug!(endpoint = %url, "DELETE collection member");
        let res = self.http.delete(url).send().await?;
        ensure_success(res).await?;
        Ok(())
    }
}

impl<T: DeserializeOwned> HttpCollection<T> {
    pub async fn list(&self, query: &QueryState) -> Result<PageEnvelope<T>, FetchError> {
        let params = query.to_params();
        debug!(
            endpoint = %self.endpoint,
            page = params.page,
            limit = params.limit,
            "GET collection page"
        );
        let res = self
            .http
            .get(self.endpoint.clone())
            .query(&params)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let res = ensure_success(res).await?;
        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[async_trait]
impl<T> PageSource<T> for HttpCollection<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch_page(&self, query: &QueryState) -> Result<ResultPage<T>, FetchError> {
        self.list(query).await.map(ResultPage::from)
    }
}

async fn ensure_success(res: Response) -> Result<Response, FetchError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let raw = res.bytes().await.unwrap_or_default();
    Err(FetchError::server(status.as_u16(), &ErrorBody::parse(&raw)))
}
