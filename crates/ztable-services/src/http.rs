//! HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;
use ztable_core::RequestParams;

use crate::{ServiceError, ServiceResult, TableTransport};

const FACET_URL_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to a list endpoint such as `http://host/api/users`.
///
/// - list: `GET <base>?page&limit&sortBy&sortOrder&search&filters`
/// - update: `PUT <base>/<id>` with a JSON patch body
/// - facets: `GET <facets base>/<field>`, where the default facets base replaces the last
///   path segment of the list URL with `facets` (`/api/users` becomes `/api/facets`)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    facets_base: Option<Url>,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> ServiceResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::Misconfigured(format!("invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Misconfigured(format!(
                "API URL '{}' cannot carry a path",
                base_url
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            facets_base: None,
        })
    }

    /// Serve facets from `<facets_base>/<field>` instead of the derived default
    pub fn with_facets_base(mut self, facets_base: &str) -> ServiceResult<Self> {
        let url = Url::parse(facets_base).map_err(|e| {
            ServiceError::Misconfigured(format!("invalid facets URL '{}': {}", facets_base, e))
        })?;
        self.facets_base = Some(url);
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List URL with the request parameters as its query string
    pub fn list_url(&self, params: &RequestParams) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .extend_pairs(params.to_query_pairs());
        url
    }

    pub fn row_url(&self, row_id: &str) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        push_segments(&mut url, &[row_id], false)?;
        Ok(url)
    }

    pub fn facets_url(&self, field: &str) -> ServiceResult<Url> {
        match &self.facets_base {
            Some(base) => {
                let mut url = base.clone();
                push_segments(&mut url, &[field], false)?;
                Ok(url)
            }
            None => {
                let mut url = self.base_url.clone();
                url.set_query(None);
                push_segments(&mut url, &["facets", field], true)?;
                Ok(url)
            }
        }
    }
}

fn push_segments(url: &mut Url, segments: &[&str], replace_last: bool) -> ServiceResult<()> {
    let display = url.to_string();
    let mut path = url
        .path_segments_mut()
        .map_err(|_| ServiceError::Misconfigured(format!("URL '{}' cannot carry a path", display)))?;
    path.pop_if_empty();
    if replace_last {
        path.pop();
    }
    path.extend(segments);
    Ok(())
}

fn parse_facet_url(field: &str, explicit: &str) -> ServiceResult<Url> {
    Url::parse(explicit).map_err(|e| ServiceError::Facet {
        field: field.to_string(),
        message: format!("invalid facet URL '{}': {}", explicit, e),
    })
}

/// GET a column's facet URL directly, for tables that have no transport
pub async fn fetch_facet_url(field: &str, facet_url: &str) -> ServiceResult<Vec<Value>> {
    let url = parse_facet_url(field, facet_url)?;
    let client = Client::builder().timeout(FACET_URL_TIMEOUT).build()?;
    tracing::debug!(url = %url, "GET facets");
    let response = client.get(url).send().await?;
    json_body(response).await
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Transport(format!("API Error: {}", status.as_u16())));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl TableTransport for HttpTransport {
    #[tracing::instrument(skip(self, params), fields(page = params.page))]
    async fn fetch_list(&self, params: &RequestParams) -> ServiceResult<Value> {
        let url = self.list_url(params);
        tracing::debug!(url = %url, "GET list");
        let response = self.client.get(url).send().await?;
        json_body(response).await
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_row(&self, row_id: &str, patch: &Value) -> ServiceResult<Value> {
        let url = self.row_url(row_id)?;
        tracing::debug!(url = %url, "PUT row");
        let response = self.client.put(url).json(patch).send().await?;
        json_body(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_facets(&self, field: &str, facet_url: Option<&str>) -> ServiceResult<Vec<Value>> {
        let url = match facet_url {
            Some(explicit) => parse_facet_url(field, explicit)?,
            None => self.facets_url(field)?,
        };
        tracing::debug!(url = %url, "GET facets");
        let response = self.client.get(url).send().await?;
        json_body(response).await
    }
}
