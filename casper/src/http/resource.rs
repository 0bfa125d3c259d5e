//! Generic access to a resource collection
//!
//! Every collection shares the same list/retrieve/create protocol. What
//! differs per collection (path, default sort, embedded projection, which
//! fields can be filtered) is described by a [`ResourceKind`].

use std::marker::PhantomData;
use std::sync::Arc;

use ghost_models::{CreatedResponse, ListResponse};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::CasperError;
use crate::http::client::HttpClient;
use crate::models::{Page, Resource};

/// Page size used when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query filter expressed as the server's `where` clause
pub trait ResourceFilter {
    /// Build the clause, or `None` when no filter is set. Unset filters
    /// never appear in the clause.
    fn to_where(&self) -> Result<Option<Map<String, Value>>, CasperError>;
}

/// Static description of one collection
pub trait ResourceKind: Send + Sync {
    /// Collection path, with leading and trailing slashes
    const PATH: &'static str;

    /// Plural noun used in listings
    const NOUN: &'static str;

    const DEFAULT_SORT: &'static str;

    /// `embedded` projection sent with list calls
    const EMBEDDED: Option<&'static str> = None;

    type Filter: ResourceFilter + Default + Send + Sync;
}

/// Pagination and ordering of a list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page_size: u32,

    /// 1-based
    pub page: u32,

    /// `-field` sorts descending; `None` uses the collection default
    pub sort: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
            sort: None,
        }
    }
}

impl ListQuery {
    pub fn new(page_size: u32, page: u32) -> Self {
        Self {
            page_size,
            page,
            sort: None,
        }
    }

    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    fn validate(&self) -> Result<(), CasperError> {
        if self.page_size == 0 {
            return Err(CasperError::Validation("page size must be at least 1".to_string()));
        }
        if self.page == 0 {
            return Err(CasperError::Validation("pages are numbered from 1".to_string()));
        }
        Ok(())
    }
}

/// Client for the collection described by `K`
pub struct ResourceClient<K: ResourceKind> {
    http: Arc<HttpClient>,
    _kind: PhantomData<K>,
}

impl<K: ResourceKind> Clone for ResourceClient<K> {
    fn clone(&self) -> Self {
        Self::new(self.http.clone())
    }
}

impl<K: ResourceKind> ResourceClient<K> {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            _kind: PhantomData,
        }
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Query parameters of a list call, in the order they are sent
    pub fn list_params(
        query: &ListQuery,
        filter: &K::Filter,
    ) -> Result<Vec<(&'static str, String)>, CasperError> {
        query.validate()?;

        let mut params = vec![
            ("max_results", query.page_size.to_string()),
            ("page", query.page.to_string()),
            (
                "sort",
                query.sort.clone().unwrap_or_else(|| K::DEFAULT_SORT.to_string()),
            ),
        ];
        if let Some(clause) = filter.to_where()? {
            params.push(("where", Value::Object(clause).to_string()));
        }
        if let Some(embedded) = K::EMBEDDED {
            params.push(("embedded", embedded.to_string()));
        }
        Ok(params)
    }

    /// List one page of the collection
    pub async fn list(
        &self,
        query: &ListQuery,
        filter: &K::Filter,
    ) -> Result<Page<Resource>, CasperError> {
        let params = Self::list_params(query, filter)?;
        let response: ListResponse<Value> = self.http.get(K::PATH, &params).await?;

        let requested = u64::from(query.page_size);
        if response.meta.max_results > requested {
            warn!(
                "Server applied a page size of {} for {} instead of {}",
                response.meta.max_results,
                K::NOUN,
                requested
            );
        }

        let items = response
            .items
            .into_iter()
            .map(Resource::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(at_url(self.http.url(K::PATH)))?;
        debug!("Listed {} {} (total {})", items.len(), K::NOUN, response.meta.total);

        Ok(Page {
            items,
            max_results: response
                .meta
                .max_results
                .min(requested)
                .min(response.meta.total),
            total: response.meta.total,
            page: response.meta.page,
        })
    }

    /// Retrieve one resource. 404 and 400 answers mean the id is unknown
    /// or malformed and map to `NotFound`.
    pub async fn retrieve(&self, id: &str) -> Result<Resource, CasperError> {
        let path = format!("{}{}", K::PATH, id);
        match self.http.get::<Value>(&path, &[]).await {
            Ok(value) => Resource::from_value(value).map_err(at_url(self.http.url(&path))),
            Err(CasperError::Api { status: 400 | 404, body }) => {
                debug!("{} {} not found: {}", K::NOUN, id, body);
                Err(CasperError::NotFound(format!("{} {}", K::NOUN, id)))
            }
            Err(e) => Err(e),
        }
    }

    /// Create a resource and return its id. Not idempotent, never retried.
    pub async fn create<B: Serialize>(&self, payload: &B) -> Result<String, CasperError> {
        let created: CreatedResponse = self.http.post(K::PATH, payload).await?;
        debug!("Created {} {}", K::NOUN, created.id);
        Ok(created.id)
    }
}

/// Report a `Malformed` document as a `Decode` error of `url`
pub(crate) fn at_url(url: String) -> impl FnOnce(CasperError) -> CasperError {
    move |err| match err {
        CasperError::Malformed(reason) => CasperError::Decode { url, reason },
        other => other,
    }
}

/// `"field": value` exact match, skipped when unset
pub(crate) fn exact(clause: &mut Map<String, Value>, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        clause.insert(field.to_string(), Value::String(value.to_string()));
    }
}

/// `"field": {"$regex": value}`, skipped when unset
pub(crate) fn regex(clause: &mut Map<String, Value>, field: &str, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        clause.insert(
            field.to_string(),
            serde_json::json!({ "$regex": pattern }),
        );
    }
}

/// Returns `None` for an empty clause so no `where` is sent
pub(crate) fn non_empty(clause: Map<String, Value>) -> Option<Map<String, Value>> {
    (!clause.is_empty()).then_some(clause)
}
