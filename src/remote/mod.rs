//! Remote collection endpoints.
//!
//! This module defines the boundary between the collection engine and the REST
//! backend. Each entity type is served by one collection endpoint supporting
//! list/create/update/delete; [`RemoteApi`] is the interface the sync
//! controller drives, implemented over HTTP by [`HttpApi`] and in memory by
//! [`MemoryApi`].

pub mod http;
pub mod memory;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::{CollectionQuery, DEFAULT_PAGE_SIZE, FilterSpec, SortSpec};
use crate::types::{ItemId, Resource};

pub use http::HttpApi;
pub use memory::{MemoryApi, ServerModel};

/// Server-side list parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<SortSpec>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            tag: None,
            author: None,
            kind: None,
            is_active: None,
            featured: None,
            ordering: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListParams {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn ordering(mut self, ordering: impl Into<SortSpec>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    /// Predicates carried by these parameters
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            search: self.search.clone(),
            category: self.category.clone(),
            tag: self.tag.clone(),
            author: self.author.clone(),
            kind: self.kind.clone(),
            featured: self.featured,
            is_active: self.is_active,
        }
    }

    /// Query string pairs in the backend's naming
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let spec = self.filter_spec();
        let text = [
            ("search", spec.search),
            ("category", spec.category),
            ("tag", spec.tag),
            ("author", spec.author),
            ("type", spec.kind),
        ];
        for (name, value) in text {
            if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                pairs.push((name, value));
            }
        }
        if let Some(active) = self.is_active {
            pairs.push(("is_active", active.to_string()));
        }
        if let Some(featured) = self.featured {
            pairs.push(("featured", featured.to_string()));
        }
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering", ordering.ordering_param()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("page_size", self.page_size.to_string()));
        pairs
    }
}

impl From<&CollectionQuery> for ListParams {
    fn from(query: &CollectionQuery) -> Self {
        let spec = &query.filter;
        Self {
            search: spec.search.clone(),
            category: spec.category.clone(),
            tag: spec.tag.clone(),
            author: spec.author.clone(),
            kind: spec.kind.clone(),
            is_active: spec.is_active,
            featured: spec.featured,
            ordering: Some(query.sort),
            page: query.page,
            page_size: query.page_size,
        }
    }
}

/// One page of a remote collection, in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    /// Total number of records matching the query across all pages
    pub count: u64,
}

/// List response as sent by the backend: either paginated or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paginated { results: Vec<T>, count: u64 },
    Bare(Vec<T>),
}

impl<T> From<ListResponse<T>> for Paginated<T> {
    fn from(response: ListResponse<T>) -> Self {
        match response {
            ListResponse::Paginated { results, count } => Paginated { results, count },
            ListResponse::Bare(results) => {
                let count = results.len() as u64;
                Paginated { results, count }
            }
        }
    }
}

/// Common interface for remote collection endpoints
pub trait RemoteApi<T: Resource>: Send + Sync {
    /// Fetch one page of the collection
    fn list(&self, params: &ListParams) -> impl Future<Output = Result<Paginated<T>>> + Send;

    /// Create a record; returns the entity as stored by the server
    fn create(&self, draft: &T::Draft) -> impl Future<Output = Result<T>> + Send;

    /// Partially update a record; returns the entity as stored by the server
    fn update(&self, id: ItemId, patch: &T::Patch) -> impl Future<Output = Result<T>> + Send;

    /// Delete a record
    fn delete(&self, id: ItemId) -> impl Future<Output = Result<()>> + Send;
}
