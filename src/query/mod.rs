//! Filter, sort and paginate an in-memory collection snapshot.
//!
//! Filters are composable trait objects built from a declarative
//! [`FilterSpec`]. Every predicate in a spec must match (AND conjunction);
//! predicates that are left unset in a `FilterSpec` do not constrain the result.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Record;

pub mod page_numbers;
pub mod paginate;
pub mod sort;

pub use page_numbers::{PageMarker, page_numbers};
pub use paginate::{Page, PaginationState, paginate};
pub use sort::{SortDirection, SortField, SortKey, SortSpec, sort, sort_in_place};

/// Declarative set of match predicates applied to a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Case-insensitive substring over the record's search fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Category slug or id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Service type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn category(mut self, key: impl Into<String>) -> Self {
        self.category = Some(key.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>) -> Self {
        self.tag = Some(key.into());
        self
    }

    pub fn author(mut self, key: impl Into<String>) -> Self {
        self.author = Some(key.into());
        self
    }

    pub fn kind(mut self, key: impl Into<String>) -> Self {
        self.kind = Some(key.into());
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn is_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    /// True when no predicate constrains the collection
    pub fn is_empty(&self) -> bool {
        non_blank(&self.search).is_none()
            && non_blank(&self.category).is_none()
            && non_blank(&self.tag).is_none()
            && non_blank(&self.author).is_none()
            && non_blank(&self.kind).is_none()
            && self.featured.is_none()
            && self.is_active.is_none()
    }

    /// Build the list of active predicates for records of type `T`.
    ///
    /// Blank strings are treated as absent.
    pub fn filters<T: Record>(&self) -> Vec<Box<dyn RecordFilter<T>>> {
        let mut filters: Vec<Box<dyn RecordFilter<T>>> = Vec::new();

        if let Some(query) = non_blank(&self.search) {
            filters.push(Box::new(SearchFilter::new(query)));
        }
        if let Some(key) = non_blank(&self.category) {
            filters.push(Box::new(CategoryFilter::new(key)));
        }
        if let Some(key) = non_blank(&self.tag) {
            filters.push(Box::new(TagFilter::new(key)));
        }
        if let Some(key) = non_blank(&self.author) {
            filters.push(Box::new(AuthorFilter::new(key)));
        }
        if let Some(key) = non_blank(&self.kind) {
            filters.push(Box::new(KindFilter::new(key)));
        }
        if let Some(featured) = self.featured {
            filters.push(Box::new(FeaturedFilter::new(featured)));
        }
        if let Some(active) = self.is_active {
            filters.push(Box::new(ActiveFilter::new(active)));
        }

        filters
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Trait for record predicates
pub trait RecordFilter<T: Record>: Send + Sync {
    fn matches(&self, record: &T) -> bool;
}

/// Case-insensitive substring match over the record's search fields
pub struct SearchFilter {
    needle: String,
}

impl SearchFilter {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.to_lowercase(),
        }
    }
}

impl<T: Record> RecordFilter<T> for SearchFilter {
    fn matches(&self, record: &T) -> bool {
        record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

/// Match by category reference key
pub struct CategoryFilter {
    key: String,
}

impl CategoryFilter {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl<T: Record> RecordFilter<T> for CategoryFilter {
    fn matches(&self, record: &T) -> bool {
        record.category_key().as_deref() == Some(self.key.as_str())
    }
}

/// Match records carrying a tag
pub struct TagFilter {
    key: String,
}

impl TagFilter {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl<T: Record> RecordFilter<T> for TagFilter {
    fn matches(&self, record: &T) -> bool {
        record.tag_keys().iter().any(|tag| *tag == self.key)
    }
}

/// Match by author reference key
pub struct AuthorFilter {
    key: String,
}

impl AuthorFilter {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl<T: Record> RecordFilter<T> for AuthorFilter {
    fn matches(&self, record: &T) -> bool {
        record.author_key() == Some(self.key.as_str())
    }
}

/// Match by service type
pub struct KindFilter {
    key: String,
}

impl KindFilter {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl<T: Record> RecordFilter<T> for KindFilter {
    fn matches(&self, record: &T) -> bool {
        record.kind_key() == Some(self.key.as_str())
    }
}

/// Match by featured flag
pub struct FeaturedFilter {
    featured: bool,
}

impl FeaturedFilter {
    pub fn new(featured: bool) -> Self {
        Self { featured }
    }
}

impl<T: Record> RecordFilter<T> for FeaturedFilter {
    fn matches(&self, record: &T) -> bool {
        record.featured() == Some(self.featured)
    }
}

/// Match by active flag
pub struct ActiveFilter {
    active: bool,
}

impl ActiveFilter {
    pub fn new(active: bool) -> Self {
        Self { active }
    }
}

impl<T: Record> RecordFilter<T> for ActiveFilter {
    fn matches(&self, record: &T) -> bool {
        record.is_active() == Some(self.active)
    }
}

/// Return the records matching every predicate of `spec`, in input order.
pub fn filter<T: Record>(items: &[T], spec: &FilterSpec) -> Vec<T> {
    let filters = spec.filters::<T>();
    items
        .iter()
        .filter(|record| filters.iter().all(|f| f.matches(record)))
        .cloned()
        .collect()
}

/// A complete query over a collection snapshot: filter, then sort, then page.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self {
            filter: FilterSpec::default(),
            sort: SortSpec::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: u32 = 12;

impl CollectionQuery {
    pub fn new(filter: FilterSpec) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: impl Into<SortSpec>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Run the pipeline over `items`.
    pub fn apply<T: Record>(&self, items: &[T]) -> Result<Page<T>> {
        let mut matched = filter(items, &self.filter);
        sort_in_place(&mut matched, self.sort);
        paginate(&matched, self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;
    use crate::types::{BlogPost, ItemId};

    fn ids<T: Record>(items: &[T]) -> Vec<u64> {
        items.iter().map(|r| r.id().0).collect()
    }

    #[test]
    fn test_empty_spec_is_noop() {
        let posts = dataset::blog_posts();
        let result = filter(&posts, &FilterSpec::default());
        assert_eq!(result, posts);
    }

    #[test]
    fn test_empty_items() {
        let posts: Vec<BlogPost> = vec![];
        assert!(filter(&posts, &FilterSpec::new().search("puja")).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_over_fields() {
        let posts = dataset::blog_posts();

        let by_title = filter(&posts, &FilterSpec::new().search("DIWALI"));
        assert!(!by_title.is_empty());
        assert!(by_title.iter().all(|p| {
            p.search_fields()
                .iter()
                .any(|f| f.to_lowercase().contains("diwali"))
        }));

        let by_author = filter(&posts, &FilterSpec::new().search("pandit ravi"));
        assert!(!by_author.is_empty());
        assert!(
            by_author
                .iter()
                .all(|p| p.author.name.to_lowercase().contains("pandit ravi"))
        );
    }

    #[test]
    fn test_blank_search_is_noop() {
        let posts = dataset::blog_posts();
        assert_eq!(filter(&posts, &FilterSpec::new().search("   ")), posts);
    }

    #[test]
    fn test_category_matches_by_slug_not_label() {
        let posts = dataset::blog_posts();
        let festivals = filter(&posts, &FilterSpec::new().category("festivals"));
        assert!(!festivals.is_empty());
        assert!(festivals.iter().all(|p| p.category == "festivals"));

        // Display label does not match
        assert!(filter(&posts, &FilterSpec::new().category("Festivals")).is_empty());
    }

    #[test]
    fn test_service_category_by_id() {
        let services = dataset::puja_services();
        let result = filter(&services, &FilterSpec::new().category("1"));
        assert!(!result.is_empty());
        assert!(result.iter().all(|s| s.category == ItemId(1)));
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let posts = dataset::blog_posts();
        let spec = FilterSpec::new().category("festivals").featured(true);
        let result = filter(&posts, &spec);
        assert!(result.iter().all(|p| p.category == "festivals" && p.featured));

        let expected: Vec<u64> = posts
            .iter()
            .filter(|p| p.category == "festivals" && p.featured)
            .map(|p| p.id.0)
            .collect();
        assert_eq!(ids(&result), expected);
    }

    #[test]
    fn test_tag_and_author() {
        let posts = dataset::blog_posts();
        let tagged = filter(&posts, &FilterSpec::new().tag("meditation"));
        assert!(!tagged.is_empty());
        assert!(tagged.iter().all(|p| p.tags.iter().any(|t| t == "meditation")));

        let by_author = filter(&posts, &FilterSpec::new().author("priya-sharma"));
        assert!(by_author.iter().all(|p| p.author.slug == "priya-sharma"));
    }

    #[test]
    fn test_flag_filters_require_the_flag() {
        // Blog posts carry no active flag, so an active constraint excludes all of them
        let posts = dataset::blog_posts();
        assert!(filter(&posts, &FilterSpec::new().is_active(true)).is_empty());

        let services = dataset::puja_services();
        let inactive = filter(&services, &FilterSpec::new().is_active(false));
        assert!(inactive.iter().all(|s| !s.is_active));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let posts = dataset::blog_posts();
        let specs = [
            FilterSpec::new().search("puja"),
            FilterSpec::new().featured(true),
            FilterSpec::new().category("astrology").tag("planets"),
            FilterSpec::default(),
        ];
        for spec in specs {
            let once = filter(&posts, &spec);
            let twice = filter(&once, &spec);
            assert_eq!(once, twice, "spec {spec:?}");
        }
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let posts = dataset::blog_posts();
        let before = posts.clone();
        let _ = filter(&posts, &FilterSpec::new().featured(true));
        assert_eq!(posts, before);
    }

    #[test]
    fn test_is_empty() {
        assert!(FilterSpec::default().is_empty());
        assert!(FilterSpec::new().search("  ").is_empty());
        assert!(!FilterSpec::new().featured(false).is_empty());
    }

    #[test]
    fn test_collection_query_apply() {
        let posts = dataset::blog_posts();
        let page = CollectionQuery::new(FilterSpec::new().category("festivals"))
            .sort(SortKey::MostViewed)
            .page_size(2)
            .apply(&posts)
            .unwrap();

        assert!(page.items.len() <= 2);
        assert!(
            page.items
                .windows(2)
                .all(|w| w[0].views >= w[1].views)
        );
        assert_eq!(page.pagination.current_page, 1);
    }

    #[test]
    fn test_collection_query_rejects_zero_page_size() {
        let posts = dataset::blog_posts();
        assert!(CollectionQuery::default().page_size(0).apply(&posts).is_err());
    }
}
