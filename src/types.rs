//! Entity types flowing through the collection engine.
//!
//! Every entity implements [`Record`], which exposes the fields the filter and
//! sorter read. Entities that live behind a REST endpoint also implement
//! [`Resource`], which names the endpoint and the payloads used to mutate them.

use std::borrow::Cow;
use std::fmt;

use jiff::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Directory holding local configuration (relative to the working directory)
pub const DARSHAN_DIR: &str = ".darshan";

/// Stable identifier assigned by the backend
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId(id)
    }
}

impl std::str::FromStr for ItemId {
    type Err = crate::error::DarshanError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        s.trim().parse::<u64>().map(ItemId).map_err(|_| {
            crate::error::DarshanError::InvalidArgument(format!("invalid id '{s}'"))
        })
    }
}

/// Read-only view of an entity used by the filter, sorter and paginator.
///
/// Reference accessors (`category_key`, `tag_keys`, `author_key`, `kind_key`)
/// return stable identifiers (slug or id), never display labels.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> ItemId;

    fn title(&self) -> &str;

    /// Text fields searched by free-text queries
    fn search_fields(&self) -> Vec<&str>;

    fn category_key(&self) -> Option<Cow<'_, str>> {
        None
    }

    fn tag_keys(&self) -> &[String] {
        &[]
    }

    fn author_key(&self) -> Option<&str> {
        None
    }

    fn kind_key(&self) -> Option<&str> {
        None
    }

    fn featured(&self) -> Option<bool> {
        None
    }

    fn is_active(&self) -> Option<bool> {
        None
    }

    fn created_at(&self) -> Timestamp;

    fn published_at(&self) -> Option<Timestamp> {
        None
    }

    /// Timestamp used by the `newest`/`oldest` orderings
    fn effective_timestamp(&self) -> Timestamp {
        self.published_at().unwrap_or_else(|| self.created_at())
    }

    fn view_count(&self) -> u64 {
        0
    }

    fn like_count(&self) -> u64 {
        0
    }

    fn price(&self) -> Option<f64> {
        None
    }
}

/// An entity served by a REST collection endpoint.
pub trait Resource: Record + Serialize + DeserializeOwned {
    /// Endpoint path relative to the API base URL, with a trailing slash
    const PATH: &'static str;

    /// Human-readable collection name used in messages
    const NAME: &'static str;

    /// Payload for creating an entity
    type Draft: Serialize + Clone + Send + Sync + 'static;

    /// Partial payload for updating an entity
    type Patch: Serialize + Clone + Send + Sync + 'static;
}

/// Blog post author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub slug: String,
    pub name: String,
}

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: ItemId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    pub author: Author,
    /// Category slug
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

impl Record for BlogPost {
    fn id(&self) -> ItemId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.excerpt.as_str(),
            self.content.as_str(),
            self.author.name.as_str(),
        ]
    }

    fn category_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.category))
    }

    fn tag_keys(&self) -> &[String] {
        &self.tags
    }

    fn author_key(&self) -> Option<&str> {
        Some(&self.author.slug)
    }

    fn featured(&self) -> Option<bool> {
        Some(self.featured)
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }

    fn view_count(&self) -> u64 {
        self.views
    }

    fn like_count(&self) -> u64 {
        self.likes
    }
}

/// Payload for creating a blog post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostDraft {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    pub author: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update for a blog post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl Resource for BlogPost {
    const PATH: &'static str = "blog/posts/";
    const NAME: &'static str = "blog post";
    type Draft = BlogPostDraft;
    type Patch = BlogPostPatch;
}

/// Puja service offered for booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PujaService {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Category id
    pub category: ItemId,
    #[serde(default)]
    pub category_name: String,
    /// Service type, e.g. "home", "temple", "online"
    #[serde(rename = "type")]
    pub service_type: String,
    pub price: f64,
    /// Duration in minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

fn default_true() -> bool {
    true
}

impl Record for PujaService {
    fn id(&self) -> ItemId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.description.as_str(),
            self.category_name.as_str(),
        ]
    }

    fn category_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.category.to_string()))
    }

    fn kind_key(&self) -> Option<&str> {
        Some(&self.service_type)
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn price(&self) -> Option<f64> {
        Some(self.price)
    }
}

/// Payload for creating a puja service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PujaServiceDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: ItemId,
    #[serde(rename = "type")]
    pub service_type: String,
    pub price: f64,
    #[serde(default)]
    pub duration: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update for a puja service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PujaServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemId>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PujaServicePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.service_type.is_none()
            && self.price.is_none()
            && self.duration.is_none()
            && self.is_active.is_none()
    }
}

impl Resource for PujaService {
    const PATH: &'static str = "puja/services/";
    const NAME: &'static str = "service";
    type Draft = PujaServiceDraft;
    type Patch = PujaServicePatch;
}

/// Category shared by services and posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: ItemId,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Record for Category {
    fn id(&self) -> ItemId {
        self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.slug.as_str()]
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Payload for creating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update for a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Resource for Category {
    const PATH: &'static str = "puja/categories/";
    const NAME: &'static str = "category";
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
}

/// The collections exposed by the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    #[default]
    Posts,
    Services,
    Categories,
}

enum_display_fromstr!(
    Collection,
    crate::error::DarshanError::InvalidCollection,
    {
        Posts => "posts",
        Services => "services",
        Categories => "categories",
    }
);

/// Turn a display name into a URL slug ("Ganesh Puja" -> "ganesh-puja")
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
