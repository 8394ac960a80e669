//! In-memory collection endpoint.
//!
//! Serves a record set the way the REST backend does: filtering, ordering and
//! paging are applied server-side, ids are assigned on create, and unknown ids
//! answer with `NotFound`. Used for the bundled dataset and in tests.

use std::marker::PhantomData;
use std::time::Duration;

use jiff::Timestamp;
use parking_lot::Mutex;

use crate::error::{DarshanError, FieldErrors, Result};
use crate::query::{filter, paginate, sort_in_place};
use crate::remote::{ListParams, Paginated, RemoteApi};
use crate::types::{
    Author, BlogPost, BlogPostDraft, BlogPostPatch, Category, CategoryDraft, CategoryPatch,
    ItemId, PujaService, PujaServiceDraft, PujaServicePatch, Resource, slugify,
};

const BLANK: &str = "This field may not be blank.";

/// Server-side construction and patching of a resource.
pub trait ServerModel: Resource {
    /// Build the stored entity for a create request
    fn from_draft(id: ItemId, draft: &Self::Draft, now: Timestamp) -> Result<Self>;

    /// Apply a partial update in place
    fn apply_patch(&mut self, patch: &Self::Patch, now: Timestamp) -> Result<()>;
}

struct Store<T> {
    records: Vec<T>,
    next_id: u64,
}

/// A collection endpoint backed by a `Vec` behind a mutex.
pub struct MemoryApi<T> {
    store: Mutex<Store<T>>,
    latency: Option<Duration>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ServerModel> MemoryApi<T> {
    pub fn new(records: Vec<T>) -> Self {
        let next_id = records.iter().map(|r| r.id().0).max().unwrap_or(0) + 1;
        Self {
            store: Mutex::new(Store { records, next_id }),
            latency: None,
            _marker: PhantomData,
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Copy of every stored record, in insertion order
    pub fn snapshot(&self) -> Vec<T> {
        self.store.lock().records.clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn not_found(id: ItemId) -> DarshanError {
        DarshanError::NotFound(format!("{} {id}", T::NAME))
    }
}

impl<T: ServerModel> RemoteApi<T> for MemoryApi<T> {
    async fn list(&self, params: &ListParams) -> Result<Paginated<T>> {
        self.simulate_latency().await;
        let mut matched = {
            let store = self.store.lock();
            filter(&store.records, &params.filter_spec())
        };
        sort_in_place(&mut matched, params.ordering.unwrap_or_default());
        let page = paginate(&matched, params.page, params.page_size)?;
        Ok(Paginated {
            results: page.items,
            count: page.pagination.total_items,
        })
    }

    async fn create(&self, draft: &T::Draft) -> Result<T> {
        self.simulate_latency().await;
        let mut store = self.store.lock();
        let id = ItemId(store.next_id);
        let record = T::from_draft(id, draft, Timestamp::now())?;
        store.next_id += 1;
        store.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: ItemId, patch: &T::Patch) -> Result<T> {
        self.simulate_latency().await;
        let mut store = self.store.lock();
        let record = store
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        // Validate against a copy so a rejected patch leaves the record untouched
        let mut updated = record.clone();
        updated.apply_patch(patch, Timestamp::now())?;
        *record = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        self.simulate_latency().await;
        let mut store = self.store.lock();
        let before = store.records.len();
        store.records.retain(|r| r.id() != id);
        if store.records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

/// Collects per-field validation messages.
#[derive(Default)]
struct Validator {
    fields: FieldErrors,
}

impl Validator {
    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.reject(field, BLANK);
        }
    }

    fn reject(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    fn finish(self) -> Result<()> {
        if self.fields.is_empty() {
            return Ok(());
        }
        Err(DarshanError::Validation {
            message: "invalid input".to_string(),
            fields: self.fields,
        })
    }
}

fn check_price(v: &mut Validator, price: f64) {
    if !price.is_finite() || price <= 0.0 {
        v.reject("price", "Ensure this value is greater than 0.");
    }
}

fn check_kind(v: &mut Validator, kind: &str) {
    v.require("type", kind);
}

impl ServerModel for PujaService {
    fn from_draft(id: ItemId, draft: &PujaServiceDraft, now: Timestamp) -> Result<Self> {
        let mut v = Validator::default();
        v.require("title", &draft.title);
        check_kind(&mut v, &draft.service_type);
        check_price(&mut v, draft.price);
        v.finish()?;

        Ok(PujaService {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            category: draft.category,
            category_name: String::new(),
            service_type: draft.service_type.trim().to_string(),
            price: draft.price,
            duration: draft.duration,
            is_active: draft.is_active,
            created_at: now,
            updated_at: None,
        })
    }

    fn apply_patch(&mut self, patch: &PujaServicePatch, now: Timestamp) -> Result<()> {
        let mut v = Validator::default();
        if let Some(title) = &patch.title {
            v.require("title", title);
        }
        if let Some(kind) = &patch.service_type {
            check_kind(&mut v, kind);
        }
        if let Some(price) = patch.price {
            check_price(&mut v, price);
        }
        v.finish()?;

        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(category) = patch.category {
            if category != self.category {
                self.category_name.clear();
            }
            self.category = category;
        }
        if let Some(kind) = &patch.service_type {
            self.service_type = kind.trim().to_string();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.updated_at = Some(now);
        Ok(())
    }
}

/// Display name guessed from an author slug: `pandit-ravi` becomes `Pandit Ravi`
fn name_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl ServerModel for BlogPost {
    fn from_draft(id: ItemId, draft: &BlogPostDraft, now: Timestamp) -> Result<Self> {
        let mut v = Validator::default();
        v.require("title", &draft.title);
        v.require("author", &draft.author);
        v.require("category", &draft.category);
        v.finish()?;

        Ok(BlogPost {
            id,
            title: draft.title.trim().to_string(),
            slug: slugify(&draft.title),
            excerpt: draft.excerpt.clone(),
            content: draft.content.clone(),
            author: Author {
                slug: draft.author.clone(),
                name: name_from_slug(&draft.author),
            },
            category: draft.category.clone(),
            tags: draft.tags.clone(),
            featured: draft.featured,
            views: 0,
            likes: 0,
            created_at: now,
            published_at: None,
        })
    }

    fn apply_patch(&mut self, patch: &BlogPostPatch, _now: Timestamp) -> Result<()> {
        let mut v = Validator::default();
        if let Some(title) = &patch.title {
            v.require("title", title);
        }
        if let Some(category) = &patch.category {
            v.require("category", category);
        }
        v.finish()?;

        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(excerpt) = &patch.excerpt {
            self.excerpt = excerpt.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        Ok(())
    }
}

impl ServerModel for Category {
    fn from_draft(id: ItemId, draft: &CategoryDraft, now: Timestamp) -> Result<Self> {
        let mut v = Validator::default();
        v.require("name", &draft.name);
        v.finish()?;

        let slug = match &draft.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => slugify(&draft.name),
        };
        Ok(Category {
            id,
            name: draft.name.trim().to_string(),
            slug,
            is_active: draft.is_active,
            created_at: now,
        })
    }

    fn apply_patch(&mut self, patch: &CategoryPatch, _now: Timestamp) -> Result<()> {
        if let Some(name) = &patch.name {
            let mut v = Validator::default();
            v.require("name", name);
            v.finish()?;
            self.name = name.trim().to_string();
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;
    use crate::error::ErrorKind;
    use crate::query::SortKey;

    fn services() -> MemoryApi<PujaService> {
        MemoryApi::new(dataset::puja_services())
    }

    fn draft(title: &str, price: f64) -> PujaServiceDraft {
        PujaServiceDraft {
            title: title.to_string(),
            description: String::new(),
            category: ItemId(1),
            service_type: "home".to_string(),
            price,
            duration: 60,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_counts_server_side() {
        let api = services();
        let params = ListParams {
            kind: Some("temple".to_string()),
            ..Default::default()
        }
        .page_size(2);

        let page = api.list(&params).await.unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 2);
        assert!(page.results.iter().all(|s| s.service_type == "temple"));
    }

    #[tokio::test]
    async fn test_list_orders_by_param() {
        let api = services();
        let params = ListParams::default().ordering(SortKey::Oldest);
        let page = api.list(&params).await.unwrap();
        assert_eq!(page.results[0].id, ItemId(1));
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let api = services();
        let created = api.create(&draft("Mundan Sanskar", 2500.0)).await.unwrap();
        assert_eq!(created.id, ItemId(9));
        assert_eq!(api.snapshot().len(), 9);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_and_bad_price() {
        let api = services();
        let err = api.create(&draft("  ", 0.0)).await.unwrap_err();
        match err {
            DarshanError::Validation { fields, .. } => {
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("price"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(api.snapshot().len(), 8);
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let api = services();
        let patch = PujaServicePatch {
            price: Some(5500.0),
            ..Default::default()
        };
        let updated = api.update(ItemId(1), &patch).await.unwrap();
        assert_eq!(updated.price, 5500.0);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.title, "Satyanarayan Puja");
    }

    #[tokio::test]
    async fn test_rejected_patch_leaves_record() {
        let api = services();
        let patch = PujaServicePatch {
            title: Some("Renamed".to_string()),
            price: Some(-1.0),
            ..Default::default()
        };
        api.update(ItemId(1), &patch).await.unwrap_err();
        let stored = api.snapshot().into_iter().find(|s| s.id == ItemId(1)).unwrap();
        assert_eq!(stored.title, "Satyanarayan Puja");
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let api = services();
        let err = api.delete(ItemId(99)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = api
            .update(ItemId(99), &PujaServicePatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "service 99 no longer exists.");
    }

    #[tokio::test]
    async fn test_category_slug_from_name() {
        let api = MemoryApi::new(dataset::categories());
        let created = api
            .create(&CategoryDraft {
                name: "Vivah Puja".to_string(),
                slug: None,
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(created.slug, "vivah-puja");
    }

    #[test]
    fn test_name_from_slug() {
        assert_eq!(name_from_slug("pandit-ravi"), "Pandit Ravi");
        assert_eq!(name_from_slug(""), "");
    }
}
