//! Sort functions for collection records.
//!
//! All orderings use `slice::sort_by`, which is stable: records that compare
//! equal keep their input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DarshanError;
use crate::types::Record;

/// Named comparator for public listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    MostViewed,
    MostLiked,
}

enum_display_fromstr!(
    SortKey,
    DarshanError::invalid_sort_key,
    {
        Newest => "newest",
        Oldest => "oldest",
        MostViewed => "most_viewed",
        MostLiked => "most_liked",
    }
);

impl SortKey {
    /// Parse a key, falling back to `newest` for unknown or empty input.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Field used by admin table orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Created,
    Views,
    Likes,
    Price,
}

enum_display_fromstr!(
    SortField,
    DarshanError::invalid_sort_field,
    {
        Title => "title",
        Created => "created",
        Views => "views",
        Likes => "likes",
        Price => "price",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

enum_display_fromstr!(
    SortDirection,
    DarshanError::invalid_sort_direction,
    {
        Asc => "asc",
        Desc => "desc",
    }
);

/// The comparator applied by the sorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortSpec {
    Key(SortKey),
    Field {
        field: SortField,
        direction: SortDirection,
    },
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::Key(SortKey::Newest)
    }
}

impl From<SortKey> for SortSpec {
    fn from(key: SortKey) -> Self {
        SortSpec::Key(key)
    }
}

impl SortSpec {
    pub fn field(field: SortField, direction: SortDirection) -> Self {
        SortSpec::Field { field, direction }
    }

    /// Ordering parameter understood by the backend (`-created_at`, `title`, ...)
    pub fn ordering_param(&self) -> String {
        match self {
            SortSpec::Key(SortKey::Newest) => "-created_at".to_string(),
            SortSpec::Key(SortKey::Oldest) => "created_at".to_string(),
            SortSpec::Key(SortKey::MostViewed) => "-views".to_string(),
            SortSpec::Key(SortKey::MostLiked) => "-likes".to_string(),
            SortSpec::Field { field, direction } => {
                let name = match field {
                    SortField::Title => "title",
                    SortField::Created => "created_at",
                    SortField::Views => "views",
                    SortField::Likes => "likes",
                    SortField::Price => "price",
                };
                match direction {
                    SortDirection::Asc => name.to_string(),
                    SortDirection::Desc => format!("-{name}"),
                }
            }
        }
    }

    /// Inverse of [`SortSpec::ordering_param`]; unknown values yield `None`.
    pub fn from_ordering_param(param: &str) -> Option<Self> {
        let (name, direction) = match param.trim().strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (param.trim(), SortDirection::Asc),
        };
        let field = match name {
            "title" => SortField::Title,
            "created_at" => SortField::Created,
            "views" => SortField::Views,
            "likes" => SortField::Likes,
            "price" => SortField::Price,
            _ => return None,
        };
        Some(match (field, direction) {
            (SortField::Created, SortDirection::Desc) => SortSpec::Key(SortKey::Newest),
            (SortField::Created, SortDirection::Asc) => SortSpec::Key(SortKey::Oldest),
            (SortField::Views, SortDirection::Desc) => SortSpec::Key(SortKey::MostViewed),
            (SortField::Likes, SortDirection::Desc) => SortSpec::Key(SortKey::MostLiked),
            (field, direction) => SortSpec::Field { field, direction },
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortSpec::Key(key) => write!(f, "{key}"),
            SortSpec::Field { field, direction } => write!(f, "{field}:{direction}"),
        }
    }
}

impl FromStr for SortSpec {
    type Err = DarshanError;

    /// Accepts a sort key (`most_viewed`) or `field:direction` (`price:desc`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((field, direction)) => Ok(SortSpec::Field {
                field: field.parse()?,
                direction: direction.parse()?,
            }),
            None => Ok(SortSpec::Key(s.parse()?)),
        }
    }
}

fn compare<T: Record>(a: &T, b: &T, spec: SortSpec) -> Ordering {
    match spec {
        SortSpec::Key(SortKey::Newest) => b.effective_timestamp().cmp(&a.effective_timestamp()),
        SortSpec::Key(SortKey::Oldest) => a.effective_timestamp().cmp(&b.effective_timestamp()),
        SortSpec::Key(SortKey::MostViewed) => b.view_count().cmp(&a.view_count()),
        SortSpec::Key(SortKey::MostLiked) => b.like_count().cmp(&a.like_count()),
        SortSpec::Field { field, direction } => {
            let ordering = match field {
                SortField::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
                SortField::Created => a.created_at().cmp(&b.created_at()),
                SortField::Views => a.view_count().cmp(&b.view_count()),
                SortField::Likes => a.like_count().cmp(&b.like_count()),
                SortField::Price => compare_price(a.price(), b.price()),
            };
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Records without a price sort after priced ones in ascending order
fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort records in place by the given spec
pub fn sort_in_place<T: Record>(items: &mut [T], spec: impl Into<SortSpec>) {
    let spec = spec.into();
    items.sort_by(|a, b| compare(a, b, spec));
}

/// Return a sorted copy of `items`
pub fn sort<T: Record>(items: &[T], spec: impl Into<SortSpec>) -> Vec<T> {
    let mut sorted = items.to_vec();
    sort_in_place(&mut sorted, spec);
    sorted
}
