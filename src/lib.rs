#[macro_use]
mod macros;

pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod query;
pub mod remote;
pub mod sync;
pub mod types;

pub use config::{Config, ViewMode};
pub use controller::{ControllerOptions, InputChange, QueryController, QueryPhase, QueryView};
pub use error::{DarshanError, ErrorKind, Result};
pub use query::{
    CollectionQuery, FilterSpec, Page, PageMarker, PaginationState, SortDirection, SortField,
    SortKey, SortSpec, filter, page_numbers, paginate, sort,
};
pub use remote::{HttpApi, ListParams, MemoryApi, Paginated, RemoteApi};
pub use sync::{ListOutcome, RemoteCollectionState, SyncController};
pub use types::{
    BlogPost, Category, Collection, ItemId, PujaService, PujaServiceDraft, PujaServicePatch,
    Record, Resource,
};
