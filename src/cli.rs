use clap::{Args, Parser, Subcommand};

use crate::config::ViewMode;
use crate::query::SortSpec;
use crate::types::{Collection, ItemId};

#[derive(Parser)]
#[command(name = "darshan")]
#[command(about = "Browse and manage puja services, categories and blog posts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by every command
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a collection with filtering, sorting and pagination
    #[command(visible_alias = "l")]
    Ls {
        /// Collection: posts, services, categories (default: posts)
        #[arg(default_value = "posts", value_parser = parse_collection)]
        collection: Collection,

        #[command(flatten)]
        filter: FilterArgs,

        /// Sort: newest, oldest, most_viewed, most_liked, or field:direction (e.g. price:desc)
        #[arg(short, long, value_parser = parse_sort)]
        sort: Option<SortSpec>,

        /// Page to show (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Records per page (default: listing.page_size)
        #[arg(long, value_parser = parse_page_size)]
        page_size: Option<u32>,

        /// Layout: grid or list (default: listing.view_mode)
        #[arg(long, value_parser = parse_view_mode)]
        view: Option<ViewMode>,

        /// Query the configured backend instead of the bundled dataset
        #[arg(long)]
        remote: bool,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Print the page-number bar for a page out of a total
    Pages {
        /// Current page (1-based)
        current: u32,

        /// Total number of pages
        total: u32,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Create, update or delete puja services
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Record predicates for `ls`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text search
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Category slug (posts) or id (services)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Tag slug
    #[arg(long)]
    pub tag: Option<String>,

    /// Author slug
    #[arg(long)]
    pub author: Option<String>,

    /// Service type: home, temple, online
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Only featured records
    #[arg(long)]
    pub featured: bool,

    /// Only active (true) or inactive (false) records
    #[arg(long, value_parser = parse_bool_strict)]
    pub active: Option<bool>,
}

#[derive(Subcommand)]
pub enum ServiceAction {
    /// Create a service
    Create {
        /// Service title
        #[arg(long)]
        title: String,

        /// Category id
        #[arg(short, long, value_parser = parse_item_id)]
        category: ItemId,

        /// Service type: home, temple, online
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Price in rupees
        #[arg(long)]
        price: f64,

        /// Description text
        #[arg(short, long, default_value = "")]
        description: String,

        /// Duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,

        /// Create the service as inactive
        #[arg(long)]
        inactive: bool,

        #[command(flatten)]
        target: ServiceTarget,
    },

    /// Update fields of a service
    Update {
        /// Service id
        #[arg(value_parser = parse_item_id)]
        id: ItemId,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long, value_parser = parse_item_id)]
        category: Option<ItemId>,

        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        duration: Option<u32>,

        /// Set the active flag (true or false)
        #[arg(long, value_parser = parse_bool_strict)]
        active: Option<bool>,

        #[command(flatten)]
        target: ServiceTarget,
    },

    /// Delete a service
    Delete {
        /// Service id
        #[arg(value_parser = parse_item_id)]
        id: ItemId,

        #[command(flatten)]
        target: ServiceTarget,
    },
}

/// Backend and output selection for service mutations
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceTarget {
    /// Send the change to the configured backend instead of the bundled dataset
    #[arg(long)]
    pub remote: bool,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Set a configuration value
    Set {
        /// Key: api.base_url, api.token, api.timeout_secs, listing.page_size,
        /// listing.view_mode, listing.debounce_ms
        key: String,
        /// Value to set
        value: String,
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
        #[command(flatten)]
        output: OutputOptions,
    },
}

fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_collection(s: &str) -> Result<Collection, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "collection",
        Collection::ALL_STRINGS,
    )
}

fn parse_view_mode(s: &str) -> Result<ViewMode, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "view mode",
        ViewMode::ALL_STRINGS,
    )
}

fn parse_sort(s: &str) -> Result<SortSpec, String> {
    s.parse().map_err(|e: crate::error::DarshanError| e.to_string())
}

fn parse_page_size(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid page size '{s}'")),
    }
}

fn parse_item_id(s: &str) -> Result<ItemId, String> {
    s.parse().map_err(|e: crate::error::DarshanError| e.to_string())
}

fn parse_bool_strict(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!(
            "Invalid boolean value '{s}'. Must be 'true' or 'false'"
        )),
    }
}
