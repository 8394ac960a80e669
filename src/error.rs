use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to the messages the backend reported for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum DarshanError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid sort key '{0}'")]
    InvalidSortKey(String),

    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),

    #[error("invalid sort direction '{0}'")]
    InvalidSortDirection(String),

    #[error("invalid view mode '{0}'")]
    InvalidViewMode(String),

    #[error("invalid collection '{0}'")]
    InvalidCollection(String),

    // Remote errors
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: FieldErrors,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    RemoteServer { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    /// A sync controller call failed; holds the classified message
    #[error("{0}")]
    SyncFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse category of an error, kept in collection state next to its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Server,
    Network,
    Other,
}

impl DarshanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DarshanError::InvalidArgument(_)
            | DarshanError::InvalidSortKey(_)
            | DarshanError::InvalidSortField(_)
            | DarshanError::InvalidSortDirection(_)
            | DarshanError::InvalidViewMode(_)
            | DarshanError::InvalidCollection(_)
            | DarshanError::Validation { .. } => ErrorKind::Validation,
            DarshanError::NotFound(_) => ErrorKind::NotFound,
            DarshanError::RemoteServer { .. } => ErrorKind::Server,
            DarshanError::Network(_) => ErrorKind::Network,
            DarshanError::Http(e) if e.is_connect() || e.is_timeout() => ErrorKind::Network,
            DarshanError::Http(e) if e.status().is_some_and(|s| s.is_server_error()) => {
                ErrorKind::Server
            }
            _ => ErrorKind::Other,
        }
    }

    /// Message suitable for a non-blocking error indicator.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Server => "Server error, please try again later.".to_string(),
            ErrorKind::Network => "Network error, please check your connection.".to_string(),
            ErrorKind::NotFound => match self {
                DarshanError::NotFound(what) => format!("{what} no longer exists."),
                _ => "The requested item no longer exists.".to_string(),
            },
            ErrorKind::Validation => match self {
                DarshanError::Validation { message, fields } => {
                    match fields.iter().next() {
                        Some((field, messages)) if !messages.is_empty() => {
                            format!("{field}: {}", messages.join(" "))
                        }
                        _ => message.clone(),
                    }
                }
                other => other.to_string(),
            },
            ErrorKind::Other => self.to_string(),
        }
    }

    pub fn invalid_sort_key(s: String) -> Self {
        DarshanError::InvalidSortKey(s)
    }

    pub fn invalid_sort_field(s: String) -> Self {
        DarshanError::InvalidSortField(s)
    }

    pub fn invalid_sort_direction(s: String) -> Self {
        DarshanError::InvalidSortDirection(s)
    }

    pub fn invalid_view_mode(s: String) -> Self {
        DarshanError::InvalidViewMode(s)
    }
}

pub type Result<T> = std::result::Result<T, DarshanError>;
