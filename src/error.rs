use thiserror::Error;

/// Main error type for the branch aggregation service
#[derive(Error, Debug)]
pub enum BranchwatchError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Registry errors
    #[error("Branch registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Unknown category tag: {0}")]
    UnknownCategory(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for BranchwatchError
pub type Result<T> = std::result::Result<T, BranchwatchError>;

/// Per-branch failure taxonomy.
///
/// None of these ever leave the orchestrator or the health probe: each one is
/// logged and turned into "this branch contributes nothing".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BranchError {
    #[error("Incomplete branch descriptor: {0}")]
    IncompleteDescriptor(String),

    #[error("Connect timeout after {elapsed_ms}ms")]
    ConnectTimeout { elapsed_ms: u64 },

    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Query timeout after {elapsed_ms}ms")]
    QueryTimeout { elapsed_ms: u64 },

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Query returned no rows")]
    NoRows,

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("Probe error: {0}")]
    ProbeError(String),
}

impl BranchError {
    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BranchError::IncompleteDescriptor(_) => "incomplete_descriptor",
            BranchError::ConnectTimeout { .. } => "connect_timeout",
            BranchError::ConnectFailed(_) => "connect_failed",
            BranchError::QueryTimeout { .. } => "query_timeout",
            BranchError::QueryFailed(_) => "query_failed",
            BranchError::NoRows => "no_rows",
            BranchError::Unreachable(_) => "unreachable",
            BranchError::ProbeError(_) => "probe_error",
        }
    }

    /// Map a driver error raised while opening a connection
    pub fn connect(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => BranchError::ConnectTimeout { elapsed_ms: 0 },
            other => BranchError::ConnectFailed(other.to_string()),
        }
    }

    /// Map a driver error raised while running a query
    pub fn query(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => BranchError::NoRows,
            other => BranchError::QueryFailed(other.to_string()),
        }
    }
}
