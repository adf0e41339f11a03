use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("File tree is not initialized")]
    NotInitialized,
    #[error("File tree is already initialized")]
    AlreadyInitialized,
    #[error("Bad path: {0}")]
    BadPath(String),
    #[error("Conflicting path: {0}")]
    ConflictingPath(String),
    #[error("No such path: {0}")]
    NoSuchPath(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Not a file: {0}")]
    NotAFile(String),
    #[error("Already in tree: {0}")]
    AlreadyInTree(String),
    #[error("Memory error: {0}")]
    MemoryError(String),
}

impl TreeError {
    pub fn code(&self) -> &str {
        match self {
            Self::NotInitialized => "FT_NOT_INITIALIZED",
            Self::AlreadyInitialized => "FT_ALREADY_INITIALIZED",
            Self::BadPath(_) => "FT_BAD_PATH",
            Self::ConflictingPath(_) => "FT_CONFLICTING_PATH",
            Self::NoSuchPath(_) => "FT_NO_SUCH_PATH",
            Self::NotADirectory(_) => "FT_NOT_A_DIRECTORY",
            Self::NotAFile(_) => "FT_NOT_A_FILE",
            Self::AlreadyInTree(_) => "FT_ALREADY_IN_TREE",
            Self::MemoryError(_) => "FT_MEMORY_ERROR",
        }
    }

    pub fn to_json_rpc_error(&self) -> serde_json::Value {
        serde_json::json!({
            "ftCode": self.code(),
            "message": self.to_string(),
        })
    }
}

impl From<std::collections::TryReserveError> for TreeError {
    fn from(e: std::collections::TryReserveError) -> Self {
        Self::MemoryError(e.to_string())
    }
}

/// Failures of the JSON-RPC front end, wrapping tree errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Unknown method: {0}")]
    MethodNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
