use thiserror::Error;

/// Fieldless discriminant of [`CellarError`], for callers that branch on
/// the failure class only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    InvalidState,
    TableDisabled,
    RowNotFound,
    UnknownColumnFamily,
    UnknownColumn,
    IoFailure,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CellarError {
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("table is disabled: {0}")]
    TableDisabled(String),
    #[error("row not found: {0}")]
    RowNotFound(String),
    #[error("unknown column family: {0}")]
    UnknownColumnFamily(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("storage error: {0}")]
    Io(String),
}

impl CellarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CellarError::TableNotFound(_) => ErrorKind::NotFound,
            CellarError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CellarError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CellarError::InvalidState(_) => ErrorKind::InvalidState,
            CellarError::TableDisabled(_) => ErrorKind::TableDisabled,
            CellarError::RowNotFound(_) => ErrorKind::RowNotFound,
            CellarError::UnknownColumnFamily(_) => ErrorKind::UnknownColumnFamily,
            CellarError::UnknownColumn(_) => ErrorKind::UnknownColumn,
            CellarError::Io(_) => ErrorKind::IoFailure,
        }
    }
}

impl From<std::io::Error> for CellarError {
    fn from(err: std::io::Error) -> Self {
        CellarError::Io(err.to_string())
    }
}
