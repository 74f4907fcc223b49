use crate::{
    cursor::CursorError, executor::ExecuteError, graph::GraphError, source::SourceError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-level pagination failure. Every variant wraps one module's error
/// kind transparently so callers can branch on the class that matters to
/// them (stale cursor vs. mis-composed query vs. store fault).
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

///
/// ConfigError
///
/// The caller mis-composed the query or the request. Always fatal and never
/// retried; nothing about the data store can make these succeed.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("root schema has no primary key; pagination requires a strict total order")]
    NoPrimaryKey,

    #[error("base query already carries an order clause; ordering must come from the pagination request")]
    ConflictingBaseOrder,

    #[error("base query carries a custom select; pagination owns the select list")]
    CustomSelect,

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("order field '{token}' cannot be used for pagination: {reason}")]
    UnsupportedOrderField { token: String, reason: String },
}
