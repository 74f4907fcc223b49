use crate::{
    graph::EagerLoadSpec,
    order::{NullPosition, OrderDirection},
    query::{ProjectionMap, ProjectionRow, SelectQuery},
};
use thiserror::Error as ThisError;

///
/// SourceError
///
/// Failure raised by the data-store client. The engine never retries;
/// store failures propagate synchronously to the caller.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("data source failure: {message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// RowSource
///
/// Data-store client seam. SQL generation, connection handling, and
/// eager-load execution all live behind this trait; the engine only shapes
/// queries and interprets results.
///

pub trait RowSource<E> {
    /// Execute the query and return full root entities.
    fn fetch_entities(&self, query: &SelectQuery) -> Result<Vec<E>, SourceError>;

    /// Execute the query as a bare select over the projection map.
    fn fetch_projection(
        &self,
        query: &SelectQuery,
        projection: &ProjectionMap,
    ) -> Result<Vec<ProjectionRow>, SourceError>;

    /// Apply eager-loads to already-fetched entities (separate-query
    /// materialization, including deferred to-many loads).
    fn apply_eager_loads(
        &self,
        entities: &mut Vec<E>,
        loads: &[EagerLoadSpec],
    ) -> Result<(), SourceError>;

    /// The adapter's default NULL placement for an order direction that
    /// does not pin one. Varies per backend.
    fn default_null_position(&self, direction: OrderDirection) -> NullPosition;
}
