//! Pagination planning and execution over composed relational queries.
//!
//! One call plans and executes one page: the requested order is normalized
//! into a strict total order, the query's join shape is classified, a
//! strategy is selected, and at most two store queries assemble the page.
//! Cursor mode walks a keyset window in either direction; offset mode
//! windows with OFFSET/LIMIT under the same classifier.
//!
//! ## Crate layout
//! - `cursor`: opaque cursor token codec and validation.
//! - `error`: crate-level error aggregation.
//! - `executor`: the strategy implementations and the two entry points.
//! - `graph`: join-graph resolution seam and eager-load declarations.
//! - `order`: order tokens, directions, and normalization.
//! - `page`: page payload types.
//! - `plan`: per-call request and plan types.
//! - `query`: the composed-query surface pagination shapes.
//! - `shape` / `strategy`: classification and strategy selection.
//! - `source`: the data-store client seam.
//! - `traits` / `value`: entity access and the scalar value model.
//!
//! The `prelude` module mirrors the surface a caller paginating queries
//! actually touches.

pub mod cursor;
pub mod error;
pub mod executor;
pub mod graph;
pub mod order;
pub mod page;
pub mod plan;
pub mod query;
pub mod shape;
pub mod source;
pub mod strategy;
pub mod traits;
pub mod value;

mod keyset;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        cursor::{Cursor, CursorError},
        error::{ConfigError, Error},
        executor::{CursorExecutor, ExecuteError, ExecutionTrace, OffsetExecutor},
        graph::{Binding, Cardinality, EagerLoadSpec, EagerLoadStrategy, GraphError, JoinGraph},
        order::{FieldToken, NullPosition, OrderDirection, OrderSpec},
        page::{CursorPage, OffsetPage},
        plan::{CursorPageRequest, Direction, OffsetPageRequest, PageLimits},
        query::{CompareOp, FilterExpr, JoinNode, SelectQuery},
        source::{RowSource, SourceError},
        strategy::Strategy,
        traits::Entity,
        value::Value,
    };
}
