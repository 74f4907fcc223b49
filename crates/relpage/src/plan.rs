use crate::{
    cursor::Cursor,
    error::{ConfigError, Error},
    graph::{JoinGraph, ResolveCache},
    order::{FieldToken, OrderDirection, OrderSpec, normalize},
    query::{ProjectionMap, SelectQuery},
    shape::{QueryShape, classify},
    strategy::{Strategy, select},
};
use serde::{Deserialize, Serialize};

///
/// Direction
/// Which side of the cursor a page request travels toward.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    After,
    Before,
}

///
/// PageLimits
/// Configured page-size ceiling. Requests above the ceiling are capped
/// silently; a missing ceiling leaves requested sizes untouched.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PageLimits {
    pub max_page_size: Option<u32>,
}

impl PageLimits {
    #[must_use]
    pub const fn capped(max_page_size: u32) -> Self {
        Self {
            max_page_size: Some(max_page_size),
        }
    }

    /// Resolve a requested page size against the ceiling.
    ///
    /// Zero fails as a configuration error; negative sizes are
    /// unrepresentable here by construction.
    pub const fn resolve(&self, requested: u32) -> Result<u32, ConfigError> {
        if requested == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        Ok(match self.max_page_size {
            Some(max) if requested > max => max,
            _ => requested,
        })
    }
}

///
/// CursorPageRequest
/// One cursor-mode page request. The cursor is absent on the first page.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CursorPageRequest {
    pub page_size: u32,
    pub cursor: Option<String>,
    pub direction: Direction,
}

impl CursorPageRequest {
    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        Self {
            page_size,
            cursor: None,
            direction: Direction::After,
        }
    }

    #[must_use]
    pub fn after(page_size: u32, cursor: impl Into<String>) -> Self {
        Self {
            page_size,
            cursor: Some(cursor.into()),
            direction: Direction::After,
        }
    }

    #[must_use]
    pub fn before(page_size: u32, cursor: impl Into<String>) -> Self {
        Self {
            page_size,
            cursor: Some(cursor.into()),
            direction: Direction::Before,
        }
    }
}

///
/// OffsetPageRequest
/// One offset-mode page request.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OffsetPageRequest {
    pub page_size: u32,
    pub offset: u32,
}

impl OffsetPageRequest {
    #[must_use]
    pub const fn new(page_size: u32, offset: u32) -> Self {
        Self { page_size, offset }
    }
}

///
/// PaginationPlan
///
/// Immutable, request-scoped execution plan: everything decided before the
/// first store call. Built once per call, owned by that call, never shared
/// or re-decided.
///

#[derive(Clone, Debug)]
pub struct PaginationPlan {
    pub page_size: u32,
    pub direction: Direction,
    pub order: OrderSpec,
    pub shape: QueryShape,
    pub strategy: Strategy,
    pub cursor: Option<Cursor>,
    pub projection: Option<ProjectionMap>,
    pub query: SelectQuery,
}

impl PaginationPlan {
    /// The order the store query actually executes under: inverted
    /// component-wise for `before` requests.
    #[must_use]
    pub fn effective_order(&self) -> OrderSpec {
        match self.direction {
            Direction::After => self.order.clone(),
            Direction::Before => self.order.inverted(),
        }
    }
}

/// Build the plan for one cursor-mode pagination call.
pub(crate) fn build_cursor_plan(
    query: SelectQuery,
    requested_order: &[(FieldToken, OrderDirection)],
    request: &CursorPageRequest,
    limits: PageLimits,
    graph: &impl JoinGraph,
    cache: &mut ResolveCache,
) -> Result<PaginationPlan, Error> {
    let (order, shape, page_size) =
        prepare(&query, requested_order, request.page_size, limits, graph, cache)?;

    let cursor = match request.cursor.as_deref() {
        Some(token) => {
            let cursor = Cursor::decode(token)?;
            cursor.validate_matches_order(&order)?;
            Some(cursor)
        }
        None => None,
    };

    let strategy = select(&shape);
    let projection = match strategy {
        Strategy::SingleQuery => None,
        Strategy::CursorProjection | Strategy::KeysFirst => Some(ProjectionMap::for_order(
            graph.root_primary_key(),
            &order,
        )),
    };

    Ok(PaginationPlan {
        page_size,
        direction: request.direction,
        order,
        shape,
        strategy,
        cursor,
        projection,
        query,
    })
}

/// Build the plan for one offset-mode pagination call. Offset mode shares
/// classification and strategy mechanics but carries no cursor.
pub(crate) fn build_offset_plan(
    query: SelectQuery,
    requested_order: &[(FieldToken, OrderDirection)],
    request: &OffsetPageRequest,
    limits: PageLimits,
    graph: &impl JoinGraph,
    cache: &mut ResolveCache,
) -> Result<PaginationPlan, Error> {
    let (order, shape, page_size) =
        prepare(&query, requested_order, request.page_size, limits, graph, cache)?;

    let strategy = select(&shape);
    let projection = match strategy {
        Strategy::SingleQuery => None,
        Strategy::CursorProjection | Strategy::KeysFirst => Some(ProjectionMap::for_order(
            graph.root_primary_key(),
            &order,
        )),
    };

    Ok(PaginationPlan {
        page_size,
        direction: Direction::After,
        order,
        shape,
        strategy,
        cursor: None,
        projection,
        query,
    })
}

// Shared plan-surface validation: select-list ownership, page size, order
// normalization, and shape classification.
fn prepare(
    query: &SelectQuery,
    requested_order: &[(FieldToken, OrderDirection)],
    requested_page_size: u32,
    limits: PageLimits,
    graph: &impl JoinGraph,
    cache: &mut ResolveCache,
) -> Result<(OrderSpec, QueryShape, u32), Error> {
    if query.has_custom_select() {
        return Err(ConfigError::CustomSelect.into());
    }

    let page_size = limits.resolve(requested_page_size)?;
    let order = normalize(requested_order, graph.root_primary_key(), query.has_order())?;
    let shape = classify(query, &order, graph, cache).map_err(|err| {
        ConfigError::UnsupportedOrderField {
            token: match &err {
                crate::graph::GraphError::UnknownToken { token } => token.clone(),
                crate::graph::GraphError::UnknownAssociation { association } => association.clone(),
            },
            reason: err.to_string(),
        }
    })?;

    Ok((order, shape, page_size))
}

///
/// TESTS
///
