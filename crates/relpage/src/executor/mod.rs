pub(crate) mod keys_first;
pub(crate) mod offset;
pub(crate) mod projection;
pub(crate) mod single;
mod trace;
mod window;

pub use trace::ExecutionTrace;

use crate::{
    error::Error,
    graph::{EagerLoadSpec, EagerLoadStrategy, JoinGraph, ResolveCache},
    order::{FieldToken, OrderDirection},
    page::{CursorPage, OffsetPage},
    plan::{
        CursorPageRequest, OffsetPageRequest, PageLimits, PaginationPlan, build_cursor_plan,
        build_offset_plan,
    },
    query::{ProjectionRow, SelectQuery},
    source::RowSource,
    strategy::Strategy,
    traits::Entity,
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ExecuteError
///
/// Failures raised while executing a pagination plan. All fatal; a page is
/// either fully assembled or the call fails as a whole.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ExecuteError {
    #[error(
        "page of keys contains duplicate root keys; ordering by [{}] multiplies root rows \
         (order by a to-many field requires an aggregate)",
        order_fields.join(", ")
    )]
    DuplicateKeys { order_fields: Vec<String> },

    #[error("key {key} from the key-determination phase has no matching row in the re-fetch phase")]
    MissingKey { key: String },
}

///
/// CursorExecutor
///
/// Entry point for cursor-mode pagination. One call builds one immutable
/// plan, issues at most two store queries, and assembles one page; nothing
/// survives the call.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct CursorExecutor {
    limits: PageLimits,
    debug: bool,
}

impl CursorExecutor {
    #[must_use]
    pub const fn new(limits: PageLimits) -> Self {
        Self {
            limits,
            debug: false,
        }
    }

    /// Enable debug logging for subsequent calls on this executor.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Execute one cursor-mode page request.
    pub fn execute<E, G, S>(
        &self,
        query: SelectQuery,
        order: &[(FieldToken, OrderDirection)],
        request: &CursorPageRequest,
        graph: &G,
        source: &S,
    ) -> Result<CursorPage<E>, Error>
    where
        E: Entity,
        G: JoinGraph,
        S: RowSource<E>,
    {
        self.execute_with_trace(query, order, request, graph, source)
            .map(|(page, _)| page)
    }

    /// Execute one cursor-mode page request and return the execution trace.
    pub fn execute_with_trace<E, G, S>(
        &self,
        query: SelectQuery,
        order: &[(FieldToken, OrderDirection)],
        request: &CursorPageRequest,
        graph: &G,
        source: &S,
    ) -> Result<(CursorPage<E>, ExecutionTrace), Error>
    where
        E: Entity,
        G: JoinGraph,
        S: RowSource<E>,
    {
        let mut cache = ResolveCache::new();
        let plan = build_cursor_plan(query, order, request, self.limits, graph, &mut cache)?;
        self.debug_log_plan(&plan);

        match plan.strategy {
            Strategy::SingleQuery => single::execute(&plan, graph, source),
            Strategy::CursorProjection => projection::execute(&plan, graph, source),
            Strategy::KeysFirst => keys_first::execute(&plan, graph, source),
        }
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    // Emit a compact debug summary for one pagination plan.
    fn debug_log_plan(&self, plan: &PaginationPlan) {
        if !self.debug {
            return;
        }

        self.debug_log(format!(
            "CursorPage: strategy={} direction={:?} page_size={}",
            plan.strategy.as_str(),
            plan.direction,
            plan.page_size,
        ));
        self.debug_log(format!(
            "Shape: safe={} extractable={} to_many_eager={} through_join_eager={}",
            plan.shape.join_shape_safe,
            plan.shape.fields_extractable,
            plan.shape.has_to_many_eager_load,
            plan.shape.has_through_join_eager_load,
        ));
    }
}

///
/// OffsetExecutor
///
/// Entry point for page/offset-style pagination. Shares the classifier and
/// keys-first mechanics with cursor mode; exposes no cursors.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct OffsetExecutor {
    limits: PageLimits,
    debug: bool,
}

impl OffsetExecutor {
    #[must_use]
    pub const fn new(limits: PageLimits) -> Self {
        Self {
            limits,
            debug: false,
        }
    }

    /// Enable debug logging for subsequent calls on this executor.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Execute one offset-mode page request.
    pub fn execute<E, G, S>(
        &self,
        query: SelectQuery,
        order: &[(FieldToken, OrderDirection)],
        request: &OffsetPageRequest,
        graph: &G,
        source: &S,
    ) -> Result<OffsetPage<E>, Error>
    where
        E: Entity,
        G: JoinGraph,
        S: RowSource<E>,
    {
        self.execute_with_trace(query, order, request, graph, source)
            .map(|(page, _)| page)
    }

    /// Execute one offset-mode page request and return the execution trace.
    pub fn execute_with_trace<E, G, S>(
        &self,
        query: SelectQuery,
        order: &[(FieldToken, OrderDirection)],
        request: &OffsetPageRequest,
        graph: &G,
        source: &S,
    ) -> Result<(OffsetPage<E>, ExecutionTrace), Error>
    where
        E: Entity,
        G: JoinGraph,
        S: RowSource<E>,
    {
        let mut cache = ResolveCache::new();
        let plan = build_offset_plan(query, order, request, self.limits, graph, &mut cache)?;

        let result = offset::execute(&plan, request.offset, graph, source);
        if self.debug {
            if let Ok((_, trace)) = &result {
                println!(
                    "[debug] OffsetPage: route={} offset={} page_size={}",
                    trace.strategy.as_str(),
                    request.offset,
                    plan.page_size,
                );
            }
        }

        result
    }
}

// Eager-loads that materialize as separate follow-up queries, to-many
// (deferred) ones included; applied to entities after they are fetched.
fn separate_loads(graph: &impl JoinGraph) -> Vec<EagerLoadSpec> {
    graph
        .eager_loads()
        .iter()
        .filter(|load| load.strategy == EagerLoadStrategy::Separate)
        .cloned()
        .collect()
}

// Associations whose eager-load rides the join graph; phase-two re-fetch
// queries must keep these joins alive.
fn through_join_associations(graph: &impl JoinGraph) -> BTreeSet<String> {
    graph
        .eager_loads()
        .iter()
        .filter(|load| load.strategy == EagerLoadStrategy::ThroughJoin)
        .map(|load| load.association.clone())
        .collect()
}

// A duplicated root key inside one key page means the row limit counted a
// multiplied root more than once; silently deduplicating would corrupt the
// has-more accounting, so this fails instead.
fn ensure_unique_keys(
    rows: &[ProjectionRow],
    plan: &PaginationPlan,
) -> Result<(), ExecuteError> {
    for (idx, row) in rows.iter().enumerate() {
        let duplicated = rows[..idx].iter().any(|seen| seen.key == row.key);
        if duplicated {
            return Err(ExecuteError::DuplicateKeys {
                order_fields: plan
                    .order
                    .fields()
                    .iter()
                    .map(|(token, _)| token.to_string())
                    .collect(),
            });
        }
    }

    Ok(())
}

// Re-fetch full entities for a page of key rows and restore phase-one
// order. Every key must come back; a miss is a phase race or adapter bug.
fn rehydrate_by_keys<E, G, S>(
    plan: &PaginationPlan,
    key_rows: &[ProjectionRow],
    graph: &G,
    source: &S,
    trace: &mut ExecutionTrace,
) -> Result<Vec<E>, Error>
where
    E: Entity,
    G: JoinGraph,
    S: RowSource<E>,
{
    if key_rows.is_empty() {
        return Ok(Vec::new());
    }

    let key_fields = graph.root_primary_key().to_vec();
    let keys: Vec<Vec<crate::value::Value>> =
        key_rows.iter().map(|row| row.key.clone()).collect();
    let refetch = plan.query.stripped_for_refetch(
        &key_fields,
        keys,
        &through_join_associations(graph),
    );

    let fetched = source.fetch_entities(&refetch)?;
    trace.record_query(fetched.len());

    let mut ordered = Vec::with_capacity(key_rows.len());
    for row in key_rows {
        let entity = fetched
            .iter()
            .find(|entity| entity.key_tuple(&key_fields) == row.key)
            .ok_or_else(|| ExecuteError::MissingKey {
                key: format!("{:?}", row.key),
            })?;
        ordered.push(entity.clone());
    }

    Ok(ordered)
}
