use crate::{
    error::Error,
    executor::{
        ExecutionTrace, ensure_unique_keys, rehydrate_by_keys, separate_loads,
        window::{boundary_cursors, cursor_from_projection, fetch_limit, trim_overfetch},
    },
    graph::JoinGraph,
    keyset::keyset_filter,
    page::CursorPage,
    plan::PaginationPlan,
    query::ProjectionMap,
    source::RowSource,
    traits::Entity,
};

/// CursorProjection strategy: the window query selects key and order columns
/// instead of full entities, then a key-filtered re-fetch hydrates the page.
///
/// Selected when the join shape is safe but some order field cannot be read
/// off a returned entity; cursor material comes from the projection rows.
pub(super) fn execute<E, G, S>(
    plan: &PaginationPlan,
    graph: &G,
    source: &S,
) -> Result<(CursorPage<E>, ExecutionTrace), Error>
where
    E: Entity,
    G: JoinGraph,
    S: RowSource<E>,
{
    let mut trace = ExecutionTrace::new(plan.strategy);
    let effective = plan.effective_order();
    let projection = order_projection(plan, graph);

    let mut query = plan.query.clone();
    if let Some(cursor) = plan.cursor.as_ref() {
        query.and_filter(keyset_filter(&effective, cursor, |direction| {
            source.default_null_position(direction)
        }));
    }
    query.set_order(&effective);
    query.set_limit(fetch_limit(plan.page_size));

    let mut key_rows = source.fetch_projection(&query, &projection)?;
    trace.record_query(key_rows.len());

    let has_more = trim_overfetch(&mut key_rows, plan.page_size as usize, plan.direction);
    ensure_unique_keys(&key_rows, plan)?;

    let mut entries = rehydrate_by_keys(plan, &key_rows, graph, source, &mut trace)?;

    let loads = separate_loads(graph);
    if !loads.is_empty() && !entries.is_empty() {
        source.apply_eager_loads(&mut entries, &loads)?;
    }

    let (cursor_before, cursor_after) =
        boundary_cursors(&key_rows, |row| cursor_from_projection(row, &plan.order))?;

    trace.rows_returned = entries.len();
    let page = CursorPage::new(entries, has_more, cursor_before, cursor_after, plan.page_size);

    Ok((page, trace))
}

// Split-strategy plans always carry a projection; falling back here keeps
// the executor total without an unreachable branch.
pub(super) fn order_projection(plan: &PaginationPlan, graph: &impl JoinGraph) -> ProjectionMap {
    plan.projection
        .clone()
        .unwrap_or_else(|| ProjectionMap::for_order(graph.root_primary_key(), &plan.order))
}
