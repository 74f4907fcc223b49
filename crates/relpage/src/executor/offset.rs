use crate::{
    error::Error,
    executor::{
        ExecutionTrace, ensure_unique_keys, projection::order_projection, rehydrate_by_keys,
        separate_loads,
        window::{fetch_limit, trim_overfetch},
    },
    graph::JoinGraph,
    page::OffsetPage,
    plan::{Direction, PaginationPlan},
    source::RowSource,
    strategy::Strategy,
    traits::Entity,
};

/// Offset-mode execution. The direct path windows the composed query with
/// OFFSET/LIMIT; unsafe shapes fall back to the same keys-then-refetch split
/// cursor mode uses, with the offset applied to the DISTINCT key window.
pub(super) fn execute<E, G, S>(
    plan: &PaginationPlan,
    offset: u32,
    graph: &G,
    source: &S,
) -> Result<(OffsetPage<E>, ExecutionTrace), Error>
where
    E: Entity,
    G: JoinGraph,
    S: RowSource<E>,
{
    let shape = &plan.shape;
    let direct = shape.join_shape_safe
        && !(shape.has_through_join_eager_load && shape.has_to_many_eager_load);

    if direct {
        execute_direct(plan, offset, graph, source)
    } else {
        execute_split(plan, offset, graph, source)
    }
}

fn execute_direct<E, G, S>(
    plan: &PaginationPlan,
    offset: u32,
    graph: &G,
    source: &S,
) -> Result<(OffsetPage<E>, ExecutionTrace), Error>
where
    E: Entity,
    G: JoinGraph,
    S: RowSource<E>,
{
    // The trace reports the route actually run, not the cursor-mode
    // strategy the same shape would have selected.
    let mut trace = ExecutionTrace::new(Strategy::SingleQuery);

    let mut query = plan.query.clone();
    query.set_order(&plan.order);
    query.set_limit(fetch_limit(plan.page_size));
    query.set_offset(offset);

    let mut entries = source.fetch_entities(&query)?;
    trace.record_query(entries.len());

    let has_more = trim_overfetch(&mut entries, plan.page_size as usize, Direction::After);

    let loads = separate_loads(graph);
    if !loads.is_empty() && !entries.is_empty() {
        source.apply_eager_loads(&mut entries, &loads)?;
    }

    trace.rows_returned = entries.len();
    Ok((OffsetPage::new(entries, has_more, plan.page_size), trace))
}

fn execute_split<E, G, S>(
    plan: &PaginationPlan,
    offset: u32,
    graph: &G,
    source: &S,
) -> Result<(OffsetPage<E>, ExecutionTrace), Error>
where
    E: Entity,
    G: JoinGraph,
    S: RowSource<E>,
{
    let mut trace = ExecutionTrace::new(Strategy::KeysFirst);
    let projection = order_projection(plan, graph);

    let mut query = plan.query.clone();
    query.set_order(&plan.order);
    query.set_limit(fetch_limit(plan.page_size));
    query.set_offset(offset);
    query.set_distinct();

    let mut key_rows = source.fetch_projection(&query, &projection)?;
    trace.record_query(key_rows.len());

    let has_more = trim_overfetch(&mut key_rows, plan.page_size as usize, Direction::After);
    ensure_unique_keys(&key_rows, plan)?;

    let mut entries = rehydrate_by_keys(plan, &key_rows, graph, source, &mut trace)?;

    let loads = separate_loads(graph);
    if !loads.is_empty() && !entries.is_empty() {
        source.apply_eager_loads(&mut entries, &loads)?;
    }

    trace.rows_returned = entries.len();
    Ok((OffsetPage::new(entries, has_more, plan.page_size), trace))
}
