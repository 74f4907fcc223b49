use crate::{
    error::Error,
    executor::{
        ExecutionTrace, ensure_unique_keys, projection::order_projection, rehydrate_by_keys,
        separate_loads,
        window::{boundary_cursors, cursor_from_projection, fetch_limit, trim_overfetch},
    },
    graph::JoinGraph,
    keyset::keyset_filter,
    page::CursorPage,
    plan::PaginationPlan,
    source::RowSource,
    traits::Entity,
};

/// KeysFirst strategy: the window query runs over the full join graph as a
/// DISTINCT select of key and order columns, then a key-filtered re-fetch
/// hydrates the page.
///
/// The fallback for unsafe join shapes; DISTINCT collapses the row
/// multiplication that to-many and raw joins introduce, so the limit counts
/// distinct roots again.
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
    query.set_distinct();

    let mut key_rows = source.fetch_projection(&query, &projection)?;
    trace.record_query(key_rows.len());

    let has_more = trim_overfetch(&mut key_rows, plan.page_size as usize, plan.direction);

    // DISTINCT spans the key AND the order columns; a root ordered by a
    // to-many field can still survive as several rows.
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
