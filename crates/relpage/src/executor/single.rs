use crate::{
    error::Error,
    executor::{
        ExecutionTrace, separate_loads,
        window::{boundary_cursors, cursor_from_entity, fetch_limit, trim_overfetch},
    },
    graph::JoinGraph,
    keyset::keyset_filter,
    page::CursorPage,
    plan::PaginationPlan,
    source::RowSource,
    traits::Entity,
};

/// SingleQuery strategy: one query returns root entities directly and the
/// cursor material is read off the returned rows.
///
/// Only selected when the join shape is safe and every order field is
/// extractable, so the row limit counts distinct roots by construction.
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

    let mut query = plan.query.clone();
    if let Some(cursor) = plan.cursor.as_ref() {
        query.and_filter(keyset_filter(&effective, cursor, |direction| {
            source.default_null_position(direction)
        }));
    }
    query.set_order(&effective);
    query.set_limit(fetch_limit(plan.page_size));

    let mut rows = source.fetch_entities(&query)?;
    trace.record_query(rows.len());

    let has_more = trim_overfetch(&mut rows, plan.page_size as usize, plan.direction);

    let loads = separate_loads(graph);
    if !loads.is_empty() && !rows.is_empty() {
        source.apply_eager_loads(&mut rows, &loads)?;
    }

    let (cursor_before, cursor_after) =
        boundary_cursors(&rows, |entity| cursor_from_entity(entity, &plan.order))?;

    trace.rows_returned = rows.len();
    let page = CursorPage::new(rows, has_more, cursor_before, cursor_after, plan.page_size);

    Ok((page, trace))
}
