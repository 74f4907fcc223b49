use crate::{
    cursor::{Cursor, CursorError},
    order::OrderSpec,
    plan::Direction,
    query::ProjectionRow,
    traits::Entity,
    value::Value,
};

/// Rows to request for one page: `page_size + 1`, the cheap has-more probe.
pub(super) const fn fetch_limit(page_size: u32) -> u32 {
    page_size.saturating_add(1)
}

/// Trim an over-fetched window back to page size and report the has-more
/// flag.
///
/// `Before`-direction rows arrive in inverted order (nearest-to-cursor
/// first); they are reversed back into forward order and the over-fetched
/// extra row drops from the head. `After` rows drop from the tail.
pub(super) fn trim_overfetch<T>(rows: &mut Vec<T>, page_size: usize, direction: Direction) -> bool {
    let has_more = rows.len() > page_size;

    match direction {
        Direction::After => rows.truncate(page_size),
        Direction::Before => {
            rows.reverse();
            if has_more {
                rows.remove(0);
            }
        }
    }

    has_more
}

/// Encode the two boundary cursors off a kept page.
pub(super) fn boundary_cursors<T>(
    rows: &[T],
    material: impl Fn(&T) -> Cursor,
) -> Result<(Option<String>, Option<String>), CursorError> {
    let Some(first) = rows.first() else {
        return Ok((None, None));
    };
    let Some(last) = rows.last() else {
        return Ok((None, None));
    };

    let before = material(first).encode()?;
    let after = material(last).encode()?;

    Ok((Some(before), Some(after)))
}

/// Cursor material read off a fetched entity.
pub(super) fn cursor_from_entity<E: Entity>(entity: &E, order: &OrderSpec) -> Cursor {
    order
        .fields()
        .iter()
        .map(|(token, _)| (token.to_string(), entity.token_value(token)))
        .collect()
}

/// Cursor material read off a projection row.
pub(super) fn cursor_from_projection(row: &ProjectionRow, order: &OrderSpec) -> Cursor {
    order
        .fields()
        .iter()
        .map(|(token, _)| {
            let column = token.to_string();
            let value = row.value(&column).cloned().unwrap_or(Value::Null);
            (column, value)
        })
        .collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{fetch_limit, trim_overfetch};
    use crate::plan::Direction;

    #[test]
    fn after_direction_drops_the_overfetched_tail_row() {
        let mut rows = vec![1, 2, 3];
        let has_more = trim_overfetch(&mut rows, 2, Direction::After);

        assert!(has_more);
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn before_direction_reverses_and_drops_the_overfetched_head_row() {
        // Fetched under inverted order: nearest-to-cursor first.
        let mut rows = vec![4, 3, 2];
        let has_more = trim_overfetch(&mut rows, 2, Direction::Before);

        assert!(has_more);
        assert_eq!(rows, vec![3, 4]);
    }

    #[test]
    fn short_windows_report_no_more_rows() {
        let mut rows = vec![7, 8];
        assert!(!trim_overfetch(&mut rows, 2, Direction::After));
        assert_eq!(rows, vec![7, 8]);

        let mut rows = vec![8, 7];
        assert!(!trim_overfetch(&mut rows, 2, Direction::Before));
        assert_eq!(rows, vec![7, 8]);
    }

    #[test]
    fn fetch_limit_overfetches_exactly_one_row() {
        assert_eq!(fetch_limit(25), 26);
        assert_eq!(fetch_limit(u32::MAX), u32::MAX);
    }
}
