use crate::{
    cursor::Cursor,
    order::{FieldToken, NullPosition, OrderDirection, OrderSpec},
    query::{CompareOp, FilterExpr},
    value::Value,
};

/// Build the keyset tie-break filter for one decoded cursor under an
/// already-effective order (inverted beforehand for `before` requests).
///
/// Standard disjunction of conjunctions: clause i holds all previous fields
/// equal to their cursor values and requires field i strictly past its
/// cursor value in the field's effective direction. NULL placement comes
/// from the direction itself when pinned, otherwise from the adapter
/// default lookup. At most two OR-branches per order field.
///
/// An empty disjunction (vacuously false) means nothing sorts strictly past
/// the cursor; callers get an empty page out of it naturally.
pub(crate) fn keyset_filter(
    order: &OrderSpec,
    cursor: &Cursor,
    resolve_nulls: impl Fn(OrderDirection) -> NullPosition,
) -> FilterExpr {
    let mut branches = Vec::with_capacity(order.len());

    for (idx, (token, direction)) in order.fields().iter().enumerate() {
        let value = cursor.get(&token.to_string()).cloned().unwrap_or(Value::Null);
        let null_position = direction
            .null_position()
            .unwrap_or_else(|| resolve_nulls(*direction));

        let Some(strict) = strict_clause(token.clone(), *direction, value, null_position) else {
            continue;
        };

        let mut clauses: Vec<FilterExpr> = order.fields()[..idx]
            .iter()
            .map(|(prev_token, _)| {
                let prev_value = cursor
                    .get(&prev_token.to_string())
                    .cloned()
                    .unwrap_or(Value::Null);
                equality_clause(prev_token.clone(), prev_value)
            })
            .collect();
        clauses.push(strict);

        branches.push(if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            FilterExpr::And(clauses)
        });
    }

    if branches.len() == 1 {
        branches.remove(0)
    } else {
        FilterExpr::Or(branches)
    }
}

// Tie on a previous field: NULL cursor values tie with NULL rows.
fn equality_clause(token: FieldToken, value: Value) -> FilterExpr {
    if value.is_null() {
        FilterExpr::IsNull(token)
    } else {
        FilterExpr::compare(token, CompareOp::Eq, value)
    }
}

// "Strictly past the cursor value" for one field, or None when no row can be.
fn strict_clause(
    token: FieldToken,
    direction: OrderDirection,
    value: Value,
    null_position: NullPosition,
) -> Option<FilterExpr> {
    if value.is_null() {
        return match null_position {
            // All NULLs are already behind; anything non-null is past.
            NullPosition::First => Some(FilterExpr::IsNotNull(token)),
            // NULLs sort last and the cursor sits inside the NULL group:
            // nothing is strictly past on this field, ties fall through.
            NullPosition::Last => None,
        };
    }

    let op = if direction.is_descending() {
        CompareOp::Lt
    } else {
        CompareOp::Gt
    };
    let past = FilterExpr::compare(token.clone(), op, value);

    match null_position {
        // The NULL group sits beyond every non-null value.
        NullPosition::Last => Some(FilterExpr::Or(vec![past, FilterExpr::IsNull(token)])),
        NullPosition::First => Some(past),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::keyset_filter;
    use crate::{
        cursor::Cursor,
        order::{FieldToken, NullPosition, OrderDirection, normalize},
        query::{CompareOp, FilterExpr},
        value::Value,
    };

    fn nulls_last(_direction: OrderDirection) -> NullPosition {
        NullPosition::Last
    }

    fn nulls_first(_direction: OrderDirection) -> NullPosition {
        NullPosition::First
    }

    #[test]
    fn single_field_ascending_emits_strict_greater_with_null_tail() {
        let order = normalize(&[], &["id".to_string()], false).expect("order should normalize");
        let cursor = Cursor::from_entries([("id".to_string(), Value::Int(5))]);

        let filter = keyset_filter(&order, &cursor, nulls_last);

        assert_eq!(
            filter,
            FilterExpr::Or(vec![
                FilterExpr::compare(FieldToken::root("id"), CompareOp::Gt, Value::Int(5)),
                FilterExpr::IsNull(FieldToken::root("id")),
            ])
        );
    }

    #[test]
    fn nulls_first_ascending_needs_no_null_branch() {
        let order = normalize(&[], &["id".to_string()], false).expect("order should normalize");
        let cursor = Cursor::from_entries([("id".to_string(), Value::Int(5))]);

        let filter = keyset_filter(&order, &cursor, nulls_first);

        assert_eq!(
            filter,
            FilterExpr::compare(FieldToken::root("id"), CompareOp::Gt, Value::Int(5))
        );
    }

    #[test]
    fn null_cursor_value_with_nulls_first_requires_non_null() {
        let order = normalize(
            &[(FieldToken::root("rank"), OrderDirection::AscNullsFirst)],
            &["id".to_string()],
            false,
        )
        .expect("order should normalize");
        let cursor = Cursor::from_entries([
            ("rank".to_string(), Value::Null),
            ("id".to_string(), Value::Int(3)),
        ]);

        let filter = keyset_filter(&order, &cursor, nulls_last);

        // Branch 1: past the NULL group on rank. Branch 2: rank ties as
        // NULL, id strictly past.
        assert_eq!(
            filter,
            FilterExpr::Or(vec![
                FilterExpr::IsNotNull(FieldToken::root("rank")),
                FilterExpr::And(vec![
                    FilterExpr::IsNull(FieldToken::root("rank")),
                    FilterExpr::Or(vec![
                        FilterExpr::compare(FieldToken::root("id"), CompareOp::Gt, Value::Int(3)),
                        FilterExpr::IsNull(FieldToken::root("id")),
                    ]),
                ]),
            ])
        );
    }

    #[test]
    fn null_cursor_value_with_nulls_last_skips_the_strict_branch() {
        let order = normalize(
            &[(FieldToken::root("rank"), OrderDirection::AscNullsLast)],
            &["id".to_string()],
            false,
        )
        .expect("order should normalize");
        let cursor = Cursor::from_entries([
            ("rank".to_string(), Value::Null),
            ("id".to_string(), Value::Int(3)),
        ]);

        let filter = keyset_filter(&order, &cursor, nulls_first);

        // Only the tie-break branch survives: rank IS NULL AND id > 3.
        assert_eq!(
            filter,
            FilterExpr::And(vec![
                FilterExpr::IsNull(FieldToken::root("rank")),
                FilterExpr::compare(FieldToken::root("id"), CompareOp::Gt, Value::Int(3)),
            ])
        );
    }

    #[test]
    fn descending_field_compares_strictly_less() {
        let order = normalize(
            &[(FieldToken::root("score"), OrderDirection::DescNullsFirst)],
            &["id".to_string()],
            false,
        )
        .expect("order should normalize");
        let cursor = Cursor::from_entries([
            ("score".to_string(), Value::Int(10)),
            ("id".to_string(), Value::Int(3)),
        ]);

        let filter = keyset_filter(&order, &cursor, nulls_first);

        let FilterExpr::Or(branches) = &filter else {
            panic!("multi-field keyset filter should be a disjunction");
        };
        assert_eq!(
            branches[0],
            FilterExpr::compare(FieldToken::root("score"), CompareOp::Lt, Value::Int(10))
        );
    }

    #[test]
    fn branch_count_stays_within_two_per_field() {
        let order = normalize(
            &[
                (FieldToken::root("a"), OrderDirection::AscNullsLast),
                (FieldToken::root("b"), OrderDirection::DescNullsLast),
            ],
            &["id".to_string()],
            false,
        )
        .expect("order should normalize");
        let cursor = Cursor::from_entries([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
            ("id".to_string(), Value::Int(3)),
        ]);

        let filter = keyset_filter(&order, &cursor, nulls_last);

        // Each top-level branch nests at most one extra null-tail OR.
        let FilterExpr::Or(branches) = filter else {
            panic!("multi-field keyset filter should be a disjunction");
        };
        assert_eq!(branches.len(), 3);
    }
}
