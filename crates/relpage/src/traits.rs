use crate::{order::FieldToken, value::Value};

///
/// Entity
///
/// Root entity seam used by executors to read cursor material off fetched
/// rows. Association access covers to-one associations that were eagerly
/// loaded onto the entity; anything else reads as absent.
///

pub trait Entity: Clone {
    /// Read a scalar field directly on the entity.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Read a scalar field on a loaded to-one association.
    fn association_value(&self, _association: &str, _field: &str) -> Option<Value> {
        None
    }

    /// Read the value a field token addresses, root or association.
    ///
    /// An absent value reads as SQL NULL, matching how an optional to-one
    /// association projects into a joined row.
    fn token_value(&self, token: &FieldToken) -> Value {
        let value = match token.association() {
            Some(association) => self.association_value(association, token.field()),
            None => self.field_value(token.field()),
        };

        value.unwrap_or(Value::Null)
    }

    /// Read the primary-key tuple for the given key fields.
    fn key_tuple(&self, key_fields: &[String]) -> Vec<Value> {
        key_fields
            .iter()
            .map(|field| self.field_value(field).unwrap_or(Value::Null))
            .collect()
    }
}
