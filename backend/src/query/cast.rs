//! Casting `where` operands to the stored type of known fields.
//!
//! Clients write deadlines the way they send them on create (`"2030-01-01"`,
//! epoch millis) and booleans as strings. Documents hold canonical values,
//! so operands on typed fields are rewritten before matching.

use serde_json::Value;
use shared::{format_timestamp, parse_timestamp};

use super::filter::{Condition, Filter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Stored as millisecond RFC 3339 UTC text.
    Timestamp,
    Boolean,
}

/// Typed fields of one collection.
pub type Schema = &'static [(&'static str, FieldKind)];

impl Filter {
    /// Rewrites operands on the fields named in `schema`. Values that do not
    /// cast are left alone and simply fail to match.
    pub fn cast(&mut self, schema: Schema) {
        match self {
            Self::And(clauses) | Self::Or(clauses) | Self::Nor(clauses) => {
                for clause in clauses {
                    clause.cast(schema);
                }
            }
            Self::Field { path, conditions } => {
                let Some(kind) = schema
                    .iter()
                    .find(|(field, _)| field == path)
                    .map(|(_, kind)| *kind)
                else {
                    return;
                };
                for condition in conditions {
                    condition.cast(kind);
                }
            }
        }
    }
}

impl Condition {
    fn cast(&mut self, kind: FieldKind) {
        match self {
            Self::Eq(value)
            | Self::Ne(value)
            | Self::Gt(value)
            | Self::Gte(value)
            | Self::Lt(value)
            | Self::Lte(value) => cast_value(value, kind),
            Self::In(values) | Self::Nin(values) => {
                for value in values {
                    cast_value(value, kind);
                }
            }
            Self::Exists(_) | Self::Size(_) => {}
        }
    }
}

fn cast_value(value: &mut Value, kind: FieldKind) {
    let cast = match kind {
        FieldKind::Timestamp => timestamp(value),
        FieldKind::Boolean => boolean(value),
    };
    if let Some(cast) = cast {
        *value = cast;
    }
}

fn timestamp(value: &Value) -> Option<Value> {
    let parsed = match value {
        Value::String(text) => parse_timestamp(text)?,
        Value::Number(millis) => parse_timestamp(&millis.as_i64()?.to_string())?,
        _ => return None,
    };
    Some(Value::String(format_timestamp(&parsed)))
}

fn boolean(value: &Value) -> Option<Value> {
    let flag = match value {
        Value::String(text) => match text.as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return None,
        },
        Value::Number(number) => match number.as_i64()? {
            1 => true,
            0 => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Value::Bool(flag))
}
