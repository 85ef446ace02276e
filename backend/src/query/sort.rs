use std::cmp::Ordering;

use serde_json::Value;

use super::filter::lookup;
use super::{Document, QueryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordered list of sort keys from a `sort` parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    keys: Vec<(String, Direction)>,
}

impl SortSpec {
    pub fn parse(value: &Value) -> Result<Self, QueryError> {
        let Value::Object(fields) = value else {
            return Err(QueryError::NotAnObject { param: "sort" });
        };

        let keys = fields
            .iter()
            .map(|(field, raw)| {
                let direction = match raw {
                    Value::Number(n) if n.as_f64().is_some_and(|n| n > 0.0) => {
                        Direction::Ascending
                    }
                    Value::Number(n) if n.as_f64().is_some_and(|n| n < 0.0) => {
                        Direction::Descending
                    }
                    Value::String(s) => match s.to_ascii_lowercase().as_str() {
                        "1" | "asc" | "ascending" => Direction::Ascending,
                        "-1" | "desc" | "descending" => Direction::Descending,
                        _ => return Err(QueryError::SortDirection(field.clone())),
                    },
                    _ => return Err(QueryError::SortDirection(field.clone())),
                };
                Ok((field.clone(), direction))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Stable in-place sort; documents equal on every key keep store order.
    pub fn sort(&self, documents: &mut [Document]) {
        if self.is_empty() {
            return;
        }
        documents.sort_by(|left, right| {
            self.keys
                .iter()
                .map(|(field, direction)| {
                    let ord = compare_values(lookup(left, field), lookup(right, field));
                    match direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }
}

/// Cross-type ordering bucket: missing and null first, booleans last.
pub(super) fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order over JSON values used by sorting and range operators.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let by_rank = type_rank(left).cmp(&type_rank(right));
    if by_rank.is_ne() {
        return by_rank;
    }
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Array(a)), Some(Value::Array(b))) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| compare_values(Some(x), Some(y)))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        _ => Ordering::Equal,
    }
}
