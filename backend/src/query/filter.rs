use std::cmp::Ordering;

use serde_json::Value;

use super::sort::{compare_values, type_rank};
use super::{Document, QueryError};

/// A compiled `where` clause.
///
/// Parsing validates every operator up front so a bad filter is rejected
/// even when the collection is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// All clauses must match. The empty conjunction matches everything.
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Field {
        path: String,
        conditions: Vec<Condition>,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Self::And(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Size(usize),
}

impl Filter {
    pub fn parse(value: &Value) -> Result<Self, QueryError> {
        let Value::Object(clauses) = value else {
            return Err(QueryError::NotAnObject { param: "where" });
        };

        let mut parsed = Vec::with_capacity(clauses.len());
        for (key, operand) in clauses {
            let clause = match key.as_str() {
                "$and" => Self::And(Self::parse_list(key, operand)?),
                "$or" => Self::Or(Self::parse_list(key, operand)?),
                "$nor" => Self::Nor(Self::parse_list(key, operand)?),
                op if op.starts_with('$') => {
                    return Err(QueryError::UnknownOperator(op.to_string()))
                }
                path => Self::Field {
                    path: path.to_string(),
                    conditions: parse_conditions(operand)?,
                },
            };
            parsed.push(clause);
        }

        Ok(if parsed.len() == 1 {
            parsed.remove(0)
        } else {
            Self::And(parsed)
        })
    }

    fn parse_list(op: &str, operand: &Value) -> Result<Vec<Self>, QueryError> {
        match operand {
            Value::Array(items) if !items.is_empty() => items.iter().map(Self::parse).collect(),
            _ => Err(QueryError::BadOperand {
                op: op.to_string(),
                expected: "a non-empty array of filters",
            }),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(doc)),
            Self::Or(clauses) => clauses.iter().any(|clause| clause.matches(doc)),
            Self::Nor(clauses) => !clauses.iter().any(|clause| clause.matches(doc)),
            Self::Field { path, conditions } => {
                let field = lookup(doc, path);
                conditions.iter().all(|condition| condition.matches(field))
            }
        }
    }

    /// Equality filter on one field, the shape bookkeeping updates use.
    pub fn field_eq(path: impl Into<String>, value: Value) -> Self {
        Self::Field {
            path: path.into(),
            conditions: vec![Condition::Eq(value)],
        }
    }
}

fn parse_conditions(operand: &Value) -> Result<Vec<Condition>, QueryError> {
    let operators = match operand {
        Value::Object(map) if map.keys().any(|key| key.starts_with('$')) => map,
        _ => return Ok(vec![Condition::Eq(operand.clone())]),
    };

    operators
        .iter()
        .map(|(op, value)| {
            let condition = match op.as_str() {
                "$eq" => Condition::Eq(value.clone()),
                "$ne" => Condition::Ne(value.clone()),
                "$gt" => Condition::Gt(value.clone()),
                "$gte" => Condition::Gte(value.clone()),
                "$lt" => Condition::Lt(value.clone()),
                "$lte" => Condition::Lte(value.clone()),
                "$in" => Condition::In(array_operand(op, value)?),
                "$nin" => Condition::Nin(array_operand(op, value)?),
                "$exists" => Condition::Exists(truthy(value)),
                "$size" => Condition::Size(value.as_u64().map_or_else(
                    || {
                        Err(QueryError::BadOperand {
                            op: op.clone(),
                            expected: "a non-negative integer",
                        })
                    },
                    |size| Ok(size as usize),
                )?),
                other => return Err(QueryError::UnknownOperator(other.to_string())),
            };
            Ok(condition)
        })
        .collect()
}

fn array_operand(op: &str, value: &Value) -> Result<Vec<Value>, QueryError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(QueryError::BadOperand {
            op: op.to_string(),
            expected: "an array",
        }),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Self::Eq(expected) => equals(field, expected),
            Self::Ne(expected) => !equals(field, expected),
            Self::Gt(bound) => compares(field, bound, |ord| ord == Ordering::Greater),
            Self::Gte(bound) => compares(field, bound, |ord| ord != Ordering::Less),
            Self::Lt(bound) => compares(field, bound, |ord| ord == Ordering::Less),
            Self::Lte(bound) => compares(field, bound, |ord| ord != Ordering::Greater),
            Self::In(candidates) => candidates.iter().any(|candidate| equals(field, candidate)),
            Self::Nin(candidates) => !candidates.iter().any(|candidate| equals(field, candidate)),
            Self::Exists(expected) => field.is_some() == *expected,
            Self::Size(size) => matches!(field, Some(Value::Array(items)) if items.len() == *size),
        }
    }
}

/// Resolves a dotted path through nested objects.
pub(super) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Equality with array membership: an array field equals a scalar it contains.
/// A missing field equals `null`.
fn equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| same_value(item, expected))
        }
        Some(value) => same_value(value, expected),
    }
}

fn same_value(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Range comparison only between values of the same type class.
fn compares(field: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |value: &Value| {
        type_rank(Some(value)) == type_rank(Some(bound))
            && accept(compare_values(Some(value), Some(bound)))
    };
    match field {
        None => false,
        Some(Value::Array(items)) if !bound.is_array() => items.iter().any(check),
        Some(value) => check(value),
    }
}
