use serde_json::Value;

use super::{Document, QueryError};

const ID_FIELD: &str = "_id";

/// Field selection from a `select` parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    #[default]
    All,
    /// Keep only these fields; `_id` is kept unless `keep_id` is false.
    Include { fields: Vec<String>, keep_id: bool },
    Exclude(Vec<String>),
}

impl Projection {
    pub fn parse(value: &Value) -> Result<Self, QueryError> {
        let Value::Object(fields) = value else {
            return Err(QueryError::NotAnObject { param: "select" });
        };

        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut id_flag = None;

        for (field, flag) in fields {
            let keep = match flag {
                Value::Bool(keep) => *keep,
                Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                _ => return Err(QueryError::ProjectionValue(field.clone())),
            };
            if field == ID_FIELD {
                id_flag = Some(keep);
            } else if keep {
                included.push(field.clone());
            } else {
                excluded.push(field.clone());
            }
        }

        match (included.is_empty(), excluded.is_empty(), id_flag) {
            (false, false, _) => Err(QueryError::MixedProjection),
            (false, true, keep_id) => Ok(Self::Include {
                fields: included,
                keep_id: keep_id.unwrap_or(true),
            }),
            (true, false, Some(true)) => Err(QueryError::MixedProjection),
            (true, false, keep_id) => {
                if keep_id == Some(false) {
                    excluded.push(ID_FIELD.to_string());
                }
                Ok(Self::Exclude(excluded))
            }
            (true, true, Some(true)) => Ok(Self::Include {
                fields: Vec::new(),
                keep_id: true,
            }),
            (true, true, Some(false)) => Ok(Self::Exclude(vec![ID_FIELD.to_string()])),
            (true, true, None) => Ok(Self::All),
        }
    }

    pub fn apply(&self, mut doc: Document) -> Document {
        match self {
            Self::All => doc,
            Self::Include { fields, keep_id } => {
                doc.retain(|key, _| (*keep_id && key == ID_FIELD) || fields.contains(key));
                doc
            }
            Self::Exclude(fields) => {
                doc.retain(|key, _| !fields.contains(key));
                doc
            }
        }
    }
}
