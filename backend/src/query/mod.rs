//! Query-string driven document queries.
//!
//! List endpoints accept `where`, `sort` and `select` as JSON objects plus
//! `skip`, `limit` and `count`. This module parses those parameters into a
//! [`ListQuery`] and evaluates it against JSON documents.

mod cast;
mod filter;
mod projection;
mod sort;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

pub use cast::{FieldKind, Schema};
pub use filter::Filter;
pub use projection::Projection;
pub use sort::{compare_values, SortSpec};

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("'{param}' is not valid JSON: {source}")]
    Json {
        param: &'static str,
        source: serde_json::Error,
    },

    #[error("'{param}' must be a JSON object")]
    NotAnObject { param: &'static str },

    #[error("'{param}' must be a non-negative integer")]
    NotAnInteger { param: &'static str },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{op}' expects {expected}")]
    BadOperand { op: String, expected: &'static str },

    #[error("invalid sort direction for '{0}'")]
    SortDirection(String),

    #[error("invalid projection value for '{0}'")]
    ProjectionValue(String),

    #[error("projection cannot mix inclusion and exclusion")]
    MixedProjection,
}

/// Everything a list endpoint needs to answer one request.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Filter,
    pub sort: SortSpec,
    pub projection: Projection,
    pub skip: usize,
    /// `None` means no limit.
    pub limit: Option<usize>,
    pub count: bool,
}

impl ListQuery {
    /// Parses list parameters, applying `default_limit` when `limit` is absent.
    /// A limit of zero means unlimited.
    pub fn from_params(
        params: &HashMap<String, String>,
        default_limit: usize,
    ) -> Result<Self, QueryError> {
        let filter = match json_object(params, "where")? {
            Some(value) => Filter::parse(&value)?,
            None => Filter::default(),
        };
        let sort = match json_object(params, "sort")? {
            Some(value) => SortSpec::parse(&value)?,
            None => SortSpec::default(),
        };
        let limit = integer(params, "limit")?.unwrap_or(default_limit);

        Ok(Self {
            filter,
            sort,
            projection: projection_from_params(params)?,
            skip: integer(params, "skip")?.unwrap_or(0),
            limit: (limit > 0).then_some(limit),
            count: params.get("count").is_some_and(|raw| raw == "true"),
        })
    }

    /// Runs the query over `documents`: filter, sort, skip, limit, project.
    pub fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.filter.matches(doc))
            .collect();
        self.sort.sort(&mut matched);

        let window = matched.into_iter().skip(self.skip);
        let window: Vec<Document> = match self.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        };

        window
            .into_iter()
            .map(|doc| self.projection.apply(doc))
            .collect()
    }
}

/// Parses only the `select` parameter, used by single-document lookups.
pub fn projection_from_params(params: &HashMap<String, String>) -> Result<Projection, QueryError> {
    match json_object(params, "select")? {
        Some(value) => Projection::parse(&value),
        None => Ok(Projection::default()),
    }
}

fn json_object(
    params: &HashMap<String, String>,
    param: &'static str,
) -> Result<Option<Value>, QueryError> {
    let Some(raw) = params.get(param).filter(|raw| !raw.trim().is_empty()) else {
        return Ok(None);
    };
    let value: Value =
        serde_json::from_str(raw).map_err(|source| QueryError::Json { param, source })?;
    if !value.is_object() {
        return Err(QueryError::NotAnObject { param });
    }
    Ok(Some(value))
}

fn integer(
    params: &HashMap<String, String>,
    param: &'static str,
) -> Result<Option<usize>, QueryError> {
    let Some(raw) = params.get(param).filter(|raw| !raw.trim().is_empty()) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| QueryError::NotAnInteger { param })
}
