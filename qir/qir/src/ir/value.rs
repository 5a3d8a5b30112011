//! Leaf values: the `v` parameter of the IR.
//!
//! Trees start out holding [UnpreparedValue]s and are narrowed to
//! [PreparedValue]s by [crate::planner::prepare].
use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use serde::Serialize;

use crate::backend::{Backend, Representable};

/// A literal, as it arrives from the request.
#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Kept as text so that no precision is lost before the backend sees it.
    Numeric(String),
    Text(String),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnType<B: Backend> {
    Scalar(B::ScalarType),
    /// Reference to an enum table, by name.
    EnumReference(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnValue<B: Backend> {
    pub ty: ColumnType<B>,
    pub value: ScalarValue,
}

/// Where a parameter came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Provenance {
    /// A GraphQL variable (named) or an inline argument (unnamed).
    FromGraphQL { variable: Option<String> },
    /// Injected by the engine itself, e.g. a cursor decoded from the request.
    FromInternal(String),
}

/// A scalar that is not yet materialized.
#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum UnpreparedValue<B: Backend> {
    /// Part of the query itself.
    Literal(ScalarValue),
    /// A bound request value; becomes a prepared statement parameter.
    Parameter {
        provenance: Provenance,
        value: ColumnValue<B>,
    },
    /// A single session variable, cast to `ty`.
    SessionVariable { name: String, ty: B::ScalarType },
    /// The whole session, as a JSON object.
    Session,
}

/// A scalar in the form a backend code generator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum PreparedValue<B: Backend> {
    Literal(ScalarValue),
    /// 1-based index into [crate::planner::PlanningState::parameters].
    Param(usize),
    SessionVariable {
        name: String,
        ty: B::ScalarType,
    },
    Session,
}

/// Request session. Names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionVariables(IndexMap<String, String>);

impl SessionVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: AsRef<str>, V: Into<String>>(&mut self, name: K, value: V) {
        self.0.insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for SessionVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = SessionVariables::new();
        for (k, v) in iter {
            vars.insert(k, v);
        }
        vars
    }
}

/// A leaf type for every backend at once.
///
/// Remote source relationships cross into another backend, whose leaves must
/// be of the same *phase* (unprepared, prepared) but of that backend's type.
pub trait ValueFamily: Representable + Copy {
    type Value<B: Backend>: Representable;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Unprepared;

impl ValueFamily for Unprepared {
    type Value<B: Backend> = UnpreparedValue<B>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prepared;

impl ValueFamily for Prepared {
    type Value<B: Backend> = PreparedValue<B>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_variables_case_insensitive() {
        let vars: SessionVariables = [("X-Hasura-Role", "user"), ("x-hasura-user-id", "42")]
            .into_iter()
            .collect();

        assert_eq!(vars.get("x-hasura-role"), Some("user"));
        assert_eq!(vars.get("X-HASURA-USER-ID"), Some("42"));
        assert!(!vars.contains("x-hasura-org-id"));
        assert_eq!(
            vars.names().collect::<Vec<_>>(),
            vec!["x-hasura-role", "x-hasura-user-id"]
        );
    }
}
