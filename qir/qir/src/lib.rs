//! # qir
//!
//! A backend-polymorphic intermediate representation for relational select
//! queries, and the planning passes that prepare it for code generation.
//!
//! The IR is built by a schema-aware GraphQL parser and consumed by a
//! per-backend query generator. It sits in between:
//! ```ascii
//!            GraphQL request
//!
//!    (parse) │
//!            ▼
//!   AnnSimpleSelect<B, R, UnpreparedValue<B>>
//!            │
//!            │ plan_select
//!            ▼                         json::to_string
//!                                     ────────►
//!   Plan { select, remote_joins, .. }          IR JSON
//!            │
//! (generate) │
//!            ▼
//!
//!           SQL
//! ```
//!
//! - [backend] binds the types that differ between storage engines and the
//!   capability markers that keep unsupported nodes from being built.
//! - [ir] holds the tree and its generic traversals ([ir::Walk],
//!   [ir::Bitraverse]).
//! - [planner] validates a tree, splits off its remote relationships and
//!   narrows its leaf values.
//!
//! ## Common use-cases
//!
//! - Plan a select with the default options:
//!
//!   ```ignore
//!   let plan = qir::plan_select(select, &session, &catalog, &qir::Options::default())?;
//!   ```
//!
//! - Collect a debug log of every planning stage:
//!
//!   ```ignore
//!   let opts = qir::Options::default().with_debug_log(true);
//!   let plan = qir::plan_select(select, &session, &catalog, &opts)?;
//!   println!("{}", qir::json::to_string(&plan.debug_log)?);
//!   ```

#![forbid(unsafe_code)]

use std::str::FromStr;

use itertools::Itertools;
use serde::Serialize;
use strum::VariantNames;

pub use backend::{Backend, BackendType, Capabilities, Void, XDisable, XEnable};
pub use error::{Error, Errors, MessageKind, Reason, WithErrorInfo};
pub use ir::NamingCase;
pub use planner::{plan_select, Plan, PlanningState, SchemaCatalog};

pub mod backend;
pub mod debug;
pub mod error;
pub mod ir;
pub mod planner;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Version of this crate, as recorded in debug logs.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Planning options.
#[derive(Debug, Clone, Serialize)]
pub struct Options {
    /// Check relationship mappings, connection cursors and aggregate
    /// operators before planning.
    ///
    /// Defaults to true.
    pub validate: bool,

    /// Bind every use of the same GraphQL variable to one parameter.
    ///
    /// Defaults to true.
    pub dedupe_parameters: bool,

    /// Naming convention of selects that do not set their own.
    pub naming_convention: NamingCase,

    /// Collect a [debug::DebugLog] of the planning run into [Plan::debug_log].
    ///
    /// Defaults to false.
    pub debug_log: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            validate: true,
            dedupe_parameters: true,
            naming_convention: NamingCase::default(),
            debug_log: false,
        }
    }
}

impl Options {
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn no_validate(self) -> Self {
        self.with_validate(false)
    }

    pub fn with_dedupe_parameters(mut self, dedupe_parameters: bool) -> Self {
        self.dedupe_parameters = dedupe_parameters;
        self
    }

    pub fn with_naming_convention(mut self, naming_convention: NamingCase) -> Self {
        self.naming_convention = naming_convention;
        self
    }

    pub fn with_debug_log(mut self, debug_log: bool) -> Self {
        self.debug_log = debug_log;
        self
    }
}

impl BackendType {
    pub fn names() -> Vec<String> {
        BackendType::VARIANTS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Parses a backend name, with the list of known names as a hint.
    pub fn parse(name: &str) -> Result<BackendType> {
        BackendType::from_str(name).map_err(|_| {
            Error::new(Reason::NotFound {
                name: format!("{name:?}"),
                namespace: "backend".to_string(),
            })
            .push_hint(format!(
                "known backends: {}",
                BackendType::VARIANTS.iter().join(", ")
            ))
        })
    }
}

/// JSON serialization of IR values
pub mod json {
    use super::*;

    pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(convert_json_err)
    }

    pub fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
        serde_json::to_value(value).map_err(convert_json_err)
    }

    fn convert_json_err(err: serde_json::Error) -> Error {
        Error::new_simple(err.to_string())
    }
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_backend_type_parse() {
        assert_eq!(BackendType::parse("mssql").unwrap(), BackendType::MsSql);
        assert_eq!(BackendType::Postgres.to_string(), "postgres");
        assert_eq!(BackendType::names().len(), 7);

        assert_snapshot!(BackendType::parse("oracle").unwrap_err(), @r#"
        backend `"oracle"` not found
        hint: known backends: postgres, citus, cockroach, mssql, bigquery, mysql, dataconnector
        "#);
    }

    #[test]
    fn test_options_builder() {
        let opts = Options::default()
            .no_validate()
            .with_naming_convention(NamingCase::GraphqlCase)
            .with_debug_log(true);

        assert!(!opts.validate);
        assert!(opts.dedupe_parameters);
        assert_eq!(opts.naming_convention, NamingCase::GraphqlCase);
        assert!(opts.debug_log);
    }

    #[test]
    fn test_json_to_string() {
        let json = json::to_string(&NamingCase::GraphqlCase).unwrap();
        assert_eq!(json, r#""GraphqlCase""#);
    }
}
