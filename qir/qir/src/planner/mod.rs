//! Planning boundary: what happens to a select between the schema-aware
//! parser that builds it and the backend that generates a query from it.
//!
//! ```ascii
//!   AnnSimpleSelect<B, R, UnpreparedValue<B>>
//!            │
//!            │ naming convention default
//!            │ validate_select
//!            │ collect_remote_joins ──────► JoinTree<R>
//!            ▼
//!   AnnSimpleSelect<B, Void, UnpreparedValue<B>>
//!            │
//!            │ prepare ───────────────────► PlanningState<B>
//!            ▼
//!   AnnSimpleSelect<B, Void, PreparedValue<B>>
//! ```

mod prepare;
mod remote_join;
mod validate;

use log::debug;
use serde::Serialize;

pub use prepare::{prepare, PlanningState};
pub use remote_join::{
    collect_remote_joins, JoinColumnAlias, JoinNode, JoinTree, RemoteJoin, PHANTOM_FIELD_PREFIX,
};
pub use validate::{validate_connection, validate_select, SchemaCatalog};

use crate::backend::{Backend, Void};
use crate::debug::{self, DebugLog, Stage};
use crate::error::Errors;
use crate::ir::{AnnSimpleSelect, PreparedValue, SessionVariables, UnpreparedValue};
use crate::Options;

/// A select ready for code generation.
#[derive(Debug)]
pub struct Plan<B: Backend, R> {
    pub select: AnnSimpleSelect<B, Void, PreparedValue<B>>,
    /// Joins to run against other sources once `select` has returned.
    pub remote_joins: Option<JoinTree<R>>,
    pub state: PlanningState<B>,
    pub debug_log: Option<DebugLog>,
}

/// Runs every planning pass over `select`.
pub fn plan_select<B, R>(
    select: AnnSimpleSelect<B, R, UnpreparedValue<B>>,
    session: &SessionVariables,
    catalog: &dyn SchemaCatalog<B>,
    options: &Options,
) -> Result<Plan<B, R>, Errors>
where
    B: Backend,
    R: Serialize,
{
    if options.debug_log {
        debug::log_start();
    }

    let res = run_passes(select, session, catalog, options);

    let debug_log = if options.debug_log {
        debug::log_finish()
    } else {
        None
    };

    let (select, remote_joins, state) = res?;
    Ok(Plan {
        select,
        remote_joins,
        state,
        debug_log,
    })
}

fn run_passes<B, R>(
    select: AnnSimpleSelect<B, R, UnpreparedValue<B>>,
    session: &SessionVariables,
    catalog: &dyn SchemaCatalog<B>,
    options: &Options,
) -> Result<
    (
        AnnSimpleSelect<B, Void, PreparedValue<B>>,
        Option<JoinTree<R>>,
        PlanningState<B>,
    ),
    Errors,
>
where
    B: Backend,
    R: Serialize,
{
    debug::log_repr(&select);
    debug!("planning select for backend {}", B::backend_type());

    debug::log_stage(Stage::NamingConvention);
    let select = match select.naming_convention {
        Some(_) => select,
        None => select.with_naming_convention(Some(options.naming_convention)),
    };

    if options.validate {
        debug::log_stage(Stage::Validation);
        validate_select(&select, catalog)?;
    }

    debug::log_stage(Stage::RemoteJoins);
    let (select, remote_joins) = collect_remote_joins(select);
    debug::log_repr(&select);
    if let Some(joins) = &remote_joins {
        debug::log_repr(joins);
    }

    debug::log_stage(Stage::Preparation);
    let (select, state) = prepare::<_, Void, B>(select, session, options.dedupe_parameters)?;
    debug::log_repr(&select);
    debug!(
        "prepared {} parameters, {} session variables",
        state.parameters.len(),
        state.session_variables.len()
    );

    Ok((select, remote_joins, state))
}
