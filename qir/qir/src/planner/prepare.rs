//! Narrowing of leaf values, from [UnpreparedValue] to [PreparedValue].
use std::collections::HashMap;

use log::trace;
use serde::Serialize;

use crate::backend::Backend;
use crate::error::{Error, Reason, WithErrorInfo};
use crate::ir::{
    Bitraverse, ColumnValue, PreparedValue, Provenance, SessionVariables, UnpreparedValue,
};

/// What a prepared tree refers to outside of itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningState<B: Backend> {
    /// Bound parameters. `PreparedValue::Param(n)` refers to `parameters[n - 1]`.
    pub parameters: Vec<ColumnValue<B>>,
    /// Session variables the tree reads, lowercased, in order of first use.
    pub session_variables: Vec<String>,
}

impl<B: Backend> Default for PlanningState<B> {
    fn default() -> Self {
        PlanningState {
            parameters: Vec::new(),
            session_variables: Vec::new(),
        }
    }
}

impl<B: Backend> PlanningState<B> {
    pub fn parameter(&self, index: usize) -> Option<&ColumnValue<B>> {
        index.checked_sub(1).and_then(|i| self.parameters.get(i))
    }
}

/// Prepares every leaf of `tree`. Parameters are numbered in traversal order.
pub fn prepare<T, R, B>(
    tree: T,
    session: &SessionVariables,
    dedupe_parameters: bool,
) -> Result<(T::Output<R, PreparedValue<B>>, PlanningState<B>), Error>
where
    B: Backend,
    T: Bitraverse<R, UnpreparedValue<B>>,
{
    let mut preparer = Preparer {
        session,
        dedupe_parameters,
        state: PlanningState::default(),
        by_variable: HashMap::new(),
    };
    let prepared = tree.try_map_values(|value| preparer.prepare_value(value))?;
    Ok((prepared, preparer.state))
}

struct Preparer<'s, B: Backend> {
    session: &'s SessionVariables,
    dedupe_parameters: bool,
    state: PlanningState<B>,
    /// GraphQL variable name to its parameter index.
    by_variable: HashMap<String, usize>,
}

impl<B: Backend> Preparer<'_, B> {
    fn prepare_value(&mut self, value: UnpreparedValue<B>) -> Result<PreparedValue<B>, Error> {
        Ok(match value {
            UnpreparedValue::Literal(literal) => PreparedValue::Literal(literal),
            UnpreparedValue::Parameter { provenance, value } => {
                PreparedValue::Param(self.parameter(provenance, value)?)
            }
            UnpreparedValue::SessionVariable { name, ty } => {
                self.session_variable(&name)?;
                PreparedValue::SessionVariable { name, ty }
            }
            UnpreparedValue::Session => PreparedValue::Session,
        })
    }

    fn parameter(&mut self, provenance: Provenance, value: ColumnValue<B>) -> Result<usize, Error> {
        let variable = match provenance {
            Provenance::FromGraphQL {
                variable: Some(variable),
            } if self.dedupe_parameters => Some(variable),
            Provenance::FromGraphQL { .. } | Provenance::FromInternal(_) => None,
        };

        if let Some(&index) = variable.as_ref().and_then(|v| self.by_variable.get(v)) {
            // one GraphQL variable has one value per request
            if self.state.parameter(index) != Some(&value) {
                return Err(Error::new_assert(format!(
                    "variable `{}` bound to parameter ${index} with a different value",
                    variable.unwrap_or_default()
                )));
            }
            trace!("reusing parameter ${index} for variable {variable:?}");
            return Ok(index);
        }

        self.state.parameters.push(value);
        let index = self.state.parameters.len();
        if let Some(variable) = variable {
            self.by_variable.insert(variable, index);
        }
        Ok(index)
    }

    fn session_variable(&mut self, name: &str) -> Result<(), Error> {
        if !self.session.contains(name) {
            return Err(Error::new(Reason::NotFound {
                name: name.to_string(),
                namespace: "session variable".to_string(),
            }))
            .push_hint("session variables are matched case-insensitively");
        }

        let name = name.to_lowercase();
        if !self.state.session_variables.contains(&name) {
            self.state.session_variables.push(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;

    use super::*;
    use crate::backend::{MySql, MySqlScalarType, Void};
    use crate::ir::{ArgumentExp, ColumnType, FunctionArgs, ScalarValue};

    fn param(variable: Option<&str>, n: i64) -> UnpreparedValue<MySql> {
        UnpreparedValue::Parameter {
            provenance: Provenance::FromGraphQL {
                variable: variable.map(str::to_string),
            },
            value: ColumnValue {
                ty: ColumnType::Scalar(MySqlScalarType::Int),
                value: ScalarValue::Int(n),
            },
        }
    }

    fn args(values: Vec<UnpreparedValue<MySql>>) -> FunctionArgs<UnpreparedValue<MySql>> {
        FunctionArgs::positional(values.into_iter().map(ArgumentExp::Input).collect())
    }

    fn prepare_args(
        values: Vec<UnpreparedValue<MySql>>,
        session: &SessionVariables,
        dedupe: bool,
    ) -> Result<(FunctionArgs<PreparedValue<MySql>>, PlanningState<MySql>), Error> {
        prepare::<_, Void, MySql>(args(values), session, dedupe)
    }

    #[test]
    fn test_parameters_numbered_in_order() {
        let values = vec![param(Some("a"), 1), param(None, 2), param(Some("a"), 1)];

        let (prepared, state) =
            prepare_args(values.clone(), &SessionVariables::new(), true).unwrap();
        assert_eq!(
            prepared.positional,
            vec![
                ArgumentExp::Input(PreparedValue::Param(1)),
                ArgumentExp::Input(PreparedValue::Param(2)),
                ArgumentExp::Input(PreparedValue::Param(1)),
            ]
        );
        assert_eq!(state.parameters.len(), 2);
        assert_eq!(state.parameter(2).map(|p| &p.value), Some(&ScalarValue::Int(2)));
        assert_eq!(state.parameter(0), None);

        let (_, state) = prepare_args(values, &SessionVariables::new(), false).unwrap();
        assert_eq!(state.parameters.len(), 3);
    }

    #[test]
    fn test_variable_with_two_values() {
        let values = vec![param(Some("a"), 1), param(Some("a"), 2)];

        let error = prepare_args(values.clone(), &SessionVariables::new(), true).unwrap_err();
        assert_snapshot!(
            error,
            @"internal planner error; variable `a` bound to parameter $1 with a different value"
        );

        let (_, state) = prepare_args(values, &SessionVariables::new(), false).unwrap();
        assert_eq!(state.parameters.len(), 2);
    }

    #[test]
    fn test_session_variables() {
        let session: SessionVariables = [("X-Hasura-User-Id", "1")].into_iter().collect();
        let user_id = UnpreparedValue::SessionVariable {
            name: "x-hasura-user-id".to_string(),
            ty: MySqlScalarType::Int,
        };

        let (prepared, state) =
            prepare_args(vec![user_id.clone(), user_id], &session, true).unwrap();
        assert!(prepared.positional.iter().all(|a| matches!(
            a,
            ArgumentExp::Input(PreparedValue::SessionVariable { .. })
        )));
        assert_eq!(state.session_variables, vec!["x-hasura-user-id"]);

        let org_id = UnpreparedValue::SessionVariable {
            name: "x-hasura-org-id".to_string(),
            ty: MySqlScalarType::Int,
        };
        let error = prepare_args(vec![org_id], &session, true).unwrap_err();
        assert_snapshot!(error, @r"
        session variable `x-hasura-org-id` not found
        hint: session variables are matched case-insensitively
        ");
    }
}
