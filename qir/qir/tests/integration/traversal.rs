//! The traversals as a downstream pass would use them.
use insta::assert_snapshot;
use qir::ir::{
    AnnField, Bitraverse, FieldName, PreparedValue, Provenance, SelectArgs, UnpreparedValue, Walk,
};
use qir::planner::prepare;
use qir::{json, Void};

use super::fixtures::*;

#[test]
fn test_collect_graphql_variables() {
    let select = articles::<String>().with_args(
        SelectArgs::default().with_where(eq("id", variable("article_id", 1))),
    );

    let variables: Vec<&str> = select.fold_values(|v| match v {
        UnpreparedValue::Parameter { provenance, .. } => match provenance {
            Provenance::FromGraphQL {
                variable: Some(name),
            } => vec![name.as_str()],
            _ => vec![],
        },
        UnpreparedValue::Literal(_)
        | UnpreparedValue::SessionVariable { .. }
        | UnpreparedValue::Session => vec![],
    });
    assert_eq!(variables, vec!["article_id"]);
}

#[test]
fn test_prepare_any_subtree() {
    let filter = eq("id", variable("id", 1))
        .and(eq("author_id", session_variable("x-hasura-user-id")));

    let (prepared, state) = prepare::<_, Void, Pg>(filter, &session(), true).unwrap();

    let values: Vec<&PreparedValue<Pg>> = Walk::<Void, _>::values(&prepared);
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], &PreparedValue::Param(1));
    assert!(values[1].is_session_variable());
    assert_eq!(state.session_variables, vec!["x-hasura-user-id"]);
}

#[test]
fn test_remote_payload_narrowing() {
    let select = articles_with_author::<String>("author_id")
        .with_field(FieldName::new("reviews"), remote("reviews"));

    let lengths = select.clone().map_remote(|r: String| r.len());
    assert_eq!(lengths.remotes(), vec![&"reviews".len()]);

    let no_remotes = select.try_bimap(
        &mut |r: String| Err::<Void, _>(format!("unexpected remote relationship {r}")),
        &mut |v| Ok::<_, String>(v),
    );
    assert_eq!(
        no_remotes.unwrap_err(),
        "unexpected remote relationship reviews"
    );
}

#[test]
fn test_json_representation() {
    let field: AnnField<Pg, Void, UnpreparedValue<Pg>> = column("id");
    assert_snapshot!(json::to_string(&field).unwrap(), @r#"{"Column":{"column":"id","ty":{"Scalar":"Integer"},"as_text":false,"arguments":null,"redaction":"NoRedaction"}}"#);

    let args = SelectArgs::<Pg, i64>::default().with_limit(5);
    assert_snapshot!(json::to_string(&args).unwrap(), @r#"{"where":null,"order_by":null,"limit":5,"offset":null,"distinct":null}"#);
}
