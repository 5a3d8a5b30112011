//! End to end runs of `plan_select`.
use insta::assert_snapshot;
use qir::backend::PgScalarType;
use qir::debug::{DebugEntryKind, Stage};
use qir::ir::{
    AnnBoolExp, AnnField, FieldName, NamingCase, OpExp, PreparedValue, ScalarValue, SelectArgs,
    SessionVariables,
};
use qir::planner::JoinColumnAlias;
use qir::{plan_select, Errors, Options, Plan};
use rstest::rstest;
use serde::Serialize;

use super::fixtures::*;

fn plan<R: Serialize>(
    select: Select<R>,
    session: &SessionVariables,
    options: &Options,
) -> Result<Plan<Pg, R>, Errors> {
    let catalog = catalog();
    plan_select(select, session, &catalog, options)
}

#[test]
fn test_plan_simple_select() {
    let select = articles::<String>().with_args(
        SelectArgs::default()
            .with_where(eq("id", variable("id", 7)))
            .with_limit(10),
    );

    let plan = plan(select, &session(), &Options::default()).unwrap();

    assert_eq!(
        plan.select.perm.filter,
        AnnBoolExp::column(
            int_column("author_id"),
            OpExp::eq(PreparedValue::SessionVariable {
                name: "x-hasura-user-id".to_string(),
                ty: PgScalarType::Integer,
            })
        )
    );
    assert_eq!(
        plan.select.args.where_,
        Some(AnnBoolExp::column(
            int_column("id"),
            OpExp::eq(PreparedValue::Param(1))
        ))
    );
    assert_eq!(plan.select.args.limit, Some(10));
    assert_eq!(plan.select.naming_convention, Some(NamingCase::HasuraCase));

    assert_eq!(plan.state.parameters.len(), 1);
    assert_eq!(plan.state.parameter(1).unwrap().value, ScalarValue::Int(7));
    assert_eq!(plan.state.session_variables, vec!["x-hasura-user-id"]);

    assert!(plan.remote_joins.is_none());
    assert!(plan.debug_log.is_none());
}

#[rstest]
#[case::from_options(None, NamingCase::GraphqlCase, NamingCase::GraphqlCase)]
#[case::own_convention_kept(
    Some(NamingCase::HasuraCase),
    NamingCase::GraphqlCase,
    NamingCase::HasuraCase
)]
#[case::default(None, NamingCase::HasuraCase, NamingCase::HasuraCase)]
fn test_naming_convention(
    #[case] own: Option<NamingCase>,
    #[case] option: NamingCase,
    #[case] expected: NamingCase,
) {
    let select = articles::<String>().with_naming_convention(own);
    let options = Options::default().with_naming_convention(option);

    let plan = plan(select, &session(), &options).unwrap();
    assert_eq!(plan.select.naming_convention, Some(expected));
}

#[rstest]
#[case::deduped(true, 1)]
#[case::not_deduped(false, 2)]
fn test_dedupe_parameters(#[case] dedupe: bool, #[case] expected: usize) {
    let filter = AnnBoolExp::Or(vec![
        eq("id", variable("search", 3)),
        eq("rating", variable("search", 3)),
    ]);
    let select = articles::<String>().with_args(SelectArgs::default().with_where(filter));
    let options = Options::default().with_dedupe_parameters(dedupe);

    let plan = plan(select, &session(), &options).unwrap();
    assert_eq!(plan.state.parameters.len(), expected);
}

#[test]
fn test_plan_remote_joins() {
    let select = articles_with_author("author_id")
        .with_field(FieldName::new("reviews"), remote("reviews"));

    let plan = plan(select, &session(), &Options::default()).unwrap();

    let names: Vec<&str> = plan.select.fields.keys().map(FieldName::as_str).collect();
    assert_eq!(
        names,
        vec!["title", "author", "reviews", "__phantom__author_id"]
    );
    assert_eq!(
        plan.select.fields[&FieldName::new("reviews")],
        AnnField::Expression("null".to_string())
    );

    let joins = plan.remote_joins.unwrap();
    let leaves = joins.leaves();
    assert_eq!(leaves.len(), 1);

    let (path, join) = &leaves[0];
    assert_eq!(path, &vec![&FieldName::new("reviews")]);
    assert_eq!(join.relationship, "reviews");
    assert_eq!(
        join.join_columns[&FieldName::new("author_id")],
        JoinColumnAlias::Phantom(FieldName::new("__phantom__author_id"))
    );
}

#[test]
fn test_missing_session_variable() {
    let errors = plan(
        articles::<String>(),
        &SessionVariables::new(),
        &Options::default(),
    )
    .unwrap_err();

    assert_snapshot!(errors, @r"
    session variable `x-hasura-user-id` not found
    hint: session variables are matched case-insensitively
    ");
}

#[test]
fn test_validation_can_be_disabled() {
    let errors = plan(
        articles_with_author::<String>("writer_id"),
        &session(),
        &Options::default(),
    )
    .unwrap_err();
    assert_snapshot!(errors, @"at author: column `public.article.writer_id` not found");

    let plan = plan(
        articles_with_author::<String>("writer_id"),
        &session(),
        &Options::default().no_validate(),
    );
    assert!(plan.is_ok());
}

#[test]
fn test_debug_log() {
    let options = Options::default().with_debug_log(true);
    let plan = plan(articles::<String>(), &session(), &options).unwrap();

    let log = plan.debug_log.unwrap();
    assert_eq!(log.version, qir::version());
    assert!(log
        .entries_of(Stage::Preparation)
        .any(|e| matches!(e.kind, DebugEntryKind::ReprIr(_))));

    assert!(qir::debug::log_finish().is_none());
}

#[test]
fn test_debug_log_of_concurrent_runs() {
    let options = Options::default().with_debug_log(true);

    std::thread::scope(|scope| {
        let runs: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .map(|_| {
                            plan(articles::<String>(), &session(), &options).unwrap()
                        })
                        .filter(|plan| plan.debug_log.is_some())
                        .count()
                })
            })
            .collect();

        for run in runs {
            assert_eq!(run.join().unwrap(), 25);
        }
    });
}
