use indexmap::IndexMap;
use insta::assert_snapshot;
use qir::backend::{ColumnName, PgScalarType, XEnable};
use qir::ir::ConnectionSplitKind::{After, Before};
use qir::ir::{
    AggregateField, AggregateOp, AnnAggregateSelect, AnnBoolExp, AnnField, AnnRedactionExp,
    AnnRelationSelect, AnnSelectG, AnnotatedAggregateOrderBy, AnnotatedOrderByElement,
    AnnotatedOrderByItem, ArraySelect, ColumnType, ConnectionField, ConnectionSelect,
    ConnectionSlice, ConnectionSplit, ConnectionSplitKind, EdgeField, NativeQueryName, NonEmpty,
    OrderByItem, RelInfo, RelName, RelType, ScalarValue, SelectArgs, SelectFrom, SelectionField,
    TableAggregateField, TablePerm, UnpreparedValue,
};
use qir::planner::{validate_connection, validate_select};
use rstest::rstest;

use super::fixtures::*;

type Connection = ConnectionSelect<Pg, String, Value>;

fn mapping() -> IndexMap<ColumnName, ColumnName> {
    [(ColumnName::new("id"), ColumnName::new("author_id"))]
        .into_iter()
        .collect()
}

fn authors(selection: Vec<(&str, AnnField<Pg, String, Value>)>) -> Select<String> {
    AnnSelectG::new(
        fields(selection),
        SelectFrom::Table(table("author")),
        TablePerm::no_permission(),
    )
}

/// Articles by rating, best first. Rows are then ordered by `id`.
fn connection() -> Connection {
    let node = EdgeField::Node(fields(vec![("id", column("id"))]));
    let ordering = NonEmpty::new(order_by("rating", false));
    let select = AnnSelectG::new(
        fields(vec![(
            "edges",
            ConnectionField::Edges(fields(vec![("cursor", EdgeField::Cursor), ("node", node)])),
        )]),
        SelectFrom::Table(table("article")),
        TablePerm::no_permission(),
    )
    .with_args(SelectArgs::default().with_order_by(ordering));

    ConnectionSelect::new(XEnable, NonEmpty::new(int_column("id")), select)
}

fn order_by(column: &str, asc: bool) -> AnnotatedOrderByItem<Pg, Value> {
    let element = AnnotatedOrderByElement::column(int_column(column));
    if asc {
        OrderByItem::asc(element)
    } else {
        OrderByItem::desc(element)
    }
}

fn split(kind: ConnectionSplitKind, column: &str, asc: bool) -> ConnectionSplit<Pg, Value> {
    let element = AnnotatedOrderByElement::column(int_column(column));
    ConnectionSplit {
        kind,
        value: UnpreparedValue::Literal(ScalarValue::Int(1)),
        order_by: if asc {
            OrderByItem::asc(element)
        } else {
            OrderByItem::desc(element)
        },
    }
}

fn paged(slice: Option<ConnectionSlice>, splits: Vec<ConnectionSplit<Pg, Value>>) -> Connection {
    let mut connection = connection();
    connection.slice = slice;
    connection.split = NonEmpty::from_vec(splits);
    connection
}

#[rstest]
#[case::no_cursor(Some(ConnectionSlice::First(10)), vec![])]
#[case::first_after(
    Some(ConnectionSlice::First(10)),
    vec![split(After, "rating", false), split(After, "id", true)]
)]
#[case::last_before(Some(ConnectionSlice::Last(10)), vec![split(Before, "rating", false)])]
#[case::no_slice(None, vec![split(Before, "rating", false), split(Before, "id", true)])]
fn test_valid_connection(
    #[case] slice: Option<ConnectionSlice>,
    #[case] splits: Vec<ConnectionSplit<Pg, Value>>,
) {
    assert!(validate_connection(&paged(slice, splits)).is_ok());
}

#[rstest]
#[case::first_before(
    Some(ConnectionSlice::First(10)),
    vec![split(Before, "rating", false)],
    "`first` expected an `after` cursor, but found a `before` cursor\nhint: use `last` to page backwards"
)]
#[case::last_after(
    Some(ConnectionSlice::Last(10)),
    vec![split(After, "rating", false)],
    "`last` expected a `before` cursor, but found an `after` cursor\nhint: use `first` to page forwards"
)]
#[case::mixed_kinds(
    None,
    vec![split(After, "rating", false), split(Before, "id", true)],
    "connection split conditions mix `before` and `after`"
)]
#[case::wrong_column(
    None,
    vec![split(After, "id", true)],
    "connection split condition 1 does not follow the ordering of the connection"
)]
#[case::wrong_direction(
    None,
    vec![split(After, "rating", true)],
    "connection split condition 1 does not follow the ordering of the connection"
)]
#[case::too_many(
    None,
    vec![split(After, "rating", false), split(After, "id", true), split(After, "title", true)],
    "cursor expected at most 2 split conditions, but found 3"
)]
fn test_invalid_connection(
    #[case] slice: Option<ConnectionSlice>,
    #[case] splits: Vec<ConnectionSplit<Pg, Value>>,
    #[case] expected: &str,
) {
    let errors = validate_connection(&paged(slice, splits)).unwrap_err();
    assert_eq!(errors.to_string(), expected);
}

#[test]
fn test_connection_errors_have_a_path() {
    let connection = paged(
        Some(ConnectionSlice::First(10)),
        vec![split(After, "title", true)],
    );
    let select = authors(vec![(
        "articles_connection",
        AnnField::ArrayRelation(ArraySelect::Connection(AnnRelationSelect::new(
            RelName::new("articles"),
            mapping(),
            connection,
        ))),
    )]);

    let errors = validate_select(&select, &catalog()).unwrap_err();
    assert_snapshot!(errors, @"at articles_connection: connection split condition 1 does not follow the ordering of the connection");
}

#[test]
fn test_unsupported_aggregate_operators() {
    let median = AggregateField::Op(AggregateOp {
        op: "median".to_string(),
        fields: fields(vec![(
            "rating",
            SelectionField::Column {
                column: int_column("rating"),
                redaction: AnnRedactionExp::NoRedaction,
            },
        )]),
    });
    let aggregate: AnnAggregateSelect<Pg, String, Value> = AnnSelectG::new(
        fields(vec![(
            "aggregate",
            TableAggregateField::Aggregate(fields(vec![("median", median)])),
        )]),
        SelectFrom::Table(table("article")),
        TablePerm::no_permission(),
    );

    let by_mode = OrderByItem::desc(AnnotatedOrderByElement::ArrayAggregation {
        relationship: RelInfo {
            name: RelName::new("articles"),
            rel_type: RelType::Array,
            mapping: mapping(),
            target: table("article"),
        },
        filter: AnnBoolExp::true_exp(),
        aggregate: AnnotatedAggregateOrderBy::Op {
            op: "mode".to_string(),
            result_type: ColumnType::Scalar(PgScalarType::Integer),
            column: int_column("rating"),
            redaction: AnnRedactionExp::NoRedaction,
        },
    });

    let select = authors(vec![
        ("name", column("name")),
        (
            "articles_aggregate",
            AnnField::ArrayRelation(ArraySelect::Aggregate(AnnRelationSelect::new(
                RelName::new("articles"),
                mapping(),
                aggregate,
            ))),
        ),
    ])
    .with_args(SelectArgs::default().with_order_by(NonEmpty::new(by_mode)));

    let errors = validate_select(&select, &catalog()).unwrap_err();
    assert_snapshot!(errors, @r"
    aggregate operator `mode` is not supported by the postgres backend
    at articles_aggregate.aggregate: aggregate operator `median` is not supported by the postgres backend
    ");
}

#[test]
fn test_all_mapping_errors_collected() {
    let comments = AnnRelationSelect::new(
        RelName::new("comments"),
        mapping(),
        AnnSelectG::new(
            IndexMap::new(),
            SelectFrom::Table(table("comment")),
            TablePerm::no_permission(),
        ),
    );
    let select = authors(vec![
        ("id", column("id")),
        (
            "articles",
            AnnField::ArrayRelation(ArraySelect::Simple(AnnRelationSelect::new(
                RelName::new("articles"),
                [(ColumnName::new("uuid"), ColumnName::new("author_id"))]
                    .into_iter()
                    .collect(),
                articles(),
            ))),
        ),
        (
            "comments",
            AnnField::ArrayRelation(ArraySelect::Simple(comments)),
        ),
    ]);

    let errors = validate_select(&select, &catalog()).unwrap_err();
    assert_eq!(errors.0.len(), 2);
    assert_snapshot!(errors, @r"
    at articles: column `public.author.uuid` not found
    at comments: table `public.comment` not found
    ");
}

#[test]
fn test_native_query_sources_are_not_checked() {
    let select = authors(vec![("id", column("id"))]).with_from(SelectFrom::NativeQuery {
        name: NativeQueryName::new("top_authors"),
        arguments: IndexMap::new(),
    });
    assert!(validate_select(&select, &catalog()).is_ok());
}
