//! A small blog schema (`author`, `article`) on vanilla Postgres.
use indexmap::IndexMap;
use qir::backend::{ColumnName, PgScalarType, Postgres, QualifiedName, Vanilla};
use qir::ir::{
    AnnBoolExp, AnnColumnField, AnnField, AnnObjectSelect, AnnRelationSelect, AnnSelectG,
    AnnSimpleSelect, ColumnInfo, ColumnType, ColumnValue, FieldName, JoinField, OpExp, Provenance,
    RelName, RemoteRelationshipSelect, ScalarValue, SelectFrom, SessionVariables, TablePerm,
    UnpreparedValue,
};

pub type Pg = Postgres<Vanilla>;
pub type Value = UnpreparedValue<Pg>;
pub type Select<R> = AnnSimpleSelect<Pg, R, Value>;

pub fn table(name: &str) -> QualifiedName {
    QualifiedName::new("public", name)
}

pub fn catalog() -> IndexMap<QualifiedName, Vec<ColumnName>> {
    let columns = |names: &[&str]| -> Vec<ColumnName> {
        names.iter().map(|n| ColumnName::new(*n)).collect()
    };
    [
        (table("author"), columns(&["id", "name", "org_id"])),
        (table("article"), columns(&["id", "title", "author_id", "rating"])),
    ]
    .into_iter()
    .collect()
}

pub fn session() -> SessionVariables {
    [("X-Hasura-Role", "user"), ("X-Hasura-User-Id", "1")]
        .into_iter()
        .collect()
}

pub fn int_column(name: &str) -> ColumnInfo<Pg> {
    ColumnInfo::new(
        ColumnName::new(name),
        ColumnType::Scalar(PgScalarType::Integer),
    )
}

pub fn column<R>(name: &str) -> AnnField<Pg, R, Value> {
    AnnField::Column(AnnColumnField::new(
        ColumnName::new(name),
        ColumnType::Scalar(PgScalarType::Integer),
    ))
}

pub fn variable(name: &str, value: i64) -> Value {
    UnpreparedValue::Parameter {
        provenance: Provenance::FromGraphQL {
            variable: Some(name.to_string()),
        },
        value: ColumnValue {
            ty: ColumnType::Scalar(PgScalarType::Integer),
            value: ScalarValue::Int(value),
        },
    }
}

pub fn session_variable(name: &str) -> Value {
    UnpreparedValue::SessionVariable {
        name: name.to_string(),
        ty: PgScalarType::Integer,
    }
}

pub fn eq(column: &str, value: Value) -> AnnBoolExp<Pg, Value> {
    AnnBoolExp::column(int_column(column), OpExp::eq(value))
}

pub fn fields<F>(fields: Vec<(&str, F)>) -> IndexMap<FieldName, F> {
    fields
        .into_iter()
        .map(|(name, f)| (FieldName::new(name), f))
        .collect()
}

/// `article { id title }`, readable by its author only.
pub fn articles<R>() -> Select<R> {
    AnnSelectG::new(
        fields(vec![("id", column("id")), ("title", column("title"))]),
        SelectFrom::Table(table("article")),
        TablePerm::new(eq("author_id", session_variable("x-hasura-user-id")), None),
    )
}

/// `article { title author { name } }`.
pub fn articles_with_author<R>(author_id_column: &str) -> Select<R> {
    let author = AnnObjectSelect {
        fields: fields(vec![("name", column("name"))]),
        target: SelectFrom::Table(table("author")),
        filter: AnnBoolExp::true_exp(),
    };
    let author = AnnRelationSelect::new(
        RelName::new("author"),
        [(ColumnName::new(author_id_column), ColumnName::new("id"))]
            .into_iter()
            .collect(),
        author,
    );

    AnnSelectG::new(
        fields(vec![
            ("title", column("title")),
            ("author", AnnField::ObjectRelation(author)),
        ]),
        SelectFrom::Table(table("article")),
        TablePerm::no_permission(),
    )
}

/// A remote relationship joined on `article.author_id`.
pub fn remote(relationship: &str) -> AnnField<Pg, String, Value> {
    AnnField::Remote(RemoteRelationshipSelect::new(
        fields(vec![(
            "author_id",
            JoinField::Column {
                column: ColumnName::new("author_id"),
                ty: ColumnType::Scalar(PgScalarType::Integer),
            },
        )]),
        relationship.to_string(),
    ))
}
