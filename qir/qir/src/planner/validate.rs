//! Checks that the IR cannot express by construction.
//!
//! All problems of a select are collected, not just the first one.
use indexmap::IndexMap;

use crate::backend::{Backend, Void};
use crate::error::{Error, Errors, Reason, WithErrorInfo};
use crate::ir::{
    AnnAggregateSelect, AnnField, AnnSimpleSelect, AnnotatedOrderByElement, ArraySelect, Bitraverse,
    ColumnInfo, ComputedFieldSelect, ConnectionField, ConnectionSelect, ConnectionSlice,
    ConnectionSplitKind, EdgeField, FieldName, JoinField, OrderByItem, SelectArgs, SelectFrom,
    TableAggregateField,
};

/// What the planner needs to know about the tables of a source.
pub trait SchemaCatalog<B: Backend> {
    /// Columns of `table`, or `None` when the table is not tracked.
    fn columns(&self, table: &B::TableName) -> Option<&[B::Column]>;
}

impl<B: Backend> SchemaCatalog<B> for IndexMap<B::TableName, Vec<B::Column>> {
    fn columns(&self, table: &B::TableName) -> Option<&[B::Column]> {
        self.get(table).map(Vec::as_slice)
    }
}

pub fn validate_select<B, R, V>(
    select: &AnnSimpleSelect<B, R, V>,
    catalog: &dyn SchemaCatalog<B>,
) -> Result<(), Errors>
where
    B: Backend,
    V: Clone,
{
    let mut validator = Validator {
        catalog,
        path: Vec::new(),
        errors: Vec::new(),
    };
    validator.simple_select(select);
    Errors(validator.errors).into_result()
}

/// Checks the split conditions and the slice of a connection against its
/// ordering.
///
/// Rows are ordered by the declared `order_by` items followed by the primary
/// key columns ascending. Split `i` must be on the `i`th item of that
/// ordering.
pub fn validate_connection<B, R, V>(connection: &ConnectionSelect<B, R, V>) -> Result<(), Errors>
where
    B: Backend,
    V: Clone,
{
    let Some(splits) = &connection.split else {
        return Ok(());
    };
    let kind = splits.head.kind;
    let mut errors = Vec::new();

    if splits.iter().any(|s| s.kind != kind) {
        errors.push(Error::new_simple(
            "connection split conditions mix `before` and `after`",
        ));
    }

    match (connection.slice, kind) {
        (Some(ConnectionSlice::First(_)), ConnectionSplitKind::Before) => {
            errors.push(
                Error::new(Reason::Expected {
                    who: Some("`first`".to_string()),
                    expected: "an `after` cursor".to_string(),
                    found: "a `before` cursor".to_string(),
                })
                .push_hint("use `last` to page backwards"),
            );
        }
        (Some(ConnectionSlice::Last(_)), ConnectionSplitKind::After) => {
            errors.push(
                Error::new(Reason::Expected {
                    who: Some("`last`".to_string()),
                    expected: "a `before` cursor".to_string(),
                    found: "an `after` cursor".to_string(),
                })
                .push_hint("use `first` to page forwards"),
            );
        }
        (Some(ConnectionSlice::First(_)), ConnectionSplitKind::After)
        | (Some(ConnectionSlice::Last(_)), ConnectionSplitKind::Before)
        | (None, _) => {}
    }

    let ordering = effective_ordering(connection);
    if splits.len() > ordering.len() {
        errors.push(Error::new(Reason::Expected {
            who: Some("cursor".to_string()),
            expected: format!("at most {} split conditions", ordering.len()),
            found: splits.len().to_string(),
        }));
    }

    for (position, (split, expected)) in splits.iter().zip(&ordering).enumerate() {
        let matches = split.order_by.element == expected.element
            && split.order_by.effective_direction() == expected.effective_direction()
            && split.order_by.nulls == expected.nulls;
        if !matches {
            errors.push(Error::new_simple(format!(
                "connection split condition {} does not follow the ordering of the connection",
                position + 1
            )));
        }
    }

    Errors(errors).into_result()
}

/// The declared ordering of a connection followed by its primary key,
/// with leaf values erased.
fn effective_ordering<B, R, V>(
    connection: &ConnectionSelect<B, R, V>,
) -> Vec<OrderByItem<AnnotatedOrderByElement<B, ()>>>
where
    B: Backend,
    V: Clone,
{
    let order_by = &connection.select.args.order_by;
    let declared = order_by.iter().flat_map(|o| o.iter());
    let declared = declared.map(|item| OrderByItem {
        element: Bitraverse::<Void, V>::map_values(item.element.clone(), |_| ()),
        direction: item.direction,
        nulls: item.nulls,
    });

    let primary_key = connection
        .primary_key_columns
        .iter()
        .map(|c: &ColumnInfo<B>| {
            OrderByItem::asc(AnnotatedOrderByElement::column(c.clone()))
        });

    declared.chain(primary_key).collect()
}

fn table_of<B: Backend, V>(from: &SelectFrom<B, V>) -> Option<&B::TableName> {
    match from {
        SelectFrom::Table(table) => Some(table),
        SelectFrom::Identifier(_) | SelectFrom::Function(_) | SelectFrom::NativeQuery { .. } => {
            None
        }
    }
}

struct Validator<'c, B: Backend> {
    catalog: &'c dyn SchemaCatalog<B>,
    path: Vec<String>,
    errors: Vec<Error>,
}

impl<'c, B: Backend> Validator<'c, B> {
    fn push(&mut self, mut error: Error) {
        let mut path = self.path.clone();
        path.append(&mut error.path);
        error.path = path;
        self.errors.push(error);
    }

    fn in_field(&mut self, name: &FieldName, f: impl FnOnce(&mut Self)) {
        self.path.push(name.to_string());
        f(self);
        self.path.pop();
    }

    fn simple_select<R, V: Clone>(&mut self, select: &AnnSimpleSelect<B, R, V>) {
        self.args(&select.args);
        self.fields(table_of(&select.from), &select.fields);
    }

    fn aggregate_select<R, V: Clone>(&mut self, select: &AnnAggregateSelect<B, R, V>) {
        self.args(&select.args);
        let table = table_of(&select.from);

        for (name, field) in &select.fields {
            self.in_field(name, |this| match field {
                TableAggregateField::Aggregate(_) => {
                    for op in field.aggregate_ops() {
                        this.aggregate_op(op);
                    }
                }
                TableAggregateField::Nodes { xnodes: _, fields } => this.fields(table, fields),
                TableAggregateField::Expression(_) => {}
            });
        }
    }

    fn connection_select<R, V: Clone>(&mut self, connection: &ConnectionSelect<B, R, V>) {
        if let Err(errors) = validate_connection(connection) {
            for error in errors.0 {
                self.push(error);
            }
        }

        let select = &connection.select;
        self.args(&select.args);
        let table = table_of(&select.from);

        for (name, field) in &select.fields {
            self.in_field(name, |this| match field {
                ConnectionField::TypeName(_) | ConnectionField::PageInfo(_) => {}
                ConnectionField::Edges(edges) => {
                    for (name, edge) in edges {
                        this.in_field(name, |this| match edge {
                            EdgeField::TypeName(_) | EdgeField::Cursor => {}
                            EdgeField::Node(fields) => this.fields(table, fields),
                        });
                    }
                }
            });
        }
    }

    fn fields<R, V: Clone>(
        &mut self,
        table: Option<&B::TableName>,
        fields: &IndexMap<FieldName, AnnField<B, R, V>>,
    ) {
        for (name, field) in fields {
            self.in_field(name, |this| this.field(table, field));
        }
    }

    fn field<R, V: Clone>(&mut self, table: Option<&B::TableName>, field: &AnnField<B, R, V>) {
        match field {
            AnnField::Column(_) | AnnField::NodeId { .. } | AnnField::Expression(_) => {}
            AnnField::ObjectRelation(rel) => {
                let target = table_of(&rel.select.target);
                self.mapping(table, target, &rel.mapping);
                self.fields(target, &rel.select.fields);
            }
            AnnField::ArrayRelation(ArraySelect::Simple(rel)) => {
                self.mapping(table, table_of(&rel.select.from), &rel.mapping);
                self.simple_select(&rel.select);
            }
            AnnField::ArrayRelation(ArraySelect::Aggregate(rel)) => {
                self.mapping(table, table_of(&rel.select.from), &rel.mapping);
                self.aggregate_select(&rel.select);
            }
            AnnField::ArrayRelation(ArraySelect::Connection(rel)) => {
                self.mapping(table, table_of(&rel.select.select.from), &rel.mapping);
                self.connection_select(&rel.select);
            }
            AnnField::ComputedField { select, .. } => match select {
                ComputedFieldSelect::Scalar(_) => {}
                ComputedFieldSelect::Table { agg: _, select } => self.simple_select(select),
            },
            AnnField::Remote(remote) => {
                for join_field in remote.lhs_join_fields.values() {
                    match join_field {
                        JoinField::Column { column, .. } => self.column_exists(table, column),
                        JoinField::ComputedField { .. } => {}
                    }
                }
            }
        }
    }

    fn args<V>(&mut self, args: &SelectArgs<B, V>) {
        for item in args.order_by.iter().flat_map(|o| o.iter()) {
            for op in item.element.aggregate_ops() {
                self.aggregate_op(op);
            }
        }
    }

    fn aggregate_op(&mut self, op: &str) {
        if !B::supports_aggregate_op(op) {
            self.push(Error::new(Reason::Unsupported {
                feature: format!("aggregate operator `{op}`"),
                backend: B::backend_type().to_string(),
            }));
        }
    }

    fn mapping(
        &mut self,
        parent: Option<&B::TableName>,
        target: Option<&B::TableName>,
        mapping: &IndexMap<B::Column, B::Column>,
    ) {
        for (left, right) in mapping {
            self.column_exists(parent, left);
            self.column_exists(target, right);
        }
    }

    fn column_exists(&mut self, table: Option<&B::TableName>, column: &B::Column) {
        // selects from functions and native queries have no catalog entry
        let Some(table) = table else {
            return;
        };

        let catalog = self.catalog;
        match catalog.columns(table) {
            None => self.push(Error::new(Reason::NotFound {
                name: table.to_string(),
                namespace: "table".to_string(),
            })),
            Some(columns) if !columns.contains(column) => {
                self.push(Error::new(Reason::NotFound {
                    name: format!("{table}.{column}"),
                    namespace: "column".to_string(),
                }))
            }
            Some(_) => {}
        }
    }
}
