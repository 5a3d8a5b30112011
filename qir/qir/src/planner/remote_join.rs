//! Splitting remote relationships off a select.
//!
//! A backend can only run the part of a select that lives in its own source.
//! Every [AnnField::Remote] is replaced by a `null` placeholder and recorded
//! in a [JoinTree], keyed by the path of response field names that leads to
//! it. The values the remote side joins on must be in the response, so the
//! join columns are added to the selection when they are not already there.
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::Serialize;

use crate::backend::{Backend, Void};
use crate::ir::{
    AnnAggregateSelect, AnnColumnField, AnnField, AnnObjectSelect, AnnRedactionExp,
    AnnRelationSelect, AnnSimpleSelect, ArgumentExp, ArraySelect, ComputedFieldScalarSelect,
    ComputedFieldSelect, ConnectionField, ConnectionSelect, EdgeField, FieldName, FunctionArgs,
    JoinField, RemoteRelationshipSelect, TableAggregateField,
};

/// Prefix of fields added to a selection only to carry join values.
pub const PHANTOM_FIELD_PREFIX: &str = "__phantom__";

/// Remote joins of a select, nested the way the response is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinTree<R>(pub IndexMap<FieldName, JoinNode<R>>);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JoinNode<R> {
    Leaf(RemoteJoin<R>),
    Tree(JoinTree<R>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteJoin<R> {
    /// For each join field of the relationship, the response field that
    /// holds its value.
    pub join_columns: IndexMap<FieldName, JoinColumnAlias>,
    pub relationship: R,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum JoinColumnAlias {
    /// The column was selected by the query itself.
    Selected(FieldName),
    /// The column was added for the join and is removed from the response
    /// once the join is done.
    Phantom(FieldName),
}

impl JoinColumnAlias {
    pub fn field_name(&self) -> &FieldName {
        match self {
            JoinColumnAlias::Selected(name) | JoinColumnAlias::Phantom(name) => name,
        }
    }
}

impl<R> Default for JoinTree<R> {
    fn default() -> Self {
        JoinTree(IndexMap::new())
    }
}

impl<R> JoinTree<R> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every remote join, with the response path that leads to it.
    pub fn leaves(&self) -> Vec<(Vec<&FieldName>, &RemoteJoin<R>)> {
        let mut res = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut res);
        res
    }

    fn collect_leaves<'a>(
        &'a self,
        path: &mut Vec<&'a FieldName>,
        res: &mut Vec<(Vec<&'a FieldName>, &'a RemoteJoin<R>)>,
    ) {
        for (name, node) in &self.0 {
            path.push(name);
            match node {
                JoinNode::Leaf(join) => res.push((path.clone(), join)),
                JoinNode::Tree(tree) => tree.collect_leaves(path, res),
            }
            path.pop();
        }
    }

    fn insert_subtree(&mut self, name: FieldName, tree: JoinTree<R>) {
        if !tree.is_empty() {
            self.0.insert(name, JoinNode::Tree(tree));
        }
    }

    fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Removes the remote relationships of `select`, returning the part the
/// backend runs and the joins to do afterwards.
pub fn collect_remote_joins<B: Backend, R, V>(
    select: AnnSimpleSelect<B, R, V>,
) -> (AnnSimpleSelect<B, Void, V>, Option<JoinTree<R>>) {
    let (select, tree) = transform_select(select);
    if !tree.is_empty() {
        debug!("collected {} remote joins", tree.leaves().len());
    }
    (select, tree.into_option())
}

fn transform_select<B: Backend, R, V>(
    mut select: AnnSimpleSelect<B, R, V>,
) -> (AnnSimpleSelect<B, Void, V>, JoinTree<R>) {
    let fields = std::mem::take(&mut select.fields);
    let (fields, tree) = transform_fields(fields);
    (select.with_fields(fields), tree)
}

fn transform_aggregate_select<B: Backend, R, V>(
    mut select: AnnAggregateSelect<B, R, V>,
) -> (AnnAggregateSelect<B, Void, V>, JoinTree<R>) {
    let mut tree = JoinTree::default();
    let mut fields = IndexMap::with_capacity(select.fields.len());

    for (name, field) in std::mem::take(&mut select.fields) {
        let field = match field {
            TableAggregateField::Aggregate(aggregate) => TableAggregateField::Aggregate(aggregate),
            TableAggregateField::Nodes { xnodes, fields } => {
                let (fields, sub) = transform_fields(fields);
                tree.insert_subtree(name.clone(), sub);
                TableAggregateField::Nodes { xnodes, fields }
            }
            TableAggregateField::Expression(text) => TableAggregateField::Expression(text),
        };
        fields.insert(name, field);
    }
    (select.with_fields(fields), tree)
}

fn transform_connection_select<B: Backend, R, V>(
    connection: ConnectionSelect<B, R, V>,
) -> (ConnectionSelect<B, Void, V>, JoinTree<R>) {
    let ConnectionSelect {
        xrelay,
        primary_key_columns,
        split,
        slice,
        mut select,
    } = connection;

    let mut tree = JoinTree::default();
    let mut fields = IndexMap::with_capacity(select.fields.len());

    for (name, field) in std::mem::take(&mut select.fields) {
        let field = match field {
            ConnectionField::TypeName(text) => ConnectionField::TypeName(text),
            ConnectionField::PageInfo(page_info) => ConnectionField::PageInfo(page_info),
            ConnectionField::Edges(edges) => {
                let mut edges_tree = JoinTree::default();
                let mut new_edges = IndexMap::with_capacity(edges.len());
                for (edge_name, edge) in edges {
                    let edge = match edge {
                        EdgeField::TypeName(text) => EdgeField::TypeName(text),
                        EdgeField::Cursor => EdgeField::Cursor,
                        EdgeField::Node(node_fields) => {
                            let (node_fields, sub) = transform_fields(node_fields);
                            edges_tree.insert_subtree(edge_name.clone(), sub);
                            EdgeField::Node(node_fields)
                        }
                    };
                    new_edges.insert(edge_name, edge);
                }
                tree.insert_subtree(name.clone(), edges_tree);
                ConnectionField::Edges(new_edges)
            }
        };
        fields.insert(name, field);
    }

    let connection = ConnectionSelect {
        xrelay,
        primary_key_columns,
        split,
        slice,
        select: select.with_fields(fields),
    };
    (connection, tree)
}

fn transform_relation<B: Backend, A, T, R>(
    rel: AnnRelationSelect<B, A>,
    f: impl FnOnce(A) -> (T, JoinTree<R>),
) -> (AnnRelationSelect<B, T>, JoinTree<R>) {
    let (select, tree) = f(rel.select);
    let rel = AnnRelationSelect {
        name: rel.name,
        mapping: rel.mapping,
        nullable: rel.nullable,
        select,
    };
    (rel, tree)
}

fn transform_object_select<B: Backend, R, V>(
    select: AnnObjectSelect<B, R, V>,
) -> (AnnObjectSelect<B, Void, V>, JoinTree<R>) {
    let (fields, tree) = transform_fields(select.fields);
    let select = AnnObjectSelect {
        fields,
        target: select.target,
        filter: select.filter,
    };
    (select, tree)
}

fn transform_fields<B: Backend, R, V>(
    fields: IndexMap<FieldName, AnnField<B, R, V>>,
) -> (IndexMap<FieldName, AnnField<B, Void, V>>, JoinTree<R>) {
    let mut tree = JoinTree::default();
    let mut remotes = Vec::new();
    let mut res = IndexMap::with_capacity(fields.len());

    for (name, field) in fields {
        let field = match field {
            AnnField::Column(column) => AnnField::Column(column),
            AnnField::ObjectRelation(rel) => {
                let (rel, sub) = transform_relation(rel, transform_object_select);
                tree.insert_subtree(name.clone(), sub);
                AnnField::ObjectRelation(rel)
            }
            AnnField::ArrayRelation(array) => {
                let (array, sub) = match array {
                    ArraySelect::Simple(rel) => {
                        let (rel, sub) = transform_relation(rel, transform_select);
                        (ArraySelect::Simple(rel), sub)
                    }
                    ArraySelect::Aggregate(rel) => {
                        let (rel, sub) = transform_relation(rel, transform_aggregate_select);
                        (ArraySelect::Aggregate(rel), sub)
                    }
                    ArraySelect::Connection(rel) => {
                        let (rel, sub) = transform_relation(rel, transform_connection_select);
                        (ArraySelect::Connection(rel), sub)
                    }
                };
                tree.insert_subtree(name.clone(), sub);
                AnnField::ArrayRelation(array)
            }
            AnnField::ComputedField {
                xfield,
                name: cf_name,
                select,
            } => {
                let select = match select {
                    ComputedFieldSelect::Scalar(scalar) => ComputedFieldSelect::Scalar(scalar),
                    ComputedFieldSelect::Table { agg, select } => {
                        let (select, sub) = transform_select(select);
                        tree.insert_subtree(name.clone(), sub);
                        ComputedFieldSelect::Table { agg, select }
                    }
                };
                AnnField::ComputedField {
                    xfield,
                    name: cf_name,
                    select,
                }
            }
            AnnField::Remote(remote) => {
                remotes.push((name.clone(), remote));
                AnnField::Expression("null".to_string())
            }
            AnnField::NodeId {
                xrelay,
                table,
                primary_key,
            } => AnnField::NodeId {
                xrelay,
                table,
                primary_key,
            },
            AnnField::Expression(text) => AnnField::Expression(text),
        };
        res.insert(name, field);
    }

    let mut phantoms = IndexSet::new();
    for (name, remote) in remotes {
        let join = join_columns(&mut res, &mut phantoms, remote);
        tree.0.insert(name, JoinNode::Leaf(join));
    }

    (res, tree)
}

/// Finds or adds the fields that carry the join values of `remote`.
///
/// `phantoms` holds the fields added so far at this level. Only those are
/// reported as [JoinColumnAlias::Phantom], whatever the name of a field the
/// query selected itself.
fn join_columns<B: Backend, R, V>(
    fields: &mut IndexMap<FieldName, AnnField<B, Void, V>>,
    phantoms: &mut IndexSet<FieldName>,
    remote: RemoteRelationshipSelect<B, R>,
) -> RemoteJoin<R> {
    let mut join_columns = IndexMap::with_capacity(remote.lhs_join_fields.len());

    for (join_name, join_field) in remote.lhs_join_fields {
        let existing = fields
            .iter()
            .find(|(_, field)| selects_join_field(field, &join_field))
            .map(|(name, _)| name.clone());

        let alias = match existing {
            Some(name) if phantoms.contains(&name) => JoinColumnAlias::Phantom(name),
            Some(name) => JoinColumnAlias::Selected(name),
            None => {
                let name = unused_name(fields, format!("{PHANTOM_FIELD_PREFIX}{join_name}"));
                fields.insert(name.clone(), phantom_field(join_field));
                phantoms.insert(name.clone());
                JoinColumnAlias::Phantom(name)
            }
        };
        join_columns.insert(join_name, alias);
    }

    RemoteJoin {
        join_columns,
        relationship: remote.relationship,
    }
}

/// `base`, or `base_<n>` with the smallest `n` that is not a field yet.
fn unused_name<F>(fields: &IndexMap<FieldName, F>, base: String) -> FieldName {
    let mut name = FieldName::new(base.clone());
    let mut suffix = 1;
    while fields.contains_key(&name) {
        name = FieldName::new(format!("{base}_{suffix}"));
        suffix += 1;
    }
    name
}

/// Whether `field` returns the value of `join_field` unchanged.
fn selects_join_field<B: Backend, V>(
    field: &AnnField<B, Void, V>,
    join_field: &JoinField<B>,
) -> bool {
    match (field, join_field) {
        (AnnField::Column(c), JoinField::Column { column, ty: _ }) => {
            c.column == *column && c.is_plain()
        }
        (
            AnnField::ComputedField {
                xfield: _,
                name,
                select: ComputedFieldSelect::Scalar(scalar),
            },
            JoinField::ComputedField {
                xfield: _,
                name: join_name,
                function: _,
                ty: _,
            },
        ) => {
            name == join_name
                && scalar.arguments.is_none()
                && !scalar.redaction.is_redacted()
                && scalar.args.named.is_empty()
                && matches!(scalar.args.positional.as_slice(), [ArgumentExp::TableRow])
        }
        (AnnField::Column(_), JoinField::ComputedField { .. })
        | (AnnField::ComputedField { .. }, JoinField::Column { .. })
        | (
            AnnField::ComputedField {
                select: ComputedFieldSelect::Table { .. },
                ..
            },
            JoinField::ComputedField { .. },
        )
        | (
            AnnField::ObjectRelation(_)
            | AnnField::ArrayRelation(_)
            | AnnField::Remote(_)
            | AnnField::NodeId { .. }
            | AnnField::Expression(_),
            JoinField::Column { .. } | JoinField::ComputedField { .. },
        ) => false,
    }
}

fn phantom_field<B: Backend, V>(join_field: JoinField<B>) -> AnnField<B, Void, V> {
    match join_field {
        JoinField::Column { column, ty } => AnnField::Column(AnnColumnField::new(column, ty)),
        JoinField::ComputedField {
            xfield,
            name,
            function,
            ty,
        } => AnnField::ComputedField {
            xfield,
            name,
            select: ComputedFieldSelect::Scalar(ComputedFieldScalarSelect {
                function,
                args: FunctionArgs::positional(vec![ArgumentExp::TableRow]),
                ty,
                arguments: None,
                redaction: AnnRedactionExp::NoRedaction,
            }),
        },
    }
}
