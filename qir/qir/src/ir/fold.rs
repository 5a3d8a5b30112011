//! Borrowing traversal of the IR.
//!
//! [Walk] visits every remote payload `R` and every leaf value `V` of a tree
//! in a fixed order. Within a select that order is: fields (in map order,
//! which includes nested selects), then `from`, then the permission filter,
//! then the arguments. [crate::ir::traverse] visits leaves in the same order,
//! so parameter lists built by either agree.
//!
//! Every node type implements [Walk] by hand, in the same shape as its
//! [crate::ir::traverse::Bitraverse] impl. A field skipped here silently
//! drops its leaves from every fold, so both files must be changed together.
//!
//! Types that hold no `R` implement `Walk<R, V>` for every `R`. Calling a
//! derived method on such a type directly needs the `R` spelled out:
//! `Walk::<Void, _>::values(&filter)`.
use std::collections::BTreeSet;
use std::mem;

use indexmap::IndexMap;

use super::aggregate::{AggregateField, AggregateOp, CountType, SelectionField, TableAggregateField};
use super::bool_exp::{AnnBoolExp, OpExp};
use super::column::{AnnColumnField, AnnRedactionExp};
use super::connection::{ConnectionField, ConnectionSelect, ConnectionSplit, EdgeField};
use super::function::{ArgumentExp, FunctionArgs};
use super::generic::{NonEmpty, OrderByItem};
use super::order_by::{
    AnnotatedAggregateOrderBy, AnnotatedOrderByElement, ComputedFieldOrderBy,
    ComputedFieldOrderByElement,
};
use super::relationship::{AnnObjectSelect, AnnRelationSelect, ArraySelect};
use super::remote::{RemoteRelationshipSelect, RemoteSourceSelect, SourceRelationshipSelection};
use super::select::{
    AnnField, AnnSelectG, ComputedFieldScalarSelect, ComputedFieldSelect, SelectArgs, SelectFrom,
    SelectFromFunction, TablePerm,
};
use super::stream::{AnnSelectStreamG, SelectStreamArgs, StreamCursorItem};
use crate::backend::Backend;

/// Receives the remote payloads and leaf values of a tree.
pub trait Visitor<'a, R, V> {
    fn visit_remote(&mut self, _remote: &'a R) {}

    fn visit_value(&mut self, _value: &'a V) {}
}

pub trait Walk<R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W);

    /// Maps every remote payload with `f` and every value with `g`, and
    /// combines the results left to right.
    fn bifold_map<'a, M, F, G>(&'a self, f: F, g: G) -> M
    where
        R: 'a,
        V: 'a,
        M: Monoid,
        F: FnMut(&'a R) -> M,
        G: FnMut(&'a V) -> M,
    {
        let mut folder = BifoldMap {
            acc: M::empty(),
            f,
            g,
        };
        self.walk(&mut folder);
        folder.acc
    }

    fn fold_values<'a, M, G>(&'a self, g: G) -> M
    where
        R: 'a,
        V: 'a,
        M: Monoid,
        G: FnMut(&'a V) -> M,
    {
        self.bifold_map(|_| M::empty(), g)
    }

    fn fold_remotes<'a, M, F>(&'a self, f: F) -> M
    where
        R: 'a,
        V: 'a,
        M: Monoid,
        F: FnMut(&'a R) -> M,
    {
        self.bifold_map(f, |_| M::empty())
    }

    fn values<'a>(&'a self) -> Vec<&'a V>
    where
        R: 'a,
        V: 'a,
    {
        self.fold_values(|v| vec![v])
    }

    fn remotes<'a>(&'a self) -> Vec<&'a R>
    where
        R: 'a,
        V: 'a,
    {
        self.fold_remotes(|r| vec![r])
    }
}

/// An associative combination with an identity.
pub trait Monoid {
    fn empty() -> Self;

    fn combine(self, other: Self) -> Self;
}

impl Monoid for () {
    fn empty() -> Self {}

    fn combine(self, _other: Self) -> Self {}
}

impl Monoid for usize {
    fn empty() -> Self {
        0
    }

    fn combine(self, other: Self) -> Self {
        self + other
    }
}

impl<T> Monoid for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Monoid for String {
    fn empty() -> Self {
        String::new()
    }

    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

impl<T: Ord> Monoid for BTreeSet<T> {
    fn empty() -> Self {
        BTreeSet::new()
    }

    fn combine(mut self, mut other: Self) -> Self {
        self.append(&mut other);
        self
    }
}

impl<A: Monoid, B: Monoid> Monoid for (A, B) {
    fn empty() -> Self {
        (A::empty(), B::empty())
    }

    fn combine(self, other: Self) -> Self {
        (self.0.combine(other.0), self.1.combine(other.1))
    }
}

struct BifoldMap<M, F, G> {
    acc: M,
    f: F,
    g: G,
}

impl<M: Monoid, F, G> BifoldMap<M, F, G> {
    fn push(&mut self, m: M) {
        let acc = mem::replace(&mut self.acc, M::empty());
        self.acc = acc.combine(m);
    }
}

impl<'a, R, V, M, F, G> Visitor<'a, R, V> for BifoldMap<M, F, G>
where
    R: 'a,
    V: 'a,
    M: Monoid,
    F: FnMut(&'a R) -> M,
    G: FnMut(&'a V) -> M,
{
    fn visit_remote(&mut self, remote: &'a R) {
        let m = (self.f)(remote);
        self.push(m);
    }

    fn visit_value(&mut self, value: &'a V) {
        let m = (self.g)(value);
        self.push(m);
    }
}

// Containers

impl<R, V, T: Walk<R, V>> Walk<R, V> for Vec<T> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        for item in self {
            item.walk(w);
        }
    }
}

impl<R, V, T: Walk<R, V>> Walk<R, V> for Option<T> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        if let Some(item) = self {
            item.walk(w);
        }
    }
}

impl<R, V, T: Walk<R, V>> Walk<R, V> for Box<T> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        (**self).walk(w);
    }
}

impl<R, V, T: Walk<R, V>> Walk<R, V> for NonEmpty<T> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        for item in self.iter() {
            item.walk(w);
        }
    }
}

impl<R, V, K, T: Walk<R, V>> Walk<R, V> for IndexMap<K, T> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        for item in self.values() {
            item.walk(w);
        }
    }
}

impl<R, V, T: Walk<R, V>> Walk<R, V> for OrderByItem<T> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let OrderByItem {
            element,
            direction: _,
            nulls: _,
        } = self;
        element.walk(w);
    }
}

// Leaves

impl<R, V> Walk<R, V> for ArgumentExp<V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            ArgumentExp::TableRow => {}
            ArgumentExp::Input(v) => w.visit_value(v),
        }
    }
}

impl<R, V> Walk<R, V> for FunctionArgs<V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let FunctionArgs { positional, named } = self;
        positional.walk(w);
        named.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for AnnBoolExp<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            AnnBoolExp::And(items) | AnnBoolExp::Or(items) => items.walk(w),
            AnnBoolExp::Not(inner) => inner.walk(w),
            AnnBoolExp::Exists { table: _, filter } => filter.walk(w),
            AnnBoolExp::Column { column: _, ops } => ops.walk(w),
            AnnBoolExp::Relationship {
                relationship: _,
                target_filter,
                filter,
            } => {
                target_filter.walk(w);
                filter.walk(w);
            }
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for OpExp<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            OpExp::Compare { op: _, value } => w.visit_value(value),
            OpExp::In(value) | OpExp::Nin(value) | OpExp::Like(value) => w.visit_value(value),
            OpExp::IsNull(_) => {}
            OpExp::CompareColumn { op: _, column: _ } => {}
            OpExp::Custom { name: _, argument } => w.visit_value(argument),
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for AnnRedactionExp<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            AnnRedactionExp::NoRedaction => {}
            AnnRedactionExp::RedactIfFalse(exp) => exp.walk(w),
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for AnnColumnField<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let AnnColumnField {
            column: _,
            ty: _,
            as_text: _,
            arguments: _,
            redaction,
        } = self;
        redaction.walk(w);
    }
}

// Order by

impl<B: Backend, R, V> Walk<R, V> for AnnotatedOrderByElement<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            AnnotatedOrderByElement::Column {
                column: _,
                redaction,
            } => redaction.walk(w),
            AnnotatedOrderByElement::ObjectRelation {
                relationship: _,
                filter,
                element,
            } => {
                filter.walk(w);
                element.walk(w);
            }
            AnnotatedOrderByElement::ArrayAggregation {
                relationship: _,
                filter,
                aggregate,
            } => {
                filter.walk(w);
                aggregate.walk(w);
            }
            AnnotatedOrderByElement::ComputedField(ComputedFieldOrderBy {
                xfield: _,
                name: _,
                function: _,
                args,
                element,
            }) => {
                args.walk(w);
                match element {
                    ComputedFieldOrderByElement::Scalar { ty: _, redaction } => redaction.walk(w),
                    ComputedFieldOrderByElement::Aggregate {
                        table: _,
                        filter,
                        aggregate,
                    } => {
                        filter.walk(w);
                        aggregate.walk(w);
                    }
                }
            }
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for AnnotatedAggregateOrderBy<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            AnnotatedAggregateOrderBy::Count => {}
            AnnotatedAggregateOrderBy::Op {
                op: _,
                result_type: _,
                column: _,
                redaction,
            } => redaction.walk(w),
        }
    }
}

// Select

impl<B: Backend, F: Walk<R, V>, R, V> Walk<R, V> for AnnSelectG<B, F, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let AnnSelectG {
            fields,
            from,
            perm,
            args,
            stringify_numbers: _,
            naming_convention: _,
        } = self;
        fields.walk(w);
        from.walk(w);
        perm.walk(w);
        args.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for SelectFrom<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            SelectFrom::Table(_) | SelectFrom::Identifier(_) => {}
            SelectFrom::Function(SelectFromFunction {
                function: _,
                args,
                definition_list: _,
            }) => args.walk(w),
            SelectFrom::NativeQuery { name: _, arguments } => {
                for value in arguments.values() {
                    w.visit_value(value);
                }
            }
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for TablePerm<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let TablePerm { filter, limit: _ } = self;
        filter.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for SelectArgs<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let SelectArgs {
            where_,
            order_by,
            limit: _,
            offset: _,
            distinct: _,
        } = self;
        where_.walk(w);
        order_by.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for AnnField<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            AnnField::Column(column) => column.walk(w),
            AnnField::ObjectRelation(rel) => rel.walk(w),
            AnnField::ArrayRelation(array) => array.walk(w),
            AnnField::ComputedField {
                xfield: _,
                name: _,
                select,
            } => select.walk(w),
            AnnField::Remote(remote) => remote.walk(w),
            AnnField::NodeId {
                xrelay: _,
                table: _,
                primary_key: _,
            } => {}
            AnnField::Expression(_) => {}
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for ComputedFieldSelect<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            ComputedFieldSelect::Scalar(ComputedFieldScalarSelect {
                function: _,
                args,
                ty: _,
                arguments: _,
                redaction,
            }) => {
                args.walk(w);
                redaction.walk(w);
            }
            ComputedFieldSelect::Table { agg: _, select } => select.walk(w),
        }
    }
}

// Relationships

impl<B: Backend, A: Walk<R, V>, R, V> Walk<R, V> for AnnRelationSelect<B, A> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let AnnRelationSelect {
            name: _,
            mapping: _,
            nullable: _,
            select,
        } = self;
        select.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for AnnObjectSelect<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let AnnObjectSelect {
            fields,
            target,
            filter,
        } = self;
        fields.walk(w);
        target.walk(w);
        filter.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for ArraySelect<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            ArraySelect::Simple(rel) => rel.walk(w),
            ArraySelect::Aggregate(rel) => rel.walk(w),
            ArraySelect::Connection(rel) => rel.walk(w),
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for RemoteRelationshipSelect<B, R> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let RemoteRelationshipSelect {
            lhs_join_fields: _,
            relationship,
        } = self;
        w.visit_remote(relationship);
    }
}

impl<Tgt: Backend, R, V> Walk<R, V> for RemoteSourceSelect<Tgt, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let RemoteSourceSelect {
            name: _,
            config: _,
            selection,
            join_mapping: _,
            stringify_numbers: _,
        } = self;
        selection.walk(w);
    }
}

impl<Tgt: Backend, R, V> Walk<R, V> for SourceRelationshipSelection<Tgt, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            SourceRelationshipSelection::Object(select) => select.walk(w),
            SourceRelationshipSelection::Array(select) => select.walk(w),
            SourceRelationshipSelection::ArrayAggregate(select) => select.walk(w),
        }
    }
}

// Aggregates

impl<B: Backend, R, V> Walk<R, V> for TableAggregateField<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            TableAggregateField::Aggregate(fields) => fields.walk(w),
            TableAggregateField::Nodes { xnodes: _, fields } => fields.walk(w),
            TableAggregateField::Expression(_) => {}
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for AggregateField<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            AggregateField::Count(count) => count.walk(w),
            AggregateField::Op(AggregateOp { op: _, fields }) => fields.walk(w),
            AggregateField::Expression(_) => {}
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for CountType<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            CountType::Star => {}
            CountType::NonNull(columns) | CountType::Distinct(columns) => {
                for (_, redaction) in columns {
                    redaction.walk(w);
                }
            }
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for SelectionField<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            SelectionField::Column {
                column: _,
                redaction,
            } => redaction.walk(w),
            SelectionField::ComputedField {
                xfield: _,
                name: _,
                function: _,
                args,
                ty: _,
                redaction,
            } => {
                args.walk(w);
                redaction.walk(w);
            }
            SelectionField::Expression(_) => {}
        }
    }
}

// Connections

impl<B: Backend, R, V> Walk<R, V> for ConnectionSelect<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let ConnectionSelect {
            xrelay: _,
            primary_key_columns: _,
            split,
            slice: _,
            select,
        } = self;
        split.walk(w);
        select.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for ConnectionSplit<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let ConnectionSplit {
            kind: _,
            value,
            order_by: _,
        } = self;
        w.visit_value(value);
    }
}

impl<B: Backend, R, V> Walk<R, V> for ConnectionField<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            ConnectionField::TypeName(_) | ConnectionField::PageInfo(_) => {}
            ConnectionField::Edges(edges) => edges.walk(w),
        }
    }
}

impl<B: Backend, R, V> Walk<R, V> for EdgeField<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        match self {
            EdgeField::TypeName(_) | EdgeField::Cursor => {}
            EdgeField::Node(fields) => fields.walk(w),
        }
    }
}

// Streaming

impl<B: Backend, R, V> Walk<R, V> for AnnSelectStreamG<B, R, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let AnnSelectStreamG {
            xstream: _,
            fields,
            from,
            perm,
            args,
            stringify_numbers: _,
        } = self;
        fields.walk(w);
        from.walk(w);
        perm.walk(w);
        args.walk(w);
    }
}

impl<B: Backend, R, V> Walk<R, V> for SelectStreamArgs<B, V> {
    fn walk<'a, W: Visitor<'a, R, V> + ?Sized>(&'a self, w: &mut W) {
        let SelectStreamArgs {
            where_,
            batch_size: _,
            cursor,
        } = self;
        let StreamCursorItem {
            ordering: _,
            column: _,
            initial_value,
        } = cursor;
        where_.walk(w);
        w.visit_value(initial_value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_monoids() {
        assert_eq!(<(usize, String)>::empty(), (0, String::new()));
        assert_eq!(
            (1usize, "a".to_string()).combine((2, "b".to_string())),
            (3, "ab".to_string())
        );
        let set: BTreeSet<u8> = [3, 1].into_iter().collect();
        assert_eq!(
            set.combine([2, 3].into_iter().collect()),
            [1, 2, 3].into_iter().collect()
        );
    }
}
