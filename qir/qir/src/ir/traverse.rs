//! Owning traversal of the IR: substitution of the remote payload `R` and
//! of the leaf values `V`.
//!
//! This is how passes narrow a tree, e.g. unprepared to prepared values, or
//! remote payloads to [crate::backend::Void] once they have been split off.
//! Leaves are visited in the same order as [crate::ir::fold::Walk].
//!
//! The mapping functions are passed down by `&mut` through every level.
//! Wrapping them in a new closure per level would make the recursion
//! instantiate an unbounded number of closure types.
use std::convert::Infallible;

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

pub trait Bitraverse<R, V>: Sized {
    /// This type with `R` replaced by `S` and `V` by `W`.
    type Output<S, W>;

    /// Replaces every remote payload with `f` and every value with `g`,
    /// stopping at the first error.
    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>;

    fn bimap<S, W, F, G>(self, mut f: F, mut g: G) -> Self::Output<S, W>
    where
        F: FnMut(R) -> S,
        G: FnMut(V) -> W,
    {
        let res: Result<_, Infallible> = self.try_bimap(&mut |r| Ok(f(r)), &mut |v| Ok(g(v)));
        match res {
            Ok(output) => output,
            Err(never) => match never {},
        }
    }

    fn map_values<W, G>(self, g: G) -> Self::Output<R, W>
    where
        G: FnMut(V) -> W,
    {
        self.bimap(|r| r, g)
    }

    fn map_remote<S, F>(self, f: F) -> Self::Output<S, V>
    where
        F: FnMut(R) -> S,
    {
        self.bimap(f, |v| v)
    }

    fn try_map_values<W, E, G>(self, mut g: G) -> Result<Self::Output<R, W>, E>
    where
        G: FnMut(V) -> Result<W, E>,
    {
        self.try_bimap(&mut |r| Ok(r), &mut g)
    }
}

// Containers

impl<R, V, T: Bitraverse<R, V>> Bitraverse<R, V> for Vec<T> {
    type Output<S, W> = Vec<T::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        let mut res = Vec::with_capacity(self.len());
        for item in self {
            res.push(item.try_bimap(f, g)?);
        }
        Ok(res)
    }
}

impl<R, V, T: Bitraverse<R, V>> Bitraverse<R, V> for Option<T> {
    type Output<S, W> = Option<T::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            Some(item) => Some(item.try_bimap(f, g)?),
            None => None,
        })
    }
}

impl<R, V, T: Bitraverse<R, V>> Bitraverse<R, V> for Box<T> {
    type Output<S, W> = Box<T::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(Box::new((*self).try_bimap(f, g)?))
    }
}

impl<R, V, T: Bitraverse<R, V>> Bitraverse<R, V> for NonEmpty<T> {
    type Output<S, W> = NonEmpty<T::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(NonEmpty {
            head: self.head.try_bimap(f, g)?,
            tail: self.tail.try_bimap(f, g)?,
        })
    }
}

impl<R, V, K, T> Bitraverse<R, V> for IndexMap<K, T>
where
    K: std::hash::Hash + Eq,
    T: Bitraverse<R, V>,
{
    type Output<S, W> = IndexMap<K, T::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        let mut res = IndexMap::with_capacity(self.len());
        for (key, item) in self {
            res.insert(key, item.try_bimap(f, g)?);
        }
        Ok(res)
    }
}

impl<R, V, T: Bitraverse<R, V>> Bitraverse<R, V> for OrderByItem<T> {
    type Output<S, W> = OrderByItem<T::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(OrderByItem {
            element: self.element.try_bimap(f, g)?,
            direction: self.direction,
            nulls: self.nulls,
        })
    }
}

// Leaves

impl<R, V> Bitraverse<R, V> for ArgumentExp<V> {
    type Output<S, W> = ArgumentExp<W>;

    fn try_bimap<S, W, E, F, G>(self, _f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            ArgumentExp::TableRow => ArgumentExp::TableRow,
            ArgumentExp::Input(v) => ArgumentExp::Input(g(v)?),
        })
    }
}

impl<R, V> Bitraverse<R, V> for FunctionArgs<V> {
    type Output<S, W> = FunctionArgs<W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(FunctionArgs {
            positional: self.positional.try_bimap(f, g)?,
            named: self.named.try_bimap(f, g)?,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AnnBoolExp<B, V> {
    type Output<S, W> = AnnBoolExp<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            AnnBoolExp::And(items) => AnnBoolExp::And(items.try_bimap(f, g)?),
            AnnBoolExp::Or(items) => AnnBoolExp::Or(items.try_bimap(f, g)?),
            AnnBoolExp::Not(inner) => AnnBoolExp::Not(inner.try_bimap(f, g)?),
            AnnBoolExp::Exists { table, filter } => AnnBoolExp::Exists {
                table,
                filter: filter.try_bimap(f, g)?,
            },
            AnnBoolExp::Column { column, ops } => AnnBoolExp::Column {
                column,
                ops: ops.try_bimap(f, g)?,
            },
            AnnBoolExp::Relationship {
                relationship,
                target_filter,
                filter,
            } => AnnBoolExp::Relationship {
                relationship,
                target_filter: target_filter.try_bimap(f, g)?,
                filter: filter.try_bimap(f, g)?,
            },
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for OpExp<B, V> {
    type Output<S, W> = OpExp<B, W>;

    fn try_bimap<S, W, E, F, G>(self, _f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            OpExp::Compare { op, value } => OpExp::Compare {
                op,
                value: g(value)?,
            },
            OpExp::In(value) => OpExp::In(g(value)?),
            OpExp::Nin(value) => OpExp::Nin(g(value)?),
            OpExp::Like(value) => OpExp::Like(g(value)?),
            OpExp::IsNull(is_null) => OpExp::IsNull(is_null),
            OpExp::CompareColumn { op, column } => OpExp::CompareColumn { op, column },
            OpExp::Custom { name, argument } => OpExp::Custom {
                name,
                argument: g(argument)?,
            },
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AnnRedactionExp<B, V> {
    type Output<S, W> = AnnRedactionExp<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            AnnRedactionExp::NoRedaction => AnnRedactionExp::NoRedaction,
            AnnRedactionExp::RedactIfFalse(exp) => {
                AnnRedactionExp::RedactIfFalse(exp.try_bimap(f, g)?)
            }
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AnnColumnField<B, V> {
    type Output<S, W> = AnnColumnField<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(AnnColumnField {
            column: self.column,
            ty: self.ty,
            as_text: self.as_text,
            arguments: self.arguments,
            redaction: self.redaction.try_bimap(f, g)?,
        })
    }
}

// Order by

impl<B: Backend, R, V> Bitraverse<R, V> for AnnotatedOrderByElement<B, V> {
    type Output<S, W> = AnnotatedOrderByElement<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            AnnotatedOrderByElement::Column { column, redaction } => {
                AnnotatedOrderByElement::Column {
                    column,
                    redaction: redaction.try_bimap(f, g)?,
                }
            }
            AnnotatedOrderByElement::ObjectRelation {
                relationship,
                filter,
                element,
            } => AnnotatedOrderByElement::ObjectRelation {
                relationship,
                filter: filter.try_bimap(f, g)?,
                element: element.try_bimap(f, g)?,
            },
            AnnotatedOrderByElement::ArrayAggregation {
                relationship,
                filter,
                aggregate,
            } => AnnotatedOrderByElement::ArrayAggregation {
                relationship,
                filter: filter.try_bimap(f, g)?,
                aggregate: aggregate.try_bimap(f, g)?,
            },
            AnnotatedOrderByElement::ComputedField(cf) => {
                AnnotatedOrderByElement::ComputedField(ComputedFieldOrderBy {
                    xfield: cf.xfield,
                    name: cf.name,
                    function: cf.function,
                    args: cf.args.try_bimap(f, g)?,
                    element: match cf.element {
                        ComputedFieldOrderByElement::Scalar { ty, redaction } => {
                            ComputedFieldOrderByElement::Scalar {
                                ty,
                                redaction: redaction.try_bimap(f, g)?,
                            }
                        }
                        ComputedFieldOrderByElement::Aggregate {
                            table,
                            filter,
                            aggregate,
                        } => ComputedFieldOrderByElement::Aggregate {
                            table,
                            filter: filter.try_bimap(f, g)?,
                            aggregate: aggregate.try_bimap(f, g)?,
                        },
                    },
                })
            }
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AnnotatedAggregateOrderBy<B, V> {
    type Output<S, W> = AnnotatedAggregateOrderBy<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            AnnotatedAggregateOrderBy::Count => AnnotatedAggregateOrderBy::Count,
            AnnotatedAggregateOrderBy::Op {
                op,
                result_type,
                column,
                redaction,
            } => AnnotatedAggregateOrderBy::Op {
                op,
                result_type,
                column,
                redaction: redaction.try_bimap(f, g)?,
            },
        })
    }
}

// Select

impl<B, Fld, R, V> Bitraverse<R, V> for AnnSelectG<B, Fld, V>
where
    B: Backend,
    Fld: Bitraverse<R, V>,
{
    type Output<S, W> = AnnSelectG<B, Fld::Output<S, W>, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(AnnSelectG {
            fields: self.fields.try_bimap(f, g)?,
            from: self.from.try_bimap(f, g)?,
            perm: self.perm.try_bimap(f, g)?,
            args: self.args.try_bimap(f, g)?,
            stringify_numbers: self.stringify_numbers,
            naming_convention: self.naming_convention,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for SelectFrom<B, V> {
    type Output<S, W> = SelectFrom<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            SelectFrom::Table(table) => SelectFrom::Table(table),
            SelectFrom::Identifier(identifier) => SelectFrom::Identifier(identifier),
            SelectFrom::Function(function) => SelectFrom::Function(SelectFromFunction {
                function: function.function,
                args: function.args.try_bimap(f, g)?,
                definition_list: function.definition_list,
            }),
            SelectFrom::NativeQuery { name, arguments } => {
                let mut res = IndexMap::with_capacity(arguments.len());
                for (key, value) in arguments {
                    res.insert(key, g(value)?);
                }
                SelectFrom::NativeQuery {
                    name,
                    arguments: res,
                }
            }
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for TablePerm<B, V> {
    type Output<S, W> = TablePerm<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(TablePerm {
            filter: self.filter.try_bimap(f, g)?,
            limit: self.limit,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for SelectArgs<B, V> {
    type Output<S, W> = SelectArgs<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(SelectArgs {
            where_: self.where_.try_bimap(f, g)?,
            order_by: self.order_by.try_bimap(f, g)?,
            limit: self.limit,
            offset: self.offset,
            distinct: self.distinct,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AnnField<B, R, V> {
    type Output<S, W> = AnnField<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            AnnField::Column(column) => AnnField::Column(column.try_bimap(f, g)?),
            AnnField::ObjectRelation(rel) => AnnField::ObjectRelation(rel.try_bimap(f, g)?),
            AnnField::ArrayRelation(array) => AnnField::ArrayRelation(array.try_bimap(f, g)?),
            AnnField::ComputedField {
                xfield,
                name,
                select,
            } => AnnField::ComputedField {
                xfield,
                name,
                select: select.try_bimap(f, g)?,
            },
            AnnField::Remote(remote) => AnnField::Remote(remote.try_bimap(f, g)?),
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
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for ComputedFieldSelect<B, R, V> {
    type Output<S, W> = ComputedFieldSelect<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            ComputedFieldSelect::Scalar(scalar) => {
                ComputedFieldSelect::Scalar(ComputedFieldScalarSelect {
                    function: scalar.function,
                    args: scalar.args.try_bimap(f, g)?,
                    ty: scalar.ty,
                    arguments: scalar.arguments,
                    redaction: scalar.redaction.try_bimap(f, g)?,
                })
            }
            ComputedFieldSelect::Table { agg, select } => ComputedFieldSelect::Table {
                agg,
                select: select.try_bimap(f, g)?,
            },
        })
    }
}

// Relationships

impl<B, A, R, V> Bitraverse<R, V> for AnnRelationSelect<B, A>
where
    B: Backend,
    A: Bitraverse<R, V>,
{
    type Output<S, W> = AnnRelationSelect<B, A::Output<S, W>>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(AnnRelationSelect {
            name: self.name,
            mapping: self.mapping,
            nullable: self.nullable,
            select: self.select.try_bimap(f, g)?,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AnnObjectSelect<B, R, V> {
    type Output<S, W> = AnnObjectSelect<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(AnnObjectSelect {
            fields: self.fields.try_bimap(f, g)?,
            target: self.target.try_bimap(f, g)?,
            filter: self.filter.try_bimap(f, g)?,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for ArraySelect<B, R, V> {
    type Output<S, W> = ArraySelect<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            ArraySelect::Simple(rel) => ArraySelect::Simple(rel.try_bimap(f, g)?),
            ArraySelect::Aggregate(rel) => ArraySelect::Aggregate(rel.try_bimap(f, g)?),
            ArraySelect::Connection(rel) => ArraySelect::Connection(rel.try_bimap(f, g)?),
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for RemoteRelationshipSelect<B, R> {
    type Output<S, W> = RemoteRelationshipSelect<B, S>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, _g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(RemoteRelationshipSelect {
            lhs_join_fields: self.lhs_join_fields,
            relationship: f(self.relationship)?,
        })
    }
}

impl<Tgt: Backend, R, V> Bitraverse<R, V> for RemoteSourceSelect<Tgt, R, V> {
    type Output<S, W> = RemoteSourceSelect<Tgt, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(RemoteSourceSelect {
            name: self.name,
            config: self.config,
            selection: self.selection.try_bimap(f, g)?,
            join_mapping: self.join_mapping,
            stringify_numbers: self.stringify_numbers,
        })
    }
}

impl<Tgt: Backend, R, V> Bitraverse<R, V> for SourceRelationshipSelection<Tgt, R, V> {
    type Output<S, W> = SourceRelationshipSelection<Tgt, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            SourceRelationshipSelection::Object(select) => {
                SourceRelationshipSelection::Object(select.try_bimap(f, g)?)
            }
            SourceRelationshipSelection::Array(select) => {
                SourceRelationshipSelection::Array(select.try_bimap(f, g)?)
            }
            SourceRelationshipSelection::ArrayAggregate(select) => {
                SourceRelationshipSelection::ArrayAggregate(select.try_bimap(f, g)?)
            }
        })
    }
}

// Aggregates

impl<B: Backend, R, V> Bitraverse<R, V> for TableAggregateField<B, R, V> {
    type Output<S, W> = TableAggregateField<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            TableAggregateField::Aggregate(fields) => {
                TableAggregateField::Aggregate(fields.try_bimap(f, g)?)
            }
            TableAggregateField::Nodes { xnodes, fields } => TableAggregateField::Nodes {
                xnodes,
                fields: fields.try_bimap(f, g)?,
            },
            TableAggregateField::Expression(text) => TableAggregateField::Expression(text),
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for AggregateField<B, V> {
    type Output<S, W> = AggregateField<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            AggregateField::Count(count) => AggregateField::Count(count.try_bimap(f, g)?),
            AggregateField::Op(op) => AggregateField::Op(AggregateOp {
                op: op.op,
                fields: op.fields.try_bimap(f, g)?,
            }),
            AggregateField::Expression(text) => AggregateField::Expression(text),
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for CountType<B, V> {
    type Output<S, W> = CountType<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            CountType::Star => CountType::Star,
            CountType::NonNull(columns) => {
                CountType::NonNull(try_bimap_redacted::<B, R, V, S, W, E, F, G>(columns, f, g)?)
            }
            CountType::Distinct(columns) => {
                CountType::Distinct(try_bimap_redacted::<B, R, V, S, W, E, F, G>(columns, f, g)?)
            }
        })
    }
}

fn try_bimap_redacted<B, R, V, S, W, E, F, G>(
    columns: Vec<(B::Column, AnnRedactionExp<B, V>)>,
    f: &mut F,
    g: &mut G,
) -> Result<Vec<(B::Column, AnnRedactionExp<B, W>)>, E>
where
    B: Backend,
    F: FnMut(R) -> Result<S, E>,
    G: FnMut(V) -> Result<W, E>,
{
    let mut res = Vec::with_capacity(columns.len());
    for (column, redaction) in columns {
        let redaction = Bitraverse::<R, V>::try_bimap(redaction, f, g)?;
        res.push((column, redaction));
    }
    Ok(res)
}

impl<B: Backend, R, V> Bitraverse<R, V> for SelectionField<B, V> {
    type Output<S, W> = SelectionField<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            SelectionField::Column { column, redaction } => SelectionField::Column {
                column,
                redaction: redaction.try_bimap(f, g)?,
            },
            SelectionField::ComputedField {
                xfield,
                name,
                function,
                args,
                ty,
                redaction,
            } => SelectionField::ComputedField {
                xfield,
                name,
                function,
                args: args.try_bimap(f, g)?,
                ty,
                redaction: redaction.try_bimap(f, g)?,
            },
            SelectionField::Expression(text) => SelectionField::Expression(text),
        })
    }
}

// Connections

impl<B: Backend, R, V> Bitraverse<R, V> for ConnectionSelect<B, R, V> {
    type Output<S, W> = ConnectionSelect<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(ConnectionSelect {
            xrelay: self.xrelay,
            primary_key_columns: self.primary_key_columns,
            split: self.split.try_bimap(f, g)?,
            slice: self.slice,
            select: self.select.try_bimap(f, g)?,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for ConnectionSplit<B, V> {
    type Output<S, W> = ConnectionSplit<B, W>;

    fn try_bimap<S, W, E, F, G>(self, _f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(ConnectionSplit {
            kind: self.kind,
            value: g(self.value)?,
            order_by: self.order_by,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for ConnectionField<B, R, V> {
    type Output<S, W> = ConnectionField<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            ConnectionField::TypeName(name) => ConnectionField::TypeName(name),
            ConnectionField::PageInfo(fields) => ConnectionField::PageInfo(fields),
            ConnectionField::Edges(edges) => ConnectionField::Edges(edges.try_bimap(f, g)?),
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for EdgeField<B, R, V> {
    type Output<S, W> = EdgeField<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(match self {
            EdgeField::TypeName(name) => EdgeField::TypeName(name),
            EdgeField::Cursor => EdgeField::Cursor,
            EdgeField::Node(fields) => EdgeField::Node(fields.try_bimap(f, g)?),
        })
    }
}

// Streaming

impl<B: Backend, R, V> Bitraverse<R, V> for AnnSelectStreamG<B, R, V> {
    type Output<S, W> = AnnSelectStreamG<B, S, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(AnnSelectStreamG {
            xstream: self.xstream,
            fields: self.fields.try_bimap(f, g)?,
            from: self.from.try_bimap(f, g)?,
            perm: self.perm.try_bimap(f, g)?,
            args: self.args.try_bimap(f, g)?,
            stringify_numbers: self.stringify_numbers,
        })
    }
}

impl<B: Backend, R, V> Bitraverse<R, V> for SelectStreamArgs<B, V> {
    type Output<S, W> = SelectStreamArgs<B, W>;

    fn try_bimap<S, W, E, F, G>(self, f: &mut F, g: &mut G) -> Result<Self::Output<S, W>, E>
    where
        F: FnMut(R) -> Result<S, E>,
        G: FnMut(V) -> Result<W, E>,
    {
        Ok(SelectStreamArgs {
            where_: self.where_.try_bimap(f, g)?,
            batch_size: self.batch_size,
            cursor: StreamCursorItem {
                ordering: self.cursor.ordering,
                column: self.cursor.column,
                initial_value: g(self.cursor.initial_value)?,
            },
        })
    }
}
