//! Order-by elements.
//!
//! Ordering through a relationship carries the permission filter of the
//! target table: rows the role cannot read must not influence the order.
use enum_as_inner::EnumAsInner;
use serde::Serialize;

use super::bool_exp::AnnBoolExp;
use super::column::{AnnRedactionExp, ColumnInfo};
use super::function::FunctionArgs;
use super::generic::OrderByItem;
use super::names::ComputedFieldName;
use super::relationship::RelInfo;
use super::value::ColumnType;
use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum AnnotatedOrderByElement<B: Backend, V> {
    Column {
        column: ColumnInfo<B>,
        redaction: AnnRedactionExp<B, V>,
    },
    ObjectRelation {
        relationship: RelInfo<B>,
        filter: AnnBoolExp<B, V>,
        element: Box<AnnotatedOrderByElement<B, V>>,
    },
    /// Ordering by an aggregate over an array relationship. Ordering by the
    /// individual rows of a one-to-many relationship is not well-defined, so
    /// only aggregates are allowed here.
    ArrayAggregation {
        relationship: RelInfo<B>,
        filter: AnnBoolExp<B, V>,
        aggregate: AnnotatedAggregateOrderBy<B, V>,
    },
    ComputedField(ComputedFieldOrderBy<B, V>),
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum AnnotatedAggregateOrderBy<B: Backend, V> {
    Count,
    Op {
        /// Backend specific aggregate function name.
        op: String,
        result_type: ColumnType<B>,
        column: ColumnInfo<B>,
        redaction: AnnRedactionExp<B, V>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedFieldOrderBy<B: Backend, V> {
    pub xfield: B::XComputedField,
    pub name: ComputedFieldName,
    pub function: B::FunctionName,
    pub args: FunctionArgs<V>,
    pub element: ComputedFieldOrderByElement<B, V>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ComputedFieldOrderByElement<B: Backend, V> {
    /// Computed field returning a scalar.
    Scalar {
        ty: B::ScalarType,
        redaction: AnnRedactionExp<B, V>,
    },
    /// Computed field returning a set of rows; ordered by an aggregate of them.
    Aggregate {
        table: B::TableName,
        filter: AnnBoolExp<B, V>,
        aggregate: AnnotatedAggregateOrderBy<B, V>,
    },
}

pub type AnnotatedOrderByItem<B, V> = OrderByItem<AnnotatedOrderByElement<B, V>>;

impl<B: Backend, V> AnnotatedOrderByElement<B, V> {
    pub fn column(column: ColumnInfo<B>) -> Self {
        AnnotatedOrderByElement::Column {
            column,
            redaction: AnnRedactionExp::NoRedaction,
        }
    }

    /// Aggregate operator names used anywhere in this element.
    pub fn aggregate_ops(&self) -> Vec<&str> {
        match self {
            AnnotatedOrderByElement::Column { .. } => Vec::new(),
            AnnotatedOrderByElement::ObjectRelation { element, .. } => element.aggregate_ops(),
            AnnotatedOrderByElement::ArrayAggregation { aggregate, .. } => {
                aggregate.op_name().into_iter().collect()
            }
            AnnotatedOrderByElement::ComputedField(cf) => match &cf.element {
                ComputedFieldOrderByElement::Scalar { .. } => Vec::new(),
                ComputedFieldOrderByElement::Aggregate { aggregate, .. } => {
                    aggregate.op_name().into_iter().collect()
                }
            },
        }
    }
}

impl<B: Backend, V> AnnotatedAggregateOrderBy<B, V> {
    pub fn op_name(&self) -> Option<&str> {
        match self {
            AnnotatedAggregateOrderBy::Count => None,
            AnnotatedAggregateOrderBy::Op { op, .. } => Some(op),
        }
    }
}
