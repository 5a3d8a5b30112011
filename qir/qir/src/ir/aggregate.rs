//! Aggregate selections (`<table>_aggregate` fields).
//!
//! Aggregate operator names are plain strings. Backends differ in which
//! aggregate functions they offer; the planner checks names against
//! [crate::backend::Backend::supports_aggregate_op].
use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use serde::Serialize;

use super::column::{AnnRedactionExp, ColumnInfo};
use super::function::FunctionArgs;
use super::names::{ComputedFieldName, FieldName};
use super::select::AnnField;
use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum TableAggregateField<B: Backend, R, V> {
    Aggregate(IndexMap<FieldName, AggregateField<B, V>>),
    /// The matched rows themselves. Not every dialect can mix aggregates and
    /// plain rows in one query, hence the capability marker.
    Nodes {
        xnodes: B::XNodesAgg,
        fields: IndexMap<FieldName, AnnField<B, R, V>>,
    },
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum AggregateField<B: Backend, V> {
    Count(CountType<B, V>),
    Op(AggregateOp<B, V>),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateOp<B: Backend, V> {
    pub op: String,
    pub fields: IndexMap<FieldName, SelectionField<B, V>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CountType<B: Backend, V> {
    Star,
    NonNull(Vec<(B::Column, AnnRedactionExp<B, V>)>),
    Distinct(Vec<(B::Column, AnnRedactionExp<B, V>)>),
}

/// What an aggregate operator is applied to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SelectionField<B: Backend, V> {
    Column {
        column: ColumnInfo<B>,
        redaction: AnnRedactionExp<B, V>,
    },
    ComputedField {
        xfield: B::XComputedField,
        name: ComputedFieldName,
        function: B::FunctionName,
        args: FunctionArgs<V>,
        ty: B::ScalarType,
        redaction: AnnRedactionExp<B, V>,
    },
    Expression(String),
}

impl<B: Backend, R, V> TableAggregateField<B, R, V> {
    /// Aggregate operator names used directly in this field.
    pub fn aggregate_ops(&self) -> Vec<&str> {
        match self {
            TableAggregateField::Aggregate(fields) => fields
                .values()
                .filter_map(|f| match f {
                    AggregateField::Op(op) => Some(op.op.as_str()),
                    AggregateField::Count(_) | AggregateField::Expression(_) => None,
                })
                .collect(),
            TableAggregateField::Nodes { .. } | TableAggregateField::Expression(_) => Vec::new(),
        }
    }
}
