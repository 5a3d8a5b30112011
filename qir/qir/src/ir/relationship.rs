//! Local relationships: object (many-to-one) and array (one-to-many) joins
//! within a single source.
use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use serde::Serialize;

use super::bool_exp::AnnBoolExp;
use super::connection::ConnectionSelect;
use super::names::{FieldName, RelName};
use super::select::{AnnAggregateSelect, AnnField, AnnSimpleSelect, SelectFrom};
use crate::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelType {
    Object,
    Array,
}

/// A relationship as the schema cache describes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelInfo<B: Backend> {
    pub name: RelName,
    pub rel_type: RelType,
    /// Left (owning table) column to right (target table) column. Keys are
    /// unique by construction.
    pub mapping: IndexMap<B::Column, B::Column>,
    pub target: B::TableName,
}

/// The part every relationship selection shares: which relationship, which
/// columns it joins on, and the selection on the far side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnRelationSelect<B: Backend, A> {
    pub name: RelName,
    pub mapping: IndexMap<B::Column, B::Column>,
    pub nullable: bool,
    pub select: A,
}

impl<B: Backend, A> AnnRelationSelect<B, A> {
    pub fn new(name: RelName, mapping: IndexMap<B::Column, B::Column>, select: A) -> Self {
        AnnRelationSelect {
            name,
            mapping,
            nullable: true,
            select,
        }
    }
}

/// Single row selection on the far side of an object relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnObjectSelect<B: Backend, R, V> {
    pub fields: IndexMap<FieldName, AnnField<B, R, V>>,
    pub target: SelectFrom<B, V>,
    pub filter: AnnBoolExp<B, V>,
}

pub type ObjectRelationSelect<B, R, V> = AnnRelationSelect<B, AnnObjectSelect<B, R, V>>;
pub type ArrayRelationSelect<B, R, V> = AnnRelationSelect<B, AnnSimpleSelect<B, R, V>>;
pub type ArrayAggregateSelect<B, R, V> = AnnRelationSelect<B, AnnAggregateSelect<B, R, V>>;
pub type ArrayConnectionSelect<B, R, V> = AnnRelationSelect<B, ConnectionSelect<B, R, V>>;

/// The three shapes of an array relationship.
#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum ArraySelect<B: Backend, R, V> {
    Simple(ArrayRelationSelect<B, R, V>),
    Aggregate(ArrayAggregateSelect<B, R, V>),
    Connection(ArrayConnectionSelect<B, R, V>),
}

impl<B: Backend, R, V> ArraySelect<B, R, V> {
    pub fn name(&self) -> &RelName {
        match self {
            ArraySelect::Simple(s) => &s.name,
            ArraySelect::Aggregate(s) => &s.name,
            ArraySelect::Connection(s) => &s.name,
        }
    }

    pub fn mapping(&self) -> &IndexMap<B::Column, B::Column> {
        match self {
            ArraySelect::Simple(s) => &s.mapping,
            ArraySelect::Aggregate(s) => &s.mapping,
            ArraySelect::Connection(s) => &s.mapping,
        }
    }
}
