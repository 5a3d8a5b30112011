//! Relay connections.
//!
//! A connection wraps a select and changes its output to the Relay shape
//! (`pageInfo`, `edges { cursor node }`). Pagination is keyset based: a
//! cursor decodes into one split condition per ordering column.
use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use serde::Serialize;

use super::column::ColumnInfo;
use super::generic::{NonEmpty, OrderByItem};
use super::names::FieldName;
use super::order_by::AnnotatedOrderByElement;
use super::select::{AnnField, AnnSelectG};
use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionSelect<B: Backend, R, V> {
    pub xrelay: B::XRelay,
    /// Appended to the ordering so that cursors identify rows uniquely.
    pub primary_key_columns: NonEmpty<ColumnInfo<B>>,
    pub split: Option<NonEmpty<ConnectionSplit<B, V>>>,
    pub slice: Option<ConnectionSlice>,
    pub select: AnnSelectG<B, ConnectionField<B, R, V>, V>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionSplitKind {
    Before,
    After,
}

/// One keyset bound: rows strictly before or after `value` in the ordering
/// given by `order_by`.
///
/// The order-by element holds no values of its own; permission filters of
/// relationships it goes through are applied by the select it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionSplit<B: Backend, V> {
    pub kind: ConnectionSplitKind,
    pub value: V,
    pub order_by: OrderByItem<AnnotatedOrderByElement<B, ()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionSlice {
    First(u64),
    Last(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum ConnectionField<B: Backend, R, V> {
    TypeName(String),
    PageInfo(IndexMap<FieldName, PageInfoField>),
    Edges(IndexMap<FieldName, EdgeField<B, R, V>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PageInfoField {
    TypeName(String),
    HasNextPage,
    HasPreviousPage,
    StartCursor,
    EndCursor,
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum EdgeField<B: Backend, R, V> {
    TypeName(String),
    Cursor,
    Node(IndexMap<FieldName, AnnField<B, R, V>>),
}

impl<B: Backend, R, V> ConnectionSelect<B, R, V> {
    pub fn new(
        xrelay: B::XRelay,
        primary_key_columns: NonEmpty<ColumnInfo<B>>,
        select: AnnSelectG<B, ConnectionField<B, R, V>, V>,
    ) -> Self {
        ConnectionSelect {
            xrelay,
            primary_key_columns,
            split: None,
            slice: None,
            select,
        }
    }

    pub fn with_split(self, split: NonEmpty<ConnectionSplit<B, V>>) -> Self {
        ConnectionSelect {
            split: Some(split),
            ..self
        }
    }

    pub fn with_slice(self, slice: ConnectionSlice) -> Self {
        ConnectionSelect {
            slice: Some(slice),
            ..self
        }
    }

    /// Whether the page is read backwards from the end of the ordering.
    pub fn is_backwards(&self) -> bool {
        matches!(self.slice, Some(ConnectionSlice::Last(_)))
            || self
                .split
                .as_ref()
                .is_some_and(|s| s.head.kind == ConnectionSplitKind::Before)
    }
}
