//! Streaming subscriptions: a select that resumes from a cursor.
use indexmap::IndexMap;
use serde::Serialize;

use super::bool_exp::AnnBoolExp;
use super::column::ColumnInfo;
use super::generic::OrderDirection;
use super::names::FieldName;
use super::select::{AnnField, SelectFrom, StringifyNumbers, TablePerm};
use crate::backend::Backend;

/// Only constructible on backends whose `XStreamingSubscription` is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnSelectStreamG<B: Backend, R, V> {
    pub xstream: B::XStreamingSubscription,
    pub fields: IndexMap<FieldName, AnnField<B, R, V>>,
    pub from: SelectFrom<B, V>,
    pub perm: TablePerm<B, V>,
    pub args: SelectStreamArgs<B, V>,
    pub stringify_numbers: StringifyNumbers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectStreamArgs<B: Backend, V> {
    #[serde(rename = "where")]
    pub where_: Option<AnnBoolExp<B, V>>,
    /// Rows per batch pushed to the client.
    pub batch_size: u64,
    pub cursor: StreamCursorItem<B, V>,
}

/// Where the stream resumes. The position advances outside the IR; this is
/// only the starting point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamCursorItem<B: Backend, V> {
    pub ordering: OrderDirection,
    pub column: ColumnInfo<B>,
    pub initial_value: V,
}

impl<B: Backend, R, V> AnnSelectStreamG<B, R, V> {
    pub fn new(
        xstream: B::XStreamingSubscription,
        fields: IndexMap<FieldName, AnnField<B, R, V>>,
        from: SelectFrom<B, V>,
        perm: TablePerm<B, V>,
        args: SelectStreamArgs<B, V>,
    ) -> Self {
        AnnSelectStreamG {
            xstream,
            fields,
            from,
            perm,
            args,
            stringify_numbers: StringifyNumbers::default(),
        }
    }

    pub fn with_args(self, args: SelectStreamArgs<B, V>) -> Self {
        AnnSelectStreamG { args, ..self }
    }

    pub fn with_stringify_numbers(self, stringify_numbers: StringifyNumbers) -> Self {
        AnnSelectStreamG {
            stringify_numbers,
            ..self
        }
    }
}
