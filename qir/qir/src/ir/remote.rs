//! Relationships that leave the current source.
//!
//! There are two kinds and they are kept apart on purpose:
//!
//! - a *remote schema* relationship calls a foreign GraphQL service. Its
//!   schema is opaque, so all we carry is the call to make.
//! - a *remote source* relationship joins into another source of the same
//!   metadata, possibly on another backend. Its schema is known, and the far
//!   side needs the join columns with their types to build its own filter.
//!
//! In the IR both hang off [RemoteRelationshipSelect] as the payload `R`.
//! [RemoteRelationshipField] is the payload type the engine uses.
use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use serde::Serialize;

use super::names::{ComputedFieldName, FieldName, SourceName};
use super::relationship::AnnObjectSelect;
use super::select::{AnnAggregateSelect, AnnSimpleSelect, StringifyNumbers};
use super::value::{ColumnType, ValueFamily};
use crate::backend::{
    Backend, BackendType, BigQuery, Citus, Cockroach, DataConnector, MsSql, MySql, Postgres,
    Vanilla,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteRelationshipSelect<B: Backend, R> {
    /// Columns of this row the remote side is joined on, by the name they
    /// are given in the response.
    pub lhs_join_fields: IndexMap<FieldName, JoinField<B>>,
    pub relationship: R,
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum JoinField<B: Backend> {
    Column {
        column: B::Column,
        ty: ColumnType<B>,
    },
    /// A scalar computed field without arguments.
    ComputedField {
        xfield: B::XComputedField,
        name: ComputedFieldName,
        function: B::FunctionName,
        ty: B::ScalarType,
    },
}

/// A call into a remote GraphQL schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteSchemaSelect {
    pub remote_schema: SourceName,
    /// Path of fields from the remote query root to the joined field.
    pub field_path: Vec<String>,
    /// Static arguments. Join values are added per row at execution time.
    pub arguments: IndexMap<String, serde_json::Value>,
    pub selection_set: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteSourceSelect<Tgt: Backend, R, V> {
    pub name: SourceName,
    pub config: Tgt::SourceConfig,
    pub selection: SourceRelationshipSelection<Tgt, R, V>,
    /// How each join field is read on the target side.
    pub join_mapping: IndexMap<FieldName, (Tgt::Column, Tgt::ScalarType)>,
    pub stringify_numbers: StringifyNumbers,
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum SourceRelationshipSelection<Tgt: Backend, R, V> {
    Object(AnnObjectSelect<Tgt, R, V>),
    Array(AnnSimpleSelect<Tgt, R, V>),
    ArrayAggregate(AnnAggregateSelect<Tgt, R, V>),
}

/// The remote payload of the engine, for leaves of phase `VF`.
#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum RemoteRelationshipField<VF: ValueFamily> {
    RemoteSchema(RemoteSchemaSelect),
    RemoteSource(Box<AnyRemoteSourceSelect<VF>>),
}

/// A remote source select on `Tgt` whose own remote relationships nest.
pub type RemoteSourceSelectOf<VF, Tgt> =
    RemoteSourceSelect<Tgt, RemoteRelationshipField<VF>, <VF as ValueFamily>::Value<Tgt>>;

/// A [RemoteSourceSelect] on any backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnyRemoteSourceSelect<VF: ValueFamily> {
    Postgres(RemoteSourceSelectOf<VF, Postgres<Vanilla>>),
    Citus(RemoteSourceSelectOf<VF, Postgres<Citus>>),
    Cockroach(RemoteSourceSelectOf<VF, Postgres<Cockroach>>),
    MsSql(RemoteSourceSelectOf<VF, MsSql>),
    BigQuery(RemoteSourceSelectOf<VF, BigQuery>),
    MySql(RemoteSourceSelectOf<VF, MySql>),
    DataConnector(RemoteSourceSelectOf<VF, DataConnector>),
}

/// Runs `$body` with `$s` bound to the inner select, whatever its backend.
macro_rules! dispatch_remote_source {
    ($any:expr, $s:ident => $body:expr) => {
        match $any {
            AnyRemoteSourceSelect::Postgres($s) => $body,
            AnyRemoteSourceSelect::Citus($s) => $body,
            AnyRemoteSourceSelect::Cockroach($s) => $body,
            AnyRemoteSourceSelect::MsSql($s) => $body,
            AnyRemoteSourceSelect::BigQuery($s) => $body,
            AnyRemoteSourceSelect::MySql($s) => $body,
            AnyRemoteSourceSelect::DataConnector($s) => $body,
        }
    };
}

impl<VF: ValueFamily> AnyRemoteSourceSelect<VF> {
    pub fn backend_type(&self) -> BackendType {
        match self {
            AnyRemoteSourceSelect::Postgres(_) => BackendType::Postgres,
            AnyRemoteSourceSelect::Citus(_) => BackendType::Citus,
            AnyRemoteSourceSelect::Cockroach(_) => BackendType::Cockroach,
            AnyRemoteSourceSelect::MsSql(_) => BackendType::MsSql,
            AnyRemoteSourceSelect::BigQuery(_) => BackendType::BigQuery,
            AnyRemoteSourceSelect::MySql(_) => BackendType::MySql,
            AnyRemoteSourceSelect::DataConnector(_) => BackendType::DataConnector,
        }
    }

    pub fn source_name(&self) -> &SourceName {
        dispatch_remote_source!(self, s => &s.name)
    }

    /// Response names of the join fields the target side expects.
    pub fn join_field_names(&self) -> Vec<&FieldName> {
        dispatch_remote_source!(self, s => s.join_mapping.keys().collect())
    }
}

impl<VF: ValueFamily> RemoteRelationshipField<VF> {
    /// Name of the remote schema or source the relationship points at.
    pub fn target_name(&self) -> &SourceName {
        match self {
            RemoteRelationshipField::RemoteSchema(s) => &s.remote_schema,
            RemoteRelationshipField::RemoteSource(s) => s.source_name(),
        }
    }
}

impl<B: Backend, R> RemoteRelationshipSelect<B, R> {
    pub fn new(lhs_join_fields: IndexMap<FieldName, JoinField<B>>, relationship: R) -> Self {
        RemoteRelationshipSelect {
            lhs_join_fields,
            relationship,
        }
    }
}
