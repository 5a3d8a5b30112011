//! Backends the IR can be specialised to.
//!
//! Every IR node is generic over a [Backend]. A backend binds the handful of
//! types that differ between storage engines (how a column or a table is
//! named, which scalar types exist, how a source is configured) and a set of
//! capability markers.
//!
//! A capability marker is either [XEnable] or [XDisable]. Nodes that need a
//! capability carry a value of the marker type, so on backends where the
//! marker is [XDisable] (which is uninhabited) those nodes cannot be built at
//! all. There is no runtime flag to check.
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Bounds shared by everything that is stored in the IR.
pub trait Representable: Debug + Clone + PartialEq + Serialize + Send + Sync + 'static {}

impl<T> Representable for T where
    T: Debug + Clone + PartialEq + Serialize + Send + Sync + 'static
{
}

/// The uninhabited type. Used as `r` once a tree no longer contains remote
/// relationships, and as the disabled capability marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Void {}

impl Void {
    pub fn absurd<T>(self) -> T {
        match self {}
    }
}

/// Capability is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct XEnable;

/// Capability is absent.
pub type XDisable = Void;

pub trait Capability: Representable + Copy + Eq + Hash {
    const ENABLED: bool;
}

impl Capability for XEnable {
    const ENABLED: bool = true;
}

impl Capability for Void {
    const ENABLED: bool = false;
}

pub trait Backend: Representable + Copy + Eq + Hash {
    type SourceConfig: Representable;
    type TableName: Representable + Eq + Hash + Display;
    type FunctionName: Representable + Eq + Hash + Display;
    type Column: Representable + Eq + Hash + Display;
    type ScalarType: Representable + Eq + Hash;

    type XStreamingSubscription: Capability;
    type XRelay: Capability;
    type XNodesAgg: Capability;
    type XComputedField: Capability;

    fn backend_type() -> BackendType;

    /// Aggregate operator names are open strings in the IR; this is where a
    /// backend says which ones it can compile.
    fn supports_aggregate_op(op: &str) -> bool;
}

/// Closed enumeration of backend identifiers.
// Make sure to add a variant to `AnyRemoteSourceSelect` when extending this.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum BackendType {
    Postgres,
    Citus,
    Cockroach,
    MsSql,
    BigQuery,
    MySql,
    DataConnector,
}

/// Runtime view of the capability markers, for logging and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub streaming_subscriptions: bool,
    pub relay: bool,
    pub nodes_aggregate: bool,
    pub computed_fields: bool,
}

impl Capabilities {
    pub fn of<B: Backend>() -> Self {
        Capabilities {
            streaming_subscriptions: B::XStreamingSubscription::ENABLED,
            relay: B::XRelay::ENABLED,
            nodes_aggregate: B::XNodesAgg::ENABLED,
            computed_fields: B::XComputedField::ENABLED,
        }
    }
}

impl BackendType {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            BackendType::Postgres => Capabilities::of::<Postgres<Vanilla>>(),
            BackendType::Citus => Capabilities::of::<Postgres<Citus>>(),
            BackendType::Cockroach => Capabilities::of::<Postgres<Cockroach>>(),
            BackendType::MsSql => Capabilities::of::<MsSql>(),
            BackendType::BigQuery => Capabilities::of::<BigQuery>(),
            BackendType::MySql => Capabilities::of::<MySql>(),
            BackendType::DataConnector => Capabilities::of::<DataConnector>(),
        }
    }

    pub fn is_postgres_family(&self) -> bool {
        matches!(
            self,
            BackendType::Postgres | BackendType::Citus | BackendType::Cockroach
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnName(pub String);

impl ColumnName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        ColumnName(name.into())
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnName {
    fn from(name: &str) -> Self {
        ColumnName::new(name)
    }
}

/// `schema.name`, or `dataset.name` on BigQuery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new<S: Into<String>, N: Into<String>>(schema: S, name: N) -> Self {
        QualifiedName {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

const STANDARD_AGGREGATES: &[&str] = &["avg", "count", "max", "min", "sum"];

// Postgres family

pub trait PostgresKind: Representable + Copy + Eq + Hash + Default {
    const BACKEND_TYPE: BackendType;

    type XStreamingSubscription: Capability;
    type XRelay: Capability;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Vanilla;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Citus;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Cockroach;

impl PostgresKind for Vanilla {
    const BACKEND_TYPE: BackendType = BackendType::Postgres;
    type XStreamingSubscription = XEnable;
    type XRelay = XEnable;
}

impl PostgresKind for Citus {
    const BACKEND_TYPE: BackendType = BackendType::Citus;
    type XStreamingSubscription = XEnable;
    type XRelay = XDisable;
}

impl PostgresKind for Cockroach {
    const BACKEND_TYPE: BackendType = BackendType::Cockroach;
    type XStreamingSubscription = XEnable;
    type XRelay = XDisable;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Postgres<K: PostgresKind>(PhantomData<K>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PgScalarType {
    Smallint,
    Integer,
    Bigint,
    Numeric,
    Float,
    Double,
    Text,
    Varchar,
    Boolean,
    Date,
    Timestamp,
    Timestamptz,
    Json,
    Jsonb,
    Uuid,
    Array(Box<PgScalarType>),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostgresSourceConfig {
    pub connection_url: String,
    pub read_replicas: Vec<String>,
    pub extensions_schema: Option<String>,
}

impl<K: PostgresKind> Backend for Postgres<K> {
    type SourceConfig = PostgresSourceConfig;
    type TableName = QualifiedName;
    type FunctionName = QualifiedName;
    type Column = ColumnName;
    type ScalarType = PgScalarType;

    type XStreamingSubscription = K::XStreamingSubscription;
    type XRelay = K::XRelay;
    type XNodesAgg = XEnable;
    type XComputedField = XEnable;

    fn backend_type() -> BackendType {
        K::BACKEND_TYPE
    }

    fn supports_aggregate_op(op: &str) -> bool {
        STANDARD_AGGREGATES.contains(&op)
            || matches!(
                op,
                "stddev"
                    | "stddev_pop"
                    | "stddev_samp"
                    | "var_pop"
                    | "var_samp"
                    | "variance"
                    | "bool_and"
                    | "bool_or"
            )
    }
}

// MS SQL Server

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MsSql;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MsSqlScalarType {
    Int,
    BigInt,
    Decimal,
    Float,
    NVarChar,
    VarChar,
    Bit,
    Date,
    DateTime2,
    UniqueIdentifier,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsSqlSourceConfig {
    pub connection_string: String,
    pub pool_size: u32,
}

impl Backend for MsSql {
    type SourceConfig = MsSqlSourceConfig;
    type TableName = QualifiedName;
    type FunctionName = QualifiedName;
    type Column = ColumnName;
    type ScalarType = MsSqlScalarType;

    type XStreamingSubscription = XDisable;
    type XRelay = XDisable;
    type XNodesAgg = XEnable;
    type XComputedField = XDisable;

    fn backend_type() -> BackendType {
        BackendType::MsSql
    }

    fn supports_aggregate_op(op: &str) -> bool {
        STANDARD_AGGREGATES.contains(&op) || matches!(op, "stdev" | "stdevp" | "var" | "varp")
    }
}

// BigQuery

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct BigQuery;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum BigQueryScalarType {
    Int64,
    Numeric,
    BigNumeric,
    Float64,
    String,
    Bool,
    Date,
    Timestamp,
    Json,
    Bytes,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BigQuerySourceConfig {
    pub project_id: String,
    pub datasets: Vec<String>,
    pub global_select_limit: u64,
}

impl Backend for BigQuery {
    type SourceConfig = BigQuerySourceConfig;
    type TableName = QualifiedName;
    type FunctionName = QualifiedName;
    type Column = ColumnName;
    type ScalarType = BigQueryScalarType;

    type XStreamingSubscription = XDisable;
    type XRelay = XDisable;
    type XNodesAgg = XEnable;
    type XComputedField = XEnable;

    fn backend_type() -> BackendType {
        BackendType::BigQuery
    }

    fn supports_aggregate_op(op: &str) -> bool {
        STANDARD_AGGREGATES.contains(&op)
            || matches!(
                op,
                "stddev" | "stddev_pop" | "stddev_samp" | "var_pop" | "var_samp" | "variance"
            )
    }
}

// MySQL

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MySql;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MySqlScalarType {
    TinyInt,
    Int,
    BigInt,
    Decimal,
    Double,
    VarChar,
    Text,
    Date,
    DateTime,
    Json,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MySqlSourceConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl Backend for MySql {
    type SourceConfig = MySqlSourceConfig;
    type TableName = QualifiedName;
    type FunctionName = QualifiedName;
    type Column = ColumnName;
    type ScalarType = MySqlScalarType;

    type XStreamingSubscription = XDisable;
    type XRelay = XDisable;
    type XNodesAgg = XEnable;
    type XComputedField = XDisable;

    fn backend_type() -> BackendType {
        BackendType::MySql
    }

    fn supports_aggregate_op(op: &str) -> bool {
        STANDARD_AGGREGATES.contains(&op)
            || matches!(
                op,
                "std"
                    | "stddev"
                    | "stddev_pop"
                    | "stddev_samp"
                    | "var_pop"
                    | "var_samp"
                    | "variance"
            )
    }
}

// Data connectors

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct DataConnector;

/// Data connector agents declare their own scalar types by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScalarTypeName(pub String);

/// Data connector tables are addressed by a path of arbitrary depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableTarget(pub Vec<String>);

impl Display for TableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataConnectorSourceConfig {
    pub agent: String,
    pub url: String,
    pub config: serde_json::Value,
}

impl Backend for DataConnector {
    type SourceConfig = DataConnectorSourceConfig;
    type TableName = TableTarget;
    type FunctionName = TableTarget;
    type Column = ColumnName;
    type ScalarType = ScalarTypeName;

    type XStreamingSubscription = XDisable;
    type XRelay = XDisable;
    type XNodesAgg = XEnable;
    type XComputedField = XDisable;

    fn backend_type() -> BackendType {
        BackendType::DataConnector
    }

    // Agents advertise their aggregate functions in their capabilities, which
    // the metadata layer has already checked.
    fn supports_aggregate_op(_op: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use insta::assert_debug_snapshot;
    use strum::{IntoEnumIterator, VariantNames};

    use super::*;

    #[test]
    fn test_backend_type_from_str() {
        assert_debug_snapshot!(BackendType::from_str("bigquery"), @r"
        Ok(
            BigQuery,
        )
        ");

        assert_debug_snapshot!(BackendType::from_str("oracle"), @r"
        Err(
            VariantNotFound,
        )
        ");
    }

    #[test]
    fn test_backend_type_names() {
        assert_eq!(
            BackendType::VARIANTS,
            &[
                "postgres",
                "citus",
                "cockroach",
                "mssql",
                "bigquery",
                "mysql",
                "dataconnector"
            ]
        );
    }

    fn assert_backend_type<B: Backend>(expected: BackendType) {
        assert_eq!(B::backend_type(), expected);
        assert_eq!(Capabilities::of::<B>(), expected.capabilities());
    }

    #[test]
    fn test_backend_types_match() {
        assert_backend_type::<Postgres<Vanilla>>(BackendType::Postgres);
        assert_backend_type::<Postgres<Citus>>(BackendType::Citus);
        assert_backend_type::<Postgres<Cockroach>>(BackendType::Cockroach);
        assert_backend_type::<MsSql>(BackendType::MsSql);
        assert_backend_type::<BigQuery>(BackendType::BigQuery);
        assert_backend_type::<MySql>(BackendType::MySql);
        assert_backend_type::<DataConnector>(BackendType::DataConnector);

        assert_eq!(BackendType::iter().count(), BackendType::VARIANTS.len());
    }

    #[test]
    fn test_capabilities() {
        let relay: Vec<_> = BackendType::iter()
            .filter(|b| b.capabilities().relay)
            .collect();
        assert_eq!(relay, vec![BackendType::Postgres]);

        let streaming: Vec<_> = BackendType::iter()
            .filter(|b| b.capabilities().streaming_subscriptions)
            .collect();
        assert!(streaming.iter().all(|b| b.is_postgres_family()));
        assert_eq!(streaming.len(), 3);
    }

    #[test]
    fn test_aggregate_ops() {
        assert!(Postgres::<Vanilla>::supports_aggregate_op("bool_and"));
        assert!(!MsSql::supports_aggregate_op("bool_and"));
        assert!(MsSql::supports_aggregate_op("stdevp"));
        assert!(DataConnector::supports_aggregate_op("anything_goes"));
    }
}
