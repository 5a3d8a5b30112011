//! The select root and the field vocabulary.
//!
//! A select is always total: construct it whole with [AnnSelectG::new] and
//! derive modified copies with the `with_*` methods.
use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use serde::Serialize;

use super::aggregate::TableAggregateField;
use super::bool_exp::AnnBoolExp;
use super::column::{AnnColumnField, AnnRedactionExp, ColumnInfo, ScalarSelectionArguments};
use super::function::FunctionArgs;
use super::generic::NonEmpty;
use super::names::{ComputedFieldName, FieldName, NativeQueryName};
use super::order_by::AnnotatedOrderByItem;
use super::relationship::{ArraySelect, ObjectRelationSelect};
use super::remote::RemoteRelationshipSelect;
use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnSelectG<B: Backend, F, V> {
    /// Keys are unique. Iteration order is the emission order.
    pub fields: IndexMap<FieldName, F>,
    pub from: SelectFrom<B, V>,
    pub perm: TablePerm<B, V>,
    pub args: SelectArgs<B, V>,
    pub stringify_numbers: StringifyNumbers,
    /// `None` means the naming convention of the source applies.
    pub naming_convention: Option<NamingCase>,
}

pub type AnnSimpleSelect<B, R, V> = AnnSelectG<B, AnnField<B, R, V>, V>;
pub type AnnAggregateSelect<B, R, V> = AnnSelectG<B, TableAggregateField<B, R, V>, V>;

impl<B: Backend, F, V> AnnSelectG<B, F, V> {
    pub fn new(
        fields: IndexMap<FieldName, F>,
        from: SelectFrom<B, V>,
        perm: TablePerm<B, V>,
    ) -> Self {
        AnnSelectG {
            fields,
            from,
            perm,
            args: SelectArgs::default(),
            stringify_numbers: StringifyNumbers::default(),
            naming_convention: None,
        }
    }

    /// Replaces the field selection, possibly changing its type.
    pub fn with_fields<G>(self, fields: IndexMap<FieldName, G>) -> AnnSelectG<B, G, V> {
        AnnSelectG {
            fields,
            from: self.from,
            perm: self.perm,
            args: self.args,
            stringify_numbers: self.stringify_numbers,
            naming_convention: self.naming_convention,
        }
    }

    pub fn with_field(mut self, name: FieldName, field: F) -> Self {
        self.fields.insert(name, field);
        self
    }

    pub fn with_from(self, from: SelectFrom<B, V>) -> Self {
        AnnSelectG { from, ..self }
    }

    pub fn with_perm(self, perm: TablePerm<B, V>) -> Self {
        AnnSelectG { perm, ..self }
    }

    pub fn with_args(self, args: SelectArgs<B, V>) -> Self {
        AnnSelectG { args, ..self }
    }

    pub fn with_stringify_numbers(self, stringify_numbers: StringifyNumbers) -> Self {
        AnnSelectG {
            stringify_numbers,
            ..self
        }
    }

    pub fn with_naming_convention(self, naming_convention: Option<NamingCase>) -> Self {
        AnnSelectG {
            naming_convention,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum SelectFrom<B: Backend, V> {
    Table(B::TableName),
    /// A name bound earlier in the generated query, such as a CTE.
    Identifier(FieldName),
    Function(SelectFromFunction<B, V>),
    NativeQuery {
        name: NativeQueryName,
        arguments: IndexMap<String, V>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectFromFunction<B: Backend, V> {
    pub function: B::FunctionName,
    pub args: FunctionArgs<V>,
    /// Column definitions for functions returning `SETOF record`.
    pub definition_list: Option<Vec<(B::Column, B::ScalarType)>>,
}

/// Row-level permission of the role on the selected table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePerm<B: Backend, V> {
    pub filter: AnnBoolExp<B, V>,
    pub limit: Option<u64>,
}

impl<B: Backend, V> TablePerm<B, V> {
    /// Everything is visible. Used for admin and introspection queries.
    pub fn no_permission() -> Self {
        TablePerm {
            filter: AnnBoolExp::true_exp(),
            limit: None,
        }
    }

    pub fn new(filter: AnnBoolExp<B, V>, limit: Option<u64>) -> Self {
        TablePerm { filter, limit }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectArgs<B: Backend, V> {
    #[serde(rename = "where")]
    pub where_: Option<AnnBoolExp<B, V>>,
    pub order_by: Option<NonEmpty<AnnotatedOrderByItem<B, V>>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// `DISTINCT ON` columns.
    pub distinct: Option<NonEmpty<B::Column>>,
}

impl<B: Backend, V> Default for SelectArgs<B, V> {
    fn default() -> Self {
        SelectArgs {
            where_: None,
            order_by: None,
            limit: None,
            offset: None,
            distinct: None,
        }
    }
}

impl<B: Backend, V> SelectArgs<B, V> {
    pub fn with_where(self, where_: AnnBoolExp<B, V>) -> Self {
        SelectArgs {
            where_: Some(where_),
            ..self
        }
    }

    pub fn with_order_by(self, order_by: NonEmpty<AnnotatedOrderByItem<B, V>>) -> Self {
        SelectArgs {
            order_by: Some(order_by),
            ..self
        }
    }

    pub fn with_limit(self, limit: u64) -> Self {
        SelectArgs {
            limit: Some(limit),
            ..self
        }
    }

    pub fn with_offset(self, offset: u64) -> Self {
        SelectArgs {
            offset: Some(offset),
            ..self
        }
    }

    pub fn with_distinct(self, distinct: NonEmpty<B::Column>) -> Self {
        SelectArgs {
            distinct: Some(distinct),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum StringifyNumbers {
    /// Render numeric types that do not fit in a JSON number as strings.
    Stringify,
    #[default]
    LeaveAlone,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
pub enum NamingCase {
    /// Field names as they are in the database.
    #[default]
    #[strum(serialize = "hasura-default")]
    HasuraCase,
    /// camelCase fields, PascalCase types.
    #[strum(serialize = "graphql-default")]
    GraphqlCase,
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum AnnField<B: Backend, R, V> {
    Column(AnnColumnField<B, V>),
    ObjectRelation(ObjectRelationSelect<B, R, V>),
    ArrayRelation(ArraySelect<B, R, V>),
    ComputedField {
        xfield: B::XComputedField,
        name: ComputedFieldName,
        select: ComputedFieldSelect<B, R, V>,
    },
    Remote(RemoteRelationshipSelect<B, R>),
    /// Relay global id of the row.
    NodeId {
        xrelay: B::XRelay,
        table: B::TableName,
        primary_key: NonEmpty<ColumnInfo<B>>,
    },
    /// A constant, such as `__typename`.
    Expression(String),
}

impl<B: Backend, R, V> AnnField<B, R, V> {
    pub fn column(column: AnnColumnField<B, V>) -> Self {
        AnnField::Column(column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum ComputedFieldSelect<B: Backend, R, V> {
    Scalar(ComputedFieldScalarSelect<B, V>),
    /// A computed field returning rows of a table.
    Table {
        agg: JsonAggSelect,
        select: AnnSimpleSelect<B, R, V>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedFieldScalarSelect<B: Backend, V> {
    pub function: B::FunctionName,
    pub args: FunctionArgs<V>,
    pub ty: B::ScalarType,
    pub arguments: Option<ScalarSelectionArguments>,
    pub redaction: AnnRedactionExp<B, V>,
}

/// How rows of a set returning computed field are aggregated into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JsonAggSelect {
    Object,
    Array,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use insta::assert_debug_snapshot;

    use super::*;
    use crate::backend::{MsSql, QualifiedName};

    #[test]
    fn test_naming_case_from_str() {
        assert_eq!(
            NamingCase::from_str("graphql-default"),
            Ok(NamingCase::GraphqlCase)
        );
        assert_eq!(NamingCase::HasuraCase.to_string(), "hasura-default");
        assert_debug_snapshot!(NamingCase::from_str("snake"), @r"
        Err(
            VariantNotFound,
        )
        ");
    }

    #[test]
    fn test_with_copies() {
        let select: AnnSimpleSelect<MsSql, (), i64> = AnnSelectG::new(
            IndexMap::new(),
            SelectFrom::Table(QualifiedName::new("dbo", "t")),
            TablePerm::no_permission(),
        );
        assert!(select.perm.filter.is_true());
        assert_eq!(select.args, SelectArgs::default());

        let limited = select
            .clone()
            .with_args(SelectArgs::default().with_limit(10))
            .with_stringify_numbers(StringifyNumbers::Stringify);
        assert_eq!(limited.args.limit, Some(10));
        assert_eq!(limited.from, select.from);
        assert_ne!(limited, select);
    }
}
