use serde::Serialize;

use super::bool_exp::AnnBoolExp;
use super::value::ColumnType;
use crate::backend::Backend;

/// A column as the schema cache describes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo<B: Backend> {
    pub column: B::Column,
    pub ty: ColumnType<B>,
    pub nullable: bool,
}

impl<B: Backend> ColumnInfo<B> {
    pub fn new(column: B::Column, ty: ColumnType<B>) -> Self {
        ColumnInfo {
            column,
            ty,
            nullable: true,
        }
    }

    pub fn not_null(self) -> Self {
        ColumnInfo {
            nullable: false,
            ..self
        }
    }
}

/// Per-call arguments to a scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScalarSelectionArguments {
    /// `path` argument on JSON columns, e.g. `$.a.b[0]`.
    JsonPath(Vec<JsonPathElement>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JsonPathElement {
    Key(String),
    Index(i64),
}

/// Redaction of a value the role may only see on some rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnnRedactionExp<B: Backend, V> {
    NoRedaction,
    /// The value is replaced by `NULL` on rows where the predicate is false.
    RedactIfFalse(AnnBoolExp<B, V>),
}

impl<B: Backend, V> AnnRedactionExp<B, V> {
    pub fn is_redacted(&self) -> bool {
        matches!(self, AnnRedactionExp::RedactIfFalse(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnColumnField<B: Backend, V> {
    pub column: B::Column,
    pub ty: ColumnType<B>,
    /// Whether the value is rendered as text in the response. Some backends
    /// cannot return some types (e.g. arrays) in their native form.
    pub as_text: bool,
    pub arguments: Option<ScalarSelectionArguments>,
    pub redaction: AnnRedactionExp<B, V>,
}

impl<B: Backend, V> AnnColumnField<B, V> {
    pub fn new(column: B::Column, ty: ColumnType<B>) -> Self {
        AnnColumnField {
            column,
            ty,
            as_text: false,
            arguments: None,
            redaction: AnnRedactionExp::NoRedaction,
        }
    }

    pub fn with_as_text(self, as_text: bool) -> Self {
        AnnColumnField { as_text, ..self }
    }

    pub fn with_arguments(self, arguments: ScalarSelectionArguments) -> Self {
        AnnColumnField {
            arguments: Some(arguments),
            ..self
        }
    }

    pub fn with_redaction(self, redaction: AnnRedactionExp<B, V>) -> Self {
        AnnColumnField { redaction, ..self }
    }

    /// A plain reference to the column: no arguments, no text rendering, no
    /// redaction. Such a field can stand in for the column in joins.
    pub fn is_plain(&self) -> bool {
        !self.as_text && self.arguments.is_none() && !self.redaction.is_redacted()
    }
}
