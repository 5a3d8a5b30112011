//! Boolean expressions: `where` arguments, permission filters, redaction
//! predicates.
use enum_as_inner::EnumAsInner;
use serde::Serialize;

use super::column::ColumnInfo;
use super::relationship::RelInfo;
use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Serialize, EnumAsInner)]
pub enum AnnBoolExp<B: Backend, V> {
    /// `And(vec![])` is the always-true filter.
    And(Vec<AnnBoolExp<B, V>>),
    Or(Vec<AnnBoolExp<B, V>>),
    Not(Box<AnnBoolExp<B, V>>),
    /// Correlated lookup into an unrelated table.
    Exists {
        table: B::TableName,
        filter: Box<AnnBoolExp<B, V>>,
    },
    Column {
        column: ColumnInfo<B>,
        ops: Vec<OpExp<B, V>>,
    },
    /// Filter through a relationship. `target_filter` is the permission
    /// filter of the target table and always applies.
    Relationship {
        relationship: RelInfo<B>,
        target_filter: Box<AnnBoolExp<B, V>>,
        filter: Box<AnnBoolExp<B, V>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OpExp<B: Backend, V> {
    Compare { op: ComparisonOp, value: V },
    In(V),
    Nin(V),
    Like(V),
    IsNull(bool),
    /// Comparison against another column of the same row.
    CompareColumn { op: ComparisonOp, column: B::Column },
    /// A backend specific operator, validated by the schema layer.
    Custom { name: String, argument: V },
}

impl<B: Backend, V> AnnBoolExp<B, V> {
    pub fn true_exp() -> Self {
        AnnBoolExp::And(Vec::new())
    }

    pub fn is_true(&self) -> bool {
        matches!(self, AnnBoolExp::And(items) if items.is_empty())
    }

    /// Conjunction that keeps trivially true operands out of the tree.
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if b.is_true() => a,
            (a, b) if a.is_true() => b,
            (AnnBoolExp::And(mut a), AnnBoolExp::And(b)) => {
                a.extend(b);
                AnnBoolExp::And(a)
            }
            (AnnBoolExp::And(mut a), b) => {
                a.push(b);
                AnnBoolExp::And(a)
            }
            (a, b) => AnnBoolExp::And(vec![a, b]),
        }
    }

    pub fn column(column: ColumnInfo<B>, op: OpExp<B, V>) -> Self {
        AnnBoolExp::Column {
            column,
            ops: vec![op],
        }
    }
}

impl<B: Backend, V> OpExp<B, V> {
    pub fn eq(value: V) -> Self {
        OpExp::Compare {
            op: ComparisonOp::Eq,
            value,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::{ColumnName, PgScalarType, Postgres, Vanilla};
    use crate::ir::value::ColumnType;

    type Pg = Postgres<Vanilla>;

    fn id_eq(v: i64) -> AnnBoolExp<Pg, i64> {
        AnnBoolExp::column(
            ColumnInfo::new(
                ColumnName::new("id"),
                ColumnType::Scalar(PgScalarType::Integer),
            ),
            OpExp::eq(v),
        )
    }

    #[test]
    fn test_and_drops_true() {
        let t = AnnBoolExp::<Pg, i64>::true_exp();
        assert!(t.is_true());
        assert_eq!(t.clone().and(id_eq(1)), id_eq(1));
        assert_eq!(id_eq(1).and(t), id_eq(1));
        assert_eq!(
            id_eq(1).and(id_eq(2)).and(id_eq(3)),
            AnnBoolExp::And(vec![id_eq(1), id_eq(2), id_eq(3)])
        );
    }
}
