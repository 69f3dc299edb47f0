use crate::types::{Column, Field};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A comparison operator in a WHERE condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        match symbol {
            "=" => Some(Operator::Eq),
            "!=" | "<>" => Some(Operator::NotEq),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::LtEq),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::GtEq),
            _ => None,
        }
    }

    /// Whether the operator can drive an index range scan.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::LtEq | Operator::Gt | Operator::GtEq
        )
    }

    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::NotEq => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::LtEq => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::GtEq => ordering != Ordering::Less,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
        };
        f.write_str(symbol)
    }
}

/// One conjunct of a WHERE clause: `column op value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: Operator,
    pub value: Field,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: Operator, value: Field) -> Condition {
        Condition {
            column: column.into(),
            op,
            value,
        }
    }

    /// Evaluates the condition against a stored value using the engine-wide
    /// total order.
    pub fn matches(&self, stored: &Field) -> bool {
        self.op.matches(stored.compare(&self.value))
    }
}

/// An ORDER BY key applied by the caller on materialized rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// An inert statement value, as produced by the parser and consumed by the
/// session. The core engine itself only sees tables, columns, rows, and
/// condition lists.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    CreateDatabase {
        name: String,
        if_not_exists: bool,
    },
    UseDatabase {
        name: String,
    },
    CreateTable {
        name: String,
        columns: Vec<Column>,
        if_not_exists: bool,
    },
    DropTable {
        name: String,
        if_exists: bool,
    },
    AlterTableAddColumn {
        table: String,
        column: Column,
    },
    Insert {
        table: String,
        columns: Option<Vec<String>>,
        values: Vec<Vec<Field>>,
    },
    Select {
        table: String,
        columns: Option<Vec<String>>,
        conditions: Vec<Condition>,
        order_by: Option<OrderBy>,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Update {
        table: String,
        updates: Vec<(String, Field)>,
        conditions: Vec<Condition>,
    },
    Delete {
        table: String,
        conditions: Vec<Condition>,
    },
    Describe {
        table: String,
    },
    Vacuum {
        table: Option<String>,
    },
}
