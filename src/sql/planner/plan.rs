use crate::sql::statement::{Condition, Operator};
use crate::storage::tuple::Row;
use crate::types::Field;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Cost factor for an index range scan relative to the table's row count.
const RANGE_SCAN_COST_FACTOR: f64 = 0.3;

/// A scan strategy for one table, chosen from the statement's conditions
/// and the table's available indexes. Execution yields candidate tuple ids;
/// every condition is then re-applied as a residual filter on the
/// deserialized rows, so strict bounds and extra conjuncts need no special
/// handling here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Plan {
    /// Walk every live tuple id in scan order.
    FullScan { cost: f64 },
    /// Probe one indexed column for exact key matches.
    IndexSeek {
        column: String,
        values: Vec<Field>,
        cost: f64,
    },
    /// Walk one index over an inclusive key range; `None` is unbounded.
    IndexRangeScan {
        column: String,
        low: Option<Field>,
        high: Option<Field>,
        cost: f64,
    },
}

impl Plan {
    /// Chooses the scan strategy. First match wins:
    ///
    /// 1. an equality condition on an indexed column → `IndexSeek`;
    /// 2. a range condition on an indexed column → `IndexRangeScan`;
    /// 3. otherwise → `FullScan`.
    ///
    /// Ties between equally applicable indexes break toward the first
    /// condition in statement order.
    pub fn choose(
        conditions: &[Condition],
        is_indexed: impl Fn(&str) -> bool,
        row_count: usize,
    ) -> Plan {
        if let Some(eq) = conditions
            .iter()
            .find(|c| c.op == Operator::Eq && is_indexed(&c.column))
        {
            return Plan::IndexSeek {
                column: eq.column.clone(),
                values: vec![eq.value.clone()],
                cost: 1.0,
            };
        }

        if let Some(range) = conditions
            .iter()
            .find(|c| c.op.is_range() && is_indexed(&c.column))
        {
            let (low, high) = range_bounds(conditions, &range.column);
            return Plan::IndexRangeScan {
                column: range.column.clone(),
                low,
                high,
                cost: RANGE_SCAN_COST_FACTOR * row_count as f64,
            };
        }

        Plan::FullScan {
            cost: row_count as f64,
        }
    }

    pub fn cost(&self) -> f64 {
        match self {
            Plan::FullScan { cost } => *cost,
            Plan::IndexSeek { cost, .. } => *cost,
            Plan::IndexRangeScan { cost, .. } => *cost,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::FullScan { cost } => write!(f, "FullScan (cost={cost})"),
            Plan::IndexSeek { column, values, cost } => {
                let keys: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "IndexSeek on {column} [{}] (cost={cost})", keys.join(", "))
            }
            Plan::IndexRangeScan {
                column,
                low,
                high,
                cost,
            } => {
                let low = low.as_ref().map_or("-inf".to_string(), |v| v.to_string());
                let high = high.as_ref().map_or("+inf".to_string(), |v| v.to_string());
                write!(f, "IndexRangeScan on {column} [{low}..{high}] (cost={cost})")
            }
        }
    }
}

/// Folds every range condition on `column` into the tightest inclusive
/// bounds. Strictness (`<` vs `<=`) is left to the residual filter.
fn range_bounds(conditions: &[Condition], column: &str) -> (Option<Field>, Option<Field>) {
    let mut low: Option<Field> = None;
    let mut high: Option<Field> = None;
    for condition in conditions.iter().filter(|c| c.column == column) {
        match condition.op {
            Operator::Gt | Operator::GtEq => {
                let tighter = match &low {
                    Some(existing) => condition.value.compare(existing) == Ordering::Greater,
                    None => true,
                };
                if tighter {
                    low = Some(condition.value.clone());
                }
            }
            Operator::Lt | Operator::LtEq => {
                let tighter = match &high {
                    Some(existing) => condition.value.compare(existing) == Ordering::Less,
                    None => true,
                };
                if tighter {
                    high = Some(condition.value.clone());
                }
            }
            _ => {}
        }
    }
    (low, high)
}

/// The residual filter: true iff the row satisfies every condition. Missing
/// columns are read as NULL, which matches the stored-row semantics of
/// omission.
pub fn filter_row(row: &Row, conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .all(|condition| condition.matches(&row.get_or_null(&condition.column)))
}
