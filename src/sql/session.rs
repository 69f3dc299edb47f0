use crate::common::{Error, Result};
use crate::sql::parser::Parser;
use crate::sql::statement::{OrderBy, Statement};
use crate::storage::engine::PagedEngine;
use crate::storage::page::TupleId;
use crate::storage::tuple::Row;
use crate::storage::vacuum::VacuumStats;
use crate::types::{Field, TableSchema};

/// A SQL session: parses raw statements and executes them against the
/// paged engine. Projection, ORDER BY, LIMIT, and OFFSET are applied here,
/// on the engine's materialized rows.
pub struct Session<'a> {
    engine: &'a PagedEngine,
}

impl<'a> Session<'a> {
    pub fn new(engine: &'a PagedEngine) -> Session<'a> {
        Session { engine }
    }

    /// Parses and executes one raw statement.
    pub fn execute(&self, input: &str) -> Result<StatementResult> {
        self.execute_statement(Parser::new(input).parse()?)
    }

    pub fn execute_statement(&self, statement: Statement) -> Result<StatementResult> {
        Ok(match statement {
            Statement::CreateDatabase {
                name,
                if_not_exists,
            } => {
                let created = self.engine.create_database(&name, if_not_exists)?;
                StatementResult::CreateDatabase { name, created }
            }
            Statement::UseDatabase { name } => {
                self.engine.use_database(&name)?;
                StatementResult::UseDatabase { name }
            }
            Statement::CreateTable {
                name,
                columns,
                if_not_exists,
            } => {
                let created = self.engine.create_table(&name, columns, if_not_exists)?;
                StatementResult::CreateTable { name, created }
            }
            Statement::DropTable { name, if_exists } => {
                let existed = self.engine.drop_table(&name, if_exists)?;
                StatementResult::DropTable { name, existed }
            }
            Statement::AlterTableAddColumn { table, column } => {
                self.engine.alter_table_add_column(&table, column)?;
                StatementResult::AlterTable { table }
            }
            Statement::Insert {
                table,
                columns,
                values,
            } => {
                let schema = self.engine.describe(&table)?;
                let mut tuple_ids = Vec::with_capacity(values.len());
                for row_values in values {
                    let row = build_row(&schema, columns.as_deref(), row_values)?;
                    tuple_ids.push(self.engine.insert_row(&table, row)?);
                }
                StatementResult::Insert {
                    count: tuple_ids.len() as u64,
                    tuple_ids,
                }
            }
            Statement::Select {
                table,
                columns,
                conditions,
                order_by,
                limit,
                offset,
            } => {
                let schema = self.engine.describe(&table)?;
                let mut rows = self.engine.select_rows(&table, &conditions)?;
                if let Some(order) = &order_by {
                    sort_rows(&mut rows, order);
                }
                let output_columns = projection_columns(&schema, columns.as_deref())?;

                let skip = offset.unwrap_or(0);
                let take = limit.unwrap_or(usize::MAX);
                let rows: Vec<Vec<Field>> = rows
                    .into_iter()
                    .skip(skip)
                    .take(take)
                    .map(|row| project(&row, &output_columns))
                    .collect();
                StatementResult::Select {
                    columns: output_columns,
                    rows,
                }
            }
            Statement::Update {
                table,
                updates,
                conditions,
            } => StatementResult::Update {
                count: self.engine.update_rows(&table, &updates, &conditions)? as u64,
            },
            Statement::Delete { table, conditions } => StatementResult::Delete {
                count: self.engine.delete_rows(&table, &conditions)? as u64,
            },
            Statement::Describe { table } => StatementResult::Describe {
                schema: self.engine.describe(&table)?,
            },
            Statement::Vacuum { table } => {
                let stats = match table {
                    Some(table) => self.engine.vacuum_table(&table)?,
                    None => self.engine.vacuum_all()?,
                };
                StatementResult::Vacuum { stats }
            }
        })
    }
}

/// Zips an INSERT values list against the explicit column list or, absent
/// one, the schema's column order.
fn build_row(
    schema: &TableSchema,
    columns: Option<&[String]>,
    values: Vec<Field>,
) -> Result<Row> {
    let names: Vec<&str> = match columns {
        Some(columns) => {
            for column in columns {
                if schema.column_by_name(column).is_none() {
                    return Err(Error::NotFound(format!(
                        "Column {column} does not exist in table {}",
                        schema.name()
                    )));
                }
            }
            columns.iter().map(|c| c.as_str()).collect()
        }
        None => schema.columns().iter().map(|c| c.get_name()).collect(),
    };

    if names.len() != values.len() {
        return Err(Error::InvalidInput(format!(
            "INSERT into {} supplies {} values for {} columns",
            schema.name(),
            values.len(),
            names.len()
        )));
    }

    let mut row = Row::new();
    for (name, value) in names.into_iter().zip(values) {
        row.set(name, value);
    }
    Ok(row)
}

fn projection_columns(schema: &TableSchema, columns: Option<&[String]>) -> Result<Vec<String>> {
    match columns {
        Some(columns) => {
            for column in columns {
                if schema.column_by_name(column).is_none() {
                    return Err(Error::NotFound(format!(
                        "Column {column} does not exist in table {}",
                        schema.name()
                    )));
                }
            }
            Ok(columns.to_vec())
        }
        None => Ok(schema.columns().iter().map(|c| c.get_name().to_string()).collect()),
    }
}

fn project(row: &Row, columns: &[String]) -> Vec<Field> {
    columns.iter().map(|column| row.get_or_null(column)).collect()
}

/// Stable sort by the ORDER BY column under the engine-wide value order,
/// so equal keys keep their scan order.
fn sort_rows(rows: &mut [Row], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = a
            .get_or_null(&order.column)
            .compare(&b.get_or_null(&order.column));
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// A session statement result, consumed by the CLI.
#[derive(Clone, Debug, PartialEq)]
pub enum StatementResult {
    CreateDatabase {
        name: String,
        created: bool,
    },
    UseDatabase {
        name: String,
    },
    CreateTable {
        name: String,
        created: bool,
    },
    DropTable {
        name: String,
        existed: bool,
    },
    AlterTable {
        table: String,
    },
    Insert {
        count: u64,
        tuple_ids: Vec<TupleId>,
    },
    Select {
        columns: Vec<String>,
        rows: Vec<Vec<Field>>,
    },
    Update {
        count: u64,
    },
    Delete {
        count: u64,
    },
    Describe {
        schema: TableSchema,
    },
    Vacuum {
        stats: VacuumStats,
    },
}
