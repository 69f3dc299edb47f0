//! A regex-based statement parser. Statements are matched against one
//! pattern per verb and lowered directly into inert [`Statement`] values;
//! there is no token stream or grammar. This keeps the surface small: the
//! supported syntax is exactly what the patterns admit.

use crate::common::{Error, Result};
use crate::errinput;
use crate::sql::statement::{Condition, Operator, OrderBy, Statement};
use crate::types::{Column, DataType, Field};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

fn pattern(raw: &str) -> Regex {
    RegexBuilder::new(raw)
        .case_insensitive(true)
        .build()
        .expect("static pattern must compile")
}

static CREATE_DATABASE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^CREATE\s+DATABASE\s+(IF\s+NOT\s+EXISTS\s+)?([\w.]+)$"));
static USE_DATABASE: Lazy<Regex> = Lazy::new(|| pattern(r"^USE\s+([\w.]+)$"));
static CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^CREATE\s+TABLE\s+(IF\s+NOT\s+EXISTS\s+)?([\w.]+)\s*\((.+)\)$"));
static DROP_TABLE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^DROP\s+TABLE\s+(IF\s+EXISTS\s+)?([\w.]+)$"));
static ALTER_ADD_COLUMN: Lazy<Regex> =
    Lazy::new(|| pattern(r"^ALTER\s+TABLE\s+([\w.]+)\s+ADD\s+(?:COLUMN\s+)?(.+)$"));
static INSERT: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^INSERT\s+INTO\s+([\w.]+)\s*(?:\(([^)]*)\)\s*)?VALUES\s*(.+)$")
});
static SELECT: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"^SELECT\s+(.+?)\s+FROM\s+([\w.]+)(?:\s+WHERE\s+(.+?))?(?:\s+ORDER\s+BY\s+(\w+)(\s+ASC|\s+DESC)?)?(?:\s+LIMIT\s+(\d+))?(?:\s+OFFSET\s+(\d+))?$",
    )
});
static UPDATE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^UPDATE\s+([\w.]+)\s+SET\s+(.+?)(?:\s+WHERE\s+(.+))?$"));
static DELETE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^DELETE\s+FROM\s+([\w.]+)(?:\s+WHERE\s+(.+))?$"));
static DESCRIBE: Lazy<Regex> = Lazy::new(|| pattern(r"^DESCRIBE\s+([\w.]+)$"));
static VACUUM: Lazy<Regex> = Lazy::new(|| pattern(r"^VACUUM(?:\s+([\w.]+))?$"));
static CONDITION: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(\w+)\s*(=|!=|<>|<=|>=|<|>)\s*(.+)$"));
static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| pattern(r"^(\w+)\s*=\s*(.+)$"));
static COLUMN_DEF: Lazy<Regex> = Lazy::new(|| pattern(r"^(\w+)\s+(\w+)(.*)$"));
static DEFAULT_CLAUSE: Lazy<Regex> = Lazy::new(|| pattern(r"DEFAULT\s+('[^']*'|\S+)"));
static REFERENCES_CLAUSE: Lazy<Regex> =
    Lazy::new(|| pattern(r"REFERENCES\s+([\w.]+)\s*\(\s*(\w+)\s*\)"));
static AND_SPLIT: Lazy<Regex> = Lazy::new(|| pattern(r"\s+AND\s+"));

pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Parser<'a> {
        Parser {
            input: input.trim().trim_end_matches(';').trim(),
        }
    }

    pub fn parse(&self) -> Result<Statement> {
        if let Some(caps) = CREATE_DATABASE.captures(self.input) {
            return Ok(Statement::CreateDatabase {
                name: caps[2].to_string(),
                if_not_exists: caps.get(1).is_some(),
            });
        }
        if let Some(caps) = USE_DATABASE.captures(self.input) {
            return Ok(Statement::UseDatabase {
                name: caps[1].to_string(),
            });
        }
        if let Some(caps) = CREATE_TABLE.captures(self.input) {
            let columns = split_outside_quotes(&caps[3], ',')
                .iter()
                .map(|definition| parse_column(definition))
                .collect::<Result<Vec<Column>>>()?;
            return Ok(Statement::CreateTable {
                name: caps[2].to_string(),
                columns,
                if_not_exists: caps.get(1).is_some(),
            });
        }
        if let Some(caps) = DROP_TABLE.captures(self.input) {
            return Ok(Statement::DropTable {
                name: caps[2].to_string(),
                if_exists: caps.get(1).is_some(),
            });
        }
        if let Some(caps) = ALTER_ADD_COLUMN.captures(self.input) {
            return Ok(Statement::AlterTableAddColumn {
                table: caps[1].to_string(),
                column: parse_column(&caps[2])?,
            });
        }
        if let Some(caps) = INSERT.captures(self.input) {
            let columns = caps.get(2).map(|list| {
                split_outside_quotes(list.as_str(), ',')
                    .iter()
                    .map(|c| c.trim().to_string())
                    .collect()
            });
            return Ok(Statement::Insert {
                table: caps[1].to_string(),
                columns,
                values: parse_values_lists(&caps[3])?,
            });
        }
        if let Some(caps) = SELECT.captures(self.input) {
            let projection = caps[1].trim();
            let columns = match projection {
                "*" => None,
                list => Some(
                    split_outside_quotes(list, ',')
                        .iter()
                        .map(|c| c.trim().to_string())
                        .collect(),
                ),
            };
            let order_by = caps.get(4).map(|column| OrderBy {
                column: column.as_str().to_string(),
                descending: caps
                    .get(5)
                    .map(|direction| direction.as_str().trim().eq_ignore_ascii_case("DESC"))
                    .unwrap_or(false),
            });
            return Ok(Statement::Select {
                table: caps[2].to_string(),
                columns,
                conditions: parse_conditions(caps.get(3).map(|m| m.as_str()))?,
                order_by,
                limit: caps.get(6).and_then(|m| m.as_str().parse().ok()),
                offset: caps.get(7).and_then(|m| m.as_str().parse().ok()),
            });
        }
        if let Some(caps) = UPDATE.captures(self.input) {
            let updates = split_outside_quotes(&caps[2], ',')
                .iter()
                .map(|assignment| parse_assignment(assignment))
                .collect::<Result<Vec<(String, Field)>>>()?;
            return Ok(Statement::Update {
                table: caps[1].to_string(),
                updates,
                conditions: parse_conditions(caps.get(3).map(|m| m.as_str()))?,
            });
        }
        if let Some(caps) = DELETE.captures(self.input) {
            return Ok(Statement::Delete {
                table: caps[1].to_string(),
                conditions: parse_conditions(caps.get(2).map(|m| m.as_str()))?,
            });
        }
        if let Some(caps) = DESCRIBE.captures(self.input) {
            return Ok(Statement::Describe {
                table: caps[1].to_string(),
            });
        }
        if let Some(caps) = VACUUM.captures(self.input) {
            return Ok(Statement::Vacuum {
                table: caps.get(1).map(|m| m.as_str().to_string()),
            });
        }
        errinput!("Unrecognized statement: {}", self.input)
    }
}

/// Parses a literal: NULL, TRUE/FALSE, integer, float, or a single-quoted
/// string with `''` as the quote escape.
pub fn parse_literal(raw: &str) -> Result<Field> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("NULL") {
        return Ok(Field::Null);
    }
    if raw.eq_ignore_ascii_case("TRUE") {
        return Ok(Field::Boolean(true));
    }
    if raw.eq_ignore_ascii_case("FALSE") {
        return Ok(Field::Boolean(false));
    }
    if raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2 {
        let inner = &raw[1..raw.len() - 1];
        return Ok(Field::String(inner.replace("''", "'")));
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Ok(Field::Integer(integer));
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Ok(Field::Float(float));
    }
    errinput!("Unparseable literal: {raw}")
}

fn parse_column(definition: &str) -> Result<Column> {
    let definition = definition.trim();
    let caps = COLUMN_DEF
        .captures(definition)
        .ok_or_else(|| Error::InvalidInput(format!("Bad column definition: {definition}")))?;
    let name = caps[1].to_string();
    let data_type = DataType::from_keyword(&caps[2])
        .ok_or_else(|| Error::InvalidInput(format!("Unknown data type: {}", &caps[2])))?;
    let tail = caps[3].to_string();
    let tail_upper = tail.to_ascii_uppercase();

    let mut builder = Column::builder().name(name).data_type(data_type);
    if tail_upper.contains("PRIMARY KEY") {
        builder = builder.primary_key();
    }
    if tail_upper.contains("NOT NULL") {
        builder = builder.not_null();
    }
    if tail_upper.contains("UNIQUE") {
        builder = builder.unique();
    }
    if let Some(default_caps) = DEFAULT_CLAUSE.captures(&tail) {
        builder = builder.default(parse_literal(&default_caps[1])?);
    }
    if let Some(fk_caps) = REFERENCES_CLAUSE.captures(&tail) {
        builder = builder.references(&fk_caps[1], &fk_caps[2]);
    }
    Ok(builder.build())
}

fn parse_assignment(assignment: &str) -> Result<(String, Field)> {
    let caps = ASSIGNMENT
        .captures(assignment.trim())
        .ok_or_else(|| Error::InvalidInput(format!("Bad assignment: {assignment}")))?;
    Ok((caps[1].to_string(), parse_literal(&caps[2])?))
}

fn parse_conditions(clause: Option<&str>) -> Result<Vec<Condition>> {
    let Some(clause) = clause else {
        return Ok(Vec::new());
    };
    AND_SPLIT
        .split(clause)
        .map(|conjunct| {
            let conjunct = conjunct.trim();
            let caps = CONDITION
                .captures(conjunct)
                .ok_or_else(|| Error::InvalidInput(format!("Bad condition: {conjunct}")))?;
            let op = Operator::from_symbol(&caps[2])
                .ok_or_else(|| Error::Planner(format!("Unsupported operator: {}", &caps[2])))?;
            Ok(Condition::new(&caps[1], op, parse_literal(&caps[3])?))
        })
        .collect()
}

/// Parses `(a, b), (c, d), ...` into rows of literals.
fn parse_values_lists(raw: &str) -> Result<Vec<Vec<Field>>> {
    let mut rows = Vec::new();
    for group in split_value_groups(raw)? {
        let values = split_outside_quotes(&group, ',')
            .iter()
            .map(|literal| parse_literal(literal))
            .collect::<Result<Vec<Field>>>()?;
        rows.push(values);
    }
    if rows.is_empty() {
        return errinput!("INSERT requires at least one VALUES list");
    }
    Ok(rows)
}

/// Extracts the parenthesized groups of a VALUES clause, quote-aware.
fn split_value_groups(raw: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;

    for c in raw.chars() {
        match c {
            '\'' => {
                in_quote = !in_quote;
                if depth > 0 {
                    current.push(c);
                }
            }
            '(' if !in_quote => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            ')' if !in_quote => {
                if depth == 0 {
                    return errinput!("Unbalanced parentheses in VALUES");
                }
                depth -= 1;
                if depth == 0 {
                    groups.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
            _ => {
                if depth > 0 {
                    current.push(c);
                }
            }
        }
    }
    if depth != 0 || in_quote {
        return errinput!("Unbalanced parentheses or quotes in VALUES");
    }
    Ok(groups)
}

/// Splits on `separator` outside single-quoted strings.
fn split_outside_quotes(raw: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for c in raw.chars() {
        if c == '\'' {
            in_quote = !in_quote;
            current.push(c);
        } else if c == separator && !in_quote {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current);
    }
    parts.into_iter().map(|p| p.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_database() {
        let statement = Parser::new("CREATE DATABASE app").parse().unwrap();
        assert_eq!(
            statement,
            Statement::CreateDatabase {
                name: "app".to_string(),
                if_not_exists: false,
            }
        );

        let statement = Parser::new("create database if not exists app;").parse().unwrap();
        assert_eq!(
            statement,
            Statement::CreateDatabase {
                name: "app".to_string(),
                if_not_exists: true,
            }
        );
    }

    #[test]
    fn test_create_table_with_constraints() {
        let statement = Parser::new(
            "CREATE TABLE users (id INT PRIMARY KEY, email VARCHAR UNIQUE NOT NULL, \
             active BOOL DEFAULT TRUE, org INT REFERENCES orgs(id))",
        )
        .parse()
        .unwrap();

        let Statement::CreateTable { name, columns, if_not_exists } = statement else {
            panic!("expected CreateTable");
        };
        assert_eq!(name, "users");
        assert!(!if_not_exists);
        assert_eq!(columns.len(), 4);
        assert!(columns[0].is_primary_key());
        assert!(columns[1].is_unique());
        assert!(columns[1].is_not_null());
        assert_eq!(columns[2].default(), Some(&Field::Boolean(true)));
        let fk = columns[3].foreign_key().unwrap();
        assert_eq!((fk.table.as_str(), fk.column.as_str()), ("orgs", "id"));
    }

    #[test]
    fn test_insert_multi_row() {
        let statement =
            Parser::new("INSERT INTO users VALUES (1, 'Alice'), (2, 'Bo''b')").parse().unwrap();

        let Statement::Insert { table, columns, values } = statement else {
            panic!("expected Insert");
        };
        assert_eq!(table, "users");
        assert!(columns.is_none());
        assert_eq!(
            values,
            vec![
                vec![Field::from(1), Field::from("Alice")],
                vec![Field::from(2), Field::from("Bo'b")],
            ]
        );
    }

    #[test]
    fn test_insert_with_column_list() {
        let statement = Parser::new("INSERT INTO users (id, name) VALUES (1, 'a, b')")
            .parse()
            .unwrap();

        let Statement::Insert { columns, values, .. } = statement else {
            panic!("expected Insert");
        };
        assert_eq!(columns, Some(vec!["id".to_string(), "name".to_string()]));
        // The comma inside the quoted string must not split the value.
        assert_eq!(values[0][1], Field::from("a, b"));
    }

    #[test]
    fn test_select_with_conditions() {
        let statement = Parser::new(
            "SELECT id, name FROM users WHERE id > 1 AND name != 'Bob' ORDER BY id DESC LIMIT 5 OFFSET 2",
        )
        .parse()
        .unwrap();

        let Statement::Select { table, columns, conditions, order_by, limit, offset } = statement
        else {
            panic!("expected Select");
        };
        assert_eq!(table, "users");
        assert_eq!(columns, Some(vec!["id".to_string(), "name".to_string()]));
        assert_eq!(
            conditions,
            vec![
                Condition::new("id", Operator::Gt, Field::from(1)),
                Condition::new("name", Operator::NotEq, Field::from("Bob")),
            ]
        );
        assert_eq!(
            order_by,
            Some(OrderBy {
                column: "id".to_string(),
                descending: true,
            })
        );
        assert_eq!(limit, Some(5));
        assert_eq!(offset, Some(2));
    }

    #[test]
    fn test_select_star() {
        let statement = Parser::new("SELECT * FROM users").parse().unwrap();
        let Statement::Select { columns, conditions, .. } = statement else {
            panic!("expected Select");
        };
        assert!(columns.is_none());
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let statement = Parser::new("UPDATE users SET name = 'Eve', age = 30 WHERE id = 1")
            .parse()
            .unwrap();
        let Statement::Update { updates, conditions, .. } = statement else {
            panic!("expected Update");
        };
        assert_eq!(updates[0], ("name".to_string(), Field::from("Eve")));
        assert_eq!(updates[1], ("age".to_string(), Field::from(30)));
        assert_eq!(conditions.len(), 1);

        let statement = Parser::new("DELETE FROM users").parse().unwrap();
        assert_eq!(
            statement,
            Statement::Delete {
                table: "users".to_string(),
                conditions: Vec::new(),
            }
        );
    }

    #[test]
    fn test_alter_and_vacuum() {
        let statement = Parser::new("ALTER TABLE users ADD COLUMN age INT DEFAULT 0")
            .parse()
            .unwrap();
        let Statement::AlterTableAddColumn { table, column } = statement else {
            panic!("expected AlterTableAddColumn");
        };
        assert_eq!(table, "users");
        assert_eq!(column.get_name(), "age");
        assert_eq!(column.default(), Some(&Field::from(0)));

        assert_eq!(
            Parser::new("VACUUM").parse().unwrap(),
            Statement::Vacuum { table: None }
        );
        assert_eq!(
            Parser::new("VACUUM users").parse().unwrap(),
            Statement::Vacuum {
                table: Some("users".to_string())
            }
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_literal("NULL").unwrap(), Field::Null);
        assert_eq!(parse_literal("-42").unwrap(), Field::from(-42));
        assert_eq!(parse_literal("3.25").unwrap(), Field::from(3.25));
        assert_eq!(parse_literal("'hi'").unwrap(), Field::from("hi"));
        assert!(parse_literal("unquoted").is_err());
    }

    #[test]
    fn test_unrecognized_statement() {
        assert!(Parser::new("GRANT ALL TO alice").parse().is_err());
        assert!(Parser::new("").parse().is_err());
    }
}
