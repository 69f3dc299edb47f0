use crate::types::field::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
    List,
    Map,
    Invalid,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "bool"),
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Text => write!(f, "varchar"),
            DataType::List => write!(f, "list"),
            DataType::Map => write!(f, "map"),
            DataType::Invalid => write!(f, "invalid"),
        }
    }
}

impl DataType {
    pub fn from_keyword(keyword: &str) -> Option<DataType> {
        match keyword.to_ascii_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => Some(DataType::Bool),
            "INT" | "INTEGER" | "BIGINT" => Some(DataType::Int),
            "FLOAT" | "DOUBLE" | "REAL" => Some(DataType::Float),
            "TEXT" | "STRING" | "VARCHAR" | "CHAR" => Some(DataType::Text),
            "LIST" => Some(DataType::List),
            "MAP" => Some(DataType::Map),
            _ => None,
        }
    }
}

/// A foreign-key reference to a column of another table.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    /// Column name. Can't be empty; unique within a table.
    name: String,
    /// Column datatype.
    data_type: DataType,
    /// Whether the column is the table's primary key. At most one per table.
    primary_key: bool,
    /// Whether the column rejects null values. Implied by primary_key.
    not_null: bool,
    /// Whether the column's live values must be unique. Implied by
    /// primary_key.
    unique: bool,
    /// The value materialized when an insert omits the column, and when
    /// tuples written before an ALTER TABLE ADD COLUMN are read back.
    default: Option<Field>,
    /// Reference to another table's column whose live values constrain this
    /// column's non-null values.
    foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn builder() -> ColumnBuilder {
        ColumnBuilder::new()
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null || self.primary_key
    }

    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    pub fn default(&self) -> Option<&Field> {
        self.default.as_ref()
    }

    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        self.foreign_key.as_ref()
    }

    pub fn to_string(&self) -> String {
        let mut rendered = format!("{}:{}", self.name, self.data_type);
        if self.primary_key {
            rendered.push_str(" primary key");
        } else {
            if self.not_null {
                rendered.push_str(" not null");
            }
            if self.unique {
                rendered.push_str(" unique");
            }
        }
        if let Some(default) = &self.default {
            rendered.push_str(&format!(" default {default}"));
        }
        if let Some(fk) = &self.foreign_key {
            rendered.push_str(&format!(" references {}({})", fk.table, fk.column));
        }
        rendered
    }
}

pub struct ColumnBuilder {
    name: Option<String>,
    data_type: Option<DataType>,
    primary_key: bool,
    not_null: bool,
    unique: bool,
    default: Option<Field>,
    foreign_key: Option<ForeignKey>,
}

impl ColumnBuilder {
    fn new() -> Self {
        Self {
            name: None,
            data_type: None,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
            foreign_key: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, default: Field) -> Self {
        self.default = Some(default);
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    pub fn build(self) -> Column {
        Column {
            name: self.name.expect("name must be specified before building."),
            data_type: self
                .data_type
                .expect("data_type must be specified before building."),
            primary_key: self.primary_key,
            not_null: self.not_null,
            unique: self.unique,
            default: self.default,
            foreign_key: self.foreign_key,
        }
    }
}

/// A table schema: the ordered column definitions the validator, codec, and
/// planner all consult.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(table_name: &str) -> TableSchema {
        TableSchema {
            name: table_name.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn builder() -> TableSchemaBuilder {
        TableSchemaBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn get_column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn column_by_name(&self, column_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.get_name() == column_name)
    }

    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.get_name() == column_name)
    }

    /// The primary-key column, if the table declares one.
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key())
    }

    /// Columns that back an index: the primary key plus UNIQUE columns.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_unique())
    }

    pub fn to_string(&self) -> String {
        let rendered: Vec<String> = self.columns.iter().map(|c| c.to_string()).collect();
        format!("{}({})", self.name, rendered.join(", "))
    }
}

#[derive(Default)]
pub struct TableSchemaBuilder {
    name: Option<String>,
    columns: Vec<Column>,
}

impl TableSchemaBuilder {
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn column(&mut self, column: Column) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn columns(&mut self, columns: Vec<Column>) -> &mut Self {
        self.columns.extend(columns);
        self
    }

    pub fn build(&mut self) -> TableSchema {
        let name = self
            .name
            .clone()
            .expect("Cannot build a TableSchema without a `name`.");
        let mut schema = TableSchema::new(&name);
        for column in self.columns.drain(..) {
            schema.add_column(column);
        }
        schema
    }
}

/// Splits a possibly schema-qualified table name into (schema, table).
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_declaration() {
        let id = Column::builder()
            .name("id")
            .data_type(DataType::Int)
            .primary_key()
            .build();
        let email = Column::builder()
            .name("email")
            .data_type(DataType::Text)
            .unique()
            .not_null()
            .build();

        assert_eq!(id.to_string(), "id:int primary key");
        assert_eq!(email.to_string(), "email:varchar not null unique");
        assert!(id.is_unique());
        assert!(id.is_not_null());
        assert!(!email.is_primary_key());
    }

    #[test]
    fn test_schema_accessors() {
        let schema = TableSchema::builder()
            .name("users")
            .column(
                Column::builder()
                    .name("id")
                    .data_type(DataType::Int)
                    .primary_key()
                    .build(),
            )
            .column(Column::builder().name("name").data_type(DataType::Text).build())
            .build();

        assert_eq!(schema.col_count(), 2);
        assert_eq!(schema.column_index("name"), Some(1));
        assert_eq!(schema.column_index("missing"), None);
        assert_eq!(schema.primary_key().unwrap().get_name(), "id");
        assert_eq!(schema.indexed_columns().count(), 1);
        assert_eq!(
            schema.to_string(),
            "users(id:int primary key, name:varchar)"
        );
    }

    #[test]
    fn test_default_survives_round_trip() {
        let column = Column::builder()
            .name("active")
            .data_type(DataType::Bool)
            .default(Field::from(true))
            .build();
        let encoded = serde_json::to_string(&column).unwrap();
        let decoded: Column = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.default(), Some(&Field::from(true)));
    }

    #[test]
    fn test_qualified_name_split() {
        assert_eq!(split_qualified_name("public.users"), (Some("public"), "users"));
        assert_eq!(split_qualified_name("users"), (None, "users"));
    }
}
