use crate::types::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named-value row. The tuple payload is the serialized form of this map,
/// which makes every stored tuple self-describing: columns added to the
/// schema later are simply absent from older payloads and materialize at
/// read time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: BTreeMap<String, Field>,
}

impl Row {
    pub fn new() -> Row {
        Row {
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Field> {
        self.values.get(column)
    }

    /// The stored value for `column`, with absence read as NULL.
    pub fn get_or_null(&self, column: &str) -> Field {
        self.values.get(column).cloned().unwrap_or(Field::Null)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Field) {
        self.values.insert(column.into(), value);
    }

    pub fn remove(&mut self, column: &str) -> Option<Field> {
        self.values.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.values.iter()
    }
}

impl From<Vec<(&str, Field)>> for Row {
    fn from(pairs: Vec<(&str, Field)>) -> Self {
        let mut row = Row::new();
        for (column, value) in pairs {
            row.set(column, value);
        }
        row
    }
}

impl FromIterator<(String, Field)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        Row {
            values: iter.into_iter().collect(),
        }
    }
}
