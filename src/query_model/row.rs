//! Materialized result rows.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::value::Value;

/// One result row: named cells in SELECT order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing cell of the same name.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.cells.iter_mut().find(|(n, _)| n == name) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<(String, Value)>> for Row {
    fn from(cells: Vec<(String, Value)>) -> Self {
        let mut row = Row::new();
        for (name, value) in cells {
            row.set(&name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = Row::new().with("Id", 1).with("SomeText", "a");
        row.set("Id", Value::Integer(2));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["Id", "SomeText"]);
        assert_eq!(row.get("Id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_serializes_in_column_order() {
        let row = Row::new()
            .with("Id", 1)
            .with("SomeArray", Value::integer_array([3, 4]));
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"Id":1,"SomeArray":[3,4]}"#
        );
    }
}
