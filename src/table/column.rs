use crate::table::value::Value;

/// A named column of cell values.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Column name (unique within its table)
    pub name: String,
    /// Cell values, one per row
    pub values: Vec<Value>,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, values: Vec<Value>) -> Column {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the first value that is not null.
    pub fn first_non_null(&self) -> Option<&Value> {
        self.values.iter().find(|value| !value.is_null())
    }
}
