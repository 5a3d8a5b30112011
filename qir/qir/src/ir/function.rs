use indexmap::IndexMap;
use serde::Serialize;

/// Arguments of a SQL function call (computed fields, function sources).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionArgs<V> {
    pub positional: Vec<ArgumentExp<V>>,
    pub named: IndexMap<String, ArgumentExp<V>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArgumentExp<V> {
    /// The row of the table the computed field is defined on.
    TableRow,
    Input(V),
}

impl<V> FunctionArgs<V> {
    pub fn empty() -> Self {
        FunctionArgs {
            positional: Vec::new(),
            named: IndexMap::new(),
        }
    }

    pub fn positional(args: Vec<ArgumentExp<V>>) -> Self {
        FunctionArgs {
            positional: args,
            named: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
