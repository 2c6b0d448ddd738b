//! Query description for ordered collection fetches.

use serde_json::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Where the store should answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// Store decides (may use its own offline copy)
    #[default]
    Default,
    /// Always ask the server
    Server,
}

/// Field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    /// True when `value` (None = field missing) satisfies the predicate.
    pub fn accepts(&self, value: Option<&Value>) -> bool {
        match self {
            Filter::Equals(_, expected) => value == Some(expected),
            Filter::In(_, options) => value.is_some_and(|v| options.contains(v)),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Equals(field, _) | Filter::In(field, _) => field,
        }
    }
}

// == Query ==
/// Ordered fetch of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub source: Source,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            filters: Vec::new(),
            order_by: None,
            source: Source::Default,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equals(field.into(), value.into()));
        self
    }

    pub fn where_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(field.into(), values));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn from_server(mut self) -> Self {
        self.source = Source::Server;
        self
    }
}
