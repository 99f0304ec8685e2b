use bson::Bson;
use serde::{Deserialize, Serialize};
use trellis_query::Query;

/// Type tag attached to a real column. A column carries an ordered list of
/// tags; the first is its primary representation, the rest widen it
/// (e.g. `[String, Null]` for an optional string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Identifier,
    Null,
    Binary,
    Boolean,
    Integer,
    Decimal,
    Number,
    String,
    Enumeration,
    Pattern,
    Timestamp,
    Date,
    Array,
    Map,
    Object,
}

/// A locally stored property of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealColumn {
    pub name: String,
    /// Storage alias; the document field differs from the declared name.
    pub store_as: Option<String>,
    pub types: Vec<ColumnType>,
    pub required: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    /// Allowed values for Enumeration-tagged columns.
    pub values: Vec<Bson>,
    /// Regex source for Pattern-tagged columns.
    pub pattern: Option<String>,
    /// Nested entity name when the value is an entity or array of entities.
    pub entity: Option<String>,
}

impl RealColumn {
    pub fn new(name: impl Into<String>, types: impl Into<Vec<ColumnType>>) -> Self {
        Self {
            name: name.into(),
            store_as: None,
            types: types.into(),
            required: false,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            values: Vec::new(),
            pattern: None,
            entity: None,
        }
    }

    pub fn store_as(mut self, alias: impl Into<String>) -> Self {
        self.store_as = Some(alias.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn values(mut self, values: Vec<Bson>) -> Self {
        self.values = values;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn storage_name(&self) -> &str {
        self.store_as.as_deref().unwrap_or(&self.name)
    }

    pub fn has_type(&self, t: ColumnType) -> bool {
        self.types.contains(&t)
    }

    pub fn is_array(&self) -> bool {
        self.has_type(ColumnType::Array)
    }

    pub fn is_map(&self) -> bool {
        self.has_type(ColumnType::Map)
    }

    /// Entity-valued and traversable: Map columns are opaque documents and
    /// are never walked by the relationship resolver.
    pub fn nested_entity(&self) -> Option<&str> {
        if self.is_map() {
            return None;
        }
        self.entity.as_deref()
    }
}

/// A declared foreign relationship, resolved at query time via `$lookup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualColumn {
    pub name: String,
    /// Field on this entity holding the correlation value.
    pub local_key: String,
    /// Target entity name.
    pub entity: String,
    /// Field on the target matched against `local_key`.
    pub foreign_key: String,
    /// One-to-many when true; one-to-one otherwise.
    pub many: bool,
    /// Keep the joined value as an array even for a single join.
    pub all: bool,
    /// Restricts the joined rows (filter/sort/limit).
    pub query: Option<Query>,
}

impl VirtualColumn {
    pub fn new(
        name: impl Into<String>,
        local_key: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_key: local_key.into(),
            entity: entity.into(),
            foreign_key: foreign_key.into(),
            many: false,
            all: false,
            query: None,
        }
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn all(mut self) -> Self {
        self.all = true;
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }
}

/// One property of an entity: stored locally or joined from another
/// collection. Closed sum so the two variants carry only their own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Real(RealColumn),
    Virtual(VirtualColumn),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Real(c) => &c.name,
            Column::Virtual(c) => &c.name,
        }
    }

    /// Document field name this column occupies.
    pub fn storage_name(&self) -> &str {
        match self {
            Column::Real(c) => c.storage_name(),
            Column::Virtual(c) => &c.name,
        }
    }

    pub fn as_real(&self) -> Option<&RealColumn> {
        match self {
            Column::Real(c) => Some(c),
            Column::Virtual(_) => None,
        }
    }

    pub fn as_virtual(&self) -> Option<&VirtualColumn> {
        match self {
            Column::Virtual(c) => Some(c),
            Column::Real(_) => None,
        }
    }
}

impl From<RealColumn> for Column {
    fn from(c: RealColumn) -> Self {
        Column::Real(c)
    }
}

impl From<VirtualColumn> for Column {
    fn from(c: VirtualColumn) -> Self {
        Column::Virtual(c)
    }
}
