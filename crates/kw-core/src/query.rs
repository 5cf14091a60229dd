//! Query descriptors and the namespaced query builder.
//!
//! A [`Query`] is the attribute map handed to every credential store call. It
//! is built fresh for each operation by [`QueryBuilder`] and never shared
//! between calls.

use std::collections::BTreeMap;
use std::fmt;

use crate::namespace::Namespace;

/// Attribute names understood by credential stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    /// Item class (always generic password here).
    Class,
    /// Service attribute, carries the namespace root key.
    Service,
    /// Access group shared between applications.
    AccessGroup,
    /// Account attribute, carries the entry key.
    Account,
    /// Secret payload.
    ValueData,
    /// Ask the store to return the matched item's attributes.
    ReturnAttributes,
    /// Ask the store to return the matched item's data.
    ReturnData,
    /// How many matches a search may return.
    MatchLimit,
}

impl Attribute {
    /// Attributes that identify an item, as opposed to payload and search
    /// options. Stores match items on these only.
    pub const IDENTIFYING: [Attribute; 4] = [
        Attribute::Class,
        Attribute::Service,
        Attribute::AccessGroup,
        Attribute::Account,
    ];

    pub fn is_identifying(self) -> bool {
        Self::IDENTIFYING.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemClass {
    GenericPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchLimit {
    #[default]
    One,
    All,
}

#[derive(Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Class(ItemClass),
    Text(String),
    Data(Vec<u8>),
    Bool(bool),
    Limit(MatchLimit),
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => write!(f, "Class({:?})", class),
            Self::Text(text) => write!(f, "Text({:?})", text),
            Self::Data(bytes) => write!(f, "Data(<{} bytes>)", bytes.len()),
            Self::Bool(flag) => write!(f, "Bool({})", flag),
            Self::Limit(limit) => write!(f, "Limit({:?})", limit),
        }
    }
}

/// Attribute map passed to a credential store call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Query {
    attributes: BTreeMap<Attribute, AttributeValue>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: Attribute, value: AttributeValue) -> Self {
        self.insert(attribute, value);
        self
    }

    pub fn insert(&mut self, attribute: Attribute, value: AttributeValue) {
        self.attributes.insert(attribute, value);
    }

    /// Returns a copy of `self` with every attribute of `other` applied on top.
    pub fn merged(&self, other: &Query) -> Query {
        let mut merged = self.clone();
        for (attribute, value) in &other.attributes {
            merged.insert(*attribute, value.clone());
        }
        merged
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.attributes.get(&attribute)
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.attributes.contains_key(&attribute)
    }

    pub fn text(&self, attribute: Attribute) -> Option<&str> {
        match self.get(attribute) {
            Some(AttributeValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn data(&self, attribute: Attribute) -> Option<&[u8]> {
        match self.get(attribute) {
            Some(AttributeValue::Data(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// `true` only when the attribute is present and set to `Bool(true)`.
    pub fn flag(&self, attribute: Attribute) -> bool {
        matches!(self.get(attribute), Some(AttributeValue::Bool(true)))
    }

    pub fn class(&self) -> Option<ItemClass> {
        match self.get(Attribute::Class) {
            Some(AttributeValue::Class(class)) => Some(*class),
            _ => None,
        }
    }

    pub fn match_limit(&self) -> MatchLimit {
        match self.get(Attribute::MatchLimit) {
            Some(AttributeValue::Limit(limit)) => *limit,
            _ => MatchLimit::default(),
        }
    }

    pub fn service(&self) -> Option<&str> {
        self.text(Attribute::Service)
    }

    pub fn access_group(&self) -> Option<&str> {
        self.text(Attribute::AccessGroup)
    }

    pub fn account(&self) -> Option<&str> {
        self.text(Attribute::Account)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, &AttributeValue)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.attributes.iter()).finish()
    }
}

/// Which shape of query an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Every entry of the namespace (delete-all).
    Namespace,
    /// One entry, addressed by key (probe, update, add, delete-one).
    Account,
    /// One entry, returning its attributes and data, limited to one match.
    Fetch,
}

/// Builds namespaced queries for one [`Namespace`].
///
/// Pure function of its inputs; never fails.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    namespace: Namespace,
    scope_access_group: bool,
}

impl QueryBuilder {
    /// Builder with access-group scoping decided by the build target
    /// (disabled on simulators, which do not enforce access groups).
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            scope_access_group: supports_access_groups(),
        }
    }

    /// Override whether the access group is written into queries.
    pub fn with_access_group_scoping(mut self, enabled: bool) -> Self {
        self.scope_access_group = enabled;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Build the query for `kind`. `key` is ignored for [`QueryKind::Namespace`];
    /// a per-key kind without a key degrades to the namespace query.
    pub fn build(&self, kind: QueryKind, key: Option<&str>) -> Query {
        let mut query = Query::new()
            .with(Attribute::Class, AttributeValue::Class(ItemClass::GenericPassword))
            .with(
                Attribute::Service,
                AttributeValue::Text(self.namespace.root_key().to_string()),
            );

        if self.scope_access_group {
            if let Some(group) = self.namespace.access_group() {
                query.insert(Attribute::AccessGroup, AttributeValue::Text(group.to_string()));
            }
        }

        if kind == QueryKind::Namespace {
            return query;
        }

        if let Some(key) = key {
            query.insert(Attribute::Account, AttributeValue::Text(key.to_string()));
        }

        if kind == QueryKind::Fetch {
            query.insert(Attribute::MatchLimit, AttributeValue::Limit(MatchLimit::One));
            query.insert(Attribute::ReturnAttributes, AttributeValue::Bool(true));
            query.insert(Attribute::ReturnData, AttributeValue::Bool(true));
        }

        query
    }

    pub fn namespace_query(&self) -> Query {
        self.build(QueryKind::Namespace, None)
    }

    pub fn account_query(&self, key: &str) -> Query {
        self.build(QueryKind::Account, Some(key))
    }

    pub fn fetch_query(&self, key: &str) -> Query {
        self.build(QueryKind::Fetch, Some(key))
    }

    /// Attributes carrying a new secret payload, for add and update calls.
    pub fn value_data(bytes: &[u8]) -> Query {
        Query::new().with(Attribute::ValueData, AttributeValue::Data(bytes.to_vec()))
    }
}

/// Whether the build target enforces keychain access groups.
///
/// iOS simulators ignore access groups, so queries leave them out there.
pub fn supports_access_groups() -> bool {
    !cfg!(all(
        target_os = "ios",
        any(
            target_abi = "sim",
            all(target_arch = "x86_64", not(target_abi = "macabi"))
        )
    ))
}
