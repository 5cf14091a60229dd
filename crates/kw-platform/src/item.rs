//! Item identity shared by the in-process backends.

use kw_core::{Attribute, AttributeValue, ItemClass, MatchedItem, Query, Status, StoreResult};

/// Identifying attributes of one stored generic-password item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ItemIdentity {
    pub access_group: Option<String>,
    pub service: String,
    pub account: String,
}

impl ItemIdentity {
    /// Identity of the item an `add` call would create.
    ///
    /// A missing account is stored as the empty string, as keychains do.
    pub fn from_add_query(query: &Query) -> StoreResult<Self> {
        if query.class() != Some(ItemClass::GenericPassword) {
            return Err(Status::PARAM);
        }
        let service = query.service().ok_or(Status::PARAM)?;
        Ok(Self {
            access_group: query.access_group().map(str::to_string),
            service: service.to_string(),
            account: query.account().unwrap_or_default().to_string(),
        })
    }

    /// Whether `query` addresses this item.
    ///
    /// Absent class, service and account attributes match anything. The
    /// access group always has to be equal: a query without one only reaches
    /// items stored without one.
    pub fn matches(&self, query: &Query) -> bool {
        if let Some(class) = query.class() {
            if class != ItemClass::GenericPassword {
                return false;
            }
        }
        if let Some(service) = query.service() {
            if service != self.service {
                return false;
            }
        }
        if query.access_group() != self.access_group.as_deref() {
            return false;
        }
        if let Some(account) = query.account() {
            if account != self.account {
                return false;
            }
        }
        true
    }

    pub fn attributes(&self) -> Query {
        let mut attributes = Query::new()
            .with(Attribute::Class, AttributeValue::Class(ItemClass::GenericPassword))
            .with(Attribute::Service, AttributeValue::Text(self.service.clone()))
            .with(Attribute::Account, AttributeValue::Text(self.account.clone()));
        if let Some(group) = &self.access_group {
            attributes.insert(Attribute::AccessGroup, AttributeValue::Text(group.clone()));
        }
        attributes
    }

    /// Shape a search result the way `query` asked for it.
    pub fn to_matched(&self, query: &Query, data: &[u8]) -> MatchedItem {
        MatchedItem {
            attributes: query
                .flag(Attribute::ReturnAttributes)
                .then(|| self.attributes()),
            data: query.flag(Attribute::ReturnData).then(|| data.to_vec()),
        }
    }
}
