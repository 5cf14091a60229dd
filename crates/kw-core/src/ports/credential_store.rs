use std::fmt;

use crate::query::Query;
use crate::status::Status;

/// Result of a single store call: the value on success, the platform status
/// otherwise. A store never returns `Err(Status::SUCCESS)`.
pub type StoreResult<T> = Result<T, Status>;

/// Item returned by [`CredentialStorePort::copy_matching`].
///
/// `attributes` is filled when the query set `ReturnAttributes`, `data` when it
/// set `ReturnData`. A plain existence probe gets both as `None`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MatchedItem {
    pub attributes: Option<Query>,
    pub data: Option<Vec<u8>>,
}

impl fmt::Debug for MatchedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchedItem")
            .field("attributes", &self.attributes)
            .field("data", &self.data.as_ref().map(|bytes| bytes.len()))
            .finish()
    }
}

/// Platform secure store port.
///
/// Models the create/read/update/delete query-dictionary protocol of an OS
/// keychain. Each method is one indivisible platform call; implementations
/// synchronize internally and may be shared between threads.
///
/// Matching: a query selects items by class, service, account and access
/// group. Class, service and account match anything when the query leaves
/// them out. The access group never does: items are partitioned by it, and a
/// query without one only reaches items stored without one. Every backend
/// follows this rule, so `delete` with a namespace query removes the same
/// items everywhere.
///
/// Error semantics:
/// - `Status::ITEM_NOT_FOUND` : nothing matched the query
/// - `Status::DUPLICATE_ITEM` : `add` found an item with the same identity
/// - anything else            : platform failure
pub trait CredentialStorePort: Send + Sync {
    /// Find the first item matching the identifying attributes of `query`.
    fn copy_matching(&self, query: &Query) -> StoreResult<MatchedItem>;

    /// Create an item from the attributes of `query`, including `ValueData`.
    fn add(&self, query: &Query) -> StoreResult<()>;

    /// Apply `attributes` to every item matching `query`.
    fn update(&self, query: &Query, attributes: &Query) -> StoreResult<()>;

    /// Delete every item matching `query`.
    fn delete(&self, query: &Query) -> StoreResult<()>;

    /// Human-readable message for `status`, if the platform has one.
    fn error_message(&self, status: Status) -> Option<String> {
        status.description().map(str::to_string)
    }
}
