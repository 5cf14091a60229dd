//! In-process credential store.
//!
//! Follows keychain matching rules (duplicate detection, not-found statuses,
//! access-group matching) without touching any OS storage. Used for tests and
//! for `backend = "memory"` setups. Supports one-shot fault injection per
//! operation and counts every call it receives.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use kw_core::{
    Attribute, CredentialStorePort, MatchedItem, Query, Status, StoreResult,
};

use crate::item::ItemIdentity;

/// Store operations, for fault injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CopyMatching,
    Add,
    Update,
    Delete,
}

#[derive(Default)]
struct MemoryState {
    items: Vec<(ItemIdentity, Vec<u8>)>,
    faults: HashMap<StoreOp, Status>,
    calls: HashMap<StoreOp, usize>,
}

/// In-memory keychain.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: Mutex<MemoryState>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `status`.
    pub fn fail_next(&self, op: StoreOp, status: Status) {
        self.lock().faults.insert(op, status);
    }

    /// Number of calls of `op` received so far, including failed ones.
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write raw bytes for an item, bypassing encoding. Replaces any item
    /// with the same identity.
    pub fn insert_raw(&self, access_group: Option<&str>, service: &str, account: &str, data: Vec<u8>) {
        let identity = ItemIdentity {
            access_group: access_group.map(str::to_string),
            service: service.to_string(),
            account: account.to_string(),
        };
        let mut state = self.lock();
        state.items.retain(|(existing, _)| *existing != identity);
        state.items.push((identity, data));
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and consume a pending fault for `op`.
    fn enter(&self, state: &mut MemoryState, op: StoreOp) -> StoreResult<()> {
        *state.calls.entry(op).or_default() += 1;
        match state.faults.remove(&op) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

impl CredentialStorePort for MemoryCredentialStore {
    fn copy_matching(&self, query: &Query) -> StoreResult<MatchedItem> {
        let mut state = self.lock();
        self.enter(&mut state, StoreOp::CopyMatching)?;

        state
            .items
            .iter()
            .find(|(identity, _)| identity.matches(query))
            .map(|(identity, data)| identity.to_matched(query, data))
            .ok_or(Status::ITEM_NOT_FOUND)
    }

    fn add(&self, query: &Query) -> StoreResult<()> {
        let mut state = self.lock();
        self.enter(&mut state, StoreOp::Add)?;

        let identity = ItemIdentity::from_add_query(query)?;
        let data = query.data(Attribute::ValueData).ok_or(Status::PARAM)?;
        if state.items.iter().any(|(existing, _)| *existing == identity) {
            return Err(Status::DUPLICATE_ITEM);
        }
        state.items.push((identity, data.to_vec()));
        Ok(())
    }

    fn update(&self, query: &Query, attributes: &Query) -> StoreResult<()> {
        let mut state = self.lock();
        self.enter(&mut state, StoreOp::Update)?;

        let data = attributes.data(Attribute::ValueData).ok_or(Status::PARAM)?;
        let mut updated = 0;
        for (identity, stored) in state.items.iter_mut() {
            if identity.matches(query) {
                *stored = data.to_vec();
                updated += 1;
            }
        }
        if updated == 0 {
            return Err(Status::ITEM_NOT_FOUND);
        }
        Ok(())
    }

    fn delete(&self, query: &Query) -> StoreResult<()> {
        let mut state = self.lock();
        self.enter(&mut state, StoreOp::Delete)?;

        let before = state.items.len();
        state.items.retain(|(identity, _)| !identity.matches(query));
        if state.items.len() == before {
            return Err(Status::ITEM_NOT_FOUND);
        }
        Ok(())
    }
}
