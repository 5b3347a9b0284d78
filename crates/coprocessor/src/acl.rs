//! Append-only access control over ciphertext handles.
//!
//! The coprocessor records three relations:
//!
//! - which handles ledger logic may operate on in transactions after the one
//!   that produced them (`internal use`),
//! - which identities may request decryption of which handles,
//! - which handles have been promoted to public decryptability.
//!
//! All three only ever grow. There is no revocation operation anywhere in
//! the system, so re-granting is an idempotent set insertion and replayed
//! grant calls are harmless.

use std::collections::HashSet;

use auction_types::{Address, Handle};

/// The append-only grant store backing a coprocessor's access decisions.
#[derive(Debug, Default, Clone)]
pub struct AccessList {
    internal_use: HashSet<Handle>,
    decrypt_grants: HashSet<(Handle, Address)>,
    public: HashSet<Handle>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `handle` as persistently usable by ledger logic.
    ///
    /// Returns `true` if the grant is new, `false` if it already existed.
    pub fn grant_internal(&mut self, handle: Handle) -> bool {
        self.internal_use.insert(handle)
    }

    /// Allow `grantee` to request decryption of `handle`.
    ///
    /// Returns `true` if the grant is new, `false` if it already existed.
    pub fn grant_decrypt(&mut self, handle: Handle, grantee: Address) -> bool {
        self.decrypt_grants.insert((handle, grantee))
    }

    /// Promote `handle` to public decryptability. Irreversible.
    ///
    /// Returns `true` if the handle was not public before.
    pub fn make_public(&mut self, handle: Handle) -> bool {
        self.public.insert(handle)
    }

    /// Whether ledger logic may operate on `handle` outside the transaction
    /// that produced it.
    pub fn is_internal(&self, handle: Handle) -> bool {
        self.internal_use.contains(&handle)
    }

    /// Whether `handle` is decryptable by anyone.
    pub fn is_public(&self, handle: Handle) -> bool {
        self.public.contains(&handle)
    }

    /// Whether `requester` may obtain the plaintext behind `handle`, either
    /// through an individual grant or because the handle is public.
    pub fn can_decrypt(&self, handle: Handle, requester: &Address) -> bool {
        self.is_public(handle) || self.decrypt_grants.contains(&(handle, *requester))
    }
}
