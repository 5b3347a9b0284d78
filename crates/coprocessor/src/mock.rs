//! In-process coprocessor for tests and the mock chain.
//!
//! `MockCoprocessor` implements the full [`Coprocessor`] contract against a
//! plaintext store keyed by deterministically derived handles. It also
//! models the transaction boundary: a freshly minted handle is operable only
//! inside the transaction that produced it, and survives into later
//! transactions only if ledger logic granted it persistent internal use
//! before the boundary. The host calls [`MockCoprocessor::next_transaction`]
//! after each state-changing call to advance the boundary.
//!
//! Decryption is deliberately not part of the trait. The inherent
//! [`MockCoprocessor::decrypt_u64`] and [`MockCoprocessor::decrypt_address`]
//! methods stand in for the out-of-band decryption service and enforce the
//! access list on every request.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::debug;

use auction_types::{
    Address, EncryptedAddress, EncryptedBool, EncryptedU64, Handle, HandleKind, LedgerId,
};

use crate::acl::AccessList;
use crate::error::CoprocessorError;
use crate::input::{binding_digest, kind_tag, unseal_u64, ExternalCiphertext, InputProof};
use crate::Coprocessor;

/// Domain tag for mock handle derivation.
const HANDLE_DOMAIN: &[u8] = b"AUCTION_MOCK_HANDLE_V1";

/// A stored plaintext, tagged with its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plaintext {
    Bool(bool),
    Uint64(u64),
    Address(Address),
}

impl Plaintext {
    fn kind(&self) -> HandleKind {
        match self {
            Plaintext::Bool(_) => HandleKind::Bool,
            Plaintext::Uint64(_) => HandleKind::Uint64,
            Plaintext::Address(_) => HandleKind::Address,
        }
    }
}

/// In-process implementation of the coprocessor contract.
#[derive(Debug, Default)]
pub struct MockCoprocessor {
    values: HashMap<Handle, Plaintext>,
    acl: AccessList,
    /// Handles minted since the last transaction boundary. Operable now,
    /// gone at the boundary unless granted internal use.
    transient: HashSet<Handle>,
    minted: u64,
}

impl MockCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the transaction boundary.
    ///
    /// Handles that were never granted persistent internal use stop being
    /// operable by ledger logic. Their plaintexts remain stored, so earlier
    /// decrypt grants keep working.
    pub fn next_transaction(&mut self) {
        self.transient.clear();
    }

    /// Read-only view of the access list.
    pub fn acl(&self) -> &AccessList {
        &self.acl
    }

    /// Decrypt an integer handle on behalf of `requester`.
    ///
    /// Requires an individual decrypt grant or public decryptability.
    pub fn decrypt_u64(
        &self,
        value: &EncryptedU64,
        requester: &Address,
    ) -> Result<u64, CoprocessorError> {
        let handle = value.handle();
        let plaintext = self.value_u64(handle)?;
        if !self.acl.can_decrypt(handle, requester) {
            return Err(CoprocessorError::DecryptNotAuthorized(handle));
        }
        debug!(%handle, "authorized integer decryption");
        Ok(plaintext)
    }

    /// Decrypt an identity handle on behalf of `requester`.
    pub fn decrypt_address(
        &self,
        value: &EncryptedAddress,
        requester: &Address,
    ) -> Result<Address, CoprocessorError> {
        let handle = value.handle();
        let plaintext = self.value_address(handle)?;
        if !self.acl.can_decrypt(handle, requester) {
            return Err(CoprocessorError::DecryptNotAuthorized(handle));
        }
        debug!(%handle, "authorized identity decryption");
        Ok(plaintext)
    }

    /// Mint a fresh handle for `plaintext`.
    ///
    /// Handles are derived from a counter and the type tag, never from the
    /// value, so equal plaintexts get unrelated handles.
    fn mint(&mut self, plaintext: Plaintext) -> Handle {
        self.minted += 1;
        let mut hasher = Sha256::new();
        hasher.update(HANDLE_DOMAIN);
        hasher.update(self.minted.to_le_bytes());
        hasher.update([kind_tag(plaintext.kind())]);
        let handle = Handle(hasher.finalize().into());

        self.values.insert(handle, plaintext);
        self.transient.insert(handle);
        handle
    }

    fn require_known(&self, handle: Handle) -> Result<(), CoprocessorError> {
        if self.values.contains_key(&handle) {
            Ok(())
        } else {
            Err(CoprocessorError::UnknownHandle(handle))
        }
    }

    /// A handle is operable if minted in the current transaction or granted
    /// persistent internal use.
    fn require_usable(&self, handle: Handle) -> Result<(), CoprocessorError> {
        if self.transient.contains(&handle) || self.acl.is_internal(handle) {
            Ok(())
        } else {
            Err(CoprocessorError::HandleNotUsable(handle))
        }
    }

    fn value_u64(&self, handle: Handle) -> Result<u64, CoprocessorError> {
        match self.values.get(&handle) {
            None => Err(CoprocessorError::UnknownHandle(handle)),
            Some(Plaintext::Uint64(value)) => Ok(*value),
            Some(other) => Err(CoprocessorError::TypeMismatch {
                expected: HandleKind::Uint64,
                got: other.kind(),
            }),
        }
    }

    fn value_address(&self, handle: Handle) -> Result<Address, CoprocessorError> {
        match self.values.get(&handle) {
            None => Err(CoprocessorError::UnknownHandle(handle)),
            Some(Plaintext::Address(value)) => Ok(*value),
            Some(other) => Err(CoprocessorError::TypeMismatch {
                expected: HandleKind::Address,
                got: other.kind(),
            }),
        }
    }

    fn value_bool(&self, handle: Handle) -> Result<bool, CoprocessorError> {
        match self.values.get(&handle) {
            None => Err(CoprocessorError::UnknownHandle(handle)),
            Some(Plaintext::Bool(value)) => Ok(*value),
            Some(other) => Err(CoprocessorError::TypeMismatch {
                expected: HandleKind::Bool,
                got: other.kind(),
            }),
        }
    }

    /// Load a compute operand: existence, type, then usability.
    fn operand_u64(&self, value: &EncryptedU64) -> Result<u64, CoprocessorError> {
        let plaintext = self.value_u64(value.handle())?;
        self.require_usable(value.handle())?;
        Ok(plaintext)
    }

    fn operand_address(&self, value: &EncryptedAddress) -> Result<Address, CoprocessorError> {
        let plaintext = self.value_address(value.handle())?;
        self.require_usable(value.handle())?;
        Ok(plaintext)
    }

    fn operand_bool(&self, value: &EncryptedBool) -> Result<bool, CoprocessorError> {
        let plaintext = self.value_bool(value.handle())?;
        self.require_usable(value.handle())?;
        Ok(plaintext)
    }
}

impl Coprocessor for MockCoprocessor {
    fn encrypt_u64(&mut self, value: u64) -> Result<EncryptedU64, CoprocessorError> {
        Ok(EncryptedU64::new(self.mint(Plaintext::Uint64(value))))
    }

    fn encrypt_address(&mut self, value: Address) -> Result<EncryptedAddress, CoprocessorError> {
        Ok(EncryptedAddress::new(self.mint(Plaintext::Address(value))))
    }

    fn import_euint64(
        &mut self,
        ciphertext: &ExternalCiphertext,
        proof: &InputProof,
        ledger_id: &LedgerId,
        submitter: &Address,
    ) -> Result<EncryptedU64, CoprocessorError> {
        let expected = binding_digest(ledger_id, submitter, ciphertext);
        if proof.digest != expected {
            return Err(CoprocessorError::InvalidInputProof);
        }
        let value = unseal_u64(ciphertext)?;
        Ok(EncryptedU64::new(self.mint(Plaintext::Uint64(value))))
    }

    fn gt(
        &mut self,
        lhs: &EncryptedU64,
        rhs: &EncryptedU64,
    ) -> Result<EncryptedBool, CoprocessorError> {
        let l = self.operand_u64(lhs)?;
        let r = self.operand_u64(rhs)?;
        Ok(EncryptedBool::new(self.mint(Plaintext::Bool(l > r))))
    }

    fn select_u64(
        &mut self,
        condition: &EncryptedBool,
        if_true: &EncryptedU64,
        if_false: &EncryptedU64,
    ) -> Result<EncryptedU64, CoprocessorError> {
        let cond = self.operand_bool(condition)?;
        let t = self.operand_u64(if_true)?;
        let f = self.operand_u64(if_false)?;
        let chosen = if cond { t } else { f };
        Ok(EncryptedU64::new(self.mint(Plaintext::Uint64(chosen))))
    }

    fn select_address(
        &mut self,
        condition: &EncryptedBool,
        if_true: &EncryptedAddress,
        if_false: &EncryptedAddress,
    ) -> Result<EncryptedAddress, CoprocessorError> {
        let cond = self.operand_bool(condition)?;
        let t = self.operand_address(if_true)?;
        let f = self.operand_address(if_false)?;
        let chosen = if cond { t } else { f };
        Ok(EncryptedAddress::new(self.mint(Plaintext::Address(chosen))))
    }

    fn allow_internal(&mut self, handle: Handle) -> Result<(), CoprocessorError> {
        self.require_known(handle)?;
        self.acl.grant_internal(handle);
        Ok(())
    }

    fn allow_decrypt(&mut self, handle: Handle, grantee: Address) -> Result<(), CoprocessorError> {
        self.require_known(handle)?;
        self.acl.grant_decrypt(handle, grantee);
        Ok(())
    }

    fn make_publicly_decryptable(&mut self, handle: Handle) -> Result<Handle, CoprocessorError> {
        self.require_known(handle)?;
        self.acl.make_public(handle);
        Ok(handle)
    }

    fn is_publicly_decryptable(&self, handle: Handle) -> Result<bool, CoprocessorError> {
        self.require_known(handle)?;
        Ok(self.acl.is_public(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::seal_u64;
    use rand::rngs::OsRng;

    const LEDGER: LedgerId = LedgerId([1u8; 32]);
    const ALICE: Address = [0xaa; 32];
    const BOB: Address = [0xbb; 32];

    #[test]
    fn test_encrypt_mints_fresh_handles() {
        let mut cop = MockCoprocessor::new();
        let a = cop.encrypt_u64(42).unwrap();
        let b = cop.encrypt_u64(42).unwrap();

        // Equal plaintexts, unrelated handles
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn test_decryption_requires_a_grant() {
        let mut cop = MockCoprocessor::new();
        let price = cop.encrypt_u64(100).unwrap();

        assert!(matches!(
            cop.decrypt_u64(&price, &ALICE),
            Err(CoprocessorError::DecryptNotAuthorized(_))
        ));

        cop.allow_decrypt(price.handle(), ALICE).unwrap();
        assert_eq!(cop.decrypt_u64(&price, &ALICE).unwrap(), 100);

        // The grant is per identity
        assert!(matches!(
            cop.decrypt_u64(&price, &BOB),
            Err(CoprocessorError::DecryptNotAuthorized(_))
        ));
    }

    #[test]
    fn test_import_accepts_a_well_bound_ciphertext() {
        let mut cop = MockCoprocessor::new();
        let (ciphertext, proof) = seal_u64(&LEDGER, &ALICE, 2500, &mut OsRng);

        let imported = cop
            .import_euint64(&ciphertext, &proof, &LEDGER, &ALICE)
            .unwrap();
        cop.allow_decrypt(imported.handle(), ALICE).unwrap();
        assert_eq!(cop.decrypt_u64(&imported, &ALICE).unwrap(), 2500);
    }

    #[test]
    fn test_import_rejects_wrong_submitter_or_ledger() {
        let mut cop = MockCoprocessor::new();
        let (ciphertext, proof) = seal_u64(&LEDGER, &ALICE, 2500, &mut OsRng);

        assert!(matches!(
            cop.import_euint64(&ciphertext, &proof, &LEDGER, &BOB),
            Err(CoprocessorError::InvalidInputProof)
        ));

        let other_ledger = LedgerId([2u8; 32]);
        assert!(matches!(
            cop.import_euint64(&ciphertext, &proof, &other_ledger, &ALICE),
            Err(CoprocessorError::InvalidInputProof)
        ));
    }

    #[test]
    fn test_import_rejects_tampered_payload() {
        let mut cop = MockCoprocessor::new();
        let (mut ciphertext, proof) = seal_u64(&LEDGER, &ALICE, 2500, &mut OsRng);
        ciphertext.payload[0] ^= 0xff;

        assert!(matches!(
            cop.import_euint64(&ciphertext, &proof, &LEDGER, &ALICE),
            Err(CoprocessorError::InvalidInputProof)
        ));
    }

    #[test]
    fn test_gt_is_strict() {
        let mut cop = MockCoprocessor::new();
        let five = cop.encrypt_u64(5).unwrap();
        let three = cop.encrypt_u64(3).unwrap();

        let gt = cop.gt(&five, &three).unwrap();
        let lt = cop.gt(&three, &five).unwrap();
        let eq = cop.gt(&five, &five).unwrap();

        assert!(cop.value_bool(gt.handle()).unwrap());
        assert!(!cop.value_bool(lt.handle()).unwrap());
        // Strict comparison: equality is false
        assert!(!cop.value_bool(eq.handle()).unwrap());
    }

    #[test]
    fn test_select_follows_the_encrypted_condition() {
        let mut cop = MockCoprocessor::new();
        let high = cop.encrypt_u64(900).unwrap();
        let low = cop.encrypt_u64(100).unwrap();

        let cond = cop.gt(&high, &low).unwrap();
        let winner = cop.select_u64(&cond, &high, &low).unwrap();
        cop.make_publicly_decryptable(winner.handle()).unwrap();
        assert_eq!(cop.decrypt_u64(&winner, &BOB).unwrap(), 900);

        // Fresh handle either way, never an alias of an input
        assert_ne!(winner.handle(), high.handle());

        let flipped = cop.gt(&low, &high).unwrap();
        let loser = cop.select_u64(&flipped, &high, &low).unwrap();
        cop.make_publicly_decryptable(loser.handle()).unwrap();
        assert_eq!(cop.decrypt_u64(&loser, &BOB).unwrap(), 100);
    }

    #[test]
    fn test_type_confusion_is_rejected() {
        let mut cop = MockCoprocessor::new();
        let a = cop.encrypt_u64(1).unwrap();
        let b = cop.encrypt_u64(2).unwrap();
        let flag = cop.gt(&a, &b).unwrap();

        let disguised = EncryptedU64::new(flag.handle());
        assert!(matches!(
            cop.gt(&disguised, &a),
            Err(CoprocessorError::TypeMismatch {
                expected: HandleKind::Uint64,
                got: HandleKind::Bool,
            })
        ));
    }

    #[test]
    fn test_handles_expire_without_internal_grant() {
        let mut cop = MockCoprocessor::new();
        let kept = cop.encrypt_u64(1).unwrap();
        let dropped = cop.encrypt_u64(2).unwrap();
        cop.allow_internal(kept.handle()).unwrap();

        cop.next_transaction();

        assert!(matches!(
            cop.gt(&kept, &dropped),
            Err(CoprocessorError::HandleNotUsable(_))
        ));
        assert!(cop.gt(&kept, &kept).is_ok());
    }

    #[test]
    fn test_decrypt_grants_survive_the_transaction_boundary() {
        let mut cop = MockCoprocessor::new();
        let price = cop.encrypt_u64(64).unwrap();
        cop.allow_decrypt(price.handle(), ALICE).unwrap();

        cop.next_transaction();

        assert_eq!(cop.decrypt_u64(&price, &ALICE).unwrap(), 64);
    }

    #[test]
    fn test_promotion_is_permanent_and_returns_the_handle() {
        let mut cop = MockCoprocessor::new();
        let value = cop.encrypt_u64(9).unwrap();

        assert!(!cop.is_publicly_decryptable(value.handle()).unwrap());
        let promoted = cop.make_publicly_decryptable(value.handle()).unwrap();
        assert_eq!(promoted, value.handle());
        assert!(cop.is_publicly_decryptable(value.handle()).unwrap());
        assert_eq!(cop.decrypt_u64(&value, &BOB).unwrap(), 9);
    }

    #[test]
    fn test_operations_on_unknown_handles_fail() {
        let mut cop = MockCoprocessor::new();
        let ghost = EncryptedU64::new(Handle([0xfe; 32]));

        assert!(matches!(
            cop.allow_internal(ghost.handle()),
            Err(CoprocessorError::UnknownHandle(_))
        ));
        assert!(matches!(
            cop.is_publicly_decryptable(ghost.handle()),
            Err(CoprocessorError::UnknownHandle(_))
        ));
        assert!(matches!(
            cop.decrypt_u64(&ghost, &ALICE),
            Err(CoprocessorError::UnknownHandle(_))
        ));
    }
}
