//! Homomorphic-coprocessor capability contract for the auction ledger.
//!
//! The ledger never sees a plaintext bid. Every encrypted value lives inside
//! an external coprocessor and is referenced on-ledger by an opaque 32-byte
//! handle. This crate defines the narrow operation set the ledger is allowed
//! to invoke, expressed as the [`Coprocessor`] trait:
//!
//! 1. **Constant encryption**: the ledger turns trusted plaintexts it already
//!    holds (starting price, zero identity) into fresh handles.
//!
//! 2. **Input import**: a bidder seals a value off-ledger into an
//!    [`ExternalCiphertext`] plus an [`InputProof`] binding it to one ledger
//!    and one submitter; the coprocessor verifies the binding before minting
//!    a handle.
//!
//! 3. **Compute**: strict greater-than over encrypted integers and ternary
//!    selection driven by an encrypted boolean. Results are always fresh
//!    handles; no operation reveals a plaintext.
//!
//! 4. **Access control**: an append-only [`AccessList`] records which handles
//!    the ledger may keep operating on in later transactions, which
//!    identities may request decryption, and which handles have been
//!    irreversibly promoted to public decryptability.
//!
//! Decryption itself is out of band: it is *not* part of the trait, so code
//! generic over [`Coprocessor`] has no path to a plaintext. The in-process
//! [`MockCoprocessor`] exposes it as inherent methods for tests and tooling.

pub mod acl;
pub mod error;
pub mod input;
pub mod mock;

pub use acl::AccessList;
pub use error::CoprocessorError;
pub use input::{seal_u64, ExternalCiphertext, InputProof};
pub use mock::MockCoprocessor;

use auction_types::{
    Address, EncryptedAddress, EncryptedBool, EncryptedU64, Handle, LedgerId,
};

/// The operation set a confidential ledger may invoke on the coprocessor.
///
/// Every call validates its operands (handle existence, plaintext type,
/// usability in the current transaction) and fails closed: an error leaves
/// the coprocessor's handle space and access list untouched.
pub trait Coprocessor {
    /// Encrypt a trusted plaintext integer, producing a fresh handle.
    ///
    /// No input proof is required: the caller already knows the value.
    fn encrypt_u64(&mut self, value: u64) -> Result<EncryptedU64, CoprocessorError>;

    /// Encrypt a trusted plaintext identity, producing a fresh handle.
    fn encrypt_address(&mut self, value: Address) -> Result<EncryptedAddress, CoprocessorError>;

    /// Import an externally sealed 64-bit integer.
    ///
    /// The proof must bind the ciphertext to `ledger_id` and `submitter`;
    /// a ciphertext sealed for another ledger or another sender is rejected
    /// without minting a handle.
    fn import_euint64(
        &mut self,
        ciphertext: &ExternalCiphertext,
        proof: &InputProof,
        ledger_id: &LedgerId,
        submitter: &Address,
    ) -> Result<EncryptedU64, CoprocessorError>;

    /// Strict homomorphic comparison: encryption of `lhs > rhs`.
    ///
    /// Equality yields an encrypted `false`, which is what lets a running
    /// maximum keep its earliest holder on ties.
    fn gt(
        &mut self,
        lhs: &EncryptedU64,
        rhs: &EncryptedU64,
    ) -> Result<EncryptedBool, CoprocessorError>;

    /// Homomorphic ternary over integers: a fresh handle to the value of
    /// `if_true` when `condition` holds, of `if_false` otherwise.
    fn select_u64(
        &mut self,
        condition: &EncryptedBool,
        if_true: &EncryptedU64,
        if_false: &EncryptedU64,
    ) -> Result<EncryptedU64, CoprocessorError>;

    /// Homomorphic ternary over identities.
    fn select_address(
        &mut self,
        condition: &EncryptedBool,
        if_true: &EncryptedAddress,
        if_false: &EncryptedAddress,
    ) -> Result<EncryptedAddress, CoprocessorError>;

    /// Persistently mark `handle` usable by ledger logic in later
    /// transactions. Without this, a handle is only operable inside the
    /// transaction that produced it. Idempotent.
    fn allow_internal(&mut self, handle: Handle) -> Result<(), CoprocessorError>;

    /// Grant `grantee` the right to request decryption of `handle` through
    /// the out-of-band decryption service. Never revoked; idempotent.
    fn allow_decrypt(&mut self, handle: Handle, grantee: Address) -> Result<(), CoprocessorError>;

    /// Irreversibly promote `handle` so any party may request its
    /// decryption. Returns the handle under which the now-public value is
    /// addressed.
    fn make_publicly_decryptable(&mut self, handle: Handle) -> Result<Handle, CoprocessorError>;

    /// Whether `handle` has been promoted to public decryptability.
    fn is_publicly_decryptable(&self, handle: Handle) -> Result<bool, CoprocessorError>;
}
