//! Error types for coprocessor operations.

use thiserror::Error;

use auction_types::{Handle, HandleKind};

/// Errors that can occur during coprocessor operations.
///
/// All failures are fail-closed: a rejected call mints no handle and records
/// no grant.
#[derive(Debug, Error)]
pub enum CoprocessorError {
    #[error("Unknown ciphertext handle: {0}")]
    UnknownHandle(Handle),

    #[error("Handle type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: HandleKind,
        got: HandleKind,
    },

    #[error("Input proof does not bind this ciphertext to this ledger and submitter")]
    InvalidInputProof,

    #[error("Malformed external ciphertext")]
    MalformedCiphertext,

    #[error("Handle not usable in this transaction: {0}")]
    HandleNotUsable(Handle),

    #[error("Decryption not authorized for handle {0}")]
    DecryptNotAuthorized(Handle),
}
