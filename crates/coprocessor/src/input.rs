//! The external-ciphertext input boundary.
//!
//! Bidders seal values off-ledger and submit the sealed form. Two artifacts
//! cross the boundary together:
//!
//! - [`ExternalCiphertext`]: the sealed payload plus its plaintext type tag
//!   and a fresh nonce,
//! - [`InputProof`]: a binding digest over the destination ledger, the
//!   submitting identity and the ciphertext itself.
//!
//! The coprocessor recomputes the digest on import and rejects any mismatch,
//! so a ciphertext cannot be replayed to another ledger or submitted by
//! anyone but the identity it was sealed for. Real input encryption and
//! proof generation live inside the coprocessor vendor's tooling; the
//! sealing scheme here is a deterministic stand-in with the same binding
//! behavior.

use borsh::{BorshDeserialize, BorshSerialize};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use auction_types::{Address, HandleKind, LedgerId};

use crate::error::CoprocessorError;

/// Domain tag for the input-proof binding digest.
const BINDING_DOMAIN: &[u8] = b"AUCTION_INPUT_BINDING_V1";

/// Domain tag for the sealing keystream.
const PAD_DOMAIN: &[u8] = b"AUCTION_INPUT_PAD_V1";

/// A value sealed outside the ledger, awaiting import.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ExternalCiphertext {
    /// Plaintext type the payload decodes to.
    pub kind: HandleKind,
    /// Per-sealing nonce; keys the pad and randomizes the binding digest.
    pub nonce: [u8; 32],
    /// The sealed bytes.
    pub payload: Vec<u8>,
}

/// Proof that an [`ExternalCiphertext`] was sealed for one specific ledger
/// by one specific submitter.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct InputProof {
    pub digest: [u8; 32],
}

/// Stable one-byte encoding of a plaintext type tag.
pub(crate) fn kind_tag(kind: HandleKind) -> u8 {
    match kind {
        HandleKind::Bool => 0,
        HandleKind::Uint64 => 1,
        HandleKind::Address => 2,
    }
}

/// Compute the digest binding `ciphertext` to `ledger_id` and `submitter`.
///
/// Covers every field of the ciphertext, so tampering with the payload, the
/// nonce or the type tag invalidates the proof along with any change of
/// destination or sender.
pub fn binding_digest(
    ledger_id: &LedgerId,
    submitter: &Address,
    ciphertext: &ExternalCiphertext,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(BINDING_DOMAIN);
    hasher.update(ledger_id.0);
    hasher.update(submitter);
    hasher.update([kind_tag(ciphertext.kind)]);
    hasher.update(ciphertext.nonce);
    hasher.update(&ciphertext.payload);
    hasher.finalize().into()
}

/// Seal a 64-bit value for submission to one ledger by one sender.
///
/// # Arguments
/// * `ledger_id` - The ledger the ciphertext is destined for
/// * `submitter` - The identity that will submit it
/// * `value` - The plaintext to seal
/// * `rng` - Source of the sealing nonce
///
/// # Returns
/// The sealed ciphertext and the proof binding it to `(ledger_id, submitter)`.
pub fn seal_u64<R: RngCore + CryptoRng>(
    ledger_id: &LedgerId,
    submitter: &Address,
    value: u64,
    rng: &mut R,
) -> (ExternalCiphertext, InputProof) {
    let mut nonce = [0u8; 32];
    rng.fill_bytes(&mut nonce);

    let pad = keystream(&nonce);
    let mut payload = value.to_le_bytes().to_vec();
    for (byte, pad_byte) in payload.iter_mut().zip(pad.iter()) {
        *byte ^= pad_byte;
    }

    let ciphertext = ExternalCiphertext {
        kind: HandleKind::Uint64,
        nonce,
        payload,
    };
    let digest = binding_digest(ledger_id, submitter, &ciphertext);

    (ciphertext, InputProof { digest })
}

/// Recover the plaintext from a sealed 64-bit value.
///
/// Only the coprocessor unseals; the result never leaves it except through
/// the decryption service.
pub(crate) fn unseal_u64(ciphertext: &ExternalCiphertext) -> Result<u64, CoprocessorError> {
    if ciphertext.kind != HandleKind::Uint64 {
        return Err(CoprocessorError::TypeMismatch {
            expected: HandleKind::Uint64,
            got: ciphertext.kind,
        });
    }
    if ciphertext.payload.len() != 8 {
        return Err(CoprocessorError::MalformedCiphertext);
    }

    let pad = keystream(&ciphertext.nonce);
    let mut bytes = [0u8; 8];
    for (i, byte) in ciphertext.payload.iter().enumerate() {
        bytes[i] = byte ^ pad[i];
    }
    Ok(u64::from_le_bytes(bytes))
}

fn keystream(nonce: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(PAD_DOMAIN);
    hasher.update(nonce);
    hasher.finalize().into()
}
