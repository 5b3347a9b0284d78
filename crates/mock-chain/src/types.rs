//! RPC-compatible types for the mock chain.
//!
//! These types are JSON-serializable versions of the ledger types, with
//! fixed-size byte values carried as hex strings.

use auction_coprocessor::{ExternalCiphertext, InputProof};
use auction_ledger::AuctionSummary;
use auction_types::{Address, Auction, AuctionEvent, HandleKind};
use serde::{Deserialize, Serialize};

/// Genesis configuration for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitParams {
    /// Hex-encoded 32-byte deployment identity; random when omitted
    pub ledger_id: Option<String>,
    pub max_title_len: Option<usize>,
    pub max_description_len: Option<usize>,
    pub initial_timestamp: Option<u64>,
}

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionParams {
    pub sender: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starting_price: u64,
    /// Bidding window in seconds
    pub duration: u64,
}

/// Sealed input for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiphertextRpc {
    /// "ebool", "euint64", or "eaddress"
    pub kind: String,
    /// Hex-encoded nonce (32 bytes)
    pub nonce: String,
    /// Hex-encoded padded payload
    pub payload: String,
}

impl CiphertextRpc {
    /// Decode into the coprocessor's input type.
    pub fn decode(&self) -> Option<ExternalCiphertext> {
        Some(ExternalCiphertext {
            kind: parse_kind(&self.kind)?,
            nonce: parse_hex32(&self.nonce)?,
            payload: hex::decode(self.payload.trim_start_matches("0x")).ok()?,
        })
    }
}

/// Input binding proof for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRpc {
    /// Hex-encoded digest (32 bytes)
    pub digest: String,
}

impl ProofRpc {
    pub fn decode(&self) -> Option<InputProof> {
        Some(InputProof {
            digest: parse_hex32(&self.digest)?,
        })
    }
}

/// Parameters for placing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidParams {
    pub sender: String,
    pub auction_id: u64,
    pub ciphertext: CiphertextRpc,
    pub proof: ProofRpc,
}

/// Auction record for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub id: u64,
    pub seller: String,
    pub title: String,
    pub description: String,
    pub starting_price: u64,
    pub end_time: u64,
    pub finalized: bool,
    pub bid_count: u64,
    /// Hex-encoded handle of the confidential running maximum
    pub highest_bid: String,
    /// Hex-encoded handle of the confidential leading bidder
    pub highest_bidder: String,
}

impl From<&Auction> for AuctionRpc {
    fn from(a: &Auction) -> Self {
        Self {
            id: a.id,
            seller: hex::encode(a.seller),
            title: a.title.clone(),
            description: a.description.clone(),
            starting_price: a.starting_price,
            end_time: a.end_time,
            finalized: a.finalized,
            bid_count: a.bid_count,
            highest_bid: a.highest_bid.handle().to_string(),
            highest_bidder: a.highest_bidder.handle().to_string(),
        }
    }
}

/// Auction summary for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSummaryRpc {
    pub auction_id: u64,
    pub seller: String,
    pub title: String,
    pub starting_price: u64,
    pub end_time: u64,
    /// "active", "awaiting_finalization", or "finalized"
    pub phase: String,
    pub bid_count: u64,
}

impl From<&AuctionSummary> for AuctionSummaryRpc {
    fn from(s: &AuctionSummary) -> Self {
        Self {
            auction_id: s.auction_id,
            seller: hex::encode(s.seller),
            title: s.title.clone(),
            starting_price: s.starting_price,
            end_time: s.end_time,
            phase: s.phase.to_string(),
            bid_count: s.bid_count,
        }
    }
}

/// Notification log entry for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuctionEventRpc {
    AuctionCreated {
        id: u64,
        seller: String,
        title: String,
        starting_price: u64,
        end_time: u64,
    },
    BidPlaced {
        id: u64,
        bidder: String,
    },
    AuctionFinalized {
        id: u64,
    },
}

impl From<&AuctionEvent> for AuctionEventRpc {
    fn from(event: &AuctionEvent) -> Self {
        match event {
            AuctionEvent::AuctionCreated {
                id,
                seller,
                title,
                starting_price,
                end_time,
            } => AuctionEventRpc::AuctionCreated {
                id: *id,
                seller: hex::encode(seller),
                title: title.clone(),
                starting_price: *starting_price,
                end_time: *end_time,
            },
            AuctionEvent::BidPlaced { id, bidder } => AuctionEventRpc::BidPlaced {
                id: *id,
                bidder: hex::encode(bidder),
            },
            AuctionEvent::AuctionFinalized { id } => {
                AuctionEventRpc::AuctionFinalized { id: *id }
            }
        }
    }
}

/// Parse a hex address, zero-padded on the right to 32 bytes.
///
/// Lenient so test identities can be short hex like "01". The client
/// parses senders the same way, so sealed proofs bind to the same bytes.
pub fn parse_address(s: &str) -> Address {
    let mut addr = [0u8; 32];
    if let Ok(bytes) = hex::decode(s.trim_start_matches("0x")) {
        let len = bytes.len().min(32);
        addr[..len].copy_from_slice(&bytes[..len]);
    }
    addr
}

/// Parse exactly 32 bytes of hex.
pub fn parse_hex32(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
    bytes.try_into().ok()
}

/// Parse a handle-kind tag as carried on the wire.
pub fn parse_kind(s: &str) -> Option<HandleKind> {
    match s {
        "ebool" => Some(HandleKind::Bool),
        "euint64" => Some(HandleKind::Uint64),
        "eaddress" => Some(HandleKind::Address),
        _ => None,
    }
}
