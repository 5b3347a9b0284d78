//! Call message types for the auction ledger.

use borsh::{BorshDeserialize, BorshSerialize};

use auction_coprocessor::{ExternalCiphertext, InputProof};

/// Call messages for the auction ledger.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    /// Create a new auction listing. Bidding opens immediately and closes
    /// `duration` seconds later.
    CreateAuction {
        title: String,
        description: String,
        starting_price: u64,
        duration: u64,
    },

    /// Submit a sealed bid. The proof must bind the ciphertext to this
    /// ledger and to the transaction sender.
    PlaceBid {
        auction_id: u64,
        ciphertext: ExternalCiphertext,
        proof: InputProof,
    },

    /// Close a past-deadline auction and make its result publicly
    /// decryptable. Anyone may call this.
    FinalizeAuction { auction_id: u64 },
}

/// The observable outcome of a successfully applied call.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum CallOutcome {
    /// Id of the auction just created.
    AuctionCreated(u64),

    /// The bid was accepted. Nothing about its rank is revealed.
    BidPlaced,

    /// The auction is now finalized.
    AuctionFinalized,
}
