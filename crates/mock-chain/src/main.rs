//! Mock chain server for local testing of the confidential auction ledger.
//!
//! This provides a JSON-RPC server that simulates a serialized host chain:
//! every call runs to completion against one in-memory ledger and an
//! in-process coprocessor before the next call is admitted. It also exposes
//! the coprocessor's decryption service as `oracle_*` methods, which in a
//! real deployment would live outside the chain entirely.

use anyhow::Result;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use auction_coprocessor::MockCoprocessor;
use auction_ledger::{
    apply_call, queries, AuctionCall, AuctionError, CallContext, CallOutcome, LedgerConfig,
    LedgerState,
};
use auction_types::{EncryptedAddress, EncryptedU64, Handle, LedgerId};

mod types;
use types::*;

/// Shared chain state.
struct ChainState {
    /// Ledger module state
    ledger: LedgerState,
    /// In-process stand-in for the external coprocessor
    coprocessor: MockCoprocessor,
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
}

impl ChainState {
    fn new() -> Self {
        let mut id = [0u8; 32];
        OsRng.fill_bytes(&mut id);
        Self {
            ledger: LedgerState::new(LedgerConfig::with_ledger_id(LedgerId(id))),
            coprocessor: MockCoprocessor::new(),
            block_height: 0,
            timestamp: 0,
        }
    }

    fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp += 12; // ~12 second blocks
    }

    fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    fn context(&self, sender: &str) -> CallContext {
        CallContext {
            sender: parse_address(sender),
            block_height: self.block_height,
            timestamp: self.timestamp,
        }
    }

    /// Run one call against the ledger, then close the coprocessor's
    /// transaction scope so transient handles expire whether or not the
    /// call succeeded.
    fn apply(&mut self, sender: &str, call: AuctionCall) -> Result<CallOutcome, AuctionError> {
        let ctx = self.context(sender);
        let outcome = apply_call(&mut self.ledger, &mut self.coprocessor, &ctx, call);
        self.coprocessor.next_transaction();
        outcome
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Reset the chain with genesis config.
    #[method(name = "admin_init")]
    async fn admin_init(&self, params: InitParams) -> Result<bool, ErrorObjectOwned>;

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Create a new auction.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned>;

    /// Submit a sealed bid.
    #[method(name = "auction_placeBid")]
    async fn auction_place_bid(&self, params: PlaceBidParams) -> Result<bool, ErrorObjectOwned>;

    /// Finalize a past-deadline auction. Any sender may call this.
    #[method(name = "auction_finalize")]
    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<bool, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get the deployment identity sealed bids must bind to.
    #[method(name = "chain_getLedgerId")]
    async fn chain_get_ledger_id(&self) -> Result<String, ErrorObjectOwned>;

    /// Get auction by ID.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(&self, auction_id: u64) -> Result<AuctionRpc, ErrorObjectOwned>;

    /// Get the handle of an auction's confidential running maximum.
    #[method(name = "query_getEncryptedHighestBid")]
    async fn query_get_encrypted_highest_bid(
        &self,
        auction_id: u64,
    ) -> Result<String, ErrorObjectOwned>;

    /// Get the handle of an auction's confidential leading bidder.
    #[method(name = "query_getEncryptedHighestBidder")]
    async fn query_get_encrypted_highest_bidder(
        &self,
        auction_id: u64,
    ) -> Result<String, ErrorObjectOwned>;

    /// Whether an auction's result is publicly decryptable.
    #[method(name = "query_isResultPublic")]
    async fn query_is_result_public(&self, auction_id: u64) -> Result<bool, ErrorObjectOwned>;

    /// Get the lifetime auction count.
    #[method(name = "query_getAuctionCount")]
    async fn query_get_auction_count(&self) -> Result<u64, ErrorObjectOwned>;

    /// List auctions ordered by id.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// List auctions currently accepting bids.
    #[method(name = "query_listActiveAuctions")]
    async fn query_list_active_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned>;

    /// Get the notification log, optionally restricted to one auction.
    #[method(name = "query_getEvents")]
    async fn query_get_events(
        &self,
        auction_id: Option<u64>,
    ) -> Result<Vec<AuctionEventRpc>, ErrorObjectOwned>;

    // ============ Decryption Service ============

    /// Decrypt an integer handle on behalf of a requester.
    #[method(name = "oracle_decryptValue")]
    async fn oracle_decrypt_value(
        &self,
        handle: String,
        requester: String,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Decrypt an identity handle on behalf of a requester.
    #[method(name = "oracle_decryptIdentity")]
    async fn oracle_decrypt_identity(
        &self,
        handle: String,
        requester: String,
    ) -> Result<String, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new())),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn parse_handle(s: &str) -> Result<Handle, ErrorObjectOwned> {
        parse_hex32(s)
            .map(Handle)
            .ok_or_else(|| Self::rpc_error("Handle must be 32 bytes of hex"))
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_init(&self, params: InitParams) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();

        let ledger_id = match &params.ledger_id {
            Some(s) => LedgerId(
                parse_hex32(s)
                    .ok_or_else(|| Self::rpc_error("Ledger id must be 32 bytes of hex"))?,
            ),
            None => {
                let mut id = [0u8; 32];
                OsRng.fill_bytes(&mut id);
                LedgerId(id)
            }
        };

        let mut config = LedgerConfig::with_ledger_id(ledger_id);
        if let Some(max) = params.max_title_len {
            config.max_title_len = max;
        }
        if let Some(max) = params.max_description_len {
            config.max_description_len = max;
        }
        config
            .validate()
            .map_err(|e| Self::rpc_error(&format!("Invalid config: {}", e)))?;

        state.ledger = LedgerState::new(config);
        state.coprocessor = MockCoprocessor::new();
        state.block_height = 0;
        state.timestamp = params.initial_timestamp.unwrap_or(0);

        info!(
            "Chain initialized with ledger id {}",
            state.ledger.config.ledger_id
        );
        Ok(true)
    }

    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.set_timestamp(timestamp);
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned> {
        let mut state = self.state.write();

        let outcome = state
            .apply(
                &params.sender,
                AuctionCall::CreateAuction {
                    title: params.title,
                    description: params.description,
                    starting_price: params.starting_price,
                    duration: params.duration,
                },
            )
            .map_err(|e| Self::rpc_error(&format!("Failed to create auction: {}", e)))?;

        let auction_id = match outcome {
            CallOutcome::AuctionCreated(id) => id,
            _ => return Err(Self::rpc_error("Unexpected call outcome")),
        };

        info!("Created auction {}", auction_id);
        Ok(auction_id)
    }

    async fn auction_place_bid(&self, params: PlaceBidParams) -> Result<bool, ErrorObjectOwned> {
        let ciphertext = params
            .ciphertext
            .decode()
            .ok_or_else(|| Self::rpc_error("Malformed ciphertext"))?;
        let proof = params
            .proof
            .decode()
            .ok_or_else(|| Self::rpc_error("Malformed proof"))?;

        let mut state = self.state.write();
        state
            .apply(
                &params.sender,
                AuctionCall::PlaceBid {
                    auction_id: params.auction_id,
                    ciphertext,
                    proof,
                },
            )
            .map_err(|e| Self::rpc_error(&format!("Failed to place bid: {}", e)))?;

        info!(
            "Bid accepted for auction {} from {}",
            params.auction_id, params.sender
        );
        Ok(true)
    }

    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state
            .apply(&sender, AuctionCall::FinalizeAuction { auction_id })
            .map_err(|e| Self::rpc_error(&format!("Failed to finalize: {}", e)))?;

        info!("Auction {} finalized", auction_id);
        Ok(true)
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn chain_get_ledger_id(&self) -> Result<String, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.ledger.config.ledger_id.to_string())
    }

    async fn query_get_auction(&self, auction_id: u64) -> Result<AuctionRpc, ErrorObjectOwned> {
        let state = self.state.read();
        queries::get_auction(&state.ledger, auction_id)
            .map(AuctionRpc::from)
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_get_encrypted_highest_bid(
        &self,
        auction_id: u64,
    ) -> Result<String, ErrorObjectOwned> {
        let state = self.state.read();
        queries::get_encrypted_highest_bid(&state.ledger, auction_id)
            .map(|value| value.handle().to_string())
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_get_encrypted_highest_bidder(
        &self,
        auction_id: u64,
    ) -> Result<String, ErrorObjectOwned> {
        let state = self.state.read();
        queries::get_encrypted_highest_bidder(&state.ledger, auction_id)
            .map(|value| value.handle().to_string())
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_is_result_public(&self, auction_id: u64) -> Result<bool, ErrorObjectOwned> {
        let state = self.state.read();
        queries::is_result_public(&state.ledger, &state.coprocessor, auction_id)
            .map_err(|e| Self::rpc_error(&e.to_string()))
    }

    async fn query_get_auction_count(&self) -> Result<u64, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_auction_count(&state.ledger))
    }

    async fn query_list_auctions(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        let summaries = queries::get_auction_summaries(
            &state.ledger,
            state.timestamp,
            offset as usize,
            limit as usize,
        );
        Ok(summaries.iter().map(AuctionSummaryRpc::from).collect())
    }

    async fn query_list_active_auctions(&self) -> Result<Vec<AuctionSummaryRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        let summaries = queries::get_active_auctions(&state.ledger, state.timestamp);
        Ok(summaries.iter().map(AuctionSummaryRpc::from).collect())
    }

    async fn query_get_events(
        &self,
        auction_id: Option<u64>,
    ) -> Result<Vec<AuctionEventRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_events(&state.ledger, auction_id)
            .iter()
            .map(AuctionEventRpc::from)
            .collect())
    }

    async fn oracle_decrypt_value(
        &self,
        handle: String,
        requester: String,
    ) -> Result<u64, ErrorObjectOwned> {
        let handle = Self::parse_handle(&handle)?;
        let requester = parse_address(&requester);
        let state = self.state.read();
        state
            .coprocessor
            .decrypt_u64(&EncryptedU64::new(handle), &requester)
            .map_err(|e| Self::rpc_error(&format!("Decryption refused: {}", e)))
    }

    async fn oracle_decrypt_identity(
        &self,
        handle: String,
        requester: String,
    ) -> Result<String, ErrorObjectOwned> {
        let handle = Self::parse_handle(&handle)?;
        let requester = parse_address(&requester);
        let state = self.state.read();
        state
            .coprocessor
            .decrypt_address(&EncryptedAddress::new(handle), &requester)
            .map(hex::encode)
            .map_err(|e| Self::rpc_error(&format!("Decryption refused: {}", e)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("auction_ledger=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let addr: SocketAddr = "127.0.0.1:9944".parse()?;

    info!("Starting mock chain server on {}", addr);

    let server = Server::builder().build(addr).await?;
    let handle = server.start(MockChainServer::new().into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
