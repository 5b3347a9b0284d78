//! CLI for interacting with the confidential auction ledger.
//!
//! This binary provides commands for:
//! - Creating auctions
//! - Sealing and submitting bids
//! - Querying auction state and the notification log
//! - Finalizing auctions and revealing results through the decryption
//!   service

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use auction_client::seal_bid;
use auction_types::{Address, LedgerId, ZERO_ADDRESS};

#[derive(Parser)]
#[command(name = "auction-cli")]
#[command(about = "CLI for confidential sealed-bid auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new auction
    CreateAuction {
        /// Seller address (hex)
        #[arg(long)]
        sender: String,

        /// Listing title
        #[arg(long)]
        title: String,

        /// Listing description
        #[arg(long, default_value = "")]
        description: String,

        /// Minimum price; also the initial value of the hidden maximum
        #[arg(long)]
        starting_price: u64,

        /// Bidding window in seconds from now
        #[arg(long)]
        duration: u64,
    },

    /// Seal a bid locally and submit it
    Bid {
        /// Bidder address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Bid amount (sealed before it leaves this process)
        #[arg(long)]
        amount: u64,
    },

    /// Get auction details
    GetAuction {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// List auctions
    ListAuctions {
        /// Only auctions currently accepting bids
        #[arg(long)]
        active: bool,
    },

    /// Get the lifetime auction count
    Count,

    /// Finalize a past-deadline auction (anyone may do this)
    Finalize {
        /// Caller address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Decrypt an auction result through the decryption service
    Reveal {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Identity requesting decryption (hex)
        #[arg(long)]
        requester: String,
    },

    /// Show the notification log
    Events {
        /// Restrict to one auction
        #[arg(long)]
        auction_id: Option<u64>,
    },

    /// Advance chain time (for testing)
    AdvanceBlock,

    /// Set chain timestamp (for testing)
    SetTimestamp {
        /// Unix timestamp to set
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionRpc {
    id: u64,
    seller: String,
    title: String,
    description: String,
    starting_price: u64,
    end_time: u64,
    finalized: bool,
    bid_count: u64,
    highest_bid: String,
    highest_bidder: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuctionSummaryRpc {
    auction_id: u64,
    seller: String,
    title: String,
    starting_price: u64,
    end_time: u64,
    phase: String,
    bid_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockInfo {
    height: u64,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
enum AuctionEventRpc {
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

async fn create_auction_cmd(client: &HttpClient, params: serde_json::Value) -> Result<()> {
    let auction_id: u64 = client.request("auction_create", rpc_params![params]).await?;
    info!("Created auction with ID: {}", auction_id);
    println!("Auction ID: {}", auction_id);
    Ok(())
}

async fn bid_cmd(client: &HttpClient, sender: &str, auction_id: u64, amount: u64) -> Result<()> {
    let bidder = parse_address(sender);

    // The proof must bind to this deployment, so fetch its identity first
    let ledger_hex: String = client.request("chain_getLedgerId", rpc_params![]).await?;
    let ledger_id = LedgerId(decode_hex32(&ledger_hex)?);

    // Seal locally; the plaintext amount never leaves this process
    let prepared = seal_bid(&ledger_id, &bidder, amount, &mut OsRng);

    let params = serde_json::json!({
        "sender": sender,
        "auction_id": auction_id,
        "ciphertext": {
            "kind": "euint64",
            "nonce": hex::encode(prepared.ciphertext.nonce),
            "payload": hex::encode(&prepared.ciphertext.payload),
        },
        "proof": {
            "digest": hex::encode(prepared.proof.digest),
        },
    });

    let _accepted: bool = client.request("auction_placeBid", rpc_params![params]).await?;

    info!("Bid submitted for auction {}", auction_id);
    println!("Bid submitted");
    println!("  Auction ID: {}", auction_id);
    println!("  Amount: {} (sealed)", amount);
    Ok(())
}

async fn get_auction_cmd(client: &HttpClient, auction_id: u64) -> Result<()> {
    let auction: AuctionRpc = client
        .request("query_getAuction", rpc_params![auction_id])
        .await?;

    println!("Auction {}:", auction.id);
    println!("  Title: {}", auction.title);
    if !auction.description.is_empty() {
        println!("  Description: {}", auction.description);
    }
    println!("  Seller: {}", auction.seller);
    println!("  Starting price: {}", auction.starting_price);
    println!("  Ends at: {}", auction.end_time);
    println!("  Finalized: {}", auction.finalized);
    println!("  Bids: {}", auction.bid_count);
    println!("  Highest bid handle: {}", auction.highest_bid);
    println!("  Highest bidder handle: {}", auction.highest_bidder);
    Ok(())
}

async fn list_auctions_cmd(client: &HttpClient, active: bool) -> Result<()> {
    let auctions: Vec<AuctionSummaryRpc> = if active {
        client
            .request("query_listActiveAuctions", rpc_params![])
            .await?
    } else {
        client
            .request("query_listAuctions", rpc_params![0u64, 100u64])
            .await?
    };

    if auctions.is_empty() {
        println!("No auctions found");
    } else {
        println!("Auctions:");
        for a in auctions {
            println!(
                "  [{}] {} - {} (bids: {}, ends {})",
                a.auction_id, a.title, a.phase, a.bid_count, a.end_time
            );
        }
    }
    Ok(())
}

async fn finalize_cmd(client: &HttpClient, sender: &str, auction_id: u64) -> Result<()> {
    let _done: bool = client
        .request("auction_finalize", rpc_params![sender, auction_id])
        .await?;
    println!("Auction {} finalized; result is now publicly decryptable", auction_id);
    Ok(())
}

async fn reveal_cmd(client: &HttpClient, auction_id: u64, requester: &str) -> Result<()> {
    let bid_handle: String = client
        .request("query_getEncryptedHighestBid", rpc_params![auction_id])
        .await?;
    let bidder_handle: String = client
        .request("query_getEncryptedHighestBidder", rpc_params![auction_id])
        .await?;
    let public: bool = client
        .request("query_isResultPublic", rpc_params![auction_id])
        .await?;

    // Out-of-band decryption; fails unless the requester is authorized
    let price: u64 = client
        .request("oracle_decryptValue", rpc_params![bid_handle, requester])
        .await?;
    let winner: String = client
        .request("oracle_decryptIdentity", rpc_params![bidder_handle, requester])
        .await?;

    let view = if public { "public" } else { "granted view" };
    println!("Auction {} result ({}):", auction_id, view);
    println!("  Winning price: {}", price);
    if winner == hex::encode(ZERO_ADDRESS) {
        println!("  Winner: none (no bid beat the starting price)");
    } else {
        println!("  Winner: {}", winner);
    }
    Ok(())
}

async fn events_cmd(client: &HttpClient, auction_id: Option<u64>) -> Result<()> {
    let events: Vec<AuctionEventRpc> = match auction_id {
        Some(id) => client.request("query_getEvents", rpc_params![id]).await?,
        None => client.request("query_getEvents", rpc_params![]).await?,
    };

    if events.is_empty() {
        println!("No events");
        return Ok(());
    }
    for event in events {
        match event {
            AuctionEventRpc::AuctionCreated {
                id,
                seller,
                title,
                starting_price,
                end_time,
            } => println!(
                "[{}] created \"{}\" by {} (starting price {}, ends {})",
                id, title, seller, starting_price, end_time
            ),
            AuctionEventRpc::BidPlaced { id, bidder } => {
                println!("[{}] bid placed by {}", id, bidder)
            }
            AuctionEventRpc::AuctionFinalized { id } => println!("[{}] finalized", id),
        }
    }
    Ok(())
}

/// Parse a hex address, zero-padded on the right. Must match the mock
/// chain's parsing so locally sealed proofs bind to the same identity.
fn parse_address(s: &str) -> Address {
    let mut addr = [0u8; 32];
    if let Ok(bytes) = hex::decode(s.trim_start_matches("0x")) {
        let len = bytes.len().min(32);
        addr[..len].copy_from_slice(&bytes[..len]);
    }
    addr
}

fn decode_hex32(s: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("Expected 32 bytes of hex"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::CreateAuction {
            sender,
            title,
            description,
            starting_price,
            duration,
        } => {
            let params = serde_json::json!({
                "sender": sender,
                "title": title,
                "description": description,
                "starting_price": starting_price,
                "duration": duration,
            });
            create_auction_cmd(&client, params).await?;
        }

        Commands::Bid {
            sender,
            auction_id,
            amount,
        } => {
            bid_cmd(&client, &sender, auction_id, amount).await?;
        }

        Commands::GetAuction { auction_id } => {
            get_auction_cmd(&client, auction_id).await?;
        }

        Commands::ListAuctions { active } => {
            list_auctions_cmd(&client, active).await?;
        }

        Commands::Count => {
            let count: u64 = client.request("query_getAuctionCount", rpc_params![]).await?;
            println!("Auctions created: {}", count);
        }

        Commands::Finalize { sender, auction_id } => {
            finalize_cmd(&client, &sender, auction_id).await?;
        }

        Commands::Reveal {
            auction_id,
            requester,
        } => {
            reveal_cmd(&client, auction_id, &requester).await?;
        }

        Commands::Events { auction_id } => {
            events_cmd(&client, auction_id).await?;
        }

        Commands::AdvanceBlock => {
            let block: BlockInfo = client.request("admin_advanceBlock", rpc_params![]).await?;
            println!(
                "Block advanced: height={}, timestamp={}",
                block.height, block.timestamp
            );
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client
                .request("admin_setTimestamp", rpc_params![timestamp])
                .await?;
            println!("Timestamp set to {}", timestamp);
        }
    }

    Ok(())
}
