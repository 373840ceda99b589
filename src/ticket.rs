//! Ticket status lookups against a Trac JSON-RPC endpoint.

mod client;

use futures::future::join_all;
use log::{error, info};

pub use client::{TicketClient, TicketStatus};

use crate::error::Result;

/// Looks up every ticket concurrently. Results keep the order of `ids`.
pub async fn fetch_statuses(
    client: &TicketClient,
    ids: &[String],
) -> Vec<(String, Result<TicketStatus>)> {
    info!("Fetching status for {} tickets", ids.len());

    let lookups = ids.iter().map(|id| client.fetch_status(id));
    let results = join_all(lookups).await;

    ids.iter().cloned().zip(results).collect()
}

/// Prints `<id>, <status>` per ticket. Returns how many lookups failed.
pub async fn print_statuses(client: &TicketClient, ids: &[String]) -> usize {
    let mut failures = 0;

    for (id, result) in fetch_statuses(client, ids).await {
        match result {
            Ok(status) => println!("{status}"),
            Err(e) => {
                error!("Ticket {id}: {e}");
                failures += 1;
            }
        }
    }

    failures
}
