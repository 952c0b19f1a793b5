//! Resolved-game watch: push + poll hybrid that stops at finality.
//!
//! Started once per epoch when the clock hits zero. An address subscription
//! and an interval poll run concurrently; either firing triggers a fetch,
//! guarded by an in-flight flag so overlapping triggers are dropped rather
//! than queued. The watch survives every fetch or decode failure; it only
//! ends on terminal status or cancellation.

use crate::{
    Result,
    ledger::LedgerReader,
};
use fortune_codec::{
    ResolvedGame,
    pda,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    sync::{
        Arc,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
    time::Duration,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to a running watch. The receiver yields the latest decoded record;
/// `None` until the first successful fetch.
pub struct FinaleWatch {
    pub updates: watch::Receiver<Option<ResolvedGame>>,
    cancel: CancellationToken,
}

impl FinaleWatch {
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FinaleWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Fetch the resolved-game record once. Decode failure on a directly
/// requested address is indistinguishable from "not there yet", so both
/// report as `None`.
pub async fn fetch_resolved_game<R: LedgerReader>(
    reader: &R,
    address: &Pubkey,
) -> Result<Option<ResolvedGame>> {
    let Some(data) = reader.account_data(address).await? else {
        return Ok(None);
    };
    match ResolvedGame::decode(&data) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::debug!(%address, "resolved game not decodable yet: {e}");
            Ok(None)
        }
    }
}

/// Start watching the resolved-game record for (epoch, tier).
pub fn watch_finale<R: LedgerReader + 'static>(
    reader: Arc<R>,
    program_id: Pubkey,
    epoch: u64,
    tier: u8,
) -> FinaleWatch {
    let (sender, updates) = watch::channel(None);
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let (address, _) = pda::resolved_game(&program_id, epoch, tier);

    tokio::spawn(async move {
        run_watch(reader, address, epoch, tier, sender, task_cancel).await;
    });

    FinaleWatch { updates, cancel }
}

async fn run_watch<R: LedgerReader>(
    reader: Arc<R>,
    address: Pubkey,
    epoch: u64,
    tier: u8,
    sender: watch::Sender<Option<ResolvedGame>>,
    cancel: CancellationToken,
) {
    let in_flight = AtomicBool::new(false);
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // The push channel is best-effort; the poll keeps the watch making
    // progress if it never opens.
    let mut push = match reader.subscribe_account(&address).await {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!(%address, "finale subscription failed, polling only: {e:#}");
            None
        }
    };

    loop {
        let triggered = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = poll.tick() => true,
            update = next_push(&mut push) => update,
        };
        if !triggered {
            continue;
        }

        // One fetch in flight at a time; a trigger arriving mid-fetch is
        // dropped and the next tick retries.
        if in_flight.swap(true, Ordering::SeqCst) {
            continue;
        }
        let outcome = fetch_resolved_game(reader.as_ref(), &address).await;
        in_flight.store(false, Ordering::SeqCst);

        match outcome {
            Ok(Some(record)) => {
                let is_final = record.is_final();
                sender.send_replace(Some(record));
                if is_final {
                    tracing::info!(epoch, tier, "game resolved, finale watch done");
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(epoch, tier, "resolved game not available yet");
            }
            Err(e) => {
                // Swallowed; the next trigger retries.
                tracing::warn!(epoch, tier, "finale fetch failed: {e:#}");
            }
        }
    }

    if let Some(push) = push {
        push.stop();
    }
}

/// Wait for the next push event; a missing or closed channel never wakes, so
/// the poll arm owns the cadence in that case.
async fn next_push(push: &mut Option<crate::ledger::AccountStream>) -> bool {
    match push {
        Some(stream) => match stream.next().await {
            Some(_) => true,
            None => {
                // Channel closed; fall back to polling alone.
                *push = None;
                false
            }
        },
        None => std::future::pending().await,
    }
}
