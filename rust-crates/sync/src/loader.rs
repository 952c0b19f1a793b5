//! One-shot snapshot loading with bounded retry.
//!
//! A malformed record inside a batch is dropped with a warning and never
//! fails the batch; transient fetch failures retry with capped exponential
//! backoff and a bounded attempt count, after which the caller treats the
//! key as not found.

use crate::{
    Result,
    ledger::{
        LedgerReader,
        PredictionFilter,
    },
};
use anyhow::anyhow;
use fortune_codec::Prediction;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

pub const MAX_TRIES: u32 = 5;
pub const BACKOFF_BASE: Duration = Duration::from_millis(250);
pub const BACKOFF_CAP: Duration = Duration::from_secs(2);

/// Decode a batch of raw prediction buffers, dropping failures.
pub fn decode_batch(raw: Vec<(Pubkey, Vec<u8>)>) -> Vec<(Pubkey, Prediction)> {
    let total = raw.len();
    let decoded: Vec<_> = raw
        .into_iter()
        .filter_map(|(address, data)| match Prediction::decode(&data) {
            Ok(record) => Some((address, record)),
            Err(e) => {
                tracing::warn!(%address, "dropping undecodable prediction: {e}");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        tracing::warn!(
            dropped = total - decoded.len(),
            kept = decoded.len(),
            "snapshot batch contained undecodable records"
        );
    }
    decoded
}

/// Fetch and decode the full prediction set for one (game chain, tier).
pub async fn fetch_snapshot<R: LedgerReader>(
    reader: &R,
    filter: PredictionFilter,
) -> Result<Vec<(Pubkey, Prediction)>> {
    let raw = with_backoff(|| reader.prediction_accounts(filter)).await?;
    Ok(decode_batch(raw))
}

/// Run `op` up to [`MAX_TRIES`] times, doubling the delay from
/// [`BACKOFF_BASE`] up to [`BACKOFF_CAP`] between attempts.
pub async fn with_backoff<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = BACKOFF_BASE;
    let mut last_error = None;
    for attempt in 1..=MAX_TRIES {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(attempt, max = MAX_TRIES, "fetch attempt failed: {e:#}");
                last_error = Some(e);
            }
        }
        if attempt < MAX_TRIES {
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(BACKOFF_CAP);
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("fetch failed with no attempts")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortune_codec::Prediction;
    use std::sync::atomic::{
        AtomicU32,
        Ordering,
    };

    fn valid_record_bytes() -> Vec<u8> {
        Prediction {
            game_epoch: 5,
            epoch: 5,
            player: Pubkey::new_unique(),
            tier: 1,
            prediction_type: 0,
            selection_count: 1,
            selections_mask: 1 << 3,
            selections: [3, 0, 0, 0, 0, 0, 0, 0],
            lamports: 100,
            changed_count: 0,
            placed_slot: 1,
            placed_at_ts: 0,
            last_updated_at_ts: 0,
            has_claimed: 0,
            claimed_at_ts: 0,
            bump: 255,
            version: 2,
            lamports_per_number: 100,
        }
        .encode()
    }

    #[test]
    fn malformed_record_is_isolated_from_the_batch() {
        let mut raw: Vec<(Pubkey, Vec<u8>)> = (0..5)
            .map(|_| (Pubkey::new_unique(), valid_record_bytes()))
            .collect();
        raw[2].1.truncate(40);

        let decoded = decode_batch(raw);
        assert_eq!(decoded.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_terminates_after_max_tries() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = with_backoff(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow!("transient")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_TRIES);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_stops_on_first_success() {
        let attempts = AtomicU32::new(0);
        let result = with_backoff(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(anyhow!("transient"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
