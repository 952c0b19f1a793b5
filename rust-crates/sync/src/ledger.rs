//! Read seam over the ledger client.
//!
//! The sync layer only needs four read primitives: a filtered batch account
//! query, a single-address fetch, push subscriptions (per address and per
//! program filter), and slot/epoch timing data. [`LedgerReader`] captures
//! exactly those, so the services stay testable against fakes and the RPC
//! plumbing stays in one place.

use crate::Result;
use anyhow::Context;
use fortune_codec::Prediction;
use futures::StreamExt;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::{
        pubsub_client::PubsubClient,
        rpc_client::RpcClient,
    },
    rpc_config::{
        RpcAccountInfoConfig,
        RpcProgramAccountsConfig,
    },
    rpc_filter::{
        Memcmp,
        RpcFilterType,
    },
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
};
use std::{
    future::Future,
    sync::Arc,
    time::Duration,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Filter for the prediction table scan: one (game chain, tier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredictionFilter {
    pub game_epoch: u64,
    pub tier: u8,
}

/// Slot bounds of the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochBounds {
    pub epoch: u64,
    pub start_slot: u64,
    pub slots_in_epoch: u64,
}

/// A raw account update pushed from the ledger.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub address: Pubkey,
    pub data: Vec<u8>,
}

/// Handle to an open push channel. Updates arrive on `events`; `stop` is
/// idempotent and safe to call before the channel has finished opening.
pub struct AccountStream {
    events: mpsc::Receiver<AccountUpdate>,
    cancel: CancellationToken,
}

impl AccountStream {
    pub fn new(events: mpsc::Receiver<AccountUpdate>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    pub async fn next(&mut self) -> Option<AccountUpdate> {
        self.events.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Detached stop handle, usable after the stream itself has been moved
    /// into a consumer task.
    pub fn stopper(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for AccountStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub trait LedgerReader: Send + Sync {
    /// Filtered batch query for prediction accounts of one (game chain,
    /// tier). Returns raw buffers; decoding is the caller's concern.
    fn prediction_accounts(
        &self,
        filter: PredictionFilter,
    ) -> impl Future<Output = Result<Vec<(Pubkey, Vec<u8>)>>> + Send;

    /// Single-address fetch. `Ok(None)` when the address holds no data.
    fn account_data(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Push channel over the same predicate as [`Self::prediction_accounts`].
    fn subscribe_predictions(
        &self,
        filter: PredictionFilter,
    ) -> impl Future<Output = Result<AccountStream>> + Send;

    /// Push channel for a single address.
    fn subscribe_account(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<AccountStream>> + Send;

    fn current_slot(&self) -> impl Future<Output = Result<u64>> + Send;

    fn epoch_bounds(&self) -> impl Future<Output = Result<EpochBounds>> + Send;

    /// Mean seconds per slot from recent network performance samples, if any
    /// usable sample exists.
    fn recent_slot_time(&self) -> impl Future<Output = Result<Option<f64>>> + Send;
}

/// RPC-backed reader: HTTP for queries, websocket for push channels.
pub struct RpcLedgerReader {
    program_id: Pubkey,
    rpc: Arc<RpcClient>,
    ws_url: String,
    commitment: CommitmentConfig,
}

impl RpcLedgerReader {
    pub fn new(program_id: Pubkey, rpc_url: String, ws_url: String) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self {
            program_id,
            rpc: Arc::new(RpcClient::new_with_timeout_and_commitment(
                rpc_url,
                Duration::from_secs(30),
                commitment,
            )),
            ws_url,
            commitment,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn prediction_filters(&self, filter: PredictionFilter) -> Vec<RpcFilterType> {
        vec![
            RpcFilterType::DataSize((8 + Prediction::SIZE) as u64),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                Prediction::GAME_EPOCH_OFFSET,
                filter.game_epoch.to_le_bytes().to_vec(),
            )),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                Prediction::TIER_OFFSET,
                vec![filter.tier],
            )),
        ]
    }

    fn account_config(&self) -> RpcAccountInfoConfig {
        RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            data_slice: None,
            commitment: Some(self.commitment),
            min_context_slot: None,
        }
    }
}

impl LedgerReader for RpcLedgerReader {
    async fn prediction_accounts(
        &self,
        filter: PredictionFilter,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(self.prediction_filters(filter)),
            account_config: self.account_config(),
            with_context: None,
            sort_results: None,
        };
        let accounts = self
            .rpc
            .get_program_accounts_with_config(&self.program_id, config)
            .await
            .context("prediction account scan")?;
        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, account.data))
            .collect())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .with_context(|| format!("fetching account {address}"))?;
        Ok(response.value.map(|account| account.data))
    }

    async fn subscribe_predictions(&self, filter: PredictionFilter) -> Result<AccountStream> {
        let config = RpcProgramAccountsConfig {
            filters: Some(self.prediction_filters(filter)),
            account_config: self.account_config(),
            with_context: None,
            sort_results: None,
        };
        let ws_url = self.ws_url.clone();
        let program_id = self.program_id;
        let (sender, receiver) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let child = cancel.clone();

        tokio::spawn(async move {
            let client = match PubsubClient::new(&ws_url).await {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!("prediction subscription connect failed: {e:?}");
                    return;
                }
            };
            let (mut stream, unsubscribe) =
                match client.program_subscribe(&program_id, Some(config)).await {
                    Ok(sub) => sub,
                    Err(e) => {
                        tracing::warn!("prediction subscribe failed: {e:?}");
                        return;
                    }
                };
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    update = stream.next() => {
                        let Some(update) = update else { break };
                        let address = match update.value.pubkey.parse::<Pubkey>() {
                            Ok(address) => address,
                            Err(e) => {
                                tracing::warn!("unparseable pushed address: {e:?}");
                                continue;
                            }
                        };
                        let Some(data) = update.value.account.data.decode() else {
                            tracing::warn!(%address, "undecodable pushed account payload");
                            continue;
                        };
                        if sender.send(AccountUpdate { address, data }).await.is_err() {
                            break;
                        }
                    }
                }
            }
            unsubscribe().await;
        });

        Ok(AccountStream::new(receiver, cancel))
    }

    async fn subscribe_account(&self, address: &Pubkey) -> Result<AccountStream> {
        let ws_url = self.ws_url.clone();
        let address = *address;
        let config = self.account_config();
        let (sender, receiver) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let child = cancel.clone();

        tokio::spawn(async move {
            let client = match PubsubClient::new(&ws_url).await {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(%address, "account subscription connect failed: {e:?}");
                    return;
                }
            };
            let (mut stream, unsubscribe) =
                match client.account_subscribe(&address, Some(config)).await {
                    Ok(sub) => sub,
                    Err(e) => {
                        tracing::warn!(%address, "account subscribe failed: {e:?}");
                        return;
                    }
                };
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    update = stream.next() => {
                        let Some(update) = update else { break };
                        let Some(data) = update.value.data.decode() else {
                            tracing::warn!(%address, "undecodable pushed account payload");
                            continue;
                        };
                        if sender.send(AccountUpdate { address, data }).await.is_err() {
                            break;
                        }
                    }
                }
            }
            unsubscribe().await;
        });

        Ok(AccountStream::new(receiver, cancel))
    }

    async fn current_slot(&self) -> Result<u64> {
        self.rpc.get_slot().await.context("fetching current slot")
    }

    async fn epoch_bounds(&self) -> Result<EpochBounds> {
        let info = self.rpc.get_epoch_info().await.context("fetching epoch info")?;
        Ok(EpochBounds {
            epoch: info.epoch,
            start_slot: info.absolute_slot - info.slot_index,
            slots_in_epoch: info.slots_in_epoch,
        })
    }

    async fn recent_slot_time(&self) -> Result<Option<f64>> {
        let samples = self
            .rpc
            .get_recent_performance_samples(Some(6))
            .await
            .context("fetching performance samples")?;
        let mut slots: u64 = 0;
        let mut seconds: u64 = 0;
        for sample in samples {
            slots += sample.num_slots;
            seconds += u64::from(sample.sample_period_secs);
        }
        if slots == 0 || seconds == 0 {
            return Ok(None);
        }
        Ok(Some(seconds as f64 / slots as f64))
    }
}
