//! External JSON stores: historical results and aggregate player stats.
//!
//! Both are read-only collaborators keyed off ledger data. Absence is a
//! normal state, not an error: a missing results document means the game is
//! not published yet, a missing stats row means a new player.

use crate::Result;
use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;

/// One winning entry from the results document.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WinnerEntry {
    pub index: u32,
    pub wallet: String,
    pub payout_lamports: u64,
    pub proof: Vec<String>,
}

/// One ticket award from the results document.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TicketAward {
    pub wallet: String,
    pub placed_slot: u64,
    pub amount_lamports: u64,
    pub ticket_count: u32,
}

/// Full results document for one (epoch, tier).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GameResults {
    pub winners: Vec<WinnerEntry>,
    /// Older documents predate ticket awards; absent is fine.
    #[serde(default)]
    pub ticket_awards: Option<Vec<TicketAward>>,
}

impl GameResults {
    pub fn winner_for(&self, wallet: &str) -> Option<&WinnerEntry> {
        self.winners.iter().find(|w| w.wallet == wallet)
    }

    pub fn ticket_award_for(&self, wallet: &str) -> Option<&TicketAward> {
        self.ticket_awards
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|t| t.wallet == wallet)
    }
}

/// Lifetime aggregate counters for one wallet handle.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct PlayerStats {
    pub correct_count: u64,
    pub wrong_count: u64,
    pub current_streak: u64,
    pub best_streak: u64,
    pub total_wagered_lamports: u64,
    pub total_won_lamports: u64,
}

#[derive(Clone)]
pub struct ResultsStoreClient {
    base_url: String,
    http: reqwest::Client,
}

impl ResultsStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Results for one (epoch, tier). `Ok(None)` when not published yet.
    pub async fn game_results(&self, epoch: u64, tier: u8) -> Result<Option<GameResults>> {
        self.fetch_optional(&format!("{}/results/{epoch}/{tier}.json", self.base_url))
            .await
    }

    /// Results at an explicit URI, as carried by the resolved-game record.
    pub async fn game_results_at(&self, uri: &str) -> Result<Option<GameResults>> {
        self.fetch_optional(uri).await
    }

    async fn fetch_optional<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("requesting {url}"))?;
        let value = response
            .json()
            .await
            .with_context(|| format!("decoding {url}"))?;
        Ok(Some(value))
    }
}

#[derive(Clone)]
pub struct StatsStoreClient {
    base_url: String,
    http: reqwest::Client,
}

impl StatsStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Lifetime stats for a wallet handle. `Ok(None)` means new player.
    pub async fn player_stats(&self, wallet: &str) -> Result<Option<PlayerStats>> {
        let url = format!("{}/stats/{wallet}.json", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("requesting {url}"))?;
        Ok(Some(
            response
                .json()
                .await
                .with_context(|| format!("decoding {url}"))?,
        ))
    }
}
