//! Reconciliation cache: the single source of truth for prediction records.
//!
//! Keyed by (game chain, tier). Each key holds two maps, record address to
//! decoded prediction and wallet to record address, so "does wallet W have a
//! prediction here" is O(1). Every mutation replaces the map `Arc`s
//! wholesale, so a reader holding a snapshot never observes a partially
//! applied update.

use fortune_codec::Prediction;
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};

/// Cache key: one game chain on one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameKey {
    pub game_epoch: u64,
    pub tier: u8,
}

/// Per-key hydration state. There is no automatic `Error -> Loading` retry;
/// callers re-trigger by re-entering the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hydration {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Immutable view of one key's records, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct PredictionBook {
    by_address: Arc<HashMap<Pubkey, Prediction>>,
    by_wallet: Arc<HashMap<Pubkey, Pubkey>>,
    hydration: Hydration,
}

impl PredictionBook {
    pub fn hydration(&self) -> Hydration {
        self.hydration
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    pub fn get(&self, address: &Pubkey) -> Option<&Prediction> {
        self.by_address.get(address)
    }

    pub fn address_for_wallet(&self, wallet: &Pubkey) -> Option<Pubkey> {
        self.by_wallet.get(wallet).copied()
    }

    /// The wallet's live record under this key, if any.
    pub fn prediction_for_wallet(&self, wallet: &Pubkey) -> Option<&Prediction> {
        self.by_wallet
            .get(wallet)
            .and_then(|address| self.by_address.get(address))
    }

    /// Records ordered by placement (slot, then address for determinism).
    pub fn by_placement_order(&self) -> Vec<(Pubkey, Prediction)> {
        let mut out: Vec<_> = self
            .by_address
            .iter()
            .map(|(a, p)| (*a, p.clone()))
            .collect();
        out.sort_by(|(addr_a, a), (addr_b, b)| {
            a.placed_slot
                .cmp(&b.placed_slot)
                .then_with(|| addr_a.cmp(addr_b))
        });
        out
    }

    /// Top `n` records by total stake, descending.
    pub fn top_by_stake(&self, n: usize) -> Vec<(Pubkey, Prediction)> {
        let mut out: Vec<_> = self
            .by_address
            .iter()
            .map(|(a, p)| (*a, p.clone()))
            .collect();
        out.sort_by(|(addr_a, a), (addr_b, b)| {
            b.lamports
                .cmp(&a.lamports)
                .then_with(|| addr_a.cmp(addr_b))
        });
        out.truncate(n);
        out
    }

    /// (total lamports, record count) across the book.
    pub fn totals(&self) -> (u64, usize) {
        let lamports = self
            .by_address
            .values()
            .map(|p| p.lamports)
            .fold(0u64, u64::saturating_add);
        (lamports, self.by_address.len())
    }
}

/// The stateful core. All mutation goes through serialized callback
/// invocations from the channel dispatcher, so the inner lock is only held
/// for the duration of a map swap.
#[derive(Clone, Default)]
pub struct PredictionCache {
    books: Arc<Mutex<HashMap<GameKey, PredictionBook>>>,
}

impl PredictionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view for a key. A key never entered reads as an empty idle
    /// book, indistinguishable from a cleared one.
    pub fn book(&self, key: GameKey) -> PredictionBook {
        self.books
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn hydration(&self, key: GameKey) -> Hydration {
        self.book(key).hydration
    }

    pub fn set_hydration(&self, key: GameKey, hydration: Hydration) {
        let mut books = self.books.lock().unwrap();
        books.entry(key).or_default().hydration = hydration;
    }

    /// Full replace of both maps for the key, used once per key activation.
    ///
    /// If the batch carries two records for one wallet (a re-derived or stale
    /// account), the one with the higher placed slot wins; ties break on
    /// address order so the outcome is deterministic.
    pub fn load_snapshot(&self, key: GameKey, records: Vec<(Pubkey, Prediction)>) {
        let mut sorted = records;
        sorted.sort_by(|(addr_a, a), (addr_b, b)| {
            a.placed_slot
                .cmp(&b.placed_slot)
                .then_with(|| addr_a.cmp(addr_b))
        });

        let mut by_address = HashMap::with_capacity(sorted.len());
        let mut by_wallet = HashMap::with_capacity(sorted.len());
        for (address, record) in sorted {
            if let Some(stale) = by_wallet.insert(record.player, address) {
                by_address.remove(&stale);
            }
            by_address.insert(address, record);
        }

        let mut books = self.books.lock().unwrap();
        let book = books.entry(key).or_default();
        book.by_address = Arc::new(by_address);
        book.by_wallet = Arc::new(by_wallet);
    }

    /// Merge one pushed record. Enforces at most one live prediction per
    /// wallet per key: any prior record address owned by the same wallet is
    /// evicted before the insert, even under out-of-order push delivery.
    pub fn upsert(&self, key: GameKey, address: Pubkey, record: Prediction) {
        let mut books = self.books.lock().unwrap();
        let book = books.entry(key).or_default();

        let mut by_address = (*book.by_address).clone();
        let mut by_wallet = (*book.by_wallet).clone();

        if let Some(stale) = by_wallet.insert(record.player, address) {
            if stale != address {
                by_address.remove(&stale);
            }
        }
        by_address.insert(address, record);

        book.by_address = Arc::new(by_address);
        book.by_wallet = Arc::new(by_wallet);
    }

    /// Reset a key to empty maps. The key stays present so readers see an
    /// empty book rather than a transient missing key.
    pub fn clear(&self, key: GameKey) {
        let mut books = self.books.lock().unwrap();
        let book = books.entry(key).or_default();
        book.by_address = Arc::new(HashMap::new());
        book.by_wallet = Arc::new(HashMap::new());
        book.hydration = Hydration::Idle;
    }
}
