use crate::{
    Result,
    cache::{
        GameKey,
        Hydration,
        PredictionCache,
    },
    finale::watch_finale,
    ledger::{
        AccountStream,
        AccountUpdate,
        EpochBounds,
        LedgerReader,
        PredictionFilter,
    },
    session::SyncSession,
};
use anyhow::anyhow;
use fortune_codec::{
    Prediction,
    ResolvedGame,
    pda,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::{
        HashMap,
        VecDeque,
    },
    sync::{
        Arc,
        Mutex,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// In-memory ledger double. Snapshots and single accounts are seeded by the
/// test; push channels hand their senders back through `pushers` so the test
/// can inject events.
#[derive(Default)]
struct FakeLedger {
    snapshots: Mutex<HashMap<(u64, u8), Vec<(Pubkey, Vec<u8>)>>>,
    accounts: Mutex<HashMap<Pubkey, VecDeque<Vec<u8>>>>,
    pushers: Mutex<Vec<mpsc::Sender<AccountUpdate>>>,
    stoppers: Mutex<Vec<CancellationToken>>,
    fail_snapshots: AtomicBool,
}

impl FakeLedger {
    fn seed_snapshot(&self, filter: PredictionFilter, records: Vec<(Pubkey, Vec<u8>)>) {
        self.snapshots
            .lock()
            .unwrap()
            .insert((filter.game_epoch, filter.tier), records);
    }

    fn seed_account_sequence(&self, address: Pubkey, responses: Vec<Vec<u8>>) {
        self.accounts
            .lock()
            .unwrap()
            .insert(address, responses.into());
    }

    async fn push(&self, update: AccountUpdate) {
        let senders = self.pushers.lock().unwrap().clone();
        for sender in senders {
            let _ = sender.send(update.clone()).await;
        }
    }

    fn open_stream(&self) -> AccountStream {
        let (sender, receiver) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        self.pushers.lock().unwrap().push(sender);
        self.stoppers.lock().unwrap().push(cancel.clone());
        AccountStream::new(receiver, cancel)
    }
}

impl LedgerReader for FakeLedger {
    async fn prediction_accounts(
        &self,
        filter: PredictionFilter,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(anyhow!("rpc unavailable"));
        }
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .get(&(filter.game_epoch, filter.tier))
            .cloned()
            .unwrap_or_default())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let mut accounts = self.accounts.lock().unwrap();
        Ok(accounts.get_mut(address).and_then(|seq| {
            if seq.len() > 1 {
                seq.pop_front()
            } else {
                seq.front().cloned()
            }
        }))
    }

    async fn subscribe_predictions(&self, _filter: PredictionFilter) -> Result<AccountStream> {
        Ok(self.open_stream())
    }

    async fn subscribe_account(&self, _address: &Pubkey) -> Result<AccountStream> {
        Ok(self.open_stream())
    }

    async fn current_slot(&self) -> Result<u64> {
        Ok(0)
    }

    async fn epoch_bounds(&self) -> Result<EpochBounds> {
        Ok(EpochBounds {
            epoch: 0,
            start_slot: 0,
            slots_in_epoch: 1,
        })
    }

    async fn recent_slot_time(&self) -> Result<Option<f64>> {
        Ok(None)
    }
}

fn record(wallet: Pubkey, lamports: u64, placed_slot: u64) -> Prediction {
    Prediction {
        game_epoch: 5,
        epoch: 5,
        player: wallet,
        tier: 1,
        prediction_type: 0,
        selection_count: 1,
        selections_mask: 1 << 7,
        selections: [7, 0, 0, 0, 0, 0, 0, 0],
        lamports,
        changed_count: 0,
        placed_slot,
        placed_at_ts: 1_726_000_000,
        last_updated_at_ts: 1_726_000_000,
        has_claimed: 0,
        claimed_at_ts: 0,
        bump: 255,
        version: 2,
        lamports_per_number: lamports,
    }
}

fn key() -> GameKey {
    GameKey {
        game_epoch: 5,
        tier: 1,
    }
}

fn filter() -> PredictionFilter {
    PredictionFilter {
        game_epoch: 5,
        tier: 1,
    }
}

async fn settle() {
    // Let spawned pumps drain their channels.
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn enter_hydrates_snapshot_then_applies_pushes() {
    let ledger = Arc::new(FakeLedger::default());
    let wallet_a = Pubkey::new_unique();
    let addr_a = Pubkey::new_unique();
    ledger.seed_snapshot(filter(), vec![(addr_a, record(wallet_a, 100, 10).encode())]);

    let session = SyncSession::new(Arc::clone(&ledger), PredictionCache::new());
    session.enter(key()).await.unwrap();

    assert_eq!(session.cache().hydration(key()), Hydration::Ready);
    assert_eq!(session.cache().book(key()).len(), 1);

    // A pushed record for a new wallet lands in the cache.
    let wallet_b = Pubkey::new_unique();
    let addr_b = Pubkey::new_unique();
    ledger
        .push(AccountUpdate {
            address: addr_b,
            data: record(wallet_b, 150, 12).encode(),
        })
        .await;
    settle().await;

    let book = session.cache().book(key());
    assert_eq!(book.len(), 2);
    assert_eq!(book.address_for_wallet(&wallet_b), Some(addr_b));
}

#[tokio::test]
async fn stale_push_after_snapshot_evicts_old_record() {
    let ledger = Arc::new(FakeLedger::default());
    let wallet = Pubkey::new_unique();
    let addr_a = Pubkey::new_unique();
    let addr_b = Pubkey::new_unique();
    ledger.seed_snapshot(filter(), vec![(addr_a, record(wallet, 100, 10).encode())]);

    let session = SyncSession::new(Arc::clone(&ledger), PredictionCache::new());
    session.enter(key()).await.unwrap();

    ledger
        .push(AccountUpdate {
            address: addr_b,
            data: record(wallet, 150, 12).encode(),
        })
        .await;
    settle().await;

    let book = session.cache().book(key());
    assert_eq!(book.len(), 1);
    assert!(book.get(&addr_a).is_none());
    assert_eq!(book.address_for_wallet(&wallet), Some(addr_b));
}

#[tokio::test]
async fn malformed_push_is_dropped_not_fatal() {
    let ledger = Arc::new(FakeLedger::default());
    ledger.seed_snapshot(filter(), vec![]);

    let session = SyncSession::new(Arc::clone(&ledger), PredictionCache::new());
    session.enter(key()).await.unwrap();

    ledger
        .push(AccountUpdate {
            address: Pubkey::new_unique(),
            data: vec![0u8; 17],
        })
        .await;
    let wallet = Pubkey::new_unique();
    let addr = Pubkey::new_unique();
    ledger
        .push(AccountUpdate {
            address: addr,
            data: record(wallet, 90, 9).encode(),
        })
        .await;
    settle().await;

    // The good push behind the bad one still applied.
    let book = session.cache().book(key());
    assert_eq!(book.len(), 1);
    assert!(book.get(&addr).is_some());
}

#[tokio::test(start_paused = true)]
async fn snapshot_failure_marks_key_error_until_reentered() {
    let ledger = Arc::new(FakeLedger::default());
    ledger.fail_snapshots.store(true, Ordering::SeqCst);

    let session = SyncSession::new(Arc::clone(&ledger), PredictionCache::new());
    assert!(session.enter(key()).await.is_err());
    assert_eq!(session.cache().hydration(key()), Hydration::Error);

    // No automatic retry; re-entering after recovery is the retry path.
    ledger.fail_snapshots.store(false, Ordering::SeqCst);
    ledger.seed_snapshot(filter(), vec![]);
    assert_eq!(session.cache().hydration(key()), Hydration::Error);
    session.enter(key()).await.unwrap();
    assert_eq!(session.cache().hydration(key()), Hydration::Ready);
}

#[tokio::test]
async fn switching_keys_stops_the_previous_channel() {
    let ledger = Arc::new(FakeLedger::default());
    ledger.seed_snapshot(filter(), vec![]);
    let other = GameKey {
        game_epoch: 6,
        tier: 2,
    };
    ledger.seed_snapshot(
        PredictionFilter {
            game_epoch: 6,
            tier: 2,
        },
        vec![],
    );

    let session = SyncSession::new(Arc::clone(&ledger), PredictionCache::new());
    session.enter(key()).await.unwrap();
    session.enter(other).await.unwrap();

    let stoppers = ledger.stoppers.lock().unwrap().clone();
    assert_eq!(stoppers.len(), 2);
    assert!(stoppers[0].is_cancelled());
    assert!(!stoppers[1].is_cancelled());
}

#[tokio::test]
async fn events_after_stop_are_discarded() {
    let ledger = Arc::new(FakeLedger::default());
    ledger.seed_snapshot(filter(), vec![]);

    let session = SyncSession::new(Arc::clone(&ledger), PredictionCache::new());
    session.enter(key()).await.unwrap();
    session.stop();

    ledger
        .push(AccountUpdate {
            address: Pubkey::new_unique(),
            data: record(Pubkey::new_unique(), 70, 7).encode(),
        })
        .await;
    settle().await;

    assert!(session.cache().book(key()).is_empty());
}

fn resolved(status: u8) -> ResolvedGame {
    ResolvedGame {
        epoch: 815,
        tier: 1,
        status,
        bump: 251,
        winning_number: 7,
        rng_epoch_slot_used: 1,
        rng_blockhash_used: [1; 32],
        attempt_count: 1,
        last_updated_slot: 2,
        last_updated_ts: 3,
        carry_over_bets: 0,
        total_bets: 10,
        carry_in_lamports: 0,
        carry_out_lamports: 0,
        protocol_fee_lamports: 1,
        net_prize_pool: 99,
        total_winners: 4,
        claimed_winners: 0,
        resolved_at: 4,
        merkle_root: [2; 32],
        results_uri: [0; 128],
        claimed_bitmap: vec![],
        version: 2,
        claimed_lamports: 0,
        first_epoch_in_chain: 812,
        rollover_reason: 0,
        secondary_rollover_number: 4,
        fee_bps: 450,
    }
}

#[tokio::test(start_paused = true)]
async fn finale_watch_publishes_then_stops_at_final() {
    let ledger = Arc::new(FakeLedger::default());
    let program_id = Pubkey::new_unique();
    let (address, _) = pda::resolved_game(&program_id, 815, 1);
    ledger.seed_account_sequence(
        address,
        vec![resolved(1).encode(), resolved(2).encode()],
    );

    let watch = watch_finale(Arc::clone(&ledger), program_id, 815, 1);
    let mut updates = watch.updates.clone();

    updates.changed().await.unwrap();
    assert!(!updates.borrow_and_update().as_ref().unwrap().is_final());

    updates.changed().await.unwrap();
    assert!(updates.borrow_and_update().as_ref().unwrap().is_final());

    // Terminal status tears the watch down; later seeds go unread.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(ledger.accounts.lock().unwrap().get(&address).unwrap().len() <= 1);
}

#[tokio::test(start_paused = true)]
async fn finale_watch_tolerates_missing_account() {
    let ledger = Arc::new(FakeLedger::default());
    let program_id = Pubkey::new_unique();
    // Nothing seeded: every poll comes back empty, the watch keeps going.
    let watch = watch_finale(Arc::clone(&ledger), program_id, 815, 1);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(watch.updates.borrow().is_none());
    watch.stop();
}
