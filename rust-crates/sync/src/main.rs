use anyhow::{
    Context,
    anyhow,
};
use clap::Parser;
use fortune_codec::{
    Config,
    LiveFeed,
    pda,
};
use fortune_sync::{
    cache::{
        GameKey,
        PredictionCache,
    },
    clock::{
        EpochClock,
        SlotTimeEstimator,
    },
    finale::watch_finale,
    init_tracing,
    ledger::{
        LedgerReader,
        RpcLedgerReader,
    },
    session::SyncSession,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    str::FromStr,
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about = "Watches one tier of the fortune game", long_about = None)]
struct Args {
    #[arg(short, long)]
    rpc_url: Url,

    #[arg(short, long)]
    ws_url: Url,

    #[arg(short, long)]
    program_id: String,

    #[arg(short, long, default_value = "1")]
    tier: u8,

    /// Wallet to highlight in the logs, if any.
    #[arg(long)]
    wallet: Option<String>,

    #[arg(long, default_value = "false")]
    tracing: bool,
}

async fn handle_interrupt() {
    let res = tokio::signal::ctrl_c().await;
    match res {
        Ok(_) => {
            tracing::info!("Received interrupt, exiting");
        }
        Err(_) => {
            tracing::warn!("Received interrupt error, exiting anyway");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.tracing {
        init_tracing();
    }

    let program_id = Pubkey::from_str(&args.program_id)
        .map_err(|e| anyhow!("Failed to parse program id '{}': {e:?}", args.program_id))?;
    let wallet = args
        .wallet
        .as_deref()
        .map(Pubkey::from_str)
        .transpose()
        .context("parsing --wallet")?;

    let reader = Arc::new(RpcLedgerReader::new(
        program_id,
        args.rpc_url.to_string(),
        args.ws_url.to_string(),
    ));

    let (config_address, _) = pda::config(&program_id);
    let config_data = reader
        .account_data(&config_address)
        .await?
        .ok_or_else(|| anyhow!("config account {config_address} not found"))?;
    let config = Config::decode(&config_data).context("decoding config")?;
    if config.is_betting_paused() {
        tracing::warn!("betting is currently paused");
    }

    let (feed_address, _) = pda::live_feed(&program_id, args.tier);
    let feed_data = reader
        .account_data(&feed_address)
        .await?
        .ok_or_else(|| anyhow!("tier {} has no live feed", args.tier))?;
    let feed = LiveFeed::decode(&feed_data).context("decoding live feed")?;
    tracing::info!(
        epoch = feed.epoch,
        game_epoch = feed.first_epoch_in_chain,
        tier = feed.tier,
        total_lamports = feed.total_lamports,
        total_bets = feed.total_bets,
        "live feed loaded"
    );

    let key = GameKey {
        game_epoch: feed.first_epoch_in_chain,
        tier: args.tier,
    };
    let session = Arc::new(SyncSession::new(Arc::clone(&reader), PredictionCache::new()));
    session.enter(key).await.context("activating game key")?;
    tracing::info!(
        records = session.cache().book(key).len(),
        "prediction snapshot hydrated"
    );

    let mut clock = EpochClock::new();
    let mut estimator = SlotTimeEstimator::new();
    let mut finale = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    let mut estimator_refresh = tokio::time::interval(Duration::from_secs(60));
    let interrupt = handle_interrupt();
    tokio::pin!(interrupt);

    tracing::info!("Starting watch loop");
    loop {
        tokio::select! {
            _ = &mut interrupt => break,
            _ = estimator_refresh.tick() => {
                match reader.recent_slot_time().await {
                    Ok(sample) => estimator.ingest(sample),
                    Err(e) => tracing::debug!("performance sample fetch failed: {e:#}"),
                }
            }
            _ = ticker.tick() => {
                let (bounds, slot) = match tokio::try_join!(
                    reader.epoch_bounds(),
                    reader.current_slot(),
                ) {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!("clock inputs unavailable: {e:#}");
                        continue;
                    }
                };

                let update = clock.update(bounds, slot, estimator.secs_per_slot(), Instant::now());
                for notice in &update.notices {
                    tracing::info!(epoch = bounds.epoch, ?notice, "epoch milestone");
                }
                if let Some(reading) = update.commit {
                    tracing::debug!(
                        progress = reading.progress,
                        phase = ?reading.phase,
                        remaining_slots = reading.remaining_slots,
                        "clock"
                    );
                }
                if update.open_finale && finale.is_none() {
                    tracing::info!(epoch = bounds.epoch, tier = args.tier, "epoch over, watching for resolution");
                    finale = Some(watch_finale(
                        Arc::clone(&reader),
                        program_id,
                        bounds.epoch,
                        args.tier,
                    ));
                }
                if let Some(watch) = &finale {
                    let latest = watch.updates.borrow().clone();
                    if let Some(resolved) = latest {
                        if resolved.is_final() {
                            tracing::info!(
                                winning_number = resolved.winning_number,
                                total_winners = resolved.total_winners,
                                net_prize_pool = resolved.net_prize_pool,
                                "game resolved"
                            );
                            if let Some(wallet) = wallet {
                                report_wallet(&session, key, &wallet);
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    session.stop();
    tracing::info!("Exiting watcher");
    Ok(())
}

fn report_wallet(
    session: &SyncSession<RpcLedgerReader>,
    key: GameKey,
    wallet: &Pubkey,
) {
    match session.cache().book(key).prediction_for_wallet(wallet) {
        Some(prediction) => tracing::info!(
            selections = ?prediction.selection_set(),
            lamports = prediction.lamports,
            "wallet played this game"
        ),
        None => tracing::info!("wallet did not play this game"),
    }
}
