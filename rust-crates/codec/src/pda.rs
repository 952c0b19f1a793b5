//! Deterministic address derivation for every account the client reads.
//!
//! Seeds mirror the program's `seeds = [...]` constraints. Derivation is
//! total for well-formed inputs; the bump search always terminates.

use solana_sdk::pubkey::Pubkey;

pub const CONFIG_SEED: &[u8] = b"config";
pub const LIVE_FEED_SEED: &[u8] = b"live_feed";
pub const PROFILE_SEED: &[u8] = b"profile";
pub const PREDICTION_SEED: &[u8] = b"prediction";
pub const RESOLVED_GAME_SEED: &[u8] = b"resolved_game";
pub const TREASURY_SEED: &[u8] = b"treasury";

pub fn config(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

pub fn treasury(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[TREASURY_SEED], program_id)
}

pub fn live_feed(program_id: &Pubkey, tier: u8) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[LIVE_FEED_SEED, &[tier]], program_id)
}

pub fn profile(program_id: &Pubkey, player: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PROFILE_SEED, player.as_ref()], program_id)
}

/// Prediction PDA. `game_epoch` is the first epoch in the chain, the stable
/// game id spanning rollovers.
pub fn prediction(
    program_id: &Pubkey,
    player: &Pubkey,
    game_epoch: u64,
    tier: u8,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            PREDICTION_SEED,
            player.as_ref(),
            &game_epoch.to_le_bytes(),
            &[tier],
        ],
        program_id,
    )
}

pub fn resolved_game(program_id: &Pubkey, epoch: u64, tier: u8) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[RESOLVED_GAME_SEED, &epoch.to_le_bytes(), &[tier]],
        program_id,
    )
}
