//! Typed views of the program's on-chain accounts.
//!
//! Layouts mirror the program's borsh serialization exactly: fields in
//! declared order, integers little-endian, an 8-byte discriminator prefix.
//! Every decode validates the exact buffer length for its kind before
//! reading anything; a wrong-size buffer is always a hard decode failure,
//! never a partial read.

use crate::{
    discriminator,
    error::DecodeError,
    wire::{
        Reader,
        Writer,
    },
};
use solana_sdk::pubkey::Pubkey;

/// How many recent prediction addresses a profile retains.
pub const RECENT_BETS_CAP: usize = 40;

/// Tier count carried in the config account.
pub const TIER_COUNT: usize = 5;

fn check_frame(
    kind: &'static str,
    tag: [u8; discriminator::LEN],
    expected_body: usize,
    data: &[u8],
) -> Result<(), DecodeError> {
    let expected = discriminator::LEN + expected_body;
    if data.len() != expected {
        return Err(DecodeError::SizeMismatch {
            kind,
            expected,
            actual: data.len(),
        });
    }
    if data[..discriminator::LEN] != tag {
        return Err(DecodeError::DiscriminatorMismatch { kind });
    }
    Ok(())
}

/// Per-tier betting bracket settings, embedded in [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSettings {
    pub tier_id: u8,
    pub active: u8,
    pub min_bet_lamports: u64,
    pub max_bet_lamports: u64,
    pub curve_factor: f32,
    pub ticket_reward_bps: u16,
    pub ticket_reward_max: u16,
    pub tickets_per_recipient: u8,
}

impl TierSettings {
    pub const SIZE: usize = 1 + 1 + 8 + 8 + 4 + 2 + 2 + 1 + 10;

    pub fn is_active(&self) -> bool {
        self.active != 0
    }

    fn read(r: &mut Reader<'_>) -> Self {
        let out = Self {
            tier_id: r.u8(),
            active: r.u8(),
            min_bet_lamports: r.u64(),
            max_bet_lamports: r.u64(),
            curve_factor: r.f32(),
            ticket_reward_bps: r.u16(),
            ticket_reward_max: r.u16(),
            tickets_per_recipient: r.u8(),
        };
        r.skip(10);
        out
    }

    fn write(&self, w: &mut Writer) {
        w.u8(self.tier_id);
        w.u8(self.active);
        w.u64(self.min_bet_lamports);
        w.u64(self.max_bet_lamports);
        w.f32(self.curve_factor);
        w.u16(self.ticket_reward_bps);
        w.u16(self.ticket_reward_max);
        w.u8(self.tickets_per_recipient);
        w.pad(10);
    }
}

/// Global configuration singleton. Read-mostly; refreshed on bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub pause_bet: u8,
    pub pause_withdraw: u8,
    pub authority: Pubkey,
    pub fee_vault: Pubkey,
    pub base_fee_bps: u16,
    pub bet_cutoff_slots: u64,
    pub started_at: i64,
    pub started_epoch: u64,
    pub primary_roll_over_number: u8,
    pub tiers: [TierSettings; TIER_COUNT],
    pub bump: u8,
    pub min_fee_bps: u16,
    pub rollover_fee_step_bps: u16,
}

impl Config {
    pub const KIND: &'static str = "Config";
    pub const SIZE: usize = 1
        + 1
        + 32
        + 32
        + 2
        + 8
        + 8
        + 8
        + 1
        + TierSettings::SIZE * TIER_COUNT
        + 1
        + 2
        + 2
        + 16;

    pub fn discriminator() -> [u8; discriminator::LEN] {
        discriminator::account(Self::KIND)
    }

    pub fn is_betting_paused(&self) -> bool {
        self.pause_bet != 0
    }

    pub fn tier_settings(&self, tier_id: u8) -> Option<&TierSettings> {
        self.tiers.iter().find(|t| t.tier_id == tier_id)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        check_frame(Self::KIND, Self::discriminator(), Self::SIZE, data)?;
        let mut r = Reader::new(&data[discriminator::LEN..]);
        let pause_bet = r.u8();
        let pause_withdraw = r.u8();
        let authority = r.pubkey();
        let fee_vault = r.pubkey();
        let base_fee_bps = r.u16();
        let bet_cutoff_slots = r.u64();
        let started_at = r.i64();
        let started_epoch = r.u64();
        let primary_roll_over_number = r.u8();
        let tiers = core::array::from_fn(|_| TierSettings::read(&mut r));
        let bump = r.u8();
        let min_fee_bps = r.u16();
        let rollover_fee_step_bps = r.u16();
        r.skip(16);
        debug_assert_eq!(r.remaining(), 0);
        Ok(Self {
            pause_bet,
            pause_withdraw,
            authority,
            fee_vault,
            base_fee_bps,
            bet_cutoff_slots,
            started_at,
            started_epoch,
            primary_roll_over_number,
            tiers,
            bump,
            min_fee_bps,
            rollover_fee_step_bps,
        })
    }

    /// Reference encoding, byte-identical to the program's serialization.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(&Self::discriminator());
        w.u8(self.pause_bet);
        w.u8(self.pause_withdraw);
        w.pubkey(&self.authority);
        w.pubkey(&self.fee_vault);
        w.u16(self.base_fee_bps);
        w.u64(self.bet_cutoff_slots);
        w.i64(self.started_at);
        w.u64(self.started_epoch);
        w.u8(self.primary_roll_over_number);
        for tier in &self.tiers {
            tier.write(&mut w);
        }
        w.u8(self.bump);
        w.u16(self.min_fee_bps);
        w.u16(self.rollover_fee_step_bps);
        w.pad(16);
        w.finish()
    }
}

/// Per-tier pool aggregate. Mutated by every stake-changing action; read
/// continuously while a game is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveFeed {
    pub epoch: u64,
    pub first_epoch_in_chain: u64,
    pub total_lamports: u64,
    pub carried_over_lamports: u64,
    pub total_bets: u32,
    pub carried_over_bets: u32,
    pub bet_cutoff_slots: u64,
    pub tier: u8,
    pub treasury: Pubkey,
    pub epochs_carried_over: u8,
    pub bump: u8,
    pub lamports_per_number: [u64; 10],
    pub bets_per_number: [u32; 10],
    pub secondary_rollover_number: u8,
    pub current_fee_bps: u16,
}

impl LiveFeed {
    pub const KIND: &'static str = "LiveFeed";
    pub const SIZE: usize =
        8 + 8 + 8 + 8 + 4 + 4 + 8 + 1 + 32 + 1 + 1 + (8 * 10) + (4 * 10) + 1 + 2 + 61;

    pub fn discriminator() -> [u8; discriminator::LEN] {
        discriminator::account(Self::KIND)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        check_frame(Self::KIND, Self::discriminator(), Self::SIZE, data)?;
        let mut r = Reader::new(&data[discriminator::LEN..]);
        let epoch = r.u64();
        let first_epoch_in_chain = r.u64();
        let total_lamports = r.u64();
        let carried_over_lamports = r.u64();
        let total_bets = r.u32();
        let carried_over_bets = r.u32();
        let bet_cutoff_slots = r.u64();
        let tier = r.u8();
        let treasury = r.pubkey();
        let epochs_carried_over = r.u8();
        let bump = r.u8();
        let lamports_per_number = core::array::from_fn(|_| r.u64());
        let bets_per_number = core::array::from_fn(|_| r.u32());
        let secondary_rollover_number = r.u8();
        let current_fee_bps = r.u16();
        r.skip(61);
        debug_assert_eq!(r.remaining(), 0);
        Ok(Self {
            epoch,
            first_epoch_in_chain,
            total_lamports,
            carried_over_lamports,
            total_bets,
            carried_over_bets,
            bet_cutoff_slots,
            tier,
            treasury,
            epochs_carried_over,
            bump,
            lamports_per_number,
            bets_per_number,
            secondary_rollover_number,
            current_fee_bps,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(&Self::discriminator());
        w.u64(self.epoch);
        w.u64(self.first_epoch_in_chain);
        w.u64(self.total_lamports);
        w.u64(self.carried_over_lamports);
        w.u32(self.total_bets);
        w.u32(self.carried_over_bets);
        w.u64(self.bet_cutoff_slots);
        w.u8(self.tier);
        w.pubkey(&self.treasury);
        w.u8(self.epochs_carried_over);
        w.u8(self.bump);
        for v in self.lamports_per_number {
            w.u64(v);
        }
        for v in self.bets_per_number {
            w.u32(v);
        }
        w.u8(self.secondary_rollover_number);
        w.u16(self.current_fee_bps);
        w.pad(61);
        w.finish()
    }
}

/// A wallet's placed bet for one (game chain, tier).
///
/// The selection set is carried twice on the wire: an explicit prefix of
/// `selections` plus `selections_mask`. The mask is canonical; the array is
/// cross-checked on decode and a disagreement is only warned about, since
/// older record versions can carry a stale array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub game_epoch: u64,
    pub epoch: u64,
    pub player: Pubkey,
    pub tier: u8,
    pub prediction_type: u8,
    pub selection_count: u8,
    pub selections_mask: u16,
    pub selections: [u8; 8],
    pub lamports: u64,
    pub changed_count: u8,
    pub placed_slot: u64,
    pub placed_at_ts: i64,
    pub last_updated_at_ts: i64,
    pub has_claimed: u8,
    pub claimed_at_ts: i64,
    pub bump: u8,
    pub version: u8,
    pub lamports_per_number: u64,
}

impl Prediction {
    pub const KIND: &'static str = "Prediction";
    pub const SIZE: usize =
        8 + 8 + 32 + 1 + 1 + 1 + 2 + 8 + 8 + 1 + 8 + 8 + 8 + 1 + 8 + 1 + 1 + 8 + 8;

    /// Byte offset of `game_epoch` within the account data (after the
    /// discriminator), for memcmp filters.
    pub const GAME_EPOCH_OFFSET: usize = discriminator::LEN;
    /// Byte offset of `tier` within the account data.
    pub const TIER_OFFSET: usize = discriminator::LEN + 8 + 8 + 32;

    pub fn discriminator() -> [u8; discriminator::LEN] {
        discriminator::account(Self::KIND)
    }

    /// Canonical selection set, taken from the bitmask.
    pub fn selection_set(&self) -> Vec<u8> {
        (1u8..=9).filter(|n| self.mask_has(*n)).collect()
    }

    pub fn mask_has(&self, n: u8) -> bool {
        n <= 9 && (self.selections_mask & (1u16 << n)) != 0
    }

    pub fn expected_total_lamports(&self) -> u64 {
        self.lamports_per_number
            .saturating_mul(u64::from(self.selection_count.max(1)))
    }

    pub fn has_claimed(&self) -> bool {
        self.has_claimed != 0
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        check_frame(Self::KIND, Self::discriminator(), Self::SIZE, data)?;
        let mut r = Reader::new(&data[discriminator::LEN..]);
        let out = Self {
            game_epoch: r.u64(),
            epoch: r.u64(),
            player: r.pubkey(),
            tier: r.u8(),
            prediction_type: r.u8(),
            selection_count: r.u8(),
            selections_mask: r.u16(),
            selections: r.bytes::<8>(),
            lamports: r.u64(),
            changed_count: r.u8(),
            placed_slot: r.u64(),
            placed_at_ts: r.i64(),
            last_updated_at_ts: r.i64(),
            has_claimed: r.u8(),
            claimed_at_ts: r.i64(),
            bump: r.u8(),
            version: r.u8(),
            lamports_per_number: r.u64(),
        };
        r.skip(8);
        debug_assert_eq!(r.remaining(), 0);
        out.cross_check_selections();
        Ok(out)
    }

    /// The array representation can go stale in old record versions, so a
    /// mismatch against the mask stays a warning. The mask wins.
    fn cross_check_selections(&self) {
        let mut from_array: u16 = 0;
        let n = usize::from(self.selection_count.min(8));
        for &v in &self.selections[..n] {
            if (1..=9).contains(&v) {
                from_array |= 1u16 << v;
            }
        }
        if from_array != self.selections_mask
            || u32::from(self.selection_count) != u32::from(self.selections_mask.count_ones())
        {
            tracing::warn!(
                player = %self.player,
                game_epoch = self.game_epoch,
                tier = self.tier,
                mask = self.selections_mask,
                array_mask = from_array,
                "prediction selection mask and array disagree; trusting the mask"
            );
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(&Self::discriminator());
        w.u64(self.game_epoch);
        w.u64(self.epoch);
        w.pubkey(&self.player);
        w.u8(self.tier);
        w.u8(self.prediction_type);
        w.u8(self.selection_count);
        w.u16(self.selections_mask);
        w.bytes(&self.selections);
        w.u64(self.lamports);
        w.u8(self.changed_count);
        w.u64(self.placed_slot);
        w.i64(self.placed_at_ts);
        w.i64(self.last_updated_at_ts);
        w.u8(self.has_claimed);
        w.i64(self.claimed_at_ts);
        w.u8(self.bump);
        w.u8(self.version);
        w.u64(self.lamports_per_number);
        w.pad(8);
        w.finish()
    }
}

/// Per-wallet profile: tickets, lifetime stats, and a ring buffer of the
/// most recent prediction addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub player: Pubkey,
    pub bump: u8,
    pub tickets_available: u32,
    pub total_bets: u64,
    pub total_lamports_wagered: u64,
    pub last_played_epoch: u64,
    pub last_played_tier: u8,
    pub last_played_timestamp: i64,
    pub xp_points: u32,
    pub recent_bets: Vec<Pubkey>,
    pub recent_bets_len: u16,
    pub recent_bets_head: u16,
    pub locked_until_epoch: u64,
    pub first_played_epoch: u64,
}

impl PlayerProfile {
    pub const KIND: &'static str = "PlayerProfile";
    pub const SIZE: usize =
        32 + 1 + 4 + 8 + 8 + 8 + 1 + 8 + 4 + (32 * RECENT_BETS_CAP) + 2 + 2 + 8 + 8 + 16;

    pub fn discriminator() -> [u8; discriminator::LEN] {
        discriminator::account(Self::KIND)
    }

    /// Recent prediction addresses, newest first, unwrapping the ring.
    pub fn recent_bets_newest_first(&self) -> Vec<Pubkey> {
        let len = usize::from(self.recent_bets_len).min(RECENT_BETS_CAP);
        let head = usize::from(self.recent_bets_head) % RECENT_BETS_CAP;
        (1..=len)
            .map(|i| self.recent_bets[(head + RECENT_BETS_CAP - i) % RECENT_BETS_CAP])
            .collect()
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        check_frame(Self::KIND, Self::discriminator(), Self::SIZE, data)?;
        let mut r = Reader::new(&data[discriminator::LEN..]);
        let player = r.pubkey();
        let bump = r.u8();
        let tickets_available = r.u32();
        let total_bets = r.u64();
        let total_lamports_wagered = r.u64();
        let last_played_epoch = r.u64();
        let last_played_tier = r.u8();
        let last_played_timestamp = r.i64();
        let xp_points = r.u32();
        let recent_bets = (0..RECENT_BETS_CAP).map(|_| r.pubkey()).collect();
        let recent_bets_len = r.u16();
        let recent_bets_head = r.u16();
        let locked_until_epoch = r.u64();
        let first_played_epoch = r.u64();
        r.skip(16);
        debug_assert_eq!(r.remaining(), 0);
        Ok(Self {
            player,
            bump,
            tickets_available,
            total_bets,
            total_lamports_wagered,
            last_played_epoch,
            last_played_tier,
            last_played_timestamp,
            xp_points,
            recent_bets,
            recent_bets_len,
            recent_bets_head,
            locked_until_epoch,
            first_played_epoch,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        assert_eq!(self.recent_bets.len(), RECENT_BETS_CAP);
        let mut w = Writer::new();
        w.bytes(&Self::discriminator());
        w.pubkey(&self.player);
        w.u8(self.bump);
        w.u32(self.tickets_available);
        w.u64(self.total_bets);
        w.u64(self.total_lamports_wagered);
        w.u64(self.last_played_epoch);
        w.u8(self.last_played_tier);
        w.i64(self.last_played_timestamp);
        w.u32(self.xp_points);
        for key in &self.recent_bets {
            w.pubkey(key);
        }
        w.u16(self.recent_bets_len);
        w.u16(self.recent_bets_head);
        w.u64(self.locked_until_epoch);
        w.u64(self.first_played_epoch);
        w.pad(16);
        w.finish()
    }
}

/// Resolution status of a [`ResolvedGame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Failed,
    Processing,
    Resolved,
    Unknown(u8),
}

impl GameStatus {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Failed,
            1 => Self::Processing,
            2 => Self::Resolved,
            other => Self::Unknown(other),
        }
    }
}

/// Finalized outcome record for one (epoch, tier).
///
/// The account is allocated at its maximum size up front; the claimed bitmap
/// vector's length prefix marks the live prefix within that capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGame {
    pub epoch: u64,
    pub tier: u8,
    pub status: u8,
    pub bump: u8,
    pub winning_number: u8,
    pub rng_epoch_slot_used: u64,
    pub rng_blockhash_used: [u8; 32],
    pub attempt_count: u8,
    pub last_updated_slot: u64,
    pub last_updated_ts: i64,
    pub carry_over_bets: u32,
    pub total_bets: u32,
    pub carry_in_lamports: u64,
    pub carry_out_lamports: u64,
    pub protocol_fee_lamports: u64,
    pub net_prize_pool: u64,
    pub total_winners: u32,
    pub claimed_winners: u32,
    pub resolved_at: i64,
    pub merkle_root: [u8; 32],
    pub results_uri: [u8; 128],
    pub claimed_bitmap: Vec<u8>,
    pub version: u8,
    pub claimed_lamports: u64,
    pub first_epoch_in_chain: u64,
    pub rollover_reason: u8,
    pub secondary_rollover_number: u8,
    pub fee_bps: u16,
}

impl ResolvedGame {
    pub const KIND: &'static str = "ResolvedGame";
    pub const MAX_WINNERS_PER_GAME: usize = 50_000;
    pub const MAX_BITMAP_LEN: usize = Self::MAX_WINNERS_PER_GAME.div_ceil(8);

    /// Fixed fields plus the bitmap length prefix, excluding bitmap bytes.
    pub const BASE_SIZE: usize = 8
        + 1
        + 1
        + 1
        + 1
        + 8
        + 32
        + 1
        + 8
        + 8
        + 4
        + 4
        + 8
        + 8
        + 8
        + 8
        + 4
        + 4
        + 8
        + 32
        + 128
        + 4
        + 1
        + 8
        + 8
        + 1
        + 1
        + 2
        + 12;

    /// Allocated account body size.
    pub const SIZE: usize = Self::BASE_SIZE + Self::MAX_BITMAP_LEN;

    pub fn discriminator() -> [u8; discriminator::LEN] {
        discriminator::account(Self::KIND)
    }

    pub fn status(&self) -> GameStatus {
        GameStatus::from_u8(self.status)
    }

    pub fn is_final(&self) -> bool {
        self.status() == GameStatus::Resolved
    }

    /// Results location as UTF-8, trimming the zero padding.
    pub fn results_uri_str(&self) -> Option<&str> {
        let end = self
            .results_uri
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.results_uri.len());
        core::str::from_utf8(&self.results_uri[..end])
            .ok()
            .filter(|s| !s.is_empty())
    }

    pub fn is_claimed(&self, index: u32) -> bool {
        let byte = (index / 8) as usize;
        let bit = index % 8;
        self.claimed_bitmap
            .get(byte)
            .is_some_and(|b| b & (1 << bit) != 0)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        check_frame(Self::KIND, Self::discriminator(), Self::SIZE, data)?;
        let mut r = Reader::new(&data[discriminator::LEN..]);
        let epoch = r.u64();
        let tier = r.u8();
        let status = r.u8();
        let bump = r.u8();
        let winning_number = r.u8();
        let rng_epoch_slot_used = r.u64();
        let rng_blockhash_used = r.bytes::<32>();
        let attempt_count = r.u8();
        let last_updated_slot = r.u64();
        let last_updated_ts = r.i64();
        let carry_over_bets = r.u32();
        let total_bets = r.u32();
        let carry_in_lamports = r.u64();
        let carry_out_lamports = r.u64();
        let protocol_fee_lamports = r.u64();
        let net_prize_pool = r.u64();
        let total_winners = r.u32();
        let claimed_winners = r.u32();
        let resolved_at = r.i64();
        let merkle_root = r.bytes::<32>();
        let results_uri = r.bytes::<128>();
        let bitmap_len = r.u32() as usize;
        if bitmap_len > Self::MAX_BITMAP_LEN {
            // A length prefix past the allocated capacity cannot have been
            // written by the program.
            return Err(DecodeError::SizeMismatch {
                kind: Self::KIND,
                expected: Self::MAX_BITMAP_LEN,
                actual: bitmap_len,
            });
        }
        let mut claimed_bitmap = vec![0u8; bitmap_len];
        for byte in claimed_bitmap.iter_mut() {
            *byte = r.u8();
        }
        let version = r.u8();
        let claimed_lamports = r.u64();
        let first_epoch_in_chain = r.u64();
        let rollover_reason = r.u8();
        let secondary_rollover_number = r.u8();
        let fee_bps = r.u16();
        r.skip(12);
        Ok(Self {
            epoch,
            tier,
            status,
            bump,
            winning_number,
            rng_epoch_slot_used,
            rng_blockhash_used,
            attempt_count,
            last_updated_slot,
            last_updated_ts,
            carry_over_bets,
            total_bets,
            carry_in_lamports,
            carry_out_lamports,
            protocol_fee_lamports,
            net_prize_pool,
            total_winners,
            claimed_winners,
            resolved_at,
            merkle_root,
            results_uri,
            claimed_bitmap,
            version,
            claimed_lamports,
            first_epoch_in_chain,
            rollover_reason,
            secondary_rollover_number,
            fee_bps,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        assert!(self.claimed_bitmap.len() <= Self::MAX_BITMAP_LEN);
        let mut w = Writer::new();
        w.bytes(&Self::discriminator());
        w.u64(self.epoch);
        w.u8(self.tier);
        w.u8(self.status);
        w.u8(self.bump);
        w.u8(self.winning_number);
        w.u64(self.rng_epoch_slot_used);
        w.bytes(&self.rng_blockhash_used);
        w.u8(self.attempt_count);
        w.u64(self.last_updated_slot);
        w.i64(self.last_updated_ts);
        w.u32(self.carry_over_bets);
        w.u32(self.total_bets);
        w.u64(self.carry_in_lamports);
        w.u64(self.carry_out_lamports);
        w.u64(self.protocol_fee_lamports);
        w.u64(self.net_prize_pool);
        w.u32(self.total_winners);
        w.u32(self.claimed_winners);
        w.i64(self.resolved_at);
        w.bytes(&self.merkle_root);
        w.bytes(&self.results_uri);
        w.u32(self.claimed_bitmap.len() as u32);
        w.bytes(&self.claimed_bitmap);
        // The account keeps its full allocation; unwritten bitmap capacity
        // plus trailing fields follow the serialized prefix.
        w.u8(self.version);
        w.u64(self.claimed_lamports);
        w.u64(self.first_epoch_in_chain);
        w.u8(self.rollover_reason);
        w.u8(self.secondary_rollover_number);
        w.u16(self.fee_bps);
        w.pad(12);
        w.pad(Self::MAX_BITMAP_LEN - self.claimed_bitmap.len());
        w.finish()
    }
}

/// Shared treasury PDA accounting record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treasury {
    pub authority: Pubkey,
    pub tier: u8,
    pub bump: u8,
    pub total_in_lamports: u64,
    pub total_out_lamports: u64,
    pub total_fees_withdrawn: u64,
    pub version: u8,
}

impl Treasury {
    pub const KIND: &'static str = "Treasury";
    pub const SIZE: usize = 32 + 1 + 1 + 8 + 8 + 8 + 1 + 32;

    pub fn discriminator() -> [u8; discriminator::LEN] {
        discriminator::account(Self::KIND)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        check_frame(Self::KIND, Self::discriminator(), Self::SIZE, data)?;
        let mut r = Reader::new(&data[discriminator::LEN..]);
        let out = Self {
            authority: r.pubkey(),
            tier: r.u8(),
            bump: r.u8(),
            total_in_lamports: r.u64(),
            total_out_lamports: r.u64(),
            total_fees_withdrawn: r.u64(),
            version: r.u8(),
        };
        r.skip(32);
        debug_assert_eq!(r.remaining(), 0);
        Ok(out)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(&Self::discriminator());
        w.pubkey(&self.authority);
        w.u8(self.tier);
        w.u8(self.bump);
        w.u64(self.total_in_lamports);
        w.u64(self.total_out_lamports);
        w.u64(self.total_fees_withdrawn);
        w.u8(self.version);
        w.pad(32);
        w.finish()
    }
}
