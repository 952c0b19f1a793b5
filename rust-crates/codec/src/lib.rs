//! Binary codec for the fortune program's on-chain accounts.
//!
//! Everything in this crate is pure: fixed-layout little-endian decoding of
//! account buffers, the choice encoding that mirrors the program's own
//! decoding rule, instruction argument builders, and PDA derivation. No I/O
//! and no shared state, so every function is safe to call concurrently.

pub mod accounts;

pub mod choice;

pub mod discriminator;

pub mod error;

pub mod instruction;

pub mod pda;

mod wire;

pub use accounts::{
    Config,
    LiveFeed,
    PlayerProfile,
    Prediction,
    ResolvedGame,
    TierSettings,
    Treasury,
};
pub use choice::{
    PredictionType,
    derive_selections,
    encode_choice,
};
pub use error::{
    DecodeError,
    EncodeError,
};
