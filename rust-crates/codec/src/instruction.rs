//! Instruction data builders.
//!
//! Each builder validates the choice encoding against the program's own
//! decoding rule before producing any bytes, then emits the 8-byte method
//! discriminator followed by borsh-serialized arguments in declaration
//! order. Account metas, signing, and submission belong to the transaction
//! layer, which accepts these fully-formed data payloads.

use crate::{
    choice::{
        PredictionType,
        derive_selections,
        encode_choice,
    },
    discriminator,
    error::EncodeError,
};

/// `place_prediction(tier, prediction_type, choice, lamports)`.
///
/// `lamports` is the per-number stake; the program multiplies by the
/// selection count.
pub fn place_prediction(
    tier: u8,
    prediction_type: PredictionType,
    picks: &[u8],
    lamports_per_number: u64,
    blocked_secondary: u8,
) -> Result<Vec<u8>, EncodeError> {
    let choice = encode_choice(prediction_type, picks, blocked_secondary)?;
    let mut data = Vec::with_capacity(discriminator::LEN + 1 + 1 + 4 + 8);
    data.extend_from_slice(&discriminator::instruction("place_prediction"));
    data.push(tier);
    data.push(prediction_type.as_u8());
    data.extend_from_slice(&choice.to_le_bytes());
    data.extend_from_slice(&lamports_per_number.to_le_bytes());
    Ok(data)
}

/// `increase_prediction(tier, additional_lamports, choice)`. The choice must
/// restate the existing selection so the program can re-verify it.
pub fn increase_prediction(
    tier: u8,
    prediction_type: PredictionType,
    picks: &[u8],
    additional_lamports: u64,
    blocked_secondary: u8,
) -> Result<Vec<u8>, EncodeError> {
    let choice = encode_choice(prediction_type, picks, blocked_secondary)?;
    let mut data = Vec::with_capacity(discriminator::LEN + 1 + 8 + 4);
    data.extend_from_slice(&discriminator::instruction("increase_prediction"));
    data.push(tier);
    data.extend_from_slice(&additional_lamports.to_le_bytes());
    data.extend_from_slice(&choice.to_le_bytes());
    Ok(data)
}

/// `change_prediction_number(tier, new_prediction_type, new_choice)`.
pub fn change_prediction_number(
    tier: u8,
    new_prediction_type: PredictionType,
    new_picks: &[u8],
    blocked_secondary: u8,
) -> Result<Vec<u8>, EncodeError> {
    let choice = encode_choice(new_prediction_type, new_picks, blocked_secondary)?;
    let mut data = Vec::with_capacity(discriminator::LEN + 1 + 1 + 4);
    data.extend_from_slice(&discriminator::instruction("change_prediction_number"));
    data.push(tier);
    data.push(new_prediction_type.as_u8());
    data.extend_from_slice(&choice.to_le_bytes());
    Ok(data)
}

/// `claim_prediction(epoch, tier, index, amount, proof)`. The proof is the
/// merkle path from the results document; this layer only serializes it.
pub fn claim_prediction(
    epoch: u64,
    tier: u8,
    index: u32,
    amount: u64,
    proof: &[[u8; 32]],
) -> Vec<u8> {
    let mut data =
        Vec::with_capacity(discriminator::LEN + 8 + 1 + 4 + 8 + 4 + proof.len() * 32);
    data.extend_from_slice(&discriminator::instruction("claim_prediction"));
    data.extend_from_slice(&epoch.to_le_bytes());
    data.push(tier);
    data.extend_from_slice(&index.to_le_bytes());
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(&(proof.len() as u32).to_le_bytes());
    for node in proof {
        data.extend_from_slice(node);
    }
    data
}

/// Pre-validate a choice exactly as the program will decode it. Lets callers
/// surface constraint errors before building a transaction.
pub fn validate_choice(
    prediction_type: PredictionType,
    picks: &[u8],
    blocked_secondary: u8,
) -> Result<(u8, [u8; 8], u16), EncodeError> {
    let choice = encode_choice(prediction_type, picks, blocked_secondary)?;
    derive_selections(prediction_type.as_u8(), choice, blocked_secondary)
}
