use thiserror::Error;

/// Failure decoding a raw account buffer into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{kind}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{kind}: discriminator mismatch")]
    DiscriminatorMismatch { kind: &'static str },
}

/// Constraint violation while encoding user intent into instruction
/// arguments. These surface before any bytes are produced; a malformed
/// instruction is never built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("prediction type {prediction_type} allows {min}..={max} picks, got {got}")]
    BadPickCount {
        prediction_type: u8,
        min: usize,
        max: usize,
        got: usize,
    },

    #[error("pick {0} is outside 1..=9")]
    PickOutOfRange(u8),

    #[error("duplicate pick {0}")]
    DuplicatePick(u8),

    #[error("pick {0} is the blocked rollover number")]
    BlockedPick(u8),

    #[error("picks do not match the high/low or even/odd partition exactly")]
    PresetMismatch,

    #[error("unknown prediction type {0}")]
    UnknownPredictionType(u8),

    #[error("blocked rollover number {0} is outside 1..=9")]
    BadBlockedNumber(u8),
}
