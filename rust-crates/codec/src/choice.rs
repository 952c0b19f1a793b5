//! Choice encoding for prediction instructions.
//!
//! The program receives a single `u32` per prediction and re-derives the
//! selection set from it. For pick-based types the u32 is the decimal
//! concatenation of the sorted ascending digits (picks {3,7} encode as 37);
//! for the high/low and even/odd presets it is a mode flag (0 or 1) and the
//! program derives the set from the currently eligible numbers. The encoder
//! here must invert that rule exactly, so every encode is verified against
//! [`derive_selections`] below, which is a faithful transcription of the
//! program's decoder.

use crate::error::EncodeError;

/// Categorical prediction types as stored in `Prediction::prediction_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PredictionType {
    SingleNumber = 0,
    TwoNumbers = 1,
    HighLow = 2,
    EvenOdd = 3,
    MultiNumber = 4,
}

impl PredictionType {
    pub fn from_u8(v: u8) -> Result<Self, EncodeError> {
        match v {
            0 => Ok(Self::SingleNumber),
            1 => Ok(Self::TwoNumbers),
            2 => Ok(Self::HighLow),
            3 => Ok(Self::EvenOdd),
            4 => Ok(Self::MultiNumber),
            other => Err(EncodeError::UnknownPredictionType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    fn pick_count_bounds(self) -> Option<(usize, usize)> {
        match self {
            Self::SingleNumber => Some((1, 1)),
            Self::TwoNumbers => Some((2, 2)),
            Self::MultiNumber => Some((3, 8)),
            Self::HighLow | Self::EvenOdd => None,
        }
    }
}

/// Numbers a prediction may cover this game: 1..=9 minus the blocked
/// secondary rollover number. Always exactly eight, ascending.
pub fn eligible_numbers(blocked_secondary: u8) -> Result<Vec<u8>, EncodeError> {
    if !(1..=9).contains(&blocked_secondary) {
        return Err(EncodeError::BadBlockedNumber(blocked_secondary));
    }
    Ok((1u8..=9).filter(|&n| n != blocked_secondary).collect())
}

/// Encode sorted unique picks into the instruction `choice` argument.
///
/// Hard-errors on anything the program would reject, so a malformed
/// instruction is never submitted. Preset types accept only a pick set that
/// matches their partition of the eligible numbers exactly; there is no
/// custom high/low.
pub fn encode_choice(
    prediction_type: PredictionType,
    picks: &[u8],
    blocked_secondary: u8,
) -> Result<u32, EncodeError> {
    let eligible = eligible_numbers(blocked_secondary)?;

    let choice = match prediction_type {
        PredictionType::SingleNumber
        | PredictionType::TwoNumbers
        | PredictionType::MultiNumber => {
            let (min, max) = prediction_type
                .pick_count_bounds()
                .expect("pick-based type");
            if picks.len() < min || picks.len() > max {
                return Err(EncodeError::BadPickCount {
                    prediction_type: prediction_type.as_u8(),
                    min,
                    max,
                    got: picks.len(),
                });
            }
            let sorted = validated_sorted_picks(picks, blocked_secondary)?;
            sorted
                .iter()
                .fold(0u32, |acc, &d| acc * 10 + u32::from(d))
        }
        PredictionType::HighLow => {
            let sorted = validated_sorted_picks(picks, blocked_secondary)?;
            if sorted == eligible[..4] {
                0
            } else if sorted == eligible[4..] {
                1
            } else {
                return Err(EncodeError::PresetMismatch);
            }
        }
        PredictionType::EvenOdd => {
            let sorted = validated_sorted_picks(picks, blocked_secondary)?;
            let evens: Vec<u8> = eligible.iter().copied().filter(|n| n % 2 == 0).collect();
            let odds: Vec<u8> = eligible.iter().copied().filter(|n| n % 2 == 1).collect();
            if sorted == evens {
                0
            } else if sorted == odds {
                1
            } else {
                return Err(EncodeError::PresetMismatch);
            }
        }
    };

    debug_assert!(
        derive_selections(prediction_type.as_u8(), choice, blocked_secondary).is_ok(),
        "encoded choice must survive the program's decoder"
    );
    Ok(choice)
}

fn validated_sorted_picks(picks: &[u8], blocked_secondary: u8) -> Result<Vec<u8>, EncodeError> {
    let mut seen = [false; 10];
    let mut sorted = Vec::with_capacity(picks.len());
    for &p in picks {
        if !(1..=9).contains(&p) {
            return Err(EncodeError::PickOutOfRange(p));
        }
        if p == blocked_secondary {
            return Err(EncodeError::BlockedPick(p));
        }
        if seen[usize::from(p)] {
            return Err(EncodeError::DuplicatePick(p));
        }
        seen[usize::from(p)] = true;
        sorted.push(p);
    }
    sorted.sort_unstable();
    Ok(sorted)
}

/// The program's own derivation of (count, selections, mask) from an encoded
/// choice. Used to pre-validate instructions client-side and by the codec
/// tests to prove the encoder is the exact inverse.
pub fn derive_selections(
    prediction_type: u8,
    choice: u32,
    blocked_secondary: u8,
) -> Result<(u8, [u8; 8], u16), EncodeError> {
    let eligible = eligible_numbers(blocked_secondary)?;
    let ty = PredictionType::from_u8(prediction_type)?;

    let mut out = [0u8; 8];
    let count: u8;

    match ty {
        PredictionType::SingleNumber | PredictionType::TwoNumbers | PredictionType::MultiNumber => {
            let (min, max) = ty.pick_count_bounds().expect("pick-based type");
            let (c, arr, mask) = decode_choice_digits(choice, blocked_secondary)?;
            if usize::from(c) < min || usize::from(c) > max {
                return Err(EncodeError::BadPickCount {
                    prediction_type,
                    min,
                    max,
                    got: usize::from(c),
                });
            }
            return Ok((c, arr, mask));
        }
        PredictionType::HighLow => {
            if choice > 1 {
                return Err(EncodeError::PresetMismatch);
            }
            let half = if choice == 0 {
                &eligible[..4]
            } else {
                &eligible[4..]
            };
            out[..4].copy_from_slice(half);
            count = 4;
        }
        PredictionType::EvenOdd => {
            if choice > 1 {
                return Err(EncodeError::PresetMismatch);
            }
            let want_odd = choice == 1;
            let mut idx = 0usize;
            for &v in &eligible {
                if (v % 2 == 1) == want_odd {
                    out[idx] = v;
                    idx += 1;
                }
            }
            count = idx as u8;
        }
    }

    let mut mask: u16 = 0;
    for &v in &out[..usize::from(count)] {
        mask |= 1u16 << v;
    }
    Ok((count, out, mask))
}

/// Digit decoding half of the program rule: least-significant digit first,
/// then canonicalized ascending.
fn decode_choice_digits(
    choice: u32,
    blocked_secondary: u8,
) -> Result<(u8, [u8; 8], u16), EncodeError> {
    if choice == 0 {
        return Err(EncodeError::PickOutOfRange(0));
    }

    let mut seen = [false; 10];
    let mut tmp = [0u8; 8];
    let mut count: usize = 0;

    let mut v = choice;
    while v > 0 {
        let d = (v % 10) as u8;
        v /= 10;
        if d == 0 {
            return Err(EncodeError::PickOutOfRange(d));
        }
        if d == blocked_secondary {
            return Err(EncodeError::BlockedPick(d));
        }
        if seen[usize::from(d)] {
            return Err(EncodeError::DuplicatePick(d));
        }
        if count == 8 {
            return Err(EncodeError::BadPickCount {
                prediction_type: PredictionType::MultiNumber.as_u8(),
                min: 1,
                max: 8,
                got: count + 1,
            });
        }
        seen[usize::from(d)] = true;
        tmp[count] = d;
        count += 1;
    }

    tmp[..count].sort_unstable();

    let mut mask: u16 = 0;
    for &d in &tmp[..count] {
        mask |= 1u16 << d;
    }
    Ok((count as u8, tmp, mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn two_picks_concatenate_ascending() {
        assert_eq!(
            encode_choice(PredictionType::TwoNumbers, &[7, 3], 5),
            Ok(37)
        );
    }

    #[test]
    fn single_pick_is_the_digit() {
        assert_eq!(encode_choice(PredictionType::SingleNumber, &[9], 5), Ok(9));
    }

    #[test]
    fn multi_pick_count_bounds_are_hard_errors() {
        assert!(matches!(
            encode_choice(PredictionType::MultiNumber, &[1, 2], 5),
            Err(EncodeError::BadPickCount { got: 2, .. })
        ));
        assert!(matches!(
            encode_choice(PredictionType::SingleNumber, &[1, 2], 5),
            Err(EncodeError::BadPickCount { got: 2, .. })
        ));
    }

    #[test]
    fn blocked_and_out_of_range_picks_rejected() {
        assert_eq!(
            encode_choice(PredictionType::SingleNumber, &[5], 5),
            Err(EncodeError::BlockedPick(5))
        );
        assert_eq!(
            encode_choice(PredictionType::SingleNumber, &[0], 5),
            Err(EncodeError::PickOutOfRange(0))
        );
        assert_eq!(
            encode_choice(PredictionType::TwoNumbers, &[4, 4], 5),
            Err(EncodeError::DuplicatePick(4))
        );
    }

    #[test]
    fn high_low_matches_partitions_exactly() {
        // Blocked 5 leaves [1,2,3,4,6,7,8,9]: low half [1,2,3,4], high [6,7,8,9].
        assert_eq!(
            encode_choice(PredictionType::HighLow, &[1, 2, 3, 4], 5),
            Ok(0)
        );
        assert_eq!(
            encode_choice(PredictionType::HighLow, &[9, 8, 7, 6], 5),
            Ok(1)
        );
        assert_eq!(
            encode_choice(PredictionType::HighLow, &[1, 2, 3, 6], 5),
            Err(EncodeError::PresetMismatch)
        );
        // Blocking 2 shifts the partition boundary: low is [1,3,4,5].
        assert_eq!(
            encode_choice(PredictionType::HighLow, &[1, 3, 4, 5], 2),
            Ok(0)
        );
        assert_eq!(
            encode_choice(PredictionType::HighLow, &[1, 2, 3, 4], 2),
            Err(EncodeError::BlockedPick(2))
        );
    }

    #[test]
    fn even_odd_matches_parity_partition() {
        // Blocked 5: evens [2,4,6,8], odds [1,3,7,9].
        assert_eq!(
            encode_choice(PredictionType::EvenOdd, &[2, 4, 6, 8], 5),
            Ok(0)
        );
        assert_eq!(
            encode_choice(PredictionType::EvenOdd, &[1, 3, 7, 9], 5),
            Ok(1)
        );
        // Blocked 4: odds keep all five members.
        assert_eq!(
            encode_choice(PredictionType::EvenOdd, &[1, 3, 5, 7, 9], 4),
            Ok(1)
        );
        assert_eq!(
            encode_choice(PredictionType::EvenOdd, &[2, 4, 6, 8], 4),
            Err(EncodeError::BlockedPick(4))
        );
    }

    #[test]
    fn bad_blocked_number_is_rejected() {
        assert_eq!(
            encode_choice(PredictionType::SingleNumber, &[1], 0),
            Err(EncodeError::BadBlockedNumber(0))
        );
    }

    #[test]
    fn derive_rejects_mode_above_one_for_presets() {
        assert_eq!(
            derive_selections(PredictionType::HighLow.as_u8(), 2, 5),
            Err(EncodeError::PresetMismatch)
        );
    }

    fn arb_pick_set() -> impl Strategy<Value = (Vec<u8>, u8)> {
        // (picks drawn from 1..=9 minus blocked, blocked number)
        (1u8..=9).prop_flat_map(|blocked| {
            let pool: Vec<u8> = (1u8..=9).filter(move |&n| n != blocked).collect();
            proptest::sample::subsequence(pool, 1..=8)
                .prop_map(move |picks| (picks, blocked))
        })
    }

    proptest! {
        #[test]
        fn digit_encoding_round_trips((picks, blocked) in arb_pick_set()) {
            let ty = match picks.len() {
                1 => PredictionType::SingleNumber,
                2 => PredictionType::TwoNumbers,
                _ => PredictionType::MultiNumber,
            };
            let choice = encode_choice(ty, &picks, blocked).unwrap();
            let (count, arr, mask) =
                derive_selections(ty.as_u8(), choice, blocked).unwrap();

            let mut expected = picks.clone();
            expected.sort_unstable();
            prop_assert_eq!(usize::from(count), expected.len());
            prop_assert_eq!(&arr[..usize::from(count)], &expected[..]);

            let expected_mask = expected
                .iter()
                .fold(0u16, |m, &d| m | (1u16 << d));
            prop_assert_eq!(mask, expected_mask);
        }

        #[test]
        fn preset_modes_round_trip(blocked in 1u8..=9, high in proptest::bool::ANY) {
            let eligible = eligible_numbers(blocked).unwrap();
            let picks: Vec<u8> = if high {
                eligible[4..].to_vec()
            } else {
                eligible[..4].to_vec()
            };
            let choice = encode_choice(PredictionType::HighLow, &picks, blocked).unwrap();
            prop_assert_eq!(choice, u32::from(high));
            let (count, arr, _) =
                derive_selections(PredictionType::HighLow.as_u8(), choice, blocked).unwrap();
            prop_assert_eq!(&arr[..usize::from(count)], &picks[..]);
        }
    }
}
