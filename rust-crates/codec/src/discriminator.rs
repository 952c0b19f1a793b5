//! Anchor-style 8-byte type tags.
//!
//! Accounts are prefixed with `sha256("account:<TypeName>")[..8]`;
//! instruction data starts with `sha256("global:<method_name>")[..8]`.

use sha2::{
    Digest,
    Sha256,
};

pub const LEN: usize = 8;

pub fn account(type_name: &str) -> [u8; LEN] {
    tag("account", type_name)
}

pub fn instruction(method_name: &str) -> [u8; LEN] {
    tag("global", method_name)
}

fn tag(namespace: &str, name: &str) -> [u8; LEN] {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; LEN];
    out.copy_from_slice(&digest[..LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_and_instruction_tags_differ_for_same_name() {
        assert_ne!(account("Prediction"), instruction("Prediction"));
    }

    #[test]
    fn tags_are_stable() {
        assert_eq!(account("Config"), account("Config"));
        assert_eq!(instruction("place_prediction"), instruction("place_prediction"));
    }
}
