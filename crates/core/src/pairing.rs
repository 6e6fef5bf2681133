//! Pairing-code generation and expiry rules.
//!
//! A pairing code is a one-time secret: short-lived, consumed exactly once.
//! Consumption exclusivity is enforced in the database layer; this module
//! owns the code format and the passive expiry check.

use rand::Rng;

use crate::types::Timestamp;

/// Code alphabet: uppercase letters and digits minus the lookalikes
/// (I, O, 0, 1) since codes are read aloud or typed by hand.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of dash-separated groups in a code.
const CODE_GROUPS: usize = 4;

/// Characters per group.
const CODE_GROUP_LEN: usize = 5;

/// Generate a cryptographically random pairing code.
///
/// Format: `XXXXX-XXXXX-XXXXX-XXXXX` (20 alphabet chars, ~100 bits of
/// entropy). `rand`'s thread RNG is a CSPRNG, so codes are not guessable.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let mut groups = Vec::with_capacity(CODE_GROUPS);
    for _ in 0..CODE_GROUPS {
        let group: String = (0..CODE_GROUP_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        groups.push(group);
    }
    groups.join("-")
}

/// Normalize an operator- or agent-supplied code before lookup.
///
/// Codes are stored uppercase; tolerate surrounding whitespace and
/// lowercase input from manual entry.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Passive expiry check, evaluated at exchange time (no active timers).
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now >= expires_at
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn generated_code_has_expected_shape() {
        let code = generate_code();
        let groups: Vec<&str> = code.split('-').collect();
        assert_eq!(groups.len(), CODE_GROUPS);
        for group in groups {
            assert_eq!(group.len(), CODE_GROUP_LEN);
            assert!(group.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn generated_codes_are_distinct() {
        // Collision over a handful of draws would indicate a broken RNG.
        let codes: std::collections::HashSet<String> =
            (0..64).map(|_| generate_code()).collect();
        assert_eq!(codes.len(), 64);
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_code("  abcde-fghjk-lmnpq-rstuv "), "ABCDE-FGHJK-LMNPQ-RSTUV");
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(is_expired(now, now));
        assert!(is_expired(now - Duration::seconds(1), now));
        assert!(!is_expired(now + Duration::seconds(1), now));
    }
}
