//! Client-side entity ID generation.
//!
//! IDs are minted before any network interaction so that an optimistic
//! mutation and its eventual server echo refer to the same entity. The
//! scheme is `<type>-<unix-millis>-<random suffix>`, unique within a
//! process and readable enough to debug from a log line.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of the random suffix appended after the timestamp.
const SUFFIX_LEN: usize = 6;

/// Generate a fresh entity ID with the given type prefix.
///
/// # Example
///
/// ```
/// let id = lectern_model::generate_id("slot");
/// assert!(id.starts_with("slot-"));
/// ```
pub fn generate_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let c = rng.gen_range(0..36u32);
            char::from_digit(c, 36).unwrap_or('0')
        })
        .collect();

    format!("{}-{}-{}", prefix, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_has_prefix_and_parts() {
        let id = generate_id("slot");
        let parts: Vec<&str> = id.splitn(3, '-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "slot");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_id("msg")));
        }
    }
}
