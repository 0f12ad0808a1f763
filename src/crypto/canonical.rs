// src/crypto/canonical.rs
// Canonical serialisation: every hash and signature in this crate is taken
// over this encoding, never over a struct's declared field order directly.

use serde::Serialize;

/// Encode `value` as canonical JSON: keys sorted lexicographically at every
/// nesting level.
///
/// This crate never enables serde_json's `preserve_order` feature, so
/// `serde_json::Map` is backed by a `BTreeMap`. Routing a value through
/// `to_value` before re-serialising therefore sorts every object's keys for
/// free — this is the only place that guarantee is relied on, so it is the
/// only place it needs to be documented.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let sorted = serde_json::to_value(value).expect("canonical value is always serializable");
    serde_json::to_vec(&sorted).expect("sorted Value always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_level() {
        let a = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let b = json!({"a": {"c": 3, "d": 2}, "b": 1});
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
    }
}
