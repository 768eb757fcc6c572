//! Stable hashing for parameter identifiers.

/// FNV-1a 32-bit hash of a string.
///
/// Maps a human-readable parameter id such as `"triggerNote"` to the numeric
/// id that hosts address parameters by. The result is identical across platforms and
/// compiler versions, which keeps automation lanes and saved sessions valid
/// between builds.
///
/// Works in `const` context:
///
/// ```
/// use notegate_utils::fnv1a_32;
///
/// const TRIGGER_NOTE: u32 = fnv1a_32("triggerNote");
/// assert_eq!(TRIGGER_NOTE, fnv1a_32("triggerNote"));
/// ```
///
/// `#[derive(Parameters)]` rejects structs whose ids hash to the same value.
#[inline]
pub const fn fnv1a_32(s: &str) -> u32 {
    const OFFSET_BASIS: u32 = 2166136261;
    const PRIME: u32 = 16777619;

    let bytes = s.as_bytes();
    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_offset_basis() {
        assert_eq!(fnv1a_32(""), 2166136261);
    }

    #[test]
    fn known_vector() {
        assert_eq!(fnv1a_32("a"), 0xe40c292c);
    }

    #[test]
    fn usable_in_const_context() {
        const ID: u32 = fnv1a_32("triggerNote");
        assert_eq!(ID, fnv1a_32("triggerNote"));
    }

    #[test]
    fn distinct_ids_hash_apart() {
        assert_ne!(fnv1a_32("triggerNote"), fnv1a_32("triggerVelocity"));
        assert_ne!(fnv1a_32("a"), fnv1a_32("b"));
    }
}
