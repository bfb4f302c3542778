//! Target identifiers: uppercase hyphenated UUID v4 strings.

use uuid::Uuid;

/// Generate a new target identifier.
pub fn new_target_id() -> String {
    let mut buf = Uuid::encode_buffer();
    Uuid::new_v4().hyphenated().encode_upper(&mut buf).to_string()
}

/// Whether `s` is a well-formed target identifier (any case).
pub fn is_target_id(s: &str) -> bool {
    s.len() == uuid::fmt::Hyphenated::LENGTH && Uuid::try_parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_uppercase_uuids() {
        let id = new_target_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id, id.to_uppercase());
        assert!(is_target_id(&id));
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..256).map(|_| new_target_id()).collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!is_target_id(""));
        assert!(!is_target_id("not-a-uuid"));
        // Simple (unhyphenated) form is not accepted.
        assert!(!is_target_id("C6C5B3DC66857698C3D5C3AB7C10B3AC"));
        assert!(is_target_id("c6c5b3dc-6685-7698-3cd5-c3ab7c10b3ac"));
    }
}
