use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

/// Length of identifiers returned by [`generate_id`].
pub const ID_LENGTH: usize = 22;

/// Generate a short, URL-safe unique identifier.
///
/// Meant for externally visible identifiers that should not leak the
/// auto-increment keys used as primary keys. The value is a random UUID v4
/// encoded as unpadded base64url, always [`ID_LENGTH`] characters long.
pub fn generate_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_short_and_url_safe() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
