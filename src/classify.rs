//! Decides which string leaves of a content document may be machine-translated.
//!
//! Structural and identifying fields (IDs, slugs, URLs, contact handles, dates,
//! tag arrays) must survive translation byte-for-byte. The key match is
//! case-insensitive, and array elements inherit the key of the parent field,
//! so an array of tags stays protected as a whole.

/// Field names whose string values are never sent to a translation provider.
pub const PROTECTED_KEYS: [&str; 22] = [
    "_id",
    "_type",
    "_rev",
    "_createdAt",
    "_updatedAt",
    "language",
    "slug",
    "profileImage",
    "image",
    "logo",
    "link",
    "githubLink",
    "url",
    "email",
    "whatsapp",
    "linkedin",
    "instagram",
    "tiktok",
    "github",
    "tags",
    "startDate",
    "endDate",
];

/// True when a string value under `key` must be copied verbatim.
pub fn is_protected_key(key: &str) -> bool {
    PROTECTED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_keys_protected() {
        assert!(is_protected_key("_id"));
        assert!(is_protected_key("_type"));
        assert!(is_protected_key("_rev"));
        assert!(is_protected_key("_createdAt"));
        assert!(is_protected_key("_updatedAt"));
    }

    #[test]
    fn test_structural_keys_protected() {
        assert!(is_protected_key("language"));
        assert!(is_protected_key("slug"));
        assert!(is_protected_key("url"));
        assert!(is_protected_key("tags"));
        assert!(is_protected_key("startDate"));
        assert!(is_protected_key("endDate"));
    }

    #[test]
    fn test_contact_handles_protected() {
        assert!(is_protected_key("email"));
        assert!(is_protected_key("whatsapp"));
        assert!(is_protected_key("linkedin"));
        assert!(is_protected_key("instagram"));
        assert!(is_protected_key("tiktok"));
        assert!(is_protected_key("github"));
        assert!(is_protected_key("githubLink"));
    }

    #[test]
    fn test_media_keys_protected() {
        assert!(is_protected_key("profileImage"));
        assert!(is_protected_key("image"));
        assert!(is_protected_key("logo"));
        assert!(is_protected_key("link"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(is_protected_key("SLUG"));
        assert!(is_protected_key("Email"));
        assert!(is_protected_key("STARTDATE"));
        assert!(is_protected_key("profileimage"));
    }

    #[test]
    fn test_prose_keys_not_protected() {
        assert!(!is_protected_key("title"));
        assert!(!is_protected_key("description"));
        assert!(!is_protected_key("bio"));
        assert!(!is_protected_key("greeting"));
        assert!(!is_protected_key("role"));
    }

    #[test]
    fn test_near_miss_keys_not_protected() {
        // Only exact (case-insensitive) matches are protected.
        assert!(!is_protected_key("slugline"));
        assert!(!is_protected_key("emailBody"));
        assert!(!is_protected_key("tagline"));
    }
}
