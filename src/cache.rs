//! Translation memoization keys.
//!
//! Cache entries live in the CMS as ordinary documents so translations
//! survive process restarts. The key is a content hash of the target
//! language and the normalized source text, which makes the entry ID a
//! pure function of the input: the same sentence never pays for a second
//! provider call, and concurrent misses converge on the same document
//! (last write wins). Entries are never invalidated.

use chrono::Utc;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::language::Language;

/// CMS document type used for cache entries.
pub const CACHE_DOC_TYPE: &str = "translationCache";

/// Hex SHA-256 of `"<target>:<trimmed text>"`.
pub fn cache_key(target: Language, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target.code().as_bytes());
    hasher.update(b":");
    hasher.update(text.trim().as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Deterministic document ID for a cache key.
pub fn cache_document_id(key: &str) -> String {
    format!("{CACHE_DOC_TYPE}.{key}")
}

/// Build the cache entry document persisted on every successful translation.
pub fn cache_entry(
    key: &str,
    source_text: &str,
    target: Language,
    translated: &str,
    provider: &str,
) -> Value {
    json!({
        "_id": cache_document_id(key),
        "_type": CACHE_DOC_TYPE,
        "sourceText": source_text.trim(),
        "targetLang": target.code(),
        "translatedText": translated,
        "provider": provider,
        "updatedAt": Utc::now().to_rfc3339(),
    })
}

/// Extract a usable cached translation from a fetched entry, if any.
/// Empty stored values count as a miss.
pub fn cached_translation(entry: &Value) -> Option<&str> {
    entry
        .get("translatedText")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}
