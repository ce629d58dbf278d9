//! Bilingual read path: picks the best document variant for a requested
//! language.
//!
//! Indonesian is the canonical language, so untagged legacy documents count
//! as Indonesian; English only falls back to them as a late tier. The
//! asymmetry between the two chains is deliberate and preserved:
//!
//! - `id`: exact `id` tag -> untagged/"main" -> most recently updated of any
//! - `en`: most recently updated `en` tag -> untagged -> most recently
//!   updated of any

use serde_json::Value;

use crate::cms::CmsClient;
use crate::docid::variant_ids;
use crate::error::AppResult;
use crate::language::Language;

fn doc_language(doc: &Value) -> Option<&str> {
    doc.get("language").and_then(Value::as_str)
}

fn updated_at(doc: &Value) -> &str {
    // RFC 3339 UTC timestamps compare correctly as strings.
    doc.get("_updatedAt").and_then(Value::as_str).unwrap_or("")
}

fn is_untagged(doc: &Value) -> bool {
    matches!(doc_language(doc), None | Some("") | Some("main"))
}

fn most_recent<'a, I>(docs: I) -> Option<&'a Value>
where
    I: Iterator<Item = &'a Value>,
{
    docs.max_by(|a, b| updated_at(a).cmp(updated_at(b)))
}

/// Select the best candidate for the requested language.
pub fn pick_for_language<'a>(
    language: Language,
    candidates: &'a [Value],
) -> Option<&'a Value> {
    match language {
        Language::Indonesian => most_recent(
            candidates
                .iter()
                .filter(|d| doc_language(d) == Some("id")),
        )
        .or_else(|| most_recent(candidates.iter().filter(|d| is_untagged(d))))
        .or_else(|| most_recent(candidates.iter())),
        Language::English => most_recent(
            candidates
                .iter()
                .filter(|d| doc_language(d) == Some("en")),
        )
        .or_else(|| most_recent(candidates.iter().filter(|d| is_untagged(d))))
        .or_else(|| most_recent(candidates.iter())),
    }
}

/// Fetch all variants of a section from the CMS and resolve one for the
/// requested language. `None` when no variant exists at all.
pub async fn resolve_section(
    cms: &CmsClient,
    base: &str,
    language: Language,
) -> AppResult<Option<Value>> {
    let ids = variant_ids(base);
    let candidates = cms.fetch_by_ids(&ids).await?;
    Ok(pick_for_language(language, &candidates).cloned())
}
