//! CMS document identity conventions.
//!
//! Bilingual documents share a base ID and differ only by suffix:
//! `<base>-id` is the explicit Indonesian variant, `<base>-main` the
//! language-agnostic legacy default, and `<base>-en` the derived English
//! variant written by the translation pipeline.

const INDONESIAN_SUFFIX: &str = "-id";
const MAIN_SUFFIX: &str = "-main";
const ENGLISH_SUFFIX: &str = "-en";

/// Derive the English document ID for a source document.
///
/// A pure function of the string suffix: `-id` and `-main` are replaced by
/// `-en`; any other suffix gets `-en` appended.
pub fn target_document_id(source_id: &str) -> String {
    if let Some(base) = source_id.strip_suffix(INDONESIAN_SUFFIX) {
        format!("{base}{ENGLISH_SUFFIX}")
    } else if let Some(base) = source_id.strip_suffix(MAIN_SUFFIX) {
        format!("{base}{ENGLISH_SUFFIX}")
    } else {
        format!("{source_id}{ENGLISH_SUFFIX}")
    }
}

/// All document IDs the read path considers for one section base.
pub fn variant_ids(base: &str) -> [String; 3] {
    [
        format!("{base}{INDONESIAN_SUFFIX}"),
        format!("{base}{MAIN_SUFFIX}"),
        format!("{base}{ENGLISH_SUFFIX}"),
    ]
}
