//! Document translation orchestrator: walks an Indonesian source document,
//! translates every eligible string leaf through the cached provider, and
//! persists the English variant under its derived document ID.
//!
//! Sibling subtrees are translated concurrently at each tree level and joined
//! before the parent node is assembled, so the output shape mirrors the input
//! regardless of provider-call completion order.

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::info;

use crate::classify::is_protected_key;
use crate::cms::CmsClient;
use crate::docid::target_document_id;
use crate::error::{AppError, AppResult};
use crate::language::Language;
use crate::translate::Translator;

/// Section types enrolled in auto-translation.
pub const TRANSLATABLE_TYPES: [&str; 8] = [
    "homeProfile",
    "aboutProfile",
    "sidebar",
    "contact",
    "education",
    "job",
    "achievement",
    "project",
];

/// Identity and revision keys stripped from the translated payload before
/// persisting; the target document gets its own.
const STRIPPED_KEYS: [&str; 5] = ["_id", "_type", "_rev", "_createdAt", "_updatedAt"];

pub fn is_translatable_type(schema_type: &str) -> bool {
    TRANSLATABLE_TYPES.contains(&schema_type)
}

fn translate_value<'a>(
    translator: &'a Translator,
    key: Option<&'a str>,
    value: &'a Value,
) -> BoxFuture<'a, AppResult<Value>> {
    async move {
        match value {
            Value::String(_) if key.map(is_protected_key).unwrap_or(false) => Ok(value.clone()),
            Value::String(text) => {
                let translated = translator
                    .translate_cached(text, Language::Indonesian, Language::English)
                    .await?;
                Ok(Value::String(translated))
            }
            // Array elements inherit the parent key, so a protected array
            // (e.g. tags) stays protected element-by-element.
            Value::Array(items) => {
                let translated = future::try_join_all(
                    items.iter().map(|item| translate_value(translator, key, item)),
                )
                .await?;
                Ok(Value::Array(translated))
            }
            Value::Object(map) => {
                let fields = future::try_join_all(map.iter().map(|(k, v)| async move {
                    if k.starts_with('_') {
                        Ok::<(String, Value), AppError>((k.clone(), v.clone()))
                    } else {
                        let translated = translate_value(translator, Some(k.as_str()), v).await?;
                        Ok((k.clone(), translated))
                    }
                }))
                .await?;
                Ok(Value::Object(fields.into_iter().collect()))
            }
            // Numbers, booleans, null pass through unchanged.
            _ => Ok(value.clone()),
        }
    }
    .boxed()
}

/// Translate `source_document` and create-or-replace the English variant.
/// Returns the target document ID.
pub async fn translate_document(
    translator: &Translator,
    cms: &CmsClient,
    source_id: &str,
    schema_type: &str,
    source_document: &Value,
) -> AppResult<String> {
    if !is_translatable_type(schema_type) {
        return Err(AppError::InvalidPayload(format!(
            "schema type '{schema_type}' is not translatable"
        )));
    }
    if !source_document.is_object() {
        return Err(AppError::InvalidPayload(
            "document must be a JSON object".to_string(),
        ));
    }

    let translated = translate_value(translator, None, source_document).await?;

    let mut fields: Map<String, Value> = translated
        .as_object()
        .cloned()
        .unwrap_or_default();
    for key in STRIPPED_KEYS {
        fields.remove(key);
    }

    let target_id = target_document_id(source_id);
    fields.insert("_id".to_string(), Value::String(target_id.clone()));
    fields.insert(
        "_type".to_string(),
        Value::String(schema_type.to_string()),
    );
    fields.insert(
        "language".to_string(),
        Value::String(Language::English.code().to_string()),
    );

    cms.create_or_replace(Value::Object(fields)).await?;

    info!("Translated {source_id} -> {target_id}");
    Ok(target_id)
}
