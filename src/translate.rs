//! Translation providers with failover, plus the cached entry point used by
//! the document pipeline.
//!
//! Provider order: the general translation API is tried first when its key is
//! configured; on any failure the LLM fallback takes over if its key is
//! configured, otherwise the original error propagates. The LLM side walks an
//! ordered model candidate list: a 404 for a model moves to the next
//! candidate, any other non-2xx is terminal, and an empty completion counts
//! as a failure for that candidate. No retries or backoff beyond that.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache;
use crate::cms::CmsClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::language::Language;

/// LLM fallback model candidates, tried in order.
pub const FALLBACK_MODELS: [&str; 3] = [
    "meta-llama/llama-3.3-70b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "mistralai/mistral-7b-instruct:free",
];

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

fn build_llm_system_prompt(source: Language, target: Language) -> String {
    format!(
        "You are a professional translator. Translate the user's text from {} to {}.\n\
         Do not translate proper names, URLs, email addresses, or social media handles.\n\
         Respond with the translated text only, no explanations.",
        source.name(),
        target.name()
    )
}

#[derive(Clone)]
pub struct Translator {
    client: reqwest::Client,
    cms: CmsClient,
    translate_api_url: String,
    translate_api_key: Option<String>,
    openrouter_api_url: String,
    openrouter_api_key: Option<String>,
}

impl Translator {
    pub fn new(
        client: reqwest::Client,
        cms: CmsClient,
        translate_api_url: impl Into<String>,
        translate_api_key: Option<String>,
        openrouter_api_url: impl Into<String>,
        openrouter_api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            cms,
            translate_api_url: translate_api_url.into(),
            translate_api_key,
            openrouter_api_url: openrouter_api_url.into(),
            openrouter_api_key,
        }
    }

    pub fn from_config(client: reqwest::Client, cms: CmsClient, config: &Config) -> Self {
        Self::new(
            client,
            cms,
            config.translate_api_url.clone(),
            config.translate_api_key.clone(),
            config.openrouter_api_url.clone(),
            config.openrouter_api_key.clone(),
        )
    }

    /// Translate one string, with provider failover.
    /// Returns the translated text and the provider that produced it.
    pub async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> AppResult<(String, &'static str)> {
        match (&self.translate_api_key, &self.openrouter_api_key) {
            (Some(key), fallback_key) => {
                match self.translate_primary(key, text, source, target).await {
                    Ok(translated) => Ok((translated, "google")),
                    Err(err) => {
                        if let Some(fallback) = fallback_key {
                            warn!("Primary translation failed, falling back to LLM: {err}");
                            let translated =
                                self.translate_llm(fallback, text, source, target).await?;
                            Ok((translated, "openrouter"))
                        } else {
                            Err(err)
                        }
                    }
                }
            }
            (None, Some(fallback)) => {
                let translated = self.translate_llm(fallback, text, source, target).await?;
                Ok((translated, "openrouter"))
            }
            (None, None) => Err(AppError::Provider(
                "no translation provider configured".to_string(),
            )),
        }
    }

    /// Memoized translation: empty input short-circuits, a stored
    /// non-empty entry short-circuits, and every fresh translation overwrites
    /// the entry under its deterministic ID.
    pub async fn translate_cached(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> AppResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let key = cache::cache_key(target, text);
        let entry_id = cache::cache_document_id(&key);

        if let Some(entry) = self.cms.fetch_by_id(&entry_id).await? {
            if let Some(cached) = cache::cached_translation(&entry) {
                debug!("Translation cache hit for {entry_id}");
                return Ok(cached.to_string());
            }
        }

        let (translated, provider) = self.translate(text, source, target).await?;

        self.cms
            .create_or_replace(cache::cache_entry(
                &key,
                text,
                target,
                &translated,
                provider,
            ))
            .await?;

        Ok(translated)
    }

    async fn translate_primary(
        &self,
        api_key: &str,
        text: &str,
        source: Language,
        target: Language,
    ) -> AppResult<String> {
        let response = self
            .client
            .post(&self.translate_api_url)
            .query(&[("key", api_key)])
            .json(&json!({
                "q": text,
                "source": source.code(),
                "target": target.code(),
                "format": "text",
            }))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("translation API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "translation API error ({status}): {body}"
            )));
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| {
            AppError::Provider(format!("failed to parse translation API response: {e}"))
        })?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| {
                AppError::Provider("translation API response contained no translations".to_string())
            })
    }

    async fn translate_llm(
        &self,
        api_key: &str,
        text: &str,
        source: Language,
        target: Language,
    ) -> AppResult<String> {
        let mut last_error = None;

        for model in FALLBACK_MODELS {
            let request = ChatRequest {
                model: model.to_string(),
                messages: vec![
                    Message {
                        role: "system".to_string(),
                        content: build_llm_system_prompt(source, target),
                    },
                    Message {
                        role: "user".to_string(),
                        content: text.to_string(),
                    },
                ],
                temperature: 0.2,
            };

            let response = self
                .client
                .post(&self.openrouter_api_url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&request)
                .send()
                .await
                .map_err(|e| AppError::Provider(format!("LLM request failed: {e}")))?;

            let status = response.status();
            if status.as_u16() == 404 {
                // Model not available on this provider, move down the list.
                debug!("Model {model} not found, trying next candidate");
                last_error = Some(AppError::Provider(format!("model {model} not found")));
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Provider(format!(
                    "LLM API error ({status}): {body}"
                )));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| AppError::Provider(format!("failed to parse LLM response: {e}")))?;

            let content = parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default();

            if content.trim().is_empty() {
                warn!("Model {model} returned an empty completion, trying next candidate");
                last_error = Some(AppError::Provider(format!(
                    "model {model} returned an empty completion"
                )));
                continue;
            }

            info!("LLM fallback translated via {model}");
            return Ok(content.trim().to_string());
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Provider("all fallback models failed".to_string())))
    }
}
