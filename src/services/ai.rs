use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

use crate::core::effects::{Effect, HapticPulse};
use crate::core::prompts::{self, TextPrompt, ANIMATE_PROMPT, ASSISTANT_EMPTY_REPLY, ASSISTANT_FAILURE_REPLY};
use crate::models::{GroundingKind, GroundingLink, LatLng, Profile};
use crate::services::cache::{CacheKey, ResponseCache};
use crate::services::genai::{GenAiError, GenerativeService, InlineImage};

pub const CAPTION_FAILURE_NOTICE: &str = "Caption Genius currently unavailable.";
pub const MAGIC_EDIT_FAILURE_NOTICE: &str = "Magic Edit currently unavailable.";
pub const ANIMATE_FAILURE_NOTICE: &str = "Animation failed. Ensure you have a valid paid API key selected.";
pub const API_KEY_NOTICE: &str = "API Key error. Please re-select your paid project key.";
pub const ARCHITECT_FAILURE_NOTICE: &str = "Scene Architect currently unavailable.";
pub const SUGGESTION_FALLBACK: &str = "Something intentional...";

/// Failures of the generative features, each with the notice shown to the user
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{notice}")]
    Service {
        notice: &'static str,
        #[source]
        source: GenAiError,
    },

    #[error("Unknown prompt field: {0}")]
    UnknownField(String),

    #[error("Photo is not a data URL")]
    InvalidPhoto,
}

impl AiError {
    fn service(notice: &'static str) -> impl FnOnce(GenAiError) -> AiError {
        move |source| {
            tracing::error!("Generative call failed: {}", source);
            AiError::Service { notice, source }
        }
    }

    /// User-facing text for this failure
    pub fn notice(&self) -> String {
        self.to_string()
    }
}

/// Generated text plus what the shell should do with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiText {
    pub text: String,
    pub grounding: Vec<GroundingLink>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedText {
    text: String,
    grounding: Vec<GroundingLink>,
}

/// The generative features of the app on top of a [`GenerativeService`]
pub struct AiFeatures {
    service: Arc<dyn GenerativeService>,
    cache: Arc<ResponseCache>,
}

impl AiFeatures {
    pub fn new(service: Arc<dyn GenerativeService>, cache: Arc<ResponseCache>) -> Self {
        Self { service, cache }
    }

    async fn generate(&self, prompt: &TextPrompt) -> Result<CachedText, GenAiError> {
        let key = CacheKey::generated(&prompt.cache_key());
        if let Ok(cached) = self.cache.get::<CachedText>(&key).await {
            return Ok(cached);
        }

        let generated = self.service.generate_text(prompt).await?;
        let result = CachedText {
            text: generated.text,
            grounding: generated.grounding,
        };

        if !result.text.trim().is_empty() {
            if let Err(e) = self.cache.set(&key, &result).await {
                tracing::warn!("Failed to cache {} response: {}", prompt.feature.as_str(), e);
            }
        }
        Ok(result)
    }

    /// Generate, strip quotes, and treat blank text as a failure
    async fn generate_stripped(&self, prompt: &TextPrompt) -> Result<CachedText, GenAiError> {
        let mut result = self.generate(prompt).await?;
        result.text = prompts::strip_quotes(result.text.trim());
        if result.text.is_empty() {
            return Err(GenAiError::EmptyResponse);
        }
        Ok(result)
    }

    /// Date proposal for a sesh request, grounded on real venues
    pub async fn icebreaker(&self, target: &Profile, lat_lng: Option<LatLng>) -> Result<AiText, AiError> {
        let result = self
            .generate_stripped(&prompts::icebreaker(target, lat_lng))
            .await
            .map_err(AiError::service(ARCHITECT_FAILURE_NOTICE))?;

        Ok(AiText {
            text: result.text,
            grounding: result.grounding,
            effects: vec![Effect::Haptic(HapticPulse::MEDIUM)],
        })
    }

    pub async fn captions(&self, user: &Profile) -> Result<AiText, AiError> {
        let result = self
            .generate(&prompts::captions(user))
            .await
            .and_then(|r| {
                if r.text.trim().is_empty() {
                    Err(GenAiError::EmptyResponse)
                } else {
                    Ok(r)
                }
            })
            .map_err(AiError::service(CAPTION_FAILURE_NOTICE))?;

        Ok(AiText {
            text: result.text,
            grounding: Vec::new(),
            effects: vec![Effect::Haptic(HapticPulse::SUCCESS)],
        })
    }

    /// Draft message replacing small talk in a thread
    pub async fn skip_small_talk(&self, user: &Profile) -> Result<AiText, AiError> {
        let result = self
            .generate_stripped(&prompts::skip_small_talk(user))
            .await
            .map_err(AiError::service(ARCHITECT_FAILURE_NOTICE))?;

        Ok(AiText {
            text: result.text,
            grounding: Vec::new(),
            effects: vec![Effect::Haptic(HapticPulse::SUCCESS)],
        })
    }

    pub async fn host_vision(&self, user: &Profile) -> Result<AiText, AiError> {
        let result = self
            .generate_stripped(&prompts::host_vision(user))
            .await
            .map_err(AiError::service(ARCHITECT_FAILURE_NOTICE))?;

        Ok(AiText {
            text: result.text,
            grounding: Vec::new(),
            effects: vec![Effect::Haptic(HapticPulse::SUCCESS)],
        })
    }

    /// Suggested answer for a profile prompt; blank output falls back to a
    /// stock line
    pub async fn prompt_suggestion(&self, user: &Profile, field: &str) -> Result<AiText, AiError> {
        let prompt = prompts::prompt_suggestion(user, field)
            .ok_or_else(|| AiError::UnknownField(field.to_string()))?;

        let text = match self.generate_stripped(&prompt).await {
            Ok(result) => result.text,
            Err(GenAiError::EmptyResponse) => SUGGESTION_FALLBACK.to_string(),
            Err(e) => return Err(AiError::service(ARCHITECT_FAILURE_NOTICE)(e)),
        };

        Ok(AiText {
            text,
            grounding: Vec::new(),
            effects: vec![Effect::Haptic(HapticPulse::LIGHT)],
        })
    }

    /// Scene assistant reply. Never fails: errors become a stock reply.
    pub async fn assistant(&self, message: &str, lat_lng: Option<LatLng>) -> AiText {
        match self.generate(&prompts::assistant(message, lat_lng)).await {
            Ok(result) => {
                let text = if result.text.trim().is_empty() {
                    ASSISTANT_EMPTY_REPLY.to_string()
                } else {
                    result.text
                };
                let grounding = result
                    .grounding
                    .into_iter()
                    .filter(|link| link.kind == GroundingKind::Maps)
                    .collect();
                AiText {
                    text,
                    grounding,
                    effects: vec![Effect::Haptic(HapticPulse::LIGHT)],
                }
            }
            Err(e) => {
                tracing::error!("Assistant call failed: {}", e);
                AiText {
                    text: ASSISTANT_FAILURE_REPLY.to_string(),
                    grounding: Vec::new(),
                    effects: Vec::new(),
                }
            }
        }
    }

    /// Edit a photo; `Ok(None)` when the model returned no image
    pub async fn magic_edit(&self, photo: &str, request: &str) -> Result<Option<(String, Vec<Effect>)>, AiError> {
        let image = inline_from_data_url(photo)?;
        let edited = self
            .service
            .edit_image(&image, &prompts::magic_edit_instruction(request))
            .await
            .map_err(AiError::service(MAGIC_EDIT_FAILURE_NOTICE))?;

        Ok(edited.map(|img| {
            (
                format!("data:{};base64,{}", img.mime_type, img.data),
                vec![Effect::Haptic(HapticPulse::HEAVY)],
            )
        }))
    }

    /// Animate a photo and download the clip
    pub async fn animate(&self, photo: &str) -> Result<Vec<u8>, AiError> {
        let image = inline_from_data_url(photo)?;
        let key = CacheKey::animation(&digest(&image.data));

        let uri = match self.cache.get::<String>(&key).await {
            Ok(uri) => uri,
            Err(_) => {
                let uri = self
                    .service
                    .animate(&image, ANIMATE_PROMPT)
                    .await
                    .map_err(animate_failure)?;
                if let Err(e) = self.cache.set(&key, &uri).await {
                    tracing::warn!("Failed to cache video uri: {}", e);
                }
                uri
            }
        };

        self.service.fetch_video(&uri).await.map_err(animate_failure)
    }
}

fn animate_failure(source: GenAiError) -> AiError {
    let notice = match &source {
        GenAiError::MissingApiKey => API_KEY_NOTICE,
        GenAiError::ApiError { message, .. } if message.contains("Requested entity was not found") => {
            API_KEY_NOTICE
        }
        _ => ANIMATE_FAILURE_NOTICE,
    };
    AiError::service(notice)(source)
}

/// Payload of a data URL, sent as PNG like the shell's canvas export
fn inline_from_data_url(photo: &str) -> Result<InlineImage, AiError> {
    match photo.split_once(',') {
        Some((header, data)) if header.starts_with("data:") && !data.is_empty() => {
            Ok(InlineImage::png(data))
        }
        _ => Err(AiError::InvalidPhoto),
    }
}

fn digest(data: &str) -> String {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
