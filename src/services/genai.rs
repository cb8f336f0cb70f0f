use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::GenAiSettings;
use crate::core::prompts::{TextPrompt, Tool, IMAGE_MODEL, VIDEO_MODEL};
use crate::models::{GroundingKind, GroundingLink};

/// Polls before a video operation is given up on
const MAX_OPERATION_POLLS: u32 = 60;

/// Errors that can occur when calling the generative API
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Response contained no usable content")]
    EmptyResponse,

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Operation still running after {0} polls")]
    OperationTimeout(u32),
}

/// Base64 image passed inline with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data: data.into(),
        }
    }
}

/// Text answer plus the sources it was grounded on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedText {
    pub text: String,
    #[serde(default)]
    pub grounding: Vec<GroundingLink>,
}

/// Hosted generative model. One request, one response; no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate_text(&self, prompt: &TextPrompt) -> Result<GeneratedText, GenAiError>;

    /// Edit a photo following an instruction; `None` when no image came back
    async fn edit_image(
        &self,
        image: &InlineImage,
        instruction: &str,
    ) -> Result<Option<InlineImage>, GenAiError>;

    /// Animate a photo into a short clip and return the video URI
    async fn animate(&self, image: &InlineImage, prompt: &str) -> Result<String, GenAiError>;

    /// Download a generated video
    async fn fetch_video(&self, uri: &str) -> Result<Vec<u8>, GenAiError>;
}

/// Gemini REST client
#[derive(Clone)]
pub struct GenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl GenAiClient {
    pub fn new(settings: &GenAiSettings) -> Result<Self, GenAiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn key(&self) -> Result<String, GenAiError> {
        if !self.has_api_key() {
            return Err(GenAiError::MissingApiKey);
        }
        Ok(urlencoding::encode(&self.api_key).into_owned())
    }

    fn model_url(&self, model: &str, method: &str) -> Result<String, GenAiError> {
        Ok(format!(
            "{}/models/{}:{}?key={}",
            self.base_url,
            model,
            method,
            self.key()?
        ))
    }

    async fn post<B, R>(&self, url: String, body: &B) -> Result<R, GenAiError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self.client.post(url).json(body).send().await?;
        Self::parse(response).await
    }

    async fn parse<R>(response: reqwest::Response) -> Result<R, GenAiError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, body));
        }
        Ok(response.json().await?)
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse, GenAiError> {
        let url = self.model_url(model, "generateContent")?;
        self.post(url, request).await
    }
}

#[async_trait]
impl GenerativeService for GenAiClient {
    async fn generate_text(&self, prompt: &TextPrompt) -> Result<GeneratedText, GenAiError> {
        tracing::debug!("Generating {} with {}", prompt.feature.as_str(), prompt.model);
        let request = GenerateContentRequest::from_prompt(prompt);
        let response = self.generate(&prompt.model, &request).await?;
        Ok(extract_text(response))
    }

    async fn edit_image(
        &self,
        image: &InlineImage,
        instruction: &str,
    ) -> Result<Option<InlineImage>, GenAiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData { inline_data: image.clone() },
                    Part::Text { text: instruction.to_string() },
                ],
            }],
            system_instruction: None,
            tools: Vec::new(),
            tool_config: None,
        };
        let response = self.generate(IMAGE_MODEL, &request).await?;
        Ok(extract_image(response))
    }

    async fn animate(&self, image: &InlineImage, prompt: &str) -> Result<String, GenAiError> {
        let url = self.model_url(VIDEO_MODEL, "predictLongRunning")?;
        let request = serde_json::json!({
            "instances": [{
                "prompt": prompt,
                "image": {
                    "bytesBase64Encoded": image.data,
                    "mimeType": image.mime_type,
                }
            }],
            "parameters": {
                "numberOfVideos": 1,
                "resolution": "720p",
                "aspectRatio": "9:16",
            }
        });

        let mut operation: Operation = self.post(url, &request).await?;
        tracing::info!("Video operation started: {}", operation.name);

        let mut polls = 0;
        while !operation.done {
            if polls >= MAX_OPERATION_POLLS {
                return Err(GenAiError::OperationTimeout(polls));
            }
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let url = format!("{}/{}?key={}", self.base_url, operation.name, self.key()?);
            let response = self.client.get(url).send().await?;
            operation = Self::parse(response).await?;
            tracing::debug!("Video operation {} poll {}: done={}", operation.name, polls, operation.done);
        }

        if let Some(error) = operation.error {
            return Err(GenAiError::OperationFailed(error.message.unwrap_or_default()));
        }

        operation
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .map(|v| v.uri)
            .ok_or(GenAiError::EmptyResponse)
    }

    async fn fetch_video(&self, uri: &str) -> Result<Vec<u8>, GenAiError> {
        let separator = if uri.contains('?') { '&' } else { '?' };
        let url = format!("{}{}key={}", uri, separator, self.key()?);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, body));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<serde_json::Value>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: &TextPrompt) -> Self {
        let tools = prompt
            .tools
            .iter()
            .map(|tool| match tool {
                Tool::GoogleSearch => serde_json::json!({ "googleSearch": {} }),
                Tool::GoogleMaps => serde_json::json!({ "googleMaps": {} }),
            })
            .collect();

        let tool_config = prompt.lat_lng.map(|lat_lng| {
            serde_json::json!({ "retrievalConfig": { "latLng": lat_lng } })
        });

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text { text: prompt.contents.clone() }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text { text: prompt.system_instruction.clone() }],
            }),
            tools,
            tool_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<GroundingSource>,
    maps: Option<GroundingSource>,
}

#[derive(Debug, Deserialize)]
struct GroundingSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<ErrorBody>,
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> GeneratedText {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return GeneratedText::default();
    };

    let text = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    let grounding = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| {
            let (kind, source) = match (chunk.web, chunk.maps) {
                (Some(web), _) => (GroundingKind::Web, web),
                (None, Some(maps)) => (GroundingKind::Maps, maps),
                (None, None) => return None,
            };
            Some(GroundingLink {
                kind,
                uri: source.uri?,
                title: source.title.unwrap_or_else(|| "View Source".to_string()),
            })
        })
        .collect();

    GeneratedText { text, grounding }
}

/// First inline image of the first candidate
fn extract_image(response: GenerateContentResponse) -> Option<InlineImage> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.inline_data)
}

fn map_http_error(status: StatusCode, body: String) -> GenAiError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    GenAiError::ApiError {
        status: status.as_u16(),
        message,
    }
}
