//! [`GeminiClient`]: all four collaborators over the Gemini REST API.
//!
//! Every call is a `POST {base_url}/v1beta/models/{model}:generateContent`.
//! Structured calls request `application/json` with a response schema and
//! read `candidates[0].content.parts[0].text`; speech synthesis requests the
//! `AUDIO` modality and reads base64 PCM16 from
//! `candidates[0].content.parts[0].inlineData`.
//!
//! All connection details (`base_url`, key, model names, voice) come from
//! [`ApiConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::audio::SpeechClip;
use crate::config::{ApiConfig, AppConfig};
use crate::model::{Evaluation, ProcessedContent, Recording, SessionReview};

use super::content::{normalize, ContentSource};
use super::prompt;
use super::{
    ContentIngestor, PronunciationScorer, ReviewEntry, ServiceError, SessionReviewer,
    SpeechSynthesizer,
};

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    client: reqwest::Client,
    api: ApiConfig,
    max_sentences: usize,
    translation_language: String,
    speech_sample_rate: u32,
}

impl GeminiClient {
    /// Build a client from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `api.timeout_secs`; if the builder fails a default client is used.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api: config.api.clone(),
            max_sentences: config.session.max_sentences,
            translation_language: config.session.translation_language.clone(),
            speech_sample_rate: config.audio.speech_sample_rate,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.api.base_url.trim_end_matches('/')
        )
    }

    async fn generate(&self, model: &str, body: &Value) -> Result<Value, ServiceError> {
        let key = self
            .api
            .resolved_api_key()
            .ok_or(ServiceError::MissingApiKey)?;

        log::debug!("services: generateContent model={model}");
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("services: {model} answered HTTP {}", status.as_u16());
            return Err(ServiceError::Status {
                code: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }

    /// Run a structured call and deserialize its JSON answer.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        model: &str,
        parts: Vec<Value>,
        schema: Value,
    ) -> Result<T, ServiceError> {
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });
        let response = self.generate(model, &body).await?;
        parse_json(response_text(&response)?)
    }
}

// ---------------------------------------------------------------------------
// Collaborator impls
// ---------------------------------------------------------------------------

#[async_trait]
impl ContentIngestor for GeminiClient {
    async fn process(&self, source: &ContentSource) -> Result<ProcessedContent, ServiceError> {
        let instruction = prompt::content_instruction(self.max_sentences, &self.translation_language);
        let material = match source {
            ContentSource::Text(text) => json!({ "text": prompt::text_content_part(text) }),
            ContentSource::File { bytes, mime_type } => json!({
                "inlineData": { "mimeType": mime_type, "data": BASE64.encode(bytes) }
            }),
        };
        let instruction_part = match source {
            ContentSource::Text(_) => json!({ "text": instruction }),
            ContentSource::File { .. } => {
                json!({ "text": format!("{instruction}\n{}", prompt::FILE_CONTENT_HINT) })
            }
        };

        let content: ProcessedContent = self
            .generate_json(
                &self.api.content_model,
                vec![instruction_part, material],
                prompt::content_schema(),
            )
            .await?;

        let content = normalize(content)?;
        log::info!(
            "services: \"{}\" ingested with {} sentences",
            content.title,
            content.sentences.len()
        );
        Ok(content)
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str) -> Result<SpeechClip, ServiceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.api.voice }
                    }
                }
            }
        });

        let response = self.generate(&self.api.speech_model, &body).await?;
        let inline = &response["candidates"][0]["content"]["parts"][0]["inlineData"];
        let data = inline["data"]
            .as_str()
            .filter(|d| !d.is_empty())
            .ok_or(ServiceError::EmptyResponse)?;
        let sample_rate = inline["mimeType"]
            .as_str()
            .and_then(rate_from_mime)
            .unwrap_or(self.speech_sample_rate);

        let pcm = BASE64
            .decode(data)
            .map_err(|e| ServiceError::Parse(format!("audio payload: {e}")))?;

        Ok(SpeechClip {
            samples: decode_pcm16(&pcm),
            sample_rate,
            channels: 1,
        })
    }
}

#[async_trait]
impl PronunciationScorer for GeminiClient {
    async fn score(
        &self,
        target_text: &str,
        recording: &Recording,
    ) -> Result<Evaluation, ServiceError> {
        let parts = vec![
            json!({ "text": prompt::scoring_instruction(target_text) }),
            json!({
                "inlineData": {
                    "mimeType": recording.content_type,
                    "data": BASE64.encode(&recording.bytes)
                }
            }),
        ];
        let raw: RawEvaluation = self
            .generate_json(&self.api.scoring_model, parts, prompt::scoring_schema())
            .await?;
        Ok(raw.into_evaluation())
    }
}

#[async_trait]
impl SessionReviewer for GeminiClient {
    async fn review(&self, history: &[ReviewEntry]) -> Result<SessionReview, ServiceError> {
        let parts = vec![json!({ "text": prompt::review_instruction(history) })];
        self.generate_json(&self.api.review_model, parts, prompt::review_schema())
            .await
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Scores arrive as arbitrary integers; they are clamped into `0..=100`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    score: i64,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    pronunciation_tips: String,
}

impl RawEvaluation {
    fn into_evaluation(self) -> Evaluation {
        let score = self.score.clamp(0, 100);
        if score != self.score {
            log::warn!("services: score {} out of range, clamped to {score}", self.score);
        }
        Evaluation {
            score: score as u8,
            feedback: self.feedback.trim().to_string(),
            pronunciation_tips: self.pronunciation_tips.trim().to_string(),
        }
    }
}

fn response_text(response: &Value) -> Result<&str, ServiceError> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ServiceError::EmptyResponse)
}

/// Parse a JSON answer, tolerating a surrounding Markdown code fence.
fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ServiceError> {
    let body = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|t| t.trim_end().strip_suffix("```"))
        .unwrap_or(text);
    serde_json::from_str(body.trim()).map_err(|e| ServiceError::Parse(e.to_string()))
}

/// `audio/L16;codec=pcm;rate=24000` → `24000`.
fn rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

/// Little-endian signed 16-bit PCM → `f32` in `[-1.0, 1.0)`.
fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_text(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let mut config = AppConfig::default();
        config.api.base_url = "http://localhost:8080/".into();
        let client = GeminiClient::from_config(&config);
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn client_is_object_safe_for_every_role() {
        let client = std::sync::Arc::new(GeminiClient::from_config(&AppConfig::default()));
        let _a: std::sync::Arc<dyn ContentIngestor> = client.clone();
        let _b: std::sync::Arc<dyn SpeechSynthesizer> = client.clone();
        let _c: std::sync::Arc<dyn PronunciationScorer> = client.clone();
        let _d: std::sync::Arc<dyn SessionReviewer> = client;
    }

    #[test]
    fn response_text_reads_first_part() {
        let response = candidate_text("  {\"a\":1} ");
        assert_eq!(response_text(&response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn response_text_missing_is_empty_response() {
        assert_eq!(
            response_text(&json!({ "candidates": [] })),
            Err(ServiceError::EmptyResponse)
        );
        assert_eq!(
            response_text(&candidate_text("   ")),
            Err(ServiceError::EmptyResponse)
        );
    }

    #[test]
    fn parses_processed_content() {
        let text = r#"{"title":"Morning","sentences":[
            {"id":1,"text":"Good morning.","translation":"早上好。","difficulty":"easy"}
        ]}"#;
        let content: ProcessedContent = parse_json(text).unwrap();
        assert_eq!(content.title, "Morning");
        assert_eq!(content.sentences[0].translation, "早上好。");
    }

    #[test]
    fn parse_json_strips_code_fence() {
        let review: SessionReview =
            parse_json("```json\n{\"strengths\":\"Clear vowels\"}\n```").unwrap();
        assert_eq!(review.strengths, "Clear vowels");
    }

    #[test]
    fn parse_json_reports_garbage() {
        assert!(matches!(
            parse_json::<SessionReview>("not json"),
            Err(ServiceError::Parse(_))
        ));
    }

    #[test]
    fn evaluation_score_is_clamped() {
        let high: RawEvaluation =
            parse_json(r#"{"score":130,"feedback":"ok","pronunciationTips":"tip"}"#).unwrap();
        assert_eq!(high.into_evaluation().score, 100);

        let low: RawEvaluation = parse_json(r#"{"score":-4}"#).unwrap();
        let low = low.into_evaluation();
        assert_eq!(low.score, 0);
        assert!(low.feedback.is_empty());
    }

    #[test]
    fn rate_is_read_from_mime_type() {
        assert_eq!(rate_from_mime("audio/L16;codec=pcm;rate=24000"), Some(24_000));
        assert_eq!(rate_from_mime("audio/L16; rate=16000"), Some(16_000));
        assert_eq!(rate_from_mime("audio/wav"), None);
    }

    #[test]
    fn pcm16_decodes_little_endian() {
        let bytes = [0x00, 0x00, 0x00, 0x40, 0x00, 0x80, 0xff];
        let samples = decode_pcm16(&bytes);
        assert_eq!(samples, vec![0.0, 0.5, -1.0]);
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let mut config = AppConfig::default();
        config.api.api_key = None;
        config.api.base_url = "http://127.0.0.1:9".into();
        let client = GeminiClient::from_config(&config);

        if config.api.resolved_api_key().is_none() {
            let err = client.synthesize("hello").await.unwrap_err();
            assert_eq!(err, ServiceError::MissingApiKey);
        }
    }
}
