use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::translate::{Translator, clean_translation};

/// System instruction for a faithful technical translation into `language`.
pub fn system_instruction(language: &str) -> String {
    format!(
        "You are a highly skilled translator specializing in artificial intelligence and computer science. \
You always stick to the facts in the sources provided and never make up new facts. \
Your task is to translate technical academic abstracts from English to {language}. \
All technical terms and concepts must be translated correctly, and the translation should read naturally in {language}. \
Output format: the returned text must not be bolded, must not be split into paragraphs, and must have all line breaks removed so that it forms a single paragraph. \
Do not add your own opinions, interpretations or commentary; remain faithful to the original text."
    )
}

pub struct GeminiTranslator {
    client: RateLimitedClient,
    base_url: String,
    model: String,
    api_key: String,
    target_language: String,
    temperature: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiTranslator {
    pub fn with_params(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        min_interval: Duration,
    ) -> Self {
        Self {
            client: RateLimitedClient::new(min_interval, USER_AGENT),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            target_language: "Simplified Chinese".to_string(),
            temperature: 0.8,
        }
    }

    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let instruction = system_instruction(&self.target_language);
        let prompt = format!("Note output format, here is the abstract to translate:\n{text}");
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response: GenerateResponse = self.client.post_json(&url, &body).await?;
        let raw = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let cleaned = clean_translation(&raw);
        if cleaned.is_empty() {
            return Err(ScienceError::Translation("empty response from Gemini".to_string()));
        }
        Ok(cleaned)
    }
}
