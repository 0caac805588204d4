//! Abstract translation behind a retry policy.

pub mod gemini;

pub use gemini::GeminiTranslator;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::retry::RetryPolicy;

/// A single translation attempt.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// `false` when every attempt failed and `text` is the original.
    pub translated: bool,
}

/// Wraps a [`Translator`] with its own retry policy. Never fails: exhaustion
/// falls back to the untranslated text.
#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    policy: RetryPolicy,
}

impl TranslationService {
    pub fn new(translator: Arc<dyn Translator>, policy: RetryPolicy) -> Self {
        Self { translator, policy }
    }

    pub async fn translate(&self, text: &str) -> Translation {
        let translator = &self.translator;
        self.policy
            .run_or_else(
                "translation",
                |_| async move {
                    translator.translate(text).await.map(|text| Translation {
                        text,
                        translated: true,
                    })
                },
                |_| {
                    info!("keeping untranslated abstract");
                    Translation {
                        text: text.to_string(),
                        translated: false,
                    }
                },
            )
            .await
    }
}

/// Single paragraph, no emphasis markers.
pub fn clean_translation(raw: &str) -> String {
    raw.replace("**", "")
        .replace("__", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
