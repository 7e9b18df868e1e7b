//! Модуль для интеграции с OpenAI TTS API

use log::{debug, error};
use reqwest::Client;
use serde_json::json;

use crate::config::TtsModel;
use crate::error::{PipelineError, Result};
use crate::tts::TtsClient;

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Клиент для работы с OpenAI TTS API
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: TtsModel,
}

impl OpenAiClient {
    /// Создает новый клиент OpenAI TTS
    pub fn new(api_key: &str, model: TtsModel) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "OpenAI API key is required for TTS generation".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model,
        })
    }
}

#[async_trait::async_trait]
impl TtsClient for OpenAiClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        debug!("Sending TTS request to OpenAI API (voice {})", voice);

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model.as_str(),
                "voice": voice,
                "input": text,
                "response_format": "wav",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error response: {}", e),
            };
            error!("OpenAI API error (status {}): {}", status, error_text);
            return Err(PipelineError::Provider(format!(
                "OpenAI API error (status {}): {}",
                status, error_text
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(PipelineError::Provider(
                "Received empty audio response from OpenAI".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            OpenAiClient::new("", TtsModel::Standard),
            Err(PipelineError::Configuration(_))
        ));
        assert!(OpenAiClient::new("sk-test", TtsModel::HighDefinition).is_ok());
    }
}
