//! Модуль TTS провайдеров
//!
//! Содержит общий трейт провайдера синтеза речи и его реализации.

use std::sync::Arc;

use crate::config::{SynthesisConfig, TtsProvider};
use crate::error::Result;

pub mod elevenlabs;
pub mod openai;

pub use elevenlabs::ElevenLabsClient;
pub use openai::OpenAiClient;

/// Трейт, который должны реализовывать все TTS провайдеры
///
/// Провайдер превращает пару (текст, голос) в аудиобайты в формате WAV.
/// Ошибки транспорта и квот поднимаются как ошибки провайдера.
#[async_trait::async_trait]
pub trait TtsClient: Send + Sync {
    /// Синтезирует речь для текста указанным голосом
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}

/// Возвращает клиента для указанного провайдера
pub fn client_for(provider: TtsProvider, config: &SynthesisConfig) -> Result<Arc<dyn TtsClient>> {
    match provider {
        TtsProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(
            &config.openai_api_key,
            config.tts_model,
        )?)),
        TtsProvider::ElevenLabs => {
            Ok(Arc::new(ElevenLabsClient::new(&config.elevenlabs_api_key)?))
        }
    }
}
