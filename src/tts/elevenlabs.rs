//! Модуль для интеграции с ElevenLabs TTS API
//!
//! ElevenLabs возвращает сырой PCM, поэтому ответ упаковывается в WAV
//! контейнер, чтобы все провайдеры отдавали фрагменты в одном формате.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, error};
use reqwest::Client;
use serde_json::json;

use crate::error::{PipelineError, Result};
use crate::tts::TtsClient;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const ELEVENLABS_MODEL_ID: &str = "eleven_turbo_v2_5";
const ELEVENLABS_SAMPLE_RATE: u32 = 24_000;

/// Клиент для работы с ElevenLabs TTS API
pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
}

impl ElevenLabsClient {
    /// Создает новый клиент ElevenLabs TTS
    pub fn new(api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "ElevenLabs API key is required for TTS generation".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TtsClient for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        debug!("Sending TTS request to ElevenLabs API (voice {})", voice);

        let url = format!(
            "{}/{}?output_format=pcm_{}",
            ELEVENLABS_BASE_URL, voice, ELEVENLABS_SAMPLE_RATE
        );
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&json!({
                "text": text,
                "model_id": ELEVENLABS_MODEL_ID,
                "voice_settings": {
                    "stability": 0.0,
                    "similarity_boost": 1.0,
                    "style": 0.0,
                    "use_speaker_boost": true,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error response: {}", e),
            };
            error!("ElevenLabs API error (status {}): {}", status, error_text);
            return Err(PipelineError::Provider(format!(
                "ElevenLabs API error (status {}): {}",
                status, error_text
            )));
        }

        let pcm = response.bytes().await?;
        if pcm.is_empty() {
            return Err(PipelineError::Provider(
                "Received empty audio response from ElevenLabs".to_string(),
            ));
        }

        pcm_to_wav(&pcm, ELEVENLABS_SAMPLE_RATE)
    }
}

/// Упаковывает сырые PCM сэмплы (16-bit LE, моно) в WAV контейнер
fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| PipelineError::Provider(format!("Failed to encode WAV header: {}", e)))?;
        for chunk in pcm.chunks_exact(2) {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            writer
                .write_sample(sample)
                .map_err(|e| PipelineError::Provider(format!("Failed to encode WAV data: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| PipelineError::Provider(format!("Failed to finalize WAV data: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            ElevenLabsClient::new("  "),
            Err(PipelineError::Configuration(_))
        ));
        assert!(ElevenLabsClient::new("el-test").is_ok());
    }

    #[test]
    fn test_pcm_to_wav_roundtrip() {
        let samples: Vec<i16> = vec![0, 100, -100, i16::MAX, i16::MIN];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let wav = pcm_to_wav(&pcm, ELEVENLABS_SAMPLE_RATE).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, ELEVENLABS_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }
}
