//! Модуль конфигурации конвейера синтеза
//!
//! Этот модуль содержит структуры и перечисления для настройки конвейера.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// TTS провайдер
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TtsProvider {
    /// OpenAI TTS API
    OpenAi,
    /// ElevenLabs TTS API
    ElevenLabs,
}

impl TtsProvider {
    /// Получить строковое представление провайдера
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::ElevenLabs => "elevenlabs",
        }
    }

    /// Каталог голосов провайдера по умолчанию (в фиксированном порядке)
    pub fn default_voices(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["onyx", "shimmer", "echo", "nova", "alloy"],
            Self::ElevenLabs => &[
                "Adam",
                "Sarah",
                "Laura",
                "Charlie",
                "George",
                "Charlotte",
                "Liam",
            ],
        }
    }

    /// SSML теги, которые провайдер понимает и которые нужно сохранять
    /// при очистке разметки
    pub fn ssml_tags(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &[],
            Self::ElevenLabs => &["say-as", "emphasis", "phoneme", "prosody", "break"],
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Модель TTS для использования с OpenAI API
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TtsModel {
    /// Стандартная модель
    Standard,
    /// Модель высокого качества
    HighDefinition,
}

impl Default for TtsModel {
    fn default() -> Self {
        Self::HighDefinition
    }
}

impl TtsModel {
    /// Получить строковое представление модели
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "tts-1",
            Self::HighDefinition => "tts-1-hd",
        }
    }
}

/// Режим улучшения итогового аудио
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnhancementMode {
    /// Без постобработки
    Off,
    /// Лёгкая постобработка для многоголосого диалога
    Minimal,
    /// Полная постобработка: громкость, компрессия, нормализация пиков
    Full,
}

impl Default for EnhancementMode {
    fn default() -> Self {
        Self::Full
    }
}

/// Конфигурация конвейера синтеза
///
/// Конфигурация не изменяется во время выполнения: при переключении на
/// резервного провайдера конвейер передаёт провайдера отдельным аргументом,
/// а не мутирует это значение.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Основной TTS провайдер
    pub provider: TtsProvider,
    /// Резервный провайдер (одна попытка после полного отказа основного)
    pub fallback_provider: Option<TtsProvider>,
    /// API ключ для OpenAI
    pub openai_api_key: String,
    /// API ключ для ElevenLabs
    pub elevenlabs_api_key: String,
    /// Модель TTS (только для OpenAI)
    pub tts_model: TtsModel,
    /// Переопределение каталога голосов активного провайдера
    pub voice_catalog: Option<Vec<String>>,
    /// Максимальное количество одновременных запросов к провайдеру
    pub max_concurrency: usize,
    /// Директория для промежуточных аудиофрагментов
    pub temp_dir: PathBuf,
    /// Директория для итогового файла
    pub output_dir: PathBuf,
    /// Режим улучшения итогового аудио
    pub enhancement: EnhancementMode,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::OpenAi,
            fallback_provider: None,
            openai_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            tts_model: TtsModel::default(),
            voice_catalog: None,
            max_concurrency: 3,
            temp_dir: PathBuf::from("/tmp/audiocast"),
            output_dir: PathBuf::from("/tmp/audiocast/output"),
            enhancement: EnhancementMode::default(),
        }
    }
}

impl SynthesisConfig {
    /// Создаёт все необходимые директории
    pub fn ensure_directories(&self) -> Result<()> {
        for directory in [&self.temp_dir, &self.output_dir] {
            std::fs::create_dir_all(directory)?;
        }
        Ok(())
    }

    /// Каталог голосов для указанного провайдера
    ///
    /// Отсутствие переопределения означает каталог провайдера по умолчанию.
    /// Пустое переопределение — ошибка конфигурации: назначать спикерам
    /// было бы нечего.
    pub fn voice_catalog_for(&self, provider: TtsProvider) -> Result<Vec<String>> {
        match &self.voice_catalog {
            Some(catalog) if catalog.is_empty() => Err(PipelineError::Configuration(
                "voice catalog override is empty".to_string(),
            )),
            Some(catalog) => Ok(catalog.clone()),
            None => Ok(provider
                .default_voices()
                .iter()
                .map(|v| v.to_string())
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_catalogs() {
        assert_eq!(TtsProvider::OpenAi.default_voices()[0], "onyx");
        assert_eq!(TtsProvider::ElevenLabs.default_voices().len(), 7);
        assert!(TtsProvider::OpenAi.ssml_tags().is_empty());
        assert!(TtsProvider::ElevenLabs.ssml_tags().contains(&"break"));
    }

    #[test]
    fn test_voice_catalog_override() {
        let mut config = SynthesisConfig::default();
        assert_eq!(
            config.voice_catalog_for(TtsProvider::OpenAi).unwrap().len(),
            5
        );

        config.voice_catalog = Some(vec!["voiceA".to_string(), "voiceB".to_string()]);
        assert_eq!(
            config.voice_catalog_for(TtsProvider::OpenAi).unwrap(),
            vec!["voiceA", "voiceB"]
        );
    }

    #[test]
    fn test_empty_voice_catalog_override_is_configuration_error() {
        let mut config = SynthesisConfig::default();
        config.voice_catalog = Some(Vec::new());
        assert!(matches!(
            config.voice_catalog_for(TtsProvider::OpenAi),
            Err(PipelineError::Configuration(_))
        ));
        // На каталог резервного провайдера переопределение действует так же
        assert!(config.voice_catalog_for(TtsProvider::ElevenLabs).is_err());
    }

    #[test]
    fn test_model_names() {
        assert_eq!(TtsModel::Standard.as_str(), "tts-1");
        assert_eq!(TtsModel::HighDefinition.as_str(), "tts-1-hd");
    }
}
