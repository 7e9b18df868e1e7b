//! Библиотека синтеза многоголосых аудиокастов
//!
//! Превращает размеченную расшифровку диалога (теги `<SpeakerN>`) в один
//! готовый аудиофайл: очистка разметки, извлечение сегментов спикеров,
//! назначение голосов, конкурентный синтез речи через TTS провайдера,
//! склейка фрагментов в исходном порядке и постобработка. При полном отказе
//! основного провайдера весь конвейер перезапускается один раз с резервным.

pub mod audio;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod markup;
pub mod scheduler;
pub mod segmenter;
pub mod tts;
pub mod voices;

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::audio::enhancer::{EnhancementConfig, Enhancer, SpeechEnhancer};
use crate::audio::merger;
use crate::cleanup::FragmentCleanup;
use crate::config::{SynthesisConfig, TtsProvider};
use crate::error::Result;
use crate::tts::TtsClient;

/// Основная структура конвейера синтеза
pub struct AudiocastPipeline {
    /// Конфигурация конвейера
    config: SynthesisConfig,
    /// Параметры постобработки
    enhancement: EnhancementConfig,
    /// Клиент основного провайдера
    primary: Arc<dyn TtsClient>,
    /// Клиент резервного провайдера
    fallback: Option<Arc<dyn TtsClient>>,
    /// Шаг постобработки итогового файла
    enhancer: Arc<dyn Enhancer>,
}

impl AudiocastPipeline {
    /// Создать конвейер с указанной конфигурацией
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        let primary = tts::client_for(config.provider, &config)?;
        let fallback = match config.fallback_provider {
            Some(provider) => Some(tts::client_for(provider, &config)?),
            None => None,
        };

        Ok(Self {
            config,
            enhancement: EnhancementConfig::default(),
            primary,
            fallback,
            enhancer: Arc::new(SpeechEnhancer),
        })
    }

    /// Создать конвейер с готовыми клиентами провайдеров
    ///
    /// Позволяет подставить произвольные реализации `TtsClient`, в том числе
    /// фейковые в тестах.
    pub fn with_clients(
        config: SynthesisConfig,
        primary: Arc<dyn TtsClient>,
        fallback: Option<Arc<dyn TtsClient>>,
    ) -> Self {
        Self {
            config,
            enhancement: EnhancementConfig::default(),
            primary,
            fallback,
            enhancer: Arc::new(SpeechEnhancer),
        }
    }

    /// Переопределить параметры постобработки
    pub fn with_enhancement(mut self, enhancement: EnhancementConfig) -> Self {
        self.enhancement = enhancement;
        self
    }

    /// Переопределить реализацию постобработки
    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    /// Синтезирует аудиокаст из размеченной расшифровки
    ///
    /// Возвращает путь к итоговому аудиофайлу. Промежуточные фрагменты
    /// удаляются до возврата независимо от исхода. При любой ошибке основной
    /// попытки конвейер перезапускается целиком с резервным провайдером,
    /// ровно один раз; ошибка резервной попытки отдаётся вызывающему без
    /// изменений.
    pub async fn generate(&self, transcript: &str) -> Result<PathBuf> {
        self.config.ensure_directories()?;

        match self
            .attempt(transcript, self.config.provider, self.primary.clone())
            .await
        {
            Ok(path) => Ok(path),
            Err(e) => match (self.config.fallback_provider, self.fallback.clone()) {
                (Some(provider), Some(client)) => {
                    warn!(
                        "TTS synthesis with {} failed: {}. Falling back to {}",
                        self.config.provider, e, provider
                    );
                    self.attempt(transcript, provider, client).await
                }
                _ => Err(e),
            },
        }
    }

    /// Одна полная попытка синтеза с указанным провайдером
    ///
    /// Провайдер передаётся аргументом: конфигурация между попытками не
    /// мутируется. Попытка начинается с очистки разметки, чтобы резервный
    /// запуск учитывал каталог голосов и SSML подмножество своего провайдера.
    async fn attempt(
        &self,
        transcript: &str,
        provider: TtsProvider,
        client: Arc<dyn TtsClient>,
    ) -> Result<PathBuf> {
        info!("Starting audiocast synthesis with provider {}", provider);

        let tags = segmenter::discover_speaker_tags(transcript);
        // Проверка структуры до очистки: достройка закрывающих тегов не
        // должна замаскировать дефект исходной расшифровки
        segmenter::validate_speaker_tags(transcript, &tags)?;

        let mut preserved = tags.clone();
        preserved.extend(provider.ssml_tags().iter().map(|t| t.to_string()));
        let sanitized = markup::sanitize_markup(transcript, &preserved);

        let segments = segmenter::split_segments(&sanitized);
        info!("Extracted {} segments for {} speakers", segments.len(), tags.len());

        let catalog = self.config.voice_catalog_for(provider)?;
        let assignment = voices::assign_voices(&tags, &catalog);

        let jobs = scheduler::prepare_jobs(&segments, &assignment, &self.config.temp_dir);
        let _cleanup =
            FragmentCleanup::new(jobs.iter().map(|j| j.fragment_path.clone()).collect());

        let fragments =
            scheduler::run_jobs(client, jobs, self.config.max_concurrency).await?;

        let output_path = self
            .config
            .output_dir
            .join(format!("{}.wav", Uuid::new_v4()));
        let track = merger::merge_fragments(fragments)?;
        merger::write_track(&track, &output_path)?;

        // Отказ постобработки не фатален: склеенный файл уже пригоден
        if let Err(e) =
            self.enhancer
                .enhance(&output_path, self.config.enhancement, &self.enhancement)
        {
            warn!(
                "Audio enhancement failed: {:#}. Returning the merged file as-is",
                e
            );
        }

        info!("Audio saved to {}", output_path.display());
        Ok(output_path)
    }
}

/// Публичный API для удобного использования
pub async fn generate_audiocast(transcript: &str, config: SynthesisConfig) -> Result<PathBuf> {
    let pipeline = AudiocastPipeline::new(config)?;
    pipeline.generate(transcript).await
}
