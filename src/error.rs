//! Модуль обработки ошибок конвейера синтеза
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при работе конвейера.

use thiserror::Error;

/// Ошибки конвейера синтеза аудиокаста
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Несбалансированный тег спикера в расшифровке
    #[error("malformed transcript: tag <{tag}> has {open} opening and {close} closing occurrences")]
    MalformedTranscript {
        tag: String,
        open: usize,
        close: usize,
    },

    /// В расшифровке нет ни одного тега спикера
    #[error("malformed transcript: no speaker tags found")]
    NoSpeakerTags,

    /// Все задания синтеза завершились неудачей
    #[error("no audio fragments were produced")]
    NoAudioProduced,

    /// Ошибка объединения аудиофрагментов
    #[error("audio merge error: {0}")]
    Merge(String),

    /// Ошибка TTS провайдера
    #[error("TTS provider error: {0}")]
    Provider(String),

    /// Ошибка конфигурации
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Тип Result для конвейера синтеза
pub type Result<T> = std::result::Result<T, PipelineError>;
