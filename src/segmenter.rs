//! Модуль извлечения сегментов спикеров из расшифровки
//!
//! Находит теги спикеров, проверяет их сбалансированность и извлекает
//! упорядоченную последовательность сегментов (спикер, текст). Порядковый
//! номер сегмента назначается здесь и больше никогда не меняется — именно по
//! нему итоговые фрагменты склеиваются в исходном порядке диалога.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{PipelineError, Result};

lazy_static! {
    static ref SPEAKER_TAG_RE: Regex = Regex::new(r"<(Speaker\d+)>").unwrap();
    static ref SEGMENT_RE: Regex = Regex::new(r"(?s)<(Speaker\d+)>(.*?)</Speaker\d+>").unwrap();
}

/// Сегмент диалога одного спикера
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Тег спикера, например "Speaker1"
    pub speaker: String,
    /// Нормализованный текст сегмента
    pub text: String,
    /// Порядковый номер сегмента (с единицы, в порядке расшифровки)
    pub index: usize,
}

/// Находит все различные теги спикеров в порядке первого появления
pub fn discover_speaker_tags(transcript: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in SPEAKER_TAG_RE.captures_iter(transcript) {
        let tag = caps[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Проверяет сбалансированность тегов спикеров
///
/// Для каждого тега количество открытий должно совпадать с количеством
/// закрытий и быть не меньше одного. Проверка выполняется до создания
/// каких-либо заданий синтеза: структурный дефект расшифровки нельзя
/// исправить после конкурентной отправки заданий.
pub fn validate_speaker_tags(transcript: &str, tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        return Err(PipelineError::NoSpeakerTags);
    }

    for tag in tags {
        let open = transcript.matches(&format!("<{}>", tag)).count();
        let close = transcript.matches(&format!("</{}>", tag)).count();
        if open != close || open == 0 {
            log::error!(
                "Mismatched tags for {}: {} opening, {} closing",
                tag,
                open,
                close
            );
            return Err(PipelineError::MalformedTranscript {
                tag: tag.clone(),
                open,
                close,
            });
        }
    }

    Ok(())
}

/// Извлекает сегменты спикеров в порядке следования по расшифровке
///
/// Текст каждого сегмента нормализуется: переводы строк и повторяющиеся
/// пробелы схлопываются в одиночные. Сегменты с пустым текстом
/// отбрасываются и номеров не получают.
pub fn split_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut counter = 0;

    for caps in SEGMENT_RE.captures_iter(content) {
        let text = caps[2].split_whitespace().collect::<Vec<&str>>().join(" ");
        if text.is_empty() {
            continue;
        }
        counter += 1;
        segments.push(Segment {
            speaker: caps[1].to_string(),
            text,
            index: counter,
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_tags_in_first_occurrence_order() {
        let transcript = "<Speaker2>b</Speaker2><Speaker1>a</Speaker1><Speaker2>c</Speaker2>";
        assert_eq!(discover_speaker_tags(transcript), vec!["Speaker2", "Speaker1"]);
    }

    #[test]
    fn test_validate_balanced() {
        let transcript = "<Speaker1>a</Speaker1><Speaker2>b</Speaker2>";
        let tags = discover_speaker_tags(transcript);
        assert!(validate_speaker_tags(transcript, &tags).is_ok());
    }

    #[test]
    fn test_validate_extra_open() {
        let transcript = "<Speaker1>a<Speaker1>b</Speaker1>";
        let tags = discover_speaker_tags(transcript);
        let err = validate_speaker_tags(transcript, &tags).unwrap_err();
        match err {
            PipelineError::MalformedTranscript { tag, open, close } => {
                assert_eq!(tag, "Speaker1");
                assert_eq!(open, 2);
                assert_eq!(close, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_missing_close() {
        let transcript = "<Speaker1>a</Speaker1><Speaker2>b";
        let tags = discover_speaker_tags(transcript);
        assert!(matches!(
            validate_speaker_tags(transcript, &tags),
            Err(PipelineError::MalformedTranscript { .. })
        ));
    }

    #[test]
    fn test_validate_no_tags() {
        assert!(matches!(
            validate_speaker_tags("plain text", &[]),
            Err(PipelineError::NoSpeakerTags)
        ));
    }

    #[test]
    fn test_split_segments_order_and_indices() {
        let content = "<Speaker1>One.</Speaker1><Speaker2>Two.</Speaker2><Speaker1>Three.</Speaker1>";
        let segments = split_segments(content);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].speaker, "Speaker1");
        assert_eq!(segments[1].speaker, "Speaker2");
        assert_eq!(segments[2].text, "Three.");
        // Индексы строго возрастают в порядке расшифровки
        assert_eq!(
            segments.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_split_normalizes_whitespace() {
        let content = "<Speaker1>  line one\n   line two  </Speaker1>";
        let segments = split_segments(content);
        assert_eq!(segments[0].text, "line one line two");
    }

    #[test]
    fn test_split_drops_empty_segments() {
        let content = "<Speaker1>   </Speaker1><Speaker2>text</Speaker2>";
        let segments = split_segments(content);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker, "Speaker2");
        assert_eq!(segments[0].index, 1);
    }
}
