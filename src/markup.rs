//! Модуль очистки разметки расшифровки
//!
//! Удаляет из текста теги, которые TTS провайдер не понимает, сохраняя теги
//! спикеров и поддерживаемое подмножество SSML. Операция тотальная: всегда
//! возвращает строку, возможно без изменений.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Базовый набор SSML тегов, сохраняемых при очистке
const SUPPORTED_TAGS: &[&str] = &[
    "speak", "lang", "p", "phoneme", "s", "say-as", "sub", "prosody", "break", "emphasis",
    "mark",
];

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"</?([A-Za-z][A-Za-z0-9_-]*)[^>]*>").unwrap();
    static ref BLANK_LINES_RE: Regex = Regex::new(r"\n\s*\n").unwrap();
}

/// Очищает разметку, оставляя только разрешённые теги
///
/// `extra_tags` — дополнительные теги, которые нужно сохранить (теги спикеров
/// и SSML подмножество активного провайдера). Для каждого из них при
/// необходимости достраивается парный закрывающий тег.
pub fn sanitize_markup(input: &str, extra_tags: &[String]) -> String {
    let cleaned = TAG_RE.replace_all(input, |caps: &Captures| {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let allowed =
            SUPPORTED_TAGS.contains(&name) || extra_tags.iter().any(|t| t == name);
        if allowed {
            caps[0].to_string()
        } else {
            String::new()
        }
    });

    // Убираем оставшиеся пустые строки
    let cleaned = BLANK_LINES_RE.replace_all(&cleaned, "\n");

    repair_unclosed_tags(cleaned.trim(), extra_tags)
}

/// Достраивает закрывающие теги для дополнительных тегов
///
/// Для каждого открытия `<tag>` область действия заканчивается на следующем
/// открытии любого дополнительного тега либо в конце текста. Если в области
/// нет `</tag>`, он вставляется на её границе. Лучшее из возможного: ошибкой
/// это не считается.
fn repair_unclosed_tags(text: &str, extra_tags: &[String]) -> String {
    if extra_tags.is_empty() {
        return text.to_string();
    }

    let alternation = extra_tags
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    // Набор тегов зависит от вызова, поэтому шаблон собирается на месте
    let open_re = match Regex::new(&format!("<(?:{})>", alternation)) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    let mut result = text.to_string();
    for tag in extra_tags {
        let open = format!("<{}>", tag);
        let close = format!("</{}>", tag);

        let all_opens: Vec<usize> = open_re.find_iter(&result).map(|m| m.start()).collect();
        let mut insertions: Vec<usize> = Vec::new();

        for m in open_re.find_iter(&result) {
            if m.as_str() != open {
                continue;
            }
            let span_start = m.end();
            let span_end = all_opens
                .iter()
                .copied()
                .find(|&p| p >= span_start)
                .unwrap_or(result.len());
            if !result[span_start..span_end].contains(&close) {
                insertions.push(span_end);
            }
        }

        // Вставляем с конца, чтобы не сдвигать ранние позиции
        for pos in insertions.into_iter().rev() {
            result.insert_str(pos, &close);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_strips_unsupported_tags() {
        let input = "<Speaker1>Hello <b>world</b></Speaker1><script>bad</script>";
        let result = sanitize_markup(input, &tags(&["Speaker1"]));
        assert_eq!(result, "<Speaker1>Hello world</Speaker1>bad");
    }

    #[test]
    fn test_preserves_ssml_subset() {
        let input = "<Speaker1>Wait <break time=\"0.2s\"/> done</Speaker1>";
        let result = sanitize_markup(input, &tags(&["Speaker1", "break"]));
        assert!(result.contains("<break time=\"0.2s\"/>"));
    }

    #[test]
    fn test_collapses_blank_lines() {
        let input = "<Speaker1>a</Speaker1>\n   \n\n<Speaker2>b</Speaker2>";
        let result = sanitize_markup(input, &tags(&["Speaker1", "Speaker2"]));
        assert_eq!(result, "<Speaker1>a</Speaker1>\n<Speaker2>b</Speaker2>");
    }

    #[test]
    fn test_repairs_missing_close_tag() {
        let input = "<Speaker1>first<Speaker2>second</Speaker2>";
        let result = sanitize_markup(input, &tags(&["Speaker1", "Speaker2"]));
        assert_eq!(
            result,
            "<Speaker1>first</Speaker1><Speaker2>second</Speaker2>"
        );
    }

    #[test]
    fn test_repairs_missing_close_at_end() {
        let input = "<Speaker1>trailing text";
        let result = sanitize_markup(input, &tags(&["Speaker1"]));
        assert_eq!(result, "<Speaker1>trailing text</Speaker1>");
    }

    #[test]
    fn test_idempotent() {
        let input = "<Speaker1>Hello <i>there</i></Speaker1>\n\n<Speaker2>Hi";
        let extra = tags(&["Speaker1", "Speaker2"]);
        let once = sanitize_markup(input, &extra);
        let twice = sanitize_markup(&once, &extra);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_total_on_plain_text() {
        assert_eq!(sanitize_markup("no tags here", &[]), "no tags here");
    }
}
