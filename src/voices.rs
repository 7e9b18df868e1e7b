//! Модуль назначения голосов спикерам
//!
//! Строит отображение тег спикера → голос из каталога активного провайдера.
//! Назначение детерминировано для пары (порядок тегов, каталог): при повторе
//! попытки с тем же провайдером спикеры получают те же голоса.

use std::collections::HashMap;

/// Назначает голоса тегам спикеров, циклически обходя каталог
///
/// Когда спикеров больше, чем голосов, каталог используется по кругу; когда
/// меньше или столько же — каждый спикер получает отдельный голос в порядке
/// каталога.
pub fn assign_voices(tags: &[String], catalog: &[String]) -> HashMap<String, String> {
    tags.iter()
        .cloned()
        .zip(catalog.iter().cloned().cycle())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_distinct_voices_when_catalog_is_large_enough() {
        let tags = strings(&["Speaker1", "Speaker2"]);
        let catalog = strings(&["onyx", "shimmer", "echo"]);
        let mapping = assign_voices(&tags, &catalog);
        assert_eq!(mapping["Speaker1"], "onyx");
        assert_eq!(mapping["Speaker2"], "shimmer");
    }

    #[test]
    fn test_round_robin_cycling() {
        let tags = strings(&["tag1", "tag2", "tag3", "tag4", "tag5"]);
        let catalog = strings(&["voiceA", "voiceB"]);
        let mapping = assign_voices(&tags, &catalog);
        assert_eq!(mapping["tag1"], "voiceA");
        assert_eq!(mapping["tag2"], "voiceB");
        assert_eq!(mapping["tag3"], "voiceA");
        assert_eq!(mapping["tag4"], "voiceB");
        assert_eq!(mapping["tag5"], "voiceA");
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let tags = strings(&["Speaker3", "Speaker1", "Speaker2"]);
        let catalog = strings(&["a", "b"]);
        assert_eq!(assign_voices(&tags, &catalog), assign_voices(&tags, &catalog));
    }
}
