//! Модуль планировщика заданий синтеза
//!
//! Превращает упорядоченные сегменты в задания с фиксированным порядковым
//! номером и выполняет их конкурентно против TTS провайдера. Количество
//! одновременных запросов ограничено семафором; координатор дожидается
//! завершения всех заданий перед продолжением.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, error, info};
use tokio::sync::Semaphore;

use crate::error::{PipelineError, Result};
use crate::segmenter::Segment;
use crate::tts::TtsClient;

/// Задание синтеза для одного сегмента
///
/// Путь фрагмента выводится из порядкового номера в момент создания задания,
/// до отправки: порядок завершения работников на него не влияет.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    /// Тег спикера
    pub speaker: String,
    /// Текст для синтеза
    pub text: String,
    /// Идентификатор голоса
    pub voice: String,
    /// Порядковый номер сегмента
    pub index: usize,
    /// Путь итогового аудиофрагмента
    pub fragment_path: PathBuf,
}

/// Успешно записанный аудиофрагмент
#[derive(Debug, Clone)]
pub struct FragmentRef {
    /// Порядковый номер сегмента
    pub index: usize,
    /// Путь к файлу фрагмента
    pub path: PathBuf,
}

/// Имя файла фрагмента для порядкового номера
///
/// Номер дополняется нулями, чтобы лексикографический порядок имён совпадал
/// с числовым порядком сегментов.
pub fn fragment_file_name(index: usize) -> String {
    format!("fragment_{:04}.wav", index)
}

/// Строит задания синтеза для непустых сегментов
pub fn prepare_jobs(
    segments: &[Segment],
    assignment: &HashMap<String, String>,
    temp_dir: &Path,
) -> Vec<SynthesisJob> {
    segments
        .iter()
        .filter_map(|segment| {
            let voice = assignment.get(&segment.speaker)?;
            Some(SynthesisJob {
                speaker: segment.speaker.clone(),
                text: segment.text.clone(),
                voice: voice.clone(),
                index: segment.index,
                fragment_path: temp_dir.join(fragment_file_name(segment.index)),
            })
        })
        .collect()
}

/// Выполняет задания синтеза конкурентно
///
/// Отказ отдельного задания логируется и не прерывает остальные; задание не
/// повторяется (повторяется только весь запуск через резервного провайдера).
/// Если не удалось ни одно задание, возвращается `NoAudioProduced`.
pub async fn run_jobs(
    client: Arc<dyn TtsClient>,
    jobs: Vec<SynthesisJob>,
    max_concurrency: usize,
) -> Result<Vec<FragmentRef>> {
    let total = jobs.len();
    if total == 0 {
        error!("No synthesis jobs to run: transcript yielded no non-empty segments");
        return Err(PipelineError::NoAudioProduced);
    }

    let limit = max_concurrency.max(1);
    info!("Dispatching {} synthesis jobs ({} max concurrent)", total, limit);

    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = Vec::with_capacity(total);

    for job in jobs {
        let client = client.clone();
        let semaphore = semaphore.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return (job.index, None),
            };

            match client.synthesize(&job.text, &job.voice).await {
                Ok(bytes) => {
                    if let Err(e) = tokio::fs::write(&job.fragment_path, &bytes).await {
                        error!(
                            "Failed to save fragment {} to {}: {}",
                            job.index,
                            job.fragment_path.display(),
                            e
                        );
                        return (job.index, None);
                    }
                    debug!(
                        "Generated speech for tag {} at index {}",
                        job.speaker, job.index
                    );
                    (job.index, Some(job.fragment_path))
                }
                Err(e) => {
                    error!(
                        "Failed to generate speech for tag {} at index {}: {}",
                        job.speaker, job.index, e
                    );
                    (job.index, None)
                }
            }
        }));
    }

    // Ожидаем завершения всех заданий, успехов и отказов
    let results = join_all(tasks).await;

    let mut fragments = Vec::new();
    for result in results {
        match result {
            Ok((index, Some(path))) => fragments.push(FragmentRef { index, path }),
            Ok((_, None)) => {}
            Err(e) => error!("Synthesis worker panicked: {}", e),
        }
    }

    if fragments.is_empty() {
        error!("All {} synthesis jobs failed", total);
        return Err(PipelineError::NoAudioProduced);
    }

    info!("Generated {}/{} audio fragments", fragments.len(), total);
    Ok(fragments)
}
