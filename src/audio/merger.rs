//! Модуль склейки аудиофрагментов
//!
//! Склеивает фрагменты в одну дорожку строго по порядковым номерам
//! сегментов. Номер хранится рядом с путём фрагмента, поэтому порядок не
//! зависит ни от порядка завершения работников, ни от сортировки имён
//! файлов.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;

use crate::audio::AudioTrack;
use crate::error::{PipelineError, Result};
use crate::scheduler::FragmentRef;

/// Склеивает фрагменты в одну дорожку в порядке номеров сегментов
///
/// Все фрагменты должны иметь одинаковую частоту дискретизации. Отсутствие
/// отдельных номеров допустимо: недостающие сегменты просто пропускаются.
pub fn merge_fragments(mut fragments: Vec<FragmentRef>) -> Result<AudioTrack> {
    if fragments.is_empty() {
        return Err(PipelineError::Merge("no fragments to merge".to_string()));
    }

    // Числовая сортировка по порядковому номеру, не по имени файла
    fragments.sort_by_key(|f| f.index);

    let mut merged: Vec<f32> = Vec::new();
    let mut sample_rate: Option<u32> = None;

    for fragment in &fragments {
        let track = read_track(&fragment.path)?;

        match sample_rate {
            None => sample_rate = Some(track.sample_rate),
            Some(rate) if rate != track.sample_rate => {
                return Err(PipelineError::Merge(format!(
                    "fragment {} has sample rate {} Hz, expected {} Hz",
                    fragment.path.display(),
                    track.sample_rate,
                    rate
                )));
            }
            Some(_) => {}
        }

        merged.extend_from_slice(&track.samples);
    }

    let track = AudioTrack::new(merged, sample_rate.unwrap_or(0));
    info!(
        "Merged {} fragments into a single track ({:.2}s at {} Hz)",
        fragments.len(),
        track.duration_secs(),
        track.sample_rate
    );

    Ok(track)
}

/// Читает WAV файл в моно дорожку
///
/// Многоканальное аудио сводится в моно усреднением каналов.
pub fn read_track(path: &Path) -> Result<AudioTrack> {
    let mut reader = WavReader::open(path).map_err(|e| {
        PipelineError::Merge(format!("failed to open {}: {}", path.display(), e))
    })?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                PipelineError::Merge(format!("failed to decode {}: {}", path.display(), e))
            })?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                PipelineError::Merge(format!("failed to decode {}: {}", path.display(), e))
            })?,
        (format, bits) => {
            return Err(PipelineError::Merge(format!(
                "unsupported WAV format in {}: {:?} {} bit",
                path.display(),
                format,
                bits
            )));
        }
    };

    let samples = if spec.channels > 1 {
        downmix(&samples, spec.channels as usize)
    } else {
        samples
    };

    Ok(AudioTrack::new(samples, spec.sample_rate))
}

/// Записывает дорожку в WAV файл (16-bit PCM, моно)
pub fn write_track(track: &AudioTrack, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: track.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| {
        PipelineError::Merge(format!("failed to create {}: {}", path.display(), e))
    })?;

    for &sample in &track.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32) as i16)
            .map_err(|e| {
                PipelineError::Merge(format!("failed to write {}: {}", path.display(), e))
            })?;
    }

    writer.finalize().map_err(|e| {
        PipelineError::Merge(format!("failed to finalize {}: {}", path.display(), e))
    })?;

    Ok(())
}

fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_wav(dir: &Path, name: &str, value: f32, len: usize, rate: u32) -> PathBuf {
        let path = dir.join(name);
        let track = AudioTrack::new(vec![value; len], rate);
        write_track(&track, &path).unwrap();
        path
    }

    #[test]
    fn test_merge_orders_by_index_not_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        // Фрагменты передаются в перепутанном порядке завершения
        let fragments = vec![
            FragmentRef {
                index: 3,
                path: write_test_wav(dir.path(), "fragment_0003.wav", 0.3, 100, 24_000),
            },
            FragmentRef {
                index: 1,
                path: write_test_wav(dir.path(), "fragment_0001.wav", 0.1, 100, 24_000),
            },
            FragmentRef {
                index: 2,
                path: write_test_wav(dir.path(), "fragment_0002.wav", 0.2, 100, 24_000),
            },
        ];

        let track = merge_fragments(fragments).unwrap();
        assert_eq!(track.samples.len(), 300);
        assert!((track.duration_secs() - 300.0 / 24_000.0).abs() < 1e-6);
        assert!((track.samples[50] - 0.1).abs() < 0.01);
        assert!((track.samples[150] - 0.2).abs() < 0.01);
        assert!((track.samples[250] - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_merge_sorts_indices_numerically() {
        let dir = tempfile::tempdir().unwrap();
        // Числовая сортировка: сегмент 2 идёт раньше сегмента 10
        let fragments = vec![
            FragmentRef {
                index: 10,
                path: write_test_wav(dir.path(), "fragment_0010.wav", 0.5, 10, 24_000),
            },
            FragmentRef {
                index: 2,
                path: write_test_wav(dir.path(), "fragment_0002.wav", -0.5, 10, 24_000),
            },
        ];

        let track = merge_fragments(fragments).unwrap();
        assert!(track.samples[0] < 0.0);
        assert!(track.samples[15] > 0.0);
    }

    #[test]
    fn test_merge_rejects_mixed_sample_rates() {
        let dir = tempfile::tempdir().unwrap();
        let fragments = vec![
            FragmentRef {
                index: 1,
                path: write_test_wav(dir.path(), "a.wav", 0.1, 10, 24_000),
            },
            FragmentRef {
                index: 2,
                path: write_test_wav(dir.path(), "b.wav", 0.1, 10, 44_100),
            },
        ];

        assert!(matches!(
            merge_fragments(fragments),
            Err(PipelineError::Merge(_))
        ));
    }

    #[test]
    fn test_merge_fails_on_corrupt_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not a wav file").unwrap();

        let fragments = vec![FragmentRef { index: 1, path }];
        assert!(matches!(
            merge_fragments(fragments),
            Err(PipelineError::Merge(_))
        ));
    }

    #[test]
    fn test_write_track_fails_on_missing_directory() {
        let track = AudioTrack::new(vec![0.0; 10], 24_000);
        let path = Path::new("/nonexistent-dir/out.wav");
        assert!(matches!(
            write_track(&track, path),
            Err(PipelineError::Merge(_))
        ));
    }

    #[test]
    fn test_read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.wav");
        let track = AudioTrack::new(vec![0.0, 0.25, -0.25, 0.5], 24_000);

        write_track(&track, &path).unwrap();
        let decoded = read_track(&path).unwrap();

        assert_eq!(decoded.sample_rate, 24_000);
        assert_eq!(decoded.samples.len(), 4);
        for (a, b) in decoded.samples.iter().zip(track.samples.iter()) {
            assert!((a - b).abs() < 0.001);
        }
    }
}
