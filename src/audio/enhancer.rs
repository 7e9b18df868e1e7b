//! Модуль постобработки итоговой дорожки
//!
//! Приводит громкость к целевому уровню, сжимает динамический диапазон и
//! нормализует пики с запасом. Параметры подобраны для речи. Отказ
//! постобработки не фатален: конвейер логирует предупреждение и отдаёт
//! неулучшенный файл.

use std::path::Path;

use anyhow::Context;
use log::info;

use crate::audio::{merger, AudioTrack};
use crate::config::EnhancementMode;

/// Параметры постобработки речи
#[derive(Debug, Clone)]
pub struct EnhancementConfig {
    /// Целевая громкость (RMS, dBFS)
    pub target_dbfs: f32,
    /// Порог компрессора (dBFS)
    pub threshold_dbfs: f32,
    /// Коэффициент компрессии
    pub ratio: f32,
    /// Время атаки компрессора (мс)
    pub attack_ms: f32,
    /// Время восстановления компрессора (мс)
    pub release_ms: f32,
    /// Запас до полной шкалы при нормализации пиков (dB)
    pub headroom_db: f32,
    /// Коэффициент ускорения воспроизведения в лёгком режиме
    pub speed_factor: f32,
    /// Допустимое отклонение громкости от цели в лёгком режиме (dB)
    pub tolerance_db: f32,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            target_dbfs: -18.0,
            threshold_dbfs: -24.0,
            ratio: 2.0,
            attack_ms: 10.0,
            release_ms: 50.0,
            headroom_db: 1.0,
            speed_factor: 1.04,
            tolerance_db: 3.0,
        }
    }
}

/// Шаг постобработки итогового файла
///
/// Выделен в трейт, чтобы конвейер не зависел от конкретной реализации:
/// в тестах подставляется отказывающая постобработка.
pub trait Enhancer: Send + Sync {
    /// Улучшает аудиофайл на месте в соответствии с режимом
    fn enhance(
        &self,
        path: &Path,
        mode: EnhancementMode,
        config: &EnhancementConfig,
    ) -> anyhow::Result<()>;
}

/// Постобработка речи по умолчанию
pub struct SpeechEnhancer;

impl Enhancer for SpeechEnhancer {
    fn enhance(
        &self,
        path: &Path,
        mode: EnhancementMode,
        config: &EnhancementConfig,
    ) -> anyhow::Result<()> {
        enhance_file(path, mode, config)
    }
}

/// Улучшает аудиофайл на месте в соответствии с режимом
pub fn enhance_file(
    path: &Path,
    mode: EnhancementMode,
    config: &EnhancementConfig,
) -> anyhow::Result<()> {
    if mode == EnhancementMode::Off {
        return Ok(());
    }

    let mut track = merger::read_track(path)
        .with_context(|| format!("failed to read merged audio {}", path.display()))?;

    match mode {
        EnhancementMode::Full => enhance_track(&mut track, config),
        EnhancementMode::Minimal => enhance_track_minimal(&mut track, config),
        EnhancementMode::Off => unreachable!(),
    }

    merger::write_track(&track, path)
        .with_context(|| format!("failed to re-export enhanced audio {}", path.display()))?;

    info!("Enhanced audio re-exported to {}", path.display());
    Ok(())
}

/// Полная постобработка: громкость, компрессия, нормализация пиков
pub fn enhance_track(track: &mut AudioTrack, config: &EnhancementConfig) {
    let loudness = rms_dbfs(&track.samples);
    apply_gain_db(&mut track.samples, config.target_dbfs - loudness);
    compress(&mut track.samples, track.sample_rate, config);
    normalize_peak(&mut track.samples, config.headroom_db);
}

/// Лёгкая постобработка для многоголосого диалога
///
/// Слегка ускоряет воспроизведение с сохранением высоты тона. Громкость
/// выравнивается только если она отклоняется от цели сильнее допуска,
/// чтобы не переобрабатывать естественно звучащий диалог.
pub fn enhance_track_minimal(track: &mut AudioTrack, config: &EnhancementConfig) {
    track.samples = speed_up(&track.samples, track.sample_rate, config.speed_factor);

    let loudness = rms_dbfs(&track.samples);
    if (loudness - config.target_dbfs).abs() > config.tolerance_db {
        apply_gain_db(&mut track.samples, config.target_dbfs - loudness);
        normalize_peak(&mut track.samples, config.headroom_db);
    }
}

/// Среднеквадратичная громкость в dBFS
pub fn rms_dbfs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return -120.0;
    }
    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    20.0 * mean_square.sqrt().max(1e-6).log10()
}

/// Применяет усиление в децибелах
pub fn apply_gain_db(samples: &mut [f32], gain_db: f32) {
    let factor = 10f32.powf(gain_db / 20.0);
    for sample in samples.iter_mut() {
        *sample *= factor;
    }
}

/// Опускает пики до полной шкалы с запасом
///
/// Только ослабляет: сигнал с пиками ниже цели не трогается, чтобы не
/// сбивать уже выставленную целевую громкость.
pub fn normalize_peak(samples: &mut [f32], headroom_db: f32) {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    let target = 10f32.powf(-headroom_db.abs() / 20.0);
    if peak <= target {
        return;
    }
    let factor = target / peak;
    for sample in samples.iter_mut() {
        *sample *= factor;
    }
}

/// Сжимает динамический диапазон
///
/// Огибающая уровня сглаживается с постоянными времени атаки и
/// восстановления; всё, что выше порога, ослабляется с заданным
/// коэффициентом.
pub fn compress(samples: &mut [f32], sample_rate: u32, config: &EnhancementConfig) {
    if samples.is_empty() || sample_rate == 0 {
        return;
    }

    let attack = smoothing_coef(sample_rate, config.attack_ms);
    let release = smoothing_coef(sample_rate, config.release_ms);
    let mut envelope = 0.0f32;

    for sample in samples.iter_mut() {
        let level = sample.abs();
        let coef = if level > envelope { attack } else { release };
        envelope = coef * envelope + (1.0 - coef) * level;

        let envelope_db = 20.0 * envelope.max(1e-6).log10();
        let over = envelope_db - config.threshold_dbfs;
        if over > 0.0 {
            let gain_db = -over * (1.0 - 1.0 / config.ratio);
            *sample *= 10f32.powf(gain_db / 20.0);
        }
    }
}

fn smoothing_coef(sample_rate: u32, time_ms: f32) -> f32 {
    (-1.0 / (sample_rate as f32 * time_ms / 1000.0)).exp()
}

/// Ускоряет воспроизведение с сохранением высоты тона
///
/// Из каждого куска фиксированной длины выбрасывается хвост, границы
/// сглаживаются коротким кроссфейдом. Высота тона не меняется, потому что
/// сами сэмплы не передискретизируются.
pub fn speed_up(samples: &[f32], sample_rate: u32, factor: f32) -> Vec<f32> {
    if factor <= 1.0 || samples.is_empty() || sample_rate == 0 {
        return samples.to_vec();
    }

    let chunk = ((sample_rate as f32 * 0.15) as usize).max(2); // 150 ms
    let keep = ((chunk as f32 / factor) as usize).max(1);
    let crossfade = ((sample_rate as f32 * 0.025) as usize).min(keep / 2); // 25 ms

    let mut out = Vec::with_capacity((samples.len() as f32 / factor) as usize + chunk);
    let mut pos = 0;

    while pos < samples.len() {
        let end = (pos + chunk).min(samples.len());
        let kept_end = (pos + keep).min(end);
        let start_out = out.len();
        out.extend_from_slice(&samples[pos..kept_end]);

        // Кроссфейд конца оставленной части с началом отброшенной
        let dropped = &samples[kept_end..end];
        let fade = crossfade.min(dropped.len()).min(out.len() - start_out);
        let base = out.len() - fade;
        for j in 0..fade {
            let t = (j + 1) as f32 / (fade + 1) as f32;
            out[base + j] = out[base + j] * (1.0 - t) + dropped[j] * t;
        }

        pos = end;
    }

    out
}
