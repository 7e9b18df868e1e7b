//! Модуль обработки аудио
//!
//! Склейка фрагментов и постобработка итоговой дорожки. Вся обработка идёт
//! над моно PCM сэмплами (32-bit float); файлы читаются и пишутся в WAV.

pub mod enhancer;
pub mod merger;

/// Аудиодорожка в рабочем представлении
#[derive(Clone, Debug)]
pub struct AudioTrack {
    /// Аудио данные (PCM, 32-bit float, mono)
    pub samples: Vec<f32>,
    /// Частота дискретизации
    pub sample_rate: u32,
}

impl AudioTrack {
    /// Создает новую аудиодорожку
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Длительность дорожки в секундах
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
