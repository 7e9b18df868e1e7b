//! Модуль очистки промежуточных файлов
//!
//! Фрагменты эфемерны: создаются работниками, читаются при склейке и
//! удаляются по завершении запуска независимо от его исхода.

use std::path::PathBuf;

use log::{debug, warn};

/// Охранник удаления аудиофрагментов
///
/// Владеет путями фрагментов запуска и удаляет существующие файлы при
/// уничтожении. Поскольку уничтожение происходит на любом пути выхода,
/// очистка гарантирована и при успехе, и при ошибке.
pub struct FragmentCleanup {
    paths: Vec<PathBuf>,
}

impl FragmentCleanup {
    /// Создаёт охранника для указанных путей
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Удаляет все существующие фрагменты
    ///
    /// Ошибки удаления логируются и не поднимаются: очистка не должна
    /// заслонять результат запуска.
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            if path.exists() {
                match std::fs::remove_file(&path) {
                    Ok(()) => debug!("Removed fragment {}", path.display()),
                    Err(e) => warn!("Failed to remove fragment {}: {}", path.display(), e),
                }
            }
        }
    }
}

impl Drop for FragmentCleanup {
    fn drop(&mut self) {
        self.cleanup();
    }
}
