//! 设置存储
//!
//! 设置文档整体读写：生日和年龄、频率和偏好总是在同一次写入中落盘。

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::settings::Settings;

/// 设置存储 trait
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// 读取设置，不存在时返回默认值
    async fn load(&self) -> Result<Settings>;

    /// 整体保存设置
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// JSON 文件存储
///
/// 先写临时文件再 rename，读到的要么是旧文档要么是新文档。
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Settings> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let settings = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::Storage(format!("{}: {}", self.path.display(), e))
                })?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file not found, using defaults");
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(settings)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// 内存存储（测试和无持久化场景）
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.settings.read().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.write() = settings.clone();
        Ok(())
    }
}
