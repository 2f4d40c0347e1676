use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 开发环境默认值
    /// 2. ./mindpulse.toml
    /// 3. OPENAI_API_KEY
    /// 4. MINDPULSE_ 前缀环境变量，`__` 表示嵌套，如 MINDPULSE_CHAT__MODEL
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::figment(&default_config_path()).extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        Self::figment(&path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "chat.api_key".into()),
            )
            .merge(Env::prefixed("MINDPULSE_").split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.chat.endpoint.is_empty() {
            return Err(ConfigValidationError::MissingEndpoint);
        }

        if config.chat.max_tokens == 0 {
            return Err(ConfigValidationError::InvalidMaxTokens);
        }

        if config.storage.settings_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::InvalidPath(
                "storage.settings_path".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("对话模型接口地址未配置")]
    MissingEndpoint,

    #[error("max_tokens 无效，必须大于 0")]
    InvalidMaxTokens,

    #[error("配置路径无效: {0}")]
    InvalidPath(String),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("mindpulse.toml")
}
