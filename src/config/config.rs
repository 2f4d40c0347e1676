use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
}

/// 对话模型配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat completion 接口地址
    pub endpoint: String,
    /// Bearer token
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 单次回复 token 上限
    pub max_tokens: u32,
    /// 请求超时（秒）
    pub timeout_seconds: u64,
}

/// 本地存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// 设置文件路径（JSON）
    pub settings_path: PathBuf,
    /// 健康数据导出文件路径（JSON）
    pub biometrics_path: PathBuf,
}

/// 调度配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 启动时按已保存的频率自动开始定时检查
    pub autostart: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录，为空时只输出到 stdout
    pub log_dir: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 对话模型配置
    pub chat: ChatConfig,
    /// 存储配置
    pub storage: StorageConfig,
    /// 调度配置
    pub scheduler: SchedulerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8787,
            },
            chat: ChatConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".into(),
                api_key: String::new(),
                model: "gpt-4o".into(),
                max_tokens: 2000,
                timeout_seconds: 60,
            },
            storage: StorageConfig {
                settings_path: PathBuf::from("./data/settings.json"),
                biometrics_path: PathBuf::from("./data/biometrics.json"),
            },
            scheduler: SchedulerConfig { autostart: true },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            app_name: "mindpulse".into(),
            environment: "development".into(),
        }
    }
}
