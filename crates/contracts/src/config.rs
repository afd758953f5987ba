//! RelayConfig - Config Loader 输出
//!
//! 描述完整的中继配置：传输层、消费模式、副本路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

use crate::IndexParamFormat;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 顶层配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelayConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 中继启动参数
    #[validate(nested)]
    pub relay: RelaySettings,

    /// 传输层定义 (按名称注册)
    #[validate(nested)]
    pub transports: Vec<TransportConfig>,

    /// 副本列表 (顺序即副本索引)
    #[validate(nested)]
    pub replicas: Vec<ReplicaConfig>,
}

impl RelayConfig {
    /// 按名称查找传输层
    pub fn transport(&self, name: &str) -> Option<&TransportConfig> {
        self.transports.iter().find(|t| t.name == name)
    }
}

/// 中继启动参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelaySettings {
    /// 启动时使用的传输层名称
    #[validate(length(min = 1, message = "transport name cannot be empty"))]
    pub transport: String,

    /// 频道 (pub-sub) 或队列 (queue) 名称
    #[validate(length(min = 1, message = "channel cannot be empty"))]
    pub channel: String,

    /// 消费模式: "pub-sub" | "queue"
    ///
    /// 保持字符串形式，非法值在启动时以 InvalidPattern 拒绝。
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// 索引参数字段格式
    #[serde(default)]
    pub index_params: IndexParamFormat,
}

fn default_pattern() -> String {
    "pub-sub".to_string()
}

/// 传输层配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// 注册名称
    #[validate(length(min = 1, message = "transport name cannot be empty"))]
    pub name: String,

    /// 传输层类型
    pub kind: TransportKind,

    /// 连接地址 (仅 redis)
    #[serde(default = "default_redis_url")]
    pub url: String,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// 传输层类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Redis SUBSCRIBE / BRPOP
    Redis,
    /// 进程内传输 (测试/演示)
    Memory,
}

/// 副本配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReplicaConfig {
    /// 副本名称
    #[validate(length(min = 1, message = "replica name cannot be empty"))]
    pub name: String,

    /// 副本类型
    pub sink_type: SinkType,

    /// 单次调用超时 (毫秒)，0 表示不限
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl ReplicaConfig {
    /// 单次调用超时
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// 副本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件日志 (JSON lines)
    File,
    /// 网络输出 (UDP)
    Network,
    /// 内存记录
    Memory,
}
