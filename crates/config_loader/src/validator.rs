//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive): 名称非空
//! - transport / replica 名称唯一
//! - relay.transport 指向已定义的传输层
//! - 至少一个副本
//! - network 副本的 addr 可解析
//! - redis 传输层使用 redis:// 地址

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ContractError, RelayConfig, SinkType, TransportKind};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_transport_names(config)?;
    validate_relay_transport(config)?;
    validate_replica_names(config)?;
    validate_replica_params(config)?;
    validate_transport_urls(config)?;
    Ok(())
}

/// 字段级规则
fn validate_fields(config: &RelayConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| first_field_error(&errors))
}

fn first_field_error(errors: &ValidationErrors) -> ContractError {
    match first_error(errors, String::new()) {
        Some((field, message)) => ContractError::config_validation(field, message),
        None => ContractError::config_validation("config", errors.to_string()),
    }
}

/// 按字段名排序深度优先查找第一个字段错误，返回 (路径, 信息)
fn first_error(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (path, message)
            }),
            ValidationErrorsKind::Struct(nested) => first_error(nested, path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, nested)| first_error(nested, format!("{path}[{idx}]"))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// 校验 transport 名称唯一性
fn validate_transport_names(config: &RelayConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for transport in &config.transports {
        if !seen.insert(&transport.name) {
            return Err(ContractError::config_validation(
                format!("transports[name={}]", transport.name),
                "duplicate transport name",
            ));
        }
    }
    Ok(())
}

/// 校验启动传输层存在
fn validate_relay_transport(config: &RelayConfig) -> Result<(), ContractError> {
    if config.transport(&config.relay.transport).is_none() {
        return Err(ContractError::config_validation(
            "relay.transport",
            format!(
                "transport '{}' not found in transports",
                config.relay.transport
            ),
        ));
    }
    Ok(())
}

/// 校验副本列表非空且名称唯一
fn validate_replica_names(config: &RelayConfig) -> Result<(), ContractError> {
    if config.replicas.is_empty() {
        return Err(ContractError::config_validation(
            "replicas",
            "at least one replica is required",
        ));
    }

    let mut seen = HashSet::new();
    for replica in &config.replicas {
        if !seen.insert(&replica.name) {
            return Err(ContractError::config_validation(
                format!("replicas[name={}]", replica.name),
                "duplicate replica name",
            ));
        }
    }
    Ok(())
}

/// 校验副本类型特定参数
fn validate_replica_params(config: &RelayConfig) -> Result<(), ContractError> {
    for (idx, replica) in config.replicas.iter().enumerate() {
        if replica.sink_type != SinkType::Network {
            continue;
        }

        let Some(addr) = replica.params.get("addr") else {
            return Err(ContractError::config_validation(
                format!("replicas[{idx}].params.addr"),
                "network replica requires 'addr'",
            ));
        };
        if addr.parse::<SocketAddr>().is_err() {
            return Err(ContractError::config_validation(
                format!("replicas[{idx}].params.addr"),
                format!("invalid socket address '{addr}'"),
            ));
        }
    }
    Ok(())
}

/// 校验 redis 地址格式
fn validate_transport_urls(config: &RelayConfig) -> Result<(), ContractError> {
    for transport in &config.transports {
        if transport.kind == TransportKind::Redis
            && !(transport.url.starts_with("redis://") || transport.url.starts_with("rediss://"))
        {
            return Err(ContractError::config_validation(
                format!("transports[{}].url", transport.name),
                format!("expected a redis:// url, got '{}'", transport.url),
            ));
        }
    }
    Ok(())
}
