//! [`ContainerConfig`] -> bollard 생성 옵션 변환
//!
//! Docker API 호출 없이 순수하게 변환만 수행하므로 단위 테스트가 가능합니다.

use std::collections::HashMap;

use bollard::container::Config;
use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};

use ctrmon_core::container::{ContainerConfig, RestartPolicy as MonitorRestartPolicy};
use ctrmon_core::error::RuntimeError;

/// Docker 컨테이너 이름 최대 길이
const MAX_CONTAINER_NAME_LEN: usize = 128;

/// 컨테이너 이름을 검증합니다.
///
/// Docker 규칙 `[a-zA-Z0-9][a-zA-Z0-9_.-]*`를 따르지 않는 이름은 API 호출 전에 거부합니다.
/// 빈 이름은 허용되며 Docker가 이름을 생성합니다.
pub(crate) fn validate_container_name(name: &str) -> Result<(), RuntimeError> {
    if name.is_empty() {
        return Ok(());
    }
    if name.len() > MAX_CONTAINER_NAME_LEN {
        return Err(RuntimeError::Api(format!(
            "invalid container name: length {} (must be 1-{MAX_CONTAINER_NAME_LEN})",
            name.len()
        )));
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !first_ok || !rest_ok {
        return Err(RuntimeError::Api(format!(
            "invalid container name '{name}': must match [a-zA-Z0-9][a-zA-Z0-9_.-]*"
        )));
    }
    Ok(())
}

/// 컨테이너 포트에 프로토콜이 없으면 `/tcp`를 붙입니다.
fn container_port_key(port: &str) -> String {
    if port.contains('/') {
        port.to_owned()
    } else {
        format!("{port}/tcp")
    }
}

/// 호스트 측 키(`[host_ip:]host_port`)를 바인딩으로 변환합니다.
fn host_binding(host: &str) -> PortBinding {
    match host.rsplit_once(':') {
        Some((ip, port)) => PortBinding {
            host_ip: Some(ip.to_owned()).filter(|ip| !ip.is_empty()),
            host_port: Some(port.to_owned()),
        },
        None => PortBinding {
            host_ip: None,
            host_port: Some(host.to_owned()),
        },
    }
}

fn restart_policy(policy: MonitorRestartPolicy) -> RestartPolicy {
    let name = match policy {
        MonitorRestartPolicy::Never => RestartPolicyNameEnum::NO,
        MonitorRestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
        MonitorRestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
        MonitorRestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
    };
    RestartPolicy {
        name: Some(name),
        maximum_retry_count: None,
    }
}

/// 컨테이너 생성 요청 본문을 만듭니다.
pub(crate) fn create_config(image_name: &str, config: &ContainerConfig) -> Config<String> {
    let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
    let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();

    for (host, container) in &config.port_map {
        let key = container_port_key(container);
        exposed_ports.insert(key.clone(), HashMap::new());
        port_bindings
            .entry(key)
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(host_binding(host));
    }

    let host_config = HostConfig {
        port_bindings: Some(port_bindings).filter(|b| !b.is_empty()),
        binds: Some(config.volumes.clone()).filter(|v| !v.is_empty()),
        volume_driver: config.volume_driver.clone(),
        auto_remove: Some(config.auto_remove),
        restart_policy: Some(restart_policy(config.restart_policy)),
        ..Default::default()
    };

    let attach = !config.background;

    Config {
        image: Some(image_name.to_owned()),
        exposed_ports: Some(exposed_ports).filter(|p| !p.is_empty()),
        attach_stdin: Some(attach && config.open_stdin),
        attach_stdout: Some(attach),
        attach_stderr: Some(attach),
        open_stdin: Some(config.open_stdin),
        tty: Some(config.tty),
        host_config: Some(host_config),
        ..Default::default()
    }
}
