//! ctrmon.toml 파싱 및 모니터 런타임 설정
//!
//! [`MonitorSettings`]는 모니터 자체의 동작(로깅, Docker 연결, 재시작 지연)을 담습니다.
//! 감시 대상 컨테이너 설정은 [`container`](crate::container) 모듈이 명령줄에서 만듭니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CTRMON_SUPERVISOR_RESTART_DELAY_SECS=5` 형식)
//! 3. 설정 파일 (`--config`로 지정한 경우)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ctrmon_core::error::ConfigError> {
//! use ctrmon_core::config::MonitorSettings;
//!
//! // 파일에서 로드 + 환경변수 오버라이드, CLI 값 적용 후 한 번 검증
//! let mut settings = MonitorSettings::load(Some("ctrmon.toml")).await?;
//! settings.apply_cli_overrides(Some("debug"), None);
//! settings.validate()?;
//!
//! // TOML 문자열에서 직접 파싱
//! let settings = MonitorSettings::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// 설정 상한값 상수
const MAX_RESTART_DELAY_SECS: u64 = 3600;
const MAX_STOP_TIMEOUT_SECS: u64 = 300;

/// ctrmon 모니터 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// Docker 연결 설정
    #[serde(default)]
    pub docker: DockerConfig,
    /// 감시 루프 설정
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

impl MonitorSettings {
    /// 설정을 로드합니다.
    ///
    /// `path`가 `None`이면 기본값에서 시작합니다. 그 뒤 환경변수 오버라이드를 적용합니다.
    /// 검증하지 않으므로 호출자는 CLI 오버라이드 적용 후 [`validate`](Self::validate)를 호출해야 합니다.
    pub async fn load(path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// CLI 로그 옵션(`--log-level`, `--log-format`)을 적용합니다. 파일과 환경변수보다 우선합니다.
    pub fn apply_cli_overrides(&mut self, log_level: Option<&str>, log_format: Option<&str>) {
        if let Some(level) = log_level {
            self.general.log_level = level.to_owned();
        }
        if let Some(format) = log_format {
            self.general.log_format = format.to_owned();
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ParseFailed {
                    reason: format!("{}: {e}", path.display()),
                }
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CTRMON_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "CTRMON_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CTRMON_GENERAL_LOG_FORMAT");

        override_string(&mut self.docker.socket, "CTRMON_DOCKER_SOCKET");
        override_u64(
            &mut self.docker.stop_timeout_secs,
            "CTRMON_DOCKER_STOP_TIMEOUT_SECS",
        );

        override_u64(
            &mut self.supervisor.restart_delay_secs,
            "CTRMON_SUPERVISOR_RESTART_DELAY_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        if self.docker.stop_timeout_secs == 0
            || self.docker.stop_timeout_secs > MAX_STOP_TIMEOUT_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "docker.stop_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_STOP_TIMEOUT_SECS}"),
            });
        }

        if self.supervisor.restart_delay_secs > MAX_RESTART_DELAY_SECS {
            return Err(ConfigError::InvalidValue {
                field: "supervisor.restart_delay_secs".to_owned(),
                reason: format!("must be 0-{MAX_RESTART_DELAY_SECS}"),
            });
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// Docker 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker 소켓 경로 (비어 있으면 플랫폼 기본값)
    pub socket: String,
    /// 정지 요청 시 SIGKILL 전 유예 시간 (초)
    pub stop_timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: String::new(),
            stop_timeout_secs: 10,
        }
    }
}

impl DockerConfig {
    /// 정지 유예 시간을 `Duration`으로 반환합니다.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// 감시 루프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// 컨테이너 종료 후 재시작까지 고정 지연 (초)
    pub restart_delay_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: 2,
        }
    }
}

impl SupervisorConfig {
    /// 재시작 지연을 `Duration`으로 반환합니다.
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
