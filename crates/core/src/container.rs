//! 컨테이너 설정 레코드와 빌더
//!
//! 명령줄에서 받은 원시 값([`ConfigFlags`], 위치 인자)을 검증하여
//! 런타임 어댑터가 소비하는 [`ContainerConfig`]를 만듭니다.
//! 빌더는 순수 함수이며, 이미지 경로 존재 여부 확인 외에는 I/O가 없습니다.
//!
//! # 포트 매핑
//! 각 항목 `[host_ip:]host_port:container_port`는 **마지막** 콜론에서 분리됩니다.
//! 콜론 앞 전체가 호스트 측 키(IP 포함 가능), 뒤가 컨테이너 포트입니다.
//!
//! ```
//! use ctrmon_core::container::split_port;
//!
//! assert_eq!(split_port("127.0.0.1:80:8080"), Some(("127.0.0.1:80", "8080")));
//! assert_eq!(split_port("80:8080"), Some(("80", "8080")));
//! assert_eq!(split_port("8080"), None);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// 컨테이너 재시작 정책
///
/// 런타임 어댑터에 그대로 전달됩니다. 모니터 자체의 재시작 여부에는 영향을 주지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// 재시작하지 않음
    #[default]
    Never,
    /// 비정상 종료 시에만 재시작
    OnFailure,
    /// 명시적으로 정지하지 않는 한 재시작
    UnlessStopped,
    /// 항상 재시작
    Always,
}

impl RestartPolicy {
    /// 허용되는 리터럴 목록
    pub const VARIANTS: [&'static str; 4] = ["never", "on-failure", "unless-stopped", "always"];

    /// 명령줄 리터럴을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::OnFailure => "on-failure",
            Self::UnlessStopped => "unless-stopped",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestartPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "on-failure" => Ok(Self::OnFailure),
            "unless-stopped" => Ok(Self::UnlessStopped),
            "always" => Ok(Self::Always),
            other => Err(ConfigError::InvalidRestartPolicy {
                value: other.to_owned(),
            }),
        }
    }
}

/// 런타임 어댑터에 전달되는 컨테이너 설정
///
/// 한 번 생성되면 변경되지 않으며, 감시 루프가 실행 동안 단독으로 소유합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerConfig {
    /// 정지 요청에 사용하는 컨테이너 이름 (재시작 간 동일)
    pub container_name: String,
    /// 호스트 측(`[host_ip:]host_port`) -> 컨테이너 포트
    pub port_map: BTreeMap<String, String>,
    /// `name_or_path:container_path` 항목 (마운트 순서 유지)
    pub volumes: Vec<String>,
    /// 볼륨 드라이버
    pub volume_driver: Option<String>,
    /// 재시작 정책
    pub restart_policy: RestartPolicy,
    /// 표준 스트림을 연결하지 않고 실행
    pub background: bool,
    /// 종료 시 컨테이너 자동 삭제
    pub auto_remove: bool,
    /// 컨테이너 로그를 모니터 로그로 전달
    pub log_output: bool,
    /// 연결되지 않아도 stdin 유지
    pub open_stdin: bool,
    /// tty 할당
    pub tty: bool,
    /// 이미지당 하나의 컨테이너 인스턴스만 허용
    pub only_one_instance_per_image: bool,
}

/// 검증 전 원시 플래그 값
///
/// `Default`는 명령줄 기본값과 같습니다.
#[derive(Debug, Clone)]
pub struct ConfigFlags {
    pub container_name: String,
    pub ports: Vec<String>,
    pub volume_driver: String,
    pub volumes: Vec<String>,
    pub background: bool,
    pub restart_policy: Option<String>,
    pub auto_remove: bool,
    pub log: bool,
    pub interactive: bool,
    pub tty: bool,
    pub one_instance: bool,
}

impl Default for ConfigFlags {
    fn default() -> Self {
        Self {
            container_name: String::new(),
            ports: Vec::new(),
            volume_driver: String::new(),
            volumes: Vec::new(),
            background: false,
            restart_policy: None,
            auto_remove: true,
            log: true,
            interactive: true,
            tty: true,
            one_instance: true,
        }
    }
}

/// 감시 대상 이미지 (위치 인자 두 개)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    /// 이미지 아카이브 경로
    pub image_path: PathBuf,
    /// 이미지 이름 또는 ID
    pub image_name: String,
}

/// 포트 항목을 마지막 콜론에서 분리합니다.
///
/// 콜론이 없으면 `None`을 반환합니다. 추가 검증은 하지 않습니다.
pub fn split_port(entry: &str) -> Option<(&str, &str)> {
    entry.rsplit_once(':')
}

/// 위치 인자를 검증하여 [`ImageTarget`]을 만듭니다.
///
/// 정확히 두 개가 필요하며, 첫 번째 경로는 파일시스템에 존재해야 합니다.
pub fn parse_image_target(args: &[String]) -> Result<ImageTarget, ConfigError> {
    let [image_path, image_name] = args else {
        return Err(ConfigError::MissingArguments { got: args.len() });
    };

    check_image_path(Path::new(image_path))?;

    Ok(ImageTarget {
        image_path: PathBuf::from(image_path),
        image_name: image_name.clone(),
    })
}

/// 이미지 경로 존재 여부만 확인합니다. 이미지 내용 검증은 런타임 어댑터의 몫입니다.
fn check_image_path(path: &Path) -> Result<(), ConfigError> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|e| ConfigError::ImagePathNotFound {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

impl ContainerConfig {
    /// 원시 플래그 값을 검증하고 설정 레코드를 만듭니다.
    ///
    /// 검증 실패 시 레코드는 생성되지 않습니다.
    pub fn from_flags(flags: &ConfigFlags) -> Result<Self, ConfigError> {
        let mut port_map = BTreeMap::new();
        for entry in &flags.ports {
            let (host, container) = split_port(entry).ok_or_else(|| ConfigError::InvalidPort {
                value: entry.clone(),
            })?;
            port_map.insert(host.to_owned(), container.to_owned());
        }

        if let Some(bad) = flags.volumes.iter().find(|v| !v.contains(':')) {
            return Err(ConfigError::InvalidVolume { value: bad.clone() });
        }

        let restart_policy = match flags.restart_policy.as_deref() {
            Some(raw) => raw.parse()?,
            None => RestartPolicy::default(),
        };

        let volume_driver = Some(flags.volume_driver.clone()).filter(|d| !d.is_empty());

        debug!(
            ports = port_map.len(),
            volumes = flags.volumes.len(),
            restart_policy = %restart_policy,
            "container config built"
        );

        Ok(Self {
            container_name: flags.container_name.clone(),
            port_map,
            volumes: flags.volumes.clone(),
            volume_driver,
            restart_policy,
            background: flags.background,
            auto_remove: flags.auto_remove,
            log_output: flags.log,
            open_stdin: flags.interactive,
            tty: flags.tty,
            only_one_instance_per_image: flags.one_instance,
        })
    }
}

/// 위치 인자와 플래그를 모두 검증합니다.
///
/// 위치 인자(개수, 이미지 경로)를 먼저 검증한 뒤 플래그를 검증합니다.
pub fn build(
    args: &[String],
    flags: &ConfigFlags,
) -> Result<(ImageTarget, ContainerConfig), ConfigError> {
    let target = parse_image_target(args)?;
    let config = ContainerConfig::from_flags(flags)?;
    Ok((target, config))
}
