//! 에러 타입: 입력 에러와 런타임 어댑터 에러

/// 입력 검증 실패 시 사용하는 종료 코드
pub const INPUT_ERROR_EXIT_CODE: i32 = 255;

/// ctrmon 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CtrmonError {
    /// 명령줄 입력 및 설정 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 컨테이너 런타임 어댑터 에러
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// I/O 에러 (시그널 핸들러 설치 등)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CtrmonError {
    /// 에러를 프로세스 종료 코드로 변환합니다.
    ///
    /// 입력 에러는 재시도 없이 즉시 255로 종료합니다.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => INPUT_ERROR_EXIT_CODE,
            Self::Runtime(_) | Self::Io(_) => 1,
        }
    }
}

/// 명령줄 인자, 플래그 값, 설정 파일 관련 에러
///
/// 모든 변형이 치명적이며 호출자는 사용법을 출력한 뒤 255로 종료해야 합니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 필수 위치 인자 개수 불일치
    #[error(
        "mandatory arguments: path_to_image and/or image_name/ID not provided (expected 2, got {got})"
    )]
    MissingArguments { got: usize },

    /// 이미지 경로에 접근할 수 없음
    #[error("error accessing {path}: {reason}")]
    ImagePathNotFound { path: String, reason: String },

    /// 포트 매핑 형식 오류
    #[error("{value}: invalid format: port: expected [host_ip:]host_port:container_port")]
    InvalidPort { value: String },

    /// 볼륨 형식 오류
    #[error("{value}: invalid format: volume: expected volume_name/host_path:container_path")]
    InvalidVolume { value: String },

    /// 알 수 없는 재시작 정책
    #[error(
        "{value}: invalid restart policy: expected one of never, on-failure, unless-stopped, always"
    )]
    InvalidRestartPolicy { value: String },

    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 컨테이너 런타임 어댑터 에러
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// 런타임 데몬 연결 실패
    #[error("runtime connection error: {0}")]
    Connection(String),

    /// 이미지 로드 실패
    #[error("failed to load image '{image}' from {path}: {reason}")]
    ImageLoad {
        image: String,
        path: String,
        reason: String,
    },

    /// 컨테이너 시작 실패
    #[error("failed to start container of image '{image}': {reason}")]
    StartFailed { image: String, reason: String },

    /// 컨테이너가 0이 아닌 코드로 종료됨
    #[error("container of image '{image}' exited with status {code}")]
    ContainerExited { image: String, code: i64 },

    /// 컨테이너 정지 실패
    #[error("failed to stop container '{target}': {reason}")]
    StopFailed { target: String, reason: String },

    /// 그 밖의 런타임 API 에러
    #[error("runtime api error: {0}")]
    Api(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exits_with_255() {
        let err: CtrmonError = ConfigError::MissingArguments { got: 1 }.into();
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn io_error_exits_with_1() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "signal handler");
        let err: CtrmonError = io.into();
        assert!(matches!(err, CtrmonError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn runtime_error_exits_with_1() {
        let err: CtrmonError = RuntimeError::Connection("socket missing".to_owned()).into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn invalid_port_display_contains_value() {
        let err = ConfigError::InvalidPort {
            value: "8080".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("8080"));
        assert!(msg.contains("invalid format"));
    }

    #[test]
    fn invalid_restart_policy_display_lists_literals() {
        let err = ConfigError::InvalidRestartPolicy {
            value: "sometimes".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sometimes"));
        assert!(msg.contains("unless-stopped"));
    }

    #[test]
    fn container_exited_display() {
        let err = RuntimeError::ContainerExited {
            image: "nginx".to_owned(),
            code: 137,
        };
        assert!(err.to_string().contains("137"));
    }

    #[test]
    fn stop_failed_display() {
        let err = RuntimeError::StopFailed {
            target: "web".to_owned(),
            reason: "timeout".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("web"));
        assert!(msg.contains("timeout"));
    }
}
