//! ctrmon 공통 크레이트
//!
//! 단일 컨테이너 서비스 모니터의 공통 타입을 제공합니다.
//!
//! - [`container`]: 컨테이너 설정 레코드와 명령줄 값 검증
//! - [`config`]: 모니터 설정 (`ctrmon.toml` + 환경변수)
//! - [`runtime`]: 컨테이너 런타임 어댑터 trait
//! - [`shutdown`]: 감시 루프와 시그널 리스너가 공유하는 종료 신호
//! - [`error`]: 에러 분류
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod container;
pub mod error;
pub mod metrics;
pub mod runtime;
pub mod shutdown;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, CtrmonError, INPUT_ERROR_EXIT_CODE, RuntimeError};

// 설정
pub use config::MonitorSettings;
pub use container::{ConfigFlags, ContainerConfig, ImageTarget, RestartPolicy};

// 런타임 trait
pub use runtime::ContainerRuntime;

// 종료 신호
pub use shutdown::ShutdownSignal;
