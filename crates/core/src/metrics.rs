//! 메트릭 이름 상수
//!
//! 감시 루프가 `metrics::counter!()` 매크로에 사용하는 이름을 중앙에서 정의합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `ctrmon_`
//! - 접미어: `_total` (counter)

/// 이미지 레이블 키
pub const LABEL_IMAGE: &str = "image";

/// 시그널 레이블 키
pub const LABEL_SIGNAL: &str = "signal";

/// 컨테이너 시작 시도 횟수 (counter, label: image)
pub const CONTAINER_STARTS_TOTAL: &str = "ctrmon_container_starts_total";

/// 컨테이너 시작 실패 또는 비정상 종료 횟수 (counter, label: image)
pub const CONTAINER_START_FAILURES_TOTAL: &str = "ctrmon_container_start_failures_total";

/// 백오프 후 재시작 횟수 (counter, label: image)
pub const CONTAINER_RESTARTS_TOTAL: &str = "ctrmon_container_restarts_total";

/// 수신한 정지 시그널 수 (counter, label: signal)
pub const STOP_SIGNALS_TOTAL: &str = "ctrmon_stop_signals_total";
