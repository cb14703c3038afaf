//! 감시 루프와 시그널 리스너가 공유하는 종료 신호
//!
//! [`ShutdownSignal`]은 한 번만 `true`로 바뀌는 정지 플래그와
//! [`CancellationToken`]을 묶은 셀입니다. 생성 시점에 감시 루프와 리스너에
//! 명시적으로 복제해 전달하므로, 여러 감시자가 한 프로세스에서 서로 간섭 없이 동작합니다.
//!
//! 플래그는 재설정되지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// 정지 요청 플래그 + 취소 토큰
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    stop_requested: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ShutdownSignal {
    /// `false` 상태의 새 신호를 만듭니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 정지를 요청합니다.
    ///
    /// 플래그를 설정하고 토큰을 취소합니다. 이 호출이 플래그를 처음 바꿨으면 `true`를 반환합니다.
    pub fn trigger(&self) -> bool {
        let first = !self.stop_requested.swap(true, Ordering::SeqCst);
        self.token.cancel();
        first
    }

    /// 정지가 요청되었는지 확인합니다.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// 공유 취소 토큰을 반환합니다.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// 토큰이 취소될 때까지 대기합니다.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
