//! 컨테이너 런타임 어댑터 trait
//!
//! 감시 루프가 소비하는 외부 협력자를 추상화합니다.
//! 프로덕션에서는 `ctrmon-docker`의 `BollardRuntime`을, 테스트에서는 mock을 사용합니다.

use std::future::Future;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::container::ContainerConfig;
use crate::error::RuntimeError;

/// 컨테이너 런타임 어댑터
///
/// `Send + Sync + 'static`이므로 감시 루프와 시그널 리스너가 `Arc`로 공유할 수 있습니다.
pub trait ContainerRuntime: Send + Sync + 'static {
    /// 컨테이너를 시작하고 종료될 때까지 대기합니다.
    ///
    /// 컨테이너가 종료되거나 실행에 실패하면 반환합니다.
    /// `cancel`이 이미 취소된 상태라면 새 컨테이너를 띄우지 않고 반환해야 합니다.
    /// 실행 중인 컨테이너는 `cancel`로 중단되지 않으며 [`stop`](Self::stop)에 의해 종료됩니다.
    fn start(
        &self,
        image_path: &Path,
        image_name: &str,
        config: &ContainerConfig,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// 실행 중인 컨테이너의 종료를 요청합니다.
    ///
    /// `container_name`이 비어 있으면 `image_name`으로 만든 컨테이너 전체가 대상입니다.
    /// `force`가 `true`면 유예 시간 없이 강제 종료합니다.
    fn stop(
        &self,
        image_name: &str,
        container_name: &str,
        force: bool,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// 진단용으로 설정을 렌더링합니다.
    fn render_config(&self, config: &ContainerConfig, pretty: bool) -> String {
        render_config(config, pretty)
    }
}

/// 설정을 JSON으로 렌더링합니다.
pub fn render_config(config: &ContainerConfig, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(config)
    } else {
        serde_json::to_string(config)
    };
    rendered.unwrap_or_else(|e| format!("<unrenderable config: {e}>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ConfigFlags;

    #[test]
    fn render_compact_is_single_line() {
        let config = ContainerConfig::from_flags(&ConfigFlags {
            container_name: "web".to_owned(),
            ports: vec!["127.0.0.1:80:8080".to_owned()],
            ..ConfigFlags::default()
        })
        .unwrap();
        let rendered = render_config(&config, false);
        assert!(!rendered.contains('\n'));
        assert!(rendered.contains("\"container_name\":\"web\""));
        assert!(rendered.contains("\"127.0.0.1:80\":\"8080\""));
    }

    #[test]
    fn render_pretty_is_multi_line() {
        let config = ContainerConfig::from_flags(&ConfigFlags::default()).unwrap();
        let rendered = render_config(&config, true);
        assert!(rendered.lines().count() > 1);
        assert!(rendered.contains("\"restart_policy\": \"never\""));
    }
}
