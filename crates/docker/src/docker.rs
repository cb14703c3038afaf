//! Docker 런타임 어댑터
//!
//! [`BollardRuntime`]은 core의 [`ContainerRuntime`] trait을 bollard로 구현합니다.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌────────────────┐
//! │ Supervisor loop  │   │ Signal listener│
//! └────────┬─────────┘   └───────┬────────┘
//!          │ start()             │ stop()
//!          ▼                     ▼
//!      ┌────────────────────────────┐
//!      │ ContainerRuntime (trait)   │
//!      └─────────────┬──────────────┘
//!                    ▼
//!             BollardRuntime
//!                    │
//!                    ▼
//!              Docker Daemon
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use ctrmon_docker::BollardRuntime;
//!
//! let runtime = BollardRuntime::connect_local()?
//!     .with_stop_timeout(std::time::Duration::from_secs(10));
//! # Ok::<(), ctrmon_core::RuntimeError>(())
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bollard::Docker;
use bollard::container::{
    CreateContainerOptions, KillContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::ImportImageOptions;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ctrmon_core::container::ContainerConfig;
use ctrmon_core::error::RuntimeError;
use ctrmon_core::runtime::ContainerRuntime;

use crate::options::{create_config, validate_container_name};

/// Docker 연결 타임아웃 (초)
const CONNECT_TIMEOUT_SECS: u64 = 120;

/// 기본 정지 유예 시간
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// 응답이 주어진 HTTP 상태 코드인지 확인합니다.
fn is_status(err: &BollardError, code: u16) -> bool {
    matches!(err, BollardError::DockerResponseServerError { status_code, .. } if *status_code == code)
}

/// bollard 기반 프로덕션 런타임
///
/// 내부적으로 `Arc<bollard::Docker>`를 사용하므로 로그 전달 태스크와 연결을 공유합니다.
pub struct BollardRuntime {
    docker: Arc<Docker>,
    stop_timeout: Duration,
}

impl BollardRuntime {
    /// 플랫폼 기본 로컬 소켓으로 연결합니다.
    pub fn connect_local() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| {
            RuntimeError::Connection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self::from_docker(docker))
    }

    /// 지정한 소켓 경로로 연결합니다.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_socket(
            socket_path,
            CONNECT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            RuntimeError::Connection(format!(
                "failed to connect to docker at {socket_path}: {e}"
            ))
        })?;
        Ok(Self::from_docker(docker))
    }

    /// 소켓 경로가 비어 있으면 로컬 기본값으로, 아니면 해당 소켓으로 연결합니다.
    pub fn connect(socket_path: &str) -> Result<Self, RuntimeError> {
        if socket_path.is_empty() {
            Self::connect_local()
        } else {
            Self::connect_with_socket(socket_path)
        }
    }

    fn from_docker(docker: Docker) -> Self {
        Self {
            docker: Arc::new(docker),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// 비강제 정지 시 SIGKILL 전 유예 시간을 설정합니다.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// 이미지가 없으면 `image_path`의 아카이브를 로드합니다.
    async fn ensure_image(&self, image_path: &Path, image_name: &str) -> Result<(), RuntimeError> {
        match self.docker.inspect_image(image_name).await {
            Ok(_) => {
                debug!(image = image_name, "image already present");
                return Ok(());
            }
            Err(e) if is_status(&e, 404) => {}
            Err(e) => {
                return Err(RuntimeError::Api(format!(
                    "inspect image '{image_name}' failed: {e}"
                )));
            }
        }

        let load_error = |reason: String| RuntimeError::ImageLoad {
            image: image_name.to_owned(),
            path: image_path.display().to_string(),
            reason,
        };

        info!(image = image_name, path = %image_path.display(), "loading image archive");
        let archive = tokio::fs::read(image_path)
            .await
            .map_err(|e| load_error(e.to_string()))?;

        let mut progress = pin!(self.docker.import_image(
            ImportImageOptions::default(),
            Bytes::from(archive),
            None,
        ));
        while let Some(item) = progress.next().await {
            let info = item.map_err(|e| load_error(e.to_string()))?;
            if let Some(err) = info.error {
                return Err(load_error(err));
            }
        }
        Ok(())
    }

    /// 필터에 맞는 모든 컨테이너(정지된 것 포함)의 ID를 반환합니다.
    async fn container_ids(&self, key: &str, value: String) -> Result<Vec<String>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: true,
            filters: HashMap::from([(key.to_owned(), vec![value])]),
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| RuntimeError::Api(format!("list containers failed: {e}")))?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    /// 컨테이너 이름과 정확히 일치하는 컨테이너 ID를 반환합니다.
    async fn ids_by_name(&self, name: &str) -> Result<Vec<String>, RuntimeError> {
        self.container_ids("name", format!("^/{name}$")).await
    }

    /// 이미지로 만든 컨테이너 ID를 반환합니다.
    async fn ids_by_image(&self, image_name: &str) -> Result<Vec<String>, RuntimeError> {
        self.container_ids("ancestor", image_name.to_owned()).await
    }

    /// 컨테이너를 강제 삭제합니다. 이미 없거나 삭제 중이면 무시합니다.
    async fn remove_quietly(&self, id: &str) {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => debug!(container_id = id, "removed stale container"),
            Err(e) if is_status(&e, 404) || is_status(&e, 409) => {}
            Err(e) => warn!(container_id = id, error = %e, "failed to remove stale container"),
        }
    }

    /// 컨테이너가 정지할 때까지 대기하고 종료 코드를 반환합니다.
    async fn wait_for_exit(&self, id: &str) -> Result<i64, RuntimeError> {
        let mut stream = pin!(self.docker.wait_container(
            id,
            Some(WaitContainerOptions {
                condition: "not-running",
            }),
        ));
        let mut code = 0;
        while let Some(item) = stream.next().await {
            match item {
                Ok(response) => code = response.status_code,
                Err(BollardError::DockerContainerWaitError { code: exit, .. }) => code = exit,
                // auto-remove 컨테이너는 대기 전에 사라질 수 있음
                Err(e) if is_status(&e, 404) => break,
                Err(e) => {
                    return Err(RuntimeError::Api(format!("wait container failed: {e}")));
                }
            }
        }
        Ok(code)
    }

    /// 컨테이너 로그를 tracing으로 전달하는 태스크를 시작합니다.
    fn forward_logs(&self, id: &str, image_name: &str) -> tokio::task::JoinHandle<()> {
        let docker = Arc::clone(&self.docker);
        let id = id.to_owned();
        let image = image_name.to_owned();
        tokio::spawn(async move {
            let options = LogsOptions::<String> {
                follow: true,
                stdout: true,
                stderr: true,
                ..Default::default()
            };
            let mut logs = pin!(docker.logs(&id, Some(options)));
            while let Some(item) = logs.next().await {
                match item {
                    Ok(output) => {
                        let line = output.to_string();
                        info!(target: "ctrmon::container", image = %image, "{}", line.trim_end());
                    }
                    Err(e) => {
                        debug!(error = %e, "container log stream ended");
                        break;
                    }
                }
            }
        })
    }

    async fn stop_one(&self, id: &str, force: bool) -> Result<(), RuntimeError> {
        let result = if force {
            self.docker
                .kill_container(id, Some(KillContainerOptions { signal: "SIGKILL" }))
                .await
        } else {
            let t = i64::try_from(self.stop_timeout.as_secs()).unwrap_or(i64::MAX);
            self.docker
                .stop_container(id, Some(StopContainerOptions { t }))
                .await
        };

        match result {
            Ok(()) => Ok(()),
            // 304: 이미 정지됨, 404: 이미 삭제됨, 409: 실행 중이 아님 (kill)
            Err(e) if is_status(&e, 304) || is_status(&e, 404) || is_status(&e, 409) => {
                debug!(container_id = id, "container already stopped");
                Ok(())
            }
            Err(e) => Err(RuntimeError::StopFailed {
                target: id.to_owned(),
                reason: e.to_string(),
            }),
        }
    }
}

impl ContainerRuntime for BollardRuntime {
    async fn start(
        &self,
        image_path: &Path,
        image_name: &str,
        config: &ContainerConfig,
        cancel: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        if cancel.is_cancelled() {
            debug!(image = image_name, "stop already requested, not launching");
            return Ok(());
        }
        validate_container_name(&config.container_name)?;

        self.ensure_image(image_path, image_name).await?;

        if config.only_one_instance_per_image {
            for id in self.ids_by_image(image_name).await? {
                info!(container_id = %id, image = image_name, "removing other instance of image");
                self.remove_quietly(&id).await;
            }
        }
        if !config.container_name.is_empty() {
            for id in self.ids_by_name(&config.container_name).await? {
                self.remove_quietly(&id).await;
            }
        }

        let options = Some(config.container_name.as_str())
            .filter(|name| !name.is_empty())
            .map(|name| CreateContainerOptions {
                name: name.to_owned(),
                ..Default::default()
            });
        let created = self
            .docker
            .create_container(options, create_config(image_name, config))
            .await
            .map_err(|e| RuntimeError::StartFailed {
                image: image_name.to_owned(),
                reason: format!("create failed: {e}"),
            })?;
        for warning in &created.warnings {
            warn!(image = image_name, warning = %warning, "docker create warning");
        }
        let id = created.id;

        if cancel.is_cancelled() {
            debug!(container_id = %id, "stop requested during launch, discarding container");
            self.remove_quietly(&id).await;
            return Ok(());
        }

        self.docker
            .start_container(&id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| RuntimeError::StartFailed {
                image: image_name.to_owned(),
                reason: format!("start failed: {e}"),
            })?;
        info!(container_id = %id, image = image_name, "container started");

        let log_task = config.log_output.then(|| self.forward_logs(&id, image_name));

        let code = self.wait_for_exit(&id).await;

        if let Some(task) = log_task {
            task.abort();
        }

        match code? {
            0 => Ok(()),
            code => Err(RuntimeError::ContainerExited {
                image: image_name.to_owned(),
                code,
            }),
        }
    }

    async fn stop(
        &self,
        image_name: &str,
        container_name: &str,
        force: bool,
    ) -> Result<(), RuntimeError> {
        validate_container_name(container_name)?;

        let ids = if container_name.is_empty() {
            self.ids_by_image(image_name).await?
        } else {
            self.ids_by_name(container_name).await?
        };

        if ids.is_empty() {
            debug!(image = image_name, container = container_name, "no container to stop");
            return Ok(());
        }

        let mut first_error = None;
        for id in ids {
            info!(container_id = %id, force, "stopping container");
            if let Err(e) = self.stop_one(&id, force).await {
                warn!(container_id = %id, error = %e, "stop request failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_status_matches_server_errors_only() {
        let not_found = BollardError::DockerResponseServerError {
            status_code: 404,
            message: "no such container".to_owned(),
        };
        assert!(is_status(&not_found, 404));
        assert!(!is_status(&not_found, 409));

        let wait = BollardError::DockerContainerWaitError {
            error: "exited".to_owned(),
            code: 1,
        };
        assert!(!is_status(&wait, 404));
    }

    #[test]
    fn bollard_runtime_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<BollardRuntime>();
    }
}
