//! ctrmon Docker 런타임 어댑터
//!
//! # Module Structure
//!
//! - [`docker`]: `ContainerRuntime` 구현 (`BollardRuntime`)
//! - `options`: `ContainerConfig` -> Docker 생성 옵션 변환
//!
//! # Start Flow
//!
//! ```text
//! inspect_image ──404──> load archive (image_path)
//!       │
//! remove other instances / stale container with same name
//!       │
//! create ──> start ──> (forward logs) ──> wait until not-running
//! ```

pub mod docker;
mod options;

// --- Public API Re-exports ---

pub use docker::BollardRuntime;
