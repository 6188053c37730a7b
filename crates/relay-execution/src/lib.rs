//! 단일 종목 포지션 릴레이 실행 엔진.
//!
//! 외부 제어 요청을 목표 포지션으로 바꾸고, 거래소 주문과 체결 통지를 통해
//! 실제 포지션을 목표에 맞춥니다.
//!
//! # 구성 요소
//!
//! - [`ingestion`]: 제어 요청 수락 판단 (시그니처 충돌 검사)
//! - [`execution`]: 우선순위 규칙 평가 (청산 → 신규 → 포기 → 해결)
//! - [`reconciler`]: 체결/주문 상태 통지 반영
//! - [`tracker`]: 유형별 미체결 주문 추적
//! - [`controller`]: 위 구성 요소를 소유하는 단일 액터
//! - [`hooks`]: 외부 호스트용 라이프사이클 훅
//! - [`provider`], [`paper`]: 주문 실행 추상화와 즉시 체결 Paper 거래소
//!
//! # 예제
//!
//! ```rust,ignore
//! use relay_execution::{ControllerConfig, LifecycleHooks, PaperExecutionProvider, PositionRelay};
//!
//! let mut relay = PositionRelay::new(config, provider, store, shutdown.clone());
//! relay.on_init().await?;
//! let handle = relay.on_start().await?;
//! handle.submit(ControlRequest::parse("1", "5", "1", "1718000000")?)?;
//! ```

pub mod config;
pub mod controller;
pub mod execution;
pub mod hooks;
pub mod ingestion;
pub mod paper;
pub mod provider;
pub mod reconciler;
pub mod state;
pub mod tracker;

pub use config::{
    ControllerConfig, DEFAULT_MAX_REOPEN_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS,
};
pub use controller::{ControllerHandle, ControllerMessage, PositionController};
pub use execution::{CycleStep, ExecutionCycle};
pub use hooks::{LifecycleHooks, PositionRelay};
pub use ingestion::{admit, Admission};
pub use paper::PaperExecutionProvider;
pub use provider::{ExecutionError, OrderExecutionProvider};
pub use reconciler::{apply_order_status, apply_trade};
pub use state::{PositionSnapshot, PositionState};
pub use tracker::OrderTracker;
