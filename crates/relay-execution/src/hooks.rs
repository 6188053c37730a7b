//! 외부 호스트용 라이프사이클 훅.
//!
//! 호스트(실행 프레임워크나 바이너리)는 `LifecycleHooks`만 호출하고,
//! `PositionRelay`가 이를 컨트롤러 액터 메시지로 전달합니다.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{
    Bar, ControlRequest, OrderEvent, Quote, RelayError, Result, SignatureStore, TradeEvent,
    VenueEvent,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    config::ControllerConfig,
    controller::{ControllerHandle, PositionController},
    provider::OrderExecutionProvider,
};

/// 호스트가 호출하는 라이프사이클/이벤트 콜백.
///
/// 이벤트 콜백은 논블로킹이며 `on_start` 이전이나 `on_stop` 이후에 호출하면
/// `RelayError::NotRunning`을 반환합니다.
#[async_trait]
pub trait LifecycleHooks: Send {
    /// 초기화 (설정 검증).
    async fn on_init(&mut self) -> Result<()>;

    /// 시작. 컨트롤러 핸들을 반환합니다.
    async fn on_start(&mut self) -> Result<ControllerHandle>;

    /// 종료. 대기 중인 지시를 버리고 컨트롤러가 멈출 때까지 대기합니다.
    async fn on_stop(&mut self) -> Result<()>;

    /// 호가 수신.
    fn on_tick(&self, quote: Quote) -> Result<()>;

    /// 봉 수신.
    fn on_bar(&self, bar: Bar) -> Result<()>;

    /// 체결 통지 수신.
    fn on_trade(&self, trade: TradeEvent) -> Result<()>;

    /// 주문 상태 통지 수신.
    fn on_order(&self, order: OrderEvent) -> Result<()>;
}

/// 단일 종목 포지션 릴레이.
pub struct PositionRelay {
    config: ControllerConfig,
    provider: Arc<dyn OrderExecutionProvider>,
    store: Arc<dyn SignatureStore>,
    shutdown: CancellationToken,
    handle: Option<ControllerHandle>,
    task: Option<JoinHandle<()>>,
}

impl PositionRelay {
    /// 새 릴레이 생성.
    ///
    /// `shutdown` 토큰이 취소되면 컨트롤러도 함께 종료됩니다.
    pub fn new(
        config: ControllerConfig,
        provider: Arc<dyn OrderExecutionProvider>,
        store: Arc<dyn SignatureStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            shutdown,
            handle: None,
            task: None,
        }
    }

    /// 실행 중인 컨트롤러 핸들.
    pub fn handle(&self) -> Option<&ControllerHandle> {
        self.handle.as_ref()
    }

    /// 제어 요청 전달.
    pub fn on_control(&self, request: ControlRequest) -> Result<()> {
        self.running()?.submit(request)
    }

    /// 거래소 통지 전달.
    pub fn on_venue_event(&self, event: VenueEvent) -> Result<()> {
        self.running()?.forward(event)
    }

    fn running(&self) -> Result<&ControllerHandle> {
        self.handle.as_ref().ok_or(RelayError::NotRunning)
    }
}

#[async_trait]
impl LifecycleHooks for PositionRelay {
    async fn on_init(&mut self) -> Result<()> {
        info!(
            strategy = %self.config.strategy_name,
            symbol = %self.config.symbol,
            quantity = %self.config.order_quantity,
            poll_interval_ms = self.config.poll_interval_ms,
            max_reopen_attempts = self.config.max_reopen_attempts,
            "릴레이 초기화"
        );
        self.config.validate()
    }

    async fn on_start(&mut self) -> Result<ControllerHandle> {
        if let Some(handle) = &self.handle {
            warn!(symbol = %self.config.symbol, "이미 시작된 릴레이");
            return Ok(handle.clone());
        }
        if self.shutdown.is_cancelled() {
            return Err(RelayError::NotRunning);
        }

        let (handle, task) = PositionController::start(
            self.config.clone(),
            Arc::clone(&self.provider),
            Arc::clone(&self.store),
            self.shutdown.clone(),
        )
        .await;

        self.handle = Some(handle.clone());
        self.task = Some(task);
        Ok(handle)
    }

    async fn on_stop(&mut self) -> Result<()> {
        self.shutdown.cancel();
        self.handle = None;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(symbol = %self.config.symbol, error = %e, "컨트롤러 태스크 비정상 종료");
            }
        }
        info!(symbol = %self.config.symbol, "릴레이 종료");
        Ok(())
    }

    fn on_tick(&self, quote: Quote) -> Result<()> {
        self.running()?.tick(quote)
    }

    fn on_bar(&self, bar: Bar) -> Result<()> {
        self.running()?.bar(bar)
    }

    fn on_trade(&self, trade: TradeEvent) -> Result<()> {
        self.running()?.trade(trade)
    }

    fn on_order(&self, order: OrderEvent) -> Result<()> {
        self.running()?.order(order)
    }
}
