//! 포지션 컨트롤러 액터.
//!
//! 포지션 상태, 주문 추적기, 지시 큐를 하나의 tokio 태스크가 단독으로 소유합니다.
//! 제어 요청과 거래소 통지는 모두 메시지로 전달되므로 상태 변경은 항상
//! 직렬화됩니다.
//!
//! # 아키텍처
//!
//! ```text
//! HTTP /control ─┐
//! on_tick/on_bar ├── ControllerMessage ──> PositionController ── submit/cancel ──> Venue
//! on_trade/order ┘        (mpsc)               │      ▲                              │
//!                                              │      └──── trade / order 통지 ──────┘
//!                                              └── PositionSnapshot (watch) ──> /state
//! ```

use std::{collections::VecDeque, sync::Arc};

use relay_core::{
    signature_from_raw, signature_to_raw, Bar, ControlRequest, Directive, OrderEvent, Quote,
    RelayError, Result, SignatureStore, TradeEvent, VenueEvent,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::ControllerConfig,
    execution::{CycleStep, ExecutionCycle},
    ingestion::{admit, Admission},
    provider::OrderExecutionProvider,
    reconciler::{apply_order_status, apply_trade},
    state::{PositionSnapshot, PositionState},
    tracker::OrderTracker,
};

/// 컨트롤러 액터로 전달되는 메시지.
#[derive(Debug, Clone)]
pub enum ControllerMessage {
    /// 제어 요청
    Control(ControlRequest),
    /// 호가 갱신
    Tick(Quote),
    /// 봉 갱신
    Bar(Bar),
    /// 체결 통지
    Trade(TradeEvent),
    /// 주문 상태 통지
    Order(OrderEvent),
}

/// 실행 중인 컨트롤러에 대한 핸들.
///
/// 복제 가능하며, 모든 메서드는 논블로킹입니다. 액터가 종료된 뒤 호출하면
/// `RelayError::NotRunning`을 반환합니다.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerMessage>,
    snapshot_rx: watch::Receiver<PositionSnapshot>,
    shutdown: CancellationToken,
}

impl ControllerHandle {
    /// 제어 요청 전달.
    pub fn submit(&self, request: ControlRequest) -> Result<()> {
        self.send(ControllerMessage::Control(request))
    }

    /// 호가 전달.
    pub fn tick(&self, quote: Quote) -> Result<()> {
        self.send(ControllerMessage::Tick(quote))
    }

    /// 봉 전달.
    pub fn bar(&self, bar: Bar) -> Result<()> {
        self.send(ControllerMessage::Bar(bar))
    }

    /// 체결 통지 전달.
    pub fn trade(&self, trade: TradeEvent) -> Result<()> {
        self.send(ControllerMessage::Trade(trade))
    }

    /// 주문 상태 통지 전달.
    pub fn order(&self, order: OrderEvent) -> Result<()> {
        self.send(ControllerMessage::Order(order))
    }

    /// 거래소 통지를 유형에 맞는 메시지로 전달.
    pub fn forward(&self, event: VenueEvent) -> Result<()> {
        let message = match event {
            VenueEvent::Tick(quote) => ControllerMessage::Tick(quote),
            VenueEvent::Bar(bar) => ControllerMessage::Bar(bar),
            VenueEvent::Trade(trade) => ControllerMessage::Trade(trade),
            VenueEvent::Order(order) => ControllerMessage::Order(order),
        };
        self.send(message)
    }

    /// 최신 스냅샷.
    pub fn snapshot(&self) -> PositionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// 상태 변경 통지 구독.
    pub fn subscribe(&self) -> watch::Receiver<PositionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// 컨트롤러 종료 요청.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// 액터 실행 여부.
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.tx.is_closed()
    }

    fn send(&self, message: ControllerMessage) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(RelayError::NotRunning);
        }
        self.tx.send(message).map_err(|_| RelayError::NotRunning)
    }
}

/// 포지션 컨트롤러.
pub struct PositionController {
    config: ControllerConfig,
    state: PositionState,
    tracker: OrderTracker,
    queue: VecDeque<Directive>,
    provider: Arc<dyn OrderExecutionProvider>,
    store: Arc<dyn SignatureStore>,
    rx: mpsc::UnboundedReceiver<ControllerMessage>,
    snapshot_tx: watch::Sender<PositionSnapshot>,
    /// 다음 평가 시각 (`None` = 처리 중인 목표 없음)
    next_evaluation: Option<Instant>,
}

impl PositionController {
    /// 저장된 시그니처를 불러와 상태를 초기화하고 액터를 시작.
    ///
    /// 시그니처 로드 실패는 경고만 남기고 시그니처 없음으로 시작합니다.
    pub async fn start(
        config: ControllerConfig,
        provider: Arc<dyn OrderExecutionProvider>,
        store: Arc<dyn SignatureStore>,
        shutdown: CancellationToken,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let mut state = PositionState::seeded(config.initial_target, config.initial_position);

        match store.load(&config.symbol).await {
            Ok(Some(raw)) => {
                state.current_signature = signature_from_raw(raw);
                info!(symbol = %config.symbol, signature = raw, "저장된 시그니처 로드");
            }
            Ok(None) => debug!(symbol = %config.symbol, "저장된 시그니처 없음"),
            Err(e) => warn!(
                symbol = %config.symbol,
                error = %e,
                "시그니처 로드 실패 - 없음으로 시작"
            ),
        }

        let tracker = OrderTracker::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(state.snapshot(&config.symbol, &tracker, 0));

        info!(
            strategy = %config.strategy_name,
            symbol = %config.symbol,
            venue = provider.venue_name(),
            target = %state.target,
            long = state.long_open_pending,
            short = state.short_open_pending,
            "포지션 컨트롤러 시작"
        );

        let controller = Self {
            config,
            state,
            tracker,
            queue: VecDeque::new(),
            provider,
            store,
            rx,
            snapshot_tx,
            next_evaluation: None,
        };
        let task = tokio::spawn(controller.run(shutdown.clone()));

        let handle = ControllerHandle {
            tx,
            snapshot_rx,
            shutdown,
        };
        (handle, task)
    }

    async fn run(mut self, shutdown: CancellationToken) {
        loop {
            self.dequeue_next();
            let deadline = self.next_evaluation;

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                message = self.rx.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => {
                        debug!(symbol = %self.config.symbol, "모든 핸들 해제됨");
                        break;
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.evaluate().await;
                }
            }

            self.publish(true);
        }

        let dropped = self.queue.len();
        self.queue.clear();
        self.next_evaluation = None;
        self.publish(false);
        info!(symbol = %self.config.symbol, dropped, "포지션 컨트롤러 종료");
    }

    /// 처리 중인 목표가 없으면 다음 지시를 꺼냄.
    fn dequeue_next(&mut self) {
        if self.next_evaluation.is_some() {
            return;
        }
        let Some(directive) = self.queue.pop_front() else {
            return;
        };

        self.state.target = directive.target;
        self.state.reopen_attempts = 0;
        self.next_evaluation = Some(Instant::now() + self.config.poll_interval());

        info!(
            symbol = %self.config.symbol,
            command = %directive.command,
            target = %directive.target,
            sign = directive.signature,
            remaining = self.queue.len(),
            "지시 처리 시작"
        );
        self.publish(true);
    }

    async fn evaluate(&mut self) {
        let mut cycle = ExecutionCycle {
            config: &self.config,
            state: &mut self.state,
            tracker: &mut self.tracker,
            provider: self.provider.as_ref(),
        };

        let step = cycle.evaluate().await;

        self.next_evaluation = match step {
            CycleStep::Retry => Some(Instant::now() + self.config.poll_interval()),
            CycleStep::Finished => {
                debug!(
                    symbol = %self.config.symbol,
                    target = %self.state.target,
                    "지시 처리 종료"
                );
                None
            }
        };
    }

    async fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Control(request) => {
                if let Admission::Admitted(directive) = admit(&mut self.state, &request) {
                    self.queue.push_back(directive);
                }
            }
            ControllerMessage::Tick(quote) => {
                self.state.last_bid = quote.bid;
                self.state.last_ask = quote.ask;
            }
            ControllerMessage::Bar(bar) => {
                self.state.last_bar_close = Some(bar.close);
            }
            ControllerMessage::Trade(trade) => {
                apply_trade(&mut self.state, &mut self.tracker, &trade);
                self.persist_signature().await;
            }
            ControllerMessage::Order(order) => {
                apply_order_status(&mut self.state, &mut self.tracker, &order);
            }
        }
    }

    async fn persist_signature(&self) {
        let raw = signature_to_raw(self.state.current_signature);
        match self.store.save(&self.config.symbol, raw).await {
            Ok(()) => debug!(symbol = %self.config.symbol, signature = raw, "시그니처 저장"),
            Err(e) => warn!(
                symbol = %self.config.symbol,
                signature = raw,
                error = %e,
                "시그니처 저장 실패"
            ),
        }
    }

    fn publish(&self, running: bool) {
        let mut snapshot = self
            .state
            .snapshot(&self.config.symbol, &self.tracker, self.queue.len());
        snapshot.running = running;
        self.snapshot_tx.send_replace(snapshot);
    }
}
