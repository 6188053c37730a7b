//! Paper Trading 거래소.
//!
//! 모든 주문을 요청 가격에 즉시 전량 체결하고, 체결 통지와 주문 상태 통지를
//! 채널로 발행합니다. 실제 거래소 게이트웨이가 없을 때 바이너리가 사용합니다.
//! 가격이나 수량이 0 이하인 주문(아직 호가를 받지 못한 경우 등)은 즉시 거부합니다.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use relay_core::{
    Direction, Offset, OrderCategory, OrderEvent, OrderId, OrderStatus, TradeEvent, VenueEvent,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::provider::{ExecutionError, OrderExecutionProvider};

/// 즉시 체결 Paper 거래소.
pub struct PaperExecutionProvider {
    /// 통지 발행 채널
    events: mpsc::UnboundedSender<VenueEvent>,
    /// 체결된 주문 수
    fills: AtomicU64,
}

impl PaperExecutionProvider {
    /// 새 Paper 거래소 생성.
    pub fn new(events: mpsc::UnboundedSender<VenueEvent>) -> Self {
        Self {
            events,
            fills: AtomicU64::new(0),
        }
    }

    /// 누적 체결 수.
    pub fn fill_count(&self) -> u64 {
        self.fills.load(Ordering::Relaxed)
    }

    fn fill(
        &self,
        category: OrderCategory,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError> {
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return Err(ExecutionError::Rejected(format!(
                "{} 가격 {} / 수량 {}",
                category, price, quantity
            )));
        }

        let (direction, offset) = match category {
            OrderCategory::OpenLong => (Direction::Long, Offset::Open),
            OrderCategory::CloseLong => (Direction::Short, Offset::Close),
            OrderCategory::OpenShort => (Direction::Short, Offset::Open),
            OrderCategory::CloseShort => (Direction::Long, Offset::Close),
        };
        let order_id = format!("PAPER.{}", Uuid::new_v4().simple());

        let trade = TradeEvent::new(order_id.clone(), direction, offset, price, quantity);
        self.events
            .send(VenueEvent::Trade(trade))
            .and_then(|_| {
                self.events.send(VenueEvent::Order(OrderEvent::new(
                    order_id.clone(),
                    OrderStatus::AllTraded,
                )))
            })
            .map_err(|_| ExecutionError::Venue("통지 채널이 닫혔습니다".to_string()))?;

        self.fills.fetch_add(1, Ordering::Relaxed);
        info!(%order_id, %category, %price, %quantity, "[paper] 즉시 체결");
        Ok(vec![order_id])
    }
}

#[async_trait]
impl OrderExecutionProvider for PaperExecutionProvider {
    async fn submit_open_long(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError> {
        self.fill(OrderCategory::OpenLong, price, quantity)
    }

    async fn submit_close_long(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError> {
        self.fill(OrderCategory::CloseLong, price, quantity)
    }

    async fn submit_open_short(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError> {
        self.fill(OrderCategory::OpenShort, price, quantity)
    }

    async fn submit_close_short(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError> {
        self.fill(OrderCategory::CloseShort, price, quantity)
    }

    async fn cancel(&self, order_id: &str) -> Result<(), ExecutionError> {
        // 모든 주문이 즉시 체결되므로 취소할 대상이 없음
        debug!(order_id, "[paper] 이미 체결된 주문 - 취소 생략");
        Ok(())
    }

    fn venue_name(&self) -> &str {
        "paper"
    }
}
