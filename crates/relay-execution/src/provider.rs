//! 거래소 주문 실행 추상화.
//!
//! 컨트롤러는 이 trait을 통해서만 주문을 제출/취소합니다. 체결 및 주문 상태는
//! 별도 경로(`LifecycleHooks::on_trade`, `on_order`)로 비동기 통지됩니다.

use async_trait::async_trait;
use relay_core::{OrderCategory, OrderId};
use rust_decimal::Decimal;
use thiserror::Error;

/// 주문 실행 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// 거래소 연결/응답 에러
    #[error("거래소 에러: {0}")]
    Venue(String),

    /// 거래소가 요청을 즉시 거부
    #[error("주문 거부: {0}")]
    Rejected(String),
}

/// 주문 실행 제공자 trait.
///
/// 제출 메서드는 거래소가 부여한 주문 ID 목록을 반환합니다. 거래소에 따라
/// 하나의 요청이 여러 주문(예: 금일/전일 포지션 분할 청산)으로 나뉠 수 있습니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct CtpGateway { /* ... */ }
///
/// #[async_trait]
/// impl OrderExecutionProvider for CtpGateway {
///     async fn submit_open_long(&self, price: Decimal, quantity: Decimal)
///         -> Result<Vec<OrderId>, ExecutionError> {
///         // 게이트웨이 주문 API 호출
///     }
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait OrderExecutionProvider: Send + Sync {
    /// 롱 신규 (buy).
    async fn submit_open_long(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError>;

    /// 롱 청산 (sell).
    async fn submit_close_long(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError>;

    /// 숏 신규 (short).
    async fn submit_open_short(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError>;

    /// 숏 청산 (cover).
    async fn submit_close_short(
        &self,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError>;

    /// 주문 취소. 결과는 주문 상태 통지로 전달됩니다.
    async fn cancel(&self, order_id: &str) -> Result<(), ExecutionError>;

    /// 거래소 이름 (로그용).
    fn venue_name(&self) -> &str;

    /// 유형별 제출 디스패치.
    async fn submit(
        &self,
        category: OrderCategory,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Vec<OrderId>, ExecutionError> {
        match category {
            OrderCategory::OpenLong => self.submit_open_long(price, quantity).await,
            OrderCategory::CloseLong => self.submit_close_long(price, quantity).await,
            OrderCategory::OpenShort => self.submit_open_short(price, quantity).await,
            OrderCategory::CloseShort => self.submit_close_short(price, quantity).await,
        }
    }
}
