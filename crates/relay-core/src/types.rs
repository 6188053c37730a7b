//! 포지션/주문 도메인 타입.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 거래소 주문 ID.
pub type OrderId = String;

// =============================================================================
// 목표 포지션
// =============================================================================

/// 목표 포지션.
///
/// 원시 값은 제어 채널 및 로그와 호환되도록 `-1`, `0`, `1`, `9`를 사용합니다.
/// `Cancel`(9)은 "즉시 전체 취소"를 뜻하는 일시적 센티널입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// 숏 포지션 목표 (-1)
    Short,
    /// 무포지션 목표 (0)
    Flat,
    /// 롱 포지션 목표 (1)
    Long,
    /// 전체 미체결 취소 (9)
    Cancel,
}

impl Target {
    /// 원시 정수 값.
    pub fn as_raw(self) -> i8 {
        match self {
            Self::Short => -1,
            Self::Flat => 0,
            Self::Long => 1,
            Self::Cancel => 9,
        }
    }

    /// 순포지션 부호로부터 목표 결정 (양수=롱, 음수=숏, 0=무포지션).
    pub fn from_position(position: i64) -> Self {
        match position.signum() {
            1 => Self::Long,
            -1 => Self::Short,
            _ => Self::Flat,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

// =============================================================================
// 체결 방향/개평
// =============================================================================

/// 체결 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 매수 방향
    Long,
    /// 매도 방향
    Short,
}

/// 개평 구분 (신규/청산).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    /// 신규 진입
    Open,
    /// 청산
    Close,
}

/// 거래소 주문 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// 제출 중
    Submitting,
    /// 미체결
    NotTraded,
    /// 부분 체결
    PartTraded,
    /// 전량 체결
    AllTraded,
    /// 취소됨
    Cancelled,
    /// 거부됨
    Rejected,
}

impl OrderStatus {
    /// 취소/거부 여부.
    ///
    /// 체결 완료(`AllTraded`)는 체결 통지 쪽에서 처리하므로 여기에 포함하지 않습니다.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Rejected)
    }
}

/// 주문 유형 분류 (추적 집합 키).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderCategory {
    /// 롱 신규 (buy)
    OpenLong,
    /// 롱 청산 (sell)
    CloseLong,
    /// 숏 신규 (short)
    OpenShort,
    /// 숏 청산 (cover)
    CloseShort,
}

impl OrderCategory {
    /// 전체 분류 (추적 순서).
    pub const ALL: [OrderCategory; 4] = [
        OrderCategory::OpenLong,
        OrderCategory::CloseLong,
        OrderCategory::OpenShort,
        OrderCategory::CloseShort,
    ];

    /// 로그용 이름.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenLong => "open_long",
            Self::CloseLong => "close_long",
            Self::OpenShort => "open_short",
            Self::CloseShort => "close_short",
        }
    }
}

impl fmt::Display for OrderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// 거래소 통지
// =============================================================================

/// 최우선 호가.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// 매수 1호가
    pub bid: Decimal,
    /// 매도 1호가
    pub ask: Decimal,
}

impl Quote {
    /// 새 호가 생성.
    pub fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }
}

/// 봉 데이터.
///
/// 봉 합성/지표 계산은 호스트 쪽 책임이며, 컨트롤러는 마지막 종가만 기록합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// 봉 시작 시각
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: Decimal,
}

/// 체결 통지.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// 주문 ID
    pub order_id: OrderId,
    /// 체결 방향
    pub direction: Direction,
    /// 개평 구분
    pub offset: Offset,
    /// 체결 가격
    pub price: Decimal,
    /// 체결 수량
    pub volume: Decimal,
}

impl TradeEvent {
    /// 새 체결 통지 생성.
    pub fn new(
        order_id: impl Into<OrderId>,
        direction: Direction,
        offset: Offset,
        price: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            direction,
            offset,
            price,
            volume,
        }
    }
}

/// 주문 상태 통지.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// 주문 ID
    pub order_id: OrderId,
    /// 주문 상태
    pub status: OrderStatus,
}

impl OrderEvent {
    /// 새 주문 상태 통지 생성.
    pub fn new(order_id: impl Into<OrderId>, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.into(),
            status,
        }
    }
}

/// 거래소에서 전달되는 비동기 통지.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueEvent {
    /// 호가 갱신
    Tick(Quote),
    /// 봉 갱신
    Bar(Bar),
    /// 체결
    Trade(TradeEvent),
    /// 주문 상태 변경
    Order(OrderEvent),
}
