//! 포지션 상태.
//!
//! 컨트롤러 액터가 단독으로 소유하는 목표/보유 플래그/시그니처 레코드입니다.
//! 외부에서는 `PositionSnapshot`으로만 관찰합니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use relay_core::{signature_to_raw, OrderCategory, Target};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tracker::OrderTracker;

/// 포지션 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionState {
    /// 목표 포지션
    pub target: Target,
    /// 롱 포지션 보유 중
    pub long_open_pending: bool,
    /// 숏 포지션 보유 중
    pub short_open_pending: bool,
    /// 진행 중인 지시의 시그니처 (`None` = 없음)
    pub current_signature: Option<i64>,
    /// 현재 목표에 대한 신규 진입 시도 횟수
    pub reopen_attempts: u32,
    /// 최근 매수 1호가
    pub last_bid: Decimal,
    /// 최근 매도 1호가
    pub last_ask: Decimal,
    /// 최근 봉 종가
    pub last_bar_close: Option<Decimal>,
}

impl Default for PositionState {
    fn default() -> Self {
        Self {
            target: Target::Flat,
            long_open_pending: false,
            short_open_pending: false,
            current_signature: None,
            reopen_attempts: 0,
            last_bid: Decimal::ZERO,
            last_ask: Decimal::ZERO,
            last_bar_close: None,
        }
    }
}

impl PositionState {
    /// 무포지션 상태 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 시작 목표와 거래소 순포지션으로 상태 초기화.
    ///
    /// 시작 목표가 `Flat`이면 순포지션의 부호를 목표로 사용하고,
    /// 목표 방향의 보유 플래그를 설정합니다.
    pub fn seeded(initial_target: Target, initial_position: i64) -> Self {
        let target = if initial_target == Target::Flat {
            Target::from_position(initial_position)
        } else {
            initial_target
        };

        Self {
            target,
            long_open_pending: target == Target::Long,
            short_open_pending: target == Target::Short,
            ..Self::default()
        }
    }

    /// 보유 포지션 없음.
    pub fn is_flat(&self) -> bool {
        !self.long_open_pending && !self.short_open_pending
    }

    /// 목표가 요구하는 방향이 이미 보유 중인지 여부.
    pub fn desired_leg_open(&self) -> bool {
        match self.target {
            Target::Long => self.long_open_pending,
            Target::Short => self.short_open_pending,
            Target::Flat | Target::Cancel => false,
        }
    }

    /// 관찰용 스냅샷 생성.
    pub fn snapshot(
        &self,
        symbol: &str,
        tracker: &OrderTracker,
        queue_depth: usize,
    ) -> PositionSnapshot {
        PositionSnapshot {
            symbol: symbol.to_string(),
            target: self.target.as_raw(),
            long_open_pending: self.long_open_pending,
            short_open_pending: self.short_open_pending,
            current_signature: signature_to_raw(self.current_signature),
            reopen_attempts: self.reopen_attempts,
            last_bid: self.last_bid,
            last_ask: self.last_ask,
            last_bar_close: self.last_bar_close,
            outstanding: tracker.counts(),
            queue_depth,
            running: true,
            updated_at: Utc::now(),
        }
    }
}

/// 상태 변경 통지로 발행되는 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// 심볼
    pub symbol: String,
    /// 목표 (-1, 0, 1, 9)
    pub target: i8,
    /// 롱 보유
    pub long_open_pending: bool,
    /// 숏 보유
    pub short_open_pending: bool,
    /// 시그니처 (-1 = 없음)
    pub current_signature: i64,
    /// 재진입 시도 횟수
    pub reopen_attempts: u32,
    /// 매수 1호가
    pub last_bid: Decimal,
    /// 매도 1호가
    pub last_ask: Decimal,
    /// 최근 봉 종가
    pub last_bar_close: Option<Decimal>,
    /// 유형별 미체결 주문 수
    pub outstanding: BTreeMap<OrderCategory, usize>,
    /// 대기 중인 지시 수
    pub queue_depth: usize,
    /// 컨트롤러 실행 여부
    pub running: bool,
    /// 갱신 시각
    pub updated_at: DateTime<Utc>,
}
