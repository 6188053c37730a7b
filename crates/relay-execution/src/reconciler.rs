//! 거래소 통지 반영.
//!
//! 체결/주문 상태 통지를 포지션 상태와 주문 추적기에 적용합니다.
//! 컨트롤러 액터 안에서만 호출되므로 실행 루프와 같은 순서로 직렬화됩니다.

use relay_core::{Direction, Offset, OrderCategory, OrderEvent, OrderStatus, Target, TradeEvent};
use tracing::{debug, info, warn};

use crate::{state::PositionState, tracker::OrderTracker};

/// 체결 통지 적용. 추적기에서 제거된 주문 유형을 반환합니다.
pub fn apply_trade(
    state: &mut PositionState,
    tracker: &mut OrderTracker,
    trade: &TradeEvent,
) -> Option<OrderCategory> {
    match trade.offset {
        Offset::Open => match trade.direction {
            Direction::Long => {
                if state.short_open_pending {
                    warn!(order_id = %trade.order_id, "숏 보유 중 롱 신규 체결 - 숏 플래그 해제");
                    state.short_open_pending = false;
                }
                state.long_open_pending = true;
                state.target = Target::Long;
            }
            Direction::Short => {
                if state.long_open_pending {
                    warn!(order_id = %trade.order_id, "롱 보유 중 숏 신규 체결 - 롱 플래그 해제");
                    state.long_open_pending = false;
                }
                state.short_open_pending = true;
                state.target = Target::Short;
            }
        },
        Offset::Close => {
            // 매수 청산은 숏을, 매도 청산은 롱을 닫음
            match trade.direction {
                Direction::Long => state.short_open_pending = false,
                Direction::Short => state.long_open_pending = false,
            }
            state.target = Target::Flat;
            state.current_signature = None;
        }
    }

    info!(
        order_id = %trade.order_id,
        direction = ?trade.direction,
        offset = ?trade.offset,
        price = %trade.price,
        volume = %trade.volume,
        long = state.long_open_pending,
        short = state.short_open_pending,
        "체결 반영"
    );

    let removed = tracker.remove(&trade.order_id);
    if let Some(category) = removed {
        debug!(
            order_id = %trade.order_id,
            %category,
            remaining = tracker.len(category),
            "체결 주문 추적 종료"
        );
    }
    removed
}

/// 주문 상태 통지 적용.
///
/// 취소/거부가 아닌 상태는 무시하고 `false`를 반환합니다.
pub fn apply_order_status(
    state: &mut PositionState,
    tracker: &mut OrderTracker,
    order: &OrderEvent,
) -> bool {
    if !order.status.is_terminal() {
        debug!(order_id = %order.order_id, status = ?order.status, "주문 상태 갱신");
        return false;
    }

    if order.status == OrderStatus::Rejected {
        match state.target {
            Target::Flat => {
                state.long_open_pending = false;
                state.short_open_pending = false;
            }
            Target::Long if state.short_open_pending => state.short_open_pending = false,
            Target::Short if state.long_open_pending => state.long_open_pending = false,
            _ => {}
        }
        warn!(
            order_id = %order.order_id,
            target = %state.target,
            long = state.long_open_pending,
            short = state.short_open_pending,
            "주문 거부 - 보유 플래그 보정"
        );
    }

    if let Some(category) = tracker.remove(&order.order_id) {
        info!(
            order_id = %order.order_id,
            status = ?order.status,
            %category,
            remaining = tracker.len(category),
            "주문 추적 종료"
        );
    }
    true
}
