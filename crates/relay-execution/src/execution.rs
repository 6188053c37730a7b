//! 실행 루프 규칙 평가.
//!
//! 큐에서 꺼낸 목표를 향해 한 번의 평가마다 우선순위 규칙을 위에서부터
//! 검사하고, 처음 일치한 규칙의 주문 동작을 수행합니다.
//!
//! ```text
//! 1. 취소(9)       → 전체 미체결 취소 후 계속 검사
//! 2. 롱 청산       → 매수1호가에 sell, 이미 미체결이면 전체 취소     [재평가]
//! 3. 숏 청산       → 매도1호가에 cover, 이미 미체결이면 전체 취소    [재평가]
//! 4. 롱 신규       → 매도1호가에 buy (시도 한도 내)                   [재평가]
//! 5. 숏 신규       → 매수1호가에 short (시도 한도 내)                 [재평가]
//! 6. 포기          → 목표를 0으로, 해당 방향 신규 주문 추적 해제
//! 7. 해결          → 무포지션이면 시그니처 초기화
//! ```
//!
//! 청산이 신규보다 우선하므로 반대 방향 전환 시 먼저 포지션을 닫습니다.
//! 같은 유형의 미체결 주문이 있으면 새로 제출하지 않고 취소 후 다음 평가에서
//! 현재 호가로 다시 제출합니다.

use relay_core::{OrderCategory, Target};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    config::ControllerConfig, provider::OrderExecutionProvider, state::PositionState,
    tracker::OrderTracker,
};

/// 한 번의 평가 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStep {
    /// 평가 주기 후 다시 평가
    Retry,
    /// 현재 목표 처리 종료, 다음 지시로 진행
    Finished,
}

/// 실행 루프 한 번의 평가에 필요한 참조 묶음.
pub struct ExecutionCycle<'a> {
    pub config: &'a ControllerConfig,
    pub state: &'a mut PositionState,
    pub tracker: &'a mut OrderTracker,
    pub provider: &'a dyn OrderExecutionProvider,
}

impl ExecutionCycle<'_> {
    /// 우선순위 규칙을 한 번 평가.
    pub async fn evaluate(&mut self) -> CycleStep {
        let target = self.state.target;

        if target == Target::Cancel {
            info!(
                symbol = %self.config.symbol,
                long = self.state.long_open_pending,
                short = self.state.short_open_pending,
                "전체 취소"
            );
            self.cancel_all().await;
        }

        if matches!(target, Target::Flat | Target::Short) && self.state.long_open_pending {
            let price = self.state.last_bid;
            self.submit_or_reprice(OrderCategory::CloseLong, price).await;
            return CycleStep::Retry;
        }

        if matches!(target, Target::Flat | Target::Long) && self.state.short_open_pending {
            let price = self.state.last_ask;
            self.submit_or_reprice(OrderCategory::CloseShort, price).await;
            return CycleStep::Retry;
        }

        let max_attempts = self.config.max_reopen_attempts;

        if target == Target::Long
            && !self.state.long_open_pending
            && self.state.reopen_attempts < max_attempts
        {
            self.state.reopen_attempts += 1;
            let price = self.state.last_ask;
            self.submit_or_reprice(OrderCategory::OpenLong, price).await;
            return CycleStep::Retry;
        }

        if target == Target::Short
            && !self.state.short_open_pending
            && self.state.reopen_attempts < max_attempts
        {
            self.state.reopen_attempts += 1;
            let price = self.state.last_bid;
            self.submit_or_reprice(OrderCategory::OpenShort, price).await;
            return CycleStep::Retry;
        }

        if self.state.reopen_attempts >= max_attempts
            && matches!(target, Target::Long | Target::Short)
            && !self.state.desired_leg_open()
        {
            warn!(
                symbol = %self.config.symbol,
                %target,
                attempts = self.state.reopen_attempts,
                "신규 진입 실패 - 목표를 무포지션으로 전환"
            );
            // 청산 쪽 추적은 그대로 둠
            let abandoned = if target == Target::Long {
                OrderCategory::OpenLong
            } else {
                OrderCategory::OpenShort
            };
            self.tracker.clear(abandoned);
            self.state.target = Target::Flat;
        }

        if self.state.target == Target::Flat
            && self.state.is_flat()
            && self.state.current_signature.is_some()
        {
            self.state.current_signature = None;
            info!(symbol = %self.config.symbol, "목표 해결 - 시그니처 초기화");
        }

        CycleStep::Finished
    }

    /// 같은 유형의 미체결 주문이 없으면 제출하고, 있으면 전체 취소.
    async fn submit_or_reprice(&mut self, category: OrderCategory, price: Decimal) {
        if self.tracker.is_outstanding(category) {
            self.cancel_all().await;
            return;
        }

        let quantity = self.config.order_quantity;
        let ids = match self.provider.submit(category, price, quantity).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    symbol = %self.config.symbol,
                    venue = self.provider.venue_name(),
                    %category,
                    %price,
                    error = %e,
                    "주문 제출 실패"
                );
                Vec::new()
            }
        };

        info!(
            symbol = %self.config.symbol,
            %category,
            %price,
            %quantity,
            target = %self.state.target,
            long = self.state.long_open_pending,
            short = self.state.short_open_pending,
            order_ids = ?ids,
            "주문 제출"
        );
        self.tracker.replace(category, ids);
    }

    /// 네 유형 전체의 미체결 주문 취소.
    ///
    /// 취소 결과는 주문 상태 통지로 들어오므로 추적기는 여기서 수정하지 않습니다.
    async fn cancel_all(&mut self) {
        for order_id in self.tracker.outstanding_ids() {
            match self.provider.cancel(&order_id).await {
                Ok(()) => info!(%order_id, "주문 취소 요청"),
                Err(e) => warn!(%order_id, error = %e, "주문 취소 실패"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use relay_core::OrderId;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::provider::ExecutionError;

    /// 호출 기록용 Mock 거래소.
    #[derive(Default)]
    struct RecordingVenue {
        calls: Mutex<Vec<String>>,
        fail_submit: bool,
    }

    impl RecordingVenue {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, name: &str, price: Decimal) -> Result<Vec<OrderId>, ExecutionError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("{}@{}", name, price));
            if self.fail_submit {
                return Err(ExecutionError::Venue("down".to_string()));
            }
            Ok(vec![format!("{}-{}", name, calls.len())])
        }
    }

    #[async_trait]
    impl OrderExecutionProvider for RecordingVenue {
        async fn submit_open_long(
            &self,
            price: Decimal,
            _quantity: Decimal,
        ) -> Result<Vec<OrderId>, ExecutionError> {
            self.record("buy", price)
        }

        async fn submit_close_long(
            &self,
            price: Decimal,
            _quantity: Decimal,
        ) -> Result<Vec<OrderId>, ExecutionError> {
            self.record("sell", price)
        }

        async fn submit_open_short(
            &self,
            price: Decimal,
            _quantity: Decimal,
        ) -> Result<Vec<OrderId>, ExecutionError> {
            self.record("short", price)
        }

        async fn submit_close_short(
            &self,
            price: Decimal,
            _quantity: Decimal,
        ) -> Result<Vec<OrderId>, ExecutionError> {
            self.record("cover", price)
        }

        async fn cancel(&self, order_id: &str) -> Result<(), ExecutionError> {
            self.calls.lock().unwrap().push(format!("cancel:{}", order_id));
            Ok(())
        }

        fn venue_name(&self) -> &str {
            "recording"
        }
    }

    fn quoted_state(target: Target) -> PositionState {
        PositionState {
            target,
            last_bid: dec!(100),
            last_ask: dec!(101),
            ..PositionState::default()
        }
    }

    async fn step(
        config: &ControllerConfig,
        state: &mut PositionState,
        tracker: &mut OrderTracker,
        venue: &RecordingVenue,
    ) -> CycleStep {
        ExecutionCycle {
            config,
            state,
            tracker,
            provider: venue,
        }
        .evaluate()
        .await
    }

    #[tokio::test]
    async fn test_open_long_submits_at_ask() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Long);
        let mut tracker = OrderTracker::new();

        let result = step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(result, CycleStep::Retry);
        assert_eq!(venue.calls(), vec!["buy@101"]);
        assert_eq!(state.reopen_attempts, 1);
        assert!(tracker.is_outstanding(OrderCategory::OpenLong));
    }

    #[tokio::test]
    async fn test_outstanding_open_is_cancelled_not_stacked() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Long);
        let mut tracker = OrderTracker::new();
        tracker.replace(OrderCategory::OpenLong, vec!["old".to_string()]);

        step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(venue.calls(), vec!["cancel:old"]);
        assert_eq!(state.reopen_attempts, 1);
    }

    #[tokio::test]
    async fn test_reversal_closes_before_opening() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Short);
        state.long_open_pending = true;
        let mut tracker = OrderTracker::new();

        step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(venue.calls(), vec!["sell@100"]);
        assert_eq!(state.reopen_attempts, 0);
        assert!(tracker.is_outstanding(OrderCategory::CloseLong));
    }

    #[tokio::test]
    async fn test_close_short_at_ask() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Flat);
        state.short_open_pending = true;
        let mut tracker = OrderTracker::new();

        step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(venue.calls(), vec!["cover@101"]);
    }

    #[tokio::test]
    async fn test_cancel_sentinel_cancels_everything_then_finishes() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Cancel);
        state.current_signature = Some(3);
        let mut tracker = OrderTracker::new();
        tracker.replace(OrderCategory::OpenLong, vec!["a".to_string()]);
        tracker.replace(OrderCategory::CloseShort, vec!["d".to_string()]);

        let result = step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(result, CycleStep::Finished);
        assert_eq!(venue.calls(), vec!["cancel:a", "cancel:d"]);
        assert_eq!(state.target, Target::Cancel);
        assert_eq!(state.current_signature, Some(3));
    }

    #[tokio::test]
    async fn test_give_up_after_max_attempts() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Short);
        state.reopen_attempts = 3;
        state.current_signature = Some(4);
        let mut tracker = OrderTracker::new();
        tracker.replace(OrderCategory::OpenShort, vec!["s".to_string()]);
        tracker.replace(OrderCategory::CloseLong, vec!["c".to_string()]);

        let result = step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(result, CycleStep::Finished);
        assert!(venue.calls().is_empty());
        assert_eq!(state.target, Target::Flat);
        assert_eq!(state.current_signature, None);
        assert!(!tracker.is_outstanding(OrderCategory::OpenShort));
        assert!(tracker.is_outstanding(OrderCategory::CloseLong));
    }

    #[tokio::test]
    async fn test_resolved_when_already_at_target() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue::default();
        let mut state = quoted_state(Target::Long);
        state.long_open_pending = true;
        state.current_signature = Some(8);
        let mut tracker = OrderTracker::new();

        let result = step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(result, CycleStep::Finished);
        assert!(venue.calls().is_empty());
        // 롱 보유 중이므로 시그니처는 유지 (청산 체결 시 초기화)
        assert_eq!(state.current_signature, Some(8));
    }

    #[tokio::test]
    async fn test_failed_submission_tracks_nothing() {
        let config = ControllerConfig::new("T", dec!(1));
        let venue = RecordingVenue {
            fail_submit: true,
            ..Default::default()
        };
        let mut state = quoted_state(Target::Long);
        let mut tracker = OrderTracker::new();

        let result = step(&config, &mut state, &mut tracker, &venue).await;
        assert_eq!(result, CycleStep::Retry);
        assert!(tracker.is_empty());
        assert_eq!(state.reopen_attempts, 1);
    }
}
