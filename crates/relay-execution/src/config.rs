//! 컨트롤러 설정.

use std::time::Duration;

use relay_core::{RelayError, Result, Target};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 기본 평가 주기 (밀리초)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// 평가 주기 상한 (밀리초, 1시간)
pub const MAX_POLL_INTERVAL_MS: u64 = 3_600_000;

/// 기본 재진입 시도 한도
pub const DEFAULT_MAX_REOPEN_ATTEMPTS: u32 = 3;

/// 포지션 컨트롤러 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// 전략 이름 (로그용)
    pub strategy_name: String,
    /// 거래 심볼 (시그니처 저장 키)
    pub symbol: String,
    /// 주문 수량
    pub order_quantity: Decimal,
    /// 평가 주기 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 신규 진입 재시도 한도
    #[serde(default = "default_max_reopen_attempts")]
    pub max_reopen_attempts: u32,
    /// 시작 시 목표 (`Flat`이면 `initial_position`으로 결정)
    #[serde(default = "default_initial_target")]
    pub initial_target: Target,
    /// 시작 시 거래소가 보고한 순포지션
    #[serde(default)]
    pub initial_position: i64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_reopen_attempts() -> u32 {
    DEFAULT_MAX_REOPEN_ATTEMPTS
}

fn default_initial_target() -> Target {
    Target::Flat
}

impl ControllerConfig {
    /// 심볼과 수량으로 설정 생성 (나머지는 기본값).
    pub fn new(symbol: impl Into<String>, order_quantity: Decimal) -> Self {
        Self {
            strategy_name: "position_relay".to_string(),
            symbol: symbol.into(),
            order_quantity,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_reopen_attempts: DEFAULT_MAX_REOPEN_ATTEMPTS,
            initial_target: Target::Flat,
            initial_position: 0,
        }
    }

    /// 평가 주기 설정.
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// 시작 순포지션 설정.
    pub fn with_initial_position(mut self, position: i64) -> Self {
        self.initial_position = position;
        self
    }

    /// 전략 이름 설정.
    pub fn with_strategy_name(mut self, name: impl Into<String>) -> Self {
        self.strategy_name = name.into();
        self
    }

    /// 평가 주기를 Duration으로 반환 (`MAX_POLL_INTERVAL_MS`로 제한)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.min(MAX_POLL_INTERVAL_MS))
    }

    /// 설정 검증.
    ///
    /// # Errors
    ///
    /// 심볼이 비었거나 수량/주기가 0 이하이거나 주기가 상한을 넘으면
    /// `RelayError::Config`를 반환합니다.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(RelayError::Config("심볼이 비어 있습니다".to_string()));
        }
        if self.order_quantity <= Decimal::ZERO {
            return Err(RelayError::Config(format!(
                "주문 수량은 0보다 커야 합니다: {}",
                self.order_quantity
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(RelayError::Config("평가 주기는 0보다 커야 합니다".to_string()));
        }
        if self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(RelayError::Config(format!(
                "평가 주기는 {}ms 이하여야 합니다: {}",
                MAX_POLL_INTERVAL_MS, self.poll_interval_ms
            )));
        }
        if self.initial_target == Target::Cancel {
            return Err(RelayError::Config(
                "시작 목표로 취소 센티널을 사용할 수 없습니다".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ControllerConfig::new("rb2410.SHFE", dec!(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.max_reopen_attempts, 3);
        assert_eq!(config.initial_target, Target::Flat);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ControllerConfig::new("", dec!(1));
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));

        let config = ControllerConfig::new("rb2410.SHFE", dec!(0));
        assert!(config.validate().is_err());

        let config = ControllerConfig::new("rb2410.SHFE", dec!(1)).with_poll_interval_ms(0);
        assert!(config.validate().is_err());

        let config =
            ControllerConfig::new("rb2410.SHFE", dec!(1)).with_poll_interval_ms(u64::MAX);
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(MAX_POLL_INTERVAL_MS)
        );

        let config = ControllerConfig::new("rb2410.SHFE", dec!(1))
            .with_poll_interval_ms(MAX_POLL_INTERVAL_MS);
        assert!(config.validate().is_ok());
    }
}
