//! 환경변수 기반 서버 설정.

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use relay_core::{Quote, RelayError, Result};
use relay_execution::{ControllerConfig, DEFAULT_MAX_REOPEN_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS};
use rust_decimal::Decimal;

/// 서버 설정.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// 시그니처 저장 파일 경로
    pub signature_store: PathBuf,
    /// Paper 거래소 시작 매수 1호가
    pub initial_bid: Decimal,
    /// Paper 거래소 시작 매도 1호가
    pub initial_ask: Decimal,
    /// 컨트롤러 설정
    pub controller: ControllerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    /// 환경변수에서 설정 로드.
    ///
    /// | 변수 | 기본값 |
    /// |---|---|
    /// | `RELAY_HOST` | `0.0.0.0` |
    /// | `RELAY_PORT` | `8123` |
    /// | `RELAY_STRATEGY` | `position_relay` |
    /// | `RELAY_SYMBOL` | `default.SIM` |
    /// | `RELAY_ORDER_QUANTITY` | `1` |
    /// | `RELAY_POLL_INTERVAL_MS` | `500` |
    /// | `RELAY_MAX_REOPEN_ATTEMPTS` | `3` |
    /// | `RELAY_SIGNATURE_STORE` | `relay_signatures.json` |
    /// | `RELAY_INITIAL_POSITION` | `0` |
    /// | `RELAY_INITIAL_BID`, `RELAY_INITIAL_ASK` | `0` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 구성. 파싱에 실패한 값은 기본값을 사용합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let symbol = lookup("RELAY_SYMBOL").unwrap_or_else(|| "default.SIM".to_string());
        let quantity = env_var_parse(&lookup, "RELAY_ORDER_QUANTITY", Decimal::ONE);

        let mut controller = ControllerConfig::new(symbol, quantity)
            .with_strategy_name(
                lookup("RELAY_STRATEGY").unwrap_or_else(|| "position_relay".to_string()),
            )
            .with_poll_interval_ms(env_var_parse(
                &lookup,
                "RELAY_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            ))
            .with_initial_position(env_var_parse(&lookup, "RELAY_INITIAL_POSITION", 0));
        controller.max_reopen_attempts = env_var_parse(
            &lookup,
            "RELAY_MAX_REOPEN_ATTEMPTS",
            DEFAULT_MAX_REOPEN_ATTEMPTS,
        );

        Self {
            host: lookup("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_var_parse(&lookup, "RELAY_PORT", 8123),
            signature_store: lookup("RELAY_SIGNATURE_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("relay_signatures.json")),
            initial_bid: env_var_parse(&lookup, "RELAY_INITIAL_BID", Decimal::ZERO),
            initial_ask: env_var_parse(&lookup, "RELAY_INITIAL_ASK", Decimal::ZERO),
            controller,
        }
    }

    /// 소켓 주소 반환.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| RelayError::Config(format!("잘못된 바인딩 주소 {}: {}", self.host, e)))
    }

    /// 설정된 시작 호가. 둘 다 0이면 `None`.
    pub fn initial_quote(&self) -> Option<Quote> {
        if self.initial_bid.is_zero() && self.initial_ask.is_zero() {
            None
        } else {
            Some(Quote::new(self.initial_bid, self.initial_ask))
        }
    }
}

/// 조회한 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
