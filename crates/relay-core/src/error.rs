//! 에러 타입 정의.

use thiserror::Error;

/// 릴레이 공통 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// 시그니처 저장소 접근 실패 (I/O, 파싱)
    #[error("시그니처 저장소 사용 불가 [{symbol}]: {reason}")]
    PersistenceUnavailable { symbol: String, reason: String },

    /// 잘못된 제어 요청
    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),

    /// 컨트롤러가 실행 중이 아님
    #[error("컨트롤러가 실행 중이 아닙니다")]
    NotRunning,

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

impl RelayError {
    /// 저장소 에러 생성 헬퍼.
    pub fn persistence(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::PersistenceUnavailable {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, RelayError>;
