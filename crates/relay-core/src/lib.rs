//! 포지션 릴레이 도메인 타입.
//!
//! 이 crate는 다음을 제공합니다:
//! - 목표 포지션, 지시(Directive), 명령 코드 등 제어 채널 타입
//! - 거래소 체결/주문 상태 통지 타입
//! - 심볼별 시그니처 영속화 (`SignatureStore`)
//! - 공통 에러 타입 (`RelayError`)
//!
//! # 예제
//!
//! ```rust,ignore
//! use relay_core::{CommandCode, ControlRequest, JsonFileSignatureStore, SignatureStore};
//!
//! let request = ControlRequest::parse("1", "5", "1", "1718000000")?;
//! assert_eq!(request.command, Some(CommandCode::OpenLong));
//!
//! let store = JsonFileSignatureStore::new("relay_signatures.json");
//! store.save("rb2410.SHFE", 5).await?;
//! ```

pub mod directive;
pub mod error;
pub mod persistence;
pub mod types;

// 주요 타입 재내보내기
pub use directive::{CommandCode, ControlRequest, Directive};
pub use error::{RelayError, Result};
pub use persistence::{
    signature_from_raw, signature_to_raw, JsonFileSignatureStore, MemorySignatureStore,
    SignatureStore, NO_SIGNATURE,
};
pub use types::{
    Bar, Direction, Offset, OrderCategory, OrderEvent, OrderId, OrderStatus, Quote, Target,
    TradeEvent, VenueEvent,
};
