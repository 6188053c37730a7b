//! 포지션 릴레이 제어 서버.
//!
//! 외부 시그널 소스가 HTTP로 목표 포지션을 지시하면 컨트롤러로 전달합니다.

pub mod config;
pub mod routes;

pub use config::ServerConfig;
pub use routes::{create_router, AppState, ControlQuery};
