//! 제어 채널 HTTP 엔드포인트.
//!
//! # 엔드포인트
//!
//! - `GET /control?flag=&sign=&key=&stamp=` - 제어 요청 (수락 여부와 무관하게 `ok`)
//! - `GET /shutdown` - 서버와 컨트롤러 종료
//! - `GET /state` - 현재 포지션 스냅샷 (JSON)

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use relay_core::ControlRequest;
use relay_execution::{ControllerHandle, PositionSnapshot};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 라우터 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 컨트롤러 핸들
    pub handle: ControllerHandle,
    /// 서버 종료 토큰
    pub shutdown: CancellationToken,
}

/// 제어 요청 쿼리. 누락된 값은 빈 문자열로 취급합니다.
#[derive(Debug, Default, Deserialize)]
pub struct ControlQuery {
    /// 출처 ID
    pub flag: Option<String>,
    /// 시그니처
    pub sign: Option<String>,
    /// 명령 코드
    pub key: Option<String>,
    /// 요청 시각
    pub stamp: Option<String>,
}

/// 제어 요청.
///
/// 잘못된 요청이나 거부된 요청도 항상 `ok`로 응답합니다.
async fn control(
    State(state): State<AppState>,
    Query(query): Query<ControlQuery>,
) -> &'static str {
    let parsed = ControlRequest::parse(
        query.flag.as_deref().unwrap_or_default(),
        query.sign.as_deref().unwrap_or_default(),
        query.key.as_deref().unwrap_or_default(),
        query.stamp.as_deref().unwrap_or_default(),
    );

    match parsed {
        Ok(request) => {
            if let Err(e) = state.handle.submit(request) {
                warn!(error = %e, "제어 요청 전달 실패");
            }
        }
        Err(e) => warn!(?query, error = %e, "잘못된 제어 요청 - 무시"),
    }
    "ok"
}

/// 종료 요청.
async fn shutdown(State(state): State<AppState>) -> &'static str {
    info!("종료 요청 수신");
    state.shutdown.cancel();
    "ok"
}

/// 현재 상태 조회.
async fn snapshot(State(state): State<AppState>) -> Json<PositionSnapshot> {
    Json(state.handle.snapshot())
}

/// 제어 채널 라우터 생성.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/control", get(control))
        .route("/shutdown", get(shutdown))
        .route("/state", get(snapshot))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
