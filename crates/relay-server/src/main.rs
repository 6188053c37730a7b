//! 포지션 릴레이 서버.
//!
//! Paper 거래소에 연결된 포지션 릴레이를 시작하고, HTTP 제어 채널을 엽니다.
//! `/shutdown` 요청이나 Ctrl+C/SIGTERM을 받으면 서버와 컨트롤러를 함께 종료합니다.

use std::sync::Arc;

use relay_core::{JsonFileSignatureStore, VenueEvent};
use relay_execution::{ControllerHandle, LifecycleHooks, PaperExecutionProvider, PositionRelay};
use relay_server::{create_router, AppState, ServerConfig};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "relay_server=info,relay_execution=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = config.socket_addr()?;
    let shutdown_token = CancellationToken::new();

    // Paper 거래소 체결 통지 → 릴레이
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let provider = Arc::new(PaperExecutionProvider::new(events_tx));
    let store = Arc::new(JsonFileSignatureStore::new(&config.signature_store));
    info!(path = %store.path().display(), "시그니처 저장소");

    let mut relay = PositionRelay::new(
        config.controller.clone(),
        provider,
        store,
        shutdown_token.clone(),
    );
    relay.on_init().await?;
    let handle = relay.on_start().await?;

    if let Some(quote) = config.initial_quote() {
        relay.on_tick(quote)?;
    }

    let pump = spawn_event_pump(events_rx, handle.clone(), shutdown_token.clone());

    let app = create_router(AppState {
        handle,
        shutdown: shutdown_token.clone(),
    });

    info!(%addr, symbol = %config.controller.symbol, "릴레이 서버 시작");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("서버 종료 - 정리 작업 시작");
    relay.on_stop().await?;
    if let Err(e) = pump.await {
        warn!(error = %e, "이벤트 펌프 비정상 종료");
    }

    info!("릴레이 서버 종료 완료");
    Ok(())
}

/// 거래소 통지를 컨트롤러로 전달하는 태스크.
fn spawn_event_pump(
    mut events_rx: mpsc::UnboundedReceiver<VenueEvent>,
    handle: ControllerHandle,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => break,

                event = events_rx.recv() => match event {
                    Some(event) => {
                        if let Err(e) = handle.forward(event) {
                            debug!(error = %e, "컨트롤러 종료됨 - 통지 폐기");
                        }
                    }
                    None => break,
                },
            }
        }
    })
}

/// 종료 시그널 대기.
///
/// `/shutdown` 요청, Ctrl+C 또는 SIGTERM 중 먼저 도착한 것을 기다린 뒤
/// 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = shutdown_token.cancelled() => {
            info!("종료 요청으로 서버 종료");
        }
        _ = ctrl_c => {
            warn!("Ctrl+C 수신 - 서버 종료");
        }
        _ = terminate => {
            warn!("SIGTERM 수신 - 서버 종료");
        }
    }

    shutdown_token.cancel();
}
