//! HTTP adapter for the game server's JSON endpoints (reqwest).

use std::time::Duration;

use arena_domain::{GameStateSnapshot, RoundLog, SessionId};
use arena_shared::{routes, LifecycleStatusResponse, NotABaseUrl, SnapshotKind, StopGameResponse};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::ports::outbound::{ApiError, GameApiPort};

/// Default game server base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone)]
pub struct HttpGameApi {
    client: Client,
    base_url: Url,
}

impl HttpGameApi {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Result<Url, NotABaseUrl>,
    ) -> Result<T, ApiError> {
        let url = url.map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        decode(check_status(response, url.path())?).await
    }
}

fn check_status(response: Response, path: &str) -> Result<Response, ApiError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
        status if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        }),
        _ => Ok(response),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl GameApiPort for HttpGameApi {
    async fn round_logs(&self, session: &SessionId) -> Result<Vec<RoundLog>, ApiError> {
        self.get_json(routes::round_logs(&self.base_url, session))
            .await
    }

    async fn state_snapshot(
        &self,
        session: &SessionId,
        kind: SnapshotKind,
    ) -> Result<GameStateSnapshot, ApiError> {
        self.get_json(routes::state_snapshot(&self.base_url, session, kind))
            .await
    }

    async fn lifecycle_status(
        &self,
        session: &SessionId,
    ) -> Result<LifecycleStatusResponse, ApiError> {
        self.get_json(routes::game_status(&self.base_url, session))
            .await
    }

    async fn stop_game(&self, session: &SessionId) -> Result<StopGameResponse, ApiError> {
        let url = routes::stop_game(&self.base_url, session)
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        let path = url.path().to_string();
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        // Rejections still carry `{success: false, error}`; prefer that over the status.
        let status = response.status();
        if status.is_success() {
            return decode(response).await;
        }
        match response.json::<StopGameResponse>().await {
            Ok(body) => Ok(body),
            Err(_) if status == StatusCode::NOT_FOUND => Err(ApiError::NotFound(path)),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
                path,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn_game_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let router = Router::new()
            .route(
                "/logs/s1/game_logs.json",
                get(|| async {
                    Json(json!([
                        {"eliminate": {"result": {"remove": "Bob"}}},
                        {"debate": [["Alice", {"result": {"say": "hi"}}]]}
                    ]))
                }),
            )
            .route(
                "/logs/s1/game_partial.json",
                get(|| async { Json(json!({"players": {}, "rounds": [{"eliminated": "Bob"}]})) }),
            )
            .route(
                "/logs/broken/game_logs.json",
                get(|| async { "<html>oops</html>" }),
            )
            .route(
                "/game-status/{session}",
                get(|Path(session): Path<String>| async move {
                    Json(json!({"success": true, "status": session}))
                }),
            )
            .route(
                "/game-status/s1",
                get(|| async { Json(json!({"success": true, "status": "running"})) }),
            )
            .route(
                "/game-status/down",
                get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/stop-game/s1",
                post(|| async {
                    (
                        AxumStatus::BAD_REQUEST,
                        Json(json!({"success": false, "error": "game already finished"})),
                    )
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        (addr, handle)
    }

    fn session(raw: &str) -> SessionId {
        SessionId::new(raw).expect("valid session")
    }

    fn base(addr: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{addr}{path}")).expect("valid url")
    }

    #[tokio::test]
    async fn reads_logs_and_snapshots() {
        let (addr, server) = spawn_game_server().await;
        let api = HttpGameApi::new(base(addr, "/"), Duration::from_secs(5));

        let logs = api.round_logs(&session("s1")).await.expect("logs");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].debate.len(), 1);

        let snapshot = api
            .state_snapshot(&session("s1"), SnapshotKind::Partial)
            .await
            .expect("partial snapshot");
        assert_eq!(snapshot.rounds.len(), 1);

        let missing = api
            .state_snapshot(&session("s1"), SnapshotKind::Complete)
            .await;
        assert_eq!(
            missing,
            Err(ApiError::NotFound("/logs/s1/game_complete.json".into()))
        );

        server.abort();
    }

    #[tokio::test]
    async fn maps_failures_to_api_errors() {
        let (addr, server) = spawn_game_server().await;
        let api = HttpGameApi::new(base(addr, ""), Duration::from_secs(5));

        let broken = api.round_logs(&session("broken")).await;
        assert!(matches!(broken, Err(ApiError::InvalidResponse(_))));

        let down = api.lifecycle_status(&session("down")).await;
        assert!(matches!(down, Err(ApiError::Status { status: 500, .. })));

        let status = api.lifecycle_status(&session("s1")).await.expect("status");
        assert_eq!(status.status.as_deref(), Some("running"));

        let escaped = api
            .lifecycle_status(&session("a/b"))
            .await
            .expect("escaped session status");
        assert_eq!(escaped.status.as_deref(), Some("a/b"));

        let stop = api.stop_game(&session("s1")).await.expect("stop body");
        assert!(!stop.success);
        assert_eq!(stop.error.as_deref(), Some("game already finished"));

        server.abort();
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let api = HttpGameApi::new(base(addr, ""), Duration::from_secs(2));
        let result = api.round_logs(&session("s1")).await;
        assert!(matches!(result, Err(ApiError::RequestFailed(_))));
    }
}
