//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    domain::StoreError,
    infrastructure::dto::http::{
        AdminRequestDto, CanvasDto, DrawRequestDto, ErrorDto, GameStateDto, PixelDto,
        SnapshotDto, SnapshotListDto, SnapshotListQuery, SnapshotQueuedDto, StatusMessageDto,
    },
    ui::state::AppState,
    usecase::{
        AuthError, Credentials, DrawCommand, DrawRejection, SessionGateError, SnapshotError,
        SubmitError,
    },
};
use pixelwar_shared::time::to_rfc3339_millis;

/// Header carrying the shared secret of trusted internal callers
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Error response: a status code and a JSON `{"error": ...}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unavailable(e: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", e);
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service temporarily unavailable")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorDto { error: self.message })).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Rejected(DrawRejection::InvalidInput(reason)) => {
                Self::new(StatusCode::BAD_REQUEST, reason)
            }
            SubmitError::Rejected(rejection @ DrawRejection::SessionNotRunning(_)) => {
                Self::new(StatusCode::FORBIDDEN, rejection.to_string())
            }
            SubmitError::Rejected(DrawRejection::RateLimited) => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded, try again later",
            ),
            SubmitError::Storage(e) => Self::unavailable(e),
            SubmitError::Queue(e) => Self::unavailable(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => Self::new(StatusCode::UNAUTHORIZED, e.to_string()),
            AuthError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            AuthError::Storage(e) => Self::unavailable(e),
        }
    }
}

impl From<SessionGateError> for ApiError {
    fn from(e: SessionGateError) -> Self {
        match e {
            SessionGateError::InvalidTransition { .. } => {
                Self::new(StatusCode::CONFLICT, e.to_string())
            }
            SessionGateError::Storage(e) => Self::unavailable(e),
            SessionGateError::Transport(e) => Self::unavailable(e),
        }
    }
}

impl From<SnapshotError> for ApiError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Encode(e) => {
                tracing::error!("Snapshot encoding failed: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            SnapshotError::Storage(e) => Self::unavailable(e),
            SnapshotError::Transport(e) => Self::unavailable(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::unavailable(e)
    }
}

/// Extract credentials from `Authorization: Bearer <sessionId>` and the internal secret header
fn credentials_from(
    headers: &HeaderMap,
    acting_user_id: Option<String>,
    acting_username: Option<String>,
) -> Credentials {
    let session_id = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    let internal_secret = headers
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    Credentials {
        session_id,
        internal_secret,
        acting_user_id,
        acting_username,
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `POST /api/draw`: validate, rate-limit and queue a pixel write
pub async fn draw_pixel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DrawRequestDto>,
) -> Result<(StatusCode, Json<StatusMessageDto>), ApiError> {
    let credentials = credentials_from(&headers, request.user_id, request.username);
    let identity = state
        .authorize_usecase
        .identify_or_anonymous(&credentials)
        .await?;

    let command = DrawCommand {
        x: request.x,
        y: request.y,
        color: request.color,
        identity,
    };
    state.submit_pixel_usecase.execute(command).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusMessageDto {
            message: "Pixel queued".to_string(),
            status: "queued".to_string(),
        }),
    ))
}

/// `GET /api/canvas`: every stored pixel
pub async fn get_canvas(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CanvasDto>, ApiError> {
    let pixels = state.get_canvas_usecase.execute().await?;

    // Domain Model から DTO への変換
    Ok(Json(CanvasDto {
        canvas_id: state.get_canvas_usecase.canvas_id().to_string(),
        width: state.board.width,
        height: state.board.height,
        pixels: pixels.into_iter().map(PixelDto::from).collect(),
    }))
}

/// `GET /api/state`: session status, pixel count, live connections and last snapshot time
pub async fn get_game_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameStateDto>, ApiError> {
    let game_state = state.get_game_state_usecase.execute().await?;

    Ok(Json(GameStateDto {
        canvas_id: game_state.session.canvas_id.into_string(),
        status: game_state.session.status.to_string(),
        pixel_count: game_state.session.pixel_count,
        active_connections: game_state.active_connections,
        last_snapshot_at: game_state.last_snapshot_at.map(to_rfc3339_millis),
    }))
}

/// `GET /api/snapshots?limit=N`: newest snapshots first
pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SnapshotListQuery>,
) -> Result<Json<SnapshotListDto>, ApiError> {
    let records = state.list_snapshots_usecase.execute(query.limit).await?;

    Ok(Json(SnapshotListDto {
        snapshots: records.into_iter().map(SnapshotDto::from).collect(),
    }))
}

/// `POST /api/admin/pause`
pub async fn admin_pause(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<AdminRequestDto>>,
) -> Result<Json<StatusMessageDto>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let admin = state
        .authorize_usecase
        .authorize_admin(&credentials_from(&headers, request.user_id, None))
        .await?;

    let session = state
        .session_gate_usecase
        .pause(admin.user_id.as_str())
        .await?;

    Ok(Json(StatusMessageDto {
        message: "Game paused".to_string(),
        status: session.status.to_string(),
    }))
}

/// `POST /api/admin/resume`
pub async fn admin_resume(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<AdminRequestDto>>,
) -> Result<Json<StatusMessageDto>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let admin = state
        .authorize_usecase
        .authorize_admin(&credentials_from(&headers, request.user_id, None))
        .await?;

    let session = state
        .session_gate_usecase
        .resume(admin.user_id.as_str())
        .await?;

    Ok(Json(StatusMessageDto {
        message: "Game resumed".to_string(),
        status: session.status.to_string(),
    }))
}

/// `POST /api/admin/snapshot`: queue a snapshot render
pub async fn admin_snapshot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<AdminRequestDto>>,
) -> Result<(StatusCode, Json<SnapshotQueuedDto>), ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let admin = state
        .authorize_usecase
        .authorize_admin(&credentials_from(&headers, request.user_id, None))
        .await?;

    let request_id = state
        .request_snapshot_usecase
        .execute(admin.user_id.as_str(), request.callback_url)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SnapshotQueuedDto {
            message: "Snapshot generation queued".to_string(),
            status: "pending".to_string(),
            request_id: request_id.to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionStatus;
    use axum::http::HeaderValue;

    #[test]
    fn test_credentials_from_bearer_and_secret() {
        // テスト項目: Authorization ヘッダと内部シークレットヘッダから認証情報を取り出す
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s-123"));
        headers.insert(INTERNAL_SECRET_HEADER, HeaderValue::from_static("secret"));

        // when (操作):
        let credentials = credentials_from(&headers, Some("u1".to_string()), None);

        // then (期待する結果):
        assert_eq!(credentials.session_id.as_deref(), Some("s-123"));
        assert_eq!(credentials.internal_secret.as_deref(), Some("secret"));
        assert_eq!(credentials.acting_user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_non_bearer_authorization_is_ignored() {
        // テスト項目: Bearer 以外の Authorization ヘッダは無視される
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        // when (操作):
        let credentials = credentials_from(&headers, None, None);

        // then (期待する結果):
        assert_eq!(credentials, Credentials::default());
    }

    #[test]
    fn test_draw_rejections_map_to_status_codes() {
        // テスト項目: 描画の拒否理由が 400 / 403 / 429 に対応する
        // given (前提条件):
        let cases = [
            (
                SubmitError::Rejected(DrawRejection::InvalidInput("bad".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                SubmitError::Rejected(DrawRejection::SessionNotRunning(SessionStatus::Paused)),
                StatusCode::FORBIDDEN,
            ),
            (
                SubmitError::Rejected(DrawRejection::RateLimited),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                SubmitError::Storage(StoreError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected) in cases {
            // when (操作):
            let response = ApiError::from(error).into_response();

            // then (期待する結果):
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_admin_errors_map_to_status_codes() {
        // テスト項目: 認可・状態遷移のエラーが 401 / 403 / 409 に対応する
        // given (前提条件):
        let unauthenticated = ApiError::from(AuthError::Unauthenticated);
        let forbidden = ApiError::from(AuthError::Forbidden("u1".to_string()));
        let conflict = ApiError::from(SessionGateError::InvalidTransition {
            action: "pause",
            current: SessionStatus::Stopped,
        });

        // when (操作):
        let statuses = [
            unauthenticated.into_response().status(),
            forbidden.into_response().status(),
            conflict.into_response().status(),
        ];

        // then (期待する結果):
        assert_eq!(
            statuses,
            [
                StatusCode::UNAUTHORIZED,
                StatusCode::FORBIDDEN,
                StatusCode::CONFLICT
            ]
        );
    }
}
