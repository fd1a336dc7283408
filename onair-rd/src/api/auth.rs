//! Admin authentication
//!
//! Admin routes require `Authorization: Bearer <token>`, matched against the
//! token generated into the settings table on first start. Implemented as a
//! custom extractor rather than a middleware layer so public and admin
//! method handlers can share a route path.

use crate::api::server::AppContext;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    error: String,
}

/// Extractor that rejects the request unless a valid admin bearer token is
/// present. Admin handlers take this as their first argument.
#[derive(Debug)]
pub struct RequireAdmin;

#[async_trait]
impl FromRequestParts<AppContext> for RequireAdmin {
    type Rejection = (StatusCode, Json<AuthErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match provided {
            Some(token) if token == ctx.admin_token.as_str() => Ok(RequireAdmin),
            Some(_) => {
                warn!("Admin request with invalid token rejected");
                Err(unauthorized("invalid admin token"))
            }
            None => Err(unauthorized("missing bearer token")),
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<AuthErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorResponse {
            error: message.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::initialize_database;
    use crate::playback::sink::{self, SinkHandle};
    use crate::presence::PresenceCounter;
    use crate::repo::ScheduleRepository;
    use crate::state::SharedState;
    use axum::http::Request;
    use onair_common::events::EventBus;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    async fn ctx_with_token(token: &str) -> AppContext {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let bus = Arc::new(EventBus::new(16));
        let (sink, _cmd_rx) = SinkHandle::channel();
        let (sink_events, _event_rx) = sink::event_channel();

        AppContext {
            state: Arc::new(SharedState::default()),
            repo: Arc::new(ScheduleRepository::new(pool.clone()).await.unwrap()),
            bus: Arc::clone(&bus),
            sink,
            sink_events,
            presence: Arc::new(PresenceCounter::new(bus)),
            db_pool: pool,
            admin_token: token.to_string(),
        }
    }

    async fn extract(ctx: &AppContext, auth_header: Option<&str>) -> Result<RequireAdmin, StatusCode> {
        let mut builder = Request::builder().uri("/schedule");
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();

        RequireAdmin::from_request_parts(&mut parts, ctx)
            .await
            .map_err(|(status, _)| status)
    }

    #[tokio::test]
    async fn test_valid_token_accepted() {
        let ctx = ctx_with_token("secret").await;
        assert!(extract(&ctx, Some("Bearer secret")).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_token_rejected() {
        let ctx = ctx_with_token("secret").await;
        assert_eq!(
            extract(&ctx, Some("Bearer nope")).await.unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let ctx = ctx_with_token("secret").await;
        assert_eq!(
            extract(&ctx, None).await.unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
        // A non-bearer scheme is treated as missing
        assert_eq!(
            extract(&ctx, Some("Basic secret")).await.unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }
}
