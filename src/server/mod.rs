pub mod guard;
pub mod handlers;

use crate::{config::Config, error::AnimationError, pipeline::AnimationPipeline};
use actix_web::{
    error::InternalError, http::header, http::StatusCode, web, App, HttpResponse, HttpServer,
    ResponseError,
};
use guard::TenantGuard;
use serde_json::json;

pub const DEFAULT_PORT: u16 = 8080;

/// Request bodies are small JSON documents.
const JSON_BODY_LIMIT: usize = 64 * 1024;

/// Shared across all workers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnimationPipeline,
    pub guard: Option<TenantGuard>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            pipeline: AnimationPipeline::new(config),
            guard: TenantGuard::from_config(&config.tenancy),
        }
    }

    pub fn with_pipeline(mut self, pipeline: AnimationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_guard(mut self, guard: Option<TenantGuard>) -> Self {
        self.guard = guard;
        self
    }
}

impl ResponseError for AnimationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AnimationError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AnimationError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AnimationError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AnimationError::BudgetExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            AnimationError::ConfigError(_)
            | AnimationError::ProviderError(_)
            | AnimationError::FrameGenerationError(_)
            | AnimationError::EncodingError(_)
            | AnimationError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let AnimationError::RateLimited { retry_after_secs } = self {
            builder.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        builder.json(json!({ "error": self.to_string() }))
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            let body = json!({ "error": format!("Invalid request body: {}", err) });
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(handlers::health))
        .route("/api/animations", web::post().to(handlers::create_animation));
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let host = config.host.clone();
    let state = web::Data::new(AppState::new(&config));

    log::info!(
        "Providers in priority order: {}",
        state.pipeline.providers().names().join(" -> ")
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((host, port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AnimationError::ValidationError("x".into()), 400),
            (AnimationError::Unauthorized("x".into()), 401),
            (AnimationError::RateLimited { retry_after_secs: 3 }, 429),
            (AnimationError::FrameGenerationError("x".into()), 500),
            (AnimationError::EncodingError("x".into()), 500),
            (AnimationError::BudgetExceeded(Duration::from_secs(1)), 504),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{}", err);
        }
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = AnimationError::RateLimited { retry_after_secs: 17 }.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "17"
        );
    }
}
