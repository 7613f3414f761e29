use crate::{error::AnimationError, models::AnimationRequest, server::AppState};
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// `POST /api/animations`
pub async fn create_animation(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AnimationRequest>,
) -> Result<HttpResponse, AnimationError> {
    let request_id = Uuid::new_v4();

    let user = match &state.guard {
        Some(guard) => {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            Some(guard.authorize(authorization)?)
        }
        None => None,
    };
    log::info!(
        "[{}] POST /api/animations from {}",
        request_id,
        user.as_deref().unwrap_or("anonymous")
    );

    // Dropped with this future when the client goes away.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match state.pipeline.run(&body, cancel).await {
        Ok(response) => {
            log::info!(
                "[{}] Animation ready: {} frames, {}ms, provider {}",
                request_id,
                response.frame_count,
                response.duration_ms,
                response.provider
            );
            Ok(HttpResponse::Ok()
                .insert_header(("x-request-id", request_id.to_string()))
                .json(response))
        }
        Err(err) => {
            log::error!("[{}] Animation failed: {}", request_id, err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, TenancyConfig},
        error::Result,
        models::{GenerationParams, GenerationResult},
        pipeline::{seed::FixedSeedSource, AnimationPipeline},
        providers::{ImageProvider, ProviderChain},
        server::configure,
    };
    use actix_web::{test, App};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use image::{ImageFormat, Rgba, RgbaImage};
    use serde_json::Value;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    /// Returns a solid PNG whose color is derived from the seed.
    struct SolidProvider;

    #[async_trait]
    impl ImageProvider for SolidProvider {
        fn name(&self) -> &'static str {
            "solid"
        }

        async fn generate(&self, params: GenerationParams) -> Result<GenerationResult> {
            let shade = (params.seed % 256) as u8;
            let image = RgbaImage::from_pixel(8, 8, Rgba([shade, 64, 255 - shade, 255]));
            let mut png = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(AnimationError::from)?;
            Ok(GenerationResult {
                result_url: format!("data:image/png;base64,{}", STANDARD.encode(png)),
            })
        }
    }

    fn state(tenancy: TenancyConfig) -> AppState {
        let config = Config::default().with_tenancy(tenancy);
        let pipeline = AnimationPipeline::new(&config)
            .with_providers(ProviderChain::new().with_provider(|_| true, Arc::new(SolidProvider)))
            .with_seed_source(Arc::new(FixedSeedSource(7)));
        AppState::new(&config).with_pipeline(pipeline)
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let app = app!(state(TenancyConfig::default()));
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[actix_web::test]
    async fn test_create_animation() {
        let app = app!(state(TenancyConfig::default()));
        let req = test::TestRequest::post()
            .uri("/api/animations")
            .set_json(json!({
                "prompt": "green slime",
                "animationType": "bounce",
                "frameCount": 4,
                "fps": 8,
                "loop": "pingpong",
                "size": 48
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert!(resp.headers().contains_key("x-request-id"));

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["frameCount"], 6);
        assert_eq!(body["fps"], 8.0);
        assert_eq!(body["durationMs"], 750);
        assert_eq!(body["seed"], 7);
        assert_eq!(body["provider"], "solid");
        assert!(body["resultUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/gif;base64,R0lGODlh"));
    }

    #[actix_web::test]
    async fn test_blank_prompt_is_400() {
        let app = app!(state(TenancyConfig::default()));
        let req = test::TestRequest::post()
            .uri("/api/animations")
            .set_json(json!({ "prompt": "  " }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("prompt"));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let app = app!(state(TenancyConfig::default()));
        let req = test::TestRequest::post()
            .uri("/api/animations")
            .insert_header(("content-type", "application/json"))
            .set_payload("{ not json")
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_multi_tenant_session_and_rate_limit() {
        let tenancy = TenancyConfig::default()
            .with_session("alice", "secret")
            .with_rate_limit(1, Duration::from_secs(60));
        let app = app!(state(tenancy));

        let anonymous = test::TestRequest::post()
            .uri("/api/animations")
            .set_json(json!({ "prompt": "bat" }))
            .to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status().as_u16(), 401);

        let authed = || {
            test::TestRequest::post()
                .uri("/api/animations")
                .insert_header(("authorization", "Bearer secret"))
                .set_json(json!({ "prompt": "bat", "frameCount": 2, "size": 32 }))
                .to_request()
        };
        assert_eq!(test::call_service(&app, authed()).await.status().as_u16(), 200);

        let limited = test::call_service(&app, authed()).await;
        assert_eq!(limited.status().as_u16(), 429);
        assert!(limited.headers().contains_key("retry-after"));
    }

    #[actix_web::test]
    async fn test_guard_follows_tenancy() {
        assert!(state(TenancyConfig::default()).guard.is_none());
        assert!(state(TenancyConfig::default().with_session("a", "b")).guard.is_some());
    }
}
