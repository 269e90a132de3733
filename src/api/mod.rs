//! API endpoints for the rate governance service.
//!
//! This module provides the HTTP surface the host application calls once
//! per inbound request, translating each `Decision` into conventional
//! rate-limit headers, plus small administrative endpoints for the
//! suspicion scorer.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::heuristics::looks_automated;
use crate::core::RateGovernor;
use crate::models::{Decision, PolicyCategory, RequestMetadata};

pub struct ApiState {
    pub governor: Arc<RateGovernor>,
}

/// API configuration function for Actix-web
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/health").route(web::get().to(health_check)))
            .service(web::resource("/evaluate").route(web::post().to(evaluate)))
            .service(
                web::resource("/suspicion/{identity}").route(web::get().to(suspicion_level)),
            )
            .service(
                web::resource("/suspicion/{identity}/reset")
                    .route(web::post().to(reset_suspicion)),
            ),
    );
}

/// Health check endpoint response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Evaluation request: the caller names the route category it is protecting
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub category: PolicyCategory,
}

/// Evaluation response
#[derive(Serialize)]
struct EvaluateResponse {
    #[serde(flatten)]
    decision: Decision,
    /// Advisory signal; never a deny reason on its own
    automated_hint: bool,
}

/// Suspicion level response
#[derive(Serialize)]
struct SuspicionResponse {
    identity: String,
    level: f64,
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Rate-governance evaluation endpoint
async fn evaluate(
    state: web::Data<ApiState>,
    req: HttpRequest,
    body: web::Json<EvaluateRequest>,
) -> impl Responder {
    let meta = request_metadata(&req);
    let decision = state.governor.evaluate(&meta, body.category).await;
    let automated_hint = looks_automated(&meta);

    let mut builder = if decision.allowed {
        HttpResponse::Ok()
    } else {
        HttpResponse::TooManyRequests()
    };

    builder
        .insert_header(("X-RateLimit-Limit", decision.limit.to_string()))
        .insert_header(("X-RateLimit-Remaining", decision.remaining.to_string()))
        .insert_header(("X-RateLimit-Reset", decision.reset_at.timestamp().to_string()));

    if let Some(retry_after) = decision.retry_after_seconds {
        builder.insert_header(("Retry-After", retry_after.to_string()));
    }

    builder.json(EvaluateResponse {
        decision,
        automated_hint,
    })
}

/// Suspicion observability endpoint
async fn suspicion_level(state: web::Data<ApiState>, path: web::Path<String>) -> impl Responder {
    let identity = path.into_inner();
    let level = state.governor.scorer().suspicion_level(&identity);
    HttpResponse::Ok().json(SuspicionResponse { identity, level })
}

/// Administrative override: clear an identity's score and counters
async fn reset_suspicion(state: web::Data<ApiState>, path: web::Path<String>) -> impl Responder {
    let identity = path.into_inner();
    state.governor.scorer().reset_suspicion(&identity);
    for category in PolicyCategory::ALL {
        state.governor.reset_counter(&identity, category).await;
    }
    HttpResponse::Ok().json(SuspicionResponse {
        identity,
        level: 0.0,
    })
}

fn request_metadata(req: &HttpRequest) -> RequestMetadata {
    RequestMetadata {
        forwarded_for: header_value(req, "X-Forwarded-For"),
        real_ip: header_value(req, "X-Real-IP"),
        client_ip: header_value(req, "X-Client-IP"),
        user_agent: header_value(req, "User-Agent"),
        accept: header_value(req, "Accept"),
        accept_language: header_value(req, "Accept-Language"),
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
