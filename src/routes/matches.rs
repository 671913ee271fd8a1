use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{ErrorResponse, HealthResponse, NormalizeRequest, NormalizeResponse, RankRequest, RankResponse, ScoreRequest, SlotMatchesQuery};
use crate::services::{SupabaseClient, SupabaseError};
use crate::core::Matcher;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: Matcher,
    pub supabase: Option<Arc<SupabaseClient>>,
    pub default_limit: u16,
    pub max_limit: u16,
}

impl AppState {
    fn effective_limit(&self, requested: Option<u16>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit) as usize
    }
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/match/weights", web::get().to(get_weights))
        .route("/match/score", web::post().to(score_match))
        .route("/match/rank", web::post().to(rank_matches))
        .route("/normalize", web::post().to(normalize))
        .route("/slots/{slot_id}/matches", web::get().to(slot_matches));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn upstream_error(context: &str, err: SupabaseError) -> HttpResponse {
    match err {
        SupabaseError::NotFound(message) => HttpResponse::NotFound().json(ErrorResponse {
            error: context.to_string(),
            message,
            status_code: 404,
        }),
        other => {
            tracing::error!("{}: {}", context, other);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: context.to_string(),
                message: other.to_string(),
                status_code: 502,
            })
        }
    }
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (status, data_source) = match &state.supabase {
        Some(client) => {
            let healthy = client.health_check().await.unwrap_or(false);
            (if healthy { "healthy" } else { "degraded" }, "supabase")
        }
        None => ("healthy", "none"),
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_source: data_source.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Active weight table
///
/// GET /api/v1/match/weights
async fn get_weights(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.matcher.weights())
}

/// Score one patient against one provider
///
/// POST /api/v1/match/score
///
/// Request body:
/// ```json
/// {
///   "patient": { "id": "p1", "diagnosis": ["anxious"], "insuranceProvider": "BCBS", "handRaised": true },
///   "provider": { "id": "dr1", "specialties": ["Anxiety"], "insuranceAccepted": ["Aetna"] }
/// }
/// ```
async fn score_match(
    state: web::Data<AppState>,
    req: web::Json<ScoreRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let result = state.matcher.score(&req.patient, &req.provider);

    tracing::debug!(
        "Scored patient {} against provider {}: {} (raw {})",
        req.patient.id,
        req.provider.id,
        result.score,
        result.raw_score
    );

    HttpResponse::Ok().json(result)
}

/// Rank supplied waitlist candidates for a provider
///
/// POST /api/v1/match/rank
///
/// Request body:
/// ```json
/// {
///   "provider": { "id": "dr1", "specialties": ["Anxiety"] },
///   "patients": [ { "id": "p1", "diagnosis": ["panic"] } ],
///   "limit": 10
/// }
/// ```
async fn rank_matches(
    state: web::Data<AppState>,
    req: web::Json<RankRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let limit = state.effective_limit(req.limit);
    let ranked = state.matcher.rank(&req.provider, &req.patients, Some(limit));

    tracing::info!(
        "Ranked {} matches for provider {} (from {} candidates)",
        ranked.len(),
        req.provider.id,
        ranked.total_candidates()
    );

    HttpResponse::Ok().json(RankResponse {
        provider_id: req.provider.id.clone(),
        total_candidates: ranked.total_candidates(),
        matches: ranked.into_vec(),
    })
}

/// Normalize free-text diagnosis and insurance values
///
/// POST /api/v1/normalize
async fn normalize(
    state: web::Data<AppState>,
    req: web::Json<NormalizeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let taxonomy = state.matcher.taxonomy();
    HttpResponse::Ok().json(NormalizeResponse {
        diagnosis: req.diagnosis.as_deref().map(|raw| taxonomy.normalize_diagnosis(raw)),
        insurance: req.insurance.as_deref().map(|raw| taxonomy.normalize_insurance(raw)),
    })
}

/// Rank the active waitlist for a stored slot
///
/// GET /api/v1/slots/{slot_id}/matches?limit={limit}
async fn slot_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SlotMatchesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let client = match &state.supabase {
        Some(client) => client,
        None => {
            return HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Data source not configured".to_string(),
                message: "Set the supabase section to rank stored slots".to_string(),
                status_code: 503,
            });
        }
    };

    let slot_id = path.into_inner();

    let provider = match client.get_slot_provider(&slot_id).await {
        Ok(provider) => provider,
        Err(e) => return upstream_error("Failed to fetch slot", e),
    };

    let patients = match client.list_active_waitlist().await {
        Ok(patients) => patients,
        Err(e) => return upstream_error("Failed to fetch waitlist", e),
    };

    let limit = state.effective_limit(query.limit);
    let ranked = state.matcher.rank(&provider, &patients, Some(limit));

    tracing::info!(
        "Returning {} matches for slot {} (provider {}, {} waitlisted)",
        ranked.len(),
        slot_id,
        provider.id,
        ranked.total_candidates()
    );

    HttpResponse::Ok().json(RankResponse {
        provider_id: provider.id,
        total_candidates: ranked.total_candidates(),
        matches: ranked.into_vec(),
    })
}
