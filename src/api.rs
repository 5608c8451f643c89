use actix_web::{error, web, HttpRequest, HttpResponse};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AdminSession, LoginRequest, SessionGuard};
use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::models::feedback::{SubmissionRequest, UpdateFeedbackRequest};
use crate::models::pagination::{PageRequest, RatingFilter};
use crate::services::{listing, moderation, submission};

/// Paging settings handed to the public listing.
#[derive(Debug, Clone, Copy)]
pub struct ListingLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl From<&Config> for ListingLimits {
    fn from(config: &Config) -> Self {
        ListingLimits {
            default_limit: config.public_page_size,
            max_limit: config.max_page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PublicListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub rating: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<String>,
}

/// Shared handles every worker gets. Built once, cloned into each `App`.
#[derive(Clone)]
pub struct AppState {
    pub db: web::Data<Database>,
    pub guard: web::Data<SessionGuard>,
    pub limits: web::Data<ListingLimits>,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        AppState {
            db: web::Data::new(db),
            guard: web::Data::new(SessionGuard::new(config)),
            limits: web::Data::new(ListingLimits::from(config)),
        }
    }

    /// Register app data, every route, and the JSON error handlers for
    /// malformed input. Shared by `main` and the integration tests.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.db.clone())
            .app_data(self.guard.clone())
            .app_data(self.limits.clone());
        routes(cfg);
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/feedback")
                .route("", web::post().to(submit_feedback))
                .route("", web::get().to(get_feedback_detail))
                // Must stay ahead of the "/{feedback_id}" routes
                .route("/public", web::get().to(list_public_feedback))
                .route("/{feedback_id}", web::get().to(get_public_feedback))
                .route("/{feedback_id}/like", web::post().to(like_feedback))
                .route("/{feedback_id}/dislike", web::post().to(dislike_feedback)),
        )
        .service(
            web::scope("/admin")
                .route("/login", web::post().to(login))
                .route("/login", web::delete().to(logout))
                .route("/session", web::get().to(session_status))
                .route("/feedback", web::get().to(admin_list_feedback))
                .route("/feedback/counts", web::get().to(admin_status_counts))
                .route("/feedback/{id}", web::patch().to(admin_update_feedback)),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, req| {
            debug!("[API] Bad JSON body on {}: {}", req.path(), err);
            error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(json!({ "error": "Invalid JSON body" })),
            )
            .into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        debug!("[API] Bad query string on {}: {}", req.path(), err);
        AppError::bad_request(format!("Invalid query parameters: {err}")).into()
    })
}

pub async fn submit_feedback(
    db: web::Data<Database>,
    body: web::Json<SubmissionRequest>,
) -> Result<HttpResponse, AppError> {
    let receipt = submission::submit(&db, &body).await?;
    Ok(HttpResponse::Created().json(receipt))
}

pub async fn get_feedback_detail(
    db: web::Data<Database>,
    query: web::Query<DetailQuery>,
) -> Result<HttpResponse, AppError> {
    let feedback_id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("Feedback ID is required"))?;
    let detail = listing::get_detail(&db, feedback_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn list_public_feedback(
    db: web::Data<Database>,
    limits: web::Data<ListingLimits>,
    query: web::Query<PublicListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::from_query(
        query.page,
        query.limit,
        limits.default_limit,
        limits.max_limit,
    )?;
    let rating = RatingFilter::parse(query.rating.as_deref())?;
    let page = listing::list_public(&db, page, rating).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_public_feedback(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let feedback = listing::get_public(&db, &path).await?;
    Ok(HttpResponse::Ok().json(feedback))
}

pub async fn like_feedback(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let votes = listing::like(&db, &path).await?;
    Ok(HttpResponse::Ok().json(votes))
}

pub async fn dislike_feedback(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let votes = listing::dislike(&db, &path).await?;
    Ok(HttpResponse::Ok().json(votes))
}

pub async fn login(
    guard: web::Data<SessionGuard>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let cookie = guard.login(&body)?;
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "success": true })))
}

pub async fn logout(guard: web::Data<SessionGuard>, req: HttpRequest) -> HttpResponse {
    info!("[AUTH] Logout from {}", req.peer_addr().map(|a| a.to_string()).unwrap_or_default());
    HttpResponse::Ok()
        .cookie(guard.logout_cookie())
        .json(json!({ "success": true }))
}

pub async fn session_status(session: AdminSession) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "authenticated": session.authorized }))
}

pub async fn admin_list_feedback(
    db: web::Data<Database>,
    session: AdminSession,
    query: web::Query<AdminListQuery>,
) -> Result<HttpResponse, AppError> {
    if !session.authorized {
        return Err(AppError::Unauthorized);
    }
    let status = moderation::parse_status_filter(query.status.as_deref())?;
    let records = moderation::list_all(&db, session.authorized, status).await?;
    Ok(HttpResponse::Ok().json(records))
}

pub async fn admin_status_counts(
    db: web::Data<Database>,
    session: AdminSession,
) -> Result<HttpResponse, AppError> {
    let counts = moderation::status_counts(&db, session.authorized).await?;
    Ok(HttpResponse::Ok().json(counts))
}

// The body is optional at the extractor level so an unauthenticated caller
// gets 401 even when the body is malformed.
pub async fn admin_update_feedback(
    db: web::Data<Database>,
    session: AdminSession,
    path: web::Path<String>,
    body: Option<web::Json<UpdateFeedbackRequest>>,
) -> Result<HttpResponse, AppError> {
    let updated = moderation::update_status_and_response(
        &db,
        session.authorized,
        &path,
        body.map(web::Json::into_inner),
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}
