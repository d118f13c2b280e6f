//! Axum routes for the excuse service.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, ManualExcuse};
use crate::composer::{ComposeError, GenerationMode};
use crate::content::{ContentError, FragmentFilter, LawFilter, MemeFilter};
use crate::role::{resolve_role, Role};
use crate::store::ExcuseStore;
use crate::types::{
    ExcuseId, ExcuseType, Fragment, FragmentId, FragmentKind, FragmentPatch, Law, LawId, LawPatch,
    Meme, MemeId, MemePatch, NewFragment, NewLaw, NewMeme, ResolvedExcuse,
};

use super::middleware::record_excuse_metric;
use super::state::ServiceState;

type SharedState<S> = State<Arc<ServiceState<S>>>;
type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A generated or stored excuse with its resolved parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcuseResponse {
    /// Excuse id.
    pub id: ExcuseId,
    /// Context fragment, if it still exists.
    pub context: Option<Fragment>,
    /// Cause fragment, if it still exists.
    pub cause: Option<Fragment>,
    /// Consequence fragment, if it still exists.
    pub consequence: Option<Fragment>,
    /// Recommendation fragment, if it still exists.
    pub recommendation: Option<Fragment>,
    /// Attached meme.
    pub meme: Option<Meme>,
    /// Attached law.
    pub law: Option<Law>,
    /// Ids the excuse was stored with, including ones that no longer resolve.
    pub refs: ExcuseRefs,
    /// Whether any stored reference points at deleted content.
    pub dangling: bool,
    /// Composition type.
    #[serde(rename = "type")]
    pub excuse_type: ExcuseType,
    /// Role the excuse was tailored for.
    pub role: Option<Role>,
    /// Recorded seed.
    pub seed: i64,
    /// The excuse rendered as one paragraph.
    pub text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stored reference ids of an excuse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcuseRefs {
    /// Context fragment id.
    pub context_id: Option<FragmentId>,
    /// Cause fragment id.
    pub cause_id: Option<FragmentId>,
    /// Consequence fragment id.
    pub consequence_id: Option<FragmentId>,
    /// Recommendation fragment id.
    pub recommendation_id: Option<FragmentId>,
    /// Meme id.
    pub meme_id: Option<MemeId>,
    /// Law id.
    pub law_id: Option<LawId>,
}

impl From<ResolvedExcuse> for ExcuseResponse {
    fn from(resolved: ResolvedExcuse) -> Self {
        let text = resolved.narrative();
        let dangling = resolved.has_dangling_refs();
        let excuse = resolved.excuse;
        let refs = ExcuseRefs {
            context_id: excuse.context,
            cause_id: excuse.cause,
            consequence_id: excuse.consequence,
            recommendation_id: excuse.recommendation,
            meme_id: excuse.meme,
            law_id: excuse.law,
        };
        Self {
            id: excuse.id,
            context: resolved.context,
            cause: resolved.cause,
            consequence: resolved.consequence,
            recommendation: resolved.recommendation,
            meme: resolved.meme,
            law: resolved.law,
            refs,
            dangling,
            excuse_type: excuse.excuse_type,
            role: excuse.role,
            seed: excuse.seed,
            text,
            created_at: excuse.created_at,
            updated_at: excuse.updated_at,
        }
    }
}

/// Query for the daily excuse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyQuery {
    /// Day to compose for, `YYYY-MM-DD`. Today (UTC) when absent.
    pub date: Option<NaiveDate>,
}

/// Query filters for fragment listing. Tokens are case-insensitive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentQuery {
    /// Kind token.
    pub kind: Option<String>,
    /// Role token.
    pub role: Option<String>,
}

/// List of supported roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesResponse {
    /// Canonical role tokens.
    pub roles: Vec<Role>,
}

/// Result of checking one role token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCheckResponse {
    /// Canonical role, or the token as given when unknown.
    pub role: String,
    /// Whether the token names a known role.
    pub valid: bool,
    /// Explanation for unknown tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Store connectivity.
    pub store: bool,
    /// Content counts, when the store answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentHealth>,
}

/// Content counts for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentHealth {
    /// Stored fragments.
    pub fragments: usize,
    /// Stored memes.
    pub memes: usize,
    /// Stored laws.
    pub laws: usize,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether traffic can be served.
    pub ready: bool,
    /// Store connectivity.
    pub store: bool,
    /// Extra information.
    pub details: Option<String>,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// An error response with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }

    fn bad_request(code: &str, error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorResponse::new(code, error))
    }

    fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("NOT_FOUND", format!("{} not found", entity)).with_details(id.to_string()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(
            status = self.status.as_u16(),
            code = %self.body.code,
            error = %self.body.error,
            "Request error"
        );
        (self.status, Json(self.body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Compose(ComposeError::InvalidRole(token)) => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("INVALID_ROLE", ComposeError::InvalidRole(token.clone()).to_string())
                    .with_details(token),
            ),
            CatalogError::Compose(e @ ComposeError::NoFragmentsAvailable(_)) => Self::new(
                StatusCode::CONFLICT,
                ErrorResponse::new("NO_FRAGMENTS_AVAILABLE", e.to_string()),
            ),
            CatalogError::Store(msg) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("STORE_ERROR", "Store operation failed").with_details(msg),
            ),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Validation { field, reason } => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_FAILED", format!("{}: {}", field, reason)).with_details(field),
            ),
            ContentError::NotFound { entity, id } => Self::not_found(entity, id),
            ContentError::Store(msg) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("STORE_ERROR", "Store operation failed").with_details(msg),
            ),
        }
    }
}

fn parse_id<T>(raw: &str, parse: fn(&str) -> Result<T, uuid::Error>) -> ApiResult<T> {
    parse(raw).map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_ID", format!("Invalid id: {}", e)).with_details(raw),
        )
    })
}

// ============================================================================
// Excuse Handlers
// ============================================================================

async fn generate<S: ExcuseStore + 'static>(
    state: &ServiceState<S>,
    mode_name: &str,
    mode: GenerationMode,
) -> ApiResult<Json<ExcuseResponse>> {
    let start = Instant::now();
    let resolved = state.catalog.create(mode).await?;
    record_excuse_metric(
        mode_name,
        resolved.excuse.excuse_type,
        resolved.excuse.role,
        start.elapsed().as_millis() as u64,
    );
    Ok(Json(resolved.into()))
}

async fn random_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
) -> ApiResult<Json<ExcuseResponse>> {
    generate(&state, "simple", GenerationMode::Simple).await
}

async fn meme_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
) -> ApiResult<Json<ExcuseResponse>> {
    generate(&state, "with_meme", GenerationMode::WithMeme).await
}

async fn law_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
) -> ApiResult<Json<ExcuseResponse>> {
    generate(&state, "with_law", GenerationMode::WithLaw).await
}

async fn ultra_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
) -> ApiResult<Json<ExcuseResponse>> {
    generate(&state, "ultra", GenerationMode::Ultra).await
}

async fn by_role_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(role): Path<String>,
) -> ApiResult<Json<ExcuseResponse>> {
    let start = Instant::now();
    let resolved = state.catalog.create_by_role(&role).await?;
    record_excuse_metric(
        "by_role",
        resolved.excuse.excuse_type,
        resolved.excuse.role,
        start.elapsed().as_millis() as u64,
    );
    Ok(Json(resolved.into()))
}

async fn daily_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Json<ExcuseResponse>> {
    let start = Instant::now();
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let resolved = state.catalog.create_daily_for(date).await?;
    record_excuse_metric(
        "daily",
        resolved.excuse.excuse_type,
        None,
        start.elapsed().as_millis() as u64,
    );
    Ok(Json(resolved.into()))
}

async fn get_excuse_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<Json<ExcuseResponse>> {
    let id = parse_id(&id, ExcuseId::parse)?;
    let resolved = state
        .catalog
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Excuse", id))?;
    Ok(Json(resolved.into()))
}

async fn list_excuses_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
) -> ApiResult<Json<Vec<ExcuseResponse>>> {
    let all = state.catalog.list_all().await?;
    Ok(Json(all.into_iter().map(ExcuseResponse::from).collect()))
}

async fn create_manual_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Json(manual): Json<ManualExcuse>,
) -> ApiResult<(StatusCode, Json<ExcuseResponse>)> {
    let resolved = state.catalog.create_manual(manual).await?;
    Ok((StatusCode::CREATED, Json(resolved.into())))
}

// ============================================================================
// Content Handlers
// ============================================================================

async fn list_fragments_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Query(query): Query<FragmentQuery>,
) -> ApiResult<Json<Vec<Fragment>>> {
    let kind = match query.kind.as_deref() {
        Some(token) => Some(
            FragmentKind::from_str(token)
                .ok_or_else(|| ApiError::bad_request("INVALID_KIND", format!("Invalid kind: {}", token)))?,
        ),
        None => None,
    };
    let role = match query.role.as_deref() {
        Some(token) => Some(resolve_role(token).map_err(|e| ApiError::bad_request("INVALID_ROLE", e.to_string()))?),
        None => None,
    };
    let fragments = state.content.list_fragments(FragmentFilter { kind, role }).await?;
    Ok(Json(fragments))
}

async fn create_fragment_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Json(input): Json<NewFragment>,
) -> ApiResult<(StatusCode, Json<Fragment>)> {
    let fragment = state.content.create_fragment(input).await?;
    Ok((StatusCode::CREATED, Json(fragment)))
}

async fn get_fragment_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<Json<Fragment>> {
    let id = parse_id(&id, FragmentId::parse)?;
    let fragment = state
        .content
        .get_fragment(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Fragment", id))?;
    Ok(Json(fragment))
}

async fn update_fragment_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
    Json(patch): Json<FragmentPatch>,
) -> ApiResult<Json<Fragment>> {
    let id = parse_id(&id, FragmentId::parse)?;
    Ok(Json(state.content.update_fragment(&id, patch).await?))
}

async fn delete_fragment_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, FragmentId::parse)?;
    state.content.delete_fragment(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_memes_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Query(filter): Query<MemeFilter>,
) -> ApiResult<Json<Vec<Meme>>> {
    Ok(Json(state.content.list_memes(&filter).await?))
}

async fn create_meme_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Json(input): Json<NewMeme>,
) -> ApiResult<(StatusCode, Json<Meme>)> {
    let meme = state.content.create_meme(input).await?;
    Ok((StatusCode::CREATED, Json(meme)))
}

async fn get_meme_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<Json<Meme>> {
    let id = parse_id(&id, MemeId::parse)?;
    let meme = state
        .content
        .get_meme(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Meme", id))?;
    Ok(Json(meme))
}

async fn update_meme_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
    Json(patch): Json<MemePatch>,
) -> ApiResult<Json<Meme>> {
    let id = parse_id(&id, MemeId::parse)?;
    Ok(Json(state.content.update_meme(&id, patch).await?))
}

async fn delete_meme_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, MemeId::parse)?;
    state.content.delete_meme(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_laws_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Query(filter): Query<LawFilter>,
) -> ApiResult<Json<Vec<Law>>> {
    Ok(Json(state.content.list_laws(&filter).await?))
}

async fn create_law_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Json(input): Json<NewLaw>,
) -> ApiResult<(StatusCode, Json<Law>)> {
    let law = state.content.create_law(input).await?;
    Ok((StatusCode::CREATED, Json(law)))
}

async fn get_law_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<Json<Law>> {
    let id = parse_id(&id, LawId::parse)?;
    let law = state
        .content
        .get_law(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Law", id))?;
    Ok(Json(law))
}

async fn update_law_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
    Json(patch): Json<LawPatch>,
) -> ApiResult<Json<Law>> {
    let id = parse_id(&id, LawId::parse)?;
    Ok(Json(state.content.update_law(&id, patch).await?))
}

async fn delete_law_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, LawId::parse)?;
    state.content.delete_law(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Roles
// ============================================================================

async fn list_roles_handler() -> Json<RolesResponse> {
    Json(RolesResponse { roles: Role::ALL.to_vec() })
}

async fn check_role_handler(Path(token): Path<String>) -> (StatusCode, Json<RoleCheckResponse>) {
    match resolve_role(&token) {
        Ok(role) => (
            StatusCode::OK,
            Json(RoleCheckResponse { role: role.to_string(), valid: true, message: None }),
        ),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(RoleCheckResponse { role: token, valid: false, message: Some(e.to_string()) }),
        ),
    }
}

/// Roles are a closed set; creation is always refused with 501.
async fn create_role_handler(body: Option<Json<serde_json::Value>>) -> ApiError {
    let mut error = ErrorResponse::new("NOT_IMPLEMENTED", "Roles are static and cannot be created");
    if let Some(provided) = body.as_ref().and_then(|Json(v)| v.get("role")).and_then(|r| r.as_str()) {
        error = error.with_details(provided);
    }
    ApiError::new(StatusCode::NOT_IMPLEMENTED, error)
}

// ============================================================================
// Health
// ============================================================================

/// Health check endpoint (detailed).
async fn health_handler<S: ExcuseStore + 'static>(State(state): SharedState<S>) -> Json<HealthResponse> {
    let store_healthy = state.store.is_healthy().await;
    let content = match state.store.content_counts().await {
        Ok((fragments, memes, laws)) => Some(ContentHealth { fragments, memes, laws }),
        Err(e) => {
            tracing::warn!(error = %e, "Content counts unavailable");
            None
        }
    };

    Json(HealthResponse {
        status: if store_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        store: store_healthy,
        content,
    })
}

/// Liveness probe endpoint. Does not check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the store is reachable, 503 otherwise.
async fn readiness_handler<S: ExcuseStore + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Store connection failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the excuse service.
pub fn create_router<S: ExcuseStore + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Excuse generation
        .route("/api/excuses/random", get(random_handler::<S>))
        .route("/api/excuses/daily", get(daily_handler::<S>))
        .route("/api/excuses/meme", get(meme_handler::<S>))
        .route("/api/excuses/law", get(law_handler::<S>))
        .route("/api/excuses/ultra", get(ultra_handler::<S>))
        .route("/api/excuses/role/:role", get(by_role_handler::<S>))
        // Excuse catalog
        .route(
            "/api/excuses",
            get(list_excuses_handler::<S>).post(create_manual_handler::<S>),
        )
        .route("/api/excuses/:id", get(get_excuse_handler::<S>))
        // Content management
        .route(
            "/api/fragments",
            get(list_fragments_handler::<S>).post(create_fragment_handler::<S>),
        )
        .route(
            "/api/fragments/:id",
            get(get_fragment_handler::<S>)
                .put(update_fragment_handler::<S>)
                .delete(delete_fragment_handler::<S>),
        )
        .route(
            "/api/memes",
            get(list_memes_handler::<S>).post(create_meme_handler::<S>),
        )
        .route(
            "/api/memes/:id",
            get(get_meme_handler::<S>)
                .put(update_meme_handler::<S>)
                .delete(delete_meme_handler::<S>),
        )
        .route(
            "/api/laws",
            get(list_laws_handler::<S>).post(create_law_handler::<S>),
        )
        .route(
            "/api/laws/:id",
            get(get_law_handler::<S>)
                .put(update_law_handler::<S>)
                .delete(delete_law_handler::<S>),
        )
        // Roles
        .route("/api/roles", get(list_roles_handler).post(create_role_handler))
        .route("/api/roles/:role", get(check_role_handler))
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state)
}
