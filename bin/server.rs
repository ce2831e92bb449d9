// Resale Valuation - Web Server
// REST API with Axum: value items, store them, list what was stored

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use resale_valuation::{
    commentary, get_all_records, get_brand_stats, get_events_for_record, get_record,
    get_records_by_brand, init_tracing, insert_record, open_database, ClothingItem, Commentator,
    Config, Valuation, ValuationRecord, API_SOURCE,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    commentator: Arc<dyn Commentator>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error: status code plus message, rendered as an ApiResponse
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{}", context);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: context.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

impl AppState {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|e| ApiError::internal("Database lock poisoned", e))
    }
}

/// Body of POST /api/model and POST /api/estimate.
/// The submitter travels with the request; nothing is remembered between calls.
#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    submitted_by: Option<String>,

    #[serde(flatten)]
    item: ClothingItem,
}

/// Estimate response (not persisted)
#[derive(Serialize)]
struct EstimateResponse {
    item: ClothingItem,
    valuation: Valuation,
    commentary: String,
}

fn parse_body(body: Result<Json<SubmitRequest>, JsonRejection>) -> Result<SubmitRequest, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "rejected submission");
            Err(ApiError::bad_request(format!(
                "No valid input data provided: {}",
                rejection.body_text()
            )))
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/model - All stored valuations
async fn list_valuations(State(state): State<AppState>) -> ApiResult<Vec<ValuationRecord>> {
    let conn = state.conn()?;
    let records = get_all_records(&conn)
        .map_err(|e| ApiError::internal("Error getting valuations", e))?;

    Ok(Json(ApiResponse::ok(records)))
}

/// POST /api/model - Value an item and store it
async fn submit_valuation(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ValuationRecord>>), ApiError> {
    let request = parse_body(body)?;
    let submitted_by = request.submitted_by.unwrap_or_default();

    // Value outside the lock; the engine needs no shared state
    let (record, _) = ValuationRecord::appraise(
        request.item,
        &submitted_by,
        state.commentator.as_ref(),
        API_SOURCE,
        0,
    );

    {
        let conn = state.conn()?;
        insert_record(&conn, &record)
            .map_err(|e| ApiError::internal("Error storing valuation", e))?;
    }

    tracing::info!(
        record = %record.id,
        brand = %record.item.brand,
        current_price = record.current_price,
        submitted_by = %record.submitted_by,
        "valuation stored"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// POST /api/estimate - Value an item without storing it
async fn estimate(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<EstimateResponse> {
    let request = parse_body(body)?;
    let valuation = resale_valuation::value(&request.item);

    let commentary = state
        .commentator
        .comment(&request.item, &valuation)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "commentary failed");
            String::new()
        });

    Ok(Json(ApiResponse::ok(EstimateResponse {
        item: request.item,
        valuation,
        commentary,
    })))
}

/// GET /api/model/:id - One stored valuation
async fn get_valuation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ValuationRecord> {
    let conn = state.conn()?;

    match get_record(&conn, &id).map_err(|e| ApiError::internal("Error getting valuation", e))? {
        Some(record) => Ok(Json(ApiResponse::ok(record))),
        None => Err(ApiError::not_found(format!("No valuation with id {}", id))),
    }
}

/// GET /api/model/:id/events - Audit trail of one valuation
async fn get_valuation_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<resale_valuation::Event>> {
    let conn = state.conn()?;
    let events = get_events_for_record(&conn, &id)
        .map_err(|e| ApiError::internal("Error getting events", e))?;

    Ok(Json(ApiResponse::ok(events)))
}

/// GET /api/brands/:brand - Valuations for one brand
async fn get_brand_valuations(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> ApiResult<Vec<ValuationRecord>> {
    // Path already percent-decodes ("Tiffany%20%26%20Co." -> "Tiffany & Co.")
    let conn = state.conn()?;
    let records = get_records_by_brand(&conn, &brand)
        .map_err(|e| ApiError::internal("Error getting brand valuations", e))?;

    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/stats - Per-brand statistics
async fn get_stats(State(state): State<AppState>) -> ApiResult<Vec<resale_valuation::BrandStat>> {
    let conn = state.conn()?;
    let stats = get_brand_stats(&conn).map_err(|e| ApiError::internal("Error getting stats", e))?;

    Ok(Json(ApiResponse::ok(stats)))
}

// ============================================================================
// Router
// ============================================================================

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/model", get(list_valuations).post(submit_valuation))
        .route("/model/:id", get(get_valuation))
        .route("/model/:id/events", get(get_valuation_events))
        .route("/estimate", post(estimate))
        .route("/brands/:brand", get(get_brand_valuations))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    println!("🌐 Resale Valuation - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_database(&config.db_path)?;
    println!("✓ Database opened: {:?}", config.db_path);

    let commentator: Arc<dyn Commentator> = match commentary::from_name(&config.commentary) {
        Some(c) => Arc::from(c),
        None => anyhow::bail!("Unknown commentator: {}", config.commentary),
    };

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        commentator,
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server listening");

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/model", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use anyhow::anyhow;
    use resale_valuation::{setup_database, NoCommentary, TemplateCommentator};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FailingCommentator;

    impl Commentator for FailingCommentator {
        fn comment(&self, _item: &ClothingItem, _valuation: &Valuation) -> anyhow::Result<String> {
            Err(anyhow!("commentary backend unavailable"))
        }
    }

    fn test_router(commentator: Arc<dyn Commentator>) -> Router {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        build_router(AppState {
            db: Arc::new(Mutex::new(conn)),
            commentator,
        })
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn prada_dress() -> Value {
        json!({
            "submitted_by": "riley",
            "initial_price": 200.0,
            "brand": "Prada",
            "category": "Dress",
            "condition": "Excellent",
            "material": "Silk",
            "rarity": "General Release",
            "age_in_months": 24
        })
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router(Arc::new(NoCommentary));
        let (status, body) = send(&router, get_req("/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_submit_then_list() {
        let router = test_router(Arc::new(TemplateCommentator));

        let (status, body) = send(&router, post_json("/api/model", prada_dress())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["submitted_by"], "riley");
        assert_eq!(body["data"]["brand"], "Prada");
        let price = body["data"]["current_price"].as_f64().unwrap();
        assert!((price - 223.213).abs() < 1e-2);
        assert!(body["data"]["commentary"].as_str().unwrap().contains("appreciates"));

        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, list) = send(&router, get_req("/api/model")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["data"].as_array().unwrap().len(), 1);

        let (status, one) = send(&router, get_req(&format!("/api/model/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["data"]["id"], id.as_str());

        let (_, events) = send(&router, get_req(&format!("/api/model/{}/events", id))).await;
        assert_eq!(events["data"][0]["actor"], "riley");
    }

    #[tokio::test]
    async fn test_submit_survives_commentary_failure() {
        let router = test_router(Arc::new(FailingCommentator));

        let (status, body) = send(&router, post_json("/api/model", prada_dress())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["commentary"], "");
        let price = body["data"]["current_price"].as_f64().unwrap();
        assert!((price - 223.213).abs() < 1e-2);

        let (_, list) = send(&router, get_req("/api/model")).await;
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submitter_is_per_request() {
        let router = test_router(Arc::new(NoCommentary));

        send(&router, post_json("/api/model", prada_dress())).await;

        let mut anonymous = prada_dress();
        anonymous.as_object_mut().unwrap().remove("submitted_by");
        let (_, body) = send(&router, post_json("/api/model", anonymous)).await;

        assert_eq!(body["data"]["submitted_by"], "anonymous");
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let router = test_router(Arc::new(NoCommentary));

        let (status, body) =
            send(&router, post_json("/api/model", json!({ "brand": "Nike" }))).await;
        assert!(status.is_client_error());
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("No valid input data"));

        let (_, list) = send(&router, get_req("/api/model")).await;
        assert!(list["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_estimate_does_not_persist() {
        let router = test_router(Arc::new(NoCommentary));

        let body = json!({
            "initial_price": 100.0,
            "brand": "Nobody",
            "category": "Nothing",
            "condition": "Excellent",
            "material": "Unobtainium",
            "rarity": "General Release",
            "time_since_purchase": 12
        });
        let (status, estimate) = send(&router, post_json("/api/estimate", body)).await;

        assert_eq!(status, StatusCode::OK);
        let price = estimate["data"]["valuation"]["current_price"].as_f64().unwrap();
        assert!((price - 81.189).abs() < 1e-9);
        assert_eq!(estimate["data"]["valuation"]["brand_tier"], Value::Null);
        assert_eq!(estimate["data"]["valuation"]["brand_factor"], 0.90);
        assert!(estimate["data"]["valuation"].get("factors").is_none());

        let (_, list) = send(&router, get_req("/api/model")).await;
        assert!(list["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_404() {
        let router = test_router(Arc::new(NoCommentary));
        let (status, body) = send(&router, get_req("/api/model/does-not-exist")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_brand_lookup_decodes_name() {
        let router = test_router(Arc::new(NoCommentary));

        let mut tiffany = prada_dress();
        tiffany["brand"] = json!("Tiffany & Co.");
        send(&router, post_json("/api/model", tiffany)).await;
        send(&router, post_json("/api/model", prada_dress())).await;

        let (status, body) = send(&router, get_req("/api/brands/Tiffany%20%26%20Co.")).await;
        assert_eq!(status, StatusCode::OK);
        let records = body["data"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["brand"], "Tiffany & Co.");

        let (_, stats) = send(&router, get_req("/api/stats")).await;
        assert_eq!(stats["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_brand_lookup_decodes_once() {
        let router = test_router(Arc::new(NoCommentary));

        let mut literal = prada_dress();
        literal["brand"] = json!("Label%41");
        send(&router, post_json("/api/model", literal)).await;
        let mut plain = prada_dress();
        plain["brand"] = json!("LabelA");
        send(&router, post_json("/api/model", plain)).await;

        let (status, body) = send(&router, get_req("/api/brands/Label%2541")).await;
        assert_eq!(status, StatusCode::OK);
        let records = body["data"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["brand"], "Label%41");
    }
}
