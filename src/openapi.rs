use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{health, vitals};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "device-vitals", description = "Device vitals ingest and analytics API"),
    paths(
        health::health_handler,
        vitals::create_vital,
        vitals::list_vitals,
        vitals::vitals_analytics,
    ),
    components(schemas(
        health::HealthResponse,
        vitals::CreateVitalResponse,
        vitals::HistoryResponse,
        crate::store::StoredSample,
        crate::vitals::Sample,
        crate::vitals::Summary,
        crate::vitals::MetricValues,
        crate::vitals::MetricAverages,
    )),
    tags(
        (name = "vitals", description = "Sample ingest, history and rolling analytics"),
        (name = "health", description = "Liveness")
    )
)]
struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or(serde_json::Value::Null)
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_vitals_route() {
        let doc = openapi_json();
        let paths = doc["paths"].as_object().expect("paths");
        for path in ["/health", "/api/vitals", "/api/vitals/analytics"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(doc["paths"]["/api/vitals"]["post"].is_object());
        assert!(doc["paths"]["/api/vitals"]["get"].is_object());
    }

    #[test]
    fn ingest_body_references_sample_schema() {
        let doc = openapi_json();
        let body = &doc["paths"]["/api/vitals"]["post"]["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(body["$ref"], "#/components/schemas/Sample");
        assert!(doc["components"]["schemas"]["Sample"].is_object());
    }
}
