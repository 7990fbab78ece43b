use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use werkbank_core::{ModuleInfo, Principal, SettingsError, SettingsProvider, WerkbankSettings};

use crate::health::HEALTH_TIMEOUT_MS;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        register_module,
        unregister_module,
        list_modules,
        get_module,
        modules_health,
        setup_required,
        setup_complete,
        health_check,
    ),
    components(
        schemas(
            werkbank_core::module::ModuleInfo,
            werkbank_core::module::NavItem,
            werkbank_core::module::NavKind,
            ModuleStatus,
            SetupRequest,
            SetupRequired,
            HostHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Roster entry enriched with the liveness picture.
#[derive(Serialize, ToSchema)]
pub struct ModuleStatus {
    pub module: ModuleInfo,
    /// Millis since epoch of the last observed health probe, if any.
    pub last_seen_ms: Option<u64>,
    pub healthy: bool,
}

#[utoipa::path(
    post,
    path = "/api/modules/register",
    request_body = ModuleInfo,
    responses(
        (status = 200, description = "Module registered"),
        (status = 400, description = "Unusable module name")
    )
)]
pub async fn register_module(
    State(state): State<AppState>,
    Json(info): Json<ModuleInfo>,
) -> Response {
    let name = info.module_name.clone();
    let version = info.version.clone();
    match state.registry.register(info) {
        Ok(()) => {
            metrics::counter!("werkbank_module_registrations_total").increment(1);
            tracing::info!(module = %name, version = %version, "module registered");
            StatusCode::OK.into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/modules/{name}",
    responses(
        (status = 204, description = "Module removed (or was never registered)"),
        (status = 401, description = "Unauthorized")
    ),
    params(("name" = String, Path, description = "Module name")),
    security(("api_jwt" = []))
)]
pub async fn unregister_module(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Response {
    if !principal.is_authenticated() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.registry.unregister(&name);
    tracing::info!(module = %name, "module unregistered");
    StatusCode::NO_CONTENT.into_response()
}

#[utoipa::path(
    get,
    path = "/api/modules",
    responses(
        (status = 200, description = "Registered modules with liveness", body = Vec<ModuleStatus>),
        (status = 401, description = "Unauthorized")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_modules(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Response {
    if !principal.is_authenticated() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    // The registry snapshot has no defined order; sort for a stable roster.
    let mut modules = state.registry.get_all();
    modules.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    let statuses: Vec<ModuleStatus> = modules
        .into_iter()
        .map(|module| {
            let name = module.module_name.clone();
            ModuleStatus {
                last_seen_ms: state.health.last_seen(&name),
                healthy: !state.health.is_stale(&name, HEALTH_TIMEOUT_MS),
                module,
            }
        })
        .collect();
    Json(statuses).into_response()
}

#[utoipa::path(
    get,
    path = "/api/modules/{name}",
    responses(
        (status = 200, description = "Module info", body = ModuleInfo),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Module not registered")
    ),
    params(("name" = String, Path, description = "Module name")),
    security(("api_jwt" = []))
)]
pub async fn get_module(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Response {
    if !principal.is_authenticated() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.registry.get(&name) {
        Some(info) => Json(info).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Serialize, ToSchema)]
pub struct HostHealth {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

fn host_health() -> Json<HostHealth> {
    Json(HostHealth {
        status: "healthy",
        module: "Werkbank",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[utoipa::path(
    get,
    path = "/api/modules/health",
    responses((status = 200, description = "Host liveness signal", body = HostHealth))
)]
pub async fn modules_health() -> impl IntoResponse {
    host_health()
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Host liveness", body = HostHealth))
)]
pub async fn health_check() -> impl IntoResponse {
    host_health()
}

#[derive(Serialize, ToSchema)]
pub struct SetupRequired {
    pub required: bool,
}

#[utoipa::path(
    get,
    path = "/api/setup/required",
    responses((status = 200, description = "Whether first-run setup is pending", body = SetupRequired))
)]
pub async fn setup_required(State(state): State<AppState>) -> Response {
    match state.store.load() {
        Ok(row) => Json(SetupRequired {
            required: row.is_none(),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "settings lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SetupRequest {
    pub base_url: String,
    #[serde(default)]
    pub auth_enabled: bool,
}

#[utoipa::path(
    post,
    path = "/api/setup/complete",
    request_body = SetupRequest,
    responses(
        (status = 200, description = "Setup completed"),
        (status = 409, description = "Setup already completed")
    )
)]
pub async fn setup_complete(
    State(state): State<AppState>,
    Json(request): Json<SetupRequest>,
) -> Response {
    let settings = WerkbankSettings {
        auth_enabled: request.auth_enabled,
        base_url: request.base_url,
    };
    match state.store.complete_setup(&settings) {
        Ok(()) => {
            state.settings.invalidate();
            tracing::info!(auth_enabled = settings.auth_enabled, "first-run setup completed");
            StatusCode::OK.into_response()
        }
        Err(SettingsError::AlreadyCompleted) => StatusCode::CONFLICT.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "setup write failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthTracker;
    use crate::registry::ModuleRegistry;
    use crate::token::TokenValidator;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use werkbank_core::time::FixedClock;
    use werkbank_core::CachedSettings;
    use werkbank_db::SqliteSettings;

    fn test_state(clock: Arc<FixedClock>) -> AppState {
        let store = Arc::new(SqliteSettings::open_in_memory().unwrap());
        let provider: Arc<dyn SettingsProvider> = store.clone();
        AppState {
            registry: Arc::new(ModuleRegistry::new()),
            health: Arc::new(HealthTracker::new(clock)),
            settings: Arc::new(CachedSettings::new(provider, Duration::from_secs(0))),
            store,
            validator: Arc::new(TokenValidator::new(
                "0123456789abcdef0123456789abcdef",
                "Werkbank",
            )
            .unwrap()),
        }
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/api/modules/register", post(register_module))
            .route("/api/modules", get(list_modules))
            .route("/api/setup/required", get(setup_required))
            .route("/api/setup/complete", post(setup_complete))
            .with_state(state)
    }

    fn json_request(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_as_admin(path: &str) -> Request<Body> {
        let mut req = Request::builder().uri(path).body(Body::empty()).unwrap();
        req.extensions_mut().insert(Principal::ImplicitAdmin);
        req
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn registration_accepts_a_payload_and_lists_it_back() {
        let clock = Arc::new(FixedClock::new(0));
        let state = test_state(clock);
        let app = app(state.clone());

        let payload = r#"{
            "ModuleName": "Faktura",
            "DisplayName": "Rechnungen",
            "Version": "1.2.0",
            "LogoUrl": "/faktura/logo.svg",
            "HealthCheckUrl": "/faktura/health",
            "NavigationItems": []
        }"#;
        let response = app
            .clone()
            .oneshot(json_request("/api/modules/register", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        state.health.record("Faktura");
        let response = app.oneshot(get_as_admin("/api/modules")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json[0]["module"]["ModuleName"], "Faktura");
        assert_eq!(json[0]["healthy"], true);
    }

    #[tokio::test]
    async fn registration_rejects_an_empty_name() {
        let state = test_state(Arc::new(FixedClock::new(0)));
        let payload = r#"{
            "ModuleName": " ",
            "DisplayName": "x",
            "Version": "1",
            "LogoUrl": "",
            "HealthCheckUrl": ""
        }"#;
        let response = app(state)
            .oneshot(json_request("/api/modules/register", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stale_module_is_reported_unhealthy() {
        let clock = Arc::new(FixedClock::new(0));
        let state = test_state(clock.clone());
        state
            .registry
            .register(ModuleInfo::new("Faktura", "Rechnungen", "1.0.0"))
            .unwrap();
        state.health.record("Faktura");
        clock.advance(HEALTH_TIMEOUT_MS + 1);

        let response = app(state).oneshot(get_as_admin("/api/modules")).await.unwrap();
        let json = json_body(response).await;
        assert_eq!(json[0]["healthy"], false);
        assert_eq!(json[0]["last_seen_ms"], 0);
    }

    #[tokio::test]
    async fn setup_flow_flips_required_and_conflicts_on_replay() {
        let state = test_state(Arc::new(FixedClock::new(0)));
        let app = app(state);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/setup/required").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["required"], true);

        let body = r#"{"base_url": "http://host:5000", "auth_enabled": true}"#;
        let response = app
            .clone()
            .oneshot(json_request("/api/setup/complete", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/setup/required").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["required"], false);

        let response = app
            .oneshot(json_request("/api/setup/complete", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
