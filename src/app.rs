use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::shell))
        .route("/index.html", get(handlers::shell_document))
        .route("/app.js", get(handlers::app_script))
        .route("/manifest.json", get(handlers::web_manifest))
        .route(
            "/api/symptoms",
            get(handlers::list_symptoms).post(handlers::add_symptom),
        )
        .route("/api/symptoms/export", get(handlers::export_symptoms))
        .route("/api/diet", get(handlers::list_diet).post(handlers::add_diet))
        .route("/api/diet/export", get(handlers::export_diet))
        .route("/api/mood", get(handlers::list_mood).post(handlers::add_mood))
        .route("/api/mood/export", get(handlers::export_mood))
        .route(
            "/api/sleep",
            get(handlers::list_sleep).post(handlers::add_sleep),
        )
        .route("/api/sleep/export", get(handlers::export_sleep))
        .route("/api/push", post(handlers::push))
        .route("/api/sync", post(handlers::sync))
        .with_state(state)
}
