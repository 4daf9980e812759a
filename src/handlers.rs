use crate::cache::{on_sync, resolve_push};
use crate::errors::AppError;
use crate::models::{
    DietForm, DietaryLog, MoodEntry, MoodForm, Notification, PushPayload, SleepForm, SleepRecord,
    SymptomForm, SymptomLog, SyncRequest,
};
use crate::state::AppState;
use crate::store::Record;
use crate::storage::persist_data;
use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

pub async fn shell(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_asset(&state, "/", true).await
}

pub async fn shell_document(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_asset(&state, "/index.html", true).await
}

pub async fn app_script(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_asset(&state, "/app.js", false).await
}

pub async fn web_manifest(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_asset(&state, "/manifest.json", false).await
}

async fn serve_asset(state: &AppState, url: &str, navigation: bool) -> Result<Response, AppError> {
    match state.cache.handle(url, navigation).await {
        Some(asset) => Ok((
            [(header::CONTENT_TYPE, asset.content_type)],
            asset.body,
        )
            .into_response()),
        None => Err(AppError::not_found(format!("{url} is not available"))),
    }
}

pub async fn list_symptoms(
    State(state): State<AppState>,
) -> Result<Json<Vec<SymptomLog>>, AppError> {
    list::<SymptomLog>(&state).await
}

pub async fn add_symptom(
    State(state): State<AppState>,
    Json(form): Json<SymptomForm>,
) -> Result<Json<SymptomLog>, AppError> {
    append(&state, form.normalize()?).await
}

pub async fn export_symptoms(State(state): State<AppState>) -> Result<Response, AppError> {
    export::<SymptomLog>(&state).await
}

pub async fn list_diet(State(state): State<AppState>) -> Result<Json<Vec<DietaryLog>>, AppError> {
    list::<DietaryLog>(&state).await
}

pub async fn add_diet(
    State(state): State<AppState>,
    Json(form): Json<DietForm>,
) -> Result<Json<DietaryLog>, AppError> {
    append(&state, form.normalize()?).await
}

pub async fn export_diet(State(state): State<AppState>) -> Result<Response, AppError> {
    export::<DietaryLog>(&state).await
}

pub async fn list_mood(State(state): State<AppState>) -> Result<Json<Vec<MoodEntry>>, AppError> {
    list::<MoodEntry>(&state).await
}

pub async fn add_mood(
    State(state): State<AppState>,
    Json(form): Json<MoodForm>,
) -> Result<Json<MoodEntry>, AppError> {
    append(&state, form.normalize()?).await
}

pub async fn export_mood(State(state): State<AppState>) -> Result<Response, AppError> {
    export::<MoodEntry>(&state).await
}

pub async fn list_sleep(State(state): State<AppState>) -> Result<Json<Vec<SleepRecord>>, AppError> {
    list::<SleepRecord>(&state).await
}

pub async fn add_sleep(
    State(state): State<AppState>,
    Json(form): Json<SleepForm>,
) -> Result<Json<SleepRecord>, AppError> {
    append(&state, form.normalize()?).await
}

pub async fn export_sleep(State(state): State<AppState>) -> Result<Response, AppError> {
    export::<SleepRecord>(&state).await
}

/// Logs the notification an external push producer would have displayed.
pub async fn push(Json(payload): Json<PushPayload>) -> Json<Notification> {
    let note = resolve_push(payload);
    info!(title = %note.title, url = %note.url, "push received; would display notification");
    Json(note)
}

/// Background sync stub: acknowledges the tag and does nothing, since
/// every record is local-only.
pub async fn sync(Json(request): Json<SyncRequest>) -> axum::http::StatusCode {
    on_sync(&request.tag);
    axum::http::StatusCode::ACCEPTED
}

async fn list<R: Record>(state: &AppState) -> Result<Json<Vec<R>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(R::collection(&data).sorted_desc()))
}

async fn append<R: Record>(state: &AppState, record: R) -> Result<Json<R>, AppError> {
    let mut data = state.data.lock().await;
    let collection = R::collection_mut(&mut data);
    let key = collection.add(record);
    let stored = collection
        .records
        .last()
        .cloned()
        .ok_or_else(|| AppError::internal(std::io::Error::other("record not stored")))?;

    persist_data(&state.data_path, &data).await.map_err(|err| {
        error!("failed to persist {}: {err}", R::LABEL);
        AppError::from(err)
    })?;

    info!(key, store = R::STORE, "stored new {}", R::LABEL);
    Ok(Json(stored))
}

async fn export<R: Record>(state: &AppState) -> Result<Response, AppError> {
    let data = state.data.lock().await;
    let collection = R::collection(&data);
    if collection.is_empty() {
        info!("nothing to export for {}", R::LABEL);
        return Err(AppError::not_found(format!(
            "no {} data to export",
            R::LABEL
        )));
    }

    let body = crate::export::to_csv(&collection.records);
    let headers = [
        (
            header::CONTENT_TYPE,
            "text/csv; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", R::EXPORT_FILE),
        ),
    ];
    Ok((headers, body).into_response())
}
