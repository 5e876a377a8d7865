use crate::errors::AppError;
use crate::models::{
    CounterView, LoadTabRequest, NewCounterRequest, NewTabRequest, RemovedResponse,
    RenameCounterRequest, SavedResponse, TabView, TabsResponse, DEFAULT_COUNTER_LABEL,
};
use crate::state::{AppState, TabId};
use crate::storage;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Json,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize, Default)]
pub struct IndexParams {
    pub status: Option<String>,
    pub kind: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Html<String> {
    let saves = storage::list_saves(&state.save_dir).await.unwrap_or_default();
    let registry = state.registry.lock().await;
    Html(render_index(
        &registry,
        &saves,
        params.status.as_deref(),
        params.kind.as_deref(),
    ))
}

// ---- JSON API ----

pub async fn get_tabs(State(state): State<AppState>) -> Json<TabsResponse> {
    let registry = state.registry.lock().await;
    Json(TabsResponse {
        selected: registry.selected_id(),
        tabs: registry
            .iter()
            .map(|(id, collection)| TabView::of(id, collection))
            .collect(),
    })
}

pub async fn get_saves(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(storage::list_saves(&state.save_dir).await?))
}

pub async fn create_tab(
    State(state): State<AppState>,
    Json(payload): Json<NewTabRequest>,
) -> Result<Json<TabView>, AppError> {
    let view = apply_create_tab(&state, payload.name).await?;
    Ok(Json(view))
}

pub async fn load_tab(
    State(state): State<AppState>,
    Json(payload): Json<LoadTabRequest>,
) -> Result<Json<TabView>, AppError> {
    let view = apply_load_tab(&state, &payload.file).await?;
    Ok(Json(view))
}

pub async fn select_tab(
    State(state): State<AppState>,
    Path(id): Path<TabId>,
) -> Result<Json<TabView>, AppError> {
    let view = apply_select_tab(&state, id).await?;
    Ok(Json(view))
}

pub async fn save_tab(
    State(state): State<AppState>,
    Path(id): Path<TabId>,
) -> Result<Json<SavedResponse>, AppError> {
    let saved = apply_save_tab(&state, id).await?;
    Ok(Json(saved))
}

pub async fn save_selected_tab(
    State(state): State<AppState>,
) -> Result<Json<SavedResponse>, AppError> {
    let id = selected_tab_id(&state).await?;
    let saved = apply_save_tab(&state, id).await?;
    Ok(Json(saved))
}

pub async fn remove_tab(
    State(state): State<AppState>,
    Path(id): Path<TabId>,
) -> Result<Json<RemovedResponse>, AppError> {
    let removed = apply_remove_tab(&state, id).await?;
    Ok(Json(removed))
}

pub async fn add_counter(
    State(state): State<AppState>,
    Path(id): Path<TabId>,
    Json(payload): Json<NewCounterRequest>,
) -> Result<Json<TabView>, AppError> {
    let view = apply_add_counter(&state, id, payload.name).await?;
    Ok(Json(view))
}

pub async fn increment_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
) -> Result<Json<CounterView>, AppError> {
    let view = apply_counter_op(&state, id, index, CounterOp::Increment).await?;
    Ok(Json(view))
}

pub async fn decrement_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
) -> Result<Json<CounterView>, AppError> {
    let view = apply_counter_op(&state, id, index, CounterOp::Decrement).await?;
    Ok(Json(view))
}

pub async fn obtain_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
) -> Result<Json<CounterView>, AppError> {
    let view = apply_counter_op(&state, id, index, CounterOp::Obtain).await?;
    Ok(Json(view))
}

pub async fn rename_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
    Json(payload): Json<RenameCounterRequest>,
) -> Result<Json<CounterView>, AppError> {
    let view = apply_counter_op(&state, id, index, CounterOp::Rename(payload.name)).await?;
    Ok(Json(view))
}

// ---- Form posts (no-JS path), redirecting back to the page ----

pub async fn form_create_tab(
    State(state): State<AppState>,
    axum::Form(payload): axum::Form<NewTabRequest>,
) -> Redirect {
    match apply_create_tab(&state, payload.name).await {
        Ok(view) => ok_redirect(&format!("Created tab '{}'.", view.name)),
        Err(err) => err_redirect(&err),
    }
}

pub async fn form_load_tab(
    State(state): State<AppState>,
    axum::Form(payload): axum::Form<LoadTabRequest>,
) -> Redirect {
    match apply_load_tab(&state, &payload.file).await {
        Ok(view) => ok_redirect(&format!("Loaded tab '{}'.", view.name)),
        Err(err) => err_redirect(&err),
    }
}

pub async fn form_select_tab(State(state): State<AppState>, Path(id): Path<TabId>) -> Redirect {
    match apply_select_tab(&state, id).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => err_redirect(&err),
    }
}

pub async fn form_save_selected(State(state): State<AppState>) -> Redirect {
    let result = match selected_tab_id(&state).await {
        Ok(id) => apply_save_tab(&state, id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(saved) => ok_redirect(&format!("Tab '{}' saved to file.", saved.tab_name)),
        Err(err) => err_redirect(&err),
    }
}

pub async fn form_remove_tab(State(state): State<AppState>, Path(id): Path<TabId>) -> Redirect {
    match apply_remove_tab(&state, id).await {
        Ok(removed) => {
            if let Some(warning) = removed.warning {
                warn_redirect(&warning)
            } else {
                ok_redirect(&format!("Removed tab '{}'.", removed.tab_name))
            }
        }
        Err(err) => err_redirect(&err),
    }
}

pub async fn form_add_counter(State(state): State<AppState>, Path(id): Path<TabId>) -> Redirect {
    match apply_add_counter(&state, id, None).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => err_redirect(&err),
    }
}

pub async fn form_increment_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
) -> Redirect {
    counter_op_redirect(&state, id, index, CounterOp::Increment).await
}

pub async fn form_decrement_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
) -> Redirect {
    counter_op_redirect(&state, id, index, CounterOp::Decrement).await
}

pub async fn form_obtain_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
) -> Redirect {
    counter_op_redirect(&state, id, index, CounterOp::Obtain).await
}

pub async fn form_rename_counter(
    State(state): State<AppState>,
    Path((id, index)): Path<(TabId, usize)>,
    axum::Form(payload): axum::Form<RenameCounterRequest>,
) -> Redirect {
    counter_op_redirect(&state, id, index, CounterOp::Rename(payload.name)).await
}

async fn counter_op_redirect(
    state: &AppState,
    id: TabId,
    index: usize,
    op: CounterOp,
) -> Redirect {
    match apply_counter_op(state, id, index, op).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => err_redirect(&err),
    }
}

// ---- Shared core ops ----

enum CounterOp {
    Increment,
    Decrement,
    Obtain,
    Rename(String),
}

async fn apply_create_tab(state: &AppState, name: String) -> Result<TabView, AppError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("tab name must not be empty"));
    }

    let mut registry = state.registry.lock().await;
    let id = registry.insert(crate::models::Collection::new(name));
    let collection = registry
        .get(id)
        .ok_or_else(|| AppError::not_found("tab vanished after insert"))?;
    Ok(TabView::of(id, collection))
}

async fn apply_load_tab(state: &AppState, file: &str) -> Result<TabView, AppError> {
    let path = storage::resolve_save_file(&state.save_dir, file)?;
    let document = storage::load_document(&path).await?;

    let mut registry = state.registry.lock().await;
    if let Some(existing) = registry.find_by_name(&document.tab_name) {
        registry.select(existing);
        return Err(AppError::conflict(format!(
            "The tab '{}' is already open.",
            document.tab_name
        )));
    }

    let id = registry.insert(crate::models::Collection::from_document(document));
    let collection = registry
        .get(id)
        .ok_or_else(|| AppError::not_found("tab vanished after load"))?;
    Ok(TabView::of(id, collection))
}

async fn apply_select_tab(state: &AppState, id: TabId) -> Result<TabView, AppError> {
    let mut registry = state.registry.lock().await;
    if !registry.select(id) {
        return Err(AppError::not_found(format!("no tab with id {id}")));
    }
    let collection = registry
        .get(id)
        .ok_or_else(|| AppError::not_found(format!("no tab with id {id}")))?;
    Ok(TabView::of(id, collection))
}

async fn selected_tab_id(state: &AppState) -> Result<TabId, AppError> {
    let registry = state.registry.lock().await;
    registry
        .selected_id()
        .ok_or_else(|| AppError::bad_request("No tab is selected."))
}

async fn apply_save_tab(state: &AppState, id: TabId) -> Result<SavedResponse, AppError> {
    let registry = state.registry.lock().await;
    let collection = registry
        .get(id)
        .ok_or_else(|| AppError::not_found(format!("no tab with id {id}")))?;
    let path = storage::save_tab(&state.save_dir, collection).await?;
    Ok(SavedResponse {
        tab_name: collection.name.clone(),
        file: path.display().to_string(),
    })
}

/// Removes the tab from the registry and deletes its save file. File
/// deletion is best-effort: a failure is reported, but the tab is still
/// dropped from the open set.
async fn apply_remove_tab(state: &AppState, id: TabId) -> Result<RemovedResponse, AppError> {
    let mut registry = state.registry.lock().await;
    let collection = registry
        .remove(id)
        .ok_or_else(|| AppError::not_found(format!("no tab with id {id}")))?;

    match storage::delete_save(&state.save_dir, &collection.name).await {
        Ok(deleted) => Ok(RemovedResponse {
            tab_name: collection.name,
            file_deleted: deleted,
            warning: None,
        }),
        Err(err) => {
            warn!("could not delete save file for '{}': {err}", collection.name);
            Ok(RemovedResponse {
                warning: Some(format!(
                    "Removed tab '{}', but its save file could not be deleted: {err}",
                    collection.name
                )),
                tab_name: collection.name,
                file_deleted: false,
            })
        }
    }
}

async fn apply_add_counter(
    state: &AppState,
    id: TabId,
    name: Option<String>,
) -> Result<TabView, AppError> {
    let label = name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTER_LABEL.to_string());

    let mut registry = state.registry.lock().await;
    let collection = registry
        .get_mut(id)
        .ok_or_else(|| AppError::not_found(format!("no tab with id {id}")))?;
    collection.add_counter(label);
    Ok(TabView::of(id, collection))
}

async fn apply_counter_op(
    state: &AppState,
    id: TabId,
    index: usize,
    op: CounterOp,
) -> Result<CounterView, AppError> {
    let mut registry = state.registry.lock().await;
    let collection = registry
        .get_mut(id)
        .ok_or_else(|| AppError::not_found(format!("no tab with id {id}")))?;
    let counter = collection
        .counters
        .get_mut(index)
        .ok_or_else(|| AppError::not_found(format!("no counter at index {index}")))?;

    match op {
        CounterOp::Increment => counter.increment(),
        CounterOp::Decrement => counter.decrement(),
        CounterOp::Obtain => {
            if counter.is_locked() {
                return Err(AppError::conflict("counter is already locked"));
            }
            counter.lock();
        }
        CounterOp::Rename(name) => {
            if counter.is_locked() {
                return Err(AppError::bad_request("a locked counter cannot be renamed"));
            }
            counter.rename(name);
        }
    }

    Ok(CounterView::of(counter))
}

// ---- Redirect helpers ----

fn ok_redirect(message: &str) -> Redirect {
    status_redirect("ok", message)
}

fn warn_redirect(message: &str) -> Redirect {
    status_redirect("warn", message)
}

fn err_redirect(err: &AppError) -> Redirect {
    status_redirect("error", &err.message)
}

fn status_redirect(kind: &str, message: &str) -> Redirect {
    Redirect::to(&format!("/?kind={kind}&status={}", encode_query(message)))
}

fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
