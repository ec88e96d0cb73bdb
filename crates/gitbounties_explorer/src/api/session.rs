//! A bounty list view per client session. Every UI event of the list is a route.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use gitbounties_listing::{
    BountyListView, Facet, FetchTicket, FilterCriteria, Intersection, SearchMode, SortOrder,
    ViewSnapshot,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::{
    session::{new_session_id, new_view, run_fetches, Session},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:id", get(show).delete(close))
        .route("/:id/search", post(search))
        .route("/:id/mode", post(mode))
        .route("/:id/tags", post(add_tag))
        .route("/:id/tags/:tag", delete(remove_tag))
        .route("/:id/facets/:facet", post(toggle_facet))
        .route("/:id/criteria", post(criteria))
        .route("/:id/sort", post(sort))
        .route("/:id/scroll", post(scroll))
}

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    id: String,
    view: ViewSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeBody {
    pub mode: SearchMode,
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
    /// Falls back to the text typed in tag mode when empty
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct SortBody {
    pub order: SortOrder,
}

/// Apply one event to the view of session `id`, then run whatever fetches it asked for
async fn apply<F>(state: &AppState, id: &str, event: F) -> Result<Json<ViewSnapshot>, ApiError>
where
    F: FnOnce(&mut BountyListView) -> Option<FetchTicket>,
{
    let ticket = {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(id).ok_or_else(|| ApiError::not_found(id))?;
        session.touch();
        event(&mut session.view)
    };

    run_fetches(state, id, ticket).await;
    snapshot(state, id).await.map(Json)
}

async fn snapshot(state: &AppState, id: &str) -> Result<ViewSnapshot, ApiError> {
    state
        .sessions
        .read()
        .await
        .get(id)
        .map(|session| session.view.snapshot())
        .ok_or_else(|| ApiError::not_found(id))
}

/// Open a new list view and load its first page
pub async fn create(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreatedSession>), ApiError> {
    let id = new_session_id();
    let mut view = new_view(state.page_size);
    let ticket = view.load();

    state
        .sessions
        .write()
        .await
        .insert(id.clone(), Session::new(view));
    info!("Opened session {id}");

    run_fetches(&state, &id, ticket).await;
    let view = snapshot(&state, &id).await?;

    Ok((StatusCode::CREATED, Json(CreatedSession { id, view })))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| ApiError::not_found(&id))?;
    session.touch();

    Ok(Json(session.view.snapshot()))
}

/// Tear down the view; fetches still running for it are discarded when they land
pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| ApiError::not_found(&id))?;
    info!("Closed session {id}");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SearchBody>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.set_search_text(&payload.text)).await
}

pub async fn mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ModeBody>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.set_search_mode(payload.mode)).await
}

pub async fn add_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TagBody>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.add_tag(&payload.tag)).await
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Path((id, tag)): Path<(String, String)>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.remove_tag(&tag)).await
}

pub async fn toggle_facet(
    State(state): State<AppState>,
    Path((id, facet)): Path<(String, String)>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    let facet: Facet = facet.parse().map_err(ApiError::bad_request)?;
    debug!("[session {id}] toggle {facet:?}");

    apply(&state, &id, |view| view.toggle_facet(facet)).await
}

pub async fn criteria(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FilterCriteria>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.set_criteria(payload)).await
}

pub async fn sort(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SortBody>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.sort(payload.order)).await
}

/// Sentinel visibility report
pub async fn scroll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Intersection>,
) -> Result<Json<ViewSnapshot>, ApiError> {
    apply(&state, &id, |view| view.sentinel_visible(&payload)).await
}
