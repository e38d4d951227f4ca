use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::log;

use crate::{
    charts::{self, ChartKind},
    data_service::DashboardData,
    models::Season,
    pages::{self, Page},
    route_rank::{self, Route},
    store::SafeStore,
    team_names,
};

type ApiResult = Result<Response, (StatusCode, String)>;

#[derive(Clone)]
pub struct ApiState {
    pub store: SafeStore,
    pub pages: Arc<Vec<Route<Page>>>,
}

impl ApiState {
    pub fn new(store: SafeStore) -> ApiState {
        ApiState { store, pages: Arc::new(pages::routes()) }
    }

    fn snapshot(&self) -> Result<Arc<DashboardData>, (StatusCode, String)> {
        self.store.get().ok_or((StatusCode::SERVICE_UNAVAILABLE, "Data is loading".to_string()))
    }
}

#[derive(Serialize)]
struct TeamRef {
    name: String,
    initials: String,
    slug: String,
    logo_url: Option<String>,
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// Accepts a team slug or its full name.
fn find_team(data: &DashboardData, team: &str) -> Option<String> {
    data.find_team(team)
        .or_else(|| data.team_names.iter().find(|e| e.as_str() == team))
        .cloned()
}

pub struct Api;
impl Api {
    pub fn app(state: ApiState) -> Router {
        Router::new()
            .route("/api/data", axum::routing::get(Api::get_data))
            .route("/api/teams", axum::routing::get(Api::get_teams))
            .route("/api/team/:team", axum::routing::get(Api::get_team))
            .route("/api/standings/:season", axum::routing::get(Api::get_standings))
            .route("/api/charts/:team/:chart", axum::routing::get(Api::get_chart))
            .route("/api/predictions", axum::routing::get(Api::get_predictions))
            .route("/api/predictions/analysis", axum::routing::get(Api::get_analysis))
            .route("/health", axum::routing::get(Api::health))
            .fallback(Api::page)
            .with_state(state)
            .layer(ServiceBuilder::new()
                .layer(CompressionLayer::new())
            )
    }

    pub async fn serve(port: u16, store: SafeStore) {
        let app = Api::app(ApiState::new(store));
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        log::info!("[API] Listening on {}", addr);
        _ = axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await;
    }

    async fn health(State(state): State<ApiState>) -> impl IntoResponse {
        match state.store.get() {
            Some(data) => format!("ok {}", data.last_updated.to_rfc3339()),
            None => "loading".to_string(),
        }
    }

    async fn get_data(State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        Ok(Json(data.as_ref()).into_response())
    }

    async fn get_teams(State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        let teams: Vec<TeamRef> = data.team_names.iter()
            .map(|e| TeamRef {
                name: e.clone(),
                initials: team_names::to_initials(e),
                slug: team_names::slug(e),
                logo_url: data.logo_urls.get(e).cloned(),
            })
            .collect();
        Ok(Json(teams).into_response())
    }

    async fn get_team(Path(team): Path<String>, State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        let summary = find_team(&data, &team)
            .and_then(|e| data.team_summary(&e))
            .ok_or_else(|| not_found(&team))?;
        Ok(Json(summary).into_response())
    }

    async fn get_standings(Path(season): Path<String>, State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        let season: Season = season.parse().map_err(|_| not_found(&season))?;
        match data.standings.seasons.get(&season) {
            Some(table) => Ok(Json(table).into_response()),
            None => Err(not_found(&season.to_string())),
        }
    }

    async fn get_chart(Path((team, chart)): Path<(String, String)>, State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        let team = find_team(&data, &team).ok_or_else(|| not_found(&team))?;
        let kind: ChartKind = chart.parse().map_err(|_| not_found(&chart))?;
        Ok(Json(charts::get_chart(&data, &team, kind, Utc::now())).into_response())
    }

    async fn get_predictions(State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        Ok(Json(&data.predictions).into_response())
    }

    async fn get_analysis(State(state): State<ApiState>) -> ApiResult {
        let data = state.snapshot()?;
        Ok(Json(&data.predictions.analysis).into_response())
    }

    async fn page(State(state): State<ApiState>, uri: Uri) -> (StatusCode, Html<String>) {
        let path = uri.path();
        let matched = match route_rank::pick(&state.pages, path) {
            Ok(Some(m)) => m,
            Ok(None) => return (StatusCode::NOT_FOUND, Html(pages::not_found(path))),
            Err(e) => {
                log::error!("[API] Bad page route {path}: {e}");
                return (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::not_found(path)));
            },
        };
        let Some(data) = state.store.get() else {
            return (StatusCode::SERVICE_UNAVAILABLE, Html(pages::loading()));
        };

        match matched.route.value {
            Page::Home => (StatusCode::OK, Html(pages::home(&data))),
            Page::Predictions => (StatusCode::OK, Html(pages::predictions(&data))),
            Page::Team => matched.params.get("team")
                .and_then(|e| find_team(&data, e))
                .and_then(|e| pages::team(&data, &e))
                .map(|e| (StatusCode::OK, Html(e)))
                .unwrap_or_else(|| (StatusCode::NOT_FOUND, Html(pages::not_found(path)))),
        }
    }
}
