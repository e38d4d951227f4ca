use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use pl_dashboard_rs::{
    models::{MatchStatus, Season},
    models_external::{
        matches::{ExtMatch, ExtScore, ExtTeam, FullTime, MatchesRsp},
        standings::{ExtStandingRow, ExtStandingTable, StandingsRsp},
    },
};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::{sync::RwLock, task::JoinHandle};

pub const TEAMS: [&str; 4] = ["Arsenal FC", "Chelsea FC", "Liverpool FC", "Everton FC"];

/// Double round robin of the four teams, home sides swap after matchday 3.
const ROUNDS: [[(usize, usize); 2]; 3] = [
    [(0, 1), (2, 3)],
    [(0, 2), (1, 3)],
    [(0, 3), (1, 2)],
];

#[derive(Deserialize)]
struct SeasonQuery {
    season: u16,
}

#[derive(Default)]
pub struct AppState {
    pub matches: HashMap<Season, MatchesRsp>,
    pub standings: HashMap<Season, StandingsRsp>,
    pub auth_tokens: Vec<String>,
}

pub type SafeState = Arc<RwLock<AppState>>;

fn team(name: &str) -> ExtTeam {
    ExtTeam { name: name.to_string(), crestUrl: Some(format!("https://crests.test/{}.png", name.replace(' ', "_"))) }
}

/// A season with the first `played` matchdays finished, the rest scheduled a week apart from `first_kickoff`.
pub fn season_matches(first_kickoff: DateTime<Utc>, played: u8) -> MatchesRsp {
    let mut matches = vec![];
    for matchday in 1..=6u8 {
        let round = ROUNDS[((matchday - 1) % 3) as usize];
        for (i, (home, away)) in round.iter().enumerate() {
            let (home, away) = if matchday > 3 { (*away, *home) } else { (*home, *away) };
            let finished = matchday <= played;
            let score = if finished {
                ExtScore {
                    winner: None,
                    fullTime: FullTime {
                        homeTeam: Some(((home * 2 + matchday as usize + i) % 4) as u8),
                        awayTeam: Some(((away + matchday as usize) % 3) as u8),
                    },
                }
            } else {
                ExtScore::default()
            };
            matches.push(ExtMatch {
                utcDate: first_kickoff + chrono::Duration::days(7 * (matchday as i64 - 1)),
                status: if finished { MatchStatus::Finished } else { MatchStatus::Scheduled },
                matchday,
                homeTeam: team(TEAMS[home]),
                awayTeam: team(TEAMS[away]),
                score,
            });
        }
    }
    MatchesRsp { matches }
}

/// TOTAL table listing the teams in the given order with the given points.
pub fn total_table(rows: &[(&str, u16)]) -> StandingsRsp {
    let table = rows.iter()
        .enumerate()
        .map(|(i, (name, points))| ExtStandingRow {
            position: i as u8 + 1,
            team: team(name),
            playedGames: 6,
            won: points / 3,
            draw: points % 3,
            lost: 6 - points / 3 - points % 3,
            points: *points,
            goalsFor: *points,
            goalsAgainst: 6,
            goalDifference: *points as i16 - 6,
        })
        .collect();
    StandingsRsp {
        standings: vec![
            ExtStandingTable { table_type: "HOME".to_string(), table: vec![] },
            ExtStandingTable { table_type: "TOTAL".to_string(), table },
        ],
    }
}

pub struct ExternalServer {
    port: u16,
    handles: Vec<JoinHandle<()>>,
    pub state: SafeState,
}

impl Drop for ExternalServer {
    fn drop(&mut self) {
        for e in &self.handles {
            e.abort();
        }
    }
}

impl ExternalServer {
    pub fn new(port: u16) -> ExternalServer {
        ExternalServer { port, handles: vec![], state: Arc::new(RwLock::new(AppState::default())) }
    }

    pub async fn start(&mut self) {
        let external_mock = {
            let port = self.port;
            let state = self.state.clone();
            tokio::spawn(async move { ExternalServer::serve_external_data(state, port).await })
        };
        self.handles.push(external_mock);

        tokio::time::sleep(Duration::from_secs(1)).await; // wait for mock to start
    }

    pub async fn add_season(&self, season: Season, matches: MatchesRsp) {
        let mut state = self.state.write().await;
        state.matches.insert(season, matches);
        state.standings.insert(season, StandingsRsp::default());
    }

    pub async fn set_standings(&self, season: Season, standings: StandingsRsp) {
        self.state.write().await.standings.insert(season, standings);
    }

    pub fn get_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    async fn serve_external_data(state: SafeState, port: u16) {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let app = Router::new()
            .route("/competitions/PL/matches", get(ExternalServer::get_matches))
            .route("/competitions/PL/standings", get(ExternalServer::get_standings))
            .with_state(state);

        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await
            .unwrap();
    }

    async fn record_token(state: &SafeState, headers: &HeaderMap) {
        if let Some(token) = headers.get("X-Auth-Token").and_then(|e| e.to_str().ok()) {
            state.write().await.auth_tokens.push(token.to_string());
        }
    }

    async fn get_matches(query: Query<SeasonQuery>, headers: HeaderMap, State(state): State<SafeState>) -> impl IntoResponse {
        ExternalServer::record_token(&state, &headers).await;
        match state.read().await.matches.get(&Season(query.season)) {
            Some(rsp) => Ok(Json(rsp.clone())),
            None => Err((StatusCode::NOT_FOUND, format!("No matches for {}", query.season))),
        }
    }

    async fn get_standings(query: Query<SeasonQuery>, headers: HeaderMap, State(state): State<SafeState>) -> impl IntoResponse {
        ExternalServer::record_token(&state, &headers).await;
        match state.read().await.standings.get(&Season(query.season)) {
            Some(rsp) => Ok(Json(rsp.clone())),
            None => Err((StatusCode::NOT_FOUND, format!("No standings for {}", query.season))),
        }
    }
}
