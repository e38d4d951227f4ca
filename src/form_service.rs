use std::{collections::BTreeMap, time::Instant};

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{fixtures_service::{Fixture, Fixtures}, models::{MatchResult, Score, TeamName}, team_names, team_ratings_service::TeamRatings};

const FORM_GAMES: usize = 5;
const LONG_TERM_FORM_GAMES: usize = 10;
const MAX_DAYS_FROM_MEDIAN: i64 = 14;

/// A team's last five games as of one matchday, plus the ten game rating.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub matchday: u8,
    pub date: DateTime<Utc>,
    /// Whether the team's own game of this matchday has been played.
    pub played: bool,
    pub teams_played: Vec<String>,
    pub scores: Vec<Score>,
    pub at_home: Vec<bool>,
    /// `W`, `D` or `L`, oldest first.
    pub form: String,
    pub gds: Vec<i16>,
    pub rating: f64,
    pub won_against_star_team: Vec<bool>,
    #[serde(default)]
    pub form_long_term: String,
    #[serde(default)]
    pub rating_long_term: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecentForm {
    pub form: Vec<String>,
    pub teams_played: Vec<String>,
    pub rating: f64,
    #[serde(default)]
    pub rating_long_term: f64,
    pub won_against_star_team: Vec<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Form {
    pub matchdays: Vec<u8>,
    pub teams: BTreeMap<TeamName, BTreeMap<u8, FormEntry>>,
}

impl Form {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn current_matchday(&self) -> Option<u8> {
        self.matchdays.last().cloned()
    }

    pub fn prev_matchday(&self) -> Option<u8> {
        self.matchdays.iter().rev().nth(1).cloned()
    }

    pub fn get(&self, team: &str, matchday: u8) -> Option<&FormEntry> {
        self.teams.get(team).and_then(|e| e.get(&matchday))
    }

    /// Rating in percent at each matchday the team has a form entry for.
    pub fn rating_over_time(&self, team: &str) -> Vec<(u8, f64)> {
        self.teams.get(team)
            .map(|e| e.values().map(|f| (f.matchday, round_1dp(f.rating * 100.0))).collect())
            .unwrap_or_default()
    }

    pub fn recent_form(&self, team: &str) -> RecentForm {
        let current = self.current_matchday().and_then(|md| self.get(team, md));
        let entry = match current {
            Some(e) if e.played => Some(e),
            _ => self.prev_matchday().and_then(|md| self.get(team, md)).or(current),
        };

        match entry {
            Some(e) => {
                let mut form: Vec<String> = vec!["None".to_string(); FORM_GAMES.saturating_sub(e.form.len())];
                form.extend(e.form.chars().map(|c| c.to_string()));
                RecentForm {
                    form,
                    teams_played: e.teams_played.clone(),
                    rating: round_1dp(e.rating * 100.0),
                    rating_long_term: round_1dp(e.rating_long_term * 100.0),
                    won_against_star_team: e.won_against_star_team.clone(),
                }
            },
            None => RecentForm {
                form: vec!["None".to_string(); FORM_GAMES],
                teams_played: vec![],
                rating: 0.0,
                rating_long_term: 0.0,
                won_against_star_team: vec![],
            },
        }
    }
}

pub fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub struct FormService;

impl FormService {
    /// The team's own game date for the matchday, or the matchday's median
    /// date when the game was moved far from the rest of the round.
    fn reference_date(fixtures: &Fixtures, team: &str, matchday: u8, median: DateTime<Utc>) -> DateTime<Utc> {
        match fixtures.get(team, matchday) {
            Some(f) if (f.date - median).num_days().abs() <= MAX_DAYS_FROM_MEDIAN => f.date,
            _ => median,
        }
    }

    fn last_games<'a, 'b>(games: &'a [&'b Fixture], n_games: usize) -> &'a [&'b Fixture] {
        &games[games.len().saturating_sub(n_games)..]
    }

    /// Rating over the last `n_games` of `games`.
    pub fn calc_rating(games: &[&Fixture], n_games: usize, ratings: &TeamRatings) -> f64 {
        let games = FormService::last_games(games, n_games);
        let top_rating = ratings.top_rating();
        let n_played = games.len() as f64;
        let rating = games.iter()
            .filter_map(|g| g.score.map(|s| (g, s)))
            .fold(0.5, |rating, (g, score)| {
                let opp_rating = ratings.get_or_zero(&g.opponent);
                let gd = score.goal_diff_for(g.at_home).abs() as f64;
                match score.result_for(g.at_home) {
                    MatchResult::W => rating + opp_rating / n_played * gd,
                    MatchResult::L => rating - (top_rating - opp_rating) / n_played * gd,
                    MatchResult::D => rating,
                }
            });
        rating.clamp(0.0, 1.0)
    }

    fn form_entry(
        fixtures: &Fixtures,
        ratings: &TeamRatings,
        team: &str,
        matchday: u8,
        median: DateTime<Utc>,
        n_games: usize,
        star_team_threshold: f64,
    ) -> Option<FormEntry> {
        let reference = FormService::reference_date(fixtures, team, matchday, median);
        let games: Vec<&Fixture> = fixtures.team_games_by_date(team).into_iter()
            .filter(|e| e.date <= reference)
            .collect();
        let window = FormService::last_games(&games, n_games);
        let long_term = FormService::last_games(&games, LONG_TERM_FORM_GAMES.max(n_games));
        if window.is_empty() {
            return None;
        }

        let mut entry = FormEntry {
            matchday,
            date: reference,
            played: fixtures.get(team, matchday).map(|e| e.is_played()).unwrap_or(false),
            teams_played: vec![],
            scores: vec![],
            at_home: vec![],
            form: String::new(),
            gds: vec![],
            rating: FormService::calc_rating(window, n_games, ratings),
            won_against_star_team: vec![],
            form_long_term: long_term.iter()
                .filter_map(|g| g.score.map(|s| s.result_for(g.at_home).to_string()))
                .collect(),
            rating_long_term: FormService::calc_rating(long_term, LONG_TERM_FORM_GAMES.max(n_games), ratings),
        };
        for game in window {
            let Some(score) = game.score else { continue };
            let result = score.result_for(game.at_home);
            entry.teams_played.push(team_names::to_initials(&game.opponent));
            entry.scores.push(score);
            entry.at_home.push(game.at_home);
            entry.form.push_str(&result.to_string());
            entry.gds.push(score.goal_diff_for(game.at_home));
            entry.won_against_star_team.push(
                result == MatchResult::W && ratings.get_or_zero(&game.opponent) > star_team_threshold);
        }
        Some(entry)
    }

    pub fn build(fixtures: &Fixtures, ratings: &TeamRatings, star_team_threshold: f64) -> anyhow::Result<Form> {
        let before = Instant::now();
        if fixtures.is_empty() {
            bail!("Cannot build form: fixtures empty");
        }
        if ratings.is_empty() {
            bail!("Cannot build form: team ratings empty");
        }

        let matchdays = fixtures.played_matchdays();
        let mut teams = BTreeMap::<TeamName, BTreeMap<u8, FormEntry>>::new();
        for matchday in &matchdays {
            let Some(median) = fixtures.matchday_median_date(*matchday) else { continue };
            for team in fixtures.teams.keys() {
                if let Some(entry) = FormService::form_entry(fixtures, ratings, team, *matchday, median, FORM_GAMES, star_team_threshold) {
                    teams.entry(team.clone()).or_default().insert(*matchday, entry);
                }
            }
        }

        log::info!("[FORM] Built {} matchdays {:.2?}", matchdays.len(), before.elapsed());
        Ok(Form { matchdays, teams })
    }
}
