use std::{collections::{BTreeMap, HashMap}, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{models::{MatchResult, Season, TeamName}, models_external::matches::ExtMatch};

/// Season played without crowds, home advantage was neutral.
const SEASON_WITHOUT_FANS: Season = Season(2020);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Record {
    pub wins: u16,
    pub draws: u16,
    pub losses: u16,
}

impl Record {
    pub fn played(&self) -> u16 {
        self.wins + self.draws + self.losses
    }

    fn add(&mut self, result: MatchResult) {
        match result {
            MatchResult::W => self.wins += 1,
            MatchResult::D => self.draws += 1,
            MatchResult::L => self.losses += 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SeasonHomeAdvantage {
    pub home: Record,
    pub away: Record,
    pub home_win_ratio: Option<f64>,
    pub win_ratio: Option<f64>,
    /// Home win ratio minus overall win ratio.
    pub advantage: Option<f64>,
}

impl SeasonHomeAdvantage {
    fn calc(home: Record, away: Record) -> SeasonHomeAdvantage {
        let home_played = home.played();
        let played = home_played + away.played();
        let home_win_ratio = (home_played > 0).then(|| home.wins as f64 / home_played as f64);
        let win_ratio = (played > 0).then(|| (home.wins + away.wins) as f64 / played as f64);
        let advantage = match (home_win_ratio, win_ratio) {
            (Some(h), Some(w)) => Some(h - w),
            _ => None,
        };
        SeasonHomeAdvantage { home, away, home_win_ratio, win_ratio, advantage }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HomeAdvantage {
    pub team: TeamName,
    pub seasons: BTreeMap<Season, SeasonHomeAdvantage>,
    pub total: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HomeAdvantages {
    pub rows: Vec<HomeAdvantage>,
}

impl HomeAdvantages {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.rows.iter().find(|e| e.team == team).map(|e| e.total)
    }

    pub fn get_or_zero(&self, team: &str) -> f64 {
        self.get(team).unwrap_or_default()
    }
}

pub struct HomeAdvantageService;

impl HomeAdvantageService {
    fn season_records(matches: &[ExtMatch]) -> HashMap<TeamName, (Record, Record)> {
        let mut records = HashMap::<TeamName, (Record, Record)>::new();
        for m in matches {
            if let Some(score) = m.get_score() {
                records.entry(m.home_name()).or_default().0.add(score.result_for(true));
                records.entry(m.away_name()).or_default().1.add(score.result_for(false));
            }
        }
        records
    }

    pub fn build(
        seasons: &[(Season, &[ExtMatch])],
        current_teams: &[TeamName],
        current_season: Season,
        home_games_threshold: u16,
    ) -> HomeAdvantages {
        let before = Instant::now();
        let records: Vec<(Season, HashMap<TeamName, (Record, Record)>)> = seasons.iter()
            .map(|(season, matches)| (*season, HomeAdvantageService::season_records(matches)))
            .collect();

        let current_too_early = records.iter()
            .find(|(season, _)| season == &current_season)
            .map(|(_, r)| current_teams.iter()
                .all(|team| r.get(team).map(|e| e.0.played()).unwrap_or(0) <= home_games_threshold))
            .unwrap_or(true);
        if current_too_early {
            log::info!("[HOME] Current season excluded, all teams must have played {home_games_threshold} home games");
        }

        let mut rows: Vec<HomeAdvantage> = current_teams.iter()
            .map(|team| {
                let seasons: BTreeMap<Season, SeasonHomeAdvantage> = records.iter()
                    .map(|(season, r)| {
                        let (home, away) = r.get(team).cloned().unwrap_or_default();
                        (*season, SeasonHomeAdvantage::calc(home, away))
                    })
                    .collect();
                let included: Vec<f64> = seasons.iter()
                    .filter(|(season, _)| !(current_too_early && **season == current_season))
                    .filter(|(season, _)| **season != SEASON_WITHOUT_FANS)
                    .filter_map(|(_, e)| e.advantage)
                    .collect();
                let total = if included.is_empty() {
                    0.0
                } else {
                    included.iter().sum::<f64>() / included.len() as f64
                };
                HomeAdvantage { team: team.clone(), seasons, total }
            })
            .collect();
        rows.sort_by(|a, b| b.total.total_cmp(&a.total));

        log::info!("[HOME] Built {} teams {:.2?}", rows.len(), before.elapsed());
        HomeAdvantages { rows }
    }
}
