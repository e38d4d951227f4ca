use std::{collections::{BTreeMap, HashSet}, time::Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{
    db::Db,
    fixtures_service::Fixtures,
    form_service::Form,
    home_advantage_service::HomeAdvantages,
    models::{Score, Season, TeamName},
    season_stats_service::SeasonStats,
    team_names,
    upcoming_service::{PrevMatch, Upcoming},
};

pub const PREV_MATCH_AVERAGE: &str = "Previous match average";
pub const SEASON_GOALS_PER_GAME: &str = "Season goals per game";
const FORM_WEIGHT: f64 = 0.5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StartingPoint {
    pub description: String,
    pub home_goals: f64,
    pub away_goals: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "description")]
pub enum Adjustment {
    #[serde(rename = "Form")]
    Form { home_form_rating: f64, away_form_rating: f64, home_goals: f64, away_goals: f64 },
    #[serde(rename = "Home advantage")]
    HomeAdvantage { home_advantage: f64, home_goals: f64, away_goals: f64 },
}

/// How a predicted score was reached.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Details {
    pub starting: StartingPoint,
    pub adjustments: Vec<Adjustment>,
    pub score: Score,
}

impl Details {
    pub fn form_ratings(&self) -> Option<(f64, f64)> {
        self.adjustments.iter().find_map(|e| match e {
            Adjustment::Form { home_form_rating, away_form_rating, .. } => Some((*home_form_rating, *away_form_rating)),
            _ => None,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub date: DateTime<Utc>,
    pub home_initials: String,
    pub away_initials: String,
    pub prediction: Score,
    pub details: Details,
}

impl NewPrediction {
    pub fn scoreline(&self) -> String {
        format!("{} {} - {} {}", self.home_initials, self.prediction.home, self.prediction.away, self.away_initials)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub id: u32,
    pub time: String,
    pub home_initials: String,
    pub away_initials: String,
    pub prediction: Score,
    pub actual: Option<Score>,
    pub details: Option<Details>,
}

/// Every prediction of a season, keyed by match date (`YYYY-MM-DD`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PredictionBook {
    pub predictions: BTreeMap<String, Vec<PredictionRecord>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Accuracy {
    pub total: u32,
    pub accuracy: f64,
    pub result_accuracy: f64,
    /// Positive when predicting too many home goals.
    pub home_scored_avg_diff: f64,
    pub away_scored_avg_diff: f64,
}

/// Result accuracy had the outcome been called by a simpler rule.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub by_form: f64,
    pub by_prev_matches: f64,
    pub by_home_team: f64,
    pub by_away_team: f64,
    pub by_draw: f64,
}

fn date_key(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn ratio(count: u32, total: u32) -> f64 {
    if total == 0 { 0.0 } else { count as f64 / total as f64 }
}

impl PredictionBook {
    fn records(&self) -> impl Iterator<Item = &PredictionRecord> {
        self.predictions.values().flatten()
    }

    fn max_id(&self) -> u32 {
        self.records().map(|e| e.id).max().unwrap_or(0)
    }

    /// Returns true if a new record was added.
    pub fn insert(&mut self, new: &NewPrediction) -> bool {
        let records = self.predictions.entry(date_key(&new.date)).or_default();
        let existing = records.iter_mut()
            .find(|e| e.home_initials == new.home_initials && e.away_initials == new.away_initials);
        if let Some(existing) = existing {
            if existing.actual.is_none() && existing.prediction != new.prediction {
                log::info!("[PREDICTIONS] Updating {} {} -> {}", new.home_initials, existing.prediction, new.prediction);
                existing.prediction = new.prediction;
                existing.details = Some(new.details.clone());
            }
            return false;
        }

        let id = self.max_id() + 1;
        log::info!("[PREDICTIONS] Adding {}", new.scoreline());
        self.predictions.entry(date_key(&new.date)).or_default().push(PredictionRecord {
            id,
            time: new.date.format("%H:%M").to_string(),
            home_initials: new.home_initials.clone(),
            away_initials: new.away_initials.clone(),
            prediction: new.prediction,
            actual: None,
            details: Some(new.details.clone()),
        });
        true
    }

    /// Returns true if a pending record got its result.
    pub fn insert_actual(&mut self, date: &DateTime<Utc>, home_initials: &str, away_initials: &str, actual: Score) -> bool {
        let Some(records) = self.predictions.get_mut(&date_key(date)) else { return false };
        match records.iter_mut().find(|e| e.home_initials == home_initials && e.away_initials == away_initials && e.actual.is_none()) {
            Some(record) => {
                record.actual = Some(actual);
                true
            },
            None => false,
        }
    }

    pub fn sort(&mut self) {
        for records in self.predictions.values_mut() {
            records.sort_by(|a, b| a.time.cmp(&b.time));
        }
    }

    pub fn accuracy(&self) -> Accuracy {
        let finished: Vec<(&Score, &Score)> = self.records()
            .filter_map(|e| e.actual.as_ref().map(|a| (&e.prediction, a)))
            .collect();
        let total = finished.len() as u32;
        if total == 0 {
            return Accuracy::default();
        }

        let exact = finished.iter().filter(|(p, a)| p == a).count() as u32;
        let results = finished.iter()
            .filter(|(p, a)| team_names::identical_result(p.home, p.away, a.home, a.away))
            .count() as u32;
        let home_diff: i32 = finished.iter().map(|(p, a)| p.home as i32 - a.home as i32).sum();
        let away_diff: i32 = finished.iter().map(|(p, a)| p.away as i32 - a.away as i32).sum();

        Accuracy {
            total,
            accuracy: ratio(exact, total),
            result_accuracy: ratio(results, total),
            home_scored_avg_diff: home_diff as f64 / total as f64,
            away_scored_avg_diff: away_diff as f64 / total as f64,
        }
    }

    fn result_ratio<F: Fn(&PredictionRecord, &Score) -> Option<bool>>(&self, called: F) -> f64 {
        let (count, total) = self.records()
            .filter_map(|e| e.actual.as_ref().and_then(|a| called(e, a)))
            .fold((0, 0), |(count, total), hit| (count + hit as u32, total + 1));
        ratio(count, total)
    }

    pub fn analysis(&self) -> Analysis {
        Analysis {
            by_form: self.result_ratio(|e, a| {
                let (home, away) = e.details.as_ref()?.form_ratings()?;
                Some(team_names::identical_result(a.home as f64, a.away as f64, home, away))
            }),
            by_prev_matches: self.result_ratio(|e, a| {
                let starting = &e.details.as_ref()?.starting;
                if starting.description != PREV_MATCH_AVERAGE {
                    return None;
                }
                Some(team_names::identical_result(a.home as f64, a.away as f64, starting.home_goals, starting.away_goals))
            }),
            by_home_team: self.result_ratio(|_, a| Some(a.home > a.away)),
            by_away_team: self.result_ratio(|_, a| Some(a.home < a.away)),
            by_draw: self.result_ratio(|_, a| Some(a.home == a.away)),
        }
    }
}

/// Predicts upcoming games from the season tables.
pub struct Predictor<'a> {
    pub form: &'a Form,
    pub upcoming: &'a Upcoming,
    pub home_advantages: &'a HomeAdvantages,
    pub season_stats: &'a SeasonStats,
}

impl<'a> Predictor<'a> {
    fn starting_point(&self, home: &str, away: &str, prev_matches: &[PrevMatch]) -> StartingPoint {
        if prev_matches.is_empty() {
            let goals_per_game = |team: &str| self.season_stats.teams.get(team).map(|e| e.goals_per_game).unwrap_or_default();
            return StartingPoint {
                description: SEASON_GOALS_PER_GAME.to_string(),
                home_goals: goals_per_game(home),
                away_goals: goals_per_game(away),
            };
        }
        let (home_goals, away_goals) = prev_matches.iter()
            .map(|e| if e.home_team == home {
                (e.home_goals as f64, e.away_goals as f64)
            } else {
                (e.away_goals as f64, e.home_goals as f64)
            })
            .fold((0.0, 0.0), |(h, a), (eh, ea)| (h + eh, a + ea));
        let n = prev_matches.len() as f64;
        StartingPoint {
            description: PREV_MATCH_AVERAGE.to_string(),
            home_goals: home_goals / n,
            away_goals: away_goals / n,
        }
    }

    pub fn predict(&self, team: &str) -> Option<NewPrediction> {
        let next = self.upcoming.get(team)?;
        let (home, away) = if next.at_home {
            (team, next.opponent.as_str())
        } else {
            (next.opponent.as_str(), team)
        };

        let starting = self.starting_point(home, away, &next.prev_matches);
        let (mut home_goals, mut away_goals) = (starting.home_goals, starting.away_goals);
        let mut adjustments = vec![];

        let home_form_rating = self.form.recent_form(home).rating;
        let away_form_rating = self.form.recent_form(away).rating;
        let form_diff = (home_form_rating - away_form_rating) / 100.0;
        home_goals *= 1.0 + FORM_WEIGHT * form_diff;
        away_goals *= 1.0 - FORM_WEIGHT * form_diff;
        adjustments.push(Adjustment::Form { home_form_rating, away_form_rating, home_goals, away_goals });

        let home_advantage = self.home_advantages.get_or_zero(home);
        home_goals *= 1.0 + home_advantage;
        adjustments.push(Adjustment::HomeAdvantage { home_advantage, home_goals, away_goals });

        let to_goals = |v: f64| v.round().clamp(0.0, u8::MAX as f64) as u8;
        let score = Score::new(to_goals(home_goals), to_goals(away_goals));
        Some(NewPrediction {
            date: next.date,
            home_initials: team_names::to_initials(home),
            away_initials: team_names::to_initials(away),
            prediction: score,
            details: Details { starting, adjustments, score },
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Predictions {
    pub next: BTreeMap<TeamName, NewPrediction>,
    pub book: PredictionBook,
    pub accuracy: Accuracy,
    pub analysis: Analysis,
}

impl Predictions {
    pub fn is_empty(&self) -> bool {
        self.next.is_empty() && self.book.predictions.is_empty()
    }

    pub fn get(&self, team: &str) -> Option<&NewPrediction> {
        self.next.get(team)
    }
}

pub struct PredictionsService {
    db: Db<Season, PredictionBook>,
}

impl PredictionsService {
    pub fn new() -> PredictionsService {
        PredictionsService { db: Db::new("predictions") }
    }

    pub fn new_in(root: &str) -> PredictionsService {
        PredictionsService { db: Db::new_in(root, "predictions") }
    }

    pub fn read(&self, season: &Season) -> PredictionBook {
        self.db.read(season).unwrap_or_default()
    }

    /// Predicts every upcoming game, adds the predictions and any new results
    /// to the season's book and stores it.
    pub fn update(&self, season: &Season, fixtures: &Fixtures, predictor: &Predictor) -> Predictions {
        let before = Instant::now();

        let next: BTreeMap<TeamName, NewPrediction> = fixtures.teams.keys()
            .filter_map(|team| predictor.predict(team).map(|e| (team.clone(), e)))
            .collect();

        let mut book = self.read(season);
        let mut seen = HashSet::new();
        let added = next.values()
            .filter(|e| seen.insert((e.home_initials.clone(), e.away_initials.clone())))
            .filter(|e| book.insert(e))
            .count();

        let mut results = 0;
        for (team, team_fixtures) in &fixtures.teams {
            for fixture in team_fixtures.values().filter(|e| e.at_home) {
                if let Some(score) = fixture.score {
                    let home = team_names::to_initials(team);
                    let away = team_names::to_initials(&fixture.opponent);
                    if book.insert_actual(&fixture.date, &home, &away, score) {
                        results += 1;
                    }
                }
            }
        }
        book.sort();
        _ = self.db.write(season, &book);

        let accuracy = book.accuracy();
        let analysis = book.analysis();
        log::info!("[PREDICTIONS] Added {added}, results {results}, accuracy {:.2} result accuracy {:.2} {:.2?}",
            accuracy.accuracy, accuracy.result_accuracy, before.elapsed());
        Predictions { next, book, accuracy, analysis }
    }
}
