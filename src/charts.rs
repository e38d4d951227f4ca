use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{data_service::DashboardData, models::ParseStringError, team_names};

const DEFAULT_MARKER_SIZE: f64 = 14.0;
const BIG_MARKER_SIZE: f64 = 26.0;
const CLEAN_SHEET_LINE: f64 = 0.5;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Fixtures,
    Form,
    Position,
    Goals,
    CleanSheets,
    GoalFrequency,
    Scorelines,
}

impl FromStr for ChartKind {
    type Err = ParseStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixtures" => Ok(ChartKind::Fixtures),
            "form" => Ok(ChartKind::Form),
            "position" => Ok(ChartKind::Position),
            "goals" => Ok(ChartKind::Goals),
            "clean-sheets" => Ok(ChartKind::CleanSheets),
            "goal-frequency" => Ok(ChartKind::GoalFrequency),
            "scorelines" => Ok(ChartKind::Scorelines),
            _ => Err(ParseStringError),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum X {
    Date(DateTime<Utc>),
    Num(f64),
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub name: String,
    pub x: Vec<X>,
    pub y: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marker_size: Vec<f64>,
}

impl Series {
    fn new(name: &str) -> Series {
        Series { name: name.to_string(), ..Default::default() }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub series: Vec<Series>,
}

pub fn get_chart(data: &DashboardData, team: &str, kind: ChartKind, now: DateTime<Utc>) -> Chart {
    let series = match kind {
        ChartKind::Fixtures => vec![fixtures_difficulty(data, team, now)],
        ChartKind::Form => form_over_time(data),
        ChartKind::Position => position_over_time(data),
        ChartKind::Goals => goals_scored_and_conceded(data, team),
        ChartKind::CleanSheets => clean_sheets(data, team),
        ChartKind::GoalFrequency => goal_frequency(data, team),
        ChartKind::Scorelines => vec![scoreline_frequency(data)],
    };
    Chart { kind, series }
}

/// Opponent strength of every game of the season, the next game enlarged.
pub fn fixtures_difficulty(data: &DashboardData, team: &str, now: DateTime<Utc>) -> Series {
    let mut fixtures = data.fixtures.team_fixtures(team);
    fixtures.sort_by_key(|e| e.date);

    let mut series = Series::new(team);
    let mut prev_date: Option<DateTime<Utc>> = None;
    for fixture in fixtures {
        let mut rating = data.team_ratings.get_or_zero(&fixture.opponent);
        if fixture.at_home {
            rating *= 1.0 - data.home_advantages.get_or_zero(&fixture.opponent);
        }
        let opponent = team_names::to_initials(&fixture.opponent);
        let text = match fixture.score {
            Some(score) => format!("{opponent} ({})  {score}", fixture.home_away()),
            None => format!("{opponent} ({})", fixture.home_away()),
        };
        let is_next = now < fixture.date && prev_date.map(|e| e <= now).unwrap_or(true);

        series.x.push(X::Date(fixture.date));
        series.y.push(Some(rating * 100.0));
        series.text.push(text);
        series.marker_size.push(if is_next { BIG_MARKER_SIZE } else { DEFAULT_MARKER_SIZE });
        prev_date = Some(fixture.date);
    }
    series
}

fn median_dates(data: &DashboardData, matchdays: &[u8]) -> Vec<X> {
    matchdays.iter()
        .filter_map(|md| data.fixtures.matchday_median_date(*md))
        .map(X::Date)
        .collect()
}

/// One series per team, form rating in percent at each played matchday.
pub fn form_over_time(data: &DashboardData) -> Vec<Series> {
    let matchdays = &data.form.matchdays;
    let x = median_dates(data, matchdays);
    data.team_names.iter()
        .map(|team| {
            let ratings: BTreeMap<u8, f64> = data.form.rating_over_time(team).into_iter().collect();
            Series {
                name: team.clone(),
                x: x.clone(),
                y: matchdays.iter().map(|md| ratings.get(md).cloned()).collect(),
                ..Default::default()
            }
        })
        .collect()
}

pub fn position_over_time(data: &DashboardData) -> Vec<Series> {
    let matchdays = &data.position_over_time.matchdays;
    let x = median_dates(data, matchdays);
    data.team_names.iter()
        .map(|team| {
            let positions: BTreeMap<u8, u8> = data.position_over_time.positions(team).into_iter().collect();
            Series {
                name: team.clone(),
                x: x.clone(),
                y: matchdays.iter().map(|md| positions.get(md).map(|e| *e as f64)).collect(),
                ..Default::default()
            }
        })
        .collect()
}

/// Mean goals scored per team in the matchday's finished games.
fn matchday_average_goals(data: &DashboardData, matchday: u8) -> Option<f64> {
    let goals: Vec<u8> = data.fixtures.teams.values()
        .filter_map(|e| e.get(&matchday))
        .filter_map(|e| e.score.map(|s| s.scored(e.at_home)))
        .collect();
    if goals.is_empty() {
        return None;
    }
    Some(goals.iter().map(|e| *e as f64).sum::<f64>() / goals.len() as f64)
}

/// Goals scored, conceded and the league average per played game of the team.
pub fn goals_scored_and_conceded(data: &DashboardData, team: &str) -> Vec<Series> {
    let mut scored = Series::new("Goals Scored");
    let mut conceded = Series::new("Goals Conceded");
    let mut average = Series::new("Avg");

    for fixture in data.fixtures.team_games_by_date(team) {
        let Some(score) = fixture.score else { continue };
        let x = X::Date(fixture.date);
        scored.x.push(x.clone());
        scored.y.push(Some(score.scored(fixture.at_home) as f64));
        conceded.x.push(x.clone());
        conceded.y.push(Some(score.conceded(fixture.at_home) as f64));
        average.x.push(x);
        average.y.push(matchday_average_goals(data, fixture.matchday));
    }
    vec![scored, conceded, average]
}

pub fn clean_sheets(data: &DashboardData, team: &str) -> Vec<Series> {
    let mut line = Series::new("Line");
    let mut clean = Series::new("Clean sheet");
    let mut not_clean = Series::new("Goals conceded");

    for fixture in data.fixtures.team_games_by_date(team) {
        let Some(score) = fixture.score else { continue };
        let is_clean = score.conceded(fixture.at_home) == 0;
        let x = X::Date(fixture.date);
        let label = if is_clean { "Clean sheet" } else { "Goals conceded" };

        line.x.push(x.clone());
        line.y.push(Some(CLEAN_SHEET_LINE));
        clean.x.push(x.clone());
        clean.y.push(is_clean.then_some(CLEAN_SHEET_LINE));
        clean.text.push(label.to_string());
        not_clean.x.push(x);
        not_clean.y.push((!is_clean).then_some(CLEAN_SHEET_LINE));
        not_clean.text.push(label.to_string());
    }
    vec![line, clean, not_clean]
}

fn frequencies(counts: &[u32]) -> Vec<Option<f64>> {
    let total: u32 = counts.iter().sum();
    counts.iter()
        .map(|e| Some(if total == 0 { 0.0 } else { *e as f64 / total as f64 }))
        .collect()
}

/// Share of games with each number of goals, for the team and the league.
pub fn goal_frequency(data: &DashboardData, team: &str) -> Vec<Series> {
    let games = data.fixtures.team_games_by_date(team);
    let league: Vec<u8> = data.fixtures.teams.values()
        .flat_map(|e| e.values())
        .filter_map(|e| e.score.map(|s| s.scored(e.at_home)))
        .collect();
    let team_scored: Vec<u8> = games.iter().filter_map(|e| e.score.map(|s| s.scored(e.at_home))).collect();
    let team_conceded: Vec<u8> = games.iter().filter_map(|e| e.score.map(|s| s.conceded(e.at_home))).collect();

    let max = league.iter().chain(team_scored.iter()).chain(team_conceded.iter()).cloned().max().unwrap_or(0) as usize;
    let bins = |goals: &[u8]| {
        let mut counts = vec![0u32; max + 1];
        for g in goals {
            counts[*g as usize] += 1;
        }
        frequencies(&counts)
    };
    let x: Vec<X> = (0..=max).map(|e| X::Num(e as f64)).collect();

    [("Scored", bins(&team_scored)), ("Conceded", bins(&team_conceded)), ("League", bins(&league))]
        .into_iter()
        .map(|(name, y)| Series { name: name.to_string(), x: x.clone(), y, ..Default::default() })
        .collect()
}

/// Number of times each final score happened this season, home goals on x.
pub fn scoreline_frequency(data: &DashboardData) -> Series {
    let mut counts = BTreeMap::<(u8, u8), u32>::new();
    for fixtures in data.fixtures.teams.values() {
        for fixture in fixtures.values().filter(|e| e.at_home) {
            if let Some(score) = fixture.score {
                *counts.entry((score.home, score.away)).or_default() += 1;
            }
        }
    }

    let mut series = Series::new("Scorelines");
    for ((home, away), count) in counts {
        series.x.push(X::Num(home as f64));
        series.y.push(Some(away as f64));
        series.text.push(format!("{home} - {away}: {count}"));
        series.marker_size.push(count as f64);
    }
    series
}
