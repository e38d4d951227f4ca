use std::{collections::BTreeMap, time::Instant};

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{fixtures_service::Fixtures, models::{MatchResult, Score, Season, TeamName}, models_external::matches::ExtMatch, team_names};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrevMatch {
    pub date: DateTime<Utc>,
    pub readable_date: String,
    pub home_team: TeamName,
    pub away_team: TeamName,
    pub home_goals: u8,
    pub away_goals: u8,
    pub result: String,
}

impl PrevMatch {
    pub fn score(&self) -> Score {
        Score::new(self.home_goals, self.away_goals)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NextGame {
    pub date: DateTime<Utc>,
    pub matchday: u8,
    pub opponent: TeamName,
    pub at_home: bool,
    pub prev_matches: Vec<PrevMatch>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Upcoming {
    pub teams: BTreeMap<TeamName, Option<NextGame>>,
}

impl Upcoming {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, team: &str) -> Option<&NextGame> {
        self.teams.get(team).and_then(|e| e.as_ref())
    }
}

fn result_word(result: MatchResult) -> &'static str {
    match result {
        MatchResult::W => "Won",
        MatchResult::D => "Drew",
        MatchResult::L => "Lost",
    }
}

pub struct UpcomingService;

impl UpcomingService {
    /// Finished meetings of the two teams in the given seasons, newest first,
    /// with the result seen from `team`.
    pub fn prev_matches(seasons: &[(Season, &[ExtMatch])], team: &str, opponent: &str) -> Vec<PrevMatch> {
        let mut prev: Vec<PrevMatch> = seasons.iter()
            .flat_map(|(_, matches)| matches.iter())
            .filter_map(|m| {
                let (home, away) = (m.home_name(), m.away_name());
                let at_home = if home == team && away == opponent {
                    true
                } else if home == opponent && away == team {
                    false
                } else {
                    return None;
                };
                let score = m.get_score()?;
                Some(PrevMatch {
                    date: m.utcDate,
                    readable_date: team_names::readable_date(&m.utcDate),
                    home_team: home,
                    away_team: away,
                    home_goals: score.home,
                    away_goals: score.away,
                    result: result_word(score.result_for(at_home)).to_string(),
                })
            })
            .collect();
        prev.sort_by(|a, b| b.date.cmp(&a.date));
        prev
    }

    pub fn build(fixtures: &Fixtures, seasons: &[(Season, &[ExtMatch])]) -> anyhow::Result<Upcoming> {
        let before = Instant::now();
        if fixtures.is_empty() {
            bail!("Cannot build upcoming: fixtures empty");
        }

        let teams: BTreeMap<TeamName, Option<NextGame>> = fixtures.teams.keys()
            .map(|team| {
                let next = fixtures.next_game(team).map(|f| NextGame {
                    date: f.date,
                    matchday: f.matchday,
                    opponent: f.opponent.clone(),
                    at_home: f.at_home,
                    prev_matches: UpcomingService::prev_matches(seasons, team, &f.opponent),
                });
                (team.clone(), next)
            })
            .collect();

        log::info!("[UPCOMING] Built {} teams {:.2?}", teams.len(), before.elapsed());
        Ok(Upcoming { teams })
    }
}
