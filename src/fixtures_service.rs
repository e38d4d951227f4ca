use std::{collections::BTreeMap, time::Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{models::{MatchStatus, Score, TeamName}, models_external::matches::ExtMatch};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Fixture {
    pub matchday: u8,
    pub date: DateTime<Utc>,
    pub at_home: bool,
    pub opponent: TeamName,
    pub status: MatchStatus,
    pub score: Option<Score>,
}

impl Fixture {
    pub fn is_played(&self) -> bool {
        self.score.is_some()
    }

    pub fn home_away(&self) -> &'static str {
        if self.at_home { "Home" } else { "Away" }
    }
}

/// Every fixture of the season, per team and matchday.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Fixtures {
    pub teams: BTreeMap<TeamName, BTreeMap<u8, Fixture>>,
}

impl Fixtures {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn team_names(&self) -> Vec<TeamName> {
        self.teams.keys().cloned().collect()
    }

    pub fn get(&self, team: &str, matchday: u8) -> Option<&Fixture> {
        self.teams.get(team).and_then(|e| e.get(&matchday))
    }

    pub fn team_fixtures(&self, team: &str) -> Vec<&Fixture> {
        self.teams.get(team)
            .map(|e| e.values().collect())
            .unwrap_or_default()
    }

    /// Matchdays with at least one finished game, ascending.
    pub fn played_matchdays(&self) -> Vec<u8> {
        let mut matchdays: Vec<u8> = self.teams.values()
            .flat_map(|e| e.values())
            .filter(|e| e.is_played())
            .map(|e| e.matchday)
            .collect();
        matchdays.sort_unstable();
        matchdays.dedup();
        matchdays
    }

    /// Finished games of a team sorted by kick-off.
    pub fn team_games_by_date(&self, team: &str) -> Vec<&Fixture> {
        let mut games: Vec<&Fixture> = self.team_fixtures(team).into_iter()
            .filter(|e| e.is_played())
            .collect();
        games.sort_by_key(|e| e.date);
        games
    }

    /// Earliest game of the team still to be played.
    pub fn next_game(&self, team: &str) -> Option<&Fixture> {
        self.team_fixtures(team).into_iter()
            .filter(|e| e.status.is_upcoming())
            .min_by_key(|e| e.date)
    }

    pub fn matchday_median_date(&self, matchday: u8) -> Option<DateTime<Utc>> {
        let mut dates: Vec<DateTime<Utc>> = self.teams.values()
            .filter_map(|e| e.get(&matchday))
            .map(|e| e.date)
            .collect();
        if dates.is_empty() {
            return None;
        }
        dates.sort();
        Some(dates[(dates.len() - 1) / 2])
    }
}

pub struct FixturesService;

impl FixturesService {
    pub fn build(matches: &[ExtMatch]) -> Fixtures {
        let before = Instant::now();
        let mut teams = BTreeMap::<TeamName, BTreeMap<u8, Fixture>>::new();

        for m in matches {
            let (home, away) = (m.home_name(), m.away_name());
            let score = m.get_score();
            teams
                .entry(home.clone())
                .or_default()
                .insert(m.matchday, Fixture { matchday: m.matchday, date: m.utcDate, at_home: true, opponent: away.clone(), status: m.status, score });
            teams
                .entry(away)
                .or_default()
                .insert(m.matchday, Fixture { matchday: m.matchday, date: m.utcDate, at_home: false, opponent: home, status: m.status, score });
        }

        log::info!("[FIXTURES] Built {} teams from {} matches {:.2?}", teams.len(), matches.len(), before.elapsed());
        Fixtures { teams }
    }
}

#[cfg(test)]
pub mod test_data {
    use chrono::{Duration, TimeZone, Utc};

    use crate::models::MatchStatus;
    use crate::models_external::matches::{ExtMatch, ExtScore, ExtTeam, FullTime};

    pub fn ext_match(matchday: u8, home: &str, away: &str, score: Option<(u8, u8)>) -> ExtMatch {
        let kick_off = Utc.with_ymd_and_hms(2021, 8, 14, 15, 0, 0).unwrap() + Duration::days(7 * (matchday as i64 - 1));
        let (status, fullTime, winner) = match score {
            Some((h, a)) => {
                let winner = match h.cmp(&a) {
                    std::cmp::Ordering::Greater => "HOME_TEAM",
                    std::cmp::Ordering::Less => "AWAY_TEAM",
                    std::cmp::Ordering::Equal => "DRAW",
                };
                (MatchStatus::Finished, FullTime { homeTeam: Some(h), awayTeam: Some(a) }, Some(winner.to_string()))
            },
            None => (MatchStatus::Scheduled, FullTime::default(), None),
        };
        ExtMatch {
            utcDate: kick_off,
            status,
            matchday,
            homeTeam: ExtTeam { name: format!("{home} FC"), crestUrl: None },
            awayTeam: ExtTeam { name: format!("{away} FC"), crestUrl: None },
            score: ExtScore { winner, fullTime },
        }
    }

    /// Four teams, three played matchdays and one still to come.
    pub fn small_season() -> Vec<ExtMatch> {
        vec![
            ext_match(1, "Arsenal", "Chelsea", Some((2, 0))),
            ext_match(1, "Everton", "Liverpool", Some((1, 1))),
            ext_match(2, "Chelsea", "Everton", Some((3, 1))),
            ext_match(2, "Liverpool", "Arsenal", Some((0, 1))),
            ext_match(3, "Arsenal", "Everton", Some((0, 0))),
            ext_match(3, "Liverpool", "Chelsea", Some((4, 2))),
            ext_match(4, "Chelsea", "Arsenal", None),
            ext_match(4, "Everton", "Liverpool", None),
        ]
    }
}
