use std::{collections::BTreeMap, time::Instant};

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{fixtures_service::Fixtures, models::{Score, TeamName}, standing_service::Standings};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionEntry {
    pub matchday: u8,
    pub date: Option<DateTime<Utc>>,
    pub score: Option<Score>,
    pub at_home: Option<bool>,
    pub gd: i16,
    pub points: u16,
    pub cum_gd: i16,
    pub cum_points: u16,
    pub position: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PositionOverTime {
    pub matchdays: Vec<u8>,
    pub teams: BTreeMap<TeamName, BTreeMap<u8, PositionEntry>>,
}

impl PositionOverTime {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, team: &str, matchday: u8) -> Option<&PositionEntry> {
        self.teams.get(team).and_then(|e| e.get(&matchday))
    }

    pub fn positions(&self, team: &str) -> Vec<(u8, u8)> {
        self.teams.get(team)
            .map(|e| e.values().map(|p| (p.matchday, p.position)).collect())
            .unwrap_or_default()
    }
}

pub struct PositionOverTimeService;

impl PositionOverTimeService {
    pub fn build(fixtures: &Fixtures, standings: &Standings) -> anyhow::Result<PositionOverTime> {
        let before = Instant::now();
        if fixtures.is_empty() {
            bail!("Cannot build position over time: fixtures empty");
        }

        let matchdays = fixtures.played_matchdays();
        let mut teams = BTreeMap::<TeamName, BTreeMap<u8, PositionEntry>>::new();
        let mut totals = BTreeMap::<TeamName, (i16, u16)>::new();

        for (i, matchday) in matchdays.iter().enumerate() {
            let mut rows: Vec<(TeamName, PositionEntry)> = fixtures.teams.keys()
                .map(|team| {
                    let fixture = fixtures.get(team, *matchday);
                    let score = fixture.and_then(|f| f.score);
                    let at_home = fixture.map(|f| f.at_home);
                    let (gd, points) = match (score, at_home) {
                        (Some(s), Some(h)) => (s.goal_diff_for(h), s.points_for(h)),
                        _ => (0, 0),
                    };
                    let total = totals.entry(team.clone()).or_default();
                    total.0 += gd;
                    total.1 += points;
                    (team.clone(), PositionEntry {
                        matchday: *matchday,
                        date: fixture.map(|f| f.date),
                        score,
                        at_home,
                        gd,
                        points,
                        cum_gd: total.0,
                        cum_points: total.1,
                        position: 0,
                    })
                })
                .collect();

            rows.sort_by(|(a_team, a), (b_team, b)| {
                b.cum_points.cmp(&a.cum_points)
                    .then(b.cum_gd.cmp(&a.cum_gd))
                    .then(a_team.cmp(b_team))
            });
            let is_last = i + 1 == matchdays.len();
            for (idx, (team, mut entry)) in rows.into_iter().enumerate() {
                let tallied = u8::try_from(idx + 1).unwrap_or(u8::MAX);
                entry.position = if is_last {
                    standings.current_season
                        .and_then(|season| standings.position(&team, &season))
                        .unwrap_or(tallied)
                } else {
                    tallied
                };
                teams.entry(team).or_default().insert(*matchday, entry);
            }
        }

        log::info!("[POSITION] Built {} matchdays {:.2?}", matchdays.len(), before.elapsed());
        Ok(PositionOverTime { matchdays, teams })
    }
}
