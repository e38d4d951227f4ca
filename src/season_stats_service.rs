use std::{collections::BTreeMap, time::Instant};

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{fixtures_service::Fixtures, models::TeamName, team_names};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    CleanSheetRatio,
    GoalsPerGame,
    ConcededPerGame,
}

impl Stat {
    fn higher_is_better(&self) -> bool {
        !matches!(self, Stat::ConcededPerGame)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TeamStats {
    pub played: u16,
    pub clean_sheet_ratio: f64,
    pub goals_per_game: f64,
    pub conceded_per_game: f64,
}

impl TeamStats {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::CleanSheetRatio => self.clean_sheet_ratio,
            Stat::GoalsPerGame => self.goals_per_game,
            Stat::ConcededPerGame => self.conceded_per_game,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RankedStat {
    pub value: f64,
    pub rank: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SeasonStats {
    pub teams: BTreeMap<TeamName, TeamStats>,
}

impl SeasonStats {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Value of the stat and the team's ordinal rank in the league, tied
    /// teams share a rank.
    pub fn get_stat(&self, team: &str, stat: Stat) -> Option<RankedStat> {
        let value = self.teams.get(team)?.get(stat);
        let better = self.teams.values()
            .map(|e| e.get(stat))
            .filter(|v| if stat.higher_is_better() { *v > value } else { *v < value })
            .count();
        Some(RankedStat { value, rank: team_names::ordinal(better + 1) })
    }
}

fn round_2dp(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub struct SeasonStatsService;

impl SeasonStatsService {
    pub fn build(fixtures: &Fixtures) -> anyhow::Result<SeasonStats> {
        let before = Instant::now();
        if fixtures.is_empty() {
            bail!("Cannot build season stats: fixtures empty");
        }

        let teams: BTreeMap<TeamName, TeamStats> = fixtures.teams.keys()
            .map(|team| {
                let (mut played, mut clean_sheets, mut scored, mut conceded) = (0u16, 0u16, 0u16, 0u16);
                for fixture in fixtures.team_fixtures(team) {
                    if let Some(score) = fixture.score {
                        played += 1;
                        scored += score.scored(fixture.at_home) as u16;
                        conceded += score.conceded(fixture.at_home) as u16;
                        if score.conceded(fixture.at_home) == 0 {
                            clean_sheets += 1;
                        }
                    }
                }
                let per_game = |n: u16| if played == 0 { 0.0 } else { round_2dp(n as f64 / played as f64) };
                (team.clone(), TeamStats {
                    played,
                    clean_sheet_ratio: per_game(clean_sheets),
                    goals_per_game: per_game(scored),
                    conceded_per_game: per_game(conceded),
                })
            })
            .collect();

        log::info!("[STATS] Built {} teams {:.2?}", teams.len(), before.elapsed());
        Ok(SeasonStats { teams })
    }
}
