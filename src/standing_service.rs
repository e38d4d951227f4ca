use std::{collections::{BTreeMap, HashMap}, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{models::{Season, TeamName}, models_external::{matches::ExtMatch, standings::StandingsRsp}, team_names};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct StandingRow {
    pub team: TeamName,
    pub position: u8,
    pub played: u16,
    pub won: u16,
    pub drawn: u16,
    pub lost: u16,
    pub gf: u16,
    pub ga: u16,
    pub gd: i16,
    pub points: u16,
}

impl StandingRow {
    fn new(team: &str) -> StandingRow {
        StandingRow { team: team.to_string(), ..Default::default() }
    }

    fn add_game(&mut self, scored: u8, conceded: u8) {
        self.played += 1;
        self.gf += scored as u16;
        self.ga += conceded as u16;
        self.gd = self.gf as i16 - self.ga as i16;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.won += 1;
                self.points += 3;
            },
            std::cmp::Ordering::Equal => {
                self.drawn += 1;
                self.points += 1;
            },
            std::cmp::Ordering::Less => self.lost += 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableSnippet {
    pub rows: Vec<StandingRow>,
    pub team_index: usize,
}

/// League tables of the current season and the seasons before it. Only teams
/// of the current season are kept; a team absent from an older season simply
/// has no row for it.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Standings {
    pub current_season: Option<Season>,
    pub seasons: BTreeMap<Season, Vec<StandingRow>>,
}

impl Standings {
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn table(&self, season: &Season) -> &[StandingRow] {
        self.seasons.get(season).map(|e| e.as_slice()).unwrap_or_default()
    }

    pub fn current_table(&self) -> &[StandingRow] {
        match &self.current_season {
            Some(season) => self.table(season),
            None => &[],
        }
    }

    pub fn row(&self, team: &str, season: &Season) -> Option<&StandingRow> {
        self.table(season).iter().find(|e| e.team == team)
    }

    pub fn position(&self, team: &str, season: &Season) -> Option<u8> {
        self.row(team, season).map(|e| e.position)
    }

    /// Seven rows around the team: three above and three below, shifted to
    /// stay inside the table near either end.
    pub fn table_snippet(&self, team: &str, season: &Season) -> Option<TableSnippet> {
        let table = self.table(season);
        let team_idx = table.iter().position(|e| e.team == team)? as i64;
        let n_rows = table.len() as i64;

        let mut low = team_idx - 3;
        let mut high = team_idx + 4;
        if low < 0 {
            high -= low;
            low = 0;
        }
        if high > n_rows {
            low -= high - n_rows;
            high = n_rows;
        }
        let low = low.max(0) as usize;
        let high = high as usize;

        Some(TableSnippet {
            rows: table[low..high].to_vec(),
            team_index: team_idx as usize - low,
        })
    }
}

pub struct StandingService;
impl StandingService {

    /// Table of the standings endpoint, restricted to the given teams.
    pub fn season_standings(rsp: &StandingsRsp, current_teams: &[TeamName]) -> Vec<StandingRow> {
        rsp.get_total()
            .map(|rows| rows.iter()
                .map(|e| StandingRow {
                    team: team_names::clean(&e.team.name),
                    position: e.position,
                    played: e.playedGames,
                    won: e.won,
                    drawn: e.draw,
                    lost: e.lost,
                    gf: e.goalsFor,
                    ga: e.goalsAgainst,
                    gd: e.goalDifference,
                    points: e.points,
                })
                .filter(|e| current_teams.contains(&e.team))
                .collect())
            .unwrap_or_default()
    }

    /// Table tallied from finished matches, ordered by points, goal difference
    /// and goals scored.
    pub fn season_standings_from_matches(matches: &[ExtMatch], current_teams: &[TeamName]) -> Vec<StandingRow> {
        let mut team_map = HashMap::<TeamName, StandingRow>::new();
        for m in matches {
            let (home, away) = (m.home_name(), m.away_name());
            team_map.entry(home.clone()).or_insert_with(|| StandingRow::new(&home));
            team_map.entry(away.clone()).or_insert_with(|| StandingRow::new(&away));

            if let Some(score) = m.get_score() {
                if let Some(row) = team_map.get_mut(&home) {
                    row.add_game(score.home, score.away);
                }
                if let Some(row) = team_map.get_mut(&away) {
                    row.add_game(score.away, score.home);
                }
            }
        }

        let mut all_teams: Vec<StandingRow> = team_map.into_values().collect();
        all_teams.sort_by(|a, b| {
            b.points.cmp(&a.points)
                .then(b.gd.cmp(&a.gd))
                .then(b.gf.cmp(&a.gf))
                .then(a.team.cmp(&b.team))
        });

        all_teams.into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                e.position = u8::try_from(i + 1).unwrap_or(u8::MAX);
                e
            })
            .filter(|e| current_teams.contains(&e.team))
            .collect()
    }

    pub fn build(current_season: Season, seasons: Vec<(Season, Vec<StandingRow>)>) -> Standings {
        let before = Instant::now();
        let seasons: BTreeMap<Season, Vec<StandingRow>> = seasons.into_iter()
            .map(|(season, mut rows)| {
                rows.sort_by_key(|e| e.position);
                (season, rows)
            })
            .collect();
        log::info!("[STANDING] Built {} seasons {:.2?}", seasons.len(), before.elapsed());
        Standings { current_season: Some(current_season), seasons }
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures_service::test_data;
    use crate::models::Season;
    use crate::models_external::standings::StandingsRsp;

    use super::{StandingRow, StandingService};

    fn row(team: &str, position: u8) -> StandingRow {
        StandingRow { team: team.to_string(), position, ..Default::default() }
    }

    #[test]
    fn test_standings_from_matches() {
        // Given
        let matches = test_data::small_season();
        let teams: Vec<String> = vec!["Arsenal", "Chelsea", "Everton", "Liverpool"].into_iter().map(String::from).collect();

        // When
        let table = StandingService::season_standings_from_matches(&matches, &teams);

        // Then - ARS 7pts, LIV 4pts +1, CHE 3pts -2, EVE 2pts -2
        let order: Vec<&str> = table.iter().map(|e| e.team.as_str()).collect();
        assert_eq!(order, vec!["Arsenal", "Liverpool", "Chelsea", "Everton"]);
        assert_eq!(table[0].points, 7);
        assert_eq!(table[0].played, 3);
        assert_eq!(table[0].won, 2);
        assert_eq!(table[0].drawn, 1);
        assert_eq!(table[0].gd, 3);
        assert_eq!(table[3].position, 4);
    }

    #[test]
    fn test_standings_from_endpoint() {
        // Given - HOME table listed before TOTAL, a renamed club and a relegated one
        let json = r#"{"standings": [
            {"type": "HOME", "table": [
                {"position": 1, "team": {"name": "Brighton & Hove Albion FC"}, "playedGames": 2, "won": 2, "draw": 0, "lost": 0, "points": 6, "goalsFor": 4, "goalsAgainst": 0, "goalDifference": 4}
            ]},
            {"type": "TOTAL", "table": [
                {"position": 1, "team": {"name": "Arsenal FC", "crestUrl": "https://crests.test/57.svg"}, "playedGames": 4, "won": 3, "draw": 0, "lost": 1, "points": 9, "goalsFor": 7, "goalsAgainst": 3, "goalDifference": 4},
                {"position": 2, "team": {"name": "Brighton & Hove Albion FC"}, "playedGames": 4, "won": 2, "draw": 0, "lost": 2, "points": 6, "goalsFor": 5, "goalsAgainst": 5, "goalDifference": 0},
                {"position": 3, "team": {"name": "Old FC"}, "playedGames": 4, "won": 0, "draw": 0, "lost": 4, "points": 0, "goalsFor": 1, "goalsAgainst": 9, "goalDifference": -8}
            ]}
        ]}"#;
        let rsp: StandingsRsp = serde_json::from_str(json).unwrap();
        let teams = vec!["Arsenal".to_string(), "Brighton and Hove Albion".to_string()];

        // When
        let table = StandingService::season_standings(&rsp, &teams);

        // Then - TOTAL table used, names cleaned, relegated team dropped
        let rows: Vec<(&str, u8, u16)> = table.iter().map(|e| (e.team.as_str(), e.position, e.points)).collect();
        assert_eq!(rows, vec![("Arsenal", 1, 9), ("Brighton and Hove Albion", 2, 6)]);
        assert_eq!(table[0].played, 4);
        assert_eq!(table[0].gd, 4);
        assert_eq!(table[1].lost, 2);
    }

    #[test]
    fn test_empty_endpoint_has_no_rows() {
        let table = StandingService::season_standings(&StandingsRsp::default(), &["Arsenal".to_string()]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_dropped_teams_keep_positions() {
        let matches = test_data::small_season();
        let teams = vec!["Chelsea".to_string()];
        let table = StandingService::season_standings_from_matches(&matches, &teams);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].position, 3);
    }

    #[test]
    fn test_table_snippet_windows() {
        // Given - a 20 team table
        let rows: Vec<StandingRow> = (1..=20).map(|i| row(&format!("Team{i}"), i)).collect();
        let standings = StandingService::build(Season(2021), vec![(Season(2021), rows)]);
        let season = Season(2021);

        // Then - middle of the table is centered
        let snippet = standings.table_snippet("Team10", &season).unwrap();
        assert_eq!(snippet.rows.len(), 7);
        assert_eq!(snippet.rows[0].position, 7);
        assert_eq!(snippet.team_index, 3);

        // Then - top of the table shifts down
        let snippet = standings.table_snippet("Team1", &season).unwrap();
        assert_eq!(snippet.rows[0].position, 1);
        assert_eq!(snippet.rows[6].position, 7);
        assert_eq!(snippet.team_index, 0);

        // Then - bottom of the table shifts up
        let snippet = standings.table_snippet("Team19", &season).unwrap();
        assert_eq!(snippet.rows[0].position, 14);
        assert_eq!(snippet.rows[6].position, 20);
        assert_eq!(snippet.team_index, 5);

        assert!(standings.table_snippet("Unknown", &season).is_none());
    }

    #[test]
    fn test_table_snippet_small_table() {
        let rows: Vec<StandingRow> = (1..=4).map(|i| row(&format!("Team{i}"), i)).collect();
        let standings = StandingService::build(Season(2021), vec![(Season(2021), rows)]);

        let snippet = standings.table_snippet("Team3", &Season(2021)).unwrap();
        assert_eq!(snippet.rows.len(), 4);
        assert_eq!(snippet.team_index, 2);
    }
}
