use std::time::Instant;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{models::{Season, TeamName}, standing_service::Standings};

const LEAGUE_SIZE: f64 = 20.0;
const RECENT_SEASON_WEIGHT: f64 = 2.5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamRating {
    pub team: TeamName,
    /// Raw rating per season, index 0 is the current season.
    pub ratings: Vec<f64>,
    pub normalised: Vec<f64>,
    pub total: f64,
}

/// Long term strength of each team, strongest first.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TeamRatings {
    pub rows: Vec<TeamRating>,
    pub include_current_season: bool,
}

impl TeamRatings {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.rows.iter().find(|e| e.team == team).map(|e| e.total)
    }

    pub fn get_or_zero(&self, team: &str) -> f64 {
        self.get(team).unwrap_or_default()
    }

    pub fn top_rating(&self) -> f64 {
        self.rows.iter().map(|e| e.total).fold(0.0, f64::max)
    }
}

pub struct TeamRatingsService;

impl TeamRatingsService {
    pub fn calc_rating(position: u8, points: u16, gd: i16) -> f64 {
        let mut rating = (LEAGUE_SIZE - position as f64) / 2.0;
        if gd != 0 {
            rating *= gd as f64;
        }
        if points != 0 {
            rating *= points as f64;
        }
        rating
    }

    /// Weights for the `n_seasons` most recent seasons, newest first, summing to 1.
    pub fn season_weights(n_seasons: usize) -> Vec<f64> {
        let weights: Vec<f64> = (0..n_seasons)
            .map(|i| 0.01 * RECENT_SEASON_WEIGHT.powi(3 - i as i32))
            .collect();
        let sum: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / sum).collect()
    }

    fn normalise(values: &[f64]) -> Vec<f64> {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max - min == 0.0 || !min.is_finite() {
            return vec![0.0; values.len()];
        }
        values.iter().map(|v| (v - min) / (max - min)).collect()
    }

    pub fn build(standings: &Standings, current_season: Season, n_seasons: u16, games_threshold: u16) -> anyhow::Result<TeamRatings> {
        let before = Instant::now();
        let current_table = standings.table(&current_season);
        if current_table.is_empty() {
            bail!("Cannot build team ratings: standings empty");
        }
        let teams: Vec<TeamName> = current_table.iter().map(|e| e.team.clone()).collect();
        let n_seasons = n_seasons as usize;

        // [season][team]
        let columns: Vec<Vec<f64>> = (0..n_seasons)
            .map(|n| {
                let season = current_season.prev(n as u16);
                let column: Vec<Option<f64>> = teams.iter()
                    .map(|team| standings.row(team, &season)
                        .map(|e| TeamRatingsService::calc_rating(e.position, e.points, e.gd)))
                    .collect();
                let min = column.iter().flatten().cloned().fold(f64::INFINITY, f64::min);
                let min = if min.is_finite() { min } else { 0.0 };
                column.into_iter().map(|e| e.unwrap_or(min)).collect()
            })
            .collect();
        let normalised: Vec<Vec<f64>> = columns.iter().map(|e| TeamRatingsService::normalise(e)).collect();

        let include_current_season = !current_table.iter().all(|e| e.played <= games_threshold);
        if !include_current_season {
            log::info!("[RATINGS] Current season excluded, all teams must have played {games_threshold} games");
        }
        let start = if include_current_season { 0 } else { 1 };
        let weights = TeamRatingsService::season_weights(n_seasons.saturating_sub(start));

        let mut rows: Vec<TeamRating> = teams.iter()
            .enumerate()
            .map(|(i, team)| {
                let total = (start..n_seasons)
                    .map(|n| weights[n - start] * normalised[n][i])
                    .sum();
                TeamRating {
                    team: team.clone(),
                    ratings: columns.iter().map(|e| e[i]).collect(),
                    normalised: normalised.iter().map(|e| e[i]).collect(),
                    total,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.total.total_cmp(&a.total));

        log::info!("[RATINGS] Built {} teams {:.2?}", rows.len(), before.elapsed());
        Ok(TeamRatings { rows, include_current_season })
    }
}


#[cfg(test)]
mod tests {
    use crate::models::Season;
    use crate::standing_service::{StandingRow, StandingService};

    use super::TeamRatingsService;

    fn row(team: &str, position: u8, played: u16, points: u16, gd: i16) -> StandingRow {
        StandingRow { team: team.to_string(), position, played, points, gd, ..Default::default() }
    }

    #[test]
    fn test_calc_rating() {
        assert_eq!(TeamRatingsService::calc_rating(1, 90, 60), 9.5 * 60.0 * 90.0);
        assert_eq!(TeamRatingsService::calc_rating(10, 0, 0), 5.0);
        assert_eq!(TeamRatingsService::calc_rating(18, 30, -30), -900.0);
    }

    #[test]
    fn test_season_weights() {
        let weights = TeamRatingsService::season_weights(3);
        assert_eq!(weights.len(), 3);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(weights[0] > weights[1] && weights[1] > weights[2]);
        assert!((weights[0] / weights[1] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_ratings_promoted_team_gets_column_minimum() {
        // Given - "New" was not in the league last season
        let current = vec![row("Top", 1, 10, 25, 15), row("Mid", 2, 10, 15, 2), row("New", 3, 10, 5, -17)];
        let last = vec![row("Top", 1, 38, 90, 50), row("Mid", 10, 38, 50, 0)];
        let standings = StandingService::build(Season(2021), vec![(Season(2021), current), (Season(2020), last)]);

        // When
        let ratings = TeamRatingsService::build(&standings, Season(2021), 2, 4).unwrap();

        // Then
        assert!(ratings.include_current_season);
        assert_eq!(ratings.rows[0].team, "Top");
        assert!((ratings.rows[0].total - 1.0).abs() < 1e-9);
        let new = ratings.rows.iter().find(|e| e.team == "New").unwrap();
        let mid = ratings.rows.iter().find(|e| e.team == "Mid").unwrap();
        assert_eq!(new.ratings[1], mid.ratings[1]);
        assert_eq!(new.total, 0.0);
        assert_eq!(ratings.top_rating(), ratings.rows[0].total);
    }

    #[test]
    fn test_current_season_excluded_early() {
        // Given - nobody has played more than the threshold
        let current = vec![row("A", 1, 2, 6, 4), row("B", 2, 2, 0, -4)];
        let last = vec![row("B", 1, 38, 80, 40), row("A", 2, 38, 40, 0)];
        let standings = StandingService::build(Season(2021), vec![(Season(2021), current), (Season(2020), last)]);

        // When
        let ratings = TeamRatingsService::build(&standings, Season(2021), 2, 4).unwrap();

        // Then - only last season counts
        assert!(!ratings.include_current_season);
        assert_eq!(ratings.rows[0].team, "B");
        assert_eq!(ratings.get("B"), Some(1.0));
        assert_eq!(ratings.get("A"), Some(0.0));
    }

    #[test]
    fn test_empty_standings_is_error() {
        let standings = StandingService::build(Season(2021), vec![]);
        assert!(TeamRatingsService::build(&standings, Season(2021), 3, 4).is_err());
    }
}
