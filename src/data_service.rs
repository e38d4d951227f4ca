use std::{collections::BTreeMap, time::Instant};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::log;

use crate::{
    config_handler::Config,
    db::Db,
    fixtures_service::{Fixtures, FixturesService},
    form_service::{Form, FormService, RecentForm},
    home_advantage_service::{HomeAdvantageService, HomeAdvantages},
    models::{Season, TeamName},
    models_external::{matches::{ExtMatch, MatchesRsp}, standings::StandingsRsp},
    position_over_time_service::{PositionOverTime, PositionOverTimeService},
    predictions_service::{NewPrediction, Predictions, PredictionsService, Predictor},
    rest_client,
    season_stats_service::{RankedStat, SeasonStats, SeasonStatsService, Stat},
    standing_service::{StandingService, Standings, TableSnippet},
    team_names,
    team_ratings_service::{TeamRatings, TeamRatingsService},
    upcoming_service::{NextGame, Upcoming, UpcomingService},
};

const SNAPSHOT_KEY: &str = "latest";

/// Everything the dashboard shows, rebuilt on every refresh.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub last_updated: DateTime<Utc>,
    pub current_season: Season,
    pub team_names: Vec<TeamName>,
    pub logo_urls: BTreeMap<TeamName, String>,
    pub fixtures: Fixtures,
    pub standings: Standings,
    pub team_ratings: TeamRatings,
    pub home_advantages: HomeAdvantages,
    pub form: Form,
    pub position_over_time: PositionOverTime,
    pub upcoming: Upcoming,
    pub season_stats: SeasonStats,
    pub predictions: Predictions,
}

#[derive(Serialize, Debug, Clone)]
pub struct TeamSummary {
    pub team: TeamName,
    pub initials: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub position: Option<u8>,
    pub team_rating: f64,
    pub home_advantage: f64,
    pub form: RecentForm,
    pub table_snippet: Option<TableSnippet>,
    pub clean_sheet_ratio: Option<RankedStat>,
    pub goals_per_game: Option<RankedStat>,
    pub conceded_per_game: Option<RankedStat>,
    pub next_game: Option<NextGame>,
    pub prediction: Option<NewPrediction>,
}

impl DashboardData {
    pub fn find_team(&self, slug: &str) -> Option<&TeamName> {
        team_names::from_slug(slug, &self.team_names)
    }

    pub fn team_summary(&self, team: &str) -> Option<TeamSummary> {
        if !self.team_names.iter().any(|e| e == team) {
            return None;
        }
        Some(TeamSummary {
            team: team.to_string(),
            initials: team_names::to_initials(team),
            slug: team_names::slug(team),
            logo_url: self.logo_urls.get(team).cloned(),
            position: self.standings.position(team, &self.current_season),
            team_rating: self.team_ratings.get_or_zero(team),
            home_advantage: self.home_advantages.get_or_zero(team),
            form: self.form.recent_form(team),
            table_snippet: self.standings.table_snippet(team, &self.current_season),
            clean_sheet_ratio: self.season_stats.get_stat(team, Stat::CleanSheetRatio),
            goals_per_game: self.season_stats.get_stat(team, Stat::GoalsPerGame),
            conceded_per_game: self.season_stats.get_stat(team, Stat::ConcededPerGame),
            next_game: self.upcoming.get(team).cloned(),
            prediction: self.predictions.get(team).cloned(),
        })
    }
}

pub struct SeasonData {
    pub season: Season,
    pub matches: MatchesRsp,
    pub standings: StandingsRsp,
}

pub struct DataService;

impl DataService {
    fn logo_urls(matches: &[ExtMatch]) -> BTreeMap<TeamName, String> {
        matches.iter()
            .flat_map(|m| [(m.home_name(), &m.homeTeam.crestUrl), (m.away_name(), &m.awayTeam.crestUrl)])
            .filter_map(|(name, url)| url.as_ref().map(|e| (name, e.clone())))
            .collect()
    }

    /// Builds every table in dependency order from the fetched seasons.
    pub fn build(
        config: &Config,
        seasons: &[SeasonData],
        predictions_service: &PredictionsService,
        now: DateTime<Utc>,
    ) -> anyhow::Result<DashboardData> {
        let before = Instant::now();
        let current_season = config.current_season;
        let current = seasons.iter()
            .find(|e| e.season == current_season)
            .ok_or_else(|| anyhow!("Missing matches for current season {current_season}"))?;
        if current.matches.matches.is_empty() {
            bail!("No matches for current season {current_season}");
        }

        let fixtures = FixturesService::build(&current.matches.matches);
        let team_names = fixtures.team_names();
        let logo_urls = DataService::logo_urls(&current.matches.matches);

        let tables: Vec<(Season, Vec<_>)> = seasons.iter()
            .map(|e| {
                let rows = StandingService::season_standings(&e.standings, &team_names);
                let rows = if rows.is_empty() {
                    StandingService::season_standings_from_matches(&e.matches.matches, &team_names)
                } else {
                    rows
                };
                (e.season, rows)
            })
            .collect();
        let standings = StandingService::build(current_season, tables);

        let season_matches: Vec<(Season, &[ExtMatch])> = seasons.iter()
            .map(|e| (e.season, e.matches.matches.as_slice()))
            .collect();

        let team_ratings = TeamRatingsService::build(&standings, current_season, config.n_seasons, config.games_threshold)?;
        let home_advantages = HomeAdvantageService::build(&season_matches, &team_names, current_season, config.home_games_threshold);
        let form = FormService::build(&fixtures, &team_ratings, config.star_team_threshold)?;
        let position_over_time = PositionOverTimeService::build(&fixtures, &standings)?;
        let upcoming = UpcomingService::build(&fixtures, &season_matches)?;
        let season_stats = SeasonStatsService::build(&fixtures)?;
        let predictor = Predictor {
            form: &form,
            upcoming: &upcoming,
            home_advantages: &home_advantages,
            season_stats: &season_stats,
        };
        let predictions = predictions_service.update(&current_season, &fixtures, &predictor);

        log::info!("[DATA] Built dashboard {} teams {:.2?}", team_names.len(), before.elapsed());
        Ok(DashboardData {
            last_updated: now,
            current_season,
            team_names,
            logo_urls,
            fixtures,
            standings,
            team_ratings,
            home_advantages,
            form,
            position_over_time,
            upcoming,
            season_stats,
            predictions,
        })
    }

    async fn fetch_season(season: Season) -> anyhow::Result<SeasonData> {
        let (matches, standings) = futures::join!(
            rest_client::get_matches(&season),
            rest_client::get_standings(&season),
        );
        Ok(SeasonData {
            season,
            matches: matches.ok_or_else(|| anyhow!("Missing matches for {season}"))?,
            standings: standings.ok_or_else(|| anyhow!("Missing standings for {season}"))?,
        })
    }

    pub async fn update_all(config: &Config) -> anyhow::Result<DashboardData> {
        let before = Instant::now();
        let seasons = join_all(config.get_seasons().into_iter().map(DataService::fetch_season))
            .await
            .into_iter()
            .collect::<anyhow::Result<Vec<SeasonData>>>()?;
        log::info!("[DATA] Fetched {} seasons {:.2?}", seasons.len(), before.elapsed());

        DataService::build(config, &seasons, &PredictionsService::new(), Utc::now())
    }

    pub fn read_snapshot() -> Option<DashboardData> {
        Db::<String, DashboardData>::new("snapshot").read(&SNAPSHOT_KEY.to_string())
    }

    pub fn write_snapshot(data: &DashboardData) -> std::io::Result<()> {
        Db::<String, DashboardData>::new("snapshot").write(&SNAPSHOT_KEY.to_string(), data)
    }
}
