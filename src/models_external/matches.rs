use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MatchStatus, Score};
use crate::team_names;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtTeam {
    pub name: String,
    #[serde(default)]
    pub crestUrl: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FullTime {
    pub homeTeam: Option<u8>,
    pub awayTeam: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExtScore {
    pub winner: Option<String>,
    #[serde(default)]
    pub fullTime: FullTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtMatch {
    pub utcDate: DateTime<Utc>,
    pub status: MatchStatus,
    pub matchday: u8,
    pub homeTeam: ExtTeam,
    pub awayTeam: ExtTeam,
    #[serde(default)]
    pub score: ExtScore,
}

impl ExtMatch {
    pub fn home_name(&self) -> String {
        team_names::clean(&self.homeTeam.name)
    }

    pub fn away_name(&self) -> String {
        team_names::clean(&self.awayTeam.name)
    }

    /// Full time score, only present once the match is finished.
    pub fn get_score(&self) -> Option<Score> {
        if !self.status.is_finished() {
            return None;
        }
        match (self.score.fullTime.homeTeam, self.score.fullTime.awayTeam) {
            (Some(home), Some(away)) => Some(Score::new(home, away)),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MatchesRsp {
    pub matches: Vec<ExtMatch>,
}
