use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Season(pub u16);

impl Season {
    /// The season `n` years before this one.
    pub fn prev(&self, n: u16) -> Season {
        Season(self.0.saturating_sub(n))
    }

    /// This season and the `n_seasons - 1` seasons before it, newest first.
    pub fn get_range(&self, n_seasons: u16) -> Vec<Season> {
        (0..n_seasons).map(|n| self.prev(n)).collect()
    }
}

impl FromStr for Season {
    type Err = ParseStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let year = s.strip_prefix("Season").unwrap_or(s);
        match year.parse::<u16>() {
            Ok(y) if (1992..=2100).contains(&y) => Ok(Season(y)),
            _ => Err(ParseStringError),
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Timed,
    InPlay,
    Paused,
    Finished,
    Postponed,
    Suspended,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl MatchStatus {
    pub fn is_finished(&self) -> bool {
        self == &MatchStatus::Finished
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(self, MatchStatus::Scheduled | MatchStatus::Timed)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    W,
    D,
    L,
}

impl Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Score {
    pub home: u8,
    pub away: u8,
}

impl Score {
    pub fn new(home: u8, away: u8) -> Score {
        Score { home, away }
    }

    /// Parses `"2 - 1"`. Unplayed games (`"None - None"`) give `None`.
    pub fn parse(s: &str) -> Option<Score> {
        let mut parts = s.split(" - ");
        let home = parts.next()?.trim().parse::<u8>().ok()?;
        let away = parts.next()?.trim().parse::<u8>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Score { home, away })
    }

    pub fn scored(&self, at_home: bool) -> u8 {
        if at_home { self.home } else { self.away }
    }

    pub fn conceded(&self, at_home: bool) -> u8 {
        if at_home { self.away } else { self.home }
    }

    pub fn goal_diff_for(&self, at_home: bool) -> i16 {
        self.scored(at_home) as i16 - self.conceded(at_home) as i16
    }

    pub fn result_for(&self, at_home: bool) -> MatchResult {
        match self.goal_diff_for(at_home) {
            d if d > 0 => MatchResult::W,
            0 => MatchResult::D,
            _ => MatchResult::L,
        }
    }

    pub fn points_for(&self, at_home: bool) -> u16 {
        match self.result_for(at_home) {
            MatchResult::W => 3,
            MatchResult::D => 1,
            MatchResult::L => 0,
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseStringError;

impl Display for ParseStringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not parse string")
    }
}

pub type TeamName = String;
