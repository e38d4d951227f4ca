use serde::{Deserialize, Serialize};
use std::fs;

use crate::models::Season;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub port: u16,

    pub football_data_url: String,
    pub api_key: String,

    #[serde(default="default_db_path")]
    pub db_path: String,

    #[serde(default="default_current_season")]
    pub current_season: Season,

    #[serde(default="default_n_seasons")]
    pub n_seasons: u16,

    #[serde(default="default_star_team_threshold")]
    pub star_team_threshold: f64,

    #[serde(default="default_games_threshold")]
    pub games_threshold: u16,

    #[serde(default="default_home_games_threshold")]
    pub home_games_threshold: u16,

    #[serde(default="default_update_interval_s")]
    pub update_interval_s: u64,

    #[serde(default="default_throttle_s")]
    pub throttle_s: u64,
}

fn default_db_path() -> String {
    "./db".to_string()
}

fn default_current_season() -> Season {
    Season(2021)
}

fn default_n_seasons() -> u16 {
    3
}

fn default_star_team_threshold() -> f64 {
    0.75
}

fn default_games_threshold() -> u16 {
    4
}

fn default_home_games_threshold() -> u16 {
    5
}

fn default_update_interval_s() -> u64 {
    60 * 60
}

fn default_throttle_s() -> u64 {
    60 * 10
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8000,
            football_data_url: "https://api.football-data.org/v2".to_string(),
            api_key: String::new(),
            db_path: default_db_path(),
            current_season: default_current_season(),
            n_seasons: default_n_seasons(),
            star_team_threshold: default_star_team_threshold(),
            games_threshold: default_games_threshold(),
            home_games_threshold: default_home_games_threshold(),
            update_interval_s: default_update_interval_s(),
            throttle_s: default_throttle_s(),
        }
    }
}

impl Config {
    pub fn get_seasons(&self) -> Vec<Season> {
        self.current_season.get_range(self.n_seasons)
    }
}

pub fn get_config() -> Config {
    let path = std::env::var("CONFIG_PATH").ok()
        .unwrap_or_else(|| "./deployment/config.json".to_string());
    let data = fs::read_to_string(path.clone())
        .unwrap_or_else(|_| panic!("Unable to read config file {path}"));
    let mut result: Config = serde_json::from_str(&data)
        .unwrap_or_else(|_| panic!("{}", &format!("Could not parse JSON at {path}!")));
    if let Ok(db_path) = std::env::var("DB_PATH") {
        result.db_path = db_path;
        println!("[CONFIG] DB_PATH {}", result.db_path);
    }
    println!("[CONFIG] port={} url={} season={} n_seasons={}", result.port, result.football_data_url, result.current_season, result.n_seasons);
    result
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::models::Season;

    #[test]
    fn test_defaults_when_missing() {
        let config: Config = serde_json::from_str(r#"{"port": 8080, "football_data_url": "http://localhost", "api_key": "KEY"}"#).unwrap();
        assert_eq!(config.db_path, "./db");
        assert_eq!(config.current_season, Season(2021));
        assert_eq!(config.get_seasons(), vec![Season(2021), Season(2020), Season(2019)]);
        assert_eq!(config.star_team_threshold, 0.75);
    }
}
