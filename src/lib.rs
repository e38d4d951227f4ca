#![allow(non_snake_case)]

use std::fmt::Display;

use config_handler::Config;
use lazy_static::lazy_static;
use tracing::log;

pub mod config_handler;
pub mod rest_client;
pub mod models;
pub mod models_external;
pub mod db;
pub mod team_names;
pub mod fixtures_service;
pub mod standing_service;
pub mod team_ratings_service;
pub mod home_advantage_service;
pub mod form_service;
pub mod position_over_time_service;
pub mod season_stats_service;
pub mod upcoming_service;
pub mod predictions_service;
pub mod data_service;
pub mod charts;
pub mod store;
pub mod route_rank;
pub mod pages;
pub mod api;

lazy_static! {
    pub static ref CONFIG: Config = config_handler::get_config();
}

pub trait LogResult<T, E: Display> {
    fn ok_log(self, msg: &str) -> Option<T>;
}

impl<T, E: Display> LogResult<T, E> for Result<T, E> {
    fn ok_log(self, msg: &str) -> Option<T> {
        match self {
            Ok(o) => Some(o),
            Err(e) => {
                log::error!("{}: {}", msg, e);
                None
            }
        }
    }
}
