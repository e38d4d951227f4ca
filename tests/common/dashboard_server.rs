use std::process::{Child, Command};

use assert_cmd::prelude::CommandCargoExt;
use pl_dashboard_rs::{config_handler::Config, models::Season};
use predicates::{function::FnPredicate, Predicate};
use reqwest::Response;
use serde::de::DeserializeOwned;

pub struct DashboardServer {
    port: u16,
    child_process: Option<Child>,
}

impl Drop for DashboardServer {
    fn drop(&mut self) {
        if let Some(child) = self.child_process.as_mut() {
            child.kill().expect("Should kill");
        }
    }
}

impl DashboardServer {
    pub fn new(port: u16) -> DashboardServer {
        DashboardServer { port, child_process: None }
    }

    pub fn start(&mut self, path: &str, external_url: &str, current_season: Season) {
        let config = Config {
            port: self.port,
            football_data_url: external_url.to_string(),
            api_key: "API_KEY".to_string(),
            db_path: format!("{}/db", path),
            current_season,
            update_interval_s: 1,
            throttle_s: 0,
            ..Default::default()
        };

        let config_str = serde_json::to_string(&config).unwrap();
        let config_path = format!("{path}/config.json");
        std::fs::write(config_path.clone(), config_str).unwrap();
        let child_process = Command::cargo_bin("pl-dashboard-rs")
            .unwrap()
            .env("CONFIG_PATH", config_path)
            .spawn()
            .expect("should start");

        self.child_process = Some(child_process);
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://localhost:{}{}", self.port, path)
    }

    pub async fn get(&self, path: &str) -> Result<Response, Box<dyn std::error::Error>> {
        Ok(reqwest::get(self.url(path)).await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Box<dyn std::error::Error>> {
        Ok(reqwest::get(self.url(path)).await?.error_for_status()?.json().await?)
    }

    pub async fn retry_until<T, F>(&self, path: &str, predicate: FnPredicate<F, T>, retry_ms: u64) -> T
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut nr_loops = 0;
        loop {
            if let Ok(value) = self.get_json::<T>(path).await {
                if predicate.eval(&value) {
                    return value;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(retry_ms)).await;
            nr_loops += 1;
            if nr_loops > 100 {
                panic!("retry failed for {path}");
            }
        }
    }

    pub async fn retry_until_status(&self, path: &str, status: reqwest::StatusCode, retry_ms: u64) -> Response {
        let mut nr_loops = 0;
        loop {
            if let Ok(rsp) = self.get(path).await {
                if rsp.status() == status {
                    return rsp;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(retry_ms)).await;
            nr_loops += 1;
            if nr_loops > 100 {
                panic!("retry failed for {path}");
            }
        }
    }
}
