use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::log;
use crate::{LogResult, CONFIG};
use crate::db::Db;
use crate::models::Season;
use crate::models_external::matches::MatchesRsp;
use crate::models_external::standings::StandingsRsp;

const COMPETITION: &str = "PL";

impl Season {
    fn get_throttle(&self) -> Option<Duration> {
        if self == &CONFIG.current_season {
            Some(Duration::from_secs(CONFIG.throttle_s))
        } else {
            None
        }
    }
}

pub fn get_matches_url(season: &Season) -> String {
    format!("{}/competitions/{COMPETITION}/matches?season={season}", CONFIG.football_data_url)
}

pub fn get_standings_url(season: &Season) -> String {
    format!("{}/competitions/{COMPETITION}/standings?season={season}", CONFIG.football_data_url)
}

pub async fn get_matches(season: &Season) -> Option<MatchesRsp> {
    throttle_call(&get_matches_url(season), season.get_throttle()).await
}

pub async fn get_standings(season: &Season) -> Option<StandingsRsp> {
    throttle_call(&get_standings_url(season), season.get_throttle()).await
}

fn cache_key(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub async fn throttle_call<T: DeserializeOwned + Serialize>(url: &str, throttle_s: Option<Duration>) -> Option<T> {
    let db = Db::<String, T>::new("rest");
    cached_call(&db, url, throttle_s, CONFIG.api_key.as_str()).await
}

/// Reuses the cached response until it is older than `throttle_s`, `None` never goes stale.
async fn cached_call<T: DeserializeOwned + Serialize>(db: &Db<String, T>, url: &str, throttle_s: Option<Duration>, api_key: &str) -> Option<T> {
    let key = cache_key(url);

    if db.is_stale(&key, throttle_s) {
        let rsp: Option<T> = get_call(url, api_key).await;
        if let Some(rsp) = rsp {
            _ = db.write(&key, &rsp);
            Some(rsp)
        } else {
            log::warn!("[REST] Falling back to cached {url}");
            db.read(&key)
        }
    } else {
        db.read(&key)
    }
}

async fn get_call<T: DeserializeOwned>(url: &str, api_key: &str) -> Option<T> {
    let before = Instant::now();
    let client = reqwest::Client::new();
    let rsp = client.get(url)
        .header("X-Auth-Token", api_key)
        .send()
        .await
        .ok_log("[REST] Call failed")?;
    let rsp = rsp.error_for_status().ok_log("[REST] Bad status")?;
    let res = rsp.json().await.ok_log("[REST] Parse failed");
    log::info!("[REST] Call {url} {:.2?}", before.elapsed());
    res
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempdir::TempDir;

    use crate::db::Db;

    use super::{cache_key, cached_call};

    const UNREACHABLE: &str = "http://127.0.0.1:1/competitions/PL/matches?season=2019";

    #[test]
    fn test_cache_key_is_flat() {
        assert_eq!(cache_key("http://x/competitions/PL/matches?season=2021"), "http___x_competitions_PL_matches_season_2021");
    }

    #[tokio::test]
    async fn test_cached_response_reuse() {
        // Given - a cached response for the url
        let dir = TempDir::new("rest_test").expect("dir to be created");
        let db = Db::<String, Vec<u8>>::new_in(dir.path().to_str().unwrap(), "rest");
        db.write(&cache_key(UNREACHABLE), &vec![1, 2]).unwrap();

        // Then - past seasons never go stale
        assert_eq!(cached_call(&db, UNREACHABLE, None, "KEY").await, Some(vec![1, 2]));

        // Then - reused within the throttle window
        assert_eq!(cached_call(&db, UNREACHABLE, Some(Duration::from_secs(60)), "KEY").await, Some(vec![1, 2]));

        // When - the throttle has passed and the call fails
        tokio::time::sleep(Duration::from_millis(20)).await;
        let rsp = cached_call(&db, UNREACHABLE, Some(Duration::from_millis(1)), "KEY").await;

        // Then - falls back to the cache
        assert_eq!(rsp, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_failed_call_without_cache() {
        let dir = TempDir::new("rest_test").expect("dir to be created");
        let db = Db::<String, Vec<u8>>::new_in(dir.path().to_str().unwrap(), "rest");

        assert_eq!(cached_call(&db, UNREACHABLE, None, "KEY").await, None);
        assert_eq!(db.read(&cache_key(UNREACHABLE)), None);
    }
}
