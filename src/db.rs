use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::log;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Instant, Duration, SystemTime};

pub fn db_root() -> String {
    std::env::var("DB_PATH").unwrap_or_else(|_| "./db".to_string())
}

pub struct Db<K: Display, V: DeserializeOwned + Serialize> {
    pub name: String,
    pub root: String,
    pub key_type: std::marker::PhantomData<K>,
    pub value_type: std::marker::PhantomData<V>,
}

impl<K: Display, V: DeserializeOwned + Serialize> Db<K, V> {
    pub fn new(name: &str) -> Db<K, V> {
        Db::new_in(&db_root(), name)
    }

    pub fn new_in(root: &str, name: &str) -> Db<K, V> {
        Db {
            name: name.to_string(),
            root: root.to_string(),
            key_type: std::marker::PhantomData,
            value_type: std::marker::PhantomData,
        }
    }

    pub fn read(&self, key: &K) -> Option<V> {
        let path = self.get_path(&key.to_string());
        Db::<K, V>::read_file(&path)
    }

    pub fn write(&self, key: &K, obj: &V) -> std::io::Result<()> {
        let before = Instant::now();
        let json = serde_json::to_string(&obj)?;
        let path = self.get_path(&key.to_string());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let result = std::fs::write(path, json);

        match result {
            Ok(e) => {
                log::debug!("[DB] Wrote to file {}/{} {:.2?}", self.name, key, before.elapsed());
                Ok(e)
            },
            Err(e) => {
                log::error!("[DB] Write failed {}/{} {}", self.name, key, e);
                Err(e)
            }
        }
    }

    pub fn is_stale(&self, key: &K, delta_s: Option<Duration>) -> bool {
        let path = self.get_path(&key.to_string());
        std::fs::metadata(path)
            .and_then(|e| e.modified())
            .map(|m| {
                if let Some(delta_s) = delta_s {
                    SystemTime::now().duration_since(m).unwrap_or_default() > delta_s
                } else {
                    false // if None and file exists => never stale
                }
            })
            .unwrap_or(true) // file doesn't exists => stale
    }

    fn read_file(path: &PathBuf) -> Option<V> {
        let before = Instant::now();
        let data = std::fs::read_to_string(path).ok()?;
        let res = match serde_json::from_str(&data) {
            Ok(e) => Some(e),
            Err(e) => {
                log::error!("[DB] Read failed {} {}", path.display(), e);
                None
            }
        };
        log::debug!("[DB] Read from file {} {:.2?}", path.display(), before.elapsed());
        res
    }

    fn get_path(&self, key: &str) -> PathBuf {
        PathBuf::from(&self.root).join(&self.name).join(key)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempdir::TempDir;

    use super::Db;

    #[test]
    fn test_write_read_stale() {
        // Given
        let dir = TempDir::new("db_test").expect("dir to be created");
        let db = Db::<String, Vec<u16>>::new_in(dir.path().to_str().unwrap(), "numbers");
        let key = "2021".to_string();

        // Then - missing key is stale and unreadable
        assert!(db.is_stale(&key, None));
        assert_eq!(db.read(&key), None);

        // When
        db.write(&key, &vec![1, 2, 3]).unwrap();

        // Then
        assert_eq!(db.read(&key), Some(vec![1, 2, 3]));
        assert!(!db.is_stale(&key, None));
        assert!(!db.is_stale(&key, Some(Duration::from_secs(60))));
    }
}
