use std::sync::Arc;

use tokio::sync::watch::{self, Receiver, Sender};

use crate::data_service::DashboardData;

pub type Snapshot = Option<Arc<DashboardData>>;

/// A value shared between tasks, subscribers are woken on every change.
pub struct Store<T> {
    sender: Sender<T>,
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Store<T> {
        let (sender, _) = watch::channel(value);
        Store { sender }
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        self.sender.send_modify(f);
    }

    pub fn subscribe(&self) -> Receiver<T> {
        self.sender.subscribe()
    }
}

pub type SafeStore = Arc<Store<Snapshot>>;

#[cfg(test)]
mod tests {
    use super::Store;

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        // Given
        let store = Store::new(1);
        let mut rx = store.subscribe();

        // When
        store.set(2);

        // Then
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 2);
        assert_eq!(store.get(), 2);

        // When
        store.update(|e| *e += 10);

        // Then
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 12);
    }

    #[test]
    fn test_set_without_subscribers() {
        let store = Store::new("loading".to_string());
        store.set("ready".to_string());
        assert_eq!(store.get(), "ready");
    }
}
