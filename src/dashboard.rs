//! Dashboard-level refresh signalling
//!
//! Views that depend on backend data subscribe to the refresh key and re-fetch
//! whenever it changes. Approvals and the explicit "refresh all" action bump it.

use tokio::sync::watch;

#[derive(Clone)]
pub struct RefreshKey {
    sender: watch::Sender<u64>,
}

impl RefreshKey {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    /// Increment the key and wake every subscriber; returns the new value
    pub fn bump(&self) -> u64 {
        let mut next = 0;
        self.sender.send_modify(|key| {
            *key += 1;
            next = *key;
        });
        log::info!("Dashboard refresh key bumped to {}", next);
        next
    }

    pub fn current(&self) -> u64 {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

impl Default for RefreshKey {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bump_notifies_subscribers() {
        let key = RefreshKey::new();
        let mut receiver = key.subscribe();
        assert_eq!(key.current(), 0);

        assert_eq!(key.bump(), 1);
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), 1);
    }
}
