use log::{debug, info};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use super::Error;
use crate::infra::backend::{Character, GeekFightsApi};

struct Loaded {
    characters: Arc<Vec<Character>>,
    at: Instant,
}

/// Character catalogue, fetched once and shared by every request until it goes stale.
///
/// The lock is held across the upstream call, so callers arriving while a load is
/// in flight wait for it instead of issuing their own.
pub struct CharacterCache {
    api: Arc<dyn GeekFightsApi>,
    refresh: Duration,
    loaded: Mutex<Option<Loaded>>,
}

impl CharacterCache {
    pub fn new(api: Arc<dyn GeekFightsApi>, refresh: Duration) -> Self {
        Self {
            api,
            refresh,
            loaded: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<Arc<Vec<Character>>, Error> {
        let mut loaded = self.loaded.lock().await;
        if let Some(current) = loaded.as_ref() {
            if current.at.elapsed() < self.refresh {
                return Ok(current.characters.clone());
            }
            debug!("character list is stale, reloading");
        }

        // a failed load leaves the previous state untouched
        let characters = Arc::new(self.api.get_characters().await?);
        info!("loaded {} characters", characters.len());
        *loaded = Some(Loaded {
            characters: characters.clone(),
            at: Instant::now(),
        });
        Ok(characters)
    }

    pub async fn reset(&self) {
        *self.loaded.lock().await = None;
    }

    pub async fn image_for(&self, name: &str) -> Result<Option<String>, Error> {
        let needle = name.trim().to_lowercase();
        let characters = self.get().await?;
        Ok(characters
            .iter()
            .find(|character| character.name.trim().to_lowercase() == needle)
            .and_then(|character| character.image.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::mocks::MockApi, infra::backend::Error as BackendError};

    fn roster() -> Vec<Character> {
        vec![
            Character {
                name: String::from("Goku"),
                image: Some(String::from("/img/goku.png")),
                universe: Some(String::from("Dragon Ball")),
            },
            Character {
                name: String::from("Saitama"),
                image: None,
                universe: None,
            },
        ]
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let mut api = MockApi::new();
        api.expect_get_characters().times(1).returning(|| Ok(roster()));
        let cache = CharacterCache::new(Arc::new(api), Duration::from_secs(300));

        let (a, b, c) = futures::join!(cache.get(), cache.get(), cache.get());
        assert_eq!(a.unwrap().len(), 2);
        assert_eq!(b.unwrap().len(), 2);
        assert_eq!(c.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut api = MockApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_get_characters()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(BackendError::Transient(String::from("503"))));
        api.expect_get_characters()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(roster()));
        let cache = CharacterCache::new(Arc::new(api), Duration::from_secs(300));

        assert!(cache.get().await.is_err());
        assert_eq!(cache.get().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_forces_reload() {
        let mut api = MockApi::new();
        api.expect_get_characters().times(2).returning(|| Ok(roster()));
        let cache = CharacterCache::new(Arc::new(api), Duration::from_secs(300));

        cache.get().await.unwrap();
        cache.get().await.unwrap();
        cache.reset().await;
        cache.get().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_refresh_always_reloads() {
        let mut api = MockApi::new();
        api.expect_get_characters().times(2).returning(|| Ok(roster()));
        let cache = CharacterCache::new(Arc::new(api), Duration::ZERO);

        cache.get().await.unwrap();
        cache.get().await.unwrap();
    }

    #[tokio::test]
    async fn test_image_lookup_ignores_case() {
        let mut api = MockApi::new();
        api.expect_get_characters().times(1).returning(|| Ok(roster()));
        let cache = CharacterCache::new(Arc::new(api), Duration::from_secs(300));

        assert_eq!(
            cache.image_for(" goku ").await.unwrap().as_deref(),
            Some("/img/goku.png")
        );
        assert_eq!(cache.image_for("Saitama").await.unwrap(), None);
        assert_eq!(cache.image_for("Vegeta").await.unwrap(), None);
    }
}
