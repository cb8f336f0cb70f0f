use crate::models::{Conversation, DatingEvent, PremiumPerk, Profile};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

/// Seed document compiled into the binary
const SEED_CATALOG: &str = include_str!("../../data/catalog.toml");

/// Errors that can occur when loading or querying the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Catalog has no profiles")]
    Empty,
}

/// Static mock data backing every screen
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub hype_quote: String,
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub events: Vec<DatingEvent>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub perks: Vec<PremiumPerk>,
}

impl Catalog {
    /// Parse the embedded seed catalog
    pub fn seeded() -> Result<Self, CatalogError> {
        Self::parse(SEED_CATALOG)
    }

    /// Load a catalog from a TOML file on disk
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(raw)?;
        if catalog.profiles.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(catalog)
    }
}

/// In-memory profile store.
///
/// Profiles are only ever replaced field-by-field (ticket balance); there is no
/// create or delete.
pub struct ProfileStore {
    profiles: RwLock<Vec<Profile>>,
}

impl ProfileStore {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles),
        }
    }

    pub async fn all(&self) -> Vec<Profile> {
        self.profiles.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Result<Profile, CatalogError> {
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::ProfileNotFound(id.to_string()))
    }

    /// Everyone except `user_id`, in catalog order
    pub async fn others(&self, user_id: &str) -> Vec<Profile> {
        self.profiles
            .read()
            .await
            .iter()
            .filter(|p| p.id != user_id)
            .cloned()
            .collect()
    }

    /// Counterpart for a blind session: the first profile that is not the
    /// user, falling back to the first profile.
    pub async fn pick_counterpart(&self, user_id: &str) -> Result<Profile, CatalogError> {
        let profiles = self.profiles.read().await;
        profiles
            .iter()
            .find(|p| p.id != user_id)
            .or_else(|| profiles.first())
            .cloned()
            .ok_or(CatalogError::Empty)
    }

    pub async fn update_tickets(&self, user_id: &str, tickets: u32) -> Result<(), CatalogError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| CatalogError::ProfileNotFound(user_id.to_string()))?;

        tracing::debug!(
            "Ticket balance for {}: {} -> {}",
            user_id,
            profile.speed_dating_tickets,
            tickets
        );
        profile.speed_dating_tickets = tickets;
        Ok(())
    }

    /// Replace a member's galleries; the first public photo becomes the main one
    pub async fn set_gallery(
        &self,
        user_id: &str,
        public_photos: Vec<String>,
        private_photos: Vec<String>,
    ) -> Result<(), CatalogError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| CatalogError::ProfileNotFound(user_id.to_string()))?;

        if let Some(lead) = public_photos.first() {
            profile.main_photo = lead.clone();
        }
        profile.public_photos = public_photos;
        profile.private_photos = private_photos;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_catalog_parses() {
        let catalog = Catalog::seeded().unwrap();

        assert_eq!(catalog.profiles.len(), 3);
        assert_eq!(catalog.profiles[0].name, "Maya");
        assert_eq!(catalog.profiles[1].speed_dating_tickets, 999);
        assert!(catalog.profiles[1].is_premium);
        assert_eq!(catalog.events.len(), 1);
        assert_eq!(catalog.conversations.len(), 2);
        assert_eq!(catalog.perks.len(), 4);
        assert!(catalog.hype_quote.starts_with("Step into your power"));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let result = Catalog::parse("hypeQuote = \"hi\"\nprofiles = []\n");
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[tokio::test]
    async fn test_pick_counterpart_skips_user() {
        let store = ProfileStore::new(Catalog::seeded().unwrap().profiles);

        assert_eq!(store.pick_counterpart("u1").await.unwrap().id, "u2");
        assert_eq!(store.pick_counterpart("u2").await.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_pick_counterpart_falls_back_to_first() {
        let mut profiles = Catalog::seeded().unwrap().profiles;
        profiles.truncate(1);
        let store = ProfileStore::new(profiles);

        assert_eq!(store.pick_counterpart("u1").await.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_update_tickets() {
        let store = ProfileStore::new(Catalog::seeded().unwrap().profiles);

        store.update_tickets("u1", 0).await.unwrap();
        assert_eq!(store.get("u1").await.unwrap().speed_dating_tickets, 0);
        assert!(matches!(
            store.update_tickets("nobody", 1).await,
            Err(CatalogError::ProfileNotFound(_))
        ));
    }
}
