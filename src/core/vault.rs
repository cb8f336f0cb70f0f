use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::effects::{Effect, HapticPulse};
use crate::models::Profile;

#[derive(Debug, Error, PartialEq)]
pub enum VaultError {
    /// Destructive change that needs the user to confirm first; carries the prompt text
    #[error("{0}")]
    ConfirmationRequired(String),

    #[error("Unknown connection: {0}")]
    UnknownConnection(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultTab {
    Public,
    Private,
    Access,
}

/// A profile in the access list with its key status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub profile: Profile,
    pub has_access: bool,
}

/// Owner's public/private galleries and the keys issued to the private one
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    owner_id: String,
    tab: VaultTab,
    keys: BTreeMap<String, bool>,
}

impl Vault {
    pub fn new(owner_id: impl Into<String>, keys: BTreeMap<String, bool>) -> Self {
        Self {
            owner_id: owner_id.into(),
            tab: VaultTab::Public,
            keys,
        }
    }

    /// Demo key set: Elena holds a key, Sasha and u4 do not
    pub fn seeded(owner_id: impl Into<String>) -> Self {
        let keys = BTreeMap::from([
            ("u2".to_string(), true),
            ("u3".to_string(), false),
            ("u4".to_string(), false),
        ]);
        Self::new(owner_id, keys)
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn tab(&self) -> VaultTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: VaultTab) {
        self.tab = tab;
    }

    /// Photos for the open gallery tab; the access tab shows none
    pub fn photos<'a>(&self, owner: &'a Profile) -> &'a [String] {
        match self.tab {
            VaultTab::Public => &owner.public_photos,
            VaultTab::Private => &owner.private_photos,
            VaultTab::Access => &[],
        }
    }

    pub fn has_key(&self, profile_id: &str) -> bool {
        self.keys.get(profile_id).copied().unwrap_or(false)
    }

    /// Whether `viewer_id` may see the private gallery
    pub fn can_view_private(&self, viewer_id: &str) -> bool {
        viewer_id == self.owner_id || self.has_key(viewer_id)
    }

    pub fn active_count(&self) -> usize {
        self.keys.values().filter(|granted| **granted).count()
    }

    /// Flip a key. Revoking needs `confirmed`; without it nothing changes.
    pub fn toggle(
        &mut self,
        profile: &Profile,
        confirmed: bool,
    ) -> Result<Vec<Effect>, VaultError> {
        if profile.id == self.owner_id {
            return Err(VaultError::UnknownConnection(profile.id.clone()));
        }

        if self.has_key(&profile.id) {
            if !confirmed {
                return Err(VaultError::ConfirmationRequired(format!(
                    "SECURITY ALERT: Revoke Private Access for {}? Their Key will be instantly invalidated and they will lose all visibility.",
                    profile.name
                )));
            }
            self.keys.insert(profile.id.clone(), false);
            tracing::info!("Revoked vault key for {}", profile.id);
            return Ok(vec![Effect::Haptic(HapticPulse::HEAVY)]);
        }

        self.keys.insert(profile.id.clone(), true);
        tracing::info!("Granted vault key to {}", profile.id);
        Ok(vec![
            Effect::Haptic(HapticPulse::MEDIUM),
            Effect::Haptic(HapticPulse::SUCCESS),
        ])
    }

    /// Invalidate every issued key
    pub fn revoke_all(&mut self, confirmed: bool) -> Result<Vec<Effect>, VaultError> {
        if !confirmed {
            return Err(VaultError::ConfirmationRequired(
                "EMERGENCY OVERRIDE: This will instantly invalidate ALL issued Private Access Keys. Your private album will be restricted to your eyes only. Proceed?".to_string(),
            ));
        }

        self.keys.values_mut().for_each(|granted| *granted = false);
        tracing::warn!("All vault keys revoked for {}", self.owner_id);
        Ok(vec![Effect::Haptic(HapticPulse::WARNING)])
    }

    /// Everyone but the owner, key holders first, otherwise in catalog order
    pub fn connections(&self, profiles: &[Profile]) -> Vec<Connection> {
        let mut connections: Vec<Connection> = profiles
            .iter()
            .filter(|p| p.id != self.owner_id)
            .map(|p| Connection {
                profile: p.clone(),
                has_access: self.has_key(&p.id),
            })
            .collect();
        // stable sort keeps catalog order within each group
        connections.sort_by_key(|c| !c.has_access);
        connections
    }
}
