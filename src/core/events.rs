use serde::{Deserialize, Serialize};

use crate::core::effects::Effect;
use crate::models::{DatingEvent, PremiumPerk};

pub const PURCHASE_NOTICE: &str = "In production, this triggers the Apple In-App Purchase dialog. Payment is handled securely via your Apple ID.";

/// Events tab, premium upsell and the daily hype quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBoard {
    pub events: Vec<DatingEvent>,
    pub perks: Vec<PremiumPerk>,
    pub hype_quote: String,
}

impl EventBoard {
    pub fn new(events: Vec<DatingEvent>, perks: Vec<PremiumPerk>, hype_quote: String) -> Self {
        Self {
            events,
            perks,
            hype_quote,
        }
    }

    pub fn live(&self) -> impl Iterator<Item = &DatingEvent> {
        self.events.iter().filter(|e| e.is_live)
    }

    /// Purchases are simulated; the store sheet is only announced
    pub fn purchase(&self) -> Vec<Effect> {
        tracing::info!("Premium purchase requested");
        vec![Effect::notice(PURCHASE_NOTICE)]
    }
}
