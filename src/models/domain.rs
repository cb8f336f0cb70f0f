use serde::{Deserialize, Serialize};

/// Member profile as shown on cards, in the vault and during a blind session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub bio: String,
    pub location: String,
    pub distance: String,
    #[serde(default)]
    pub interests: Vec<InterestGroup>,
    #[serde(default)]
    pub intentions: Vec<String>,
    pub love_language: String,
    pub zodiac_sign: String,
    pub relationship_style: RelationshipStyle,
    #[serde(default)]
    pub prompts: Vec<ProfilePrompt>,
    #[serde(default)]
    pub ideal_first_date: Option<String>,
    #[serde(default)]
    pub two_truths_and_an_illusion: Option<TwoTruthsAndAnIllusion>,
    #[serde(default)]
    pub table_order: Option<String>,
    #[serde(default)]
    pub describe_self_one_photo: Option<String>,
    #[serde(default)]
    pub collab_project: Option<String>,
    #[serde(default)]
    pub mood_song: Option<String>,
    pub main_photo: String,
    #[serde(default)]
    pub public_photos: Vec<String>,
    #[serde(default)]
    pub private_photos: Vec<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub speed_dating_tickets: u32,
    #[serde(default)]
    pub current_energy: Option<String>,
    #[serde(default)]
    pub aura_color: Option<String>,
    #[serde(default)]
    pub prismatic_layers: Vec<String>,
    #[serde(default)]
    pub metropolitan_hotspots: Vec<String>,
    #[serde(default)]
    pub creative_mediums: Vec<String>,
    #[serde(default)]
    pub vibe_checks: Vec<VibeCheck>,
    #[serde(default)]
    pub profile_completion: Option<u8>,
}

impl Profile {
    /// All interest items across categories, in declaration order
    pub fn interest_items(&self) -> Vec<&str> {
        self.interests
            .iter()
            .flat_map(|group| group.items.iter().map(String::as_str))
            .collect()
    }

    /// Slots offered on a given day, empty if the day is not offered
    pub fn slots_on(&self, day: &str) -> &[String] {
        self.availability
            .iter()
            .find(|a| a.day == day)
            .map(|a| a.slots.as_slice())
            .unwrap_or(&[])
    }

    pub fn energy(&self) -> &str {
        self.current_energy.as_deref().unwrap_or("intentional person")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipStyle {
    Monogamous,
    #[serde(rename = "ENM")]
    Enm,
    Polyamorous,
    #[serde(rename = "Open to either")]
    OpenToEither,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestCategory {
    Hobbies,
    Music,
    Movies,
    Vibe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestGroup {
    pub category: InterestCategory,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePrompt {
    pub id: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeCheck {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoTruthsAndAnIllusion {
    pub statements: Vec<String>,
    pub illusion_index: usize,
}

/// Day with the coarse time windows a member is open to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub day: String,
    pub slots: Vec<String>,
}

/// Community event listed on the events tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatingEvent {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub time: String,
    pub attendees: u32,
    pub image: String,
    #[serde(default)]
    pub is_live: bool,
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Me,
    Them,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
    pub time: String,
}

/// Conversation summary as listed in the DMs tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub profile_id: String,
    pub last_message: String,
    pub time: String,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Premium perk shown on the upsell modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumPerk {
    pub icon: String,
    pub title: String,
    pub desc: String,
}

/// Web or maps source a generated answer was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundingKind {
    Web,
    Maps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub kind: GroundingKind,
    pub uri: String,
    pub title: String,
}

/// Geographic position used to ground location-aware prompts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}
