//! Prompt construction for the generative features. Nothing here talks to
//! the network; the generative client turns a [`TextPrompt`] into a request.

use serde::{Deserialize, Serialize};

use crate::models::{LatLng, Profile};

pub const GROUNDED_MODEL: &str = "gemini-2.5-flash";
pub const FLASH_MODEL: &str = "gemini-3-flash-preview";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
pub const LIVE_AUDIO_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";

pub const ANIMATE_PROMPT: &str =
    "Animate this metropolitan portrait with subtle cinematic motion and professional lighting.";

pub const ASSISTANT_EMPTY_REPLY: &str = "The metropolitan vibe is processing... one moment.";
pub const ASSISTANT_FAILURE_REPLY: &str =
    "The network vibe is slightly unstable. Try again in a moment.";

const ICEBREAKER_INSTRUCTION: &str = "You are ScissHER's AI Scene Architect. You research actual local venues and events to create high-value, intentional date proposals. Do not use generic places.";
const CAPTION_INSTRUCTION: &str = "You are the ScissHER Caption Genius.";
const MATCHMAKER_INSTRUCTION: &str = "You are the ScissHER Matchmaker. Propose a specific Sesh Window.";
const HOST_MENTOR_INSTRUCTION: &str = "You are the ScissHER Host Mentor. You help future community leaders articulate their value.";
const ASSISTANT_INSTRUCTION: &str = "You are ScissHER's Elite Scene Assistant. You help users with dating advice, community safety, and finding intentional hotspots. You are high-fashion, respectful, and direct.";
const ARCHITECT_INSTRUCTION: &str = "You are the ScissHER Scene Architect. You help users express their authentic light with depth and style.";
pub const VOICE_INSTRUCTION: &str = "You are ScissHER Assistant. You have a warm, supportive voice. You help the user navigate her intentions and the metropolitan dating scene.";

/// Words that route an assistant question through maps grounding
const MAPS_KEYWORDS: [&str; 4] = ["nearby", "restaurant", "spot", "place"];

/// Profile prompt fields the architect can suggest answers for
pub const PROMPT_LIBRARY: [(&str, &str); 7] = [
    ("idealFirstDate", "What defines your perfect introduction?"),
    ("collabProject", "Describe your ideal collaborative project."),
    ("moodSong", "A song that perfectly captures your current mood."),
    ("tableOrder", "Curate your night out order."),
    ("describeSelfOnePhoto", "Describe yourself in one specific photo."),
    ("morningRitual", "Your essential first 30 minutes of the day."),
    ("urbanEscape", "A hidden city spot where you feel most alive."),
];

/// Hosted grounding tools a prompt may enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch,
    GoogleMaps,
}

/// Which feature a prompt belongs to; also the cache namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Icebreaker,
    Captions,
    SkipSmallTalk,
    HostVision,
    Assistant,
    PromptSuggestion,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Icebreaker => "icebreaker",
            Feature::Captions => "captions",
            Feature::SkipSmallTalk => "skip_small_talk",
            Feature::HostVision => "host_vision",
            Feature::Assistant => "assistant",
            Feature::PromptSuggestion => "prompt_suggestion",
        }
    }
}

/// A single text generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPrompt {
    pub feature: Feature,
    pub model: String,
    pub contents: String,
    pub system_instruction: String,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub lat_lng: Option<LatLng>,
}

impl TextPrompt {
    fn new(feature: Feature, model: &str, contents: String, instruction: &str) -> Self {
        Self {
            feature,
            model: model.to_string(),
            contents,
            system_instruction: instruction.to_string(),
            tools: Vec::new(),
            lat_lng: None,
        }
    }

    fn with_tools(mut self, tools: &[Tool], lat_lng: Option<LatLng>) -> Self {
        self.tools = tools.to_vec();
        self.lat_lng = lat_lng;
        self
    }

    /// Cache key: feature, model, position and contents
    pub fn cache_key(&self) -> String {
        let position = self
            .lat_lng
            .map(|p| format!("{:.3},{:.3}", p.latitude, p.longitude))
            .unwrap_or_default();
        format!("{}:{}:{}:{}", self.feature.as_str(), self.model, position, self.contents)
    }
}

/// Generated text is shown verbatim minus double quotes
pub fn strip_quotes(text: &str) -> String {
    text.replace('"', "")
}

pub fn needs_maps(message: &str) -> bool {
    let lower = message.to_lowercase();
    MAPS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// One-sentence date proposal grounded on real venues near the target
pub fn icebreaker(target: &Profile, lat_lng: Option<LatLng>) -> TextPrompt {
    let contents = format!(
        "Create a unique, 1-sentence intentional date proposal for two lesbians in {location}. \
         Target User Interests: \"{interests}\". \
         Reference real metropolitan hotspots or events near {location}.",
        location = target.location,
        interests = target.interest_items().join(", "),
    );
    TextPrompt::new(Feature::Icebreaker, GROUNDED_MODEL, contents, ICEBREAKER_INSTRUCTION)
        .with_tools(&[Tool::GoogleSearch, Tool::GoogleMaps], lat_lng)
}

pub fn captions(user: &Profile) -> TextPrompt {
    let contents = format!(
        "I am a {}. Generate 3 short, poetic, \"hand-written\" style captions for this photo. \
         Context: I am on ScissHER, an intentional dating app for lesbians. \
         Focus on metropolitan vibes and authentic connection. Keep each under 10 words.",
        user.energy()
    );
    TextPrompt::new(Feature::Captions, FLASH_MODEL, contents, CAPTION_INSTRUCTION)
}

/// Concrete date proposal that replaces small talk in a thread
pub fn skip_small_talk(user: &Profile) -> TextPrompt {
    let contents = format!(
        "Create a direct, intentional date proposal for two people on a metropolitan lesbian dating app. \
         Person A likes: {}. \
         Context: They are talking about a techno venue. \
         Tone: Confident, specific, intentional. No fluff.",
        user.interest_items().join(", ")
    );
    TextPrompt::new(Feature::SkipSmallTalk, FLASH_MODEL, contents, MATCHMAKER_INSTRUCTION)
}

pub fn host_vision(user: &Profile) -> TextPrompt {
    let first_group = user
        .interests
        .first()
        .map(|g| g.items.join(", "))
        .unwrap_or_default();
    let contents = format!(
        "I am a {} on ScissHER. I want to host an intentional local event for the lesbian community. \
         My interests are: {}. \
         Draft a professional, inspiring 2-sentence vision statement for a community gathering.",
        user.energy(),
        first_group
    );
    TextPrompt::new(Feature::HostVision, FLASH_MODEL, contents, HOST_MENTOR_INSTRUCTION)
}

/// Scene assistant question; maps grounding and position only for
/// place-seeking questions
pub fn assistant(message: &str, lat_lng: Option<LatLng>) -> TextPrompt {
    if needs_maps(message) {
        TextPrompt::new(Feature::Assistant, GROUNDED_MODEL, message.to_string(), ASSISTANT_INSTRUCTION)
            .with_tools(&[Tool::GoogleMaps], lat_lng)
    } else {
        TextPrompt::new(Feature::Assistant, FLASH_MODEL, message.to_string(), ASSISTANT_INSTRUCTION)
    }
}

/// Suggested answer for a profile prompt field; `None` for unknown fields
pub fn prompt_suggestion(user: &Profile, field: &str) -> Option<TextPrompt> {
    let (_, question) = PROMPT_LIBRARY.iter().find(|(f, _)| *f == field)?;
    let contents = format!(
        "I am a user on ScissHER, an intentional dating app for lesbians (age 20-30). \
         My bio is: \"{}\". My energy is: {}. \
         Suggest a clever, atmospheric response for the prompt field: \"{}\". \
         The prompt question is: \"{}\". \
         Keep it under 15 words, witty, and high-fashion.",
        user.bio,
        user.energy(),
        field,
        question
    );
    Some(TextPrompt::new(Feature::PromptSuggestion, FLASH_MODEL, contents, ARCHITECT_INSTRUCTION))
}

pub fn magic_edit_instruction(request: &str) -> String {
    format!("Edit this photo as requested: {}", request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::Catalog;

    fn maya() -> Profile {
        Catalog::seeded().unwrap().profiles[0].clone()
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"Meet at \"Elsewhere\" rooftop\""), "Meet at Elsewhere rooftop");
    }

    #[test]
    fn test_maps_keyword_routing() {
        let grounded = assistant("Any good RESTAURANT nearby?", None);
        assert_eq!(grounded.model, GROUNDED_MODEL);
        assert_eq!(grounded.tools, vec![Tool::GoogleMaps]);

        let here = LatLng { latitude: 40.7, longitude: -73.9 };
        let plain = assistant("How do I open up about ENM?", Some(here));
        assert_eq!(plain.model, FLASH_MODEL);
        assert!(plain.tools.is_empty());
        assert!(plain.lat_lng.is_none());
    }

    #[test]
    fn test_icebreaker_uses_both_tools() {
        let here = LatLng { latitude: 40.7, longitude: -73.9 };
        let prompt = icebreaker(&maya(), Some(here));

        assert_eq!(prompt.model, GROUNDED_MODEL);
        assert_eq!(prompt.tools, vec![Tool::GoogleSearch, Tool::GoogleMaps]);
        assert_eq!(prompt.lat_lng, Some(here));
        assert!(prompt.contents.contains("Brooklyn, NY"));
    }

    #[test]
    fn test_energy_fallback() {
        let mut user = maya();
        user.current_energy = None;
        assert!(captions(&user).contents.starts_with("I am a intentional person."));
    }

    #[test]
    fn test_prompt_suggestion_known_fields_only() {
        let prompt = prompt_suggestion(&maya(), "moodSong").unwrap();
        assert!(prompt.contents.contains("A song that perfectly captures your current mood."));
        assert!(prompt_suggestion(&maya(), "favouriteColour").is_none());
    }

    #[test]
    fn test_cache_key_separates_features() {
        let user = maya();
        assert_ne!(captions(&user).cache_key(), skip_small_talk(&user).cache_key());
        assert_eq!(captions(&user).cache_key(), captions(&user).cache_key());
    }
}
