// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AvailabilitySlot, ChatMessage, Conversation, DatingEvent, GroundingKind, GroundingLink,
    InterestCategory, InterestGroup, LatLng, MessageRole, PremiumPerk, Profile, ProfilePrompt,
    RelationshipStyle, TwoTruthsAndAnIllusion, VibeCheck,
};
pub use requests::{
    AddPhotosRequest, AssistantRequest, BirthYearRequest, ConfirmRequest, DecisionRequest,
    DiscoveryTabRequest, DispatchRequest, EulaRequest, HostApplicationRequest, IcebreakerRequest,
    MagicEditRequest, PhotoEditRequest, PhotoRequest, SendMessageRequest, SeshRequestBody,
    StartSessionRequest, SuggestionRequest, TabRequest, ToggleKeyRequest, ToggleSlotRequest,
    VaultTabRequest, VoiceAudioRequest, VoiceMessageRequest, VoicePollRequest,
};
pub use responses::{
    AppSnapshotResponse, EffectsResponse, ErrorResponse, HealthResponse, LikeResponse,
    SessionResponse,
};
