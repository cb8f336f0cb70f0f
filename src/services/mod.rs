// Service exports
pub mod ai;
pub mod cache;
pub mod catalog;
pub mod flags;
pub mod genai;
pub mod haptics;
pub mod live;
pub mod media;
pub mod session_runner;
pub mod voice;

pub use ai::{AiError, AiFeatures, AiText};
pub use cache::{CacheError, CacheKey, CacheStats, ResponseCache};
pub use catalog::{Catalog, CatalogError, ProfileStore};
pub use flags::{FileFlagStore, FlagStore, FlagStoreError, MemoryFlagStore};
pub use genai::{GenAiClient, GenAiError, GenerativeService};
pub use haptics::{BridgeError, HapticSink, LoggingHaptics, LoggingStatusBar, NoHaptics, StatusBar};
pub use live::LiveVoiceTransport;
pub use media::{MediaDevice, MediaError, SimulatedMediaDevice};
pub use session_runner::{SessionController, SessionTiming};
pub use voice::{LoggingVoiceTransport, VoiceError, VoiceSession, VoiceTransport};
