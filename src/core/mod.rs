// Screen state machines and pure helpers
pub mod audio;
pub mod availability;
pub mod chat;
pub mod discovery;
pub mod effects;
pub mod events;
pub mod filters;
pub mod host;
pub mod onboarding;
pub mod photo_editor;
pub mod prompts;
pub mod reveal;
pub mod router;
pub mod session;
pub mod vault;

pub use availability::{overlap, Calendar, Day, Planner, SeshRequest, Slot};
pub use discovery::{DiscoveryDeck, DiscoveryTab, LikeOutcome};
pub use effects::{Effect, HapticPulse, ImpactStyle, NotificationType};
pub use filters::CandidateFilter;
pub use reveal::{obscurity_at, RevealConfig};
pub use router::{Action, AppState, AppView, AuthState, RouterError};
pub use session::{BlindSession, Decision, SessionError, SessionPhase, SessionSnapshot};
pub use vault::{Vault, VaultError, VaultTab};
