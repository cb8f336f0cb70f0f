use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::effects::HapticPulse;
use crate::core::reveal::{format_clock, next_remaining, obscurity_at, session_prompt, RevealConfig};
use crate::models::Profile;

/// Remaining seconds at which the "wrap it up" pulse fires
pub const COUNTDOWN_PULSE_AT: u32 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("You're out of credits! Purchase more or upgrade to Premium for unlimited Sesh access.")]
    OutOfTickets,

    #[error("Camera and Microphone access are required for a Virtual Blind Sesh.")]
    PermissionDenied,

    #[error("Cannot {action} while the session is {phase:?}")]
    InvalidPhase { action: &'static str, phase: SessionPhase },

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// What the capture device is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    pub const CAMERA_AND_MIC: Self = Self { video: true, audio: true };
    pub const MIC_ONLY: Self = Self { video: false, audio: true };
}

/// Handle to an acquired capture stream.
///
/// Not `Clone`: whoever holds it is the one who releases it.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaStream {
    pub id: Uuid,
    pub constraints: MediaConstraints,
}

impl MediaStream {
    pub fn new(constraints: MediaConstraints) -> Self {
        Self {
            id: Uuid::new_v4(),
            constraints,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Searching,
    Active,
    Decision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// "Spark Match"
    Accept,
    /// "Cut Connection"
    Reject,
}

/// A queue entry the session refused, with the stream handed back
#[derive(Debug)]
pub struct BeginRejected {
    pub error: SessionError,
    pub stream: MediaStream,
}

/// Side effect of a session transition
#[derive(Debug, PartialEq)]
pub enum SessionEffect {
    Haptic(HapticPulse),
    StartTimer,
    StopTimer,
    ReleaseMedia(MediaStream),
    ChargeTicket { user_id: String, remaining_tickets: u32 },
    Notice(String),
}

/// Serializable view of the session for the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub remaining_secs: u32,
    pub obscurity: f64,
    pub clock: String,
    pub prompt: String,
    pub counterpart: Option<Profile>,
}

/// One timed blind encounter between the local user and a counterpart.
///
/// `Idle -> Searching -> Active -> Decision -> Idle`. Every transition returns
/// the effects it wants run instead of running them.
#[derive(Debug)]
pub struct BlindSession {
    config: RevealConfig,
    phase: SessionPhase,
    remaining: u32,
    user_id: Option<String>,
    counterpart: Option<Profile>,
    stream: Option<MediaStream>,
    charge_user: Option<u32>,
}

impl BlindSession {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Idle,
            remaining: config.duration_secs,
            user_id: None,
            counterpart: None,
            stream: None,
            charge_user: None,
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn obscurity(&self) -> f64 {
        obscurity_at(&self.config, self.remaining)
    }

    pub fn counterpart(&self) -> Option<&Profile> {
        self.counterpart.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn holds_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            remaining_secs: self.remaining,
            obscurity: self.obscurity(),
            clock: format_clock(self.remaining),
            prompt: session_prompt(&self.config, self.remaining).to_string(),
            counterpart: self.counterpart.clone(),
        }
    }

    /// Premium members join freely; everyone else spends a ticket.
    pub fn check_eligibility(user: &Profile) -> Result<(), SessionError> {
        if !user.is_premium && user.speed_dating_tickets == 0 {
            return Err(SessionError::OutOfTickets);
        }
        Ok(())
    }

    /// Whether `user` may join the queue right now
    pub fn can_begin(&self, user: &Profile) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::InvalidPhase {
                action: "join the queue",
                phase: self.phase,
            });
        }
        Self::check_eligibility(user)
    }

    /// Enter the queue. The stream must already be acquired; if the session
    /// refuses it, the stream comes back with the error so it can be released.
    pub fn begin_search(
        &mut self,
        user: &Profile,
        stream: MediaStream,
    ) -> Result<Vec<SessionEffect>, BeginRejected> {
        if let Err(error) = self.can_begin(user) {
            return Err(BeginRejected { error, stream });
        }

        self.phase = SessionPhase::Searching;
        self.user_id = Some(user.id.clone());
        self.charge_user = (!user.is_premium).then_some(user.speed_dating_tickets);
        self.stream = Some(stream);
        self.reset_clock();

        tracing::debug!("Session for {} searching", user.id);
        Ok(vec![SessionEffect::Haptic(HapticPulse::HEAVY)])
    }

    /// The simulated matchmaker paired us with `counterpart`.
    pub fn match_found(&mut self, counterpart: Profile) -> Result<Vec<SessionEffect>, SessionError> {
        if self.phase != SessionPhase::Searching {
            return Err(SessionError::InvalidPhase {
                action: "start the encounter",
                phase: self.phase,
            });
        }

        tracing::debug!("Session matched with {}", counterpart.id);
        self.phase = SessionPhase::Active;
        self.counterpart = Some(counterpart);
        self.reset_clock();

        let mut effects = Vec::with_capacity(2);
        if let (Some(tickets), Some(user_id)) = (self.charge_user.take(), self.user_id.clone()) {
            effects.push(SessionEffect::ChargeTicket {
                user_id,
                remaining_tickets: tickets.saturating_sub(1),
            });
        }
        effects.push(SessionEffect::StartTimer);
        Ok(effects)
    }

    /// One second elapsed. No-op outside the active phase.
    pub fn tick(&mut self) -> Vec<SessionEffect> {
        if self.phase != SessionPhase::Active {
            return Vec::new();
        }

        self.remaining = next_remaining(self.remaining);

        let mut effects = Vec::new();
        if self.remaining == COUNTDOWN_PULSE_AT {
            effects.push(SessionEffect::Haptic(HapticPulse::MEDIUM));
        }
        if self.remaining == 0 {
            self.phase = SessionPhase::Decision;
            effects.push(SessionEffect::StopTimer);
            effects.push(SessionEffect::Haptic(HapticPulse::WARNING));
        }
        effects
    }

    /// Close the decision prompt. Both choices release media identically.
    pub fn decide(&mut self, decision: Decision) -> Result<Vec<SessionEffect>, SessionError> {
        if self.phase != SessionPhase::Decision {
            return Err(SessionError::InvalidPhase {
                action: "decide",
                phase: self.phase,
            });
        }

        let mut effects = Vec::with_capacity(3);
        match decision {
            Decision::Accept => {
                effects.push(SessionEffect::Haptic(HapticPulse::SUCCESS));
                let name = self.counterpart.as_ref().map(|p| p.name.as_str()).unwrap_or("she");
                effects.push(SessionEffect::Notice(format!(
                    "It's a Spark! ✨ If {} matches back, you'll see them in your Sparks.",
                    name
                )));
            }
            Decision::Reject => effects.push(SessionEffect::Haptic(HapticPulse::LIGHT)),
        }

        if let Some(stream) = self.stream.take() {
            effects.push(SessionEffect::ReleaseMedia(stream));
        }
        self.reset();
        Ok(effects)
    }

    /// Forced exit from any non-idle phase.
    pub fn cancel(&mut self) -> Vec<SessionEffect> {
        if self.phase == SessionPhase::Idle {
            return Vec::new();
        }

        tracing::debug!("Session cancelled during {:?}", self.phase);
        let mut effects = vec![SessionEffect::StopTimer];
        if let Some(stream) = self.stream.take() {
            effects.push(SessionEffect::ReleaseMedia(stream));
        }
        self.reset();
        effects
    }

    fn reset_clock(&mut self) {
        self.remaining = self.config.duration_secs;
    }

    fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.user_id = None;
        self.counterpart = None;
        self.charge_user = None;
        self.reset_clock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::Catalog;

    fn profiles() -> (Profile, Profile) {
        let catalog = Catalog::seeded().unwrap();
        (catalog.profiles[0].clone(), catalog.profiles[1].clone())
    }

    fn active_session(config: RevealConfig) -> (BlindSession, Profile) {
        let (user, other) = profiles();
        let mut session = BlindSession::new(config);
        session
            .begin_search(&user, MediaStream::new(MediaConstraints::CAMERA_AND_MIC))
            .unwrap();
        session.match_found(other).unwrap();
        (session, user)
    }

    #[test]
    fn test_starts_idle_and_fully_obscured() {
        let session = BlindSession::new(RevealConfig::default());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.remaining(), 180);
        assert_eq!(session.obscurity(), 45.0);
    }

    #[test]
    fn test_out_of_tickets_is_rejected() {
        let (mut user, _) = profiles();
        user.speed_dating_tickets = 0;
        user.is_premium = false;

        let mut session = BlindSession::new(RevealConfig::default());
        let rejected = session
            .begin_search(&user, MediaStream::new(MediaConstraints::CAMERA_AND_MIC))
            .unwrap_err();

        assert_eq!(rejected.error, SessionError::OutOfTickets);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(!session.holds_stream());
    }

    #[test]
    fn test_premium_never_charged() {
        let (_, mut premium) = profiles();
        premium.is_premium = true;
        premium.speed_dating_tickets = 0;
        let (_, other) = profiles();

        let mut session = BlindSession::new(RevealConfig::default());
        session
            .begin_search(&premium, MediaStream::new(MediaConstraints::CAMERA_AND_MIC))
            .unwrap();
        let effects = session.match_found(other).unwrap();

        assert_eq!(effects, vec![SessionEffect::StartTimer]);
    }

    #[test]
    fn test_match_found_charges_one_ticket() {
        let (user, other) = profiles();
        let mut session = BlindSession::new(RevealConfig::default());
        let effects = session
            .begin_search(&user, MediaStream::new(MediaConstraints::CAMERA_AND_MIC))
            .unwrap();
        assert_eq!(effects, vec![SessionEffect::Haptic(HapticPulse::HEAVY)]);

        let effects = session.match_found(other).unwrap();
        assert_eq!(
            effects,
            vec![
                SessionEffect::ChargeTicket {
                    user_id: user.id.clone(),
                    remaining_tickets: user.speed_dating_tickets - 1,
                },
                SessionEffect::StartTimer,
            ]
        );
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_ticks_follow_reveal_curve() {
        let (mut session, _) = active_session(RevealConfig::default());

        for _ in 0..150 {
            session.tick();
        }
        assert_eq!(session.remaining(), 30);
        assert_eq!(session.obscurity(), 45.0);

        for _ in 0..15 {
            session.tick();
        }
        assert_eq!(session.remaining(), 15);
        assert_eq!(session.obscurity(), 22.5);
    }

    #[test]
    fn test_countdown_pulse_and_expiry() {
        let config = RevealConfig { duration_secs: 12, reveal_start_secs: 6, initial_obscurity: 45.0 };
        let (mut session, _) = active_session(config);

        assert!(session.tick().is_empty()); // 11
        assert_eq!(session.tick(), vec![SessionEffect::Haptic(HapticPulse::MEDIUM)]); // 10
        for _ in 0..9 {
            assert!(session.tick().is_empty());
        }
        assert_eq!(session.remaining(), 1);

        let effects = session.tick();
        assert_eq!(
            effects,
            vec![SessionEffect::StopTimer, SessionEffect::Haptic(HapticPulse::WARNING)]
        );
        assert_eq!(session.phase(), SessionPhase::Decision);
        assert_eq!(session.remaining(), 0);
        assert_eq!(session.obscurity(), 0.0);

        // Further ticks never go below zero or re-trigger expiry
        assert!(session.tick().is_empty());
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_decision_releases_stream_and_resets() {
        let config = RevealConfig { duration_secs: 2, reveal_start_secs: 1, initial_obscurity: 45.0 };
        let (mut session, _) = active_session(config);
        session.tick();
        session.tick();
        assert_eq!(session.phase(), SessionPhase::Decision);

        let effects = session.decide(Decision::Accept).unwrap();
        assert_eq!(effects[0], SessionEffect::Haptic(HapticPulse::SUCCESS));
        assert!(matches!(&effects[1], SessionEffect::Notice(text) if text.contains("Elena")));
        assert_eq!(
            effects.iter().filter(|e| matches!(e, SessionEffect::ReleaseMedia(_))).count(),
            1
        );

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.remaining(), 2);
        assert_eq!(session.obscurity(), 45.0);
        assert!(session.counterpart().is_none());
        assert!(!session.holds_stream());

        // Exactly one decision terminates the prompt
        assert!(session.decide(Decision::Reject).is_err());
    }

    #[test]
    fn test_reject_has_no_notice() {
        let config = RevealConfig { duration_secs: 1, reveal_start_secs: 1, initial_obscurity: 45.0 };
        let (mut session, _) = active_session(config);
        session.tick();

        let effects = session.decide(Decision::Reject).unwrap();
        assert_eq!(effects[0], SessionEffect::Haptic(HapticPulse::LIGHT));
        assert!(!effects.iter().any(|e| matches!(e, SessionEffect::Notice(_))));
        assert!(matches!(effects.last(), Some(SessionEffect::ReleaseMedia(_))));
    }

    #[test]
    fn test_decide_before_expiry_is_rejected() {
        let (mut session, _) = active_session(RevealConfig::default());
        assert!(matches!(
            session.decide(Decision::Accept),
            Err(SessionError::InvalidPhase { .. })
        ));
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_cancel_mid_session() {
        let (mut session, _) = active_session(RevealConfig::default());
        session.tick();

        let effects = session.cancel();
        assert_eq!(effects[0], SessionEffect::StopTimer);
        assert!(matches!(effects[1], SessionEffect::ReleaseMedia(_)));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.remaining(), 180);

        assert!(session.cancel().is_empty());
    }

    #[test]
    fn test_ticks_ignored_outside_active() {
        let mut session = BlindSession::new(RevealConfig::default());
        assert!(session.tick().is_empty());
        assert_eq!(session.remaining(), 180);
    }

    #[test]
    fn test_snapshot_text() {
        let (session, _) = active_session(RevealConfig::default());
        let snapshot = session.snapshot();

        assert_eq!(snapshot.clock, "3:00");
        assert_eq!(snapshot.prompt, crate::core::reveal::VISION_PROMPT);
        assert_eq!(snapshot.counterpart.map(|p| p.id), Some("u2".to_string()));
    }
}
