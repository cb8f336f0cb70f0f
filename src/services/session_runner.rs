use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::core::effects::Effect;
use crate::core::reveal::RevealConfig;
use crate::core::session::{
    BeginRejected, BlindSession, Decision, MediaConstraints, SessionEffect, SessionError,
    SessionSnapshot,
};
use crate::services::catalog::ProfileStore;
use crate::services::haptics::{fire, HapticSink};
use crate::services::media::MediaDevice;

/// Timing of the simulated matchmaker and the countdown
#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    pub match_delay: Duration,
    pub tick: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            match_delay: Duration::from_secs(4),
            tick: Duration::from_secs(1),
        }
    }
}

struct Shared {
    session: tokio::sync::Mutex<BlindSession>,
    media: Arc<dyn MediaDevice>,
    haptics: Arc<dyn HapticSink>,
    profiles: Arc<ProfileStore>,
    timing: SessionTiming,
    /// Bumped on every start and every exit; a timer task whose epoch is stale
    /// must not touch the session
    epoch: AtomicU64,
}

impl Shared {
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Run session effects against the ports. Returns what the shell must
    /// still see (notices).
    async fn apply(&self, effects: Vec<SessionEffect>) -> Vec<Effect> {
        let mut shell = Vec::new();
        for effect in effects {
            match effect {
                SessionEffect::Haptic(pulse) => fire(self.haptics.as_ref(), pulse),
                SessionEffect::StartTimer => tracing::debug!("Countdown started"),
                SessionEffect::StopTimer => tracing::debug!("Countdown stopped"),
                SessionEffect::ReleaseMedia(stream) => {
                    if let Err(e) = self.media.release(stream) {
                        tracing::warn!("Failed to release capture stream: {}", e);
                    }
                }
                SessionEffect::ChargeTicket { user_id, remaining_tickets } => {
                    if let Err(e) = self.profiles.update_tickets(&user_id, remaining_tickets).await {
                        tracing::warn!("Failed to charge ticket: {}", e);
                    }
                }
                SessionEffect::Notice(text) => shell.push(Effect::Notice(text)),
            }
        }
        shell
    }
}

/// Drives one [`BlindSession`] in real time.
///
/// Owns the only timer task for the session. The task is aborted on decision,
/// cancel and drop.
pub struct SessionController {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        config: RevealConfig,
        timing: SessionTiming,
        media: Arc<dyn MediaDevice>,
        haptics: Arc<dyn HapticSink>,
        profiles: Arc<ProfileStore>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: tokio::sync::Mutex::new(BlindSession::new(config)),
                media,
                haptics,
                profiles,
                timing,
                epoch: AtomicU64::new(0),
            }),
            timer: Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.session.lock().await.snapshot()
    }

    /// Join the blind sesh queue as `user_id`.
    ///
    /// Capture is acquired before the session moves; if it fails the session
    /// stays idle and no timer exists.
    pub async fn start(&self, user_id: &str) -> Result<SessionSnapshot, SessionError> {
        let user = self
            .shared
            .profiles
            .get(user_id)
            .await
            .map_err(|_| SessionError::UnknownUser(user_id.to_string()))?;

        self.shared.session.lock().await.can_begin(&user)?;

        let stream = self
            .shared
            .media
            .acquire(MediaConstraints::CAMERA_AND_MIC)
            .await
            .map_err(|e| {
                tracing::info!("Blind sesh capture refused: {}", e);
                SessionError::PermissionDenied
            })?;

        let mut session = self.shared.session.lock().await;
        let effects = match session.begin_search(&user, stream) {
            Ok(effects) => effects,
            Err(BeginRejected { error, stream }) => {
                if let Err(e) = self.shared.media.release(stream) {
                    tracing::warn!("Failed to release rejected stream: {}", e);
                }
                return Err(error);
            }
        };
        self.shared.apply(effects).await;

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = tokio::spawn(run_timer(self.shared.clone(), epoch, user.id.clone()));
        self.replace_timer(Some(handle));

        tracing::info!("{} joined the blind sesh queue", user.id);
        Ok(session.snapshot())
    }

    /// Answer the decision prompt
    pub async fn decide(&self, decision: Decision) -> Result<Vec<Effect>, SessionError> {
        let mut session = self.shared.session.lock().await;
        let effects = session.decide(decision)?;
        self.stop_timer();
        tracing::info!("Blind sesh decided: {:?}", decision);
        Ok(self.shared.apply(effects).await)
    }

    /// Leave the session from any phase
    pub async fn cancel(&self) -> Vec<Effect> {
        let mut session = self.shared.session.lock().await;
        let effects = session.cancel();
        self.stop_timer();
        self.shared.apply(effects).await
    }

    fn stop_timer(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.replace_timer(None);
    }

    fn replace_timer(&self, next: Option<JoinHandle<()>>) {
        match self.timer.lock() {
            Ok(mut timer) => {
                if let Some(previous) = std::mem::replace(&mut *timer, next) {
                    previous.abort();
                }
            }
            Err(e) => tracing::error!("Timer slot poisoned: {}", e),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop_timer();
        if let Ok(mut session) = self.shared.session.try_lock() {
            for effect in session.cancel() {
                if let SessionEffect::ReleaseMedia(stream) = effect {
                    if let Err(e) = self.shared.media.release(stream) {
                        tracing::warn!("Failed to release stream on teardown: {}", e);
                    }
                }
            }
        }
    }
}

/// Wait for the simulated match, then count down until the decision prompt
async fn run_timer(shared: Arc<Shared>, epoch: u64, user_id: String) {
    tokio::time::sleep(shared.timing.match_delay).await;

    let counterpart = match shared.profiles.pick_counterpart(&user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("No counterpart for blind sesh: {}", e);
            return;
        }
    };

    {
        let mut session = shared.session.lock().await;
        if !shared.is_current(epoch) {
            return;
        }
        match session.match_found(counterpart) {
            Ok(effects) => {
                shared.apply(effects).await;
            }
            Err(e) => {
                tracing::warn!("Match arrived too late: {}", e);
                return;
            }
        }
    }

    let period = shared.timing.tick;
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;

        let mut session = shared.session.lock().await;
        if !shared.is_current(epoch) {
            return;
        }
        let effects = session.tick();
        let finished = effects.contains(&SessionEffect::StopTimer);
        shared.apply(effects).await;
        if finished {
            tracing::debug!("Blind sesh reached the decision prompt");
            return;
        }
    }
}
