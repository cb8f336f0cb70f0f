use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::effects::{Effect, HapticPulse};

#[derive(Debug, Error, PartialEq)]
pub enum RouterError {
    #[error("Action {action} is not allowed while {auth:?}")]
    InvalidTransition { action: &'static str, auth: AuthState },
}

/// Where the user is in the sign-in funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    Landing,
    Verifying,
    Identity,
    Onboarding,
    Authorized,
}

/// Tabs reachable once authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    Discovery,
    Messages,
    Calendar,
    Events,
    Live,
    Profile,
    Vault,
    Spark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Action {
    Login,
    CreateAccount,
    AgeVerified,
    IdentityConfirmed,
    OnboardingComplete,
    Navigate(AppView),
    ShowPremium,
    DismissPremium,
    DismissHype,
    /// A like turned into an instant match with the given profile
    MatchFound(String),
    ScheduleSesh,
    KeepExploring,
    Reset,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::CreateAccount => "createAccount",
            Action::AgeVerified => "ageVerified",
            Action::IdentityConfirmed => "identityConfirmed",
            Action::OnboardingComplete => "onboardingComplete",
            Action::Navigate(_) => "navigate",
            Action::ShowPremium => "showPremium",
            Action::DismissPremium => "dismissPremium",
            Action::DismissHype => "dismissHype",
            Action::MatchFound(_) => "matchFound",
            Action::ScheduleSesh => "scheduleSesh",
            Action::KeepExploring => "keepExploring",
            Action::Reset => "reset",
        }
    }

    /// Auth state the action is accepted in
    fn required_auth(&self) -> AuthState {
        match self {
            Action::Login | Action::CreateAccount => AuthState::Landing,
            Action::AgeVerified => AuthState::Verifying,
            Action::IdentityConfirmed => AuthState::Identity,
            Action::OnboardingComplete => AuthState::Onboarding,
            _ => AuthState::Authorized,
        }
    }
}

/// Root controller state of the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub auth: AuthState,
    pub view: AppView,
    pub show_hype: bool,
    pub show_premium: bool,
    pub match_overlay: Option<String>,
    pub current_user: String,
}

impl AppState {
    /// State at launch. A persisted verified flag skips the funnel.
    pub fn restore(verified: bool, current_user: impl Into<String>) -> Self {
        Self {
            auth: if verified { AuthState::Authorized } else { AuthState::Landing },
            view: AppView::Discovery,
            show_hype: false,
            show_premium: false,
            match_overlay: None,
            current_user: current_user.into(),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.auth == AuthState::Authorized
    }

    /// Refuse a signed-in screen action until the funnel is complete
    pub fn require_authorized(&self, action: &'static str) -> Result<(), RouterError> {
        if self.is_authorized() {
            Ok(())
        } else {
            Err(RouterError::InvalidTransition {
                action,
                auth: self.auth,
            })
        }
    }

    /// Apply an action. The state is left untouched when the action is rejected.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Effect>, RouterError> {
        if action.required_auth() != self.auth {
            return Err(RouterError::InvalidTransition {
                action: action.name(),
                auth: self.auth,
            });
        }
        tracing::debug!("Dispatch {} in {:?}/{:?}", action.name(), self.auth, self.view);

        let effects = match action {
            Action::Login | Action::OnboardingComplete => self.authorize(),
            Action::CreateAccount => self.advance(AuthState::Verifying),
            Action::AgeVerified => self.advance(AuthState::Identity),
            Action::IdentityConfirmed => self.advance(AuthState::Onboarding),
            Action::Navigate(view) => self.navigate(view),
            Action::ShowPremium => {
                self.show_premium = true;
                Vec::new()
            }
            Action::DismissPremium => {
                self.show_premium = false;
                Vec::new()
            }
            Action::DismissHype => {
                self.show_hype = false;
                Vec::new()
            }
            Action::MatchFound(profile_id) => {
                self.match_overlay = Some(profile_id);
                Vec::new()
            }
            Action::ScheduleSesh => {
                self.match_overlay = None;
                self.navigate(AppView::Calendar)
            }
            Action::KeepExploring => {
                self.match_overlay = None;
                Vec::new()
            }
            Action::Reset => {
                *self = Self::restore(false, std::mem::take(&mut self.current_user));
                vec![Effect::PersistVerified(false)]
            }
        };
        Ok(effects)
    }

    fn advance(&mut self, next: AuthState) -> Vec<Effect> {
        self.auth = next;
        Vec::new()
    }

    fn authorize(&mut self) -> Vec<Effect> {
        self.auth = AuthState::Authorized;
        self.show_hype = true;
        vec![
            Effect::PersistVerified(true),
            Effect::Haptic(HapticPulse::SUCCESS),
        ]
    }

    fn navigate(&mut self, view: AppView) -> Vec<Effect> {
        if view == self.view {
            return Vec::new();
        }
        self.view = view;
        vec![Effect::Haptic(HapticPulse::LIGHT), Effect::ScrollToTop]
    }
}
