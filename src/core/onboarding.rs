use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Youngest age allowed into the app
pub const MIN_AGE: i32 = 18;
/// Oldest plausible age; anything above is treated as a typo
pub const MAX_AGE: i32 = 100;
/// Photos needed before the curated set can be submitted
pub const MIN_PHOTOS: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum OnboardingError {
    #[error("Please enter your 4-digit birth year.")]
    MalformedYear,

    #[error("You must be 18+ to enter this scene.")]
    Underage,

    #[error("Please enter a valid birth year.")]
    ImplausibleYear,

    #[error("Photo not found: {0}")]
    PhotoNotFound(Uuid),

    #[error("Upload at least 3 photos and accept the community standards to continue.")]
    NotReady,

    #[error("Identity scan has not finished")]
    ScanIncomplete,
}

/// Check a typed birth year against the current year
pub fn verify_birth_year(input: &str, current_year: i32) -> Result<i32, OnboardingError> {
    let input = input.trim();
    if input.len() != 4 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OnboardingError::MalformedYear);
    }
    let year: i32 = input.parse().map_err(|_| OnboardingError::MalformedYear)?;

    let age = current_year - year;
    if age < MIN_AGE {
        return Err(OnboardingError::Underage);
    }
    if age > MAX_AGE {
        return Err(OnboardingError::ImplausibleYear);
    }
    Ok(age)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStep {
    Intro,
    Scanning,
    Complete,
}

/// Biometric identity step between the age gate and photo curation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityScan {
    pub step: ScanStep,
}

impl Default for IdentityScan {
    fn default() -> Self {
        Self { step: ScanStep::Intro }
    }
}

impl IdentityScan {
    pub fn start(&mut self) {
        if self.step == ScanStep::Intro {
            self.step = ScanStep::Scanning;
        }
    }

    pub fn finish(&mut self) {
        if self.step == ScanStep::Scanning {
            self.step = ScanStep::Complete;
        }
    }

    pub fn confirm(&self) -> Result<(), OnboardingError> {
        if self.step != ScanStep::Complete {
            return Err(OnboardingError::ScanIncomplete);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedPhoto {
    pub id: Uuid,
    pub url: String,
    pub is_private: bool,
    pub is_lead: bool,
}

/// Submitted gallery: public and private URLs, lead photo first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedGallery {
    pub public_photos: Vec<String>,
    pub private_photos: Vec<String>,
}

/// Photo onboarding: uploads, privacy, lead photo and the identity score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCurator {
    photos: Vec<CuratedPhoto>,
    eula_accepted: bool,
}

impl PhotoCurator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photos(&self) -> &[CuratedPhoto] {
        &self.photos
    }

    pub fn eula_accepted(&self) -> bool {
        self.eula_accepted
    }

    pub fn set_eula(&mut self, accepted: bool) {
        self.eula_accepted = accepted;
    }

    /// Append uploads. The first photo ever added becomes the lead.
    pub fn add<I, S>(&mut self, urls: I) -> Vec<Uuid>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let first_upload = self.photos.is_empty();
        let mut ids = Vec::new();
        for (idx, url) in urls.into_iter().enumerate() {
            let photo = CuratedPhoto {
                id: Uuid::new_v4(),
                url: url.into(),
                is_private: false,
                is_lead: first_upload && idx == 0,
            };
            ids.push(photo.id);
            self.photos.push(photo);
        }
        ids
    }

    fn find_mut(&mut self, id: Uuid) -> Result<&mut CuratedPhoto, OnboardingError> {
        self.photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(OnboardingError::PhotoNotFound(id))
    }

    pub fn toggle_private(&mut self, id: Uuid) -> Result<bool, OnboardingError> {
        let photo = self.find_mut(id)?;
        photo.is_private = !photo.is_private;
        Ok(photo.is_private)
    }

    /// Make `id` the only lead photo
    pub fn set_lead(&mut self, id: Uuid) -> Result<(), OnboardingError> {
        if !self.photos.iter().any(|p| p.id == id) {
            return Err(OnboardingError::PhotoNotFound(id));
        }
        for photo in &mut self.photos {
            photo.is_lead = photo.id == id;
        }
        Ok(())
    }

    /// Swap in an edited rendition of a photo
    pub fn replace_url(&mut self, id: Uuid, url: String) -> Result<(), OnboardingError> {
        self.find_mut(id)?.url = url;
        Ok(())
    }

    pub fn url_of(&self, id: Uuid) -> Result<&str, OnboardingError> {
        self.photos
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.url.as_str())
            .ok_or(OnboardingError::PhotoNotFound(id))
    }

    /// Remove a photo; if it was the lead, the first remaining photo takes over
    pub fn remove(&mut self, id: Uuid) -> Result<(), OnboardingError> {
        let pos = self
            .photos
            .iter()
            .position(|p| p.id == id)
            .ok_or(OnboardingError::PhotoNotFound(id))?;
        self.photos.remove(pos);

        if !self.photos.iter().any(|p| p.is_lead) {
            if let Some(first) = self.photos.first_mut() {
                first.is_lead = true;
            }
        }
        Ok(())
    }

    pub fn has_lead(&self) -> bool {
        self.photos.iter().any(|p| p.is_lead)
    }

    /// Identity score shown above the grid, 0..=100
    pub fn completion(&self) -> u8 {
        let n = self.photos.len();
        let mut progress = (n * 15).min(60);
        if self.has_lead() {
            progress += 10;
        }
        if self.eula_accepted {
            progress += 15;
        }
        if n >= 4 {
            progress += 15;
        }
        progress.min(100) as u8
    }

    /// Nudge under the score; none once complete
    pub fn hint(&self) -> Option<&'static str> {
        match self.completion() {
            100 => None,
            c if c < 40 => Some("Upload 3+ intentional photos"),
            c if c < 75 => Some("Select your Lead photo"),
            _ => Some("Accept standards to launch"),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.photos.len() >= MIN_PHOTOS && self.eula_accepted
    }

    pub fn submit(&self) -> Result<CuratedGallery, OnboardingError> {
        if !self.is_ready() {
            return Err(OnboardingError::NotReady);
        }

        let mut sorted: Vec<&CuratedPhoto> = self.photos.iter().collect();
        sorted.sort_by_key(|p| !p.is_lead);

        let (private, public): (Vec<&CuratedPhoto>, Vec<&CuratedPhoto>) =
            sorted.into_iter().partition(|p| p.is_private);

        Ok(CuratedGallery {
            public_photos: public.into_iter().map(|p| p.url.clone()).collect(),
            private_photos: private.into_iter().map(|p| p.url.clone()).collect(),
        })
    }
}
