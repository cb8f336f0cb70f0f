use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AvailabilitySlot, Profile};

#[derive(Debug, Error, PartialEq)]
pub enum AvailabilityError {
    #[error("Unknown day: {0}")]
    UnknownDay(String),

    #[error("Unknown time slot: {0}")]
    UnknownSlot(String),

    #[error("{name} is not available on {day}")]
    DayNotOffered { name: String, day: Day },

    #[error("{name} is not available on {day} {slot}")]
    SlotNotOffered { name: String, day: Day, slot: Slot },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AvailabilityError::UnknownDay(s.to_string()))
    }
}

/// Coarse time window within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Morning, Slot::Afternoon, Slot::Evening, Slot::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Morning => "Morning",
            Slot::Afternoon => "Afternoon",
            Slot::Evening => "Evening",
            Slot::Night => "Night",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AvailabilityError::UnknownSlot(s.to_string()))
    }
}

/// Weekly availability grid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planner {
    windows: BTreeMap<Day, BTreeSet<Slot>>,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh planner: Friday evening and night, Saturday afternoon and evening
    pub fn seeded() -> Self {
        let mut planner = Self::new();
        planner.set(Day::Fri, Slot::Evening);
        planner.set(Day::Fri, Slot::Night);
        planner.set(Day::Sat, Slot::Afternoon);
        planner.set(Day::Sat, Slot::Evening);
        planner
    }

    /// Planner from a profile's availability. Unrecognised entries are skipped.
    pub fn from_profile(profile: &Profile) -> Self {
        Self::from_slots(&profile.availability)
    }

    pub fn from_slots(slots: &[AvailabilitySlot]) -> Self {
        let mut planner = Self::new();
        for entry in slots {
            let Ok(day) = entry.day.parse::<Day>() else {
                tracing::debug!("Skipping unknown day {:?}", entry.day);
                continue;
            };
            for slot in entry.slots.iter().filter_map(|s| s.parse::<Slot>().ok()) {
                planner.set(day, slot);
            }
        }
        planner
    }

    fn set(&mut self, day: Day, slot: Slot) {
        self.windows.entry(day).or_default().insert(slot);
    }

    pub fn contains(&self, day: Day, slot: Slot) -> bool {
        self.windows.get(&day).is_some_and(|slots| slots.contains(&slot))
    }

    /// Flip a window on or off; returns whether it is now on
    pub fn toggle(&mut self, day: Day, slot: Slot) -> bool {
        let slots = self.windows.entry(day).or_default();
        let on = if slots.remove(&slot) {
            false
        } else {
            slots.insert(slot);
            true
        };
        if slots.is_empty() {
            self.windows.remove(&day);
        }
        on
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn windows(&self) -> impl Iterator<Item = (Day, Slot)> + '_ {
        self.windows
            .iter()
            .flat_map(|(day, slots)| slots.iter().map(move |slot| (*day, *slot)))
    }

    /// Back to the profile wire shape, days in week order
    pub fn to_slots(&self) -> Vec<AvailabilitySlot> {
        self.windows
            .iter()
            .map(|(day, slots)| AvailabilitySlot {
                day: day.to_string(),
                slots: slots.iter().map(|s| s.to_string()).collect(),
            })
            .collect()
    }
}

/// Windows both planners share, in week order
pub fn overlap(a: &Planner, b: &Planner) -> Vec<(Day, Slot)> {
    a.windows().filter(|(day, slot)| b.contains(*day, *slot)).collect()
}

/// Proposal for a date in one of the target's open windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeshRequest {
    pub id: Uuid,
    pub target_id: String,
    pub day: Day,
    pub slot: Slot,
    pub note: String,
}

impl SeshRequest {
    /// Validate the day and slot against the target's offered availability
    pub fn new(
        target: &Profile,
        day: &str,
        slot: &str,
        note: impl Into<String>,
    ) -> Result<Self, AvailabilityError> {
        let day: Day = day.parse()?;
        let slot: Slot = slot.parse()?;

        let offered = target
            .availability
            .iter()
            .find(|a| a.day.parse::<Day>().ok() == Some(day))
            .ok_or_else(|| AvailabilityError::DayNotOffered {
                name: target.name.clone(),
                day,
            })?;

        if !offered.slots.iter().any(|s| s.parse::<Slot>().ok() == Some(slot)) {
            return Err(AvailabilityError::SlotNotOffered {
                name: target.name.clone(),
                day,
                slot,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            target_id: target.id.clone(),
            day,
            slot,
            note: note.into(),
        })
    }
}

/// Calendar screen: the user's planner plus the requests sent from it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub planner: Planner,
    pub sent: Vec<SeshRequest>,
}

impl Calendar {
    pub fn seeded() -> Self {
        Self {
            planner: Planner::seeded(),
            sent: Vec::new(),
        }
    }

    pub fn record(&mut self, request: SeshRequest) {
        tracing::info!(
            "Sesh request {} to {} for {} {}",
            request.id,
            request.target_id,
            request.day,
            request.slot
        );
        self.sent.push(request);
    }
}
