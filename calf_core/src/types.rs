//! Core domain types for calfbook.
//!
//! This module defines the fundamental types used throughout the system:
//! - Sex, lifecycle status and health flags
//! - Animal records and their growth measurements
//! - Health events and log entries
//! - Derived-metric result types

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Mother tag stored when the dam is not known
pub const UNKNOWN_MOTHER: &str = "unknown";

// ============================================================================
// Sex and Status
// ============================================================================

/// Recorded sex of a calf
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    /// Not yet determined at registration
    Undetermined,
    Unknown,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Undetermined => "undetermined",
            Sex::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "bull" => Ok(Sex::Male),
            "female" | "f" | "heifer" => Ok(Sex::Female),
            "undetermined" | "u" => Ok(Sex::Undetermined),
            "unknown" => Ok(Sex::Unknown),
            other => Err(Error::Parse(format!("unknown sex '{}'", other))),
        }
    }
}

/// Lifecycle status of an animal
///
/// Which values are valid depends on the animal's sex, see [`crate::status`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    SoldAsCalf,
    Fattening,
    /// Kept back as a breeding bull
    BreedingStockSelected,
    /// Kept back as a replacement heifer
    ReplacementStockSelected,
    Deceased,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::SoldAsCalf => "sold-as-calf",
            Status::Fattening => "fattening",
            Status::BreedingStockSelected => "breeding-stock-selected",
            Status::ReplacementStockSelected => "replacement-stock-selected",
            Status::Deceased => "deceased",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "active" => Ok(Status::Active),
            "sold-as-calf" | "sold" => Ok(Status::SoldAsCalf),
            "fattening" => Ok(Status::Fattening),
            "breeding-stock-selected" | "breeding-stock" | "kpn" => {
                Ok(Status::BreedingStockSelected)
            }
            "replacement-stock-selected" | "replacement-stock" | "replacement" => {
                Ok(Status::ReplacementStockSelected)
            }
            "deceased" | "dead" => Ok(Status::Deceased),
            other => Err(Error::Parse(format!("unknown status '{}'", other))),
        }
    }
}

// ============================================================================
// Health Flags
// ============================================================================

/// Last observed feces condition
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FecesState {
    #[default]
    Normal,
    Loose,
    Diarrhea,
    Bloody,
    Constipated,
}

impl FecesState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FecesState::Normal => "normal",
            FecesState::Loose => "loose",
            FecesState::Diarrhea => "diarrhea",
            FecesState::Bloody => "bloody",
            FecesState::Constipated => "constipated",
        }
    }
}

impl fmt::Display for FecesState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FecesState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(FecesState::Normal),
            "loose" => Ok(FecesState::Loose),
            "diarrhea" | "scours" => Ok(FecesState::Diarrhea),
            "bloody" => Ok(FecesState::Bloody),
            "constipated" => Ok(FecesState::Constipated),
            other => Err(Error::Parse(format!("unknown feces state '{}'", other))),
        }
    }
}

/// Progress of an observed disease
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseStage {
    Suspected,
    UnderTreatment,
    Recovered,
}

impl DiseaseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseStage::Suspected => "suspected",
            DiseaseStage::UnderTreatment => "under-treatment",
            DiseaseStage::Recovered => "recovered",
        }
    }
}

impl fmt::Display for DiseaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiseaseStage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "suspected" => Ok(DiseaseStage::Suspected),
            "under-treatment" | "treating" => Ok(DiseaseStage::UnderTreatment),
            "recovered" => Ok(DiseaseStage::Recovered),
            other => Err(Error::Parse(format!("unknown disease stage '{}'", other))),
        }
    }
}

/// Current disease flag of an animal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiseaseStatus {
    #[default]
    Normal,
    Observed {
        name: String,
        stage: Option<DiseaseStage>,
    },
}

impl DiseaseStatus {
    /// An observed disease without a stage
    pub fn observed(name: impl Into<String>) -> Self {
        DiseaseStatus::Observed {
            name: name.into(),
            stage: None,
        }
    }
}

impl fmt::Display for DiseaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiseaseStatus::Normal => f.write_str("normal"),
            DiseaseStatus::Observed { name, stage: None } => f.write_str(name),
            DiseaseStatus::Observed {
                name,
                stage: Some(stage),
            } => write!(f, "{} ({})", name, stage),
        }
    }
}

// ============================================================================
// Animal Record
// ============================================================================

/// Colostrum fed after birth
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Colostrum {
    None,
    Maternal,
    /// Powdered substitute; the volume only exists for this variant
    Powder { volume_ml: f64 },
}

impl Colostrum {
    /// Build from a type token and an optional powder volume
    pub fn from_parts(kind: &str, volume_ml: Option<f64>) -> Result<Self> {
        match kind.trim().to_lowercase().as_str() {
            "none" => Ok(Colostrum::None),
            "maternal" => Ok(Colostrum::Maternal),
            "powder" => {
                let volume_ml = volume_ml.unwrap_or(0.0);
                if !volume_ml.is_finite() || volume_ml < 0.0 {
                    return Err(Error::Validation(format!(
                        "powder volume must be a non-negative number, got {}",
                        volume_ml
                    )));
                }
                Ok(Colostrum::Powder { volume_ml })
            }
            other => Err(Error::Parse(format!("unknown colostrum type '{}'", other))),
        }
    }
}

impl fmt::Display for Colostrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colostrum::None => f.write_str("none"),
            Colostrum::Maternal => f.write_str("maternal"),
            Colostrum::Powder { volume_ml } => write!(f, "powder ({}ml)", volume_ml),
        }
    }
}

/// Weaning event; both fields are always present together
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Weaning {
    pub date: NaiveDate,
    pub weight: f64,
}

/// An ad hoc weight measurement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodicWeight {
    pub date: NaiveDate,
    pub weight: f64,
}

/// Opaque reference to a captured photo (path, URI or blob key)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

/// Input for registering a newborn calf
#[derive(Clone, Debug)]
pub struct Registration {
    pub birth_date: NaiveDateTime,
    /// Blank when the dam's tag is not known
    pub mother: String,
    /// `None` when the sex was not recorded
    pub sex: Option<Sex>,
    pub birth_weight: f64,
    pub photo: Option<PhotoRef>,
    pub navel_disinfected: bool,
    pub colostrum: Colostrum,
    pub initial_event: Option<HealthEvent>,
}

/// A single calf's record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimalRecord {
    pub id: String,
    pub official_id: Option<String>,
    pub birth_date: NaiveDateTime,
    pub mother: String,
    pub sex: Sex,
    pub birth_weight: f64,
    /// Manually entered snapshot, never derived from measurements
    pub current_weight: f64,
    pub photo: Option<PhotoRef>,
    pub navel_disinfected: bool,
    pub colostrum: Colostrum,
    pub status: Status,
    pub feces_state: FecesState,
    pub disease_status: DiseaseStatus,
    pub weaning: Option<Weaning>,
    pub periodic_weights: Vec<PeriodicWeight>,
    pub registered_at: NaiveDateTime,
}

impl AnimalRecord {
    /// Build a fresh record from a registration, filling every field
    pub fn new(id: String, registration: &Registration, registered_at: NaiveDateTime) -> Self {
        let mother = registration.mother.trim();
        Self {
            id,
            official_id: None,
            birth_date: registration.birth_date,
            mother: if mother.is_empty() {
                UNKNOWN_MOTHER.to_string()
            } else {
                mother.to_string()
            },
            sex: registration.sex.unwrap_or(Sex::Undetermined),
            birth_weight: registration.birth_weight,
            current_weight: registration.birth_weight,
            photo: registration.photo.clone(),
            navel_disinfected: registration.navel_disinfected,
            colostrum: registration.colostrum.clone(),
            status: Status::Active,
            feces_state: FecesState::Normal,
            disease_status: DiseaseStatus::Normal,
            weaning: None,
            periodic_weights: Vec::new(),
            registered_at,
        }
    }
}

// ============================================================================
// Health Log
// ============================================================================

/// Kind of a health log entry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HealthEventKind {
    Vaccination,
    Treatment,
    FecesObservation,
    DiseaseObservation,
    Note,
}

/// What happened, with a payload typed per kind
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthEvent {
    Vaccination {
        vaccine: String,
    },
    Treatment {
        symptom: String,
        medication: String,
    },
    FecesObservation {
        state: FecesState,
    },
    DiseaseObservation {
        name: String,
        stage: Option<DiseaseStage>,
    },
    Note {
        text: String,
    },
}

/// One append-only line of an animal's health history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthLogEntry {
    pub entry_id: Uuid,
    pub animal_id: String,
    pub timestamp: NaiveDateTime,
    pub event: HealthEvent,
}

// ============================================================================
// Derived Metrics and Queries
// ============================================================================

/// Where a resolved weight came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    Birth,
    PostWeaning,
    Periodic,
}

impl WeightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightSource::Birth => "birth",
            WeightSource::PostWeaning => "post-weaning",
            WeightSource::Periodic => "periodic",
        }
    }
}

impl fmt::Display for WeightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent dated weight observation of a record
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LatestWeight {
    pub weight: f64,
    pub source: WeightSource,
    pub date: NaiveDate,
}

/// Traceability registration state shown in lists
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationTag {
    /// Still within the registration window
    Incubator,
    /// Past the window without an official id
    Overdue,
    Registered,
}

impl RegistrationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationTag::Incubator => "incubator",
            RegistrationTag::Overdue => "overdue",
            RegistrationTag::Registered => "registered",
        }
    }
}

impl fmt::Display for RegistrationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criteria for listing animals; empty fields match everything
#[derive(Clone, Debug, Default)]
pub struct AnimalFilter {
    pub born_on: Option<NaiveDate>,
    /// Substring of the id or the mother tag
    pub text: Option<String>,
    pub statuses: Vec<Status>,
}
