//! Health events: rendering, parsing from session input, and the flag each
//! observation kind drives on the parent record.

use crate::{
    DiseaseStage, DiseaseStatus, Error, FecesState, HealthEvent, HealthEventKind, Result,
};
use std::fmt;

impl HealthEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthEventKind::Vaccination => "vaccination",
            HealthEventKind::Treatment => "treatment",
            HealthEventKind::FecesObservation => "feces-observation",
            HealthEventKind::DiseaseObservation => "disease-observation",
            HealthEventKind::Note => "note",
        }
    }
}

impl fmt::Display for HealthEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HealthEvent {
    pub fn kind(&self) -> HealthEventKind {
        match self {
            HealthEvent::Vaccination { .. } => HealthEventKind::Vaccination,
            HealthEvent::Treatment { .. } => HealthEventKind::Treatment,
            HealthEvent::FecesObservation { .. } => HealthEventKind::FecesObservation,
            HealthEvent::DiseaseObservation { .. } => HealthEventKind::DiseaseObservation,
            HealthEvent::Note { .. } => HealthEventKind::Note,
        }
    }

    /// Short bracketed tag used in the rendered detail
    pub fn tag(&self) -> &'static str {
        match self {
            HealthEvent::Vaccination { .. } => "vaccine",
            HealthEvent::Treatment { .. } => "treatment",
            HealthEvent::FecesObservation { .. } => "feces",
            HealthEvent::DiseaseObservation { .. } => "disease",
            HealthEvent::Note { .. } => "note",
        }
    }

    pub fn payload(&self) -> String {
        match self {
            HealthEvent::Vaccination { vaccine } => vaccine.clone(),
            HealthEvent::Treatment {
                symptom,
                medication,
            } => format!("{} :: {}", symptom, medication),
            HealthEvent::FecesObservation { state } => state.to_string(),
            HealthEvent::DiseaseObservation { .. } => self
                .disease_status()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            HealthEvent::Note { text } => text.clone(),
        }
    }

    /// Rendered as `[tag] payload`
    pub fn detail(&self) -> String {
        format!("[{}] {}", self.tag(), self.payload())
    }

    /// Feces flag this event sets on the record, if any
    pub fn feces_state(&self) -> Option<FecesState> {
        match self {
            HealthEvent::FecesObservation { state } => Some(*state),
            _ => None,
        }
    }

    /// Disease flag this event sets on the record, if any
    pub fn disease_status(&self) -> Option<DiseaseStatus> {
        match self {
            HealthEvent::DiseaseObservation { name, stage } => Some(DiseaseStatus::Observed {
                name: name.clone(),
                stage: *stage,
            }),
            _ => None,
        }
    }

    /// Parse a kind token followed by free-text words
    ///
    /// - `vaccine <name...>`
    /// - `treatment <symptom...> :: <medication...>`
    /// - `feces <state>`
    /// - `disease <name...> [(<stage>)]`
    /// - `note <text...>`
    pub fn parse(kind: &str, words: &[String]) -> Result<Self> {
        let text = words.join(" ").trim().to_string();

        let event = match kind.trim().to_lowercase().as_str() {
            "vaccine" | "vaccination" => HealthEvent::Vaccination {
                vaccine: non_empty(text, "vaccine name")?,
            },
            "treatment" | "treat" => {
                let (symptom, medication) = match text.split_once("::") {
                    Some((s, m)) => (s.trim().to_string(), m.trim().to_string()),
                    None => (text, String::new()),
                };
                HealthEvent::Treatment {
                    symptom: non_empty(symptom, "symptom")?,
                    medication,
                }
            }
            "feces" | "feces-observation" => HealthEvent::FecesObservation {
                state: text.parse()?,
            },
            "disease" | "disease-observation" => {
                let (name, stage) = split_stage(&text);
                HealthEvent::DiseaseObservation {
                    name: non_empty(name, "disease name")?,
                    stage,
                }
            }
            "note" => HealthEvent::Note {
                text: non_empty(text, "note text")?,
            },
            other => {
                return Err(Error::Parse(format!(
                    "unknown log type '{}' (expected vaccine, treatment, feces, disease or note)",
                    other
                )))
            }
        };
        Ok(event)
    }
}

impl fmt::Display for HealthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.tag(), self.payload())
    }
}

fn non_empty(value: String, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        Err(Error::Validation(format!("{} must not be empty", what)))
    } else {
        Ok(value)
    }
}

/// Split a trailing `(stage)` off a disease description
///
/// Parentheses that do not hold a known stage stay part of the name.
fn split_stage(text: &str) -> (String, Option<DiseaseStage>) {
    if let Some(rest) = text.strip_suffix(')') {
        if let Some((name, stage)) = rest.rsplit_once('(') {
            if let Ok(stage) = stage.parse::<DiseaseStage>() {
                return (name.trim().to_string(), Some(stage));
            }
        }
    }
    (text.to_string(), None)
}
