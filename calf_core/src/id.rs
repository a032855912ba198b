//! Human-readable record identifiers.
//!
//! An id looks like `261018-1234-female-01`: birth date as `%y%m%d`, the
//! mother tag, the sex, and a two-digit sequence counting earlier calves
//! with the same prefix.

use crate::{AnimalRecord, Sex, UNKNOWN_MOTHER};
use chrono::NaiveDate;

/// Build the `date-mother-sex` prefix shared by same-day siblings
pub fn base_key(birth_date: NaiveDate, mother: &str, sex: Option<Sex>) -> String {
    let mother = mother.trim();
    let mother = if mother.is_empty() { UNKNOWN_MOTHER } else { mother };
    let sex = sex.unwrap_or(Sex::Undetermined);
    format!("{}-{}-{}", birth_date.format("%y%m%d"), mother, sex)
}

/// Generate the next id for a calf, given every record registered so far
///
/// The sequence is one more than the number of existing ids under the same
/// prefix. If that id is somehow taken already, the sequence advances until
/// it is free.
pub fn generate_id(
    birth_date: NaiveDate,
    mother: &str,
    sex: Option<Sex>,
    existing: &[AnimalRecord],
) -> String {
    let base = base_key(birth_date, mother, sex);
    let prefix = format!("{}-", base);

    let siblings = existing
        .iter()
        .filter(|r| r.id.starts_with(&prefix))
        .count();

    let mut seq = siblings + 1;
    loop {
        let candidate = format!("{}{:02}", prefix, seq);
        if !existing.iter().any(|r| r.id == candidate) {
            tracing::debug!("Generated id {} ({} earlier siblings)", candidate, siblings);
            return candidate;
        }
        tracing::warn!("Id {} already taken, advancing sequence", candidate);
        seq += 1;
    }
}
