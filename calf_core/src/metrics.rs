//! Derived metrics computed from a record.
//!
//! All functions here are pure queries; `now` is passed in so callers and
//! tests control the clock.

use crate::{AnimalRecord, LatestWeight, RegistrationTag, WeightSource};
use chrono::NaiveDateTime;

/// Whole days elapsed since birth (negative for future birth dates)
pub fn age_in_days(record: &AnimalRecord, now: NaiveDateTime) -> i64 {
    now.signed_duration_since(record.birth_date).num_days()
}

/// Resolve the most recently dated weight observation
///
/// Observations are compared by calendar date. On equal dates any later
/// observation displaces birth weight, otherwise the first recorded one
/// stands (weaning before periodic, periodic entries in append order).
pub fn latest_weight(record: &AnimalRecord) -> LatestWeight {
    let birth = LatestWeight {
        weight: record.birth_weight,
        source: WeightSource::Birth,
        date: record.birth_date.date(),
    };

    let weaning = record.weaning.iter().map(|w| LatestWeight {
        weight: w.weight,
        source: WeightSource::PostWeaning,
        date: w.date,
    });

    let periodic = record.periodic_weights.iter().map(|p| LatestWeight {
        weight: p.weight,
        source: WeightSource::Periodic,
        date: p.date,
    });

    weaning
        .chain(periodic)
        .fold(birth, |latest, observation| {
            let newer = match latest.source {
                WeightSource::Birth => observation.date >= latest.date,
                _ => observation.date > latest.date,
            };
            if newer {
                observation
            } else {
                latest
            }
        })
}

/// Average daily gain in kg/day from birth weight to the current weight
///
/// Uses the manually entered `current_weight`. Returns 0 when the calf is
/// less than one whole day old or the birth date lies in the future.
pub fn average_daily_gain(record: &AnimalRecord, now: NaiveDateTime) -> f64 {
    let days = age_in_days(record, now);
    if days <= 0 {
        return 0.0;
    }
    (record.current_weight - record.birth_weight) / days as f64
}

/// Traceability tag: incubator until `threshold_days`, then registered or overdue
pub fn registration_tag(
    record: &AnimalRecord,
    now: NaiveDateTime,
    threshold_days: i64,
) -> RegistrationTag {
    if age_in_days(record, now) <= threshold_days {
        RegistrationTag::Incubator
    } else if record.official_id.is_some() {
        RegistrationTag::Registered
    } else {
        RegistrationTag::Overdue
    }
}
