//! Coupling between sex and the lifecycle statuses an animal may take.
//!
//! Transitions are free within the allowed set; there is no forward-only
//! ordering.

use crate::{Error, Result, Sex, Status};
use once_cell::sync::Lazy;

const MALE_STATUSES: &[Status] = &[
    Status::Active,
    Status::SoldAsCalf,
    Status::Fattening,
    Status::BreedingStockSelected,
    Status::Deceased,
];

const FEMALE_STATUSES: &[Status] = &[
    Status::Active,
    Status::SoldAsCalf,
    Status::Fattening,
    Status::ReplacementStockSelected,
    Status::Deceased,
];

const UNSEXED_STATUSES: &[Status] = &[Status::Active, Status::Deceased];

/// Every status any sex can take, sorted and deduplicated (for filters)
static ALL_STATUSES: Lazy<Vec<Status>> = Lazy::new(|| {
    let mut all: Vec<Status> = [Sex::Male, Sex::Female, Sex::Undetermined, Sex::Unknown]
        .iter()
        .flat_map(|sex| allowed_statuses(*sex).iter().copied())
        .collect();
    all.sort();
    all.dedup();
    all
});

/// Statuses valid for the given sex
pub fn allowed_statuses(sex: Sex) -> &'static [Status] {
    match sex {
        Sex::Male => MALE_STATUSES,
        Sex::Female => FEMALE_STATUSES,
        Sex::Undetermined | Sex::Unknown => UNSEXED_STATUSES,
    }
}

pub fn all_statuses() -> &'static [Status] {
    &ALL_STATUSES
}

pub fn is_allowed(sex: Sex, status: Status) -> bool {
    allowed_statuses(sex).contains(&status)
}

/// Reject a status that the sex does not permit
pub fn check_status(sex: Sex, status: Status) -> Result<()> {
    if is_allowed(sex, status) {
        Ok(())
    } else {
        Err(Error::InvalidStatus { status, sex })
    }
}

/// Status to keep after a sex change: unchanged if still valid, else active
pub fn clamp_status(sex: Sex, status: Status) -> Status {
    if is_allowed(sex, status) {
        status
    } else {
        Status::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_male_cannot_be_replacement_stock() {
        assert!(check_status(Sex::Male, Status::BreedingStockSelected).is_ok());
        let err = check_status(Sex::Male, Status::ReplacementStockSelected).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidStatus {
                status: Status::ReplacementStockSelected,
                sex: Sex::Male
            }
        ));
    }

    #[test]
    fn test_female_cannot_be_breeding_stock() {
        assert!(!is_allowed(Sex::Female, Status::BreedingStockSelected));
        assert!(is_allowed(Sex::Female, Status::ReplacementStockSelected));
    }

    #[test]
    fn test_unsexed_only_active_or_deceased() {
        for sex in [Sex::Undetermined, Sex::Unknown] {
            assert_eq!(allowed_statuses(sex), &[Status::Active, Status::Deceased]);
        }
    }

    #[test]
    fn test_every_sex_allows_active_and_deceased() {
        for sex in [Sex::Male, Sex::Female, Sex::Undetermined, Sex::Unknown] {
            assert!(is_allowed(sex, Status::Active));
            assert!(is_allowed(sex, Status::Deceased));
        }
    }

    #[test]
    fn test_all_statuses_is_union() {
        let all = all_statuses();
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_clamp_status() {
        assert_eq!(
            clamp_status(Sex::Undetermined, Status::Fattening),
            Status::Active
        );
        assert_eq!(clamp_status(Sex::Female, Status::Fattening), Status::Fattening);
        assert_eq!(clamp_status(Sex::Male, Status::Deceased), Status::Deceased);
    }
}
