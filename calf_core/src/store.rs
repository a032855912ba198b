//! In-memory record store for one session.
//!
//! The store owns every animal record and the append-only health log. All
//! mutation goes through its methods so that a health observation and the
//! flag it drives are always written together.

use crate::config::HerdConfig;
use crate::{
    id, status, AnimalFilter, AnimalRecord, DiseaseStatus, Error, FecesState, HealthEvent,
    HealthLogEntry, PeriodicWeight, Registration, Result, Sex, Status, Weaning,
};
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Longest official traceability number accepted
pub const OFFICIAL_ID_MAX_LEN: usize = 12;

/// Session-scoped collection of animal records and their health history
#[derive(Debug, Clone)]
pub struct RecordStore {
    animals: Vec<AnimalRecord>,
    health_log: Vec<HealthLogEntry>,
    vaccines: Vec<String>,
    mother_tag_max_len: usize,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(&HerdConfig::default())
    }
}

impl RecordStore {
    /// Create an empty store using the herd settings from configuration
    pub fn new(herd: &HerdConfig) -> Self {
        let mut store = Self {
            animals: Vec::new(),
            health_log: Vec::new(),
            vaccines: Vec::new(),
            mother_tag_max_len: herd.mother_tag_max_len,
        };
        for vaccine in &herd.vaccines {
            store.add_vaccine(vaccine);
        }
        store
    }

    /// All records in registration order
    pub fn animals(&self) -> &[AnimalRecord] {
        &self.animals
    }

    /// The whole health log in append order
    pub fn health_log(&self) -> &[HealthLogEntry] {
        &self.health_log
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn get(&self, id: &str) -> Result<&AnimalRecord> {
        self.animals
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut AnimalRecord> {
        self.animals
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    // ========================================================================
    // Registration and listing
    // ========================================================================

    /// Register a newborn calf and return the stored record
    ///
    /// Either a mother tag or a photo is required so the calf can be told
    /// apart later. An initial health event, if given, is logged at `now`.
    pub fn register(
        &mut self,
        registration: Registration,
        now: NaiveDateTime,
    ) -> Result<&AnimalRecord> {
        let mother = registration.mother.trim();
        if mother.is_empty() && registration.photo.is_none() {
            return Err(Error::Validation(
                "a mother tag or a photo is required".into(),
            ));
        }
        if mother.chars().count() > self.mother_tag_max_len {
            return Err(Error::Validation(format!(
                "mother tag '{}' is longer than {} characters",
                mother, self.mother_tag_max_len
            )));
        }
        validate_weight(registration.birth_weight, "birth weight")?;
        if let crate::Colostrum::Powder { volume_ml } = registration.colostrum {
            if !volume_ml.is_finite() || volume_ml < 0.0 {
                return Err(Error::Validation(format!(
                    "powder volume must be a non-negative number, got {}",
                    volume_ml
                )));
            }
        }

        let new_id = id::generate_id(
            registration.birth_date.date(),
            &registration.mother,
            registration.sex,
            &self.animals,
        );
        let record = AnimalRecord::new(new_id.clone(), &registration, now);
        self.animals.push(record);
        tracing::info!("Registered {}", new_id);

        if let Some(event) = registration.initial_event {
            self.append_health_log(&new_id, now, event)?;
        }

        self.get(&new_id)
    }

    /// Records matching the filter, most recently registered first
    pub fn list(&self, filter: &AnimalFilter) -> Vec<&AnimalRecord> {
        let text = filter
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let matches: Vec<&AnimalRecord> = self
            .animals
            .iter()
            .rev()
            .filter(|r| filter.born_on.map_or(true, |d| r.birth_date.date() == d))
            .filter(|r| text.map_or(true, |t| r.id.contains(t) || r.mother.contains(t)))
            .filter(|r| filter.statuses.is_empty() || filter.statuses.contains(&r.status))
            .collect();

        tracing::debug!("Listed {} of {} animals", matches.len(), self.animals.len());
        matches
    }

    // ========================================================================
    // Status and identity
    // ========================================================================

    /// Change the lifecycle status within the sex-specific allowed set
    pub fn update_status(&mut self, id: &str, new_status: Status) -> Result<&AnimalRecord> {
        let record = self.get_mut(id)?;
        if let Err(e) = status::check_status(record.sex, new_status) {
            tracing::warn!("Rejected status change of {}: {}", id, e);
            return Err(e);
        }
        if record.status != new_status {
            tracing::info!("{}: status {} -> {}", id, record.status, new_status);
            record.status = new_status;
        }
        Ok(&*record)
    }

    /// Correct the recorded sex; an invalidated status falls back to active
    ///
    /// The id keeps the sex it was generated with.
    pub fn update_sex(&mut self, id: &str, sex: Sex) -> Result<&AnimalRecord> {
        let record = self.get_mut(id)?;
        record.sex = sex;
        let clamped = status::clamp_status(sex, record.status);
        if clamped != record.status {
            tracing::warn!(
                "{}: status {} not valid for {}, reset to {}",
                id,
                record.status,
                sex,
                clamped
            );
            record.status = clamped;
        }
        tracing::info!("{}: sex set to {}", id, sex);
        Ok(&*record)
    }

    /// Set or clear the official traceability number
    pub fn set_official_id(&mut self, id: &str, official_id: &str) -> Result<&AnimalRecord> {
        let official_id = official_id.trim();
        if official_id.chars().count() > OFFICIAL_ID_MAX_LEN {
            return Err(Error::Validation(format!(
                "official id must be at most {} characters",
                OFFICIAL_ID_MAX_LEN
            )));
        }

        let record = self.get_mut(id)?;
        record.official_id = if official_id.is_empty() {
            None
        } else {
            Some(official_id.to_string())
        };
        tracing::info!("{}: official id {:?}", id, record.official_id);
        Ok(&*record)
    }

    // ========================================================================
    // Growth
    // ========================================================================

    /// Record weaning; a weaned calf must have its weaning cancelled first
    pub fn record_weaning(
        &mut self,
        id: &str,
        date: NaiveDate,
        weight: f64,
    ) -> Result<&AnimalRecord> {
        validate_weight(weight, "weaning weight")?;
        let record = self.get_mut(id)?;
        validate_not_before_birth(record, date)?;
        if let Some(existing) = &record.weaning {
            return Err(Error::Validation(format!(
                "{} was already weaned on {}; cancel that weaning first",
                id, existing.date
            )));
        }
        record.weaning = Some(Weaning { date, weight });
        tracing::info!("{}: weaned on {} at {}kg", id, date, weight);
        Ok(&*record)
    }

    /// Undo a weaning; a calf still nursing is left unchanged
    pub fn cancel_weaning(&mut self, id: &str) -> Result<&AnimalRecord> {
        let record = self.get_mut(id)?;
        match record.weaning.take() {
            Some(w) => tracing::info!("{}: weaning of {} cancelled", id, w.date),
            None => tracing::debug!("{}: cancel weaning on a nursing calf", id),
        }
        Ok(&*record)
    }

    pub fn add_periodic_weight(
        &mut self,
        id: &str,
        date: NaiveDate,
        weight: f64,
    ) -> Result<&AnimalRecord> {
        validate_weight(weight, "weight")?;
        let record = self.get_mut(id)?;
        validate_not_before_birth(record, date)?;
        record.periodic_weights.push(PeriodicWeight { date, weight });
        tracing::info!("{}: weighed {}kg on {}", id, weight, date);
        Ok(&*record)
    }

    /// Overwrite the manually tracked current weight
    pub fn set_current_weight(&mut self, id: &str, weight: f64) -> Result<&AnimalRecord> {
        validate_weight(weight, "current weight")?;
        let record = self.get_mut(id)?;
        record.current_weight = weight;
        tracing::info!("{}: current weight set to {}kg", id, weight);
        Ok(&*record)
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Overwrite health flags directly, without a log entry
    pub fn set_health_flags(
        &mut self,
        id: &str,
        feces: Option<FecesState>,
        disease: Option<DiseaseStatus>,
    ) -> Result<&AnimalRecord> {
        let record = self.get_mut(id)?;
        if let Some(feces) = feces {
            record.feces_state = feces;
        }
        if let Some(disease) = disease {
            record.disease_status = disease;
        }
        tracing::info!(
            "{}: flags feces={} disease={}",
            id,
            record.feces_state,
            record.disease_status
        );
        Ok(&*record)
    }

    /// Append a health event and propagate observation flags to the record
    ///
    /// The record lookup happens first, so an unknown id leaves both the log
    /// and the records untouched.
    pub fn append_health_log(
        &mut self,
        id: &str,
        timestamp: NaiveDateTime,
        event: HealthEvent,
    ) -> Result<&HealthLogEntry> {
        let record = self.get_mut(id)?;
        if let Some(feces) = event.feces_state() {
            record.feces_state = feces;
        }
        if let Some(disease) = event.disease_status() {
            record.disease_status = disease;
        }

        let entry = HealthLogEntry {
            entry_id: Uuid::new_v4(),
            animal_id: record.id.clone(),
            timestamp,
            event,
        };
        tracing::info!("{}: logged {} at {}", id, entry.event.detail(), timestamp);

        let index = self.health_log.len();
        self.health_log.push(entry);
        Ok(&self.health_log[index])
    }

    /// Health history of one animal, newest first
    pub fn health_log_for(&self, id: &str) -> Result<Vec<&HealthLogEntry>> {
        self.get(id)?;
        let mut entries: Vec<&HealthLogEntry> = self
            .health_log
            .iter()
            .filter(|e| e.animal_id == id)
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    // ========================================================================
    // Vaccine list
    // ========================================================================

    pub fn vaccines(&self) -> &[String] {
        &self.vaccines
    }

    /// Add a vaccine to the session list; returns false for blanks and duplicates
    pub fn add_vaccine(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.vaccines.iter().any(|v| v == name) {
            return false;
        }
        self.vaccines.push(name.to_string());
        tracing::debug!("Added vaccine {}", name);
        true
    }
}

fn validate_weight(weight: f64, what: &str) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be a non-negative number, got {}",
            what, weight
        )))
    }
}

fn validate_not_before_birth(record: &AnimalRecord, date: NaiveDate) -> Result<()> {
    if date < record.birth_date.date() {
        Err(Error::Validation(format!(
            "{} is before the birth date {} of {}",
            date,
            record.birth_date.date(),
            record.id
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{average_daily_gain, latest_weight};
    use crate::{Colostrum, DiseaseStage, HealthEventKind, PhotoRef, WeightSource};
    use chrono::Duration;

    fn born() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 9, 10)
            .unwrap()
            .and_hms_opt(5, 45, 0)
            .unwrap()
    }

    fn registration(mother: &str, sex: Option<Sex>) -> Registration {
        Registration {
            birth_date: born(),
            mother: mother.into(),
            sex,
            birth_weight: 26.0,
            photo: None,
            navel_disinfected: true,
            colostrum: Colostrum::Powder { volume_ml: 400.0 },
            initial_event: None,
        }
    }

    fn store_with_calf(sex: Sex) -> (RecordStore, String) {
        crate::logging::init_test();
        let mut store = RecordStore::default();
        let id = store
            .register(registration("1234", Some(sex)), born())
            .unwrap()
            .id
            .clone();
        (store, id)
    }

    #[test]
    fn test_register_fills_every_field() {
        let (store, id) = store_with_calf(Sex::Female);
        let record = store.get(&id).unwrap();

        assert_eq!(record.id, "260910-1234-female-01");
        assert_eq!(record.mother, "1234");
        assert_eq!(record.current_weight, 26.0);
        assert_eq!(record.status, Status::Active);
        assert_eq!(record.feces_state, FecesState::Normal);
        assert_eq!(record.disease_status, DiseaseStatus::Normal);
        assert!(record.weaning.is_none());
        assert!(record.periodic_weights.is_empty());
        assert!(record.official_id.is_none());
    }

    #[test]
    fn test_same_day_siblings_get_sequential_ids() {
        let mut store = RecordStore::default();
        let ids: Vec<String> = (0..3)
            .map(|_| {
                store
                    .register(registration("1234", Some(Sex::Male)), born())
                    .unwrap()
                    .id
                    .clone()
            })
            .collect();

        assert_eq!(
            ids,
            vec![
                "260910-1234-male-01",
                "260910-1234-male-02",
                "260910-1234-male-03",
            ]
        );
    }

    #[test]
    fn test_register_requires_mother_or_photo() {
        let mut store = RecordStore::default();

        let err = store
            .register(registration("  ", Some(Sex::Male)), born())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.is_empty());

        let mut with_photo = registration("", None);
        with_photo.photo = Some(PhotoRef("photos/calf.jpg".into()));
        let record = store.register(with_photo, born()).unwrap();
        assert_eq!(record.mother, "unknown");
        assert_eq!(record.sex, Sex::Undetermined);
        assert_eq!(record.id, "260910-unknown-undetermined-01");
    }

    #[test]
    fn test_register_rejects_bad_numbers() {
        let mut store = RecordStore::default();

        let mut negative = registration("1234", Some(Sex::Male));
        negative.birth_weight = -3.0;
        assert!(matches!(
            store.register(negative, born()),
            Err(Error::Validation(_))
        ));

        let mut nan = registration("1234", Some(Sex::Male));
        nan.birth_weight = f64::NAN;
        assert!(store.register(nan, born()).is_err());

        let long_tag = registration("123456", Some(Sex::Male));
        assert!(store.register(long_tag, born()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_with_initial_event() {
        let mut store = RecordStore::default();
        let mut reg = registration("1234", Some(Sex::Female));
        reg.initial_event = Some(HealthEvent::FecesObservation {
            state: FecesState::Loose,
        });
        let now = born() + Duration::hours(2);

        let id = store.register(reg, now).unwrap().id.clone();

        let log = store.health_log_for(&id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].timestamp, now);
        assert_eq!(store.get(&id).unwrap().feces_state, FecesState::Loose);
    }

    #[test]
    fn test_list_filters() {
        let mut store = RecordStore::default();
        store
            .register(registration("1234", Some(Sex::Male)), born())
            .unwrap();
        let mut other_day = registration("5678", Some(Sex::Female));
        other_day.birth_date = born() + Duration::days(1);
        let heifer = store.register(other_day, born()).unwrap().id.clone();
        store.update_status(&heifer, Status::Fattening).unwrap();

        let all = store.list(&AnimalFilter::default());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, heifer, "newest registration comes first");

        let by_text = store.list(&AnimalFilter {
            text: Some("567".into()),
            ..Default::default()
        });
        assert_eq!(by_text.len(), 1);

        let by_date = store.list(&AnimalFilter {
            born_on: Some(born().date()),
            ..Default::default()
        });
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].mother, "1234");

        let by_status = store.list(&AnimalFilter {
            statuses: vec![Status::Fattening, Status::Deceased],
            ..Default::default()
        });
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, heifer);
    }

    #[test]
    fn test_update_status_respects_sex() {
        let (mut store, id) = store_with_calf(Sex::Male);

        let err = store
            .update_status(&id, Status::ReplacementStockSelected)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStatus { .. }));
        assert_eq!(store.get(&id).unwrap().status, Status::Active);

        let record = store.update_status(&id, Status::BreedingStockSelected).unwrap();
        assert_eq!(record.status, Status::BreedingStockSelected);

        // Not forward-only
        let record = store.update_status(&id, Status::Active).unwrap();
        assert_eq!(record.status, Status::Active);
    }

    #[test]
    fn test_update_status_unknown_id() {
        let mut store = RecordStore::default();
        assert!(matches!(
            store.update_status("nope", Status::Deceased),
            Err(Error::NotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_sex_change_clamps_status() {
        let (mut store, id) = store_with_calf(Sex::Female);
        store
            .update_status(&id, Status::ReplacementStockSelected)
            .unwrap();

        let record = store.update_sex(&id, Sex::Male).unwrap();
        assert_eq!(record.sex, Sex::Male);
        assert_eq!(record.status, Status::Active);
        assert_eq!(record.id, id);

        store.update_status(&id, Status::Deceased).unwrap();
        let record = store.update_sex(&id, Sex::Unknown).unwrap();
        assert_eq!(record.status, Status::Deceased);
    }

    #[test]
    fn test_weaning_lifecycle() {
        let (mut store, id) = store_with_calf(Sex::Male);
        let wean_day = born().date() + Duration::days(90);

        let record = store.record_weaning(&id, wean_day, 110.0).unwrap();
        assert_eq!(
            record.weaning,
            Some(Weaning {
                date: wean_day,
                weight: 110.0
            })
        );

        assert!(matches!(
            store.record_weaning(&id, wean_day, 111.0),
            Err(Error::Validation(_))
        ));

        let record = store.cancel_weaning(&id).unwrap();
        assert!(record.weaning.is_none());
        // Cancelling again is harmless
        assert!(store.cancel_weaning(&id).unwrap().weaning.is_none());
    }

    #[test]
    fn test_weights_before_birth_rejected() {
        let (mut store, id) = store_with_calf(Sex::Male);
        let before = born().date() - Duration::days(1);

        assert!(store.add_periodic_weight(&id, before, 30.0).is_err());
        assert!(store.record_weaning(&id, before, 30.0).is_err());
        assert!(store.get(&id).unwrap().periodic_weights.is_empty());
    }

    #[test]
    fn test_growth_feeds_latest_weight_but_not_adg() {
        let (mut store, id) = store_with_calf(Sex::Female);
        store
            .record_weaning(&id, born().date() + Duration::days(45), 70.0)
            .unwrap();
        store
            .add_periodic_weight(&id, born().date() + Duration::days(30), 55.0)
            .unwrap();

        let record = store.get(&id).unwrap();
        let latest = latest_weight(record);
        assert_eq!(latest.source, WeightSource::PostWeaning);
        assert_eq!(latest.weight, 70.0);

        // current weight untouched until set by hand
        assert_eq!(record.current_weight, 26.0);
        assert_eq!(average_daily_gain(record, born() + Duration::days(45)), 0.0);

        store.set_current_weight(&id, 71.0).unwrap();
        let adg = average_daily_gain(store.get(&id).unwrap(), born() + Duration::days(45));
        assert!((adg - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disease_observation_updates_flag_with_log() {
        let (mut store, id) = store_with_calf(Sex::Female);
        let at = born() + Duration::days(3);

        let entry = store
            .append_health_log(
                &id,
                at,
                HealthEvent::DiseaseObservation {
                    name: "mastitis".into(),
                    stage: None,
                },
            )
            .unwrap();
        assert_eq!(entry.animal_id, id);
        assert_eq!(entry.event.kind(), HealthEventKind::DiseaseObservation);
        assert_eq!(entry.event.detail(), "[disease] mastitis");

        let record = store.get(&id).unwrap();
        assert_eq!(record.disease_status.to_string(), "mastitis");
        assert_eq!(store.health_log_for(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_feces_observation_updates_flag() {
        let (mut store, id) = store_with_calf(Sex::Male);
        store
            .append_health_log(
                &id,
                born() + Duration::days(1),
                HealthEvent::FecesObservation {
                    state: FecesState::Diarrhea,
                },
            )
            .unwrap();
        assert_eq!(store.get(&id).unwrap().feces_state, FecesState::Diarrhea);
    }

    #[test]
    fn test_other_events_leave_flags_alone() {
        let (mut store, id) = store_with_calf(Sex::Male);
        store
            .append_health_log(
                &id,
                born(),
                HealthEvent::Vaccination {
                    vaccine: "BVD".into(),
                },
            )
            .unwrap();
        let record = store.get(&id).unwrap();
        assert_eq!(record.feces_state, FecesState::Normal);
        assert_eq!(record.disease_status, DiseaseStatus::Normal);
    }

    #[test]
    fn test_append_to_unknown_id_changes_nothing() {
        let (mut store, _) = store_with_calf(Sex::Male);
        let result = store.append_health_log(
            "missing",
            born(),
            HealthEvent::Note {
                text: "hello".into(),
            },
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(store.health_log().is_empty());
    }

    #[test]
    fn test_health_log_newest_first() {
        let (mut store, id) = store_with_calf(Sex::Male);
        for (hours, text) in [(5, "second"), (1, "first"), (9, "third")] {
            store
                .append_health_log(
                    &id,
                    born() + Duration::hours(hours),
                    HealthEvent::Note { text: text.into() },
                )
                .unwrap();
        }

        let texts: Vec<String> = store
            .health_log_for(&id)
            .unwrap()
            .iter()
            .map(|e| e.event.payload())
            .collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
        // Append order is preserved in the raw log
        assert_eq!(store.health_log()[0].event.payload(), "second");
    }

    #[test]
    fn test_set_health_flags_directly() {
        let (mut store, id) = store_with_calf(Sex::Male);
        let disease = DiseaseStatus::Observed {
            name: "pneumonia".into(),
            stage: Some(DiseaseStage::Recovered),
        };
        let record = store
            .set_health_flags(&id, Some(FecesState::Constipated), Some(disease.clone()))
            .unwrap();
        assert_eq!(record.feces_state, FecesState::Constipated);
        assert_eq!(record.disease_status, disease);
        assert!(store.health_log().is_empty());
    }

    #[test]
    fn test_official_id_rules() {
        let (mut store, id) = store_with_calf(Sex::Male);

        let record = store.set_official_id(&id, "002123456789").unwrap();
        assert_eq!(record.official_id.as_deref(), Some("002123456789"));

        assert!(store.set_official_id(&id, "0021234567890").is_err());
        assert_eq!(
            store.get(&id).unwrap().official_id.as_deref(),
            Some("002123456789")
        );

        // Twelve characters of any kind are accepted
        let record = store.set_official_id(&id, "KR-002-1234").unwrap();
        assert_eq!(record.official_id.as_deref(), Some("KR-002-1234"));

        let record = store.set_official_id(&id, "").unwrap();
        assert!(record.official_id.is_none());
    }

    #[test]
    fn test_vaccine_list() {
        let mut store = RecordStore::default();
        assert_eq!(store.vaccines().len(), 5);

        assert!(store.add_vaccine("clostridial"));
        assert!(!store.add_vaccine("clostridial"));
        assert!(!store.add_vaccine("  "));
        assert!(!store.add_vaccine("BVD"));
        assert_eq!(store.vaccines().len(), 6);
    }
}
