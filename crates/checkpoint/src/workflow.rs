//! Crossing entry workflow.
//!
//! Owns the in-progress crossing draft, sequences validation, screening,
//! person/vehicle resolution, duplicate-direction detection, and
//! driver/passenger linkage. At most one draft is live at a time; a submit
//! runs to completion (commit or abort) before the next draft starts.
//!
//! All operator confirmations go through the [`DecisionChannel`] seam, so
//! the workflow itself never talks to a terminal.

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::filter::LogFilter;
use crate::model::{Crossing, CrossingDraft, CrossingRole, Direction, Identity, NewCrossing};
use crate::screening::{self, MatchDecision};
use crate::storage::CrossingStore;

/// Timestamp format for committed crossings.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Synchronous yes/no prompt used for every operator override.
pub trait DecisionChannel {
    /// Ask the operator to confirm; `false` aborts the pending action.
    fn confirm(&self, message: &str) -> bool;
}

/// Current mode of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// No entry in progress.
    Idle,
    /// A fresh crossing is being entered.
    NewEntry,
    /// Passengers are being chained to a committed driver crossing.
    PassengerEntry {
        /// The committed driver crossing passengers link to.
        driver: Crossing,
    },
}

/// Why a submit stopped without committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Wanted-list hit not overridden by the operator.
    WantedBlock,
    /// Watch-list hit not overridden by the operator.
    WatchlistBlock,
    /// Stored person record differs and the operator declined to proceed.
    IdentityMismatch,
    /// Same direction as the subject's last crossing, not confirmed.
    DuplicateDirection,
}

/// Result of a submit attempt.
///
/// Declines are ordinary outcomes, not errors: the draft is preserved
/// unchanged and the operator may edit and retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The crossing was persisted.
    Committed {
        /// Journal id of the new crossing.
        crossing_id: i64,
    },
    /// The operator declined a confirmation; nothing was persisted.
    Declined {
        /// Which prompt was declined.
        reason: DeclineReason,
    },
}

/// The crossing entry workflow state machine.
#[derive(Debug)]
pub struct EntryWorkflow<S: CrossingStore, D: DecisionChannel> {
    store: S,
    decisions: D,
    operator: String,
    state: WorkflowState,
    draft: CrossingDraft,
    filter_events: Option<mpsc::UnboundedSender<LogFilter>>,
}

impl<S: CrossingStore, D: DecisionChannel> EntryWorkflow<S, D> {
    /// Create an idle workflow recording under the given operator id.
    pub fn new(store: S, decisions: D, operator: impl Into<String>) -> Self {
        Self {
            store,
            decisions,
            operator: operator.into(),
            state: WorkflowState::Idle,
            draft: CrossingDraft::default(),
            filter_events: None,
        }
    }

    /// Register a channel that receives a [`LogFilter`] whenever identity
    /// fields change, for the debounced journal view.
    pub fn set_filter_events(&mut self, sender: mpsc::UnboundedSender<LogFilter>) {
        self.filter_events = Some(sender);
    }

    /// Current workflow state.
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// The underlying persistence collaborator.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The draft under edit.
    #[must_use]
    pub fn draft(&self) -> &CrossingDraft {
        &self.draft
    }

    /// Mutable access to trip fields of the draft.
    ///
    /// In passenger mode trip fields are overwritten from the linked driver
    /// crossing at commit time, so edits to them there have no effect.
    pub fn draft_mut(&mut self) -> &mut CrossingDraft {
        &mut self.draft
    }

    /// Start a fresh entry, discarding any current draft.
    pub fn begin_entry(&mut self) {
        self.draft = CrossingDraft::default();
        self.state = WorkflowState::NewEntry;
    }

    /// Edit the draft identity, notifying the journal filter.
    pub fn update_identity(&mut self, edit: impl FnOnce(&mut Identity)) {
        edit(&mut self.draft.identity);
        if let Some(sender) = &self.filter_events {
            // Receiver gone just means nobody is watching the journal
            let _ = sender.send(LogFilter::from_identity(&self.draft.identity));
        }
    }

    /// Silent screening of the current draft identity.
    ///
    /// Never touches the decision channel; used for proactive lookups.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the reference lists fails.
    pub fn screen(&self) -> Result<MatchDecision> {
        let wanted = self.store.wanted_entries()?;
        let watch = self.store.watch_entries()?;
        Ok(screening::evaluate(&self.draft.identity, &wanted, &watch))
    }

    /// Enter passenger mode chained to a committed driver crossing.
    ///
    /// Seeds the draft's trip fields from the driver crossing and clears
    /// identity and cargo. The back-reference stays one level deep: a
    /// crossing that is itself a passenger can never seed passenger entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the seed crossing is not an intact
    /// driver crossing.
    pub fn add_passenger(&mut self, driver: Crossing) -> Result<()> {
        if driver.role != CrossingRole::Driver {
            return Err(Error::passenger_link(format!(
                "crossing {} has role {}, expected driver",
                driver.id, driver.role
            )));
        }
        if driver.driver_crossing_id.is_some() {
            return Err(Error::passenger_link(format!(
                "crossing {} is itself a passenger crossing",
                driver.id
            )));
        }
        if driver.deleted {
            return Err(Error::passenger_link(format!(
                "crossing {} has been deleted",
                driver.id
            )));
        }

        self.draft = CrossingDraft {
            direction: driver.direction,
            role: CrossingRole::Passenger,
            purpose: driver.purpose.clone(),
            destination: driver.destination.clone(),
            vehicle: driver.vehicle_ref().unwrap_or_default(),
            ..CrossingDraft::default()
        };
        self.state = WorkflowState::PassengerEntry { driver };
        Ok(())
    }

    /// Leave passenger mode and discard the draft.
    pub fn finish_passengers(&mut self) {
        self.draft = CrossingDraft::default();
        self.state = WorkflowState::Idle;
    }

    /// Suggested passenger manifest from the driver's previous trip.
    ///
    /// Finds the active driver's most recent earlier driver crossing and
    /// returns the passengers chained to it. Read-only; never the current
    /// crossing's own passengers.
    ///
    /// # Errors
    ///
    /// Returns a validation error outside passenger mode, or a database
    /// error if the lookup fails.
    pub fn previous_passengers(&self) -> Result<Vec<Crossing>> {
        let WorkflowState::PassengerEntry { driver } = &self.state else {
            return Err(Error::passenger_link(
                "previous passengers are only available in passenger mode",
            ));
        };

        let Some(earlier) = self
            .store
            .previous_driver_crossing(driver.person_id, driver.id)?
        else {
            return Ok(Vec::new());
        };
        self.store.passenger_crossings_of(earlier.id)
    }

    /// Submit the current draft.
    ///
    /// Runs the full pipeline: field validation, uppercase fold, screening
    /// with confirm-or-abort, person resolution with identity-mismatch
    /// confirmation, duplicate-direction check, vehicle resolution, and the
    /// final persist. On any decline or persistence failure the draft is
    /// left unchanged for retry.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` when required fields are absent,
    /// `InvalidDate` when the date of birth is not a calendar date, or a
    /// database error if persistence fails.
    pub fn submit(&mut self) -> Result<SubmitOutcome> {
        self.validate_draft()?;

        // Work on a copy so a decline or failure leaves the form untouched
        let mut draft = self.draft.clone();
        draft.make_uppercase();

        let decision = {
            let wanted = self.store.wanted_entries()?;
            let watch = self.store.watch_entries()?;
            screening::evaluate(&draft.identity, &wanted, &watch)
        };
        if decision.is_blocking() {
            warn!("Screening hit for {}", draft.identity.full_name());
            let reason = match &decision {
                MatchDecision::WantedHit { .. } => DeclineReason::WantedBlock,
                _ => DeclineReason::WatchlistBlock,
            };
            let prompt = format!("{}\nProceed anyway?", decision.message());
            if !self.decisions.confirm(&prompt) {
                return Ok(SubmitOutcome::Declined { reason });
            }
        }

        let Some(person_id) = self.resolve_person(&draft.identity)? else {
            return Ok(SubmitOutcome::Declined {
                reason: DeclineReason::IdentityMismatch,
            });
        };

        let in_passenger_mode = matches!(self.state, WorkflowState::PassengerEntry { .. });

        if !in_passenger_mode {
            if let Some(last) = self.store.most_recent_crossing(person_id)? {
                if last.direction == draft.direction {
                    let prompt = format!(
                        "Last crossing of {} on {} was already {}. Record another {} crossing?",
                        draft.identity.full_name(),
                        last.timestamp,
                        last.direction,
                        draft.direction
                    );
                    if !self.decisions.confirm(&prompt) {
                        return Ok(SubmitOutcome::Declined {
                            reason: DeclineReason::DuplicateDirection,
                        });
                    }
                }
            }
        }

        // Passenger trip fields always mirror the driver crossing. The
        // vehicle id is taken from the driver row directly, never re-derived
        // from display text
        let (driver_crossing_id, vehicle_id) =
            if let WorkflowState::PassengerEntry { driver } = &self.state {
                draft.direction = driver.direction;
                draft.role = CrossingRole::Passenger;
                draft.purpose = driver.purpose.clone();
                draft.destination = driver.destination.clone();
                (Some(driver.id), driver.vehicle_id)
            } else if draft.role.requires_vehicle() && !draft.vehicle.plate.is_empty() {
                let id = self.resolve_vehicle(&draft.vehicle.make, &draft.vehicle.plate)?;
                (None, Some(id))
            } else {
                (None, None)
            };

        let crossing = NewCrossing {
            person_id,
            vehicle_id,
            direction: draft.direction,
            role: draft.role,
            purpose: draft.purpose.clone(),
            destination: draft.destination.clone(),
            operator: self.operator.clone(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            driver_crossing_id,
        };
        let crossing_id = self.store.create_crossing(&crossing)?;
        if !draft.cargo.is_empty() {
            self.store.attach_cargo(crossing_id, &draft.cargo)?;
        }
        info!(
            "Recorded {} crossing {} for {}",
            crossing.direction,
            crossing_id,
            draft.identity.full_name()
        );

        // Passenger mode keeps the trip context and clears identity only
        if in_passenger_mode {
            self.draft.identity = Identity::default();
            self.draft.cargo.clear();
        } else {
            self.draft = CrossingDraft::default();
            self.state = WorkflowState::NewEntry;
        }

        Ok(SubmitOutcome::Committed { crossing_id })
    }

    /// Check required fields, naming every missing one.
    fn validate_draft(&self) -> Result<()> {
        let mut missing = Vec::new();
        let identity = &self.draft.identity;
        if identity.last_name.trim().is_empty() {
            missing.push("last name");
        }
        if identity.first_name.trim().is_empty() {
            missing.push("first name");
        }
        if identity.document.as_deref().unwrap_or("").trim().is_empty() {
            missing.push("document number");
        }
        if identity.dob.trim().is_empty() {
            missing.push("date of birth");
        }
        if self.draft.direction == Direction::In
            && self
                .draft
                .destination
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
        {
            missing.push("destination");
        }
        if !missing.is_empty() {
            return Err(Error::missing_fields(&missing));
        }
        // Comparisons tolerate historic drift in stored rows; new entries
        // must carry a real calendar date
        if crate::normalize::parse_dob(identity.dob.trim()).is_none() {
            return Err(Error::invalid_date(identity.dob.trim()));
        }
        Ok(())
    }

    /// Resolve the identity to a person id by document number.
    ///
    /// Returns `None` when the operator declines the identity-mismatch
    /// confirmation. Stored notes are refreshed when the draft carries a
    /// different value.
    fn resolve_person(&self, identity: &Identity) -> Result<Option<i64>> {
        let document = identity.document.as_deref().unwrap_or("");
        let Some(existing) = self.store.find_person_by_document(document)? else {
            return Ok(Some(self.store.create_person(identity)?));
        };

        let stored = &existing.identity;
        let name_differs = stored.last_name.to_uppercase() != identity.last_name.to_uppercase()
            || stored.first_name.to_uppercase() != identity.first_name.to_uppercase()
            || stored.patronymic_or_empty().to_uppercase()
                != identity.patronymic_or_empty().to_uppercase();
        let dob_differs = !crate::normalize::dates_match(&stored.dob, &identity.dob);

        if name_differs || dob_differs {
            let prompt = format!(
                "Document {} is already registered to {} born {}, entered as {} born {}. Use the existing record?",
                document,
                stored.full_name(),
                stored.dob,
                identity.full_name(),
                identity.dob
            );
            if !self.decisions.confirm(&prompt) {
                return Ok(None);
            }
        }

        if identity.notes != stored.notes && identity.notes.is_some() {
            self.store
                .update_person_notes(existing.id, identity.notes.as_deref())?;
        }

        Ok(Some(existing.id))
    }

    /// Resolve a vehicle by plate, creating it if unknown.
    fn resolve_vehicle(&self, make: &str, plate: &str) -> Result<i64> {
        if let Some(vehicle) = self.store.find_vehicle_by_plate(plate)? {
            return vehicle
                .id
                .ok_or_else(|| Error::internal("stored vehicle without id"));
        }
        self.store.create_vehicle(make, plate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CargoLine, VehicleRef};
    use crate::storage::Storage;
    use std::cell::RefCell;

    /// Scripted decision channel: pops answers front-to-back, defaulting to
    /// accept, and records every prompt.
    struct ScriptedDecisions {
        answers: RefCell<Vec<bool>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedDecisions {
        fn accepting() -> Self {
            Self::with_answers(vec![])
        }

        fn with_answers(answers: Vec<bool>) -> Self {
            Self {
                answers: RefCell::new(answers),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.borrow().clone()
        }
    }

    impl DecisionChannel for ScriptedDecisions {
        fn confirm(&self, message: &str) -> bool {
            self.prompts.borrow_mut().push(message.to_string());
            let mut answers = self.answers.borrow_mut();
            if answers.is_empty() {
                true
            } else {
                answers.remove(0)
            }
        }
    }

    fn workflow(decisions: ScriptedDecisions) -> EntryWorkflow<Storage, ScriptedDecisions> {
        let storage = Storage::open_in_memory().unwrap();
        EntryWorkflow::new(storage, decisions, "op1")
    }

    fn fill_draft(wf: &mut EntryWorkflow<Storage, ScriptedDecisions>, document: &str) {
        wf.begin_entry();
        wf.update_identity(|identity| {
            identity.last_name = "Петров".to_string();
            identity.first_name = "Иван".to_string();
            identity.dob = "01.01.1990".to_string();
            identity.document = Some(document.to_string());
        });
        wf.draft_mut().destination = Some("ГОРОД".to_string());
    }

    #[test]
    fn test_starts_idle() {
        let wf = workflow(ScriptedDecisions::accepting());
        assert_eq!(*wf.state(), WorkflowState::Idle);
    }

    #[test]
    fn test_validation_names_missing_fields() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        wf.begin_entry();

        let err = wf.submit().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("last name"));
        assert!(message.contains("first name"));
        assert!(message.contains("document number"));
        assert!(message.contains("date of birth"));
        assert!(message.contains("destination"));
    }

    #[test]
    fn test_unparseable_dob_rejected() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.update_identity(|identity| {
            identity.dob = "первое января".to_string();
        });

        let err = wf.submit().unwrap_err();
        assert!(matches!(err, Error::InvalidDate { .. }));
        assert!(err.is_validation());
        assert_eq!(wf.store.crossing_count().unwrap(), 0);
    }

    #[test]
    fn test_destination_not_required_for_out() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().destination = None;
        wf.draft_mut().direction = Direction::Out;

        assert!(matches!(
            wf.submit().unwrap(),
            SubmitOutcome::Committed { .. }
        ));
    }

    #[test]
    fn test_commit_uppercases_and_resets_draft() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "ab123456");

        let outcome = wf.submit().unwrap();
        let SubmitOutcome::Committed { crossing_id } = outcome else {
            panic!("expected commit, got {outcome:?}");
        };

        let crossing = wf.store.crossing(crossing_id).unwrap().unwrap();
        assert_eq!(crossing.full_name, "ПЕТРОВ ИВАН");
        assert_eq!(crossing.person_document, "AB123456");
        assert_eq!(crossing.operator, "op1");
        assert!(crossing.driver_crossing_id.is_none());

        // Draft reset for the next entry
        assert_eq!(*wf.state(), WorkflowState::NewEntry);
        assert_eq!(wf.draft().identity, Identity::default());
    }

    #[test]
    fn test_wanted_block_declined() {
        let mut wf = workflow(ScriptedDecisions::with_answers(vec![false]));
        wf.store
            .add_wanted(&crate::model::WantedEntry {
                id: None,
                last_name: "ПЕТРОВ".to_string(),
                first_name: "ИВАН".to_string(),
                patronymic: None,
                dob: "01.01.1990".to_string(),
                info: None,
                actions: None,
            })
            .unwrap();
        fill_draft(&mut wf, "AB123456");

        let outcome = wf.submit().unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Declined {
                reason: DeclineReason::WantedBlock
            }
        );
        // Nothing persisted, draft preserved for retry
        assert_eq!(wf.store.crossing_count().unwrap(), 0);
        assert_eq!(wf.draft().identity.last_name, "Петров");
    }

    #[test]
    fn test_wanted_block_overridden() {
        let mut wf = workflow(ScriptedDecisions::with_answers(vec![true]));
        wf.store
            .add_wanted(&crate::model::WantedEntry {
                id: None,
                last_name: "ПЕТРОВ".to_string(),
                first_name: "ИВАН".to_string(),
                patronymic: None,
                dob: "01.01.1990".to_string(),
                info: None,
                actions: None,
            })
            .unwrap();
        fill_draft(&mut wf, "AB123456");

        assert!(matches!(
            wf.submit().unwrap(),
            SubmitOutcome::Committed { .. }
        ));
    }

    #[test]
    fn test_watch_block_reason() {
        let mut wf = workflow(ScriptedDecisions::with_answers(vec![false]));
        wf.store
            .add_watch(&crate::model::WatchEntry {
                id: None,
                last_name: "ПЕТРОВ".to_string(),
                first_name: "ИВАН".to_string(),
                patronymic: None,
                dob: "01.01.1990".to_string(),
                reason: Some("advisory".to_string()),
            })
            .unwrap();
        fill_draft(&mut wf, "AB123456");

        assert_eq!(
            wf.submit().unwrap(),
            SubmitOutcome::Declined {
                reason: DeclineReason::WatchlistBlock
            }
        );
    }

    #[test]
    fn test_screen_is_silent() {
        let decisions = ScriptedDecisions::accepting();
        let mut wf = workflow(decisions);
        wf.store
            .add_wanted(&crate::model::WantedEntry {
                id: None,
                last_name: "ПЕТРОВ".to_string(),
                first_name: "ИВАН".to_string(),
                patronymic: None,
                dob: "01.01.1990".to_string(),
                info: None,
                actions: None,
            })
            .unwrap();
        fill_draft(&mut wf, "AB123456");

        let decision = wf.screen().unwrap();
        assert!(decision.is_blocking());
        assert!(wf.decisions.prompts().is_empty());
        assert_eq!(wf.store.crossing_count().unwrap(), 0);
    }

    #[test]
    fn test_identity_mismatch_declined_preserves_store() {
        let mut wf = workflow(ScriptedDecisions::with_answers(vec![false]));
        fill_draft(&mut wf, "AB123456");
        wf.submit().unwrap();

        // Same document, different name
        fill_draft(&mut wf, "AB123456");
        wf.update_identity(|identity| identity.last_name = "Сидоров".to_string());

        let outcome = wf.submit().unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Declined {
                reason: DeclineReason::IdentityMismatch
            }
        );
        let stored = wf
            .store
            .find_person_by_document("AB123456")
            .unwrap()
            .unwrap();
        assert_eq!(stored.identity.last_name, "ПЕТРОВ");
        assert_eq!(wf.store.crossing_count().unwrap(), 1);
    }

    #[test]
    fn test_identity_match_does_not_prompt() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.submit().unwrap();

        // Same person again, opposite direction: no prompt at all
        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().direction = Direction::Out;
        wf.submit().unwrap();

        assert!(wf.decisions.prompts().is_empty());
    }

    #[test]
    fn test_notes_updated_on_resolve() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.submit().unwrap();

        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().direction = Direction::Out;
        wf.update_identity(|identity| identity.notes = Some("frequent crosser".to_string()));
        wf.submit().unwrap();

        let stored = wf
            .store
            .find_person_by_document("AB123456")
            .unwrap()
            .unwrap();
        assert_eq!(stored.identity.notes.as_deref(), Some("frequent crosser"));
    }

    #[test]
    fn test_duplicate_direction_declined() {
        let mut wf = workflow(ScriptedDecisions::with_answers(vec![false]));
        fill_draft(&mut wf, "AB123456");
        wf.submit().unwrap();

        // Same direction again: the only prompt is duplicate direction
        fill_draft(&mut wf, "AB123456");
        let outcome = wf.submit().unwrap();

        assert!(wf.decisions.prompts()[0].contains("already in"));
        assert_eq!(
            outcome,
            SubmitOutcome::Declined {
                reason: DeclineReason::DuplicateDirection
            }
        );
        assert_eq!(wf.store.crossing_count().unwrap(), 1);
    }

    #[test]
    fn test_opposite_direction_no_prompt() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.submit().unwrap();

        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().direction = Direction::Out;
        wf.submit().unwrap();

        assert!(wf.decisions.prompts().is_empty());
        assert_eq!(wf.store.crossing_count().unwrap(), 2);
    }

    #[test]
    fn test_driver_crossing_with_vehicle_and_cargo() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().role = CrossingRole::Driver;
        wf.draft_mut().vehicle = VehicleRef {
            id: None,
            make: "volvo".to_string(),
            plate: "ab123".to_string(),
        };
        wf.draft_mut().cargo.push(CargoLine {
            description: "ЯБЛОКИ".to_string(),
            quantity: 120.0,
            unit: "КГ".to_string(),
        });

        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("expected commit");
        };

        let crossing = wf.store.crossing(crossing_id).unwrap().unwrap();
        assert_eq!(crossing.role, CrossingRole::Driver);
        assert_eq!(crossing.vehicle_info, "VOLVO/AB123");
        assert_eq!(wf.store.cargo_of(crossing_id).unwrap().len(), 1);
    }

    #[test]
    fn test_vehicle_reused_by_plate() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        for (document, direction) in [("AB123456", Direction::In), ("CD789012", Direction::In)] {
            fill_draft(&mut wf, document);
            wf.draft_mut().direction = direction;
            wf.draft_mut().role = CrossingRole::Driver;
            wf.draft_mut().vehicle = VehicleRef {
                id: None,
                make: "VOLVO".to_string(),
                plate: "AB123".to_string(),
            };
            wf.submit().unwrap();
        }

        let recent = wf.store.recent_crossings(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].vehicle_id, recent[1].vehicle_id);
    }

    fn committed_driver(
        wf: &mut EntryWorkflow<Storage, ScriptedDecisions>,
        document: &str,
    ) -> Crossing {
        fill_draft(wf, document);
        wf.draft_mut().role = CrossingRole::Driver;
        wf.draft_mut().purpose = Some("РАБОТА".to_string());
        wf.draft_mut().vehicle = VehicleRef {
            id: None,
            make: "VOLVO".to_string(),
            plate: "AB123".to_string(),
        };
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("driver commit failed");
        };
        wf.store.crossing(crossing_id).unwrap().unwrap()
    }

    #[test]
    fn test_passenger_inherits_driver_trip_fields() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let driver = committed_driver(&mut wf, "AB123456");

        wf.add_passenger(driver.clone()).unwrap();
        assert_eq!(wf.draft().direction, driver.direction);
        assert_eq!(wf.draft().destination, driver.destination);
        assert_eq!(wf.draft().vehicle.info(), "VOLVO/AB123");
        assert_eq!(wf.draft().role, CrossingRole::Passenger);
        assert_eq!(wf.draft().identity, Identity::default());

        wf.update_identity(|identity| {
            identity.last_name = "Орлова".to_string();
            identity.first_name = "Анна".to_string();
            identity.dob = "09.09.1992".to_string();
            identity.document = Some("CD789012".to_string());
        });
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("passenger commit failed");
        };

        let passenger = wf.store.crossing(crossing_id).unwrap().unwrap();
        assert_eq!(passenger.role, CrossingRole::Passenger);
        assert_eq!(passenger.driver_crossing_id, Some(driver.id));
        assert_eq!(passenger.direction, driver.direction);
        assert_eq!(passenger.destination, driver.destination);
        assert_eq!(passenger.vehicle_info, "VOLVO/AB123");

        // Still in passenger mode, identity cleared for the next passenger
        assert!(matches!(
            wf.state(),
            WorkflowState::PassengerEntry { driver: d } if d.id == driver.id
        ));
        assert_eq!(wf.draft().identity, Identity::default());
        assert_eq!(wf.draft().vehicle.info(), "VOLVO/AB123");
    }

    #[test]
    fn test_passenger_shares_driver_vehicle_row() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().role = CrossingRole::Driver;
        wf.draft_mut().vehicle = VehicleRef {
            id: None,
            make: "VAZ/LADA".to_string(),
            plate: "A111AA".to_string(),
        };
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("driver commit failed");
        };
        let driver = wf.store.crossing(crossing_id).unwrap().unwrap();
        assert!(driver.vehicle_id.is_some());

        wf.add_passenger(driver.clone()).unwrap();
        wf.update_identity(|identity| {
            identity.last_name = "Орлова".to_string();
            identity.first_name = "Анна".to_string();
            identity.dob = "09.09.1992".to_string();
            identity.document = Some("CD789012".to_string());
        });
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("passenger commit failed");
        };

        // The slash in the make must not send the passenger to a different
        // vehicle row than the driver's
        let passenger = wf.store.crossing(crossing_id).unwrap().unwrap();
        assert_eq!(passenger.vehicle_id, driver.vehicle_id);
        assert!(wf
            .store
            .find_vehicle_by_plate("LADA/A111AA")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_passenger_edits_to_trip_fields_ignored() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let driver = committed_driver(&mut wf, "AB123456");
        wf.add_passenger(driver.clone()).unwrap();

        wf.update_identity(|identity| {
            identity.last_name = "Орлова".to_string();
            identity.first_name = "Анна".to_string();
            identity.dob = "09.09.1992".to_string();
            identity.document = Some("CD789012".to_string());
        });
        // Attempted independent edits
        wf.draft_mut().destination = Some("ДРУГОЙ".to_string());
        wf.draft_mut().direction = Direction::Out;

        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("passenger commit failed");
        };
        let passenger = wf.store.crossing(crossing_id).unwrap().unwrap();
        assert_eq!(passenger.direction, driver.direction);
        assert_eq!(passenger.destination, driver.destination);
    }

    #[test]
    fn test_passenger_mode_skips_duplicate_direction_check() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let driver = committed_driver(&mut wf, "AB123456");
        wf.add_passenger(driver).unwrap();

        for _ in 0..2 {
            wf.update_identity(|identity| {
                identity.last_name = "Орлова".to_string();
                identity.first_name = "Анна".to_string();
                identity.dob = "09.09.1992".to_string();
                identity.document = Some("CD789012".to_string());
            });
            wf.submit().unwrap();
        }
        // Same person, same direction, twice: no duplicate prompt in
        // passenger mode
        assert!(wf.decisions.prompts().is_empty());
    }

    #[test]
    fn test_add_passenger_rejects_non_driver() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        fill_draft(&mut wf, "AB123456");
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("commit failed");
        };
        let pedestrian = wf.store.crossing(crossing_id).unwrap().unwrap();

        let err = wf.add_passenger(pedestrian).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("expected driver"));
    }

    #[test]
    fn test_add_passenger_rejects_passenger_seed() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let driver = committed_driver(&mut wf, "AB123456");
        wf.add_passenger(driver).unwrap();
        wf.update_identity(|identity| {
            identity.last_name = "Орлова".to_string();
            identity.first_name = "Анна".to_string();
            identity.dob = "09.09.1992".to_string();
            identity.document = Some("CD789012".to_string());
        });
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("passenger commit failed");
        };
        let mut passenger = wf.store.crossing(crossing_id).unwrap().unwrap();
        // Journal rows keep role passenger, but guard against both checks
        passenger.role = CrossingRole::Driver;

        let err = wf.add_passenger(passenger).unwrap_err();
        assert!(err.to_string().contains("itself a passenger"));
    }

    #[test]
    fn test_add_passenger_rejects_deleted_seed() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let driver = committed_driver(&mut wf, "AB123456");
        wf.store.mark_crossing_deleted(driver.id).unwrap();
        let deleted = wf.store.crossing(driver.id).unwrap().unwrap();

        let err = wf.add_passenger(deleted).unwrap_err();
        assert!(err.to_string().contains("deleted"));
    }

    #[test]
    fn test_finish_passengers_returns_to_idle() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let driver = committed_driver(&mut wf, "AB123456");
        wf.add_passenger(driver).unwrap();

        wf.finish_passengers();
        assert_eq!(*wf.state(), WorkflowState::Idle);
        assert_eq!(*wf.draft(), CrossingDraft::default());
    }

    #[test]
    fn test_previous_passengers_manifest() {
        let mut wf = workflow(ScriptedDecisions::accepting());

        // First trip: driver plus one passenger
        let first_trip = committed_driver(&mut wf, "AB123456");
        wf.add_passenger(first_trip).unwrap();
        wf.update_identity(|identity| {
            identity.last_name = "Орлова".to_string();
            identity.first_name = "Анна".to_string();
            identity.dob = "09.09.1992".to_string();
            identity.document = Some("CD789012".to_string());
        });
        wf.submit().unwrap();
        wf.finish_passengers();

        // Second trip by the same driver, opposite direction
        fill_draft(&mut wf, "AB123456");
        wf.draft_mut().direction = Direction::Out;
        wf.draft_mut().role = CrossingRole::Driver;
        wf.draft_mut().vehicle = VehicleRef {
            id: None,
            make: "VOLVO".to_string(),
            plate: "AB123".to_string(),
        };
        let SubmitOutcome::Committed { crossing_id } = wf.submit().unwrap() else {
            panic!("second trip failed");
        };
        let second_trip = wf.store.crossing(crossing_id).unwrap().unwrap();
        wf.add_passenger(second_trip).unwrap();

        let manifest = wf.previous_passengers().unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].full_name, "ОРЛОВА АННА");
    }

    #[test]
    fn test_previous_passengers_outside_passenger_mode() {
        let wf = workflow(ScriptedDecisions::accepting());
        assert!(wf.previous_passengers().is_err());
    }

    #[test]
    fn test_filter_events_emitted_on_identity_change() {
        let mut wf = workflow(ScriptedDecisions::accepting());
        let (tx, mut rx) = mpsc::unbounded_channel();
        wf.set_filter_events(tx);

        wf.begin_entry();
        wf.update_identity(|identity| identity.last_name = "П".to_string());
        wf.update_identity(|identity| identity.last_name = "ПЕ".to_string());

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.last_name, "П");
        assert_eq!(second.last_name, "ПЕ");
        assert!(rx.try_recv().is_err());
    }
}
