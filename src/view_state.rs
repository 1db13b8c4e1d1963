//! Upload → Details → Chat view state machine.
//!
//! Every transition is fallible and leaves state untouched on error.
//! A generation counter guards against intake results that arrive after
//! the user has already gone back to a fresh upload.

use serde::Serialize;
use thiserror::Error;

use crate::intake::IntakeOutcome;
use crate::models::View;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("An upload is already being processed")]
    UploadInProgress,

    #[error("No upload is being processed")]
    NoUploadInFlight,

    #[error("Intake result belongs to an abandoned upload")]
    StaleIntake,

    #[error("Cannot {action} from the {from} view")]
    InvalidTransition { action: &'static str, from: View },

    #[error("No vetted prescription is available")]
    NoPrescription,
}

/// Proof that an intake was started in a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntakeTicket {
    generation: u64,
}

#[derive(Debug)]
pub struct ViewController {
    view: View,
    generation: u64,
    in_flight: Option<u64>,
    outcome: Option<IntakeOutcome>,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            view: View::Upload,
            generation: 0,
            in_flight: None,
            outcome: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn intake_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn outcome(&self) -> Option<&IntakeOutcome> {
        self.outcome.as_ref()
    }

    /// Back to a blank upload view. Always succeeds.
    pub fn start_upload(&mut self) {
        self.generation += 1;
        self.view = View::Upload;
        self.in_flight = None;
        self.outcome = None;
    }

    pub fn begin_intake(&mut self) -> Result<IntakeTicket, ViewError> {
        if self.view != View::Upload {
            return Err(ViewError::InvalidTransition {
                action: "submit a prescription",
                from: self.view,
            });
        }
        if self.in_flight.is_some() {
            return Err(ViewError::UploadInProgress);
        }
        self.in_flight = Some(self.generation);
        Ok(IntakeTicket {
            generation: self.generation,
        })
    }

    /// Upload → Details with the finished intake.
    pub fn complete_intake(
        &mut self,
        ticket: IntakeTicket,
        outcome: IntakeOutcome,
    ) -> Result<(), ViewError> {
        self.check_ticket(ticket)?;
        self.in_flight = None;
        self.outcome = Some(outcome);
        self.view = View::Details;
        Ok(())
    }

    /// Clear the in-flight marker after a fatal intake error.
    pub fn fail_intake(&mut self, ticket: IntakeTicket) -> Result<(), ViewError> {
        self.check_ticket(ticket)?;
        self.in_flight = None;
        Ok(())
    }

    pub fn open_chat(&mut self) -> Result<(), ViewError> {
        if self.view != View::Details {
            return Err(ViewError::InvalidTransition {
                action: "open chat",
                from: self.view,
            });
        }
        if self.outcome.is_none() {
            return Err(ViewError::NoPrescription);
        }
        self.view = View::Chat;
        Ok(())
    }

    pub fn close_chat(&mut self) -> Result<(), ViewError> {
        if self.view != View::Chat {
            return Err(ViewError::InvalidTransition {
                action: "close chat",
                from: self.view,
            });
        }
        self.view = View::Details;
        Ok(())
    }

    fn check_ticket(&self, ticket: IntakeTicket) -> Result<(), ViewError> {
        if ticket.generation != self.generation {
            return Err(ViewError::StaleIntake);
        }
        match self.in_flight {
            Some(generation) if generation == ticket.generation => Ok(()),
            _ => Err(ViewError::NoUploadInFlight),
        }
    }
}
