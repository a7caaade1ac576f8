//! Two-step confirmation for changing a batch's lock flag.
//!
//! The sequence is held as a single [`LockStage`] value, so at most one intent
//! exists and the two prompts can never be open at the same time:
//!
//! ```text
//! Idle --request_change--> FirstConfirmPending --confirm_first--> SecondConfirmPending
//!   ^                            |                                      |
//!   +-------- cancel ------------+------ cancel / confirm_second -------+
//! ```
//!
//! The displayed collection keeps the old value for the whole sequence; the
//! new value is written into it only after the backend accepts the change.

use std::time::Duration;

use metrics::counter;
use tracing::{info, warn};

use crate::browse::PageNavigator;
use crate::client::LockUpdater;
use crate::error::LockError;
use crate::models::{Candado, Lote};
use crate::notify::{Notifier, Severity};

pub const ENABLE_EDIT_PROMPT: &str = "¿Desea habilitar la edición del lote?";
pub const PROTECT_PROMPT: &str = "¿Desea proteger el lote?";
pub const GENERIC_PROMPT: &str = "¿Está seguro de realizar este cambio?";
pub const SECOND_PROMPT: &str = "¿Está totalmente seguro?";
pub const UPDATE_SUCCESS: &str = "Estado del lote actualizado exitosamente";
pub const UPDATE_FAILURE: &str = "Error al actualizar el estado del lote";

/// A requested lock change awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockIntent {
    pub secuencia: i64,
    pub old: Candado,
    pub new: Candado,
}

impl LockIntent {
    /// Wording of the first prompt for this transition.
    pub fn first_prompt(&self) -> &'static str {
        match (self.old, self.new) {
            (Candado::N, Candado::S) => ENABLE_EDIT_PROMPT,
            (Candado::S, Candado::N) => PROTECT_PROMPT,
            _ => GENERIC_PROMPT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStage {
    #[default]
    Idle,
    FirstConfirmPending(LockIntent),
    SecondConfirmPending(LockIntent),
}

impl LockStage {
    fn name(&self) -> &'static str {
        match self {
            LockStage::Idle => "idle",
            LockStage::FirstConfirmPending(_) => "first",
            LockStage::SecondConfirmPending(_) => "second",
        }
    }
}

/// How a confirmed change ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    /// Accepted by the backend; the displayed batch now carries the new value
    Applied(LockIntent),
    /// Rejected or failed; the displayed batch keeps the old value
    Rejected { intent: LockIntent, message: String },
}

#[derive(Debug, Default)]
pub struct LockSequencer {
    stage: LockStage,
}

impl LockSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> LockStage {
        self.stage
    }

    /// Start a change of `lote`'s lock to `new`.
    ///
    /// Returns `None` and stays put when `new` equals the current value. A
    /// request made while another is pending replaces it.
    pub fn request_change(&mut self, lote: &Lote, new: Candado) -> Option<LockIntent> {
        if lote.candado == new {
            return None;
        }
        if self.stage != LockStage::Idle {
            warn!(stage = self.stage.name(), "Replacing pending lock change");
        }
        let intent = LockIntent {
            secuencia: lote.secuencia,
            old: lote.candado,
            new,
        };
        info!(secuencia = intent.secuencia, old = %intent.old, new = %intent.new, "Lock change requested");
        self.stage = LockStage::FirstConfirmPending(intent);
        Some(intent)
    }

    /// Text of the prompt currently shown, if any.
    pub fn prompt(&self) -> Option<&'static str> {
        match &self.stage {
            LockStage::Idle => None,
            LockStage::FirstConfirmPending(intent) => Some(intent.first_prompt()),
            LockStage::SecondConfirmPending(_) => Some(SECOND_PROMPT),
        }
    }

    /// Accept the first prompt and move on to the second.
    pub fn confirm_first(&mut self) -> Result<LockIntent, LockError> {
        match self.stage {
            LockStage::FirstConfirmPending(intent) => {
                self.stage = LockStage::SecondConfirmPending(intent);
                Ok(intent)
            }
            LockStage::Idle => Err(LockError::NothingPending),
            LockStage::SecondConfirmPending(_) => Err(LockError::WrongStage {
                expected: "first",
                actual: "second",
            }),
        }
    }

    /// Drop the pending intent, if any, without contacting the backend.
    pub fn cancel(&mut self) -> Option<LockIntent> {
        let previous = std::mem::take(&mut self.stage);
        match previous {
            LockStage::Idle => None,
            LockStage::FirstConfirmPending(intent) | LockStage::SecondConfirmPending(intent) => {
                info!(secuencia = intent.secuencia, "Lock change cancelled");
                Some(intent)
            }
        }
    }

    /// Accept the second prompt: send the update and apply or discard it.
    ///
    /// The sequencer is back to idle when this returns, whatever the outcome.
    pub async fn confirm_second(
        &mut self,
        updater: &dyn LockUpdater,
        lotes: &PageNavigator<Lote>,
        notifier: &dyn Notifier,
        duration: Duration,
    ) -> Result<LockOutcome, LockError> {
        let intent = match self.stage {
            LockStage::SecondConfirmPending(intent) => intent,
            LockStage::Idle => return Err(LockError::NothingPending),
            LockStage::FirstConfirmPending(_) => {
                return Err(LockError::WrongStage {
                    expected: "second",
                    actual: "first",
                });
            }
        };
        self.stage = LockStage::Idle;

        let rejection = match updater.update_candado(intent.secuencia, intent.new).await {
            Ok(response) if response.is_success() => None,
            Ok(response) => Some(response.message.filter(|m| !m.trim().is_empty())),
            Err(err) => {
                warn!(secuencia = intent.secuencia, error = %err, "Lock update request failed");
                Some(err.server_message().map(str::to_string))
            }
        };

        match rejection {
            None => {
                lotes.modify_items(|items| {
                    for lote in items.iter_mut().filter(|l| l.secuencia == intent.secuencia) {
                        lote.candado = intent.new;
                    }
                });
                counter!("nomina_lock_update_total", "outcome" => "applied").increment(1);
                info!(secuencia = intent.secuencia, candado = %intent.new, "Lock change applied");
                notifier.notify(UPDATE_SUCCESS, Severity::Success, duration);
                Ok(LockOutcome::Applied(intent))
            }
            Some(server_message) => {
                counter!("nomina_lock_update_total", "outcome" => "rejected").increment(1);
                let message = server_message.unwrap_or_else(|| UPDATE_FAILURE.to_string());
                notifier.notify(&message, Severity::Error, duration);
                Ok(LockOutcome::Rejected { intent, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lote(candado: &str) -> Lote {
        serde_json::from_value(json!({"secuencia": 42, "candado": candado})).unwrap()
    }

    #[test]
    fn same_value_is_ignored() {
        let mut sequencer = LockSequencer::new();
        assert_eq!(sequencer.request_change(&lote("S"), Candado::S), None);
        assert_eq!(sequencer.stage(), LockStage::Idle);
        assert_eq!(sequencer.prompt(), None);
    }

    #[test]
    fn prompts_depend_on_direction() {
        let mut sequencer = LockSequencer::new();
        sequencer.request_change(&lote("N"), Candado::S);
        assert_eq!(sequencer.prompt(), Some(ENABLE_EDIT_PROMPT));

        sequencer.request_change(&lote("S"), Candado::N);
        assert_eq!(sequencer.prompt(), Some(PROTECT_PROMPT));

        sequencer.confirm_first().unwrap();
        assert_eq!(sequencer.prompt(), Some(SECOND_PROMPT));
    }

    #[test]
    fn cancel_at_either_stage_returns_to_idle() {
        let mut sequencer = LockSequencer::new();
        sequencer.request_change(&lote("N"), Candado::S);
        assert!(sequencer.cancel().is_some());
        assert_eq!(sequencer.stage(), LockStage::Idle);

        sequencer.request_change(&lote("N"), Candado::S);
        sequencer.confirm_first().unwrap();
        let intent = sequencer.cancel().unwrap();
        assert_eq!(intent.new, Candado::S);
        assert_eq!(sequencer.stage(), LockStage::Idle);
        assert_eq!(sequencer.cancel(), None);
    }

    #[test]
    fn confirm_out_of_order_is_rejected() {
        let mut sequencer = LockSequencer::new();
        assert_eq!(sequencer.confirm_first(), Err(LockError::NothingPending));

        sequencer.request_change(&lote("N"), Candado::S);
        sequencer.confirm_first().unwrap();
        let err = sequencer.confirm_first().unwrap_err();
        assert_eq!(
            err,
            LockError::WrongStage {
                expected: "first",
                actual: "second",
            }
        );
        assert_eq!(
            err.to_string(),
            "Confirmation for the first prompt requested while the second prompt is open"
        );
    }

    #[test]
    fn generic_prompt_for_unexpected_transition() {
        let intent = LockIntent {
            secuencia: 1,
            old: Candado::S,
            new: Candado::S,
        };
        assert_eq!(intent.first_prompt(), GENERIC_PROMPT);
    }
}
