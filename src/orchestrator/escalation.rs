//! Three-strike failure escalation.
//!
//! The controller looks at the consecutive-failure count *after* a failure has
//! been counted and picks one of three responses:
//!
//! - below the threshold, a failing worker other than the recovery worker gets
//!   an immediate out-of-band recovery invocation ("Strike 1/2")
//! - below the threshold, a failing recovery worker is left alone until the next
//!   scheduled failure
//! - at or above the threshold the run aborts ("Strike 3")

use super::context::WorkerName;

/// Default consecutive-failure threshold.
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Response to a failed worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// Keep following the schedule.
    Continue,
    /// Invoke `worker` right away with `task` before the next decision.
    Recover { worker: WorkerName, task: String },
    /// Stop the run.
    Abort,
}

#[derive(Debug, Clone)]
pub struct EscalationController {
    max_failures: u32,
    recovery_worker: WorkerName,
}

impl Default for EscalationController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES)
    }
}

impl EscalationController {
    /// Create a controller that aborts once `max_failures` consecutive failures
    /// have been counted. A threshold of zero is treated as one.
    pub fn new(max_failures: u32) -> Self {
        Self {
            max_failures: max_failures.max(1),
            recovery_worker: WorkerName::Debugger,
        }
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    pub fn recovery_worker(&self) -> WorkerName {
        self.recovery_worker
    }

    /// Whether `consecutive_failures` has reached the abort band.
    pub fn should_abort(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.max_failures
    }

    /// Decide how to respond to `failed` having just failed with `error`.
    ///
    /// `consecutive_failures` must already include this failure.
    pub fn on_failure(
        &self,
        failed: WorkerName,
        error: &str,
        consecutive_failures: u32,
    ) -> Escalation {
        if consecutive_failures == 0 {
            return Escalation::Continue;
        }
        if self.should_abort(consecutive_failures) {
            return Escalation::Abort;
        }
        if failed == self.recovery_worker {
            return Escalation::Continue;
        }

        Escalation::Recover {
            worker: self.recovery_worker,
            task: recovery_task(failed, error),
        }
    }
}

/// Task handed to the recovery worker for a failure of `failed`.
pub fn recovery_task(failed: WorkerName, error: &str) -> String {
    format!("Fix error from {}: {}", failed, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_second_strike_trigger_recovery() {
        let controller = EscalationController::default();
        for strike in 1..=2 {
            let escalation = controller.on_failure(WorkerName::BackendCoder, "boom", strike);
            assert_eq!(
                escalation,
                Escalation::Recover {
                    worker: WorkerName::Debugger,
                    task: "Fix error from BackendCoder: boom".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_third_strike_aborts() {
        let controller = EscalationController::default();
        assert_eq!(
            controller.on_failure(WorkerName::Tester, "boom", 3),
            Escalation::Abort
        );
        assert_eq!(
            controller.on_failure(WorkerName::Tester, "boom", 7),
            Escalation::Abort
        );
    }

    #[test]
    fn test_recovery_worker_failure_does_not_recover_itself() {
        let controller = EscalationController::default();
        assert_eq!(
            controller.on_failure(WorkerName::Debugger, "still broken", 1),
            Escalation::Continue
        );
        assert_eq!(
            controller.on_failure(WorkerName::Debugger, "still broken", 3),
            Escalation::Abort
        );
    }

    #[test]
    fn test_zero_failures_is_a_no_op() {
        let controller = EscalationController::default();
        assert_eq!(
            controller.on_failure(WorkerName::Planner, "", 0),
            Escalation::Continue
        );
    }

    #[test]
    fn test_custom_threshold() {
        let controller = EscalationController::new(5);
        assert!(matches!(
            controller.on_failure(WorkerName::Planner, "x", 4),
            Escalation::Recover { .. }
        ));
        assert_eq!(
            controller.on_failure(WorkerName::Planner, "x", 5),
            Escalation::Abort
        );
    }

    #[test]
    fn test_zero_threshold_aborts_on_first_failure() {
        let controller = EscalationController::new(0);
        assert_eq!(controller.max_failures(), 1);
        assert_eq!(
            controller.on_failure(WorkerName::Planner, "x", 1),
            Escalation::Abort
        );
    }
}
