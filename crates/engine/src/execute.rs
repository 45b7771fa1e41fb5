//! Mutation execution: approved price actions run against the marketplace
//! one at a time, paced, with bounded retry on transient failures and
//! per-action failure isolation.

use std::thread;
use std::time::Duration;

use crate::error::MutationError;
use crate::model::{ExecutionResult, PriceAction};

/// The marketplace mutation interface. One call, one attempt; retry policy
/// belongs to the executor, not the implementation.
pub trait PriceMutator {
    fn set_price(&mut self, item_id: &str, target_minor: i64) -> Result<(), MutationError>;
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Blocking delay before every mutation. Non-zero by design: the
    /// marketplace rate-limits and fingerprints automation.
    pub pacing: Duration,
    /// Retry bound for transient failures, on top of the first attempt.
    pub max_retries: u32,
    /// First retry wait; doubles per retry.
    pub backoff_base: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_secs(2),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Run the approved actions strictly in planner order. A failure on one
/// item never aborts the rest; every action gets a result.
pub fn execute(
    actions: &[PriceAction],
    mutator: &mut dyn PriceMutator,
    opts: &ExecutorOptions,
) -> Vec<ExecutionResult> {
    let mut results = Vec::with_capacity(actions.len());

    for action in actions {
        if !opts.pacing.is_zero() {
            thread::sleep(opts.pacing);
        }
        results.push(run_one(action, mutator, opts));
    }

    results
}

fn run_one(
    action: &PriceAction,
    mutator: &mut dyn PriceMutator,
    opts: &ExecutorOptions,
) -> ExecutionResult {
    let mut backoff = opts.backoff_base;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match mutator.set_price(&action.item_id, action.target_minor) {
            Ok(()) => {
                return ExecutionResult {
                    item_id: action.item_id.clone(),
                    target_minor: action.target_minor,
                    attempted: true,
                    succeeded: true,
                    attempts,
                    error_kind: None,
                    error: None,
                };
            }
            Err(MutationError::Transient(_)) if attempts <= opts.max_retries => {
                if !backoff.is_zero() {
                    thread::sleep(backoff);
                }
                backoff *= 2;
            }
            Err(err) => {
                return ExecutionResult {
                    item_id: action.item_id.clone(),
                    target_minor: action.target_minor,
                    attempted: true,
                    succeeded: false,
                    attempts,
                    error_kind: Some(err.kind()),
                    error: Some(err.to_string()),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MutationErrorKind;
    use std::collections::HashMap;

    /// Scriptable marketplace double: per-item queues of outcomes.
    struct ScriptedMarket {
        script: HashMap<String, Vec<Result<(), MutationError>>>,
        calls: Vec<(String, i64)>,
    }

    impl ScriptedMarket {
        fn new() -> Self {
            Self { script: HashMap::new(), calls: Vec::new() }
        }

        fn on(mut self, id: &str, outcomes: Vec<Result<(), MutationError>>) -> Self {
            self.script.insert(id.into(), outcomes);
            self
        }
    }

    impl PriceMutator for ScriptedMarket {
        fn set_price(&mut self, item_id: &str, target_minor: i64) -> Result<(), MutationError> {
            self.calls.push((item_id.to_string(), target_minor));
            match self.script.get_mut(item_id) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => Ok(()),
            }
        }
    }

    fn action(id: &str, target: i64) -> PriceAction {
        PriceAction {
            item_id: id.into(),
            title: format!("Item {id}"),
            url: String::new(),
            current_minor: target - 100,
            target_minor: target,
            change_percent: 10.0,
            floored: false,
            clamped: false,
        }
    }

    fn fast() -> ExecutorOptions {
        ExecutorOptions {
            pacing: Duration::ZERO,
            max_retries: 3,
            backoff_base: Duration::ZERO,
        }
    }

    #[test]
    fn success_records_one_attempt() {
        let mut market = ScriptedMarket::new();
        let results = execute(&[action("1", 5500)], &mut market, &fast());
        assert_eq!(results.len(), 1);
        assert!(results[0].succeeded);
        assert_eq!(results[0].attempts, 1);
        assert_eq!(market.calls, vec![("1".to_string(), 5500)]);
    }

    #[test]
    fn transient_failures_are_retried_then_succeed() {
        let mut market = ScriptedMarket::new().on(
            "1",
            vec![
                Err(MutationError::Transient("timeout".into())),
                Err(MutationError::Transient("timeout".into())),
                Ok(()),
            ],
        );
        let results = execute(&[action("1", 5500)], &mut market, &fast());
        assert!(results[0].succeeded);
        assert_eq!(results[0].attempts, 3);
    }

    #[test]
    fn transient_failures_exhaust_the_retry_bound() {
        let mut market = ScriptedMarket::new().on(
            "1",
            vec![Err(MutationError::Transient("timeout".into())); 10],
        );
        let results = execute(&[action("1", 5500)], &mut market, &fast());
        assert!(!results[0].succeeded);
        // First attempt plus max_retries.
        assert_eq!(results[0].attempts, 4);
        assert_eq!(results[0].error_kind, Some(MutationErrorKind::Transient));
    }

    #[test]
    fn permanent_failure_is_never_retried() {
        let mut market = ScriptedMarket::new().on(
            "1",
            vec![Err(MutationError::Permanent("item not editable".into()))],
        );
        let results = execute(&[action("1", 5500)], &mut market, &fast());
        assert!(!results[0].succeeded);
        assert_eq!(results[0].attempts, 1);
        assert_eq!(results[0].error_kind, Some(MutationErrorKind::Permanent));
        assert_eq!(market.calls.len(), 1);
    }

    #[test]
    fn one_failure_never_aborts_the_rest() {
        let mut market = ScriptedMarket::new().on(
            "1",
            vec![Err(MutationError::Permanent("rejected".into()))],
        );
        let actions = vec![action("1", 5500), action("2", 6600), action("3", 7700)];
        let results = execute(&actions, &mut market, &fast());
        assert_eq!(results.len(), 3);
        assert!(!results[0].succeeded);
        assert!(results[1].succeeded);
        assert!(results[2].succeeded);
    }

    #[test]
    fn actions_run_in_planner_order() {
        let mut market = ScriptedMarket::new();
        let actions = vec![action("1", 100), action("2", 200), action("3", 300)];
        execute(&actions, &mut market, &fast());
        let ids: Vec<_> = market.calls.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
