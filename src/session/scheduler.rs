//! Proactive renewal timer
//!
//! One task per manager sleeps until the stored expiry is within the safety
//! margin and then renews through the same serialized path callers use. The
//! task holds only a `Weak` reference, is re-armed on every session change and
//! is aborted when the manager is disposed or dropped.

use crate::session::manager::Inner;
use crate::utils::logging::LoggingHelper;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Who asked for a renewal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalTrigger {
    /// `get_valid_access_token` found the token inside the margin
    Caller,
    /// The timer fired
    Scheduled,
}

impl fmt::Display for RenewalTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => f.write_str("caller"),
            Self::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// Next timer deadline computed from the current session
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenewalPlan {
    /// Renewal generation observed when the plan was made
    pub(crate) generation: u64,
    pub(crate) delay: Duration,
    pub(crate) expires_at: DateTime<Utc>,
}

pub(crate) fn spawn(inner: &Arc<Inner>) -> JoinHandle<()> {
    let weak = Arc::downgrade(inner);
    let changed = inner.changed();

    tokio::spawn(async move {
        loop {
            let Some(plan) = next_plan(&weak) else {
                return;
            };

            match plan {
                None => changed.notified().await,
                Some(plan) => {
                    LoggingHelper::log_renewal_scheduled(plan.delay, plan.expires_at);
                    tokio::select! {
                        () = tokio::time::sleep(plan.delay) => {
                            let Some(inner) = weak.upgrade() else {
                                return;
                            };
                            inner
                                .renew_serialized(plan.generation, RenewalTrigger::Scheduled)
                                .await;
                        }
                        () = changed.notified() => {}
                    }
                }
            }
        }
    })
}

/// Outer `None`: the manager is gone. Inner `None`: nothing to renew yet.
fn next_plan(weak: &Weak<Inner>) -> Option<Option<RenewalPlan>> {
    weak.upgrade().map(|inner| inner.next_renewal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_labels() {
        assert_eq!(RenewalTrigger::Caller.to_string(), "caller");
        assert_eq!(RenewalTrigger::Scheduled.to_string(), "scheduled");
    }
}
