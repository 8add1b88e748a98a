//! Bookkeeping of active tool invocations.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// The lifecycle status of an invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvocationStatus {
    /// Observed, but not bound to the display.
    Pending,
    /// Bound to the active progress indicator.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with a failure.
    Failed,
}

/// A tool invocation that has not finished yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    id: String,
    name: String,
    started_at: Instant,
    observed_input_size: usize,
    status: InvocationStatus,
}

impl ToolInvocation {
    /// Returns the correlation id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the tool name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the largest input size seen so far.
    #[inline]
    pub fn observed_input_size(&self) -> usize {
        self.observed_input_size
    }

    /// Returns the current status.
    #[inline]
    pub fn status(&self) -> InvocationStatus {
        self.status
    }

    /// Returns the final snapshot this invocation would have if it
    /// finished now. The ledger is left untouched.
    pub fn finish(&self, succeeded: bool) -> CompletedInvocation {
        CompletedInvocation {
            id: self.id.clone(),
            name: self.name.clone(),
            input_size: self.observed_input_size,
            status: if succeeded {
                InvocationStatus::Succeeded
            } else {
                InvocationStatus::Failed
            },
            elapsed: self.started_at.elapsed(),
        }
    }
}

/// The final snapshot of an invocation, removed from the [`Ledger`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedInvocation {
    /// The correlation id.
    pub id: String,
    /// The tool name.
    pub name: String,
    /// The largest input size seen.
    pub input_size: usize,
    /// Either `Succeeded` or `Failed`.
    pub status: InvocationStatus,
    /// Time between first observation and completion.
    pub elapsed: Duration,
}

impl CompletedInvocation {
    /// Returns whether the invocation succeeded.
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.status == InvocationStatus::Succeeded
    }
}

/// In-memory map of invocations that have not finished yet.
///
/// The ledger is pure state. It never renders anything, and it is only
/// mutated by the dispatcher that owns it.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    invocations: HashMap<String, ToolInvocation>,
}

impl Ledger {
    /// Returns the entry for `id`, creating a pending one if needed.
    ///
    /// The name of an existing entry is never changed.
    pub fn upsert(&mut self, id: &str, name: &str) -> &ToolInvocation {
        self.invocations
            .entry(id.to_owned())
            .or_insert_with(|| ToolInvocation {
                id: id.to_owned(),
                name: name.to_owned(),
                started_at: Instant::now(),
                observed_input_size: 0,
                status: InvocationStatus::Pending,
            })
    }

    /// Records an observed input size.
    ///
    /// Returns `true` only if `size` is strictly greater than the size
    /// recorded so far. Unknown ids are ignored.
    pub fn record_input_size(&mut self, id: &str, size: usize) -> bool {
        let Some(invocation) = self.invocations.get_mut(id) else {
            return false;
        };
        if size <= invocation.observed_input_size {
            return false;
        }
        invocation.observed_input_size = size;
        true
    }

    /// Marks `id` as running and demotes any other running entry back to
    /// pending, so at most one entry is running at a time.
    ///
    /// Returns `false` if `id` is unknown.
    pub fn set_running(&mut self, id: &str) -> bool {
        if !self.invocations.contains_key(id) {
            return false;
        }
        for invocation in self.invocations.values_mut() {
            invocation.status = if invocation.id == id {
                InvocationStatus::Running
            } else if invocation.status == InvocationStatus::Running {
                InvocationStatus::Pending
            } else {
                invocation.status
            };
        }
        true
    }

    /// Finishes `id` and removes it from the ledger.
    ///
    /// Returns `None` if `id` is not present, which happens when it was
    /// already completed or never observed.
    pub fn complete(
        &mut self,
        id: &str,
        succeeded: bool,
    ) -> Option<CompletedInvocation> {
        let invocation = self.invocations.remove(id)?;
        Some(invocation.finish(succeeded))
    }

    /// Returns the entry for `id`.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&ToolInvocation> {
        self.invocations.get(id)
    }

    /// Returns whether `id` is present.
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.invocations.contains_key(id)
    }

    /// Returns the number of unfinished invocations.
    #[inline]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    /// Returns `true` if there is no unfinished invocation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Iterates over the unfinished invocations in no particular order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.invocations.values()
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::advance;

    use super::*;

    #[test]
    fn test_upsert_keeps_existing() {
        let mut ledger = Ledger::default();
        let invocation = ledger.upsert("tool:1", "lookup");
        assert_eq!(invocation.status(), InvocationStatus::Pending);
        assert_eq!(invocation.observed_input_size(), 0);

        ledger.record_input_size("tool:1", 5);
        let invocation = ledger.upsert("tool:1", "other");
        assert_eq!(invocation.name(), "lookup");
        assert_eq!(invocation.observed_input_size(), 5);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_input_size_is_monotonic() {
        let mut ledger = Ledger::default();
        ledger.upsert("tool:1", "lookup");

        assert!(ledger.record_input_size("tool:1", 10));
        assert!(!ledger.record_input_size("tool:1", 10));
        assert!(!ledger.record_input_size("tool:1", 3));
        assert!(!ledger.record_input_size("tool:1", 0));
        assert_eq!(ledger.get("tool:1").unwrap().observed_input_size(), 10);
        assert!(ledger.record_input_size("tool:1", 11));

        assert!(!ledger.record_input_size("tool:2", 100));
        assert!(!ledger.contains("tool:2"));
    }

    #[test]
    fn test_single_running_entry() {
        let mut ledger = Ledger::default();
        ledger.upsert("tool:1", "lookup");
        ledger.upsert("tool:2", "notify");

        assert!(ledger.set_running("tool:1"));
        assert!(ledger.set_running("tool:2"));
        assert!(!ledger.set_running("tool:3"));

        let running = ledger
            .iter()
            .filter(|i| i.status() == InvocationStatus::Running)
            .map(ToolInvocation::id)
            .collect::<Vec<_>>();
        assert_eq!(running, ["tool:2"]);
        assert_eq!(
            ledger.get("tool:1").unwrap().status(),
            InvocationStatus::Pending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_removes_entry() {
        let mut ledger = Ledger::default();
        ledger.upsert("tool:1", "lookup");
        ledger.record_input_size("tool:1", 2);
        advance(Duration::from_millis(1500)).await;

        let completed = ledger.complete("tool:1", true).unwrap();
        assert_eq!(completed.name, "lookup");
        assert_eq!(completed.input_size, 2);
        assert!(completed.succeeded());
        assert_eq!(completed.status, InvocationStatus::Succeeded);
        assert_eq!(completed.elapsed, Duration::from_millis(1500));
        assert!(ledger.is_empty());

        assert_eq!(ledger.complete("tool:1", true), None);
    }

    #[test]
    fn test_complete_unknown() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.complete("tool:9", false), None);
    }
}
