//! RAII guard marking a project's orchestration run as in progress.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use events::{Event, EventBus};

use crate::error::{OrchestratorError, Result};

/// Set of project ids with an orchestration run in flight.
///
/// Cheap to clone; clones share the same set.
#[derive(Clone, Default)]
pub struct RunRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the run slot for `project_id`. A second claim while the first
    /// guard is alive fails with `AlreadyRunning`.
    pub fn try_start(&self, project_id: &str, event_bus: Option<EventBus>) -> Result<RunGuard> {
        if !self.lock().insert(project_id.to_string()) {
            return Err(OrchestratorError::AlreadyRunning(project_id.to_string()));
        }

        debug!(project_id = %project_id, "Run guard acquired");
        Ok(RunGuard {
            registry: self.clone(),
            project_id: project_id.to_string(),
            event_bus,
            completed: false,
        })
    }

    pub fn is_running(&self, project_id: &str) -> bool {
        self.lock().contains(project_id)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

/// Releases the run slot on drop. Dropping without `mark_completed` (a
/// panic or an early return) also emits a failed `GenerationFinished`.
pub struct RunGuard {
    registry: RunRegistry,
    project_id: String,
    event_bus: Option<EventBus>,
    completed: bool,
}

impl RunGuard {
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.completed {
            warn!(
                project_id = %self.project_id,
                "Run guard dropped before the run finished"
            );
            if let Some(ref bus) = self.event_bus {
                bus.emit(Event::GenerationFinished {
                    project_id: self.project_id.clone(),
                    with_errors: true,
                });
            }
        }

        self.registry.lock().remove(&self.project_id);
        debug!(project_id = %self.project_id, "Run guard released");
    }
}
