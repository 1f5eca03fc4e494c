//! The reminder registry.
//!
//! Owns the name-to-task map, starts and cancels the per-reminder tasks,
//! and keeps the persisted overlay in step with runtime adds and removes.

use anyhow::Result;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use log::{error, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::Timing;
use crate::core::store::ReminderStore;
use crate::features::delivery::{DeliveryTransport, Dispatcher};

use super::definition::{validate, ReminderDefinition, ValidationError};
use super::task::{self, TaskState};

/// One registered reminder: its definition plus the live task plumbing.
struct ReminderEntry {
    definition: ReminderDefinition,
    state: Arc<TaskState>,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Snapshot row returned by [`ReminderScheduler::list`] and
/// [`ReminderScheduler::status`].
#[derive(Debug, Clone)]
pub struct ReminderStatus {
    pub name: String,
    pub running: bool,
    pub next_fire: Option<NaiveDateTime>,
    pub repeat_every: String,
    pub times_sent: u32,
    pub repeat_count: i64,
}

impl ReminderStatus {
    /// Fire budget as shown to users: a number, or `∞` for unbounded.
    pub fn limit_display(&self) -> String {
        if self.repeat_count < 0 {
            "∞".to_string()
        } else {
            self.repeat_count.to_string()
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.running { "running" } else { "stopped" };
        let next = self
            .next_fire
            .map(|at| at.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}: {state}, next fire {next}, every {}, sent {}/{}",
            self.name,
            self.repeat_every,
            self.times_sent,
            self.limit_display()
        )
    }
}

/// Why a registry call was rejected.
#[derive(Debug)]
pub enum RegistryError {
    /// A reminder with this name is already registered.
    NameConflict(String),
    /// No reminder with this name is registered.
    NotFound(String),
    /// The definition failed field validation; nothing changed.
    Validation(ValidationError),
    /// The persisted overlay could not be updated; in-memory state may
    /// diverge from disk until the next successful write or reload.
    Persistence(anyhow::Error),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NameConflict(name) => {
                write!(f, "a reminder named '{name}' already exists")
            }
            RegistryError::NotFound(name) => write!(f, "no reminder named '{name}'"),
            RegistryError::Validation(e) => write!(f, "invalid reminder: {e}"),
            RegistryError::Persistence(e) => write!(f, "failed to persist reminders: {e}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<ValidationError> for RegistryError {
    fn from(e: ValidationError) -> Self {
        RegistryError::Validation(e)
    }
}

/// Registry of named reminders, at most one active task per name.
///
/// The map is the only shared mutable state; tasks publish their progress
/// through [`TaskState`] and `list()` reads are consistent snapshots that
/// may trail an in-flight fire by one cycle.
pub struct ReminderScheduler {
    reminders: DashMap<String, ReminderEntry>,
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn ReminderStore>,
    timing: Timing,
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn ReminderStore>, transport: Arc<dyn DeliveryTransport>) -> Self {
        Self::with_timing(store, transport, Timing::default())
    }

    pub fn with_timing(
        store: Arc<dyn ReminderStore>,
        transport: Arc<dyn DeliveryTransport>,
        timing: Timing,
    ) -> Self {
        ReminderScheduler {
            reminders: DashMap::new(),
            dispatcher: Arc::new(Dispatcher::new(transport)),
            store,
            timing,
        }
    }

    /// Load every persisted definition (overlay over base) and start a task
    /// for each. A definition whose schedule cannot be parsed is skipped
    /// with a warning; the rest still start. Returns how many started.
    pub fn start(&self) -> Result<usize> {
        let definitions = self.store.load()?;
        let total = definitions.len();
        let mut started = 0;

        for (name, definition) in definitions {
            match self.start_task(&name, definition) {
                Ok(()) => started += 1,
                Err(e) => warn!("skipping reminder '{name}': {e}"),
            }
        }

        info!("started {started} of {total} reminder task(s)");
        Ok(started)
    }

    /// Register a new reminder: validate, persist to the overlay, then
    /// start its task. Rejects names that are already registered.
    pub fn add(&self, name: &str, definition: ReminderDefinition) -> Result<(), RegistryError> {
        validate(name, &definition)?;
        if self.reminders.contains_key(name) {
            return Err(RegistryError::NameConflict(name.to_string()));
        }

        self.store
            .upsert_overlay(name, &definition)
            .map_err(RegistryError::Persistence)?;

        // Validation already proved the schedule parses.
        if let Err(e) = self.start_task(name, definition) {
            error!("reminder '{name}' validated but failed to start: {e}");
        }
        info!("added reminder '{name}'");
        Ok(())
    }

    /// Cancel a reminder's task and drop it from memory and the overlay.
    /// A name that is not registered is `NotFound`, including on a second
    /// remove of the same name.
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        let (name, entry) = self
            .reminders
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        // The task observes this at its next poll; a fire already in
        // progress still completes.
        let _ = entry.cancel.send(true);

        self.store
            .remove_overlay(&name)
            .map_err(RegistryError::Persistence)?;

        info!("removed reminder '{name}'");
        Ok(())
    }

    /// Snapshot of every registered reminder, sorted by name. Entries whose
    /// task has expired stay visible as "stopped" until removed or
    /// reloaded.
    pub fn list(&self) -> Vec<ReminderStatus> {
        let mut rows: Vec<ReminderStatus> = self
            .reminders
            .iter()
            .map(|entry| Self::status_row(entry.key(), entry.value()))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Snapshot of one reminder.
    pub fn status(&self, name: &str) -> Result<ReminderStatus, RegistryError> {
        self.reminders
            .get(name)
            .map(|entry| Self::status_row(entry.key(), entry.value()))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Stop every task, discard in-memory state, and restart from the
    /// store. Returns how many tasks started.
    pub fn reload_all(&self) -> Result<usize> {
        info!("reloading all reminders");
        self.shutdown_all();
        self.start()
    }

    /// Cancel every task and clear the registry. Idempotent and safe to
    /// call during process teardown.
    pub fn shutdown_all(&self) {
        let count = self.reminders.len();
        for entry in self.reminders.iter() {
            let _ = entry.cancel.send(true);
        }
        self.reminders.clear();
        if count > 0 {
            info!("stopped {count} reminder task(s)");
        }
    }

    /// Spawn the task for one definition and register its entry. Inserting
    /// over an existing entry drops that entry's cancel sender, which stops
    /// the old task at its next poll, so a name can never have two live
    /// tasks.
    fn start_task(
        &self,
        name: &str,
        definition: ReminderDefinition,
    ) -> Result<(), crate::features::schedule::ScheduleParseError> {
        let state = Arc::new(TaskState::default());
        let (cancel, cancelled) = watch::channel(false);
        let handle = task::spawn(
            name.to_string(),
            definition.clone(),
            Arc::clone(&self.dispatcher),
            Arc::clone(&state),
            self.timing.clone(),
            cancelled,
        )?;
        self.reminders.insert(
            name.to_string(),
            ReminderEntry {
                definition,
                state,
                cancel,
                handle,
            },
        );
        Ok(())
    }

    fn status_row(name: &str, entry: &ReminderEntry) -> ReminderStatus {
        ReminderStatus {
            name: name.to_string(),
            running: !entry.handle.is_finished(),
            next_fire: entry.state.next_fire(),
            repeat_every: entry.definition.repeat_every.clone(),
            times_sent: entry.state.times_sent(),
            repeat_count: entry.definition.repeat_count,
        }
    }
}
