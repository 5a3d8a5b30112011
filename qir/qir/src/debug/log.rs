//! Internal machinery for collecting debug logs of a planning run.
#![doc(hidden)]

use std::cell::RefCell;
use std::time::SystemTime;

use chrono::prelude::*;
use serde::Serialize;
use strum_macros::AsRefStr;

thread_local! {
    /// Debug info about the planning run on this thread.
    /// Is reset by [log_start] and [log_finish].
    static CURRENT_LOG: RefCell<Option<DebugLog>> = const { RefCell::new(None) };
}

/// Starts collecting on the current thread. Replaces a log that was never
/// finished.
pub fn log_start() {
    let started_at: DateTime<Utc> = SystemTime::now().into();
    let started_at = format!("{}", started_at.format("%+"));

    let replaced = CURRENT_LOG.with_borrow_mut(|log| {
        log.replace(DebugLog {
            started_at,
            version: crate::version().to_string(),
            entries: Vec::new(),

            current_stage: Stage::Initial,
        })
    });
    if replaced.is_some() {
        log::warn!("debug log started while another one was active");
    }
}

pub fn log_finish() -> Option<DebugLog> {
    CURRENT_LOG.with_borrow_mut(Option::take)
}

pub fn log_is_enabled() -> bool {
    CURRENT_LOG.with_borrow(Option::is_some)
}

pub fn log_stage(stage: Stage) {
    let started = CURRENT_LOG.with_borrow_mut(|log| match log {
        Some(log) => {
            log.current_stage = stage;
            true
        }
        None => false,
    });
    if started {
        log::debug!("stage {}", stage.as_ref());
    }
}

/// Appends an entry. `entry` is only called when a log is being collected.
pub fn log_entry(entry: impl FnOnce() -> DebugEntryKind) {
    if !log_is_enabled() {
        return;
    }
    let kind = entry();
    CURRENT_LOG.with_borrow_mut(|log| {
        if let Some(log) = log {
            log.entries.push(DebugEntry {
                stage: log.current_stage,
                kind,
            });
        }
    });
}

/// Logs the JSON representation of an IR value.
pub fn log_repr<T: Serialize>(value: &T) {
    log_entry(|| {
        DebugEntryKind::ReprIr(serde_json::to_value(value).unwrap_or_else(|err| {
            serde_json::Value::String(format!("<cannot serialize: {err}>"))
        }))
    });
}

#[derive(Debug, Serialize)]
pub struct DebugLog {
    pub started_at: String,
    pub version: String,
    pub entries: Vec<DebugEntry>,

    #[serde(skip)]
    current_stage: Stage,
}

#[derive(Debug, Serialize)]
pub struct DebugEntry {
    pub stage: Stage,
    pub kind: DebugEntryKind,
}

#[derive(Debug, Serialize)]
pub enum DebugEntryKind {
    ReprIr(serde_json::Value),
    Message(Message),
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub level: String,
    pub module_path: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
pub enum Stage {
    Initial,
    NamingConvention,
    Validation,
    RemoteJoins,
    Preparation,
}

impl DebugLog {
    /// Entries of one stage, in the order they were logged.
    pub fn entries_of(&self, stage: Stage) -> impl Iterator<Item = &DebugEntry> {
        self.entries.iter().filter(move |e| e.stage == stage)
    }
}
