use log::{Level, Metadata, Record};

use super::{log_entry, log_is_enabled, DebugEntryKind, Message};

/// Forwards `log` records of this crate into the current debug log.
///
/// Install it with [log::set_logger] to get the planner's messages
/// interleaved with the IR snapshots of each stage.
pub struct MessageLogger {
    pub max_level: Level,
}

impl Default for MessageLogger {
    fn default() -> Self {
        MessageLogger {
            max_level: Level::Debug,
        }
    }
}

impl log::Log for MessageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
            && metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
            && log_is_enabled()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        log_entry(|| {
            DebugEntryKind::Message(Message {
                level: record.level().to_string(),
                module_path: record.module_path().map(str::to_string),
                text: record.args().to_string(),
            })
        });
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod test {
    use log::Log;

    use super::*;
    use crate::debug::{log_finish, log_start};

    fn record(target: &str, level: Level, f: impl FnOnce(&Record)) {
        f(&Record::builder()
            .target(target)
            .level(level)
            .module_path(Some(target))
            .args(format_args!("planning select"))
            .build())
    }

    #[test]
    fn test_message_logger() {
        let logger = MessageLogger::default();

        // nothing is collected outside of a run
        record("qir::planner", Level::Debug, |r| {
            assert!(!logger.enabled(r.metadata()))
        });

        log_start();
        record("qir::planner", Level::Debug, |r| logger.log(r));
        record("qir::planner", Level::Trace, |r| logger.log(r));
        record("other_crate", Level::Info, |r| logger.log(r));
        let log = log_finish().unwrap();

        let messages: Vec<_> = log
            .entries
            .iter()
            .filter_map(|e| match &e.kind {
                DebugEntryKind::Message(m) => Some(m),
                _ => None,
            })
            .filter(|m| m.module_path.as_deref() == Some("qir::planner"))
            .collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, "DEBUG");
        assert_eq!(messages[0].text, "planning select");
    }
}
