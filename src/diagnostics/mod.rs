// SPDX-License-Identifier: Apache-2.0

//! Diagnostic Logger
//!
//! Routes error messages to the configured targets. The file sink always
//! receives the entry; the other targets are opt-in per call:
//!
//! - `database`: an `error` security event for the client, counted toward its
//!   reputation score
//! - `email`: a notification to the configured recipients
//! - `screen`: an error event on the process log
//!
//! A failing target is reported to the caller, never dropped.

mod sink;

pub use sink::{FileSink, Sink};

use std::sync::Arc;

use chrono::Local;
use gate_core::{ClientContext, EventCode, LedgerStore, Notifier, SecurityEvent, StorageResult};
use tracing::{error, warn};

use crate::config::{LogConfig, LogTarget};

const NOTIFICATION_SUBJECT: &str = "querygate error";

pub struct DiagnosticLogger {
    sink: Arc<dyn Sink>,
    ledger_store: Option<Arc<dyn LedgerStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    email_recipients: Vec<String>,
}

impl DiagnosticLogger {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            ledger_store: None,
            notifier: None,
            email_recipients: Vec::new(),
        }
    }

    /// File-backed logger for the configured log file and recipients
    pub fn from_config(config: &LogConfig) -> Self {
        let mut logger = Self::new(Arc::new(FileSink::new(config.file.clone())));
        logger.email_recipients = config.email_recipients.clone();
        logger
    }

    /// Store receiving the `database` target's events
    pub fn with_ledger_store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.ledger_store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, recipients: Vec<String>) -> Self {
        self.notifier = Some(notifier);
        self.email_recipients = recipients;
        self
    }

    /// Writes `message` to the file sink and to every extra target in
    /// `targets`.
    pub fn log_error(
        &self,
        message: &str,
        targets: &[LogTarget],
        client: &ClientContext,
    ) -> StorageResult<()> {
        self.sink.append(&format_entry(message))?;

        for target in targets {
            match target {
                LogTarget::File => {}
                LogTarget::Database => self.log_to_ledger(message, client)?,
                LogTarget::Email => self.notify(message)?,
                LogTarget::Screen => {
                    error!(ip = %client.ip_address, user = client.user_label(), "{}", message);
                }
            }
        }

        Ok(())
    }

    /// Full content of the diagnostic file
    pub fn get_logs(&self) -> StorageResult<String> {
        self.sink.contents()
    }

    fn log_to_ledger(&self, message: &str, client: &ClientContext) -> StorageResult<()> {
        let Some(store) = &self.ledger_store else {
            warn!("Database log target requested but no ledger store is configured");
            return Ok(());
        };

        let event = SecurityEvent::new(
            EventCode::Error,
            client.user_label(),
            client.ip_address.as_str(),
            client.host_label(),
            message,
        );
        store.append(&event)
    }

    fn notify(&self, message: &str) -> StorageResult<()> {
        let Some(notifier) = &self.notifier else {
            warn!("Email log target requested but no notifier is installed");
            return Ok(());
        };
        if self.email_recipients.is_empty() {
            warn!("Email log target requested but no recipients are configured");
            return Ok(());
        }

        notifier.notify(&self.email_recipients, NOTIFICATION_SUBJECT, message)
    }
}

impl std::fmt::Debug for DiagnosticLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticLogger")
            .field("ledger_store", &self.ledger_store.is_some())
            .field("notifier", &self.notifier.is_some())
            .field("email_recipients", &self.email_recipients)
            .finish_non_exhaustive()
    }
}

/// `YYYY-MM-DD HH:MM:SS - ERROR: <message>\n` in local time
fn format_entry(message: &str) -> String {
    format!(
        "{} - ERROR: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )
}

#[cfg(test)]
mod tests {
    use gate_core::StorageError;
    use parking_lot::Mutex;

    use super::*;
    use crate::reputation::MemoryLedgerStore;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(Vec<String>, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, recipients: &[String], _subject: &str, body: &str) -> StorageResult<()> {
            self.sent.lock().push((recipients.to_vec(), body.to_string()));
            Ok(())
        }
    }

    struct BrokenSink;

    impl Sink for BrokenSink {
        fn append(&self, _entry: &str) -> StorageResult<()> {
            Err(StorageError::io(
                "broken",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }

        fn contents(&self) -> StorageResult<String> {
            Ok(String::new())
        }
    }

    fn client() -> ClientContext {
        ClientContext::new("10.0.0.9").with_user("42")
    }

    #[test]
    fn entry_format_is_stable() {
        let entry = format_entry("Execution failed: boom");
        assert!(entry.ends_with(" - ERROR: Execution failed: boom\n"));
        let stamp = &entry[..19];
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[13..14], ":");
    }

    #[test]
    fn file_target_is_always_written() {
        let dir = tempfile::tempdir().unwrap();
        let logger = DiagnosticLogger::new(Arc::new(FileSink::new(dir.path().join("q.txt"))));

        logger.log_error("first", &[], &client()).unwrap();
        logger.log_error("second", &[LogTarget::Screen], &client()).unwrap();

        let logs = logger.get_logs().unwrap();
        assert_eq!(logs.lines().count(), 2);
        assert!(logs.lines().next().unwrap().ends_with("ERROR: first"));
    }

    #[test]
    fn database_target_records_an_error_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryLedgerStore::new());
        let logger = DiagnosticLogger::new(Arc::new(FileSink::new(dir.path().join("q.txt"))))
            .with_ledger_store(store.clone());

        logger.log_error("boom", &[LogTarget::Database], &client()).unwrap();

        let events = store.events_for("10.0.0.9").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_code.as_str(), "error");
        assert_eq!(events[0].points, 10);
        assert_eq!(events[0].user_id, "42");
    }

    #[test]
    fn email_target_notifies_recipients() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let logger = DiagnosticLogger::new(Arc::new(FileSink::new(dir.path().join("q.txt"))))
            .with_notifier(notifier.clone(), vec!["ops@example.com".into()]);

        logger.log_error("boom", &[LogTarget::Email], &client()).unwrap();

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, vec!["ops@example.com".to_string()]);
        assert_eq!(sent[0].1, "boom");
    }

    #[test]
    fn email_without_notifier_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let logger = DiagnosticLogger::new(Arc::new(FileSink::new(dir.path().join("q.txt"))));
        logger.log_error("boom", &[LogTarget::Email], &client()).unwrap();
        assert_eq!(logger.get_logs().unwrap().lines().count(), 1);
    }

    #[test]
    fn sink_failure_surfaces() {
        let logger = DiagnosticLogger::new(Arc::new(BrokenSink));
        assert!(logger.log_error("boom", &[], &client()).is_err());
    }
}
