//! Per-run JSON session log.
//!
//! Each run gets its own directory keyed by start timestamp under the
//! configured sessions root. `attempts.json` is rewritten after every
//! recorded attempt so a crash still leaves a usable partial log;
//! `final_report.json` is written once at the end. Single writer, sequential.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::attempt::{ApplicationAttempt, SessionReport};
use crate::error::BotError;

const ATTEMPTS_FILE: &str = "attempts.json";
const REPORT_FILE: &str = "final_report.json";

pub struct SessionLogger {
    dir: PathBuf,
    started_at: DateTime<Utc>,
    attempts: Vec<ApplicationAttempt>,
}

impl SessionLogger {
    /// Create the session directory `<root>/<YYYYMMDD_HHMMSS>/`.
    pub fn create(root: &Path) -> Result<Self, BotError> {
        let started_at = Utc::now();
        let dir = root.join(started_at.format("%Y%m%d_%H%M%S").to_string());
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            started_at,
            attempts: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn attempts(&self) -> &[ApplicationAttempt] {
        &self.attempts
    }

    /// Append one attempt record and flush the attempts log to disk.
    pub fn record(&mut self, attempt: ApplicationAttempt) -> Result<(), BotError> {
        self.attempts.push(attempt);
        let json = serde_json::to_string_pretty(&self.attempts)?;
        fs::write(self.dir.join(ATTEMPTS_FILE), json)?;
        Ok(())
    }

    /// Derive the session report from the recorded attempts and write it out.
    pub fn finalize(&self) -> Result<SessionReport, BotError> {
        let report = SessionReport::from_attempts(&self.attempts, self.started_at);
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(self.dir.join(REPORT_FILE), json)?;
        Ok(report)
    }

    /// Load the report of the most recent finished session under `root`.
    pub fn latest_report(root: &Path) -> Result<(PathBuf, SessionReport), BotError> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(root)
            .map_err(|_| BotError::NoSession)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.join(REPORT_FILE).exists())
            .collect();
        // Timestamped directory names sort chronologically.
        dirs.sort();

        let dir = dirs.pop().ok_or(BotError::NoSession)?;
        let contents = fs::read_to_string(dir.join(REPORT_FILE))?;
        let report: SessionReport = serde_json::from_str(&contents)?;
        Ok((dir, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::{ApplyMode, Attempt, AttemptMachine, AttemptOutcome, JobListing};
    use tempfile::TempDir;

    fn record_for(outcome: AttemptOutcome) -> ApplicationAttempt {
        let mut attempt = Attempt::new(JobListing::new(
            "Job".into(),
            "Co".into(),
            "https://example.com/j".into(),
            ApplyMode::EasyApply,
        ));
        AttemptMachine::dispatch(&mut attempt);
        AttemptMachine::finish(&mut attempt, outcome);
        ApplicationAttempt::from_attempt(&attempt)
    }

    #[test]
    fn record_flushes_attempts_log() {
        let root = TempDir::new().unwrap();
        let mut logger = SessionLogger::create(root.path()).unwrap();

        logger.record(record_for(AttemptOutcome::Succeeded)).unwrap();
        logger.record(record_for(AttemptOutcome::Failed)).unwrap();

        let contents = fs::read_to_string(logger.dir().join(ATTEMPTS_FILE)).unwrap();
        let parsed: Vec<ApplicationAttempt> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].outcome, AttemptOutcome::Succeeded);
    }

    #[test]
    fn finalize_writes_consistent_report() {
        let root = TempDir::new().unwrap();
        let mut logger = SessionLogger::create(root.path()).unwrap();
        logger.record(record_for(AttemptOutcome::Succeeded)).unwrap();
        logger.record(record_for(AttemptOutcome::Skipped)).unwrap();
        logger.record(record_for(AttemptOutcome::TimedOut)).unwrap();

        let report = logger.finalize().unwrap();
        assert_eq!(report.attempted, 3);
        assert!(report.is_consistent());

        let contents = fs::read_to_string(logger.dir().join(REPORT_FILE)).unwrap();
        let parsed: SessionReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn latest_report_finds_newest_session() {
        let root = TempDir::new().unwrap();

        // Two fabricated session directories with ascending timestamps.
        for (stamp, succeeded) in [("20250101_090000", 0usize), ("20250102_090000", 1)] {
            let dir = root.path().join(stamp);
            fs::create_dir_all(&dir).unwrap();
            let report = SessionReport {
                attempted: 1,
                succeeded,
                failed: 1 - succeeded,
                skipped: 0,
                timed_out: 0,
                easy_apply_found: 1,
                started_at: Utc::now(),
                finished_at: Utc::now(),
            };
            fs::write(
                dir.join(REPORT_FILE),
                serde_json::to_string_pretty(&report).unwrap(),
            )
            .unwrap();
        }

        let (dir, report) = SessionLogger::latest_report(root.path()).unwrap();
        assert!(dir.ends_with("20250102_090000"));
        assert_eq!(report.succeeded, 1);
    }

    #[test]
    fn latest_report_without_sessions_errors() {
        let root = TempDir::new().unwrap();
        let err = SessionLogger::latest_report(root.path()).unwrap_err();
        assert!(matches!(err, BotError::NoSession));
    }
}
