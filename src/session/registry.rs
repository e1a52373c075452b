//! Session registry: owns every session and every student stream.
//!
//! Locking layout:
//! - `sessions` maps session ids to entries; it is write-locked only to
//!   create or release a session.
//! - Each session's `phase` is read-locked by every ingest and write-locked
//!   by `end_session`, so ending waits for in-flight ingests and no ingest
//!   lands after the summary is computed.
//! - Each session's `roster` is write-locked only to add a student, which
//!   makes stream creation race-free.
//! - Each student stream has its own mutex; two students never contend.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::core::stats;
use crate::core::{
    Alert, AlertLog, AlertOutcome, AlertSummary, EnrichedObservation, FrameResult,
    StudentStreamState,
};
use crate::error::EngineError;
use crate::observation::Observation;
use crate::session::types::{
    SessionArchive, SessionHistory, SessionSnapshot, SessionSummary, StudentSummary,
};
use crate::sink::AlertSink;
use crate::telemetry::{create_shared_stats, EngineStatsSnapshot, SharedEngineStats};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type SharedStream = Arc<Mutex<StudentStreamState>>;

#[derive(Debug)]
enum Phase {
    Active,
    Ended(SessionSummary),
}

#[derive(Debug, Default)]
struct Roster {
    order: Vec<String>,
    streams: HashMap<String, SharedStream>,
}

#[derive(Debug)]
struct SessionEntry {
    session_id: String,
    teacher_id: String,
    subject: String,
    start_time: DateTime<Utc>,
    phase: RwLock<Phase>,
    roster: RwLock<Roster>,
    total_observations: AtomicU64,
    alerts_generated: AtomicU64,
}

impl SessionEntry {
    fn snapshot(&self, end_time: Option<DateTime<Utc>>) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            teacher_id: self.teacher_id.clone(),
            subject: self.subject.clone(),
            start_time: self.start_time,
            end_time,
            student_ids: read(&self.roster).order.clone(),
            total_observations: self.total_observations.load(Ordering::Relaxed),
            alerts_generated: self.alerts_generated.load(Ordering::Relaxed),
        }
    }

    fn ended_error(&self) -> EngineError {
        EngineError::SessionEnded {
            session_id: self.session_id.clone(),
        }
    }

    fn stream(&self, student_id: &str) -> Result<SharedStream, EngineError> {
        read(&self.roster)
            .streams
            .get(student_id)
            .cloned()
            .ok_or_else(|| EngineError::StudentNotFound {
                session_id: self.session_id.clone(),
                student_id: student_id.to_string(),
            })
    }

    /// Streams in registration order.
    fn streams(&self) -> Vec<(String, SharedStream)> {
        let roster = read(&self.roster);
        roster
            .order
            .iter()
            .filter_map(|id| roster.streams.get(id).map(|s| (id.clone(), Arc::clone(s))))
            .collect()
    }

    fn history(&self) -> SessionHistory {
        SessionHistory {
            session_id: self.session_id.clone(),
            students: self
                .streams()
                .into_iter()
                .map(|(id, stream)| {
                    let history = lock(&stream).history().to_vec();
                    (id, history)
                })
                .collect(),
        }
    }
}

/// Owns all sessions, their student streams and the shared alert history.
pub struct SessionRegistry {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
    alerts: AlertLog,
    sink: Option<Arc<dyn AlertSink>>,
    stats: SharedEngineStats,
}

impl SessionRegistry {
    /// Create a registry using wall-clock time and no alert sink.
    pub fn new(config: Config) -> Self {
        let alerts = AlertLog::new(config.alert_history_capacity);
        Self {
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            sessions: RwLock::new(HashMap::new()),
            alerts,
            sink: None,
            stats: create_shared_stats(),
        }
    }

    /// Use a different time source for cooldowns and session timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publish every emitted alert to `sink`.
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Time source used for cooldowns and session timestamps.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Start a new session. Fails if the id is already in use.
    pub fn create_session(
        &self,
        session_id: &str,
        teacher_id: &str,
        subject: &str,
    ) -> Result<SessionSnapshot, EngineError> {
        let mut sessions = write(&self.sessions);
        if sessions.contains_key(session_id) {
            return Err(EngineError::SessionExists {
                session_id: session_id.to_string(),
            });
        }

        let entry = Arc::new(SessionEntry {
            session_id: session_id.to_string(),
            teacher_id: teacher_id.to_string(),
            subject: subject.to_string(),
            start_time: self.clock.now(),
            phase: RwLock::new(Phase::Active),
            roster: RwLock::new(Roster::default()),
            total_observations: AtomicU64::new(0),
            alerts_generated: AtomicU64::new(0),
        });
        sessions.insert(session_id.to_string(), Arc::clone(&entry));
        drop(sessions);

        self.stats.record_session_created();
        tracing::info!(session_id, teacher_id, subject, "Session created");
        Ok(entry.snapshot(None))
    }

    /// Register a student. Registering twice has no further effect.
    pub fn register_student(&self, session_id: &str, student_id: &str) -> Result<(), EngineError> {
        let entry = self.entry(session_id)?;
        let phase = read(&entry.phase);
        if matches!(*phase, Phase::Ended(_)) {
            return Err(entry.ended_error());
        }
        self.ensure_stream(&entry, student_id);
        Ok(())
    }

    /// Apply one observation to a student's stream.
    ///
    /// The student is registered on first use. No-face observations are
    /// counted but skip the trend, attention and alert stages.
    pub fn ingest(
        &self,
        session_id: &str,
        student_id: &str,
        observation: Observation,
    ) -> Result<FrameResult, EngineError> {
        observation.validate()?;

        let entry = self.entry(session_id)?;
        let phase = read(&entry.phase);
        if matches!(*phase, Phase::Ended(_)) {
            return Err(entry.ended_error());
        }

        let stream = self.ensure_stream(&entry, student_id);
        let update = lock(&stream).apply(&observation, self.clock.now());

        entry.total_observations.fetch_add(1, Ordering::Relaxed);
        self.stats.record_observation();
        if observation.is_no_face() {
            self.stats.record_no_face();
        }

        match &update.alert_outcome {
            AlertOutcome::Fired(alert) => {
                entry.alerts_generated.fetch_add(1, Ordering::Relaxed);
                self.emit(alert);
            }
            AlertOutcome::Suppressed(_) => self.stats.record_alert_suppressed(),
            AlertOutcome::Quiet => {}
        }

        tracing::debug!(
            session_id,
            student_id,
            status = ?update.result.status,
            engagement = update.result.engagement_score,
            "Observation ingested"
        );
        Ok(update.result)
    }

    /// End a session and compute its summary.
    ///
    /// The class average gives every registered student equal weight: it is
    /// the mean of per-student means, with students lacking usable samples
    /// counted as zero.
    pub fn end_session(&self, session_id: &str) -> Result<SessionSummary, EngineError> {
        let entry = self.entry(session_id)?;
        let mut phase = write(&entry.phase);
        if matches!(*phase, Phase::Ended(_)) {
            return Err(entry.ended_error());
        }

        let end_time = self.clock.now();
        let mut student_engagement = BTreeMap::new();
        let mut total = 0.0;
        let streams = entry.streams();
        for (student_id, stream) in &streams {
            if let Some(mean) = lock(stream).mean_engagement() {
                total += mean;
                student_engagement.insert(student_id.clone(), mean);
            }
        }
        let average_class_engagement = if streams.is_empty() {
            0.0
        } else {
            total / streams.len() as f64
        };

        let duration_ms = (end_time - entry.start_time).num_milliseconds().max(0);
        let summary = SessionSummary {
            session: entry.snapshot(Some(end_time)),
            average_class_engagement,
            duration_minutes: stats::round_to(duration_ms as f64 / 60_000.0, 2),
            student_engagement,
        };
        *phase = Phase::Ended(summary.clone());
        drop(phase);

        self.stats.record_session_ended();
        tracing::info!(
            session_id,
            average_class_engagement,
            students = streams.len(),
            "Session ended"
        );
        Ok(summary)
    }

    /// Remove an ended session and hand back everything it retained.
    pub fn release_session(&self, session_id: &str) -> Result<SessionArchive, EngineError> {
        let mut sessions = write(&self.sessions);
        let entry = sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::session_not_found(session_id))?;

        let summary = match &*read(&entry.phase) {
            Phase::Ended(summary) => summary.clone(),
            Phase::Active => {
                return Err(EngineError::SessionActive {
                    session_id: session_id.to_string(),
                })
            }
        };
        sessions.remove(session_id);
        drop(sessions);

        tracing::info!(session_id, "Session released");
        Ok(SessionArchive {
            summary,
            history: entry.history(),
        })
    }

    /// Current view of a session.
    pub fn session(&self, session_id: &str) -> Result<SessionSnapshot, EngineError> {
        let entry = self.entry(session_id)?;
        let end_time = match &*read(&entry.phase) {
            Phase::Ended(summary) => summary.session.end_time,
            Phase::Active => None,
        };
        Ok(entry.snapshot(end_time))
    }

    /// The summary of an ended session.
    pub fn session_summary(&self, session_id: &str) -> Result<Option<SessionSummary>, EngineError> {
        let entry = self.entry(session_id)?;
        let summary = match &*read(&entry.phase) {
            Phase::Ended(summary) => Some(summary.clone()),
            Phase::Active => None,
        };
        Ok(summary)
    }

    /// Ids of every retained session, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read(&self.sessions).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// A student's usable observations in arrival order.
    pub fn student_history(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<Vec<EnrichedObservation>, EngineError> {
        let stream = self.entry(session_id)?.stream(student_id)?;
        let history = lock(&stream).history().to_vec();
        Ok(history)
    }

    /// Every registered student's history.
    pub fn session_history(&self, session_id: &str) -> Result<SessionHistory, EngineError> {
        Ok(self.entry(session_id)?.history())
    }

    /// Statistics and current prediction for one student.
    pub fn student_summary(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<StudentSummary, EngineError> {
        let stream = self.entry(session_id)?.stream(student_id)?;
        let state = lock(&stream);
        Ok(StudentSummary {
            student_id: student_id.to_string(),
            engagement_stats: state.engagement_stats(),
            attention_stats: state.attention_summary(),
            current_prediction: state.current_prediction(),
            observations: state.history().len(),
            no_face_frames: state.no_face_frames(),
        })
    }

    /// The newest `limit` alerts across all sessions, oldest first.
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        self.alerts.recent(limit)
    }

    /// Counts of retained alerts by kind and priority.
    pub fn alert_summary(&self) -> AlertSummary {
        self.alerts.summary()
    }

    /// Current engine counters.
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle to the live engine counters.
    pub fn shared_stats(&self) -> SharedEngineStats {
        Arc::clone(&self.stats)
    }

    fn entry(&self, session_id: &str) -> Result<Arc<SessionEntry>, EngineError> {
        read(&self.sessions)
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::session_not_found(session_id))
    }

    /// Get the student's stream, creating it exactly once.
    fn ensure_stream(&self, entry: &SessionEntry, student_id: &str) -> SharedStream {
        if let Some(stream) = read(&entry.roster).streams.get(student_id) {
            return Arc::clone(stream);
        }

        let mut roster = write(&entry.roster);
        if let Some(stream) = roster.streams.get(student_id) {
            return Arc::clone(stream);
        }

        let stream = Arc::new(Mutex::new(StudentStreamState::new(
            &entry.session_id,
            student_id,
            &self.config,
        )));
        roster.order.push(student_id.to_string());
        roster
            .streams
            .insert(student_id.to_string(), Arc::clone(&stream));
        tracing::debug!(session_id = %entry.session_id, student_id, "Student registered");
        stream
    }

    fn emit(&self, alert: &Alert) {
        self.stats.record_alert_emitted();
        self.alerts.push(alert.clone());
        if let Some(sink) = &self.sink {
            sink.publish(alert);
        }
        tracing::info!(
            student_id = %alert.student_id,
            kind = ?alert.kind,
            "{}",
            alert.message
        );
    }
}
