// src/session/registry.rs

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{answer::AnswerPayload, exam::Exam},
    session::{ExamSession, SessionView, SubmissionOutcome, SubmitKind, timer::Ticker},
};

/// Reply to a session event: either the live view or, once the attempt is
/// over, its outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionReply {
    Live(SessionView),
    Finished(SubmissionOutcome),
}

/// A running attempt and the clock driving it.
/// Dropping the entry stops the clock.
struct LiveSession {
    session: ExamSession,
    _ticker: Ticker,
}

/// How long a submitted outcome stays retrievable.
const FINISHED_RETENTION: TimeDelta = TimeDelta::hours(24);

#[derive(Default)]
struct Sessions {
    live: HashMap<Uuid, LiveSession>,
    finished: HashMap<Uuid, SubmissionOutcome>,
}

impl Sessions {
    /// Moves a live session to `finished`, stopping its clock.
    /// Also forgets outcomes older than `FINISHED_RETENTION`.
    fn finish(&mut self, outcome: SubmissionOutcome) {
        self.prune_finished(outcome.submitted_at);
        self.live.remove(&outcome.session_id);
        self.finished.insert(outcome.session_id, outcome);
    }

    fn prune_finished(&mut self, now: DateTime<Utc>) {
        let cutoff = now - FINISHED_RETENTION;
        let before = self.finished.len();
        self.finished.retain(|_, outcome| outcome.submitted_at > cutoff);
        let dropped = before - self.finished.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Expired submitted outcomes");
        }
    }
}

/// Owns every attempt on this server.
///
/// All access goes through one mutex, held only for synchronous work, so
/// clock ticks and student requests for the same session never interleave
/// halfway. Whichever of "clock ran out" and "student pressed submit"
/// takes the lock first grades the attempt; the other sees the stored
/// outcome.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Mutex<Sessions>>,
    tick_period: Duration,
}

impl SessionRegistry {
    pub fn new(tick_period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Sessions::default())),
            tick_period,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // Session state stays consistent across a panicking holder: every
        // mutation is a single assignment or map operation.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts an attempt and its clock.
    pub fn start(&self, exam: Arc<Exam>, student_id: &str) -> SessionView {
        let session = ExamSession::start(exam, student_id);
        let id = session.id();
        let view = session.view();

        // Held across the spawn so the first tick cannot run before the entry exists.
        let mut sessions = self.lock();
        let weak = Arc::downgrade(&self.inner);
        let ticker = Ticker::spawn(self.tick_period, move || tick(&weak, id));

        sessions.live.insert(
            id,
            LiveSession {
                session,
                _ticker: ticker,
            },
        );
        drop(sessions);

        tracing::info!(session = %id, exam = %view.exam_id, student = %student_id, "Exam session started");
        view
    }

    pub fn view(&self, id: Uuid, student_id: &str) -> Result<SessionReply, AppError> {
        self.with_session(id, student_id, |session| Ok(session.view()))
    }

    pub fn set_answer(
        &self,
        id: Uuid,
        student_id: &str,
        question_id: &str,
        payload: AnswerPayload,
    ) -> Result<SessionReply, AppError> {
        self.with_session(id, student_id, |session| {
            session.set_answer(question_id, payload)?;
            Ok(session.view())
        })
    }

    pub fn go_to(&self, id: Uuid, student_id: &str, index: usize) -> Result<SessionReply, AppError> {
        self.with_session(id, student_id, |session| {
            session.go_to(index);
            Ok(session.view())
        })
    }

    /// Manual submit. Returns the single outcome of the attempt, whether
    /// this call produced it or the clock got there first.
    pub fn submit(&self, id: Uuid, student_id: &str) -> Result<SubmissionOutcome, AppError> {
        let mut sessions = self.lock();

        if let Some(live) = sessions.live.get_mut(&id) {
            ensure_owner(live.session.student_id(), student_id)?;
            if let Some(outcome) = live.session.submit(SubmitKind::Manual) {
                sessions.finish(outcome.clone());
                return Ok(outcome);
            }
        }

        sessions
            .finished
            .get(&id)
            .filter(|o| o.student_id == student_id)
            .cloned()
            .ok_or_else(session_not_found)
    }

    /// The outcome of a submitted attempt.
    pub fn result(&self, id: Uuid, student_id: &str) -> Result<SubmissionOutcome, AppError> {
        let sessions = self.lock();

        if let Some(outcome) = sessions.finished.get(&id).filter(|o| o.student_id == student_id) {
            return Ok(outcome.clone());
        }
        match sessions.live.get(&id) {
            Some(live) if live.session.student_id() == student_id => Err(AppError::Conflict(
                "Exam is still in progress".to_string(),
            )),
            _ => Err(session_not_found()),
        }
    }

    /// Abandons a live attempt without grading it and stops its clock.
    /// Disposing of an already submitted attempt does nothing.
    pub fn dispose(&self, id: Uuid, student_id: &str) -> Result<(), AppError> {
        let mut sessions = self.lock();

        if let Some(live) = sessions.live.get(&id) {
            ensure_owner(live.session.student_id(), student_id)?;
            sessions.live.remove(&id);
            tracing::info!(session = %id, "Exam session disposed");
            return Ok(());
        }

        match sessions.finished.get(&id) {
            Some(outcome) if outcome.student_id == student_id => Ok(()),
            _ => Err(session_not_found()),
        }
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn with_session<F>(&self, id: Uuid, student_id: &str, f: F) -> Result<SessionReply, AppError>
    where
        F: FnOnce(&mut ExamSession) -> Result<SessionView, AppError>,
    {
        let mut sessions = self.lock();

        if let Some(live) = sessions.live.get_mut(&id) {
            ensure_owner(live.session.student_id(), student_id)?;
            return f(&mut live.session).map(SessionReply::Live);
        }

        // Events arriving after submission are no-ops.
        match sessions.finished.get(&id) {
            Some(outcome) if outcome.student_id == student_id => {
                Ok(SessionReply::Finished(outcome.clone()))
            }
            _ => Err(session_not_found()),
        }
    }
}

/// One clock tick for session `id`.
fn tick(registry: &Weak<Mutex<Sessions>>, id: Uuid) -> ControlFlow<()> {
    let Some(inner) = registry.upgrade() else {
        return ControlFlow::Break(());
    };
    let mut sessions = inner.lock().unwrap_or_else(PoisonError::into_inner);

    let Some(live) = sessions.live.get_mut(&id) else {
        return ControlFlow::Break(());
    };

    let outcome = live.session.tick();
    let in_progress = live.session.is_in_progress();

    match outcome {
        Some(outcome) => {
            sessions.finish(outcome);
            ControlFlow::Break(())
        }
        None if in_progress => ControlFlow::Continue(()),
        None => ControlFlow::Break(()),
    }
}

fn ensure_owner(owner: &str, student_id: &str) -> Result<(), AppError> {
    if owner == student_id {
        Ok(())
    } else {
        Err(session_not_found())
    }
}

fn session_not_found() -> AppError {
    AppError::NotFound("Exam session not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionType};

    fn exam(duration_minutes: u32) -> Arc<Exam> {
        Arc::new(
            Exam::new(
                "science-01",
                "Science quiz",
                "Science",
                duration_minutes,
                vec![
                    Question {
                        id: "q1".into(),
                        text: "Pick B".into(),
                        question_type: QuestionType::SingleChoice,
                        options: vec!["A".into(), "B".into(), "C".into()],
                        correct_answers: vec!["B".into()],
                    },
                    Question {
                        id: "q2".into(),
                        text: "Formula of water".into(),
                        question_type: QuestionType::ShortAnswer,
                        options: vec![],
                        correct_answers: vec!["H2O".into()],
                    },
                ],
            )
            .unwrap(),
        )
    }

    async fn advance(secs: u64) {
        for _ in 0..secs {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clock_auto_submits_when_time_runs_out() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");
        registry
            .set_answer(view.session_id, "s1", "q1", AnswerPayload::new(["B"]))
            .unwrap();

        advance(30).await;
        match registry.view(view.session_id, "s1").unwrap() {
            SessionReply::Live(v) => assert_eq!(v.remaining_seconds, 30),
            other => panic!("expected live session, got {other:?}"),
        }

        advance(30).await;
        let outcome = registry.result(view.session_id, "s1").unwrap();
        assert_eq!(outcome.kind, SubmitKind::Auto);
        assert_eq!(outcome.score, "50.00");
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_clock_and_later_submits_are_noops() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");

        let first = registry.submit(view.session_id, "s1").unwrap();
        assert_eq!(first.kind, SubmitKind::Manual);
        assert_eq!(registry.live_count(), 0);

        advance(120).await;
        let second = registry.submit(view.session_id, "s1").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.result(view.session_id, "s1").unwrap().kind, SubmitKind::Manual);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_after_auto_returns_auto_outcome() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");

        advance(60).await;
        let outcome = registry.submit(view.session_id, "s1").unwrap();
        assert_eq!(outcome.kind, SubmitKind::Auto);
    }

    #[tokio::test(start_paused = true)]
    async fn events_after_submit_are_ignored() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");
        registry.submit(view.session_id, "s1").unwrap();

        let reply = registry
            .set_answer(view.session_id, "s1", "q1", AnswerPayload::new(["B"]))
            .unwrap();
        match reply {
            SessionReply::Finished(outcome) => assert_eq!(outcome.report.correct_count, 0),
            other => panic!("expected finished reply, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_the_clock() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");

        registry.dispose(view.session_id, "s1").unwrap();
        assert_eq!(registry.live_count(), 0);

        advance(90).await;
        assert!(matches!(
            registry.result(view.session_id, "s1"),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn other_students_cannot_see_a_session() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");

        assert!(matches!(
            registry.view(view.session_id, "s2"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            registry.submit(view.session_id, "s2"),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn result_of_live_session_is_a_conflict() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let view = registry.start(exam(1), "s1");
        assert!(matches!(
            registry.result(view.session_id, "s1"),
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn old_outcomes_expire_when_another_session_finishes() {
        let registry = SessionRegistry::new(Duration::from_secs(1));
        let old = registry.start(exam(1), "s1");
        registry.submit(old.session_id, "s1").unwrap();

        // Backdate the stored outcome past the retention window.
        {
            let mut sessions = registry.lock();
            let outcome = sessions.finished.get_mut(&old.session_id).unwrap();
            outcome.submitted_at -= FINISHED_RETENTION + TimeDelta::minutes(1);
        }

        let recent = registry.start(exam(1), "s1");
        registry.submit(recent.session_id, "s1").unwrap();

        assert!(matches!(
            registry.result(old.session_id, "s1"),
            Err(AppError::NotFound(_))
        ));
        assert!(registry.result(recent.session_id, "s1").is_ok());
    }
}
