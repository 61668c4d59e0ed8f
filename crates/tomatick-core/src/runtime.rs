//! Application runtime: engine plus its collaborators.
//!
//! The engine itself is pure state; `TimerRuntime` owns the explicit
//! dependencies (database, notification sink, optional remote mirror) and
//! applies engine events to them. One logical timer per process; events are
//! applied synchronously and in order, and the remote push is spawned only
//! after the local write has succeeded.

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::history::FocusSession;
use crate::notify::NotificationSink;
use crate::storage::Database;
use crate::sync::RemoteStore;
use crate::timer::{TimerEngine, TimerPhase, TimerSettings, TimerSnapshot};
use uuid::Uuid;

pub struct TimerRuntime {
    engine: TimerEngine,
    db: Database,
    notifier: Box<dyn NotificationSink>,
    remote: Option<RemoteStore>,
}

impl TimerRuntime {
    pub fn new(
        engine: TimerEngine,
        db: Database,
        notifier: Box<dyn NotificationSink>,
        remote: Option<RemoteStore>,
    ) -> Self {
        Self {
            engine,
            db,
            notifier,
            remote,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    // ── Commands (engine + side effects) ─────────────────────────────

    pub fn start(&mut self) -> Result<Vec<Event>> {
        let events: Vec<Event> = self.engine.start().into_iter().collect();
        self.apply(&events)?;
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>> {
        let events: Vec<Event> = self.engine.pause().into_iter().collect();
        self.apply(&events)?;
        Ok(events)
    }

    pub fn tick(&mut self) -> Result<Vec<Event>> {
        let events = self.engine.tick();
        self.apply(&events)?;
        Ok(events)
    }

    pub fn reset(&mut self) -> Result<Vec<Event>> {
        let events = vec![self.engine.reset()];
        self.apply(&events)?;
        Ok(events)
    }

    pub fn finish(&mut self, manual: bool) -> Result<Vec<Event>> {
        let events = self.engine.finish(manual);
        self.apply(&events)?;
        Ok(events)
    }

    pub fn switch_mode(&mut self, target: TimerPhase, start_immediately: bool) -> Result<Vec<Event>> {
        let events = vec![self.engine.switch_mode(target, start_immediately)];
        self.apply(&events)?;
        Ok(events)
    }

    /// Accept a validated settings edit and mirror it best-effort.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Result<Vec<Event>> {
        if let Some(remote) = &self.remote {
            if tokio::runtime::Handle::try_current().is_ok() {
                remote.push_settings_detached(settings.clone());
            } else {
                eprintln!("Warning: no async runtime; skipping remote mirror push");
            }
        }
        let events = vec![self.engine.update_settings(settings)];
        self.apply(&events)?;
        Ok(events)
    }

    // ── Event application ────────────────────────────────────────────

    fn apply(&mut self, events: &[Event]) -> Result<()> {
        for event in events {
            match event {
                Event::PhaseCompleted { .. } => {
                    self.notifier.notify(self.engine.settings().sound);
                }
                Event::SessionCompleted {
                    started_at,
                    ended_at,
                    minutes,
                } => {
                    let session = self.build_session(*started_at, *ended_at, *minutes)?;
                    self.record_session(session)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn build_session(
        &self,
        started_at: chrono::DateTime<chrono::Utc>,
        ended_at: chrono::DateTime<chrono::Utc>,
        minutes: u32,
    ) -> Result<FocusSession> {
        let active = self.db.active_task()?;
        let (category, linked_task_id) = match &active {
            Some(task) => (task.category_label(), Some(task.id)),
            None => ("General".to_string(), None),
        };
        Ok(FocusSession {
            id: Uuid::new_v4(),
            started_at,
            ended_at,
            minutes,
            category,
            linked_task_id,
        })
    }

    fn record_session(&mut self, session: FocusSession) -> Result<()> {
        self.db.append_session(&session).map_err(CoreError::Storage)?;
        if let Some(task_id) = session.linked_task_id {
            if let Err(e) = self.db.increment_task_progress(&task_id) {
                eprintln!("Warning: failed to update task progress: {e}");
            }
        }
        if let Some(remote) = &self.remote {
            if tokio::runtime::Handle::try_current().is_ok() {
                remote.push_session_detached(session);
            } else {
                eprintln!("Warning: no async runtime; skipping remote mirror push");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NullSink, SoundKind};
    use crate::task::Task;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct CountingSink(Arc<AtomicUsize>);

    impl NotificationSink for CountingSink {
        fn notify(&self, _sound: SoundKind) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn minute_settings() -> TimerSettings {
        TimerSettings {
            work_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 2,
            ..TimerSettings::default()
        }
    }

    fn runtime_with_sink(sink: CountingSink) -> TimerRuntime {
        TimerRuntime::new(
            TimerEngine::new(minute_settings()),
            Database::open_memory().unwrap(),
            Box::new(sink),
            None,
        )
    }

    fn run_out_work_phase(rt: &mut TimerRuntime) {
        rt.start().unwrap();
        for _ in 0..rt.engine().total_seconds() {
            rt.tick().unwrap();
        }
    }

    #[test]
    fn natural_completion_records_session_and_notifies_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut rt = runtime_with_sink(CountingSink(counter.clone()));

        run_out_work_phase(&mut rt);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let sessions = rt.db().list_sessions(None).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].minutes, 1);
        assert_eq!(sessions[0].category, "General");
        assert!(sessions[0].linked_task_id.is_none());
    }

    #[test]
    fn active_task_supplies_category_and_progress() {
        let mut rt = TimerRuntime::new(
            TimerEngine::new(minute_settings()),
            Database::open_memory().unwrap(),
            Box::new(NullSink),
            None,
        );
        let task = Task::new("Write docs", 2);
        rt.db().create_task(&task).unwrap();
        rt.db().set_active_task(Some(&task.id)).unwrap();

        run_out_work_phase(&mut rt);

        let sessions = rt.db().list_sessions(None).unwrap();
        assert_eq!(sessions[0].category, "Task: Write docs");
        assert_eq!(sessions[0].linked_task_id, Some(task.id));
        let task = rt.db().get_task(&task.id).unwrap().unwrap();
        assert_eq!(task.completed_pomodoros, 1);
    }

    #[test]
    fn short_manual_finish_logs_nothing_and_stays_silent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut rt = runtime_with_sink(CountingSink(counter.clone()));

        rt.start().unwrap();
        for _ in 0..30 {
            rt.tick().unwrap();
        }
        rt.finish(true).unwrap();

        assert_eq!(rt.db().count_sessions().unwrap(), 0);
        // Manual finish is not a natural boundary; no sound.
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(rt.engine().phase().is_break());
    }

    #[test]
    fn settings_update_without_runtime_still_applies_locally() {
        use crate::sync::{RemoteIdentity, RemoteStore};

        let identity = RemoteIdentity {
            base_url: "http://127.0.0.1:9".into(),
            user_id: "u1".into(),
            token: None,
        };
        let mut rt = TimerRuntime::new(
            TimerEngine::new(minute_settings()),
            Database::open_memory().unwrap(),
            Box::new(NullSink),
            Some(RemoteStore::new(identity)),
        );

        let mut edited = minute_settings();
        edited.work_minutes = 2;
        // No tokio runtime here; the mirror push is skipped with a warning
        // and the edit still lands in the engine.
        rt.update_settings(edited).unwrap();
        assert_eq!(rt.engine().settings().work_minutes, 2);
    }

    #[test]
    fn reset_never_logs() {
        let mut rt = runtime_with_sink(CountingSink(Arc::new(AtomicUsize::new(0))));
        rt.start().unwrap();
        for _ in 0..50 {
            rt.tick().unwrap();
        }
        rt.reset().unwrap();
        assert_eq!(rt.db().count_sessions().unwrap(), 0);
    }

    #[test]
    fn break_completion_records_no_session() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut rt = runtime_with_sink(CountingSink(counter.clone()));
        run_out_work_phase(&mut rt);
        assert!(rt.engine().phase().is_break());

        // Run the break out too: a second notification, no second session.
        run_out_work_phase(&mut rt);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(rt.db().count_sessions().unwrap(), 1);
    }
}
