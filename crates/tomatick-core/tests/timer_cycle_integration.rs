//! End-to-end timer cycle tests through the runtime.
//!
//! These drive the engine the way the CLI does, through `TimerRuntime`,
//! and check what lands in storage over whole work/break cycles.

use tomatick_core::{
    Database, NullSink, RunState, TimerEngine, TimerPhase, TimerRuntime, TimerSettings,
};

fn settings() -> TimerSettings {
    TimerSettings {
        work_minutes: 1,
        short_break_minutes: 1,
        long_break_minutes: 2,
        sessions_until_long_break: 4,
        ..TimerSettings::default()
    }
}

fn runtime() -> TimerRuntime {
    TimerRuntime::new(
        TimerEngine::new(settings()),
        Database::open_memory().unwrap(),
        Box::new(NullSink),
        None,
    )
}

fn run_out_phase(rt: &mut TimerRuntime) {
    rt.start().unwrap();
    for _ in 0..rt.engine().total_seconds() {
        rt.tick().unwrap();
    }
}

#[test]
fn four_work_cycles_earn_a_long_break_and_four_log_entries() {
    let mut rt = runtime();

    for cycle in 1..=3 {
        run_out_phase(&mut rt); // work
        assert_eq!(rt.engine().phase(), TimerPhase::ShortBreak);
        assert_eq!(rt.engine().completed_work_cycles(), cycle);
        run_out_phase(&mut rt); // break
        assert_eq!(rt.engine().phase(), TimerPhase::Work);
    }

    run_out_phase(&mut rt); // fourth work phase
    assert_eq!(rt.engine().phase(), TimerPhase::LongBreak);
    assert_eq!(rt.engine().run_state(), RunState::Idle);
    assert_eq!(rt.engine().total_seconds(), 120);
    assert_eq!(rt.engine().completed_work_cycles(), 4);

    let sessions = rt.db().list_sessions(None).unwrap();
    assert_eq!(sessions.len(), 4);
    assert!(sessions.iter().all(|s| s.minutes == 1));
}

#[test]
fn breaks_never_add_log_entries() {
    let mut rt = runtime();
    run_out_phase(&mut rt); // work
    run_out_phase(&mut rt); // short break
    assert_eq!(rt.db().count_sessions().unwrap(), 1);
}

#[test]
fn settings_edit_mid_phase_lands_at_the_next_boundary() {
    let mut rt = runtime();
    rt.start().unwrap();
    for _ in 0..10 {
        rt.tick().unwrap();
    }

    let mut edited = settings();
    edited.short_break_minutes = 3;
    rt.update_settings(edited).unwrap();

    // Current phase keeps its original duration.
    assert_eq!(rt.engine().total_seconds(), 60);

    for _ in 0..50 {
        rt.tick().unwrap();
    }

    // The break entered at the boundary uses the edited duration.
    assert_eq!(rt.engine().phase(), TimerPhase::ShortBreak);
    assert_eq!(rt.engine().total_seconds(), 180);
}

#[test]
fn manual_finish_mid_work_logs_elapsed_minutes() {
    let mut rt = runtime();
    // Extend the work phase so a minute can elapse without finishing it.
    let mut long_work = settings();
    long_work.work_minutes = 5;
    rt.update_settings(long_work).unwrap();

    rt.start().unwrap();
    for _ in 0..90 {
        rt.tick().unwrap();
    }
    rt.finish(true).unwrap();

    let sessions = rt.db().list_sessions(None).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].minutes, 1);
    // Manual finish overrides auto-start; the break waits.
    assert!(rt.engine().phase().is_break());
    assert_eq!(rt.engine().run_state(), RunState::Idle);
}

#[test]
fn switching_modes_counts_nothing() {
    let mut rt = runtime();
    rt.switch_mode(TimerPhase::LongBreak, false).unwrap();
    assert_eq!(rt.engine().phase(), TimerPhase::LongBreak);
    rt.switch_mode(TimerPhase::Work, true).unwrap();
    assert_eq!(rt.engine().run_state(), RunState::Running);
    assert_eq!(rt.engine().completed_work_cycles(), 0);
    assert_eq!(rt.db().count_sessions().unwrap(), 0);
}
