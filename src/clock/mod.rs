//! Clock domain: the single source of "now" for the engine.
//!
//! Responsible for:
//! - Anchoring session time to the wall clock at startup and on resume
//! - Advancing `SessionClock::now` from bevy's monotonic real time
//! - Turning suspend / resume requests into `GameState` transitions
//! - Suspend accounting for values that count down while the app is away

use bevy::prelude::*;
use chrono::{Duration, Utc};

use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// `now` follows bevy's real time from the session anchor.
    Wall,
    /// `now` only moves when set explicitly.
    Manual,
}

/// Session time. Every engine comparison reads [`SessionClock::now`].
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    game_start: Timestamp,
    now: Timestamp,
    source: ClockSource,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::wall(Utc::now(), std::time::Duration::ZERO)
    }
}

impl SessionClock {
    /// Anchor so that `game_start + elapsed == wall_now`.
    pub fn wall(wall_now: Timestamp, elapsed: std::time::Duration) -> Self {
        Self {
            game_start: wall_now - to_chrono(elapsed),
            now: wall_now,
            source: ClockSource::Wall,
        }
    }

    pub fn manual(now: Timestamp) -> Self {
        Self {
            game_start: now,
            now,
            source: ClockSource::Manual,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn game_start(&self) -> Timestamp {
        self.game_start
    }

    pub fn source(&self) -> ClockSource {
        self.source
    }

    /// Follow monotonic time. Ignored in manual mode.
    pub fn sync(&mut self, elapsed: std::time::Duration) {
        if self.source == ClockSource::Wall {
            self.now = self.game_start + to_chrono(elapsed);
        }
    }

    /// Re-anchor after a suspend so wall time spent away is counted.
    pub fn reanchor(&mut self, wall_now: Timestamp, elapsed: std::time::Duration) {
        if self.source == ClockSource::Wall {
            *self = Self::wall(wall_now, elapsed);
        }
    }

    pub fn set(&mut self, now: Timestamp) {
        self.now = now;
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

fn to_chrono(elapsed: std::time::Duration) -> Duration {
    Duration::from_std(elapsed).unwrap_or_else(|_| Duration::zero())
}

/// Seconds left of a countdown stored as `stored_secs` at `paused_at`.
///
/// Time spent away is subtracted and the result floors at zero. A clock that
/// went backwards counts as no time away.
pub fn remaining_after_suspend(stored_secs: i64, paused_at: Timestamp, now: Timestamp) -> i64 {
    let away = (now - paused_at).num_seconds().max(0);
    stored_secs.saturating_sub(away).max(0)
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SessionClock>()
            .add_event::<SuspendRequestEvent>()
            .add_event::<ResumeRequestEvent>()
            .add_systems(
                PreUpdate,
                tick_session_clock.run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                handle_suspend_request.run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                handle_resume_request.run_if(in_state(GameState::Suspended)),
            )
            .add_systems(OnEnter(GameState::Suspended), log_suspend)
            .add_systems(OnExit(GameState::Suspended), resume_clock);
    }
}

fn tick_session_clock(time: Res<Time<Real>>, mut clock: ResMut<SessionClock>) {
    clock.sync(time.elapsed());
}

fn handle_suspend_request(
    mut requests: EventReader<SuspendRequestEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if requests.read().count() > 0 {
        next_state.set(GameState::Suspended);
    }
}

fn handle_resume_request(
    mut requests: EventReader<ResumeRequestEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if requests.read().count() > 0 {
        next_state.set(GameState::Playing);
    }
}

fn log_suspend(clock: Res<SessionClock>) {
    info!("[Clock] Suspended at {}", clock.now());
}

fn resume_clock(time: Res<Time<Real>>, mut clock: ResMut<SessionClock>) {
    clock.reanchor(Utc::now(), time.elapsed());
    info!("[Clock] Resumed at {}", clock.now());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_remaining_after_suspend_subtracts_time_away() {
        assert_eq!(remaining_after_suspend(3_600, t(0), t(600)), 3_000);
        assert_eq!(remaining_after_suspend(3_600, t(0), t(3_600)), 0);
    }

    #[test]
    fn test_remaining_after_suspend_clamps_at_zero() {
        assert_eq!(remaining_after_suspend(60, t(0), t(86_400)), 0);
        assert_eq!(remaining_after_suspend(0, t(0), t(1)), 0);
        assert_eq!(remaining_after_suspend(-5, t(0), t(0)), 0);
    }

    #[test]
    fn test_backwards_clock_counts_as_no_time_away() {
        assert_eq!(remaining_after_suspend(500, t(1_000), t(0)), 500);
    }

    #[test]
    fn test_wall_clock_follows_monotonic_elapsed() {
        let mut clock = SessionClock::wall(t(100), std::time::Duration::from_secs(40));
        assert_eq!(clock.game_start(), t(60));
        clock.sync(std::time::Duration::from_secs(100));
        assert_eq!(clock.now(), t(160));

        clock.reanchor(t(1_000), std::time::Duration::from_secs(120));
        assert_eq!(clock.game_start(), t(880));
        assert_eq!(clock.now(), t(1_000));
    }

    #[test]
    fn test_manual_clock_ignores_real_time() {
        let mut clock = SessionClock::manual(t(0));
        clock.sync(std::time::Duration::from_secs(999));
        clock.reanchor(t(5_000), std::time::Duration::from_secs(1));
        assert_eq!(clock.now(), t(0));
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), t(300));
        clock.set(t(10));
        assert_eq!(clock.now(), t(10));
        assert_eq!(clock.source(), ClockSource::Manual);
    }
}
