use serde::Serialize;

/// Lifecycle flags and timestamps of one breeding pair, as unix seconds.
/// The backend maps its database rows into this to make transition
/// decisions; keeping the decisions here keeps them testable without a
/// database.
#[derive(Debug, Clone, Copy)]
pub struct PairState {
    pub is_born: bool,
    pub is_weaned: bool,
    pub is_completed: bool,
    pub created_at: i64,
    pub birth_date: i64,
    pub wean_date: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingConception,
    Born,
    Weaned,
    Completed,
}

pub fn phase(state: &PairState) -> Phase {
    if state.is_completed {
        Phase::Completed
    } else if state.is_weaned {
        Phase::Weaned
    } else if state.is_born {
        Phase::Born
    } else {
        Phase::AwaitingConception
    }
}

/// Birth fires on time passage; the guard on `is_born` keeps a duplicate
/// trigger (UI poll racing the scheduled pass) a no-op.
pub fn due_for_birth(state: &PairState, now: i64) -> bool {
    !state.is_born && !state.is_completed && now >= state.birth_date
}

/// Weaning fires only after birth and only once.
pub fn due_for_wean(state: &PairState, now: i64) -> bool {
    state.is_born
        && !state.is_weaned
        && !state.is_completed
        && state.wean_date.map_or(false, |wean| now >= wean)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectBlocker {
    NotBorn,
    NotWeaned,
    NoBabies,
    AlreadyCompleted,
}

/// Collection preconditions, ownership aside (the query scopes by owner).
/// Weaning counts if either the flag is set or the wean date has passed,
/// so a pair the reconciliation pass has not caught up with yet is still
/// collectable.
pub fn collect_blocker(state: &PairState, now: i64, baby_count: i64) -> Option<CollectBlocker> {
    if state.is_completed {
        return Some(CollectBlocker::AlreadyCompleted);
    }
    if !state.is_born {
        return Some(CollectBlocker::NotBorn);
    }
    let weaned = state.is_weaned || state.wean_date.map_or(false, |wean| now >= wean);
    if !weaned {
        return Some(CollectBlocker::NotWeaned);
    }
    if baby_count == 0 {
        return Some(CollectBlocker::NoBabies);
    }
    None
}

/// Display-only progress projection: 0-50% from creation to birth,
/// 50-100% from birth to wean, pinned at 100 once weaned or completed.
pub fn progress_percent(state: &PairState, now: i64) -> i32 {
    if state.is_weaned || state.is_completed {
        return 100;
    }
    if !state.is_born {
        return linear_fraction(state.created_at, state.birth_date, now, 0, 50);
    }
    match state.wean_date {
        Some(wean) => linear_fraction(state.birth_date, wean, now, 50, 100),
        None => 50,
    }
}

fn linear_fraction(start: i64, end: i64, now: i64, from: i32, to: i32) -> i32 {
    if now <= start {
        return from;
    }
    if now >= end || end <= start {
        return to;
    }
    let span = (end - start) as f64;
    let elapsed = (now - start) as f64;
    let fraction = elapsed / span;
    from + ((to - from) as f64 * fraction).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    fn fresh_pair() -> PairState {
        PairState {
            is_born: false,
            is_weaned: false,
            is_completed: false,
            created_at: 0,
            birth_date: 3 * DAY,
            wean_date: None,
        }
    }

    fn born_pair() -> PairState {
        PairState {
            is_born: true,
            is_weaned: false,
            is_completed: false,
            created_at: 0,
            birth_date: 3 * DAY,
            wean_date: Some(17 * DAY),
        }
    }

    #[test]
    fn test_phase_progression() {
        let mut state = fresh_pair();
        assert_eq!(phase(&state), Phase::AwaitingConception);
        state.is_born = true;
        assert_eq!(phase(&state), Phase::Born);
        state.is_weaned = true;
        assert_eq!(phase(&state), Phase::Weaned);
        state.is_completed = true;
        assert_eq!(phase(&state), Phase::Completed);
    }

    #[test]
    fn test_birth_fires_on_due_date() {
        let state = fresh_pair();
        assert!(!due_for_birth(&state, 3 * DAY - 1));
        assert!(due_for_birth(&state, 3 * DAY));
        assert!(due_for_birth(&state, 10 * DAY));
    }

    #[test]
    fn test_birth_is_idempotent() {
        let mut state = fresh_pair();
        state.is_born = true;
        assert!(!due_for_birth(&state, 10 * DAY));
    }

    #[test]
    fn test_wean_fires_only_after_birth() {
        let state = fresh_pair();
        assert!(!due_for_wean(&state, 100 * DAY));

        let state = born_pair();
        assert!(!due_for_wean(&state, 17 * DAY - 1));
        assert!(due_for_wean(&state, 17 * DAY));
    }

    #[test]
    fn test_wean_is_idempotent() {
        let mut state = born_pair();
        state.is_weaned = true;
        // Second firing must be a no-op decision.
        assert!(!due_for_wean(&state, 20 * DAY));
    }

    #[test]
    fn test_collect_blocked_before_wean_date() {
        let state = born_pair();
        assert_eq!(
            collect_blocker(&state, 10 * DAY, 3),
            Some(CollectBlocker::NotWeaned)
        );
    }

    #[test]
    fn test_collect_allowed_by_flag_or_time() {
        let mut state = born_pair();
        state.is_weaned = true;
        assert_eq!(collect_blocker(&state, 5 * DAY, 3), None);

        let state = born_pair();
        assert_eq!(collect_blocker(&state, 17 * DAY, 3), None);
    }

    #[test]
    fn test_collect_blocked_without_babies() {
        let mut state = born_pair();
        state.is_weaned = true;
        assert_eq!(
            collect_blocker(&state, 20 * DAY, 0),
            Some(CollectBlocker::NoBabies)
        );
    }

    #[test]
    fn test_collect_blocked_when_unborn_or_completed() {
        let state = fresh_pair();
        assert_eq!(
            collect_blocker(&state, 20 * DAY, 3),
            Some(CollectBlocker::NotBorn)
        );

        let mut state = born_pair();
        state.is_weaned = true;
        state.is_completed = true;
        assert_eq!(
            collect_blocker(&state, 20 * DAY, 3),
            Some(CollectBlocker::AlreadyCompleted)
        );
    }

    #[test]
    fn test_progress_during_conception() {
        let state = fresh_pair();
        assert_eq!(progress_percent(&state, 0), 0);
        assert_eq!(progress_percent(&state, 3 * DAY / 2), 25);
        assert_eq!(progress_percent(&state, 3 * DAY), 50);
    }

    #[test]
    fn test_progress_during_weaning() {
        let state = born_pair();
        assert_eq!(progress_percent(&state, 3 * DAY), 50);
        assert_eq!(progress_percent(&state, 10 * DAY), 75);
        assert_eq!(progress_percent(&state, 17 * DAY), 100);
    }

    #[test]
    fn test_progress_pinned_after_wean() {
        let mut state = born_pair();
        state.is_weaned = true;
        assert_eq!(progress_percent(&state, 4 * DAY), 100);
        state.is_completed = true;
        assert_eq!(progress_percent(&state, 4 * DAY), 100);
    }
}
