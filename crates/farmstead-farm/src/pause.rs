//! Pause accounting.
//!
//! A plot stops growing while any triggered water or weed checkpoint is
//! unmet. Each checkpoint contributes one interval starting at its absolute
//! trigger (`planted_at + offset`) and ending at its completion, or at `now`
//! while still pending. The paused total is the measure of those intervals.

use farmstead_types::Plot;

use crate::rules::PauseModel;

/// Result of pause accounting for one plot at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseState {
    /// Total seconds the plot has spent paused.
    pub paused_seconds: u64,
    /// Start of the pause that is still open at `now`, if any.
    pub paused_since: Option<i64>,
}

/// Compute the pause state of `plot` at `now` under `model`.
pub fn pause_state(plot: &Plot, now: i64, model: PauseModel) -> PauseState {
    let Some(planted_at) = plot.planted_at else {
        return PauseState::default();
    };

    let mut closed = Vec::new();
    let mut open_starts = Vec::new();
    for checkpoint in plot.checkpoints() {
        let offset = i64::try_from(checkpoint.offset).unwrap_or(i64::MAX);
        let trigger = planted_at.saturating_add(offset);
        if now < trigger {
            continue;
        }
        if checkpoint.done {
            // Completed at or before its trigger: never paused.
            if let Some(done_at) = checkpoint.done_at.filter(|&at| at > trigger) {
                closed.push((trigger, done_at));
            }
        } else {
            open_starts.push(trigger);
        }
    }

    match model {
        PauseModel::IntervalMerge => {
            let mut intervals = closed;
            intervals.extend(open_starts.into_iter().map(|start| (start, now)));
            merged_state(intervals, now)
        }
        PauseModel::SingleWindow => {
            let completed = closed.iter().fold(0_u64, |sum, &(start, end)| {
                sum.saturating_add(span(start, end))
            });
            let paused_since = open_starts.into_iter().min();
            let open = paused_since.map_or(0, |start| span(start, now));
            PauseState {
                paused_seconds: completed.saturating_add(open),
                paused_since,
            }
        }
    }
}

/// Merge overlapping or touching intervals and measure them.
fn merged_state(mut intervals: Vec<(i64, i64)>, now: i64) -> PauseState {
    intervals.sort_unstable();

    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(current) if start <= current.1 => current.1 = current.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let paused_seconds = merged
        .iter()
        .fold(0_u64, |sum, &(start, end)| sum.saturating_add(span(start, end)));
    let paused_since = merged
        .iter()
        .find(|&&(_, end)| end == now)
        .map(|&(start, _)| start);

    PauseState {
        paused_seconds,
        paused_since,
    }
}

fn span(start: i64, end: i64) -> u64 {
    u64::try_from(end.saturating_sub(start)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_types::{Checkpoint, SeedId};

    fn planted(water: Vec<Checkpoint>, weeds: Vec<Checkpoint>) -> Plot {
        let mut plot = Plot::new(0, true);
        plot.seed = Some(SeedId(0));
        plot.planted_at = Some(0);
        plot.water = water;
        plot.weeds = weeds;
        plot
    }

    fn done(offset: u64, at: i64) -> Checkpoint {
        let mut cp = Checkpoint::pending(offset);
        cp.complete(at);
        cp
    }

    #[test]
    fn nothing_triggered_means_no_pause() {
        let plot = planted(vec![Checkpoint::pending(50)], vec![]);
        let state = pause_state(&plot, 40, PauseModel::IntervalMerge);
        assert_eq!(state, PauseState::default());
    }

    #[test]
    fn pending_checkpoint_is_open_until_now() {
        let plot = planted(vec![Checkpoint::pending(50)], vec![]);
        let state = pause_state(&plot, 60, PauseModel::IntervalMerge);
        assert_eq!(state.paused_seconds, 10);
        assert_eq!(state.paused_since, Some(50));
    }

    #[test]
    fn completed_checkpoint_closes_interval() {
        let plot = planted(vec![done(50, 61)], vec![]);
        let state = pause_state(&plot, 70, PauseModel::IntervalMerge);
        assert_eq!(state.paused_seconds, 11);
        assert_eq!(state.paused_since, None);
    }

    #[test]
    fn overlapping_pauses_are_counted_once() {
        // Water due at 50, weed due at 55, both met at 70.
        let plot = planted(vec![done(50, 70)], vec![done(55, 70)]);
        let merged = pause_state(&plot, 100, PauseModel::IntervalMerge);
        assert_eq!(merged.paused_seconds, 20);

        let summed = pause_state(&plot, 100, PauseModel::SingleWindow);
        assert_eq!(summed.paused_seconds, 35);
    }

    #[test]
    fn touching_intervals_merge() {
        let plot = planted(vec![done(10, 20)], vec![done(20, 30)]);
        let state = pause_state(&plot, 40, PauseModel::IntervalMerge);
        assert_eq!(state.paused_seconds, 20);
    }

    #[test]
    fn early_completion_adds_nothing() {
        let plot = planted(vec![done(50, 45)], vec![]);
        let state = pause_state(&plot, 70, PauseModel::IntervalMerge);
        assert_eq!(state.paused_seconds, 0);
    }

    #[test]
    fn single_window_uses_earliest_pending_trigger() {
        let plot = planted(
            vec![Checkpoint::pending(30)],
            vec![Checkpoint::pending(40)],
        );
        let state = pause_state(&plot, 50, PauseModel::SingleWindow);
        assert_eq!(state.paused_seconds, 20);
        assert_eq!(state.paused_since, Some(30));
    }

    #[test]
    fn unplanted_plot_has_no_pause() {
        let plot = Plot::new(1, true);
        assert_eq!(
            pause_state(&plot, 1_000, PauseModel::IntervalMerge),
            PauseState::default()
        );
    }
}
