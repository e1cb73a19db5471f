//! Append-only record of a closed-loop run

use std::time::Duration;

use crate::common::{Control, PredictedTrajectory, Reference, State};

/// Diagnostics of the optimization behind one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub converged: bool,
    pub iterations: usize,
    pub cost: f64,
    pub duration: Duration,
}

/// One recorded tick. Tick 0 is the seed and carries no solve report.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub tick: usize,
    /// Applied state after this tick
    pub state: State,
    /// Control applied to reach `state`
    pub control: Control,
    /// Reference tracked while planning this tick
    pub reference: Reference,
    pub prediction: PredictedTrajectory,
    pub solve: Option<SolveReport>,
}

impl HistoryEntry {
    pub fn seed(state: State, reference: Reference) -> Self {
        HistoryEntry {
            tick: 0,
            state,
            control: Control::zero(),
            reference,
            prediction: PredictedTrajectory::new(vec![state]),
            solve: None,
        }
    }

    pub fn converged(&self) -> bool {
        self.solve.map_or(true, |s| s.converged)
    }
}

/// Seed entry followed by one entry per completed tick
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new(seed: HistoryEntry) -> Self {
        History { entries: vec![seed] }
    }

    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        debug_assert_eq!(entry.tick, self.entries.len());
        self.entries.push(entry);
    }

    /// Completed ticks plus the seed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ticks_completed(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    pub fn seed(&self) -> &HistoryEntry {
        &self.entries[0]
    }

    pub fn last(&self) -> &HistoryEntry {
        &self.entries[self.entries.len() - 1]
    }

    pub fn states(&self) -> Vec<State> {
        self.entries.iter().map(|e| e.state).collect()
    }

    pub fn controls(&self) -> Vec<Control> {
        self.entries.iter().map(|e| e.control).collect()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.state.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.state.y).collect()
    }

    /// Ticks that applied a best-found, unconverged solution
    pub fn non_converged_ticks(&self) -> Vec<usize> {
        self.entries.iter().filter(|e| !e.converged()).map(|e| e.tick).collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tick: usize, converged: bool) -> HistoryEntry {
        let state = State::new(tick as f64, 0.0, 0.0, 1.0);
        HistoryEntry {
            tick,
            state,
            control: Control::new(1.0, 0.0),
            reference: Reference::origin(),
            prediction: PredictedTrajectory::new(vec![state]),
            solve: Some(SolveReport {
                converged,
                iterations: 3,
                cost: 1.0,
                duration: Duration::from_millis(1),
            }),
        }
    }

    #[test]
    fn test_seed_entry() {
        let history = History::new(HistoryEntry::seed(State::origin(), Reference::origin()));
        assert_eq!(history.len(), 1);
        assert_eq!(history.ticks_completed(), 0);
        assert_eq!(history.seed().control, Control::zero());
        assert_eq!(history.seed().prediction.states, vec![State::origin()]);
        assert!(history.seed().solve.is_none());
    }

    #[test]
    fn test_push_and_query() {
        let mut history = History::new(HistoryEntry::seed(State::origin(), Reference::origin()));
        history.push(entry(1, true));
        history.push(entry(2, false));
        history.push(entry(3, true));
        assert_eq!(history.len(), 4);
        assert_eq!(history.ticks_completed(), 3);
        assert_eq!(history.x_coords(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(history.non_converged_ticks(), vec![2]);
        assert_eq!(history.last().tick, 3);
        assert_eq!((&history).into_iter().count(), 4);
    }
}
