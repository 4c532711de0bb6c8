use serde::{Deserialize, Serialize};

use crate::session::{Change, Rejection};

/// How sure the candidate is about an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    Sure,
    Unsure,
    Guess,
}

impl Confidence {
    /// Next level when cycling with a single key; `None` wraps to `Sure`.
    pub fn cycle(current: Option<Confidence>) -> Confidence {
        match current {
            None | Some(Confidence::Guess) => Confidence::Sure,
            Some(Confidence::Sure) => Confidence::Unsure,
            Some(Confidence::Unsure) => Confidence::Guess,
        }
    }
}

/// Per-question record. `is_answered` always mirrors `selected_option`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerState {
    pub selected_option: Option<usize>,
    pub is_answered: bool,
    pub is_marked: bool,
    pub time_spent_seconds: u64,
    pub confidence: Option<Confidence>,
}

/// Mutable answer records for every question of a session.
#[derive(Debug, Clone)]
pub struct AnswerStore {
    states: Vec<AnswerState>,
    option_counts: Vec<usize>,
}

impl AnswerStore {
    /// One unanswered, unmarked record per entry of `option_counts`.
    pub fn new(option_counts: Vec<usize>) -> Self {
        Self {
            states: vec![AnswerState::default(); option_counts.len()],
            option_counts,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, question: usize) -> Option<&AnswerState> {
        self.states.get(question)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnswerState> {
        self.states.iter()
    }

    /// Owned copy handed to the UI and persistence.
    pub fn snapshot(&self) -> Vec<AnswerState> {
        self.states.clone()
    }

    pub fn select_option(&mut self, question: usize, option: usize) -> Result<Change, Rejection> {
        let options = *self.option_counts.get(question).ok_or(Rejection::OutOfRange)?;
        if option >= options {
            return Err(Rejection::OutOfRange);
        }

        let state = &mut self.states[question];
        if state.selected_option == Some(option) {
            return Ok(Change::Unchanged);
        }
        state.selected_option = Some(option);
        state.is_answered = true;
        state.confidence = None;
        Ok(Change::Applied)
    }

    pub fn clear_response(&mut self, question: usize) -> Result<Change, Rejection> {
        let state = self.states.get_mut(question).ok_or(Rejection::OutOfRange)?;
        if state.selected_option.is_none() {
            return Err(Rejection::NoOp);
        }
        state.selected_option = None;
        state.is_answered = false;
        state.confidence = None;
        Ok(Change::Applied)
    }

    pub fn toggle_mark(&mut self, question: usize) -> Result<Change, Rejection> {
        let state = self.states.get_mut(question).ok_or(Rejection::OutOfRange)?;
        state.is_marked = !state.is_marked;
        Ok(Change::Applied)
    }

    /// Confidence only attaches to an answer; unanswered questions reject it.
    pub fn set_confidence(
        &mut self,
        question: usize,
        confidence: Confidence,
    ) -> Result<Change, Rejection> {
        let state = self.states.get_mut(question).ok_or(Rejection::OutOfRange)?;
        if !state.is_answered {
            return Err(Rejection::NoOp);
        }
        if state.confidence == Some(confidence) {
            return Ok(Change::Unchanged);
        }
        state.confidence = Some(confidence);
        Ok(Change::Applied)
    }

    pub fn accumulate_time(&mut self, question: usize, seconds: u64) {
        if let Some(state) = self.states.get_mut(question) {
            state.time_spent_seconds += seconds;
        }
    }

    pub fn answered_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_answered).count()
    }

    pub fn marked_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_marked).count()
    }

    pub fn total_time_spent(&self) -> u64 {
        self.states.iter().map(|s| s.time_spent_seconds).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(n: usize) -> AnswerStore {
        AnswerStore::new(vec![4; n])
    }

    fn assert_answered_invariant(store: &AnswerStore) {
        for s in store.iter() {
            assert_eq!(s.is_answered, s.selected_option.is_some());
        }
    }

    #[test]
    fn new_store_is_blank() {
        let store = store(3);
        assert_eq!(store.len(), 3);
        assert!(store.iter().all(|s| *s == AnswerState::default()));
        assert_answered_invariant(&store);
    }

    #[test]
    fn select_sets_answer_and_clears_confidence_on_change() {
        let mut store = store(2);
        assert_eq!(store.select_option(0, 1), Ok(Change::Applied));
        store.set_confidence(0, Confidence::Sure).unwrap();

        assert_eq!(store.select_option(0, 1), Ok(Change::Unchanged));
        assert_eq!(store.get(0).unwrap().confidence, Some(Confidence::Sure));

        assert_eq!(store.select_option(0, 3), Ok(Change::Applied));
        let state = store.get(0).unwrap();
        assert_eq!(state.selected_option, Some(3));
        assert_eq!(state.confidence, None);
        assert_answered_invariant(&store);
    }

    #[test]
    fn select_out_of_range_changes_nothing() {
        let mut store = store(2);
        assert_eq!(store.select_option(0, 4), Err(Rejection::OutOfRange));
        assert_eq!(store.select_option(5, 0), Err(Rejection::OutOfRange));
        assert!(store.iter().all(|s| *s == AnswerState::default()));
    }

    #[test]
    fn clear_response_on_unanswered_is_noop() {
        let mut store = store(1);
        assert_eq!(store.clear_response(0), Err(Rejection::NoOp));
        assert_eq!(*store.get(0).unwrap(), AnswerState::default());
    }

    #[test]
    fn clear_response_resets_answer_and_confidence() {
        let mut store = store(1);
        store.select_option(0, 2).unwrap();
        store.set_confidence(0, Confidence::Guess).unwrap();

        assert_eq!(store.clear_response(0), Ok(Change::Applied));
        let state = store.get(0).unwrap();
        assert!(!state.is_answered);
        assert_eq!(state.selected_option, None);
        assert_eq!(state.confidence, None);
    }

    #[test]
    fn mark_is_independent_of_answer_and_confidence() {
        let mut store = store(1);
        store.select_option(0, 0).unwrap();
        store.set_confidence(0, Confidence::Unsure).unwrap();

        store.toggle_mark(0).unwrap();
        let state = store.get(0).unwrap();
        assert!(state.is_marked && state.is_answered);
        assert_eq!(state.confidence, Some(Confidence::Unsure));

        store.toggle_mark(0).unwrap();
        assert!(!store.get(0).unwrap().is_marked);
        assert_eq!(store.get(0).unwrap().confidence, Some(Confidence::Unsure));
    }

    #[test]
    fn confidence_requires_an_answer() {
        let mut store = store(1);
        assert_eq!(store.set_confidence(0, Confidence::Sure), Err(Rejection::NoOp));
    }

    #[test]
    fn confidence_cycles_through_levels() {
        assert_eq!(Confidence::cycle(None), Confidence::Sure);
        assert_eq!(Confidence::cycle(Some(Confidence::Sure)), Confidence::Unsure);
        assert_eq!(Confidence::cycle(Some(Confidence::Unsure)), Confidence::Guess);
        assert_eq!(Confidence::cycle(Some(Confidence::Guess)), Confidence::Sure);
    }

    #[test]
    fn counts_and_time_totals() {
        let mut store = store(4);
        store.select_option(0, 0).unwrap();
        store.select_option(2, 1).unwrap();
        store.toggle_mark(1).unwrap();
        store.accumulate_time(0, 12);
        store.accumulate_time(1, 8);
        store.accumulate_time(9, 100);

        assert_eq!(store.answered_count(), 2);
        assert_eq!(store.marked_count(), 1);
        assert_eq!(store.total_time_spent(), 20);
    }
}
