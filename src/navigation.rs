use crate::answers::AnswerStore;
use crate::session::{Change, Rejection};

/// Question cursor plus the seconds spent on the current question since the
/// last move.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: usize,
    len: usize,
    pending_seconds: u64,
}

impl Navigator {
    pub fn new(len: usize) -> Self {
        Self {
            current: 0,
            len,
            pending_seconds: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn pending_seconds(&self) -> u64 {
        self.pending_seconds
    }

    /// Count one active, unpaused second against the question on screen.
    pub fn record_second(&mut self) {
        self.pending_seconds += 1;
    }

    /// Credit the pending interval to the current question and reset it.
    pub fn flush(&mut self, answers: &mut AnswerStore) {
        if self.pending_seconds > 0 {
            answers.accumulate_time(self.current, self.pending_seconds);
        }
        self.pending_seconds = 0;
    }

    /// Flush first, then move; the interval belongs to the question being left.
    pub fn go_to(&mut self, index: usize, answers: &mut AnswerStore) -> Result<Change, Rejection> {
        if index >= self.len {
            return Err(Rejection::OutOfRange);
        }
        if index == self.current {
            return Ok(Change::Unchanged);
        }
        self.flush(answers);
        self.current = index;
        Ok(Change::Applied)
    }

    pub fn next(&mut self, answers: &mut AnswerStore) -> Result<Change, Rejection> {
        self.go_to(self.current + 1, answers)
    }

    pub fn previous(&mut self, answers: &mut AnswerStore) -> Result<Change, Rejection> {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index, answers),
            None => Err(Rejection::OutOfRange),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(n: usize) -> (Navigator, AnswerStore) {
        (Navigator::new(n), AnswerStore::new(vec![4; n]))
    }

    fn tick(nav: &mut Navigator, secs: u64) {
        for _ in 0..secs {
            nav.record_second();
        }
    }

    #[test]
    fn time_goes_to_the_question_being_left() {
        let (mut nav, mut answers) = setup(3);

        tick(&mut nav, 12);
        nav.next(&mut answers).unwrap();
        tick(&mut nav, 8);
        nav.next(&mut answers).unwrap();
        nav.flush(&mut answers);

        assert_eq!(answers.get(0).unwrap().time_spent_seconds, 12);
        assert_eq!(answers.get(1).unwrap().time_spent_seconds, 8);
        assert_eq!(answers.get(2).unwrap().time_spent_seconds, 0);
        assert_eq!(nav.pending_seconds(), 0);
    }

    #[test]
    fn out_of_range_leaves_everything_alone() {
        let (mut nav, mut answers) = setup(2);
        tick(&mut nav, 5);

        assert_eq!(nav.go_to(2, &mut answers), Err(Rejection::OutOfRange));
        assert_eq!(nav.previous(&mut answers), Err(Rejection::OutOfRange));
        assert_eq!(nav.current(), 0);
        assert_eq!(nav.pending_seconds(), 5);
        assert_eq!(answers.total_time_spent(), 0);
    }

    #[test]
    fn next_and_previous_clamp_without_wrapping() {
        let (mut nav, mut answers) = setup(2);

        assert_eq!(nav.next(&mut answers), Ok(Change::Applied));
        assert_eq!(nav.next(&mut answers), Err(Rejection::OutOfRange));
        assert_eq!(nav.current(), 1);
        assert_eq!(nav.previous(&mut answers), Ok(Change::Applied));
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn jumping_to_current_keeps_pending_time() {
        let (mut nav, mut answers) = setup(3);
        tick(&mut nav, 4);

        assert_eq!(nav.go_to(0, &mut answers), Ok(Change::Unchanged));
        assert_eq!(nav.pending_seconds(), 4);

        nav.go_to(2, &mut answers).unwrap();
        assert_eq!(answers.get(0).unwrap().time_spent_seconds, 4);
        assert_eq!(nav.current(), 2);
    }
}
