use serde::Serialize;

use crate::answers::AnswerState;

/// Display category of a question in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum PaletteStatus {
    #[strum(serialize = "answered")]
    Answered,
    #[strum(serialize = "marked")]
    Marked,
    #[strum(serialize = "answered-marked")]
    AnsweredMarked,
    #[strum(serialize = "current")]
    Current,
    #[strum(serialize = "not-visited")]
    NotVisited,
}

/// Answer and mark flags win over the cursor; `Current` only applies to a
/// blank question under the cursor.
pub fn status_of(state: &AnswerState, is_current: bool) -> PaletteStatus {
    match (state.is_answered, state.is_marked) {
        (true, true) => PaletteStatus::AnsweredMarked,
        (true, false) => PaletteStatus::Answered,
        (false, true) => PaletteStatus::Marked,
        (false, false) if is_current => PaletteStatus::Current,
        (false, false) => PaletteStatus::NotVisited,
    }
}

/// Tally of palette statuses, used for the legend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaletteCounts {
    pub answered: usize,
    pub marked: usize,
    pub answered_marked: usize,
    pub current: usize,
    pub not_visited: usize,
}

impl PaletteCounts {
    pub fn from_statuses<I: IntoIterator<Item = PaletteStatus>>(statuses: I) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, s| {
            match s {
                PaletteStatus::Answered => counts.answered += 1,
                PaletteStatus::Marked => counts.marked += 1,
                PaletteStatus::AnsweredMarked => counts.answered_marked += 1,
                PaletteStatus::Current => counts.current += 1,
                PaletteStatus::NotVisited => counts.not_visited += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.answered + self.marked + self.answered_marked + self.current + self.not_visited
    }
}
