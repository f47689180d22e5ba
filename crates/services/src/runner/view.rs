use exam_core::model::AnswerLetter;

/// One labeled option of the displayed question.
///
/// Carries no pre-formatted strings beyond the A-D labels and no styling
/// assumptions; the front-end decides how a selected option is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub letter: AnswerLetter,
    pub text: String,
    pub selected: bool,
}

/// The displayed question with its four options in fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    /// 1-based question number for display.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<OptionView>,
    pub answered: bool,
}

/// Per-question marker for the indicator strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorView {
    pub index: usize,
    pub current: bool,
    pub answered: bool,
}
