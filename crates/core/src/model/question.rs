use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("expected {OPTION_COUNT} options, got {got}")]
    WrongOptionCount { got: usize },

    #[error("answer text does not match any option: {text}")]
    UnknownAnswerText { text: String },
}

/// Positional answer label. `A` is the first option, `D` the last.
///
/// A letter is only meaningful relative to the option list of the question
/// it was recorded against; translation back to option text goes through
/// [`Question::option_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; OPTION_COUNT] =
        [AnswerLetter::A, AnswerLetter::B, AnswerLetter::C, AnswerLetter::D];

    /// Letter for the option at `position`, if in range.
    #[must_use]
    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL.get(position).copied()
    }

    /// Zero-based position of this letter within an option list.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }

    /// Parse a single-letter label, case-insensitively.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "a" | "A" => Some(AnswerLetter::A),
            "b" | "B" => Some(AnswerLetter::B),
            "c" | "C" => Some(AnswerLetter::C),
            "d" | "D" => Some(AnswerLetter::D),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerLetter::A => write!(f, "A"),
            AnswerLetter::B => write!(f, "B"),
            AnswerLetter::C => write!(f, "C"),
            AnswerLetter::D => write!(f, "D"),
        }
    }
}

/// A single multiple-choice question as returned by the exam service.
///
/// Options keep the service's order; letters map positionally onto it.
/// The struct is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_answer: Option<String>,
}

impl Question {
    /// Build a question, enforcing the four-option shape.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::WrongOptionCount` unless exactly four options
    /// are provided.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: Option<String>,
    ) -> Result<Self, QuestionError> {
        if options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount { got: options.len() });
        }
        Ok(Self {
            text: text.into(),
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_answer.as_deref()
    }

    /// The exact option text a letter stands for on this question.
    #[must_use]
    pub fn option_text(&self, letter: AnswerLetter) -> &str {
        // Positions are bounded by OPTION_COUNT, which `new` enforces.
        &self.options[letter.position()]
    }

    /// Reverse translation: find the letter whose option text matches.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::UnknownAnswerText` when the text is not one of
    /// this question's options.
    pub fn letter_of(&self, text: &str) -> Result<AnswerLetter, QuestionError> {
        self.options
            .iter()
            .position(|option| option == text)
            .and_then(AnswerLetter::from_position)
            .ok_or_else(|| QuestionError::UnknownAnswerText {
                text: text.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question::new(
            "What is 2 + 2?",
            vec!["3".into(), "4".into(), "5".into(), "22".into()],
            Some("4".into()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_wrong_option_count() {
        let err = Question::new("Q", vec!["only".into()], None).unwrap_err();
        assert_eq!(err, QuestionError::WrongOptionCount { got: 1 });
    }

    #[test]
    fn letters_map_positionally() {
        for (position, letter) in AnswerLetter::ALL.iter().enumerate() {
            assert_eq!(letter.position(), position);
            assert_eq!(AnswerLetter::from_position(position), Some(*letter));
        }
        assert_eq!(AnswerLetter::from_position(4), None);
    }

    #[test]
    fn letter_round_trips_through_option_text() {
        let question = sample();
        for letter in AnswerLetter::ALL {
            let text = question.option_text(letter).to_owned();
            assert_eq!(question.letter_of(&text).unwrap(), letter);
        }
    }

    #[test]
    fn unknown_answer_text_is_an_error() {
        let question = sample();
        let err = question.letter_of("42").unwrap_err();
        assert!(matches!(err, QuestionError::UnknownAnswerText { .. }));
    }

    #[test]
    fn parse_accepts_both_cases() {
        assert_eq!(AnswerLetter::parse("a"), Some(AnswerLetter::A));
        assert_eq!(AnswerLetter::parse(" D "), Some(AnswerLetter::D));
        assert_eq!(AnswerLetter::parse("e"), None);
        assert_eq!(AnswerLetter::parse("ab"), None);
    }
}
