use crate::model::AnswerLetter;

/// Positional record of the user's answers, one slot per question index.
///
/// Slots start unset and hold letters once the user picks an option. The
/// sheet knows nothing about option text; translation happens against the
/// cached question for the same index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: Vec<Option<AnswerLetter>>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new(total_questions: usize) -> Self {
        Self {
            slots: vec![None; total_questions],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<AnswerLetter> {
        self.slots.get(index).copied().flatten()
    }

    /// Record a letter for `index`. Out-of-range indices are ignored and
    /// reported as `false`.
    pub fn set(&mut self, index: usize, letter: AnswerLetter) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(letter);
                true
            }
            None => false,
        }
    }

    /// Reset a slot to unset.
    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Submit-readiness: true exactly when every slot is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(Option::is_some)
    }

    /// Iterate `(index, letter)` over the answered slots.
    pub fn answered(&self) -> impl Iterator<Item = (usize, AnswerLetter)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|letter| (index, letter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let sheet = AnswerSheet::new(3);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.answered_count(), 0);
        assert!(!sheet.is_complete());
        assert_eq!(sheet.get(0), None);
    }

    #[test]
    fn completeness_toggles_with_every_slot() {
        let mut sheet = AnswerSheet::new(2);
        assert!(sheet.set(0, AnswerLetter::A));
        assert!(!sheet.is_complete());
        assert!(sheet.set(1, AnswerLetter::C));
        assert!(sheet.is_complete());

        sheet.clear(0);
        assert!(!sheet.is_complete());
        assert_eq!(sheet.answered_count(), 1);
    }

    #[test]
    fn out_of_range_set_is_rejected() {
        let mut sheet = AnswerSheet::new(1);
        assert!(!sheet.set(5, AnswerLetter::B));
        assert_eq!(sheet.answered_count(), 0);
    }

    #[test]
    fn answered_iterates_in_index_order() {
        let mut sheet = AnswerSheet::new(3);
        sheet.set(2, AnswerLetter::D);
        sheet.set(0, AnswerLetter::B);
        let answered: Vec<_> = sheet.answered().collect();
        assert_eq!(answered, vec![(0, AnswerLetter::B), (2, AnswerLetter::D)]);
    }

    #[test]
    fn empty_sheet_is_never_complete() {
        let sheet = AnswerSheet::new(0);
        assert!(!sheet.is_complete());
    }
}
