use exam_core::model::Question;

/// Per-index cache of fetched questions.
///
/// An answer letter is only meaningful relative to the option list cached at
/// the same index, so entries are write-once: re-inserting an index keeps
/// the original entry and cannot disturb anything recorded against it.
#[derive(Debug, Clone)]
pub struct QuestionCache {
    entries: Vec<Option<Question>>,
}

impl QuestionCache {
    #[must_use]
    pub fn new(total_questions: usize) -> Self {
        Self {
            entries: vec![None; total_questions],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_cached(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Insert a question at `index`. Idempotent: the first entry wins, so a
    /// re-fetch of an already-cached index is a no-op. Returns whether the
    /// entry was stored.
    pub fn insert(&mut self, index: usize, question: Question) -> bool {
        match self.entries.get_mut(index) {
            Some(slot @ None) => {
                *slot = Some(question);
                true
            }
            _ => false,
        }
    }

    /// Indices with no cached question yet, in order.
    #[must_use]
    pub fn missing(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.is_none().then_some(index))
            .collect()
    }

    #[must_use]
    pub fn is_fully_cached(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(tag: &str) -> Question {
        Question::new(
            format!("{tag}?"),
            vec![
                format!("{tag}-a"),
                format!("{tag}-b"),
                format!("{tag}-c"),
                format!("{tag}-d"),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn insert_is_write_once() {
        let mut cache = QuestionCache::new(2);
        assert!(cache.insert(0, question("first")));
        // Second insert at the same index is ignored.
        assert!(!cache.insert(0, question("second")));
        assert_eq!(cache.get(0).unwrap().text(), "first?");
    }

    #[test]
    fn out_of_range_insert_is_ignored() {
        let mut cache = QuestionCache::new(1);
        assert!(!cache.insert(3, question("q")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_tracks_uncached_indices() {
        let mut cache = QuestionCache::new(3);
        assert_eq!(cache.missing(), vec![0, 1, 2]);
        cache.insert(1, question("q"));
        assert_eq!(cache.missing(), vec![0, 2]);
        assert!(!cache.is_fully_cached());

        cache.insert(0, question("q"));
        cache.insert(2, question("q"));
        assert!(cache.is_fully_cached());
    }
}
