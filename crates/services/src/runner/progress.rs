/// Aggregated view of runner progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerProgress {
    /// 1-based number of the displayed question.
    pub current: usize,
    pub total: usize,
    pub answered: usize,
    pub submit_ready: bool,
}

impl RunnerProgress {
    /// Fraction of the test reached, in [0, 1].
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}
