//! Mutable strategy data

/// Flags flipped over the life of a strategy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyData {
    /// Set once the strategy is being wound down. Harvests then liquidate everything.
    pub emergency_exit: bool,
    /// Health check is consulted on the next harvest when set.
    /// Cleared by governance to let one harvest through, set again by that harvest.
    pub do_health_check: bool,
}

impl Default for StrategyData {
    fn default() -> Self {
        Self {
            emergency_exit: false,
            do_health_check: true,
        }
    }
}

impl StrategyData {
    /// Sets the emergency exit flag.
    pub fn emergency_exit(&mut self, emergency_exit: bool) -> &mut Self {
        self.emergency_exit = emergency_exit;
        self
    }

    /// Sets whether the next harvest is health checked.
    pub fn do_health_check(&mut self, do_health_check: bool) -> &mut Self {
        self.do_health_check = do_health_check;
        self
    }
}
