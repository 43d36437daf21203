use crate::config::EvolutionSection;
use crate::core::EvolveError;

/// 进化循环参数
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub initial_idea_count: usize,
    pub max_combinations_per_cycle: usize,
    pub selection_divisor: usize,
    pub oracle_concurrency: usize,
    /// None 表示不设周期上限，直到被取消
    pub max_cycles: Option<usize>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        EvolutionSection::default().into()
    }
}

impl From<EvolutionSection> for EvolutionConfig {
    fn from(section: EvolutionSection) -> Self {
        Self {
            initial_idea_count: section.initial_idea_count,
            max_combinations_per_cycle: section.max_combinations_per_cycle,
            selection_divisor: section.selection_divisor,
            oracle_concurrency: section.oracle_concurrency,
            max_cycles: section.max_cycles,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), EvolveError> {
        if self.initial_idea_count == 0 {
            return Err(EvolveError::Config("initial_idea_count must be at least 1".into()));
        }
        if self.selection_divisor == 0 {
            return Err(EvolveError::Config("selection_divisor must be at least 1".into()));
        }
        if self.oracle_concurrency == 0 {
            return Err(EvolveError::Config("oracle_concurrency must be at least 1".into()));
        }
        if self.max_combinations_per_cycle == 0 {
            tracing::warn!("max_combinations_per_cycle is 0; cycles will never combine ideas");
        }
        Ok(())
    }
}

/// 周期计数与预算
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    max_cycles: Option<usize>,
    cycle_count: usize,
}

impl EvolutionEngine {
    pub fn new(max_cycles: Option<usize>) -> Self {
        Self {
            max_cycles,
            cycle_count: 0,
        }
    }

    pub fn can_continue(&self) -> bool {
        self.max_cycles.map_or(true, |max| self.cycle_count < max)
    }

    pub fn increment_cycle(&mut self) {
        self.cycle_count += 1;
    }

    pub fn current_cycle(&self) -> usize {
        self.cycle_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget() {
        let mut engine = EvolutionEngine::new(Some(2));
        assert!(engine.can_continue());
        engine.increment_cycle();
        engine.increment_cycle();
        assert!(!engine.can_continue());
        assert_eq!(engine.current_cycle(), 2);

        let mut unbounded = EvolutionEngine::new(None);
        for _ in 0..1000 {
            unbounded.increment_cycle();
        }
        assert!(unbounded.can_continue());
    }

    #[test]
    fn test_validate() {
        assert!(EvolutionConfig::default().validate().is_ok());
        let bad = EvolutionConfig {
            initial_idea_count: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = EvolutionConfig {
            oracle_concurrency: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
