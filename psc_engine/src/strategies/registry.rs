//! Ordered strategy set: first strategy to find a value wins

use super::alternate::AlternateNameStrategy;
use super::array_scan::ArrayScanStrategy;
use super::direct::DirectPathStrategy;
use super::template::TemplatePathStrategy;
use super::traits::{
    ExtractionContext, ExtractionResult, ExtractionStrategy, SettingTarget, StrategyKind,
};
use psc_catalog::catalog::Requirement;

/// Strategies in priority order
pub struct StrategySet {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySetStatistics {
    pub total_strategies: usize,
    pub order: Vec<StrategyKind>,
    pub confidences: Vec<f64>,
}

impl StrategySet {
    /// Direct path, template path, array scan, alternate name
    pub fn standard() -> Self {
        StrategySetBuilder::new()
            .with_strategy(DirectPathStrategy)
            .with_strategy(TemplatePathStrategy)
            .with_strategy(ArrayScanStrategy)
            .with_strategy(AlternateNameStrategy::new())
            .build()
    }

    pub fn builder() -> StrategySetBuilder {
        StrategySetBuilder::new()
    }

    /// Run strategies in order against the requirement's primary target
    pub fn extract(
        &self,
        ctx: &ExtractionContext<'_>,
        requirement: &Requirement,
    ) -> ExtractionResult {
        let target = SettingTarget::primary(requirement);
        match self
            .strategies
            .iter()
            .find_map(|strategy| strategy.attempt(ctx, &target))
        {
            Some(found) => ExtractionResult::Found(found),
            None => ExtractionResult::not_found(format!(
                "'{}' not located by any strategy ({})",
                requirement.setting_path,
                self.kinds()
                    .iter()
                    .map(StrategyKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn get_statistics(&self) -> StrategySetStatistics {
        StrategySetStatistics {
            total_strategies: self.strategies.len(),
            order: self.kinds(),
            confidences: self.strategies.iter().map(|s| s.confidence()).collect(),
        }
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for StrategySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySet")
            .field("order", &self.kinds())
            .finish()
    }
}

/// Builder for custom strategy orderings
#[derive(Default)]
pub struct StrategySetBuilder {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategySetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy at the lowest priority so far
    pub fn with_strategy<S: ExtractionStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_boxed(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn build(self) -> StrategySet {
        StrategySet {
            strategies: self.strategies,
        }
    }
}
