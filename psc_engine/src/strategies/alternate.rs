//! Alternate-name strategy: retry the base strategies with catalog synonyms

use super::array_scan::ArrayScanStrategy;
use super::direct::DirectPathStrategy;
use super::template::TemplatePathStrategy;
use super::traits::{
    ExtractionContext, ExtractionMatch, ExtractionStrategy, SettingTarget, StrategyKind,
};
use psc_catalog::config::compile_time::extraction::ALTERNATE_NAME_CONFIDENCE_CAP;
use psc_catalog::path::PathExpr;

pub struct AlternateNameStrategy {
    inner: Vec<Box<dyn ExtractionStrategy>>,
}

impl AlternateNameStrategy {
    /// Retry direct path, template path and array scan, in that order
    pub fn new() -> Self {
        Self::with_inner(vec![
            Box::new(DirectPathStrategy),
            Box::new(TemplatePathStrategy),
            Box::new(ArrayScanStrategy),
        ])
    }

    pub fn with_inner(inner: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { inner }
    }

    fn retry(
        &self,
        ctx: &ExtractionContext<'_>,
        target: &SettingTarget<'_>,
        label: &str,
    ) -> Option<ExtractionMatch> {
        self.inner.iter().find_map(|strategy| {
            let found = strategy.attempt(ctx, target)?;
            Some(ExtractionMatch {
                confidence: found.confidence.min(self.confidence()),
                rationale: format!("{} (via {}): {}", label, found.strategy, found.rationale),
                strategy: self.kind(),
                ..found
            })
        })
    }
}

impl Default for AlternateNameStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlternateNameStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlternateNameStrategy")
            .field(
                "inner",
                &self.inner.iter().map(|s| s.kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ExtractionStrategy for AlternateNameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AlternateName
    }

    fn confidence(&self) -> f64 {
        ALTERNATE_NAME_CONFIDENCE_CAP
    }

    fn attempt(
        &self,
        ctx: &ExtractionContext<'_>,
        target: &SettingTarget<'_>,
    ) -> Option<ExtractionMatch> {
        let requirement = target.requirement;

        for path in &requirement.alternate_paths {
            let alternate = SettingTarget {
                path,
                name: path.setting_key().unwrap_or(target.name),
                requirement,
            };
            let label = format!("alternate path '{}'", path);
            if let Some(found) = self.retry(ctx, &alternate, &label) {
                return Some(found);
            }
        }

        for name in &requirement.alternate_names {
            let path = PathExpr::parse(name).unwrap_or_else(|_| PathExpr::key(name.as_str()));
            let alternate = SettingTarget {
                path: &path,
                name,
                requirement,
            };
            let label = format!("alternate name '{}'", name);
            if let Some(found) = self.retry(ctx, &alternate, &label) {
                return Some(found);
            }
        }

        None
    }
}
