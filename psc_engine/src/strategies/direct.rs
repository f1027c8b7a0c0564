//! Direct path strategy: the authored path, verbatim

use super::traits::{
    ExtractionContext, ExtractionMatch, ExtractionStrategy, SettingTarget, StrategyKind,
};
use crate::resolution::resolve;
use psc_catalog::config::compile_time::extraction::DIRECT_PATH_CONFIDENCE;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPathStrategy;

impl ExtractionStrategy for DirectPathStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectPath
    }

    fn confidence(&self) -> f64 {
        DIRECT_PATH_CONFIDENCE
    }

    fn attempt(
        &self,
        ctx: &ExtractionContext<'_>,
        target: &SettingTarget<'_>,
    ) -> Option<ExtractionMatch> {
        let value = resolve(ctx.document, target.path)?;
        let path = target.path.render();
        Some(ExtractionMatch {
            value,
            rationale: format!("resolved '{}' directly", path),
            path,
            strategy: self.kind(),
            confidence: self.confidence(),
        })
    }
}
