//! Template-family strategy: rewrite the path through the family profile

use super::traits::{
    ExtractionContext, ExtractionMatch, ExtractionStrategy, SettingTarget, StrategyKind,
};
use crate::resolution::resolve;
use psc_catalog::config::compile_time::extraction::TEMPLATE_PATH_CONFIDENCE;

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePathStrategy;

impl TemplatePathStrategy {
    /// Only applies when policy and requirement name the same family
    fn families_match(ctx: &ExtractionContext<'_>, target: &SettingTarget<'_>) -> bool {
        match (
            ctx.policy.template_family.as_deref(),
            target.requirement.template_family.as_deref(),
        ) {
            (Some(policy_family), Some(requirement_family)) => {
                policy_family.eq_ignore_ascii_case(requirement_family)
            }
            _ => false,
        }
    }
}

impl ExtractionStrategy for TemplatePathStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TemplatePath
    }

    fn confidence(&self) -> f64 {
        TEMPLATE_PATH_CONFIDENCE
    }

    fn attempt(
        &self,
        ctx: &ExtractionContext<'_>,
        target: &SettingTarget<'_>,
    ) -> Option<ExtractionMatch> {
        if !Self::families_match(ctx, target) {
            return None;
        }
        let profile = ctx.profile?;

        profile
            .candidate_paths(target.path)
            .into_iter()
            .find_map(|candidate| {
                let value = resolve(ctx.document, &candidate)?;
                let path = candidate.render();
                Some(ExtractionMatch {
                    value,
                    rationale: format!(
                        "'{}' rewritten to '{}' by template family '{}'",
                        target.path, path, profile.family
                    ),
                    path,
                    strategy: self.kind(),
                    confidence: self.confidence(),
                })
            })
    }
}
