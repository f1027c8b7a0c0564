//! Control registry: many-to-many mapping between controls and requirements

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Control as written in a catalog document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub requirement_ids: Vec<String>,
}

/// A compliance control with the requirements that evidence it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub title: Option<String>,
    pub family: Option<String>,
    pub requirement_ids: BTreeSet<String>,
}

impl Control {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            family: None,
            requirement_ids: BTreeSet::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// All controls known to a catalog, keyed by control id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRegistry {
    controls: BTreeMap<String, Control>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or merge a declared control
    pub fn declare(&mut self, spec: &ControlSpec) {
        let control = self
            .controls
            .entry(spec.id.clone())
            .or_insert_with(|| Control::new(spec.id.clone()));
        if spec.title.is_some() {
            control.title = spec.title.clone();
        }
        if spec.family.is_some() {
            control.family = spec.family.clone();
        }
        control
            .requirement_ids
            .extend(spec.requirement_ids.iter().cloned());
    }

    /// Record that `requirement_id` evidences `control_id`, creating the control if needed
    pub fn link(&mut self, control_id: &str, requirement_id: &str) {
        self.controls
            .entry(control_id.to_string())
            .or_insert_with(|| Control::new(control_id))
            .requirement_ids
            .insert(requirement_id.to_string());
    }

    /// Drop links to requirements not in `known`; returns the removed (control, requirement) pairs
    pub fn retain_requirements(&mut self, known: &BTreeSet<String>) -> Vec<(String, String)> {
        let mut removed = Vec::new();
        for control in self.controls.values_mut() {
            let stale: Vec<String> = control
                .requirement_ids
                .iter()
                .filter(|id| !known.contains(*id))
                .cloned()
                .collect();
            for id in stale {
                control.requirement_ids.remove(&id);
                removed.push((control.id.clone(), id));
            }
        }
        removed
    }

    pub fn get(&self, control_id: &str) -> Option<&Control> {
        self.controls.get(control_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.values()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Controls evidenced by a requirement, in id order
    pub fn controls_for_requirement(&self, requirement_id: &str) -> Vec<&Control> {
        self.controls
            .values()
            .filter(|c| c.requirement_ids.contains(requirement_id))
            .collect()
    }
}
