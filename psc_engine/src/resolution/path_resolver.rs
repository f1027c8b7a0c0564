//! # Path Resolver
//!
//! Total function from (document, path) to a present value or absent.
//! Nulls, missing keys, out-of-range indexes and traversal into scalars all
//! resolve to `None`; nothing here can fail.

use crate::types::SettingValue;
use psc_catalog::path::{PathExpr, PathSegment};
use serde_json::Value;

/// Resolve `path` inside `document`
pub fn resolve(document: &Value, path: &PathExpr) -> Option<SettingValue> {
    resolve_segments(document, path.segments())
}

/// Resolve to the JSON node itself; `None` for paths containing a wildcard
pub fn resolve_node<'a>(document: &'a Value, path: &PathExpr) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.segments() {
        current = match segment {
            PathSegment::Key(key) => current.as_object()?.get(key)?,
            PathSegment::Index(index) => current.as_array()?.get(*index)?,
            PathSegment::Select { key, value } => current
                .as_array()?
                .iter()
                .find(|element| selector_matches(element, key, value))?,
            PathSegment::Wildcard => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn resolve_segments(current: &Value, segments: &[PathSegment]) -> Option<SettingValue> {
    let Some((segment, rest)) = segments.split_first() else {
        return SettingValue::from_json(current);
    };

    match segment {
        PathSegment::Key(key) => resolve_segments(current.as_object()?.get(key)?, rest),
        PathSegment::Index(index) => resolve_segments(current.as_array()?.get(*index)?, rest),
        PathSegment::Select { key, value } => {
            let element = current
                .as_array()?
                .iter()
                .find(|element| selector_matches(element, key, value))?;
            resolve_segments(element, rest)
        }
        PathSegment::Wildcard => {
            let collected: Vec<SettingValue> = current
                .as_array()?
                .iter()
                .filter_map(|element| resolve_segments(element, rest))
                .collect();
            if collected.is_empty() {
                None
            } else {
                Some(SettingValue::Collection(collected))
            }
        }
    }
}

/// Element's `key` field equals `literal` as canonical text, ignoring case
fn selector_matches(element: &Value, key: &str, literal: &str) -> bool {
    element
        .as_object()
        .and_then(|object| object.get(key))
        .and_then(SettingValue::from_json)
        .filter(SettingValue::is_scalar)
        .map(|field| field.canonical_string().eq_ignore_ascii_case(literal.trim()))
        .unwrap_or(false)
}
