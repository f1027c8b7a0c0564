//! Policy exports on disk
//!
//! Every `*.json` file under the root holds either one policy record or an
//! array of records. A record is an envelope with an explicit `payload`
//! field, or a raw Graph object whose whole body is the payload.

use super::{PolicyBatch, PolicySource, SourceError};
use crate::results::PolicyFailure;
use crate::types::{Policy, PolicyPayload, PolicyType};
use psc_catalog::config::compile_time::source::MAX_POLICY_FILE_SIZE;
use psc_catalog::logging::codes;
use psc_catalog::{log_error, log_info, log_success, Platform};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct DirectoryPolicySource {
    root: PathBuf,
    recursive: bool,
}

impl DirectoryPolicySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `*.json` files in path order
    pub fn discover(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::Walk {
                path: self.root.clone(),
                reason: "not a directory".to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(max_depth)
        {
            let entry = entry.map_err(|e| SourceError::Walk {
                path: self.root.clone(),
                reason: e.to_string(),
            })?;
            let is_json = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_json {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn load_file(&self, path: &Path) -> Result<PolicyBatch, SourceError> {
        let metadata = std::fs::metadata(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.len() > MAX_POLICY_FILE_SIZE {
            return Err(SourceError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max: MAX_POLICY_FILE_SIZE,
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut batch = parse_export(&content).map_err(|reason| SourceError::InvalidRecord {
            path: path.to_path_buf(),
            reason,
        })?;
        for failure in &mut batch.rejected {
            log_error!(codes::source::POLICY_RECORD_INVALID, "Skipping policy record",
                "file" => path.display(),
                "policy_id" => failure.policy_id,
                "reason" => failure.reason
            );
            failure.reason = format!("{}: {}", path.display(), failure.reason);
        }
        Ok(batch)
    }
}

impl PolicySource for DirectoryPolicySource {
    fn name(&self) -> &str {
        "directory"
    }

    fn fetch_policies(&self) -> Result<Vec<Policy>, SourceError> {
        self.fetch_batch().map(|batch| batch.policies)
    }

    /// Bad files and bad records are rejected individually; the rest still load
    fn fetch_batch(&self) -> Result<PolicyBatch, SourceError> {
        log_info!("Loading policy exports", "directory" => self.root.display());

        let files = self.discover()?;
        let mut batch = PolicyBatch::default();
        for file in &files {
            match self.load_file(file) {
                Ok(loaded) => batch.append(loaded),
                Err(e) => {
                    log_error!(e.log_code(), "Skipping policy export",
                        "file" => file.display(),
                        "reason" => e
                    );
                    batch.rejected.push(PolicyFailure {
                        policy_id: file.display().to_string(),
                        policy_name: file
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        log_success!(codes::success::POLICIES_LOADED, "Policy exports loaded",
            "files" => files.len(),
            "rejected" => batch.rejected.len(),
            "policies" => batch.policies.len()
        );
        Ok(batch)
    }
}

/// Parse the text of one export file
///
/// Only text that is not JSON, or JSON that is neither an object nor an
/// array, fails the whole export. Each bad record is rejected on its own.
pub fn parse_export(content: &str) -> Result<PolicyBatch, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let records = match value {
        Value::Array(records) => records,
        Value::Object(_) => vec![value],
        other => {
            return Err(format!("expected an object or array, found {}", json_kind(&other)))
        }
    };

    let mut batch = PolicyBatch::default();
    for (index, record) in records.into_iter().enumerate() {
        let (policy_id, policy_name) = record_label(&record, index);
        match parse_record(record) {
            Ok(policy) => batch.policies.push(policy),
            Err(e) => batch.rejected.push(PolicyFailure {
                policy_id,
                policy_name,
                reason: format!("record {}: {}", index, e),
            }),
        }
    }
    Ok(batch)
}

/// Best-effort id and name for a record that may be malformed
fn record_label(record: &Value, index: usize) -> (String, String) {
    let field = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_string);
    let id = field("id").unwrap_or_else(|| format!("record {}", index));
    let name = field("name")
        .or_else(|| field("displayName"))
        .unwrap_or_else(|| id.clone());
    (id, name)
}

fn parse_record(record: Value) -> Result<Policy, String> {
    let mut fields = match record {
        Value::Object(fields) => fields,
        other => return Err(format!("expected an object, found {}", json_kind(&other))),
    };

    let id = take_string(&fields, "id").ok_or("missing string field 'id'")?;
    let name = take_string(&fields, "name")
        .or_else(|| take_string(&fields, "displayName"))
        .unwrap_or_else(|| id.clone());
    let odata_type =
        take_string(&fields, "odata_type").or_else(|| take_string(&fields, "@odata.type"));

    let mut policy = match fields.remove("payload") {
        Some(Value::String(raw)) => Policy::from_raw(id, name, raw),
        Some(payload) => Policy {
            payload: PolicyPayload::Parsed(payload),
            ..Policy::new(id, name, Value::Null)
        },
        None => Policy::new(id, name, Value::Object(fields.clone())),
    };

    if let Some(odata_type) = odata_type {
        policy = policy.with_odata_type(odata_type);
    }
    if let Some(kind) = take_string(&fields, "policy_type") {
        if let Ok(kind) = kind.parse::<PolicyType>() {
            policy = policy.with_policy_type(kind);
        }
    }
    if let Some(family) = take_string(&fields, "template_family") {
        policy = policy.with_template_family(family);
    }
    if let Some(platform) = take_string(&fields, "platform") {
        let platform = platform
            .parse::<Platform>()
            .map_err(|e| format!("policy '{}': {}", policy.id, e))?;
        policy = policy.with_platform(platform);
    }
    Ok(policy)
}

fn take_string(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key)?.as_str().map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
