//! Sub-document mutations: partial updates addressed by a dotted field path.

use serde::Serialize;
use serde_json::{map::Entry, Map, Value};

use super::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutateInSpec {
    /// Push `value` onto the array at `path`.
    ArrayAppend {
        path: String,
        value: Value,
        create_parents: bool,
    },
    /// Push a primitive `value` onto the array at `path` unless already present.
    ArrayAddUnique {
        path: String,
        value: Value,
        create_parents: bool,
    },
    /// Set the field at `path`, replacing any previous value.
    Upsert {
        path: String,
        value: Value,
        create_parents: bool,
    },
    /// Delete the field at `path`.
    Remove { path: String },
}

impl MutateInSpec {
    pub fn array_append(path: impl Into<String>, value: Value) -> Self {
        MutateInSpec::ArrayAppend {
            path: path.into(),
            value,
            create_parents: false,
        }
    }

    pub fn array_add_unique(path: impl Into<String>, value: Value) -> Self {
        MutateInSpec::ArrayAddUnique {
            path: path.into(),
            value,
            create_parents: false,
        }
    }

    pub fn upsert(path: impl Into<String>, value: Value) -> Self {
        MutateInSpec::Upsert {
            path: path.into(),
            value,
            create_parents: false,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        MutateInSpec::Remove { path: path.into() }
    }

    /// Create missing intermediate objects (and a missing target array).
    pub fn create_parents(mut self, enabled: bool) -> Self {
        match &mut self {
            MutateInSpec::ArrayAppend { create_parents, .. }
            | MutateInSpec::ArrayAddUnique { create_parents, .. }
            | MutateInSpec::Upsert { create_parents, .. } => *create_parents = enabled,
            MutateInSpec::Remove { .. } => {}
        }
        self
    }

    pub fn path(&self) -> &str {
        match self {
            MutateInSpec::ArrayAppend { path, .. }
            | MutateInSpec::ArrayAddUnique { path, .. }
            | MutateInSpec::Upsert { path, .. }
            | MutateInSpec::Remove { path } => path,
        }
    }
}

/// Apply every spec to `document`, all or nothing.
///
/// On error `document` is left exactly as it was.
pub fn apply_mutations(document: &mut Value, specs: &[MutateInSpec]) -> StoreResult<()> {
    let mut working = document.clone();
    for spec in specs {
        apply_one(&mut working, spec)?;
    }
    *document = working;
    Ok(())
}

fn apply_one(document: &mut Value, spec: &MutateInSpec) -> StoreResult<()> {
    let path = spec.path();
    let segments = split_path(path)?;
    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(StoreError::PathMismatch(path.to_string())),
    };

    match spec {
        MutateInSpec::ArrayAppend {
            value,
            create_parents,
            ..
        } => {
            let parent = parent_object(document, parents, *create_parents, path)?;
            let array = target_array(parent, leaf, *create_parents, path)?;
            array.push(value.clone());
        }
        MutateInSpec::ArrayAddUnique {
            value,
            create_parents,
            ..
        } => {
            if value.is_object() || value.is_array() {
                return Err(StoreError::PathMismatch(format!(
                    "{}: only primitive values can be added uniquely",
                    path
                )));
            }
            let parent = parent_object(document, parents, *create_parents, path)?;
            let array = target_array(parent, leaf, *create_parents, path)?;
            if array.contains(value) {
                return Err(StoreError::PathExists(path.to_string()));
            }
            array.push(value.clone());
        }
        MutateInSpec::Upsert {
            value,
            create_parents,
            ..
        } => {
            let parent = parent_object(document, parents, *create_parents, path)?;
            parent.insert(leaf.to_string(), value.clone());
        }
        MutateInSpec::Remove { .. } => {
            let parent = parent_object(document, parents, false, path)?;
            if parent.remove(*leaf).is_none() {
                return Err(StoreError::PathNotFound(path.to_string()));
            }
        }
    }

    Ok(())
}

fn split_path(path: &str) -> StoreResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StoreError::PathMismatch(format!("invalid path `{}`", path)));
    }
    Ok(segments)
}

fn parent_object<'a>(
    document: &'a mut Value,
    segments: &[&str],
    create_parents: bool,
    path: &str,
) -> StoreResult<&'a mut Map<String, Value>> {
    let mut current = document;
    for segment in segments {
        let object = current
            .as_object_mut()
            .ok_or_else(|| StoreError::PathMismatch(path.to_string()))?;
        current = match object.entry(segment.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if create_parents => entry.insert(Value::Object(Map::new())),
            Entry::Vacant(_) => return Err(StoreError::PathNotFound(path.to_string())),
        };
    }
    current
        .as_object_mut()
        .ok_or_else(|| StoreError::PathMismatch(path.to_string()))
}

fn target_array<'a>(
    parent: &'a mut Map<String, Value>,
    leaf: &str,
    create_parents: bool,
    path: &str,
) -> StoreResult<&'a mut Vec<Value>> {
    let target = match parent.entry(leaf.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) if create_parents => entry.insert(Value::Array(Vec::new())),
        Entry::Vacant(_) => return Err(StoreError::PathNotFound(path.to_string())),
    };
    target
        .as_array_mut()
        .ok_or_else(|| StoreError::PathMismatch(path.to_string()))
}
