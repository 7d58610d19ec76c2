use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{guard_matches, DocumentStore, StoreError, StorePath, WriteBatch};

/// In-process [`DocumentStore`] holding the whole tree as one JSON value.
///
/// Backs tests and single-node deployments. The write lock is held across
/// guard evaluation and update application, so a commit is atomic and commits
/// against the same store serialize.
#[derive(Debug)]
pub struct MemoryStore {
    root: RwLock<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    pub fn with_root(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// Load the initial tree from a JSON file. The root must be an object.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let root: Value = serde_json::from_str(&raw)?;
        if !root.is_object() {
            return Err(StoreError::SeedShape);
        }
        Ok(Self::with_root(root))
    }

    /// Full copy of the current tree, for tests and diagnostics.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let root = self.root.read().await;
        Ok(lookup(&root, path).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut root = self.root.write().await;

        for guard in batch.guards() {
            let current = lookup(&root, &guard.path);
            if !guard_matches(current, guard.expected.as_ref()) {
                return Err(StoreError::PreconditionFailed {
                    path: guard.path.clone(),
                });
            }
        }

        // Apply against a scratch copy so a mid-batch shape error cannot
        // leave a partially applied batch behind.
        let mut next = root.clone();
        for (path, value) in batch.into_updates() {
            write_value(&mut next, &path, value)?;
        }
        *root = next;
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

fn write_value(root: &mut Value, path: &StorePath, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(StoreError::InvalidPath(path.to_string()));
    };

    let mut node = root;
    for segment in parents {
        node = descend_or_create(node, segment, path)?;
    }

    match node {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index: usize = last.parse().map_err(|_| StoreError::WrongShape {
                path: path.clone(),
            })?;
            if index < items.len() {
                items[index] = value;
                Ok(())
            } else if index == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(StoreError::WrongShape { path: path.clone() })
            }
        }
        _ => Err(StoreError::WrongShape { path: path.clone() }),
    }
}

fn descend_or_create<'a>(
    node: &'a mut Value,
    segment: &str,
    path: &StorePath,
) -> Result<&'a mut Value, StoreError> {
    match node {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index: usize = segment.parse().map_err(|_| StoreError::WrongShape {
                path: path.clone(),
            })?;
            items
                .get_mut(index)
                .ok_or_else(|| StoreError::WrongShape { path: path.clone() })
        }
        _ => Err(StoreError::WrongShape { path: path.clone() }),
    }
}
