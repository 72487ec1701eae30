use std::collections::HashMap;

use tracing::debug;

/// Key to bytes store for proofs that are expensive to regenerate.
pub trait ProofCache: Send {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn put(&mut self, key: &str, value: Vec<u8>);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryProofCache {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryProofCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProofCache for MemoryProofCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Returns the cached value for `key`, or runs `compute` and stores its output.
pub fn compute_or_load<E, F>(
    cache: &mut dyn ProofCache,
    key: &str,
    compute: F,
) -> Result<Vec<u8>, E>
where
    F: FnOnce() -> Result<Vec<u8>, E>,
{
    if let Some(bytes) = cache.get(key) {
        debug!(key, bytes = bytes.len(), "proof cache hit");
        return Ok(bytes);
    }
    let bytes = compute()?;
    debug!(key, bytes = bytes.len(), "proof cache miss, stored");
    cache.put(key, bytes.clone());
    Ok(bytes)
}
