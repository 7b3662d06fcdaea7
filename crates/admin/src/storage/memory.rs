//! In-memory [`BlobStore`] for tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{BlobObject, BlobStore, StorageError};

/// Blob store backed by a map. Keys listed in `failing` error on `put`/`get`.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    failing: Mutex<BTreeSet<String>>,
}

#[allow(clippy::unwrap_used)]
impl MemoryBlobStore {
    pub fn with_objects<'a>(objects: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Self {
        let store = Self::default();
        {
            let mut map = store.objects.lock().unwrap();
            for (key, data) in objects {
                map.insert(key.to_owned(), data.to_vec());
            }
        }
        store
    }

    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_owned());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn data(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    fn check(&self, key: &str) -> Result<(), StorageError> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(StorageError::Request {
                key: key.to_owned(),
                message: "injected failure".to_owned(),
            });
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
impl BlobStore for MemoryBlobStore {
    async fn list(&self) -> Result<Vec<BlobObject>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, data)| BlobObject {
                key: key.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.objects.lock().unwrap().insert(key.to_owned(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.check(key)?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_owned()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
