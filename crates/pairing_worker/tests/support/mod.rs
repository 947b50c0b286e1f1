#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pairing_worker::adapters::object_store::ObjectStore;
use pairing_worker::drain::{DrainSettings, PairingDependencies};
use pairing_worker::error::StoreError;
use pairing_worker::test_helpers::{
    blob_created_body, InMemoryInputQueue, InMemoryObjectStore, RecordingOutputQueue,
};

/// One store and both queues, wired the way the binaries wire the AWS adapters.
pub struct Harness {
    pub store: InMemoryObjectStore,
    pub input: InMemoryInputQueue,
    pub output: RecordingOutputQueue,
    pub settings: DrainSettings,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: InMemoryObjectStore::new(),
            input: InMemoryInputQueue::new(),
            output: RecordingOutputQueue::new(),
            settings: DrainSettings::default(),
        }
    }

    pub fn deps(&self) -> PairingDependencies<'_> {
        PairingDependencies {
            object_store: &self.store,
            input_queue: &self.input,
            output_queue: &self.output,
        }
    }

    /// Uploads an object and enqueues its creation notice, as the producer does.
    pub fn upload(&self, relative_path: &str) -> String {
        self.store.insert(relative_path);
        self.input.push(blob_created_body(relative_path))
    }

    /// Uploads an object without announcing it.
    pub fn upload_silently(&self, relative_path: &str) {
        self.store.insert(relative_path);
    }
}

pub fn order_path(timestamp: u64, suffix: char) -> String {
    format!("2023/11/order-{timestamp}-{suffix}.json")
}

/// Store whose lookups stay pending across a few scheduler turns and record
/// how many of them overlap. Every companion is reported missing.
#[derive(Debug, Default)]
pub struct OverlapTrackingStore {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    lookups: AtomicUsize,
}

impl OverlapTrackingStore {
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for OverlapTrackingStore {
    async fn exists(&self, _path: &str) -> Result<bool, StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.lookups.fetch_add(1, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(false)
    }

    async fn set_tags(
        &self,
        _path: &str,
        _tags: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}
