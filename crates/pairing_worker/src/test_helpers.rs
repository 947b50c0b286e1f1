//! In-memory adapters for exercising the reconciler without AWS.
//!
//! Every fake records the calls it receives so tests can assert on store and
//! queue traffic, and exposes switches to inject failures.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pairing_core::decode::{encode_notification, PayloadEncoding};
use serde_json::json;

use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::{InputQueue, MessageHandle, OutputQueue, QueueMessage};
use crate::error::{QueueError, StoreError};

pub const BLOB_CREATED: &str = "Microsoft.Storage.BlobCreated";
const TEST_QUEUE: &str = "in-memory";

/// Builds a queue body carrying a notification with the given type and subject.
pub fn notification_body(event_type: &str, subject: &str, encoding: PayloadEncoding) -> String {
    let json = json!({
        "id": format!("evt-{subject}"),
        "type": event_type,
        "subject": subject,
        "data": {"api": "PutBlob"},
    });
    encode_notification(&json.to_string(), encoding)
}

/// Base64 `BlobCreated` body for an object at `relative_path` in container `input`.
pub fn blob_created_body(relative_path: &str) -> String {
    notification_body(
        BLOB_CREATED,
        &format!("/blobServices/default/containers/input/blobs/{relative_path}"),
        PayloadEncoding::Base64,
    )
}

/// Objects keyed by path, each holding its current tag set.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    exists_calls: Mutex<Vec<String>>,
    tag_calls: Mutex<Vec<String>>,
    fail_lookups: AtomicBool,
    fail_tags: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for path in paths {
            store.insert(path);
        }
        store
    }

    pub fn insert(&self, path: impl Into<String>) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .entry(path.into())
            .or_default();
    }

    pub fn tags(&self, path: &str) -> Option<BTreeMap<String, String>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(path)
            .cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.objects.lock().expect("poisoned mutex").clone()
    }

    pub fn exists_calls(&self) -> Vec<String> {
        self.exists_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn tag_calls(&self) -> Vec<String> {
        self.tag_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn store_calls(&self) -> usize {
        self.exists_calls().len() + self.tag_calls().len()
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_tags(&self, fail: bool) {
        self.fail_tags.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        self.exists_calls
            .lock()
            .expect("poisoned mutex")
            .push(path.to_string());

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Lookup {
                path: path.to_string(),
                message: "simulated store outage".to_string(),
            });
        }

        Ok(self
            .objects
            .lock()
            .expect("poisoned mutex")
            .contains_key(path))
    }

    async fn set_tags(
        &self,
        path: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        self.tag_calls
            .lock()
            .expect("poisoned mutex")
            .push(path.to_string());

        if self.fail_tags.load(Ordering::SeqCst) {
            return Err(StoreError::Tag {
                path: path.to_string(),
                message: "simulated tag failure".to_string(),
            });
        }

        let mut objects = self.objects.lock().expect("poisoned mutex");
        let Some(current) = objects.get_mut(path) else {
            return Err(StoreError::Tag {
                path: path.to_string(),
                message: "object does not exist".to_string(),
            });
        };
        *current = tags.clone();
        Ok(())
    }
}

/// Queue with provider-like visibility: received messages stay in flight
/// until deleted, and `expire_visibility` makes undeleted ones visible again.
#[derive(Debug, Default)]
pub struct InMemoryInputQueue {
    pending: Mutex<VecDeque<(String, String)>>,
    in_flight: Mutex<Vec<QueueMessage>>,
    receive_sizes: Mutex<Vec<usize>>,
    deleted: Mutex<Vec<String>>,
    failing_deletes: Mutex<BTreeSet<String>>,
    fail_receives: AtomicBool,
    next_id: AtomicUsize,
    next_delivery: AtomicUsize,
}

impl InMemoryInputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bodies<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = Self::new();
        for body in bodies {
            queue.push(body);
        }
        queue
    }

    /// Enqueues `body` and returns the message id assigned to it.
    pub fn push(&self, body: impl Into<String>) -> String {
        let id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.pending
            .lock()
            .expect("poisoned mutex")
            .push_back((id.clone(), body.into()));
        id
    }

    pub fn receive_sizes(&self) -> Vec<usize> {
        self.receive_sizes.lock().expect("poisoned mutex").clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().expect("poisoned mutex").clone()
    }

    pub fn visible_len(&self) -> usize {
        self.pending.lock().expect("poisoned mutex").len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.lock().expect("poisoned mutex").len()
    }

    /// Returns every undeleted in-flight message to the visible queue.
    pub fn expire_visibility(&self) {
        let expired: Vec<QueueMessage> = self
            .in_flight
            .lock()
            .expect("poisoned mutex")
            .drain(..)
            .collect();
        let mut pending = self.pending.lock().expect("poisoned mutex");
        for message in expired {
            pending.push_back((message.handle.id, message.body));
        }
    }

    pub fn fail_delete_for(&self, message_id: &str) {
        self.failing_deletes
            .lock()
            .expect("poisoned mutex")
            .insert(message_id.to_string());
    }

    pub fn fail_receives(&self, fail: bool) {
        self.fail_receives.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl InputQueue for InMemoryInputQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        if self.fail_receives.load(Ordering::SeqCst) {
            return Err(QueueError::Receive {
                queue: TEST_QUEUE.to_string(),
                message: "simulated receive failure".to_string(),
            });
        }

        let mut pending = self.pending.lock().expect("poisoned mutex");
        let take = max_messages.min(pending.len());
        let batch: Vec<QueueMessage> = pending
            .drain(..take)
            .map(|(id, body)| {
                let delivery = self.next_delivery.fetch_add(1, Ordering::SeqCst);
                QueueMessage {
                    handle: MessageHandle {
                        ack_token: format!("receipt-{id}-{delivery}"),
                        id,
                    },
                    body,
                }
            })
            .collect();
        drop(pending);

        self.in_flight
            .lock()
            .expect("poisoned mutex")
            .extend(batch.iter().cloned());
        self.receive_sizes
            .lock()
            .expect("poisoned mutex")
            .push(batch.len());
        Ok(batch)
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<(), QueueError> {
        let delete_error = |message: &str| QueueError::Delete {
            queue: TEST_QUEUE.to_string(),
            message_id: handle.id.clone(),
            message: message.to_string(),
        };

        if self
            .failing_deletes
            .lock()
            .expect("poisoned mutex")
            .contains(&handle.id)
        {
            return Err(delete_error("simulated delete failure"));
        }

        let mut in_flight = self.in_flight.lock().expect("poisoned mutex");
        let Some(index) = in_flight
            .iter()
            .position(|message| message.handle == *handle)
        else {
            return Err(delete_error("receipt is not in flight"));
        };
        in_flight.remove(index);
        drop(in_flight);

        self.deleted
            .lock()
            .expect("poisoned mutex")
            .push(handle.id.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingOutputQueue {
    sent: Mutex<Vec<String>>,
    fail_sends: AtomicBool,
    failing_bodies: Mutex<BTreeSet<String>>,
}

impl RecordingOutputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("poisoned mutex").clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send_of(&self, body: impl Into<String>) {
        self.failing_bodies
            .lock()
            .expect("poisoned mutex")
            .insert(body.into());
    }
}

#[async_trait]
impl OutputQueue for RecordingOutputQueue {
    async fn send(&self, body: &str) -> Result<(), QueueError> {
        let rejected = self.fail_sends.load(Ordering::SeqCst)
            || self
                .failing_bodies
                .lock()
                .expect("poisoned mutex")
                .contains(body);
        if rejected {
            return Err(QueueError::Send {
                queue: TEST_QUEUE.to_string(),
                message: "simulated send failure".to_string(),
            });
        }

        self.sent
            .lock()
            .expect("poisoned mutex")
            .push(body.to_string());
        Ok(())
    }
}
