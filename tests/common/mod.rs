#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Notify;

use postdeck::application::backend::{Backend, BackendError};
use postdeck::application::routes::RouteAdapter;
use postdeck::cache::{ApiClient, CacheConfig};
use postdeck::domain::entities::{BlogPost, BlogPostFields, User, UserId};
use postdeck::infra::memory::{InMemoryBackend, SeedData};

/// How a scripted backend operation misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Error(&'static str),
    Panic(&'static str),
    /// Panic with a payload that is neither `&str` nor `String`.
    OpaquePanic,
}

/// Backend wrapper that counts calls per operation and can be scripted to fail,
/// to hold reads until released, or to answer without payloads.
#[derive(Default)]
pub struct RecordingBackend {
    inner: InMemoryBackend,
    calls: DashMap<&'static str, usize>,
    failures: DashMap<&'static str, Failure>,
    read_gate: Mutex<Option<Arc<Notify>>>,
    silent: std::sync::atomic::AtomicBool,
}

impl RecordingBackend {
    pub fn new(seed: SeedData) -> Self {
        Self {
            inner: InMemoryBackend::new(seed),
            ..Self::default()
        }
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.get(op).map_or(0, |count| *count)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn fail(&self, op: &'static str, failure: Failure) {
        self.failures.insert(op, failure);
    }

    pub fn recover(&self, op: &str) {
        self.failures.remove(op);
    }

    /// Make list reads wait for a permit on the returned gate.
    pub fn hold_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.read_gate.lock().expect("gate lock") = Some(Arc::clone(&gate));
        gate
    }

    /// Answer mutations with `Ok(None)`.
    pub fn go_silent(&self) {
        self.silent.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> SeedData {
        self.inner.snapshot().await
    }

    fn enter(&self, op: &'static str) -> Result<(), BackendError> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get(op).map(|failure| *failure) {
            None => Ok(()),
            Some(Failure::Error(message)) => Err(BackendError::failed(message)),
            Some(Failure::Panic(message)) => panic!("{message}"),
            Some(Failure::OpaquePanic) => std::panic::panic_any(42_u8),
        }
    }

    async fn wait_for_gate(&self) {
        let gate = self.read_gate.lock().expect("gate lock").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn is_silent(&self) -> bool {
        self.silent.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn list_users(&self) -> Result<Vec<User>, BackendError> {
        self.enter("list_users")?;
        self.wait_for_gate().await;
        self.inner.list_users().await
    }

    async fn delete_user(&self, id: UserId) -> Result<Option<bool>, BackendError> {
        self.enter("delete_user")?;
        let result = self.inner.delete_user(id).await?;
        Ok(if self.is_silent() { None } else { result })
    }

    async fn list_blog_posts(&self) -> Result<Vec<BlogPost>, BackendError> {
        self.enter("list_blog_posts")?;
        self.wait_for_gate().await;
        self.inner.list_blog_posts().await
    }

    async fn create_blog_post(&self, post: BlogPost) -> Result<Option<BlogPost>, BackendError> {
        self.enter("create_blog_post")?;
        let result = self.inner.create_blog_post(post).await?;
        Ok(if self.is_silent() { None } else { result })
    }

    async fn delete_blog_post(&self, id: &str) -> Result<Option<bool>, BackendError> {
        self.enter("delete_blog_post")?;
        let result = self.inner.delete_blog_post(id).await?;
        Ok(if self.is_silent() { None } else { result })
    }

    async fn update_blog_post(
        &self,
        id: &str,
        fields: BlogPostFields,
    ) -> Result<Option<BlogPost>, BackendError> {
        self.enter("update_blog_post")?;
        let result = self.inner.update_blog_post(id, fields).await?;
        Ok(if self.is_silent() { None } else { result })
    }
}

pub fn user(id: i64, first_name: &str, last_name: &str) -> User {
    User {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        gender: "Female".to_string(),
        ip_address: format!("10.0.0.{id}"),
    }
}

pub fn post(id: &str, user_id: i64, title: &str) -> BlogPost {
    BlogPost {
        id: id.to_string(),
        title: title.to_string(),
        body: format!("{title} body"),
        user_id,
        date_posted: "2024-01-05T10:00:00.000Z".to_string(),
    }
}

/// Three users; user 1 owns `p1` and `p2`, user 2 owns `p3`.
pub fn small_seed() -> SeedData {
    SeedData {
        users: vec![
            user(1, "Ada", "Lovelace"),
            user(2, "Grace", "Hopper"),
            user(3, "Edsger", "Dijkstra"),
        ],
        blog_posts: vec![
            post("p1", 1, "First"),
            post("p2", 1, "Second"),
            post("p3", 2, "Third"),
        ],
    }
}

pub fn recording_backend() -> Arc<RecordingBackend> {
    Arc::new(RecordingBackend::new(small_seed()))
}

pub fn client_for(backend: &Arc<RecordingBackend>) -> ApiClient {
    client_with(backend, CacheConfig::default())
}

pub fn client_with(backend: &Arc<RecordingBackend>, config: CacheConfig) -> ApiClient {
    let backend: Arc<dyn Backend> = Arc::clone(backend) as Arc<dyn Backend>;
    ApiClient::new(config, RouteAdapter::new(backend))
}
