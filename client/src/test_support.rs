//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled only for tests or with the `test-support` feature.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::ports::{
    ApiGateway, ApiRequest, Blob, BlobFetchError, DownloadSink, DownloadSinkError, HttpMethod,
    SavedFile,
};
use crate::domain::{ApiFailure, ErrorBody};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Scripted {
    reply: Result<Value, ApiFailure>,
    delay: Duration,
}

/// In-process [`ApiGateway`] answering from scripted replies.
///
/// Replies are keyed by method and path and consumed in order. Requests
/// without a scripted reply fail with a transport error naming the route.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
    blobs: Mutex<HashMap<String, VecDeque<Result<Blob, BlobFetchError>>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`.
    pub fn reply(&self, method: HttpMethod, path: &str, reply: Result<Value, ApiFailure>) {
        self.reply_after(method, path, reply, Duration::ZERO);
    }

    /// Queue a reply that resolves only after `delay`.
    pub fn reply_after(
        &self,
        method: HttpMethod,
        path: &str,
        reply: Result<Value, ApiFailure>,
        delay: Duration,
    ) {
        locked(&self.replies)
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(Scripted { reply, delay });
    }

    /// Queue a successful `{ "data": ... }` reply.
    pub fn reply_data(&self, method: HttpMethod, path: &str, data: Value) {
        self.reply(method, path, Ok(json!({ "data": data })));
    }

    /// Queue an error status with a JSON error body.
    pub fn reply_status(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.reply(
            method,
            path,
            Err(ApiFailure::from_status(status, ErrorBody::from_json(&body))),
        );
    }

    /// Queue the outcome of a blob fetch at `path`.
    pub fn blob(&self, path: &str, outcome: Result<Blob, BlobFetchError>) {
        locked(&self.blobs)
            .entry(path.to_owned())
            .or_default()
            .push_back(outcome);
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        locked(&self.requests).clone()
    }

    /// Whether any request hit `method path`.
    pub fn was_called(&self, method: HttpMethod, path: &str) -> bool {
        locked(&self.requests)
            .iter()
            .any(|request| request.method == method && request.path == path)
    }
}

#[async_trait]
impl ApiGateway for ScriptedGateway {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiFailure> {
        let key = (request.method, request.path.clone());
        locked(&self.requests).push(request);
        let scripted = locked(&self.replies)
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let Some(Scripted { reply, delay }) = scripted else {
            return Err(ApiFailure::transport(format!(
                "no scripted reply for {} {}",
                key.0.as_str(),
                key.1
            )));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }

    async fn fetch_blob(&self, path: &str) -> Result<Blob, BlobFetchError> {
        locked(&self.requests).push(ApiRequest::get(path));
        locked(&self.blobs)
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(BlobFetchError::transport(format!("no scripted blob for {path}"))))
    }
}

/// [`DownloadSink`] keeping saved payloads in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    failure: Option<DownloadSinkError>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every save fails with `failure`.
    pub fn failing(failure: DownloadSinkError) -> Self {
        Self {
            saved: Mutex::default(),
            failure: Some(failure),
        }
    }

    /// Names and payloads saved so far.
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        locked(&self.saved).clone()
    }
}

impl DownloadSink for RecordingSink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<SavedFile, DownloadSinkError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        locked(&self.saved).push((name.to_owned(), bytes.to_vec()));
        Ok(SavedFile {
            name: name.to_owned(),
            location: PathBuf::from(name),
            size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
        })
    }
}

/// Wire-shaped user record.
pub fn user_json(id: u64, admin: bool) -> Value {
    json!({
        "id": id,
        "nombre": format!("User {id}"),
        "email": format!("user{id}@example.com"),
        "estado": true,
        "admin": admin,
    })
}

/// Wire-shaped project record owned by `owner`.
pub fn project_json(id: u64, owner: u64) -> Value {
    json!({
        "id": id,
        "titulo": format!("Project {id}"),
        "descripcion": "",
        "fecha_inicio": "2024-01-01",
        "fecha_finalizacion": "2024-06-30",
        "id_responsable": owner,
    })
}

/// Wire-shaped task record in `project`, assigned to `assignee`.
pub fn task_json(id: u64, project: u64, assignee: u64) -> Value {
    json!({
        "id": id,
        "titulo": format!("Task {id}"),
        "descripcion": "",
        "fecha_inicio": "2024-01-02",
        "fecha_finalizacion": "2024-01-09",
        "id_proyecto": project,
        "id_usuario": assignee,
        "status": "Pendiente",
    })
}

/// Wire-shaped attachment record under a project.
pub fn file_json(id: u64, project: u64, name: &str, mime: &str) -> Value {
    json!({
        "id": id,
        "nombre_original": name,
        "nombre_archivo": format!("stored-{id}"),
        "ruta": format!("uploads/stored-{id}"),
        "tipo_archivo": mime,
        "tamano": 2048,
        "id_proyecto": project,
    })
}
