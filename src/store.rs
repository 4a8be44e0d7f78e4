use std::io;
use std::path::PathBuf;

use crate::api::ApiStore;
use crate::job::{Job, JobId};
use crate::record::RecordError;
use crate::storage::FileStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Job {0} not found")]
    NotFound(JobId),
    #[error("Invalid job: {0}")]
    Invalid(#[from] RecordError),
    #[error("Job file uses unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed job data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error: {0}")]
    Server(String),
}

impl StoreError {
    pub fn user_message(&self) -> String {
        match self {
            StoreError::NotFound(_) => "Job not found. It may have been deleted.".to_string(),
            StoreError::Invalid(err) => format!("Cannot save job: {err}."),
            StoreError::Network(message) => {
                format!("Cannot reach the job server ({message}).")
            }
            StoreError::Server(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub trait JobStore: Send {
    fn describe(&self) -> String;
    /// Newest first.
    fn list(&self) -> Result<Vec<Job>, StoreError>;
    fn get(&self, id: &JobId) -> Result<Job, StoreError>;
    fn create(&self, job: &Job) -> Result<Job, StoreError>;
    fn update(&self, id: &JobId, job: &Job) -> Result<Job, StoreError>;
    fn delete(&self, id: &JobId) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    File(PathBuf),
    Api(String),
}

impl Backend {
    pub fn open(&self) -> Box<dyn JobStore> {
        match self {
            Backend::File(path) => Box::new(FileStore::new(path.clone())),
            Backend::Api(url) => Box::new(ApiStore::new(url.clone())),
        }
    }
}
