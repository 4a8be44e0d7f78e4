use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;

use crate::job::{Job, JobId};
use crate::record::{self, JobRecord};
use crate::store::{JobStore, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

pub struct ApiStore {
    base_url: String,
    client: OnceLock<Client>,
}

impl ApiStore {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&Client, StoreError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = Client::builder()
            .user_agent("draftjobs-tui")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| StoreError::Network(err.to_string()))?;
        Ok(self.client.get_or_init(|| built))
    }

    fn jobs_url(&self) -> String {
        format!("{}/api/jobs", self.base_url)
    }

    fn job_url(&self, id: &JobId) -> String {
        format!("{}/api/jobs/{}", self.base_url, id)
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        id: Option<&JobId>,
        action: &str,
    ) -> Result<Option<T>, StoreError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .map_err(|err| StoreError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| StoreError::Network(err.to_string()))?;
        tracing::debug!(status, action, "job api responded");
        interpret(status, &body, id, action)
    }

    fn send_job(
        &self,
        request: RequestBuilder,
        id: Option<&JobId>,
        action: &str,
    ) -> Result<Job, StoreError> {
        let record: JobRecord = self
            .send(request, id, action)?
            .ok_or_else(|| StoreError::Server(format!("Failed to {action}")))?;
        Ok(record.normalize()?)
    }
}

impl JobStore for ApiStore {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        let request = self.client()?.get(self.jobs_url());
        let values: Vec<serde_json::Value> = self
            .send(request, None, "fetch jobs")?
            .unwrap_or_default();
        Ok(jobs_from_values(values))
    }

    fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        let request = self.client()?.get(self.job_url(id));
        self.send_job(request, Some(id), "fetch job")
    }

    fn create(&self, job: &Job) -> Result<Job, StoreError> {
        let mut record = JobRecord::from_job(job);
        record.id = None;
        record.normalize()?;
        let request = self.client()?.post(self.jobs_url()).json(&record);
        let created = self.send_job(request, None, "create job")?;
        tracing::info!(id = ?created.id, "job created");
        Ok(created)
    }

    fn update(&self, id: &JobId, job: &Job) -> Result<Job, StoreError> {
        let record = JobRecord::from_job(job);
        record.normalize()?;
        let request = self.client()?.put(self.job_url(id)).json(&record);
        let updated = self.send_job(request, Some(id), "update job")?;
        tracing::info!(%id, "job updated");
        Ok(updated)
    }

    fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        let request = self.client()?.delete(self.job_url(id));
        self.send::<serde_json::Value>(request, Some(id), "delete job")?;
        tracing::info!(%id, "job deleted");
        Ok(())
    }
}

fn jobs_from_values(values: Vec<serde_json::Value>) -> Vec<Job> {
    record::valid_jobs(&record::read_records(values))
}

fn interpret<T: DeserializeOwned>(
    status: u16,
    body: &str,
    id: Option<&JobId>,
    action: &str,
) -> Result<Option<T>, StoreError> {
    if status == 404 {
        if let Some(id) = id {
            return Err(StoreError::NotFound(id.clone()));
        }
    }

    let envelope = serde_json::from_str::<Envelope<T>>(body);

    if status >= 500 {
        let message = envelope
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| format!("Failed to {action} (status {status})"));
        return Err(StoreError::Server(message));
    }

    let envelope = envelope
        .map_err(|_| StoreError::Server("Server returned non-JSON response".to_string()))?;

    if !(200..300).contains(&status) || !envelope.success {
        return Err(StoreError::Server(
            envelope
                .error
                .unwrap_or_else(|| format!("Failed to {action}")),
        ));
    }

    Ok(envelope.data)
}
