use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::job::{Job, JobId};
use crate::record::{self, JobRecord};
use crate::store::{JobStore, StoreError};

const JOB_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct JobFile {
    version: u32,
    #[serde(default)]
    jobs: Vec<Value>,
}

impl JobFile {
    fn empty() -> Self {
        Self {
            version: JOB_FILE_VERSION,
            jobs: Vec::new(),
        }
    }

    fn position(&self, id: &JobId) -> Option<usize> {
        self.jobs
            .iter()
            .position(|value| record::value_id(value).as_ref() == Some(id))
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<JobFile, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(JobFile::empty()),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(JobFile::empty());
        }
        let file: JobFile = serde_json::from_str(&contents)?;
        if file.version != JOB_FILE_VERSION {
            return Err(StoreError::UnsupportedVersion(file.version));
        }
        Ok(file)
    }

    fn write(&self, file: &JobFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(file)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl JobStore for FileStore {
    fn describe(&self) -> String {
        self.path().display().to_string()
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        let file = self.read()?;
        let mut records = record::read_records(file.jobs);
        records.sort_by_key(|record| Reverse(record.created_at));
        Ok(record::valid_jobs(&records))
    }

    fn get(&self, id: &JobId) -> Result<Job, StoreError> {
        let mut file = self.read()?;
        let index = file
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let stored: JobRecord = serde_json::from_value(file.jobs.swap_remove(index))?;
        Ok(stored.normalize()?)
    }

    fn create(&self, job: &Job) -> Result<Job, StoreError> {
        let mut file = self.read()?;
        let now = Utc::now();
        let mut record = JobRecord::from_job(job);
        record.id = Some(Uuid::new_v4().to_string());
        record.created_at = Some(now);
        record.updated_at = Some(now);
        let created = record.normalize()?;

        file.jobs.insert(0, serde_json::to_value(&record)?);
        self.write(&file)?;
        tracing::info!(id = ?created.id, "job created");
        Ok(created)
    }

    fn update(&self, id: &JobId, job: &Job) -> Result<Job, StoreError> {
        let mut file = self.read()?;
        let index = file
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut record = JobRecord::from_job(job);
        record.id = Some(id.as_str().to_string());
        record.created_at = file.jobs[index]
            .get("createdAt")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok());
        record.updated_at = Some(Utc::now());
        let updated = record.normalize()?;

        file.jobs[index] = serde_json::to_value(&record)?;
        self.write(&file)?;
        tracing::info!(%id, "job updated");
        Ok(updated)
    }

    fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        let mut file = self.read()?;
        let index = file
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        file.jobs.remove(index);
        self.write(&file)?;
        tracing::info!(%id, "job deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::RevisionKey;
    use chrono::NaiveDate;

    fn store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("jobs.json"));
        (store, dir)
    }

    fn job(customer: &str, number: &str) -> Job {
        Job::new(customer, number, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let (store, _dir) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_assigns_id_and_lists_newest_first() {
        let (store, _dir) = store();
        let first = store.create(&job("Acme", "1")).unwrap();
        let second = store.create(&job("Globex", "2")).unwrap();

        assert!(first.id.is_some());
        assert_ne!(first.id, second.id);

        let listed = store.list().unwrap();
        let customers: Vec<&str> = listed.iter().map(|job| job.customer.as_str()).collect();
        assert_eq!(customers, vec!["Globex", "Acme"]);
    }

    #[test]
    fn update_replaces_fields_and_keeps_id() {
        let (store, _dir) = store();
        let created = store.create(&job("Acme", "1")).unwrap();
        let id = created.id.clone().unwrap();

        let mut edited = created.clone();
        edited.revisions.update(RevisionKey::Rev1, |rev| {
            rev.time = 3600;
            rev.set_drafting(true);
            rev.set_drafting_rate(40.0);
        });
        let updated = store.update(&id, &edited).unwrap();
        assert_eq!(updated.id, Some(id.clone()));

        let fetched = store.get(&id).unwrap();
        assert_eq!(fetched.total_seconds(), 3600);
        assert_eq!(fetched.total_cost(), 40.0);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (store, _dir) = store();
        let missing = JobId::new("nope");
        assert!(matches!(store.get(&missing), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(&missing, &job("Acme", "1")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(&missing), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_removes_job() {
        let (store, _dir) = store();
        let keep = store.create(&job("Acme", "1")).unwrap();
        let drop = store.create(&job("Globex", "2")).unwrap();
        store.delete(drop.id.as_ref().unwrap()).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
    }

    #[test]
    fn create_rejects_missing_required_fields() {
        let (store, _dir) = store();
        let result = store.create(&job("", "1"));
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn legacy_records_are_normalized_on_read() {
        let (store, _dir) = store();
        let legacy = r#"{
            "version": 1,
            "jobs": [{
                "id": "legacy-1",
                "customer": "Initech",
                "jobNumber": "88",
                "date": "2023-01-15",
                "revisions": { "rev1": { "checked": true, "notes": "", "time": "00:45:00" } }
            }]
        }"#;
        fs::write(store.path(), legacy).unwrap();

        let job = store.get(&JobId::new("legacy-1")).unwrap();
        let rev1 = job.revisions.get(RevisionKey::Rev1);
        assert!(rev1.completed);
        assert!(!rev1.is_drafting());
        assert_eq!(rev1.drafting_rate(), 0.0);
        assert_eq!(job.total_seconds(), 45 * 60);
    }

    #[test]
    fn newer_file_versions_are_refused() {
        let (store, _dir) = store();
        fs::write(store.path(), r#"{ "version": 2, "jobs": [] }"#).unwrap();
        assert!(matches!(
            store.list(),
            Err(StoreError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn stored_times_are_text() {
        let (store, _dir) = store();
        let mut draft = job("Acme", "1");
        draft.revisions.update(RevisionKey::Submittal, |rev| rev.time = 90);
        store.create(&draft).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("\"time\": \"00:01:30\""));
    }

    #[test]
    fn one_unreadable_record_does_not_hide_the_rest() {
        let (store, _dir) = store();
        let contents = r#"{
            "version": 1,
            "jobs": [
                { "id": "ok", "customer": "Acme", "jobNumber": "1", "date": "2026-01-01",
                  "createdAt": "2026-01-01T10:00:00Z" },
                { "id": "bad", "customer": "Acme", "jobNumber": "2", "date": "2026-01-01",
                  "createdAt": "yesterday" },
                { "id": "null-flag", "customer": "Acme", "jobNumber": "3", "date": "2026-01-01",
                  "revisions": { "rev1": { "checked": null } } }
            ]
        }"#;
        fs::write(store.path(), contents).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, Some(JobId::new("ok")));
        assert!(matches!(
            store.get(&JobId::new("bad")),
            Err(StoreError::Serialization(_))
        ));

        let mut edited = listed[0].clone();
        edited.customer = "Acme Two".to_string();
        store.update(&JobId::new("ok"), &edited).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"createdAt\": \"yesterday\""));
        assert!(raw.contains("2026-01-01T10:00:00Z"));
    }
}
