use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::{format_iso, parse_stored_date};
use crate::job::{Billing, Job, JobId, Revision, RevisionKey};
use crate::timecode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid job date '{0}'")]
    InvalidDate(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRecord {
    #[serde(default, alias = "completed")]
    pub checked: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    #[serde(default, with = "timecode::hms")]
    pub time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_drafting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_estimating: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drafting_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submittal: Option<RevisionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev1: Option<RevisionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev2: Option<RevisionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev3: Option<RevisionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev4: Option<RevisionRecord>,
}

impl RevisionsRecord {
    pub fn get(&self, key: RevisionKey) -> Option<&RevisionRecord> {
        match key {
            RevisionKey::Submittal => self.submittal.as_ref(),
            RevisionKey::Rev1 => self.rev1.as_ref(),
            RevisionKey::Rev2 => self.rev2.as_ref(),
            RevisionKey::Rev3 => self.rev3.as_ref(),
            RevisionKey::Rev4 => self.rev4.as_ref(),
        }
    }

    fn set(&mut self, key: RevisionKey, record: RevisionRecord) {
        let slot = match key {
            RevisionKey::Submittal => &mut self.submittal,
            RevisionKey::Rev1 => &mut self.rev1,
            RevisionKey::Rev2 => &mut self.rev2,
            RevisionKey::Rev3 => &mut self.rev3,
            RevisionKey::Rev4 => &mut self.rev4,
        };
        *slot = Some(record);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub job_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default)]
    pub revisions: RevisionsRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn from_job(job: &Job) -> Self {
        let mut revisions = RevisionsRecord::default();
        for revision in job.revisions.iter() {
            revisions.set(revision.key(), revision_record(revision));
        }

        Self {
            document_id: None,
            id: job.id.as_ref().map(|id| id.as_str().to_string()),
            customer: job.customer.clone(),
            job_name: job.job_name.clone(),
            job_number: job.job_number.clone(),
            date: format_iso(job.date),
            revisions,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.id
            .as_deref()
            .or(self.document_id.as_deref())
            .filter(|value| !value.is_empty())
            .map(JobId::new)
    }

    /// Older records lack billing fields and sometimes whole revisions; these
    /// are back-filled here so the rest of the crate never sees a partial job.
    pub fn normalize(&self) -> Result<Job, RecordError> {
        if self.customer.trim().is_empty() {
            return Err(RecordError::MissingField("customer"));
        }
        if self.job_number.trim().is_empty() {
            return Err(RecordError::MissingField("job number"));
        }
        if self.date.trim().is_empty() {
            return Err(RecordError::MissingField("date"));
        }
        let date =
            parse_stored_date(&self.date).ok_or_else(|| RecordError::InvalidDate(self.date.clone()))?;

        let mut job = Job::new(self.customer.clone(), self.job_number.clone(), date);
        job.id = self.job_id();
        job.job_name = self
            .job_name
            .clone()
            .filter(|name| !name.trim().is_empty());

        for key in RevisionKey::ALL {
            let Some(stored) = self.revisions.get(key) else {
                tracing::debug!(revision = %key, "back-filling missing revision");
                continue;
            };
            if key.is_billable() && stored.is_drafting.is_none() {
                tracing::debug!(revision = %key, "back-filling missing billing fields");
            }
            job.revisions.update(key, |revision| {
                revision.completed = stored.checked;
                revision.notes = stored.notes.clone();
                revision.time = stored.time;
                revision.set_billing(Billing {
                    is_drafting: stored.is_drafting.unwrap_or(false),
                    is_estimating: stored.is_estimating.unwrap_or(false),
                    drafting_rate: stored.drafting_rate.unwrap_or(0.0),
                });
            });
        }

        Ok(job)
    }
}

/// Decodes each stored value on its own; unreadable ones are skipped.
pub fn read_records(values: Vec<Value>) -> Vec<JobRecord> {
    values
        .into_iter()
        .filter_map(|value| {
            let id = value_id(&value);
            match serde_json::from_value::<JobRecord>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(?id, "skipping unreadable job: {err}");
                    None
                }
            }
        })
        .collect()
}

pub fn valid_jobs(records: &[JobRecord]) -> Vec<Job> {
    records
        .iter()
        .filter_map(|record| match record.normalize() {
            Ok(job) => Some(job),
            Err(err) => {
                tracing::warn!(id = ?record.job_id(), "skipping invalid job: {err}");
                None
            }
        })
        .collect()
}

pub fn value_id(value: &Value) -> Option<JobId> {
    ["id", "_id"]
        .into_iter()
        .filter_map(|field| value.get(field).and_then(Value::as_str))
        .find(|id| !id.is_empty())
        .map(JobId::new)
}

fn revision_record(revision: &Revision) -> RevisionRecord {
    let billing = revision.billing();
    RevisionRecord {
        checked: revision.completed,
        notes: revision.notes.clone(),
        time: revision.time,
        is_drafting: billing.map(|billing| billing.is_drafting),
        is_estimating: billing.map(|billing| billing.is_estimating),
        drafting_rate: billing.map(|billing| billing.drafting_rate),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LEGACY: &str = r#"{
        "_id": "66f0c0ffee",
        "customer": "Northwind",
        "jobNumber": "2024-17",
        "date": "2024-09-22",
        "revisions": {
            "submittal": { "checked": true, "notes": "sent", "time": "00:30:00" },
            "rev1": { "checked": false, "notes": "", "time": "01:00:00" },
            "rev2": { "checked": false, "notes": "", "time": "00:00:00" }
        },
        "createdAt": "2024-09-22T14:03:11.512Z",
        "__v": 0
    }"#;

    #[test]
    fn legacy_record_gets_billing_defaults() {
        let record: JobRecord = serde_json::from_str(LEGACY).unwrap();
        let job = record.normalize().unwrap();

        assert_eq!(job.id, Some(JobId::new("66f0c0ffee")));
        assert_eq!(job.date, NaiveDate::from_ymd_opt(2024, 9, 22).unwrap());
        assert_eq!(job.job_name, None);
        for key in &RevisionKey::ALL[1..] {
            let revision = job.revisions.get(*key);
            assert_eq!(revision.billing().copied(), Some(Billing::default()));
        }
        let submittal = job.revisions.get(RevisionKey::Submittal);
        assert!(submittal.completed);
        assert_eq!(submittal.notes, "sent");
        assert_eq!(job.total_seconds(), 5400);
        assert_eq!(job.revisions.get(RevisionKey::Rev4).time, 0);
    }

    #[test]
    fn submittal_billing_is_dropped() {
        let json = r#"{
            "id": "a1",
            "customer": "Northwind",
            "jobNumber": "7",
            "date": "2024-09-22",
            "revisions": {
                "submittal": { "checked": false, "notes": "", "time": "02:00:00",
                               "isDrafting": true, "draftingRate": 90 }
            }
        }"#;
        let job: Job = serde_json::from_str::<JobRecord>(json)
            .unwrap()
            .normalize()
            .unwrap();
        assert!(job.revisions.get(RevisionKey::Submittal).billing().is_none());
        assert_eq!(job.total_cost(), 0.0);
    }

    #[test]
    fn negative_rate_is_clamped() {
        let json = r#"{
            "customer": "Northwind",
            "jobNumber": "7",
            "date": "2024-09-22",
            "revisions": {
                "rev1": { "time": "01:00:00", "isDrafting": true, "draftingRate": -20 }
            }
        }"#;
        let job = serde_json::from_str::<JobRecord>(json)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(job.revisions.get(RevisionKey::Rev1).drafting_rate(), 0.0);
        assert_eq!(job.total_cost(), 0.0);
    }

    #[test]
    fn completed_alias_and_malformed_time() {
        let json = r#"{
            "customer": "Northwind",
            "jobNumber": "7",
            "date": "2024-09-22T00:00:00.000Z",
            "revisions": { "rev3": { "completed": true, "notes": null, "time": "1:2" } }
        }"#;
        let job = serde_json::from_str::<JobRecord>(json)
            .unwrap()
            .normalize()
            .unwrap();
        let rev3 = job.revisions.get(RevisionKey::Rev3);
        assert!(rev3.completed);
        assert_eq!(rev3.notes, "");
        assert_eq!(rev3.time, 0);
    }

    #[test]
    fn required_fields_are_checked() {
        let base = JobRecord {
            customer: "Northwind".to_string(),
            job_number: "7".to_string(),
            date: "2024-09-22".to_string(),
            ..JobRecord::default()
        };
        assert!(base.normalize().is_ok());

        let missing_customer = JobRecord {
            customer: "  ".to_string(),
            ..base.clone()
        };
        assert_eq!(
            missing_customer.normalize(),
            Err(RecordError::MissingField("customer"))
        );

        let missing_number = JobRecord {
            job_number: String::new(),
            ..base.clone()
        };
        assert_eq!(
            missing_number.normalize(),
            Err(RecordError::MissingField("job number"))
        );

        let bad_date = JobRecord {
            date: "next week".to_string(),
            ..base
        };
        assert_eq!(
            bad_date.normalize(),
            Err(RecordError::InvalidDate("next week".to_string()))
        );
    }

    #[test]
    fn written_records_use_document_shape() {
        let mut job = Job::new("Acme", "J-1", NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        job.revisions.update(RevisionKey::Rev1, |rev| {
            rev.time = 3661;
            rev.set_drafting(true);
            rev.set_drafting_rate(45.5);
        });

        let value = serde_json::to_value(JobRecord::from_job(&job)).unwrap();
        assert_eq!(value["jobNumber"], "J-1");
        assert_eq!(value["date"], "2026-05-01");
        assert!(value.get("_id").is_none());
        assert!(value.get("jobName").is_none());
        assert_eq!(value["revisions"]["rev1"]["time"], "01:01:01");
        assert_eq!(value["revisions"]["rev1"]["isDrafting"], true);
        assert_eq!(value["revisions"]["rev1"]["draftingRate"], 45.5);
        assert_eq!(value["revisions"]["submittal"]["time"], "00:00:00");
        assert!(value["revisions"]["submittal"].get("isDrafting").is_none());
    }

    #[test]
    fn written_record_normalizes_back() {
        let mut job = Job::new("Acme", "J-1", NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        job.id = Some(JobId::new("abc"));
        job.job_name = Some("Tower".to_string());
        job.revisions.update(RevisionKey::Rev2, |rev| {
            rev.completed = true;
            rev.notes = "redlines".to_string();
            rev.time = 4000;
            rev.set_estimating(true);
        });

        let json = serde_json::to_string(&JobRecord::from_job(&job)).unwrap();
        let restored = serde_json::from_str::<JobRecord>(&json)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(restored, job);
    }

    #[test]
    fn unreadable_values_are_skipped() {
        let values: Vec<Value> = serde_json::from_str(
            r#"[
                { "id": "ok", "customer": "Acme", "jobNumber": "1", "date": "2026-01-01" },
                { "id": "bad-ts", "customer": "Acme", "jobNumber": "2", "date": "2026-01-01",
                  "createdAt": "yesterday" },
                { "_id": "bad-customer", "customer": 12, "jobNumber": "3", "date": "2026-01-01" },
                { "id": "no-date", "customer": "Acme", "jobNumber": "4" }
            ]"#,
        )
        .unwrap();
        assert_eq!(value_id(&values[2]), Some(JobId::new("bad-customer")));

        let records = read_records(values);
        assert_eq!(records.len(), 2);
        let jobs = valid_jobs(&records);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, Some(JobId::new("ok")));
    }
}
