use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKey {
    Submittal,
    Rev1,
    Rev2,
    Rev3,
    Rev4,
}

impl RevisionKey {
    pub const ALL: [RevisionKey; 5] = [
        RevisionKey::Submittal,
        RevisionKey::Rev1,
        RevisionKey::Rev2,
        RevisionKey::Rev3,
        RevisionKey::Rev4,
    ];

    pub fn index(self) -> usize {
        match self {
            RevisionKey::Submittal => 0,
            RevisionKey::Rev1 => 1,
            RevisionKey::Rev2 => 2,
            RevisionKey::Rev3 => 3,
            RevisionKey::Rev4 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RevisionKey::Submittal => "submittal",
            RevisionKey::Rev1 => "rev1",
            RevisionKey::Rev2 => "rev2",
            RevisionKey::Rev3 => "rev3",
            RevisionKey::Rev4 => "rev4",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RevisionKey::Submittal => "Submittal",
            RevisionKey::Rev1 => "1st Revision",
            RevisionKey::Rev2 => "2nd Revision",
            RevisionKey::Rev3 => "3rd Revision",
            RevisionKey::Rev4 => "4th Revision",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            RevisionKey::Submittal => "Submittal",
            RevisionKey::Rev1 => "1st Rev",
            RevisionKey::Rev2 => "2nd Rev",
            RevisionKey::Rev3 => "3rd Rev",
            RevisionKey::Rev4 => "4th Rev",
        }
    }

    pub fn is_billable(self) -> bool {
        self != RevisionKey::Submittal
    }
}

impl fmt::Display for RevisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Billing {
    pub is_drafting: bool,
    pub is_estimating: bool,
    pub drafting_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    key: RevisionKey,
    pub completed: bool,
    pub notes: String,
    pub time: u64,
    billing: Option<Billing>,
}

impl Revision {
    pub fn new(key: RevisionKey) -> Self {
        Self {
            key,
            completed: false,
            notes: String::new(),
            time: 0,
            billing: key.is_billable().then(Billing::default),
        }
    }

    pub fn key(&self) -> RevisionKey {
        self.key
    }

    pub fn billing(&self) -> Option<&Billing> {
        self.billing.as_ref()
    }

    pub fn is_drafting(&self) -> bool {
        self.billing.is_some_and(|billing| billing.is_drafting)
    }

    pub fn is_estimating(&self) -> bool {
        self.billing.is_some_and(|billing| billing.is_estimating)
    }

    pub fn drafting_rate(&self) -> f64 {
        self.billing.map(|billing| billing.drafting_rate).unwrap_or(0.0)
    }

    // Billing setters do nothing on the submittal.

    pub fn set_drafting(&mut self, value: bool) {
        if let Some(billing) = self.billing.as_mut() {
            billing.is_drafting = value;
        }
    }

    pub fn set_estimating(&mut self, value: bool) {
        if let Some(billing) = self.billing.as_mut() {
            billing.is_estimating = value;
        }
    }

    pub fn set_drafting_rate(&mut self, rate: f64) {
        if let Some(billing) = self.billing.as_mut() {
            billing.drafting_rate = if rate.is_finite() && rate > 0.0 {
                rate
            } else {
                0.0
            };
        }
    }

    pub fn set_billing(&mut self, value: Billing) {
        if self.billing.is_some() {
            self.billing = Some(value);
            self.set_drafting_rate(value.drafting_rate);
        }
    }

    pub fn cost(&self) -> f64 {
        if !self.is_drafting() {
            return 0.0;
        }
        cost::cost(self.time, self.drafting_rate())
    }

    pub fn is_active(&self) -> bool {
        self.completed || !self.notes.is_empty() || self.time != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Revisions {
    entries: [Revision; 5],
}

impl Default for Revisions {
    fn default() -> Self {
        Self {
            entries: RevisionKey::ALL.map(Revision::new),
        }
    }
}

impl Revisions {
    pub fn get(&self, key: RevisionKey) -> &Revision {
        &self.entries[key.index()]
    }

    pub fn update<F>(&mut self, key: RevisionKey, edit: F)
    where
        F: FnOnce(&mut Revision),
    {
        let revision = &mut self.entries[key.index()];
        edit(revision);
        if !key.is_billable() {
            revision.billing = None;
        } else if revision.billing.is_none() {
            revision.billing = Some(Billing::default());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.entries.iter()
    }

    pub fn total_seconds(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |total, revision| total.saturating_add(revision.time))
    }

    pub fn total_cost(&self) -> f64 {
        self.entries.iter().map(Revision::cost).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Option<JobId>,
    pub customer: String,
    pub job_name: Option<String>,
    pub job_number: String,
    pub date: NaiveDate,
    pub revisions: Revisions,
}

impl Job {
    pub fn new(customer: impl Into<String>, job_number: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: None,
            customer: customer.into(),
            job_name: None,
            job_number: job_number.into(),
            date,
            revisions: Revisions::default(),
        }
    }

    pub fn title(&self) -> String {
        match self.job_name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => format!("{} - {}", self.customer, name),
            None => format!("{} - Job #{}", self.customer, self.job_number),
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.revisions.total_seconds()
    }

    pub fn total_cost(&self) -> f64 {
        self.revisions.total_cost()
    }

    pub fn active_revisions(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.iter().filter(|revision| revision.is_active())
    }
}
