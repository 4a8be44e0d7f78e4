use crossterm::event::{KeyCode, KeyEvent};

use crate::cost::{self, parse_rate};
use crate::dates::{format_iso, parse_date, today};
use crate::job::{Billing, Job, JobId, Revision, RevisionKey};
use crate::stopwatch::{Clock, Stopwatch, SystemClock};

pub const REQUIRED_FIELDS_MESSAGE: &str =
    "Please fill in all required fields (Customer, Job #, and Date)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Customer,
    JobName,
    JobNumber,
    Date,
}

impl HeaderField {
    pub const ALL: [HeaderField; 4] = [
        HeaderField::Customer,
        HeaderField::JobName,
        HeaderField::JobNumber,
        HeaderField::Date,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HeaderField::Customer => "Customer *",
            HeaderField::JobName => "Job Name",
            HeaderField::JobNumber => "Job # *",
            HeaderField::Date => "Date *",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Completed,
    Notes,
    Timer,
    Drafting,
    Estimating,
    Rate,
}

impl RowField {
    fn is_text(self) -> bool {
        matches!(self, RowField::Notes | RowField::Rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Header(HeaderField),
    Row(RevisionKey, RowField),
}

impl Focus {
    pub fn is_text(self) -> bool {
        match self {
            Focus::Header(_) => true,
            Focus::Row(_, field) => field.is_text(),
        }
    }
}

pub struct RevisionRow<C: Clock = SystemClock> {
    key: RevisionKey,
    pub completed: bool,
    pub notes: String,
    stopwatch: Stopwatch<C>,
    billing: Option<Billing>,
    rate_input: String,
}

impl<C: Clock> RevisionRow<C> {
    fn hydrate(revision: &Revision, clock: C) -> Self {
        let mut stopwatch = Stopwatch::with_clock(clock);
        stopwatch.set_time(revision.time);
        let billing = revision.billing().copied();
        Self {
            key: revision.key(),
            completed: revision.completed,
            notes: revision.notes.clone(),
            stopwatch,
            billing,
            rate_input: billing
                .map(|billing| format_rate(billing.drafting_rate))
                .unwrap_or_default(),
        }
    }

    pub fn key(&self) -> RevisionKey {
        self.key
    }

    pub fn stopwatch(&self) -> &Stopwatch<C> {
        &self.stopwatch
    }

    pub fn is_billable(&self) -> bool {
        self.billing.is_some()
    }

    pub fn is_drafting(&self) -> bool {
        self.billing.is_some_and(|billing| billing.is_drafting)
    }

    pub fn is_estimating(&self) -> bool {
        self.billing.is_some_and(|billing| billing.is_estimating)
    }

    pub fn rate_input(&self) -> &str {
        &self.rate_input
    }

    pub fn rate(&self) -> f64 {
        parse_rate(&self.rate_input)
    }

    pub fn live_cost(&self) -> f64 {
        if !self.is_drafting() {
            return 0.0;
        }
        cost::cost(self.stopwatch.elapsed_seconds(), self.rate())
    }

    pub fn fields(&self) -> Vec<RowField> {
        let mut fields = vec![RowField::Completed, RowField::Notes, RowField::Timer];
        if self.is_billable() {
            fields.push(RowField::Drafting);
            fields.push(RowField::Estimating);
            if self.is_drafting() {
                fields.push(RowField::Rate);
            }
        }
        fields
    }

    fn toggle_drafting(&mut self, default_rate: f64) {
        let Some(billing) = self.billing.as_mut() else {
            return;
        };
        billing.is_drafting = !billing.is_drafting;
        if billing.is_drafting && parse_rate(&self.rate_input) == 0.0 && default_rate > 0.0 {
            self.rate_input = format_rate(default_rate);
        }
    }

    fn toggle_estimating(&mut self) {
        if let Some(billing) = self.billing.as_mut() {
            billing.is_estimating = !billing.is_estimating;
        }
    }

    fn apply_to(&self, revision: &mut Revision) {
        revision.completed = self.completed;
        revision.notes = self.notes.clone();
        revision.time = self.stopwatch.committed_seconds();
        if let Some(billing) = self.billing {
            revision.set_drafting(billing.is_drafting);
            revision.set_estimating(billing.is_estimating);
            revision.set_drafting_rate(self.rate());
        }
    }
}

pub struct JobForm<C: Clock + Clone = SystemClock> {
    editing: Option<JobId>,
    pub customer: String,
    pub job_name: String,
    pub job_number: String,
    pub date: String,
    rows: Vec<RevisionRow<C>>,
    focus: Focus,
    default_rate: f64,
}

impl JobForm<SystemClock> {
    pub fn create(default_rate: f64) -> Self {
        Self::create_with_clock(default_rate, SystemClock)
    }

    pub fn edit(job: &Job, default_rate: f64) -> Self {
        Self::edit_with_clock(job, default_rate, SystemClock)
    }
}

impl<C: Clock + Clone> JobForm<C> {
    pub fn create_with_clock(default_rate: f64, clock: C) -> Self {
        Self::edit_with_clock(&Job::new("", "", today()), default_rate, clock)
    }

    pub fn edit_with_clock(job: &Job, default_rate: f64, clock: C) -> Self {
        let rows = RevisionKey::ALL
            .into_iter()
            .map(|key| RevisionRow::hydrate(job.revisions.get(key), clock.clone()))
            .collect();

        Self {
            editing: job.id.clone(),
            customer: job.customer.clone(),
            job_name: job.job_name.clone().unwrap_or_default(),
            job_number: job.job_number.clone(),
            date: format_iso(job.date),
            rows,
            focus: Focus::Header(HeaderField::Customer),
            default_rate,
        }
    }

    pub fn editing(&self) -> Option<&JobId> {
        self.editing.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.editing.is_none()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn rows(&self) -> &[RevisionRow<C>] {
        &self.rows
    }

    pub fn header_value(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::Customer => &self.customer,
            HeaderField::JobName => &self.job_name,
            HeaderField::JobNumber => &self.job_number,
            HeaderField::Date => &self.date,
        }
    }

    pub fn any_running(&self) -> bool {
        self.rows.iter().any(|row| row.stopwatch.is_running())
    }

    pub fn live_total_seconds(&self) -> u64 {
        self.rows
            .iter()
            .fold(0u64, |total, row| total.saturating_add(row.stopwatch.elapsed_seconds()))
    }

    pub fn live_total_cost(&self) -> f64 {
        self.rows.iter().map(RevisionRow::live_cost).sum()
    }

    fn row_mut(&mut self, key: RevisionKey) -> &mut RevisionRow<C> {
        &mut self.rows[key.index()]
    }

    fn focus_stops(&self) -> Vec<Focus> {
        let mut stops: Vec<Focus> = HeaderField::ALL.into_iter().map(Focus::Header).collect();
        for row in &self.rows {
            stops.extend(row.fields().into_iter().map(|field| Focus::Row(row.key, field)));
        }
        stops
    }

    pub fn focus_next(&mut self) {
        let stops = self.focus_stops();
        let index = stops.iter().position(|stop| *stop == self.focus).unwrap_or(0);
        self.focus = stops[(index + 1) % stops.len()];
    }

    pub fn focus_previous(&mut self) {
        let stops = self.focus_stops();
        let index = stops.iter().position(|stop| *stop == self.focus).unwrap_or(0);
        self.focus = stops[(index + stops.len() - 1) % stops.len()];
    }

    fn focus_row(&mut self, forward: bool) {
        let Focus::Row(key, field) = self.focus else {
            if forward {
                self.focus = Focus::Row(RevisionKey::Submittal, RowField::Completed);
            }
            return;
        };
        let index = key.index();
        let target = if forward {
            RevisionKey::ALL.get(index + 1)
        } else {
            index.checked_sub(1).and_then(|prev| RevisionKey::ALL.get(prev))
        };
        match target {
            Some(next) => {
                let fields = self.rows[next.index()].fields();
                let field = if fields.contains(&field) {
                    field
                } else {
                    RowField::Timer
                };
                self.focus = Focus::Row(*next, field);
            }
            None if !forward => self.focus = Focus::Header(HeaderField::Date),
            None => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::PageDown => self.focus_row(true),
            KeyCode::PageUp => self.focus_row(false),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Enter if matches!(self.focus, Focus::Row(_, RowField::Notes)) => {
                self.type_char('\n');
            }
            KeyCode::Enter | KeyCode::Char(' ') if !self.focus.is_text() => self.toggle(),
            KeyCode::Char(ch) if self.focus.is_text() => self.type_char(ch),
            KeyCode::Char('s') => self.start_focused(),
            KeyCode::Char('p') => self.stop_focused(),
            KeyCode::Char('0') => self.reset_focused(),
            _ => {}
        }
    }

    fn type_char(&mut self, ch: char) {
        if ch.is_control() && ch != '\n' {
            return;
        }
        match self.focus {
            Focus::Header(HeaderField::Customer) => self.customer.push(ch),
            Focus::Header(HeaderField::JobName) => self.job_name.push(ch),
            Focus::Header(HeaderField::JobNumber) => self.job_number.push(ch),
            Focus::Header(HeaderField::Date) => self.date.push(ch),
            Focus::Row(key, RowField::Notes) => self.row_mut(key).notes.push(ch),
            Focus::Row(key, RowField::Rate) => {
                if ch.is_ascii_digit() || ch == '.' {
                    self.row_mut(key).rate_input.push(ch);
                }
            }
            Focus::Row(..) => {}
        }
    }

    fn backspace(&mut self) {
        match self.focus {
            Focus::Header(HeaderField::Customer) => {
                self.customer.pop();
            }
            Focus::Header(HeaderField::JobName) => {
                self.job_name.pop();
            }
            Focus::Header(HeaderField::JobNumber) => {
                self.job_number.pop();
            }
            Focus::Header(HeaderField::Date) => {
                self.date.pop();
            }
            Focus::Row(key, RowField::Notes) => {
                self.row_mut(key).notes.pop();
            }
            Focus::Row(key, RowField::Rate) => {
                self.row_mut(key).rate_input.pop();
            }
            Focus::Row(..) => {}
        }
    }

    fn toggle(&mut self) {
        let Focus::Row(key, field) = self.focus else {
            return;
        };
        let default_rate = self.default_rate;
        let row = self.row_mut(key);
        match field {
            RowField::Completed => row.completed = !row.completed,
            RowField::Drafting => row.toggle_drafting(default_rate),
            RowField::Estimating => row.toggle_estimating(),
            RowField::Timer => {
                if row.stopwatch.is_running() {
                    row.stopwatch.stop();
                } else {
                    row.stopwatch.start();
                }
            }
            RowField::Notes | RowField::Rate => {}
        }
    }

    fn start_focused(&mut self) {
        if let Focus::Row(key, _) = self.focus {
            if self.row_mut(key).stopwatch.start() {
                tracing::debug!(revision = %key, "stopwatch started");
            }
        }
    }

    fn stop_focused(&mut self) {
        if let Focus::Row(key, _) = self.focus {
            if self.row_mut(key).stopwatch.stop() {
                tracing::debug!(revision = %key, "stopwatch stopped");
            }
        }
    }

    fn reset_focused(&mut self) {
        if let Focus::Row(key, _) = self.focus {
            self.row_mut(key).stopwatch.reset();
        }
    }

    pub fn submit(&mut self) -> Result<Job, String> {
        if self.customer.trim().is_empty()
            || self.job_number.trim().is_empty()
            || self.date.trim().is_empty()
        {
            return Err(REQUIRED_FIELDS_MESSAGE.to_string());
        }
        let date = parse_date(self.date.trim())?;

        for row in &mut self.rows {
            row.stopwatch.stop();
        }

        let mut job = Job::new(self.customer.trim(), self.job_number.trim(), date);
        job.id = self.editing.clone();
        let job_name = self.job_name.trim();
        job.job_name = (!job_name.is_empty()).then(|| job_name.to_string());
        for row in &self.rows {
            job.revisions.update(row.key, |revision| row.apply_to(revision));
        }
        Ok(job)
    }
}

fn format_rate(rate: f64) -> String {
    if rate > 0.0 {
        format!("{rate}")
    } else {
        String::new()
    }
}
