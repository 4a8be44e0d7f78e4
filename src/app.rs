use arboard::Clipboard;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};

use crate::form::JobForm;
use crate::job::{Job, JobId};
use crate::report;
use crate::settings::{self, Settings, ThemePreference};
use crate::store::{JobStore, StoreError};

const TOAST_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Loading,
    Dashboard,
    Form,
    ConfirmDelete,
    Error,
}

pub struct App {
    pub should_quit: bool,
    pub needs_refresh: bool,
    pub mode: Mode,
    pub status: Option<String>,
    pub jobs: Vec<Job>,
    pub job_state: ListState,
    pub form: Option<JobForm>,
    pub pending_delete: Option<JobId>,
    pub theme: ThemePreference,
    pub last_refresh: Option<DateTime<Local>>,
    pub show_help: bool,
    store: Box<dyn JobStore>,
    settings: Settings,
    toast: Option<Toast>,
}

impl App {
    pub fn new(store: Box<dyn JobStore>, settings: Settings) -> Self {
        let mut job_state = ListState::default();
        job_state.select(Some(0));

        App {
            should_quit: false,
            needs_refresh: true,
            mode: Mode::Loading,
            status: None,
            jobs: Vec::new(),
            job_state,
            form: None,
            pending_delete: None,
            theme: settings.theme,
            last_refresh: None,
            show_help: false,
            store,
            settings,
            toast: None,
        }
    }

    pub fn store_label(&self) -> String {
        self.store.describe()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Form => self.handle_form_input(key),
            Mode::ConfirmDelete => self.handle_confirm_input(key),
            Mode::Dashboard | Mode::Loading | Mode::Error => self.handle_dashboard_input(key),
        }
    }

    pub fn refresh_data(&mut self) {
        self.needs_refresh = false;
        self.status = None;

        let jobs = match self.store.list() {
            Ok(jobs) => jobs,
            Err(err) => {
                self.handle_error(err);
                return;
            }
        };

        self.jobs = jobs;
        self.clamp_selection();
        self.last_refresh = Some(Local::now());
        self.mode = Mode::Dashboard;
        tracing::debug!(count = self.jobs.len(), "jobs loaded");
    }

    fn handle_error(&mut self, err: StoreError) {
        tracing::error!("job store error: {err}");
        let message = err.user_message();
        if self.mode == Mode::Loading {
            self.mode = Mode::Error;
        }
        self.set_toast(message.clone(), true);
        self.status = Some(message);
    }

    fn handle_dashboard_input(&mut self, key: KeyEvent) {
        if self.show_help {
            match key.code {
                KeyCode::Char('h') | KeyCode::Esc => {
                    self.show_help = false;
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.trigger_refresh(),
            KeyCode::Char('h') => self.show_help = true,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('n') => self.open_new_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('d') => self.confirm_delete(),
            KeyCode::Char('x') => self.export_selected(),
            KeyCode::Char('y') => self.copy_selected(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous_job(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next_job(),
            _ => {}
        }
    }

    fn handle_form_input(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('s') = key.code {
                self.save_form();
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.close_form(),
            _ => {
                if let Some(form) = self.form.as_mut() {
                    form.handle_key(key);
                }
            }
        }
    }

    fn handle_confirm_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => self.delete_pending(),
            KeyCode::Char('n') | KeyCode::Esc => {
                self.pending_delete = None;
                self.mode = Mode::Dashboard;
            }
            _ => {}
        }
    }

    fn trigger_refresh(&mut self) {
        self.mode = Mode::Loading;
        self.needs_refresh = true;
    }

    fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.settings.theme = self.theme;
        if let Err(err) = settings::save(&self.settings) {
            tracing::warn!("failed to save theme: {err}");
            self.status = Some(format!("Failed to save theme: {err}"));
            return;
        }
        self.set_toast(format!("Theme: {}", self.theme.label()), false);
    }

    fn open_new_form(&mut self) {
        self.form = Some(JobForm::create(self.settings.drafting_rate()));
        self.mode = Mode::Form;
        self.status = None;
    }

    fn open_edit_form(&mut self) {
        let Some(job) = self.current_job() else {
            self.set_toast("No job selected.", true);
            return;
        };
        self.form = Some(JobForm::edit(job, self.settings.drafting_rate()));
        self.mode = Mode::Form;
        self.status = None;
    }

    fn close_form(&mut self) {
        self.form = None;
        self.mode = Mode::Dashboard;
        self.status = None;
    }

    fn save_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let job = match form.submit() {
            Ok(job) => job,
            Err(message) => {
                self.set_toast(message.clone(), true);
                self.status = Some(message);
                return;
            }
        };

        let result = match form.editing().cloned() {
            Some(id) => self.store.update(&id, &job),
            None => self.store.create(&job),
        };

        match result {
            Ok(saved) => {
                let message = if form.is_new() {
                    "Job saved successfully!"
                } else {
                    "Job updated successfully!"
                };
                self.upsert_job(saved);
                self.form = None;
                self.mode = Mode::Dashboard;
                self.status = None;
                self.set_toast(message, false);
            }
            Err(err) => self.handle_error(err),
        }
    }

    fn upsert_job(&mut self, job: Job) {
        let existing = self
            .jobs
            .iter()
            .position(|candidate| candidate.id.is_some() && candidate.id == job.id);
        let index = match existing {
            Some(index) => {
                self.jobs[index] = job;
                index
            }
            None => {
                self.jobs.insert(0, job);
                0
            }
        };
        self.job_state.select(Some(index));
    }

    fn confirm_delete(&mut self) {
        let Some(id) = self.current_job().and_then(|job| job.id.clone()) else {
            self.set_toast("No job selected.", true);
            return;
        };
        self.pending_delete = Some(id);
        self.mode = Mode::ConfirmDelete;
    }

    fn delete_pending(&mut self) {
        self.mode = Mode::Dashboard;
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        match self.store.delete(&id) {
            Ok(()) => {
                self.jobs.retain(|job| job.id.as_ref() != Some(&id));
                self.clamp_selection();
                self.set_toast("Job deleted successfully!", false);
            }
            Err(err) => self.handle_error(err),
        }
    }

    fn export_selected(&mut self) {
        let Some(job) = self.current_job() else {
            self.set_toast("No job selected.", true);
            return;
        };
        match report::export(job, &self.settings.export_dir()) {
            Ok(path) => {
                let message = format!("Report saved to {}", path.display());
                self.status = Some(message.clone());
                self.set_toast(message, false);
            }
            Err(err) => {
                let message = format!("Failed to export report: {err}");
                tracing::error!("{message}");
                self.status = Some(message.clone());
                self.set_toast(message, true);
            }
        }
    }

    fn copy_selected(&mut self) {
        let Some(job) = self.current_job() else {
            self.set_toast("No job selected.", true);
            return;
        };
        let text = report::clipboard_summary(job);
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(_) => {
                self.status = Some("Copied job summary to clipboard.".to_string());
                self.set_toast("Copied job summary to clipboard.", false);
            }
            Err(err) => {
                let message = format!("Clipboard error: {err}");
                self.status = Some(message.clone());
                self.set_toast(message, true);
            }
        }
    }

    fn clamp_selection(&mut self) {
        if self.jobs.is_empty() {
            self.job_state.select(Some(0));
            return;
        }
        match self.job_state.selected() {
            Some(selected) if selected < self.jobs.len() => {}
            Some(_) => self.job_state.select(Some(self.jobs.len() - 1)),
            None => self.job_state.select(Some(0)),
        }
    }

    fn select_previous_job(&mut self) {
        if self.jobs.is_empty() {
            return;
        }
        let selected = self.job_state.selected().unwrap_or(0);
        let new_index = if selected == 0 {
            self.jobs.len() - 1
        } else {
            selected - 1
        };
        self.job_state.select(Some(new_index));
    }

    fn select_next_job(&mut self) {
        if self.jobs.is_empty() {
            return;
        }
        let selected = self.job_state.selected().unwrap_or(0);
        let new_index = if selected + 1 >= self.jobs.len() {
            0
        } else {
            selected + 1
        };
        self.job_state.select(Some(new_index));
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.job_state
            .selected()
            .and_then(|index| self.jobs.get(index))
    }

    pub fn pending_delete_title(&self) -> Option<String> {
        let id = self.pending_delete.as_ref()?;
        self.jobs
            .iter()
            .find(|job| job.id.as_ref() == Some(id))
            .map(Job::title)
    }

    pub fn active_toast(&mut self) -> Option<ToastView> {
        let toast = self.toast.as_ref()?;
        if toast.created_at.elapsed() > TOAST_TTL {
            self.toast = None;
            return None;
        }
        Some(ToastView {
            message: toast.message.clone(),
            is_error: toast.is_error,
        })
    }

    fn set_toast(&mut self, message: impl Into<String>, is_error: bool) {
        self.toast = Some(Toast {
            message: message.into(),
            created_at: Instant::now(),
            is_error,
        });
    }
}

struct Toast {
    message: String,
    created_at: Instant,
    is_error: bool,
}

pub struct ToastView {
    pub message: String,
    pub is_error: bool,
}
