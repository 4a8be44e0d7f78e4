use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::cost::format_currency;
use crate::dates::format_display;
use crate::job::{Job, Revision};
use crate::timecode;

pub const REPORT_TITLE: &str = "Drafting Job Report";
const NOTES_WIDTH: usize = 72;
const RULE_WIDTH: usize = 60;
const GENERATED_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

#[derive(Debug, Clone, PartialEq)]
pub struct RevisionLine {
    pub name: &'static str,
    pub completed: bool,
    pub time: Option<String>,
    pub notes: Vec<String>,
    pub drafting: bool,
    pub estimating: bool,
    pub cost: Option<String>,
}

impl RevisionLine {
    pub fn status(&self) -> &'static str {
        if self.completed { "Completed" } else { "Pending" }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub customer: String,
    pub job_name: Option<String>,
    pub job_number: String,
    pub date: String,
    pub revisions: Vec<RevisionLine>,
    pub total_time: String,
    pub total_cost: String,
    pub generated_on: String,
    file_name: String,
}

impl JobReport {
    pub fn build(job: &Job, generated_at: DateTime<Local>) -> Self {
        let revisions = job.revisions.iter().map(revision_line).collect();

        Self {
            customer: job.customer.clone(),
            job_name: job.job_name.clone(),
            job_number: job.job_number.clone(),
            date: format_display(job.date),
            revisions,
            total_time: timecode::encode(job.total_seconds()),
            total_cost: format_currency(job.total_cost()),
            generated_on: generated_at.format(GENERATED_FORMAT).to_string(),
            file_name: file_name(job),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(REPORT_TITLE);
        out.push('\n');
        out.push_str(&"=".repeat(REPORT_TITLE.len()));
        out.push_str("\n\n");

        out.push_str(&format!("Customer: {}\n", self.customer));
        if let Some(name) = &self.job_name {
            out.push_str(&format!("Job Name: {name}\n"));
        }
        out.push_str(&format!("Job Number: {}\n", self.job_number));
        out.push_str(&format!("Date: {}\n\n", self.date));

        out.push_str("Revisions:\n\n");
        for line in &self.revisions {
            let mut row = format!("{:<15} {:<10}", format!("{}:", line.name), line.status());
            if let Some(time) = &line.time {
                row.push_str(&format!("  Time: {time}"));
            }
            if line.drafting {
                row.push_str("  [Drafting");
                if let Some(cost) = &line.cost {
                    row.push(' ');
                    row.push_str(cost);
                }
                row.push(']');
            }
            if line.estimating {
                row.push_str("  [Estimating]");
            }
            out.push_str(row.trim_end());
            out.push('\n');
            for note in &line.notes {
                out.push_str("  ");
                out.push_str(note);
                out.push('\n');
            }
            out.push('\n');
        }

        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');
        out.push_str(&format!("TOTAL TIME: {}\n", self.total_time));
        out.push_str(&format!("TOTAL COST: {}\n\n", self.total_cost));
        out.push_str(&format!("Generated on {}\n", self.generated_on));
        out
    }
}

fn revision_line(revision: &Revision) -> RevisionLine {
    let drafting = revision.is_drafting();
    RevisionLine {
        name: revision.key().name(),
        completed: revision.completed,
        time: (revision.time != 0).then(|| timecode::encode(revision.time)),
        notes: if revision.notes.trim().is_empty() {
            Vec::new()
        } else {
            wrap(&format!("Notes: {}", revision.notes.trim()), NOTES_WIDTH)
        },
        drafting,
        estimating: revision.is_estimating(),
        cost: drafting.then(|| format_currency(revision.cost())),
    }
}

pub fn file_name(job: &Job) -> String {
    let customer = job.customer.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = format!("Job_{}_{}", job.job_number.trim(), customer);
    let stem: String = stem
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\' | ':') { '-' } else { ch })
        .collect();
    format!("{stem}.txt")
}

pub fn export(job: &Job, dir: &Path) -> io::Result<PathBuf> {
    let report = JobReport::build(job, Local::now());
    fs::create_dir_all(dir)?;
    let path = dir.join(report.file_name());
    fs::write(&path, report.render())?;
    tracing::info!(path = %path.display(), "report exported");
    Ok(path)
}

pub fn chip_label(revision: &Revision) -> String {
    let mark = if revision.completed { '✓' } else { '○' };
    let mut label = format!("{}: {}", revision.key().short_name(), mark);
    if revision.time != 0 {
        label.push_str(&format!(" ({})", timecode::encode(revision.time)));
    }
    label
}

pub fn cost_label(revision: &Revision) -> Option<String> {
    (revision.is_drafting() && revision.drafting_rate() > 0.0)
        .then(|| format_currency(revision.cost()))
}

pub fn clipboard_summary(job: &Job) -> String {
    let mut lines = vec![job.title()];
    let mut meta = String::new();
    if job.job_name.is_some() {
        meta.push_str(&format!("Job #{} • ", job.job_number));
    }
    meta.push_str(&format!("Date: {}", format_display(job.date)));
    lines.push(meta);

    for revision in job.active_revisions() {
        let mut line = chip_label(revision);
        if revision.is_drafting() {
            line.push_str(" D");
            if let Some(cost) = cost_label(revision) {
                line.push(' ');
                line.push_str(&cost);
            }
        }
        if revision.is_estimating() {
            line.push_str(" E");
        }
        lines.push(line);
    }

    lines.push(format!(
        "Total: {} · {}",
        timecode::encode(job.total_seconds()),
        format_currency(job.total_cost())
    ));
    lines.join("\n")
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::RevisionKey;
    use chrono::{NaiveDate, TimeZone};

    fn sample() -> Job {
        let mut job = Job::new(
            "Acme  Steel Co",
            "J-100",
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        );
        job.revisions.update(RevisionKey::Submittal, |rev| {
            rev.completed = true;
            rev.time = 30 * 60;
            rev.notes = "Sent to engineer".to_string();
        });
        job.revisions.update(RevisionKey::Rev1, |rev| {
            rev.time = 3600;
            rev.set_drafting(true);
            rev.set_drafting_rate(40.0);
            rev.set_estimating(true);
        });
        job
    }

    fn generated() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 3, 14, 5, 9).unwrap()
    }

    #[test]
    fn totals_and_file_name() {
        let report = JobReport::build(&sample(), generated());
        assert_eq!(report.total_time, "01:30:00");
        assert_eq!(report.total_cost, "$40.00");
        assert_eq!(report.date, "03/02/2026");
        assert_eq!(report.file_name(), "Job_J-100_Acme_Steel_Co.txt");
        assert_eq!(report.generated_on, "03/03/2026, 02:05:09 PM");
    }

    #[test]
    fn inactive_revisions_are_still_listed() {
        let report = JobReport::build(&sample(), generated());
        let names: Vec<&str> = report.revisions.iter().map(|line| line.name).collect();
        assert_eq!(
            names,
            vec![
                "Submittal",
                "1st Revision",
                "2nd Revision",
                "3rd Revision",
                "4th Revision"
            ]
        );
        let rev2 = &report.revisions[2];
        assert_eq!(rev2.status(), "Pending");
        assert_eq!(rev2.time, None);
        assert_eq!(rev2.cost, None);
    }

    #[test]
    fn rendered_text_has_sections() {
        let text = JobReport::build(&sample(), generated()).render();
        assert!(text.starts_with("Drafting Job Report\n"));
        assert!(text.contains("Customer: Acme  Steel Co\n"));
        assert!(text.contains("Job Number: J-100\n"));
        assert!(text.contains("Time: 00:30:00"));
        assert!(text.contains("  Notes: Sent to engineer\n"));
        assert!(text.contains("[Drafting $40.00]  [Estimating]"));
        assert!(text.contains("TOTAL TIME: 01:30:00\n"));
        assert!(text.contains("TOTAL COST: $40.00\n"));
        assert!(text.contains("Generated on 03/03/2026, 02:05:09 PM"));
        assert!(!text.contains("Job Name:"));
    }

    #[test]
    fn long_notes_wrap() {
        let lines = wrap(&"word ".repeat(40), 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= 20));
        assert_eq!(wrap("   ", 20), Vec::<String>::new());
    }

    #[test]
    fn file_name_strips_path_separators() {
        let job = Job::new("A/B Corp", "7:1", NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(file_name(&job), "Job_7-1_A-B_Corp.txt");
    }

    #[test]
    fn export_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = export(&sample(), &dir.path().join("reports")).unwrap();
        assert!(path.ends_with("Job_J-100_Acme_Steel_Co.txt"));
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("TOTAL TIME: 01:30:00"));
    }

    #[test]
    fn clipboard_summary_lists_active_revisions() {
        let summary = clipboard_summary(&sample());
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Acme  Steel Co - Job #J-100");
        assert_eq!(lines[1], "Date: 03/02/2026");
        assert_eq!(lines[2], "Submittal: ✓ (00:30:00)");
        assert_eq!(lines[3], "1st Rev: ○ (01:00:00) D $40.00 E");
        assert_eq!(lines[4], "Total: 01:30:00 · $40.00");
        assert_eq!(lines.len(), 5);
    }
}
