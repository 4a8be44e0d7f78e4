use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap,
};

use crate::app::{App, Mode};
use crate::cost::format_currency;
use crate::dates::format_display;
use crate::form::{Focus, HeaderField, JobForm, RevisionRow, RowField};
use crate::job::Job;
use crate::report::{chip_label, cost_label};
use crate::settings::ThemePreference;
use crate::stopwatch::StopwatchState;
use crate::timecode;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let theme = theme_from(app.theme);
    draw_background(frame, size, &theme);
    draw_dashboard(frame, app, size, &theme);

    match app.mode {
        Mode::Loading => draw_overlay(frame, size, "Loading jobs...", &theme),
        Mode::Error => draw_overlay(
            frame,
            size,
            app.status.as_deref().unwrap_or("Unknown error"),
            &theme,
        ),
        Mode::Form => {
            if let Some(form) = &app.form {
                draw_form(frame, form, app.status.as_deref(), size, &theme);
            }
        }
        Mode::ConfirmDelete => draw_confirm_delete(frame, app, size, &theme),
        Mode::Dashboard => {}
    }

    if !app.show_help {
        if let Some(toast) = app.active_toast() {
            draw_toast(frame, size, &toast.message, toast.is_error, &theme);
        }
    }

    if app.show_help {
        draw_help(frame, size, &theme);
    }
}

fn draw_dashboard(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let content = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)])
        .split(content);

    let header = header_line(app, theme);
    let header_block = Paragraph::new(header)
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        );
    frame.render_widget(header_block, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    let job_items: Vec<ListItem> = if app.jobs.is_empty() {
        vec![
            ListItem::new(Line::from(Span::styled(
                "No jobs yet. Press n to add one.",
                theme.muted_style(),
            )))
            .style(theme.panel_style()),
        ]
    } else {
        app.jobs
            .iter()
            .map(|job| {
                let line = Line::from(vec![
                    Span::styled(job.title(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", format_display(job.date)), theme.muted_style()),
                    Span::styled(
                        format!("  {}", timecode::encode(job.total_seconds())),
                        theme.muted_style(),
                    ),
                ]);
                ListItem::new(line).style(theme.panel_style())
            })
            .collect()
    };

    let highlight = Style::default()
        .bg(theme.accent)
        .fg(theme.accent_contrast())
        .add_modifier(Modifier::BOLD);

    let job_list = List::new(job_items)
        .block(panel_block("Jobs", theme))
        .highlight_style(highlight)
        .highlight_symbol("▍ ");

    frame.render_stateful_widget(job_list, body[0], &mut app.job_state);

    let card_lines = match app.current_job() {
        Some(job) => job_card_lines(job, theme),
        None => vec![Line::from(Span::styled("No job selected", theme.muted_style()))],
    };
    let card = Paragraph::new(card_lines)
        .block(panel_block("Job", theme))
        .wrap(Wrap { trim: false });
    frame.render_widget(card, body[1]);

    let footer = footer_line(app, theme);
    let footer_block = Paragraph::new(footer)
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        );
    frame.render_widget(footer_block, chunks[2]);
}

fn job_card_lines(job: &Job, theme: &Theme) -> Vec<Line<'static>> {
    let mut meta = String::new();
    if job.job_name.is_some() {
        meta.push_str(&format!("Job #{} • ", job.job_number));
    }
    meta.push_str(&format!("Date: {}", format_display(job.date)));

    let mut lines = vec![
        Line::from(Span::styled(job.title(), theme.title_style())),
        Line::from(Span::styled(meta, theme.muted_style())),
        Line::from(""),
    ];

    let mut active = job.active_revisions().peekable();
    if active.peek().is_none() {
        lines.push(Line::from(Span::styled(
            "No revision activity yet.",
            theme.muted_style(),
        )));
    }
    for revision in active {
        let chip_style = if revision.completed {
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
        };
        let mut spans = vec![Span::styled(chip_label(revision), chip_style)];
        if revision.is_drafting() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled("D", Style::default().fg(theme.accent)));
            if let Some(cost) = cost_label(revision) {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(cost, Style::default().fg(theme.success)));
            }
        }
        if revision.is_estimating() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled("E", Style::default().fg(theme.estimate)));
        }
        lines.push(Line::from(spans));
        if !revision.notes.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    {}", revision.notes.replace('\n', " ")),
                theme.muted_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Total time", theme.muted_style()),
        Span::raw(": "),
        Span::styled(
            timecode::encode(job.total_seconds()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("Total cost", theme.muted_style()),
        Span::raw(": "),
        Span::styled(
            format_currency(job.total_cost()),
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
        ),
    ]));
    lines
}

fn header_line(app: &App, theme: &Theme) -> Line<'static> {
    let last_refresh = app
        .last_refresh
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "Never".to_string());
    Line::from(vec![
        Span::styled("Draft Jobs", theme.title_style()),
        Span::raw("  "),
        Span::styled("Store", theme.muted_style()),
        Span::raw(": "),
        Span::styled(app.store_label(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("Jobs", theme.muted_style()),
        Span::raw(": "),
        Span::raw(app.jobs.len().to_string()),
        Span::raw("  "),
        Span::styled("Last refresh", theme.muted_style()),
        Span::raw(": "),
        Span::raw(last_refresh),
    ])
}

fn footer_line(app: &App, theme: &Theme) -> Line<'static> {
    let status = app.status.clone().unwrap_or_default();
    Line::from(vec![
        Span::styled("n new", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("e edit", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("d delete", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("x export", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("y copy", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("h help", theme.muted_style()),
        Span::raw(" · "),
        Span::styled("q quit", theme.muted_style()),
        if status.is_empty() {
            Span::raw("")
        } else {
            Span::raw(format!("   |   {}", status))
        },
    ])
}

fn draw_form(frame: &mut Frame, form: &JobForm, status: Option<&str>, area: Rect, theme: &Theme) {
    let block = centered_rect(90, 90, area);
    frame.render_widget(Clear, block);

    let title = if form.is_new() { "New Job" } else { "Edit Job" };
    let outer = panel_block(title, theme);
    let inner = outer.inner(block);
    frame.render_widget(outer, block);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(inner);

    let focus = form.focus();
    let focused_style = Style::default()
        .bg(theme.accent)
        .fg(theme.accent_contrast())
        .add_modifier(Modifier::BOLD);
    let field_style = |target: Focus| {
        if focus == target {
            focused_style
        } else {
            Style::default()
        }
    };

    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0usize;

    for field in HeaderField::ALL {
        if focus == Focus::Header(field) {
            focus_line = lines.len();
        }
        let value = form.header_value(field);
        let shown = if value.is_empty() && focus != Focus::Header(field) {
            "—".to_string()
        } else {
            value.to_string()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<12}", field.label()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(shown, field_style(Focus::Header(field))),
        ]));
    }

    for row in form.rows() {
        lines.push(Line::from(""));
        if matches!(focus, Focus::Row(key, _) if key == row.key()) {
            focus_line = lines.len();
        }
        lines.push(revision_line(row, &field_style, theme));

        let notes = if row.notes.is_empty() && focus != Focus::Row(row.key(), RowField::Notes) {
            Span::styled(
                format!("Enter notes for {}...", row.key().name().to_lowercase()),
                theme.muted_style(),
            )
        } else {
            Span::styled(
                row.notes.replace('\n', " ⏎ "),
                field_style(Focus::Row(row.key(), RowField::Notes)),
            )
        };
        lines.push(Line::from(vec![
            Span::styled("    Notes: ", theme.muted_style()),
            notes,
        ]));
    }

    let visible = sections[0].height.saturating_sub(1) as usize;
    let scroll = focus_line.saturating_sub(visible.saturating_sub(3));
    let body = Paragraph::new(lines)
        .style(theme.panel_style())
        .scroll((scroll as u16, 0));
    frame.render_widget(body, sections[0]);

    let running = if form.any_running() {
        Span::styled(
            "  ● stopwatch running, saving will stop it",
            Style::default().fg(theme.error),
        )
    } else {
        Span::raw("")
    };
    let mut hint_lines = vec![
        Line::from(vec![
            Span::styled("Total", theme.muted_style()),
            Span::raw(": "),
            Span::styled(
                timecode::encode(form.live_total_seconds()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format_currency(form.live_total_cost()),
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
            ),
            running,
        ]),
        Line::from(Span::styled(
            "Tab/↑↓ move · PgUp/PgDn row · Space toggle · s start · p stop · 0 reset · Ctrl+S save · Esc cancel",
            theme.muted_style(),
        )),
    ];
    if let Some(status) = status {
        hint_lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(theme.error),
        )));
    }
    let hint = Paragraph::new(hint_lines)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(hint, sections[1]);
}

fn revision_line<'a>(
    row: &RevisionRow,
    field_style: &dyn Fn(Focus) -> Style,
    theme: &Theme,
) -> Line<'a> {
    let key = row.key();
    let watch = row.stopwatch();
    let timer_style = if watch.is_running() {
        Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    };
    let timer_style = timer_style.patch(field_style(Focus::Row(key, RowField::Timer)));

    let mut spans = vec![
        Span::styled(
            checkbox(row.completed),
            field_style(Focus::Row(key, RowField::Completed)),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:<14}", key.name()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(timecode::encode(watch.elapsed_seconds()), timer_style),
        Span::raw(" "),
        match watch.state() {
            StopwatchState::Running => Span::styled("● running", Style::default().fg(theme.error)),
            StopwatchState::Stopped => Span::styled("○ stopped", theme.muted_style()),
        },
    ];

    if row.is_billable() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("{} Drafting", checkbox(row.is_drafting())),
            field_style(Focus::Row(key, RowField::Drafting)),
        ));
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} Estimating", checkbox(row.is_estimating())),
            field_style(Focus::Row(key, RowField::Estimating)),
        ));
        if row.is_drafting() {
            let rate = if row.rate_input().is_empty() {
                "0.00".to_string()
            } else {
                row.rate_input().to_string()
            };
            spans.push(Span::raw("  Rate: $"));
            spans.push(Span::styled(rate, field_style(Focus::Row(key, RowField::Rate))));
            spans.push(Span::styled("/hr", theme.muted_style()));
            let cost = row.live_cost();
            if cost > 0.0 {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    format!("Cost: {}", format_currency(cost)),
                    Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
                ));
            }
        }
    }

    Line::from(spans)
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn draw_confirm_delete(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = centered_rect(50, 20, area);
    frame.render_widget(Clear, block);
    let title = app
        .pending_delete_title()
        .unwrap_or_else(|| "this job".to_string());
    let lines = vec![
        Line::from("Are you sure you want to delete this job?"),
        Line::from(""),
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
            Span::raw(" delete · "),
            Span::styled("n / Esc", Style::default().fg(theme.highlight)),
            Span::raw(" keep"),
        ]),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel_block("Delete Job", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn draw_overlay(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let block = centered_rect(60, 20, area);
    frame.render_widget(Clear, block);
    let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(panel_block("Status", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    vertical[1]
}

fn draw_toast(frame: &mut Frame, area: Rect, message: &str, is_error: bool, theme: &Theme) {
    let width = toast_width(message, area.width);
    let height = 3;
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = area.y + area.height.saturating_sub(height + 4);
    let rect = Rect::new(x, y, width, height);

    frame.render_widget(Clear, rect);
    let (style, title) = if is_error {
        (Style::default().fg(theme.error).add_modifier(Modifier::BOLD), "Error")
    } else {
        (Style::default().fg(theme.success).add_modifier(Modifier::BOLD), "Done")
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(message, style)))
        .alignment(Alignment::Center)
        .block(panel_block(title, theme));
    frame.render_widget(paragraph, rect);
}

fn toast_width(message: &str, available: u16) -> u16 {
    u16::try_from(message.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(6)
        .max(20)
        .min(available.saturating_sub(2))
}

fn draw_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = centered_rect(70, 80, area);
    frame.render_widget(Clear, block);

    let header_style = Style::default().add_modifier(Modifier::BOLD).fg(theme.accent);
    let key_style = Style::default().fg(theme.highlight);
    let section = |title: &'static str| {
        Row::new(vec![Cell::from(Span::styled(title, header_style)), Cell::from("")])
    };
    let entry = |keys: &'static str, action: &'static str| {
        Row::new(vec![Cell::from(Span::styled(keys, key_style)), Cell::from(action)])
    };
    let spacer = || Row::new(vec![Cell::from(""), Cell::from("")]);

    let rows = vec![
        section("Jobs"),
        entry("Up/Down", "Select job"),
        entry("n", "New job"),
        entry("e / Enter", "Edit job"),
        entry("d", "Delete job"),
        entry("x", "Export report"),
        entry("y", "Copy job summary"),
        spacer(),
        section("Job form"),
        entry("Tab / Shift+Tab", "Next / previous field"),
        entry("PgUp / PgDn", "Previous / next revision"),
        entry("Space / Enter", "Toggle checkbox or stopwatch"),
        entry("s / p / 0", "Start / stop / reset stopwatch"),
        entry("Ctrl+S", "Save job"),
        entry("Esc", "Discard changes"),
        spacer(),
        section("General"),
        entry("r", "Refresh"),
        entry("t", "Cycle theme"),
        entry("h / Esc", "Close help"),
        entry("q", "Quit"),
    ];

    let table = Table::new(rows, [Constraint::Length(20), Constraint::Min(10)])
        .block(panel_block("Help", theme))
        .column_spacing(2);

    frame.render_widget(table, block);
}

fn draw_background(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default().style(Style::default().bg(theme.bg).fg(theme.text));
    frame.render_widget(block, area);
}

fn panel_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style())
        .style(theme.panel_style())
        .title(Line::from(Span::styled(
            format!(" {} ", title),
            theme.title_style(),
        )))
}

#[derive(Clone, Copy)]
struct Theme {
    bg: Color,
    panel: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    highlight: Color,
    success: Color,
    error: Color,
    estimate: Color,
    accent_dark: Color,
}

impl Theme {
    fn panel_style(&self) -> Style {
        Style::default().bg(self.panel).fg(self.text)
    }

    fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    fn accent_contrast(&self) -> Color {
        if matches!(self.bg, Color::Rgb(242, 244, 248)) {
            self.accent_dark
        } else {
            Color::Black
        }
    }
}

fn theme_from(pref: ThemePreference) -> Theme {
    match pref {
        ThemePreference::Terminal => Theme {
            bg: Color::Reset,
            panel: Color::Reset,
            border: Color::DarkGray,
            text: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::Blue,
            highlight: Color::Yellow,
            success: Color::Green,
            error: Color::Red,
            estimate: Color::Magenta,
            accent_dark: Color::Black,
        },
        ThemePreference::Dark => Theme {
            bg: Color::Rgb(12, 18, 36),
            panel: Color::Rgb(18, 28, 52),
            border: Color::Rgb(44, 72, 112),
            text: Color::Rgb(220, 230, 255),
            muted: Color::Rgb(150, 170, 200),
            accent: Color::Rgb(102, 126, 234),
            highlight: Color::Rgb(255, 210, 120),
            success: Color::Rgb(120, 220, 140),
            error: Color::Rgb(255, 120, 120),
            estimate: Color::Rgb(196, 150, 255),
            accent_dark: Color::Rgb(26, 60, 110),
        },
        ThemePreference::Light => Theme {
            bg: Color::Rgb(242, 244, 248),
            panel: Color::Rgb(255, 255, 255),
            border: Color::Rgb(210, 220, 235),
            text: Color::Rgb(26, 32, 44),
            muted: Color::Rgb(90, 110, 140),
            accent: Color::Rgb(102, 126, 234),
            highlight: Color::Rgb(214, 140, 40),
            success: Color::Rgb(36, 150, 90),
            error: Color::Rgb(220, 60, 80),
            estimate: Color::Rgb(128, 70, 200),
            accent_dark: Color::Rgb(18, 34, 64),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_width_fits_the_screen() {
        assert_eq!(toast_width("Saved", 100), 20);
        assert_eq!(toast_width(&"x".repeat(40), 100), 46);
        assert_eq!(toast_width(&"x".repeat(70_000), 120), 118);
        assert_eq!(toast_width("Saved", 10), 8);
        assert_eq!(toast_width("Saved", 0), 0);
    }
}
