use crate::application::{App, AppMode, RowRef, SetField};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};

pub fn render_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_session(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::SelectWorkout | AppMode::ConfirmNewSession => render_workout_picker(f, app),
        AppMode::History | AppMode::ConfirmDelete => render_history(f, app),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.manager.current() {
        Some(session) => format!(
            "fitlog | {} | {} | {}",
            app.manager.state().workout_name(&session.workout_key),
            session.date.with_timezone(&Local).format("%b %e, %Y %H:%M"),
            app.autosave_status()
        ),
        None => "fitlog | no session - press n to start".to_string(),
    };
    let header = Paragraph::new(title).style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn field_style(app: &App, row: RowRef, field: SetField) -> Style {
    let selected = app.selected() == Some(row);
    if selected && app.selected_field == field {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else if selected {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn render_session(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Session");
    let Some(session) = app.manager.current() else {
        let empty = Paragraph::new("No session in progress.\n\nn: start a workout | p: past sessions | i: import")
            .block(block);
        f.render_widget(empty, area);
        return;
    };

    let visible_rows = area.height.saturating_sub(3) as usize;
    let rows = app.rows();
    let end = (app.scroll_row + visible_rows).min(rows.len());

    let mut table_rows = Vec::new();
    for row in &rows[app.scroll_row.min(end)..end] {
        let selected = app.selected() == Some(*row);
        match *row {
            RowRef::Exercise(exercise) => {
                let log = &session.exercises[exercise];
                let plan = log.plan.as_ref().map(|p| p.join(" · ")).unwrap_or_default();
                let style = if selected {
                    Style::default().bg(Color::LightBlue).fg(Color::Black)
                } else {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                };
                table_rows.push(
                    Row::new(vec![
                        Cell::from(log.name.clone()),
                        Cell::from(""),
                        Cell::from(""),
                        Cell::from(""),
                        Cell::from(plan),
                    ])
                    .style(style),
                );
            }
            RowRef::Set { exercise, set } => {
                let entry = &session.exercises[exercise].sets[set];
                let weight = if entry.weight > 0.0 { entry.weight.to_string() } else { String::new() };
                let reps = if entry.reps > 0 { entry.reps.to_string() } else { String::new() };
                table_rows.push(Row::new(vec![
                    Cell::from(format!("  Set {}", entry.n)),
                    Cell::from(entry.target.clone().unwrap_or_default()),
                    Cell::from(weight).style(field_style(app, *row, SetField::Weight)),
                    Cell::from(reps).style(field_style(app, *row, SetField::Reps)),
                    Cell::from(entry.notes.clone()).style(field_style(app, *row, SetField::Notes)),
                ]));
            }
        }
    }

    let header = Row::new(vec!["Exercise", "Target", "Weight", "Reps", "Notes / Plan"])
        .style(Style::default().fg(Color::Yellow));
    let widths = [
        Constraint::Percentage(35),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Min(10),
    ];
    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);

    app.viewport_rows = visible_rows.max(1);
    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                "Enter: edit | a: add set | d: delete set | s: save | n: new | p: past | i: import | e: export | ?: help | q: quit".to_string()
            }
        }
        AppMode::Editing => format!(
            "Editing {}: {} (Enter to save, Esc to cancel)",
            app.selected_field.label(),
            app.input
        ),
        AppMode::Help => "↑↓/jk: scroll | Home: top | Esc/q: close help".to_string(),
        AppMode::SelectWorkout => "↑↓: choose workout | Enter: start | Esc: cancel".to_string(),
        AppMode::ConfirmNewSession => {
            "Start new session with selected workout? Unsaved current session lost. (y/n)".to_string()
        }
        AppMode::History => app
            .status_message
            .clone()
            .unwrap_or_else(|| "↑↓: choose | Enter: load | d: delete | Esc: close".to_string()),
        AppMode::ConfirmDelete => "Delete session? (y/n)".to_string(),
        AppMode::ImportPath => format!("Import from: {} (Enter to read, Esc to cancel)", app.filename_input),
        AppMode::ImportChoice => "m: merge (keep existing) | r: replace | Esc: cancel".to_string(),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal | AppMode::History => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::Help | AppMode::SelectWorkout => Style::default().fg(Color::Cyan),
            AppMode::ConfirmNewSession | AppMode::ConfirmDelete => Style::default().fg(Color::Red),
            AppMode::ImportPath | AppMode::ImportChoice => Style::default().fg(Color::Yellow),
        });
    f.render_widget(input, area);
}

fn popup_area(area: Rect) -> Rect {
    Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    }
}

fn render_workout_picker(f: &mut Frame, app: &App) {
    let area = popup_area(f.area());
    f.render_widget(Clear, area);

    let workouts = &app.manager.state().workouts;
    let items: Vec<ListItem> = workouts
        .iter()
        .map(|(key, plan)| {
            ListItem::new(Line::from(vec![
                Span::styled(plan.name.clone(), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  ({key}, {} exercises)", plan.exercises.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Workouts"))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(app.catalog_index));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_history(f: &mut Frame, app: &App) {
    let area = popup_area(f.area());
    f.render_widget(Clear, area);

    let entries = app.history();
    let block = Block::default().borders(Borders::ALL).title("Past sessions");
    if entries.is_empty() {
        f.render_widget(Paragraph::new("No sessions yet.").block(block), area);
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            ListItem::new(format!(
                "{} - {} | {} sets",
                entry.workout_name,
                entry.date.with_timezone(&Local).format("%b %e, %Y %H:%M"),
                entry.total_sets
            ))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(app.history_index));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let popup_area = popup_area(f.area());
    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("fitlog Help (Line {}/{})", start_line + 1, help_lines.len()))
            .style(Style::default().fg(Color::Cyan)))
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"FITLOG WORKOUT LOG

=== SESSIONS ===
n               Pick a workout and start a new session
                Sets are pre-filled from the workout plan targets
s / Ctrl+S      Save the session into history
                A session without any sets is not saved
p               Past sessions (Enter loads a copy, d deletes)
                Editing a loaded session saves it as a new entry

=== EDITING ===
↑↓ or j/k       Move between exercises and sets
←→ or h/l, Tab  Choose weight, reps or notes column
Enter / F2      Edit the highlighted cell
a               Add a set to the highlighted exercise
d / Delete      Delete the highlighted set (sets are renumbered)

=== AUTOSAVE ===
Edits are saved automatically shortly after you stop typing,
and at least every few seconds while you keep editing.
Sessions without any weight or reps entered are never autosaved.
An unsaved session is restored after a crash; save it with s.

=== IMPORT / EXPORT ===
e               Export everything to fitness-tracker-export-YYYYMMDD.json
i               Import a previously exported file
                m = merge (existing sessions and workouts are kept)
                r = replace all data with the file

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Home            Jump to top of help text
Esc/F1/?/q      Close this help window
q               Quit (from the session view)"#;
