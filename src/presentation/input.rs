use std::time::Instant;
use crate::application::{App, AppMode};
use crate::domain::ImportMode;
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Editing => Self::handle_editing_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::SelectWorkout => Self::handle_workout_picker(app, key),
            AppMode::ConfirmNewSession => {
                if let Some(answer) = Self::confirmation(key) {
                    app.confirm_new_session(answer);
                }
            }
            AppMode::History => Self::handle_history_mode(app, key),
            AppMode::ConfirmDelete => {
                if let Some(answer) = Self::confirmation(key) {
                    app.confirm_delete(answer);
                }
            }
            AppMode::ImportPath => Self::handle_filename_input_mode(app, key),
            AppMode::ImportChoice => match key {
                KeyCode::Char('m') => app.choose_import_mode(ImportMode::Merge),
                KeyCode::Char('r') => app.choose_import_mode(ImportMode::Replace),
                KeyCode::Esc => app.cancel_filename_input(),
                _ => {}
            },
        }
    }

    fn confirmation(key: KeyCode) -> Option<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
            _ => None,
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if key == KeyCode::Char('s') {
                app.commit();
            }
            return;
        }

        let now = Instant::now();
        match key {
            KeyCode::Up | KeyCode::Char('k') => app.move_up(),
            KeyCode::Down | KeyCode::Char('j') => app.move_down(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                app.selected_field = app.selected_field.previous();
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                app.selected_field = app.selected_field.next();
            }
            KeyCode::Enter | KeyCode::F(2) => app.start_editing(),
            KeyCode::Char('a') => app.add_set(now),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_set(now),
            KeyCode::Char('s') => app.commit(),
            KeyCode::Char('n') => app.open_workout_picker(),
            KeyCode::Char('p') => app.open_history(),
            KeyCode::Char('i') => app.start_import(),
            KeyCode::Char('e') => app.export(),
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Esc => app.status_message = None,
            _ => {}
        }
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Tab => {
                app.finish_editing(Instant::now());
            }
            KeyCode::Esc => {
                app.cancel_editing();
            }
            _ => Self::edit_text(&mut app.input, &mut app.cursor_position, key),
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_workout_picker(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => app.catalog_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.catalog_next(),
            KeyCode::Enter => app.choose_workout(),
            KeyCode::Esc | KeyCode::Char('q') => app.mode = AppMode::Normal,
            _ => {}
        }
    }

    fn handle_history_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => app.history_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.history_next(),
            KeyCode::Enter => app.load_selected_history(),
            KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('p') => app.close_history(),
            _ => {}
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                app.submit_import_path();
            }
            KeyCode::Esc => {
                app.cancel_filename_input();
            }
            _ => Self::edit_text(&mut app.filename_input, &mut app.cursor_position, key),
        }
    }

    /// Line editing on `text`; `cursor` counts characters, not bytes.
    fn edit_text(text: &mut String, cursor: &mut usize, key: KeyCode) {
        let len = text.chars().count();
        *cursor = (*cursor).min(len);
        match key {
            KeyCode::Backspace => {
                if *cursor > 0 {
                    *cursor -= 1;
                    text.remove(byte_offset(text, *cursor));
                }
            }
            KeyCode::Delete => {
                if *cursor < len {
                    text.remove(byte_offset(text, *cursor));
                }
            }
            KeyCode::Left => {
                *cursor = cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if *cursor < len {
                    *cursor += 1;
                }
            }
            KeyCode::Home => {
                *cursor = 0;
            }
            KeyCode::End => {
                *cursor = len;
            }
            KeyCode::Char(c) if !c.is_control() => {
                text.insert(byte_offset(text, *cursor), c);
                *cursor += 1;
            }
            _ => {}
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
