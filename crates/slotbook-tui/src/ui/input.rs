//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` state changes. Returns `true` from
//! `handle_input` when the program should exit.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_password_char, can_add_text_char, App, AppState, LoginFocus, RegisterFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        // Nothing is interactive until the session store has settled
        AppState::Loading | AppState::Quitting => return Ok(false),
        AppState::LoggingIn => return Ok(handle_login_input(app, key)),
        AppState::Registering => {
            handle_register_input(app, key);
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => return Ok(handle_quit_confirm(app, key)),
        AppState::ConfirmingCancel => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_cancel(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_cancel = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Normal => {}
    }

    let Some(role) = app.role() else {
        return Ok(false);
    };

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char('x') => {
            app.messages.dismiss_latest();
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.load_current_tab();
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            if let Some(&tab) = Tab::for_role(role).get(index) {
                switch_tab(app, tab);
            }
            return Ok(false);
        }
        KeyCode::Left => {
            let tab = app.current_tab.prev(role);
            switch_tab(app, tab);
            return Ok(false);
        }
        KeyCode::Right => {
            let tab = app.current_tab.next(role);
            switch_tab(app, tab);
            return Ok(false);
        }
        _ => {}
    }

    match app.current_tab {
        Tab::Slots => handle_slots_input(app, key),
        Tab::MyBookings => handle_bookings_input(app, key),
        Tab::AllBookings => handle_admin_input(app, key),
    }
    Ok(false)
}

fn switch_tab(app: &mut App, tab: Tab) {
    if app.current_tab != tab {
        app.current_tab = tab;
        app.load_current_tab();
    }
}

fn handle_quit_confirm(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            // Back to whichever screen asked
            if app.is_authenticated() {
                app.state = AppState::Normal;
            } else {
                app.start_login();
            }
        }
        _ => {}
    }
    false
}

/// Move a list selection in response to navigation keys.
fn navigate(selection: &mut usize, len: usize, code: KeyCode) {
    let max_index = len.saturating_sub(1);
    match code {
        KeyCode::Up | KeyCode::Char('k') => *selection = selection.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *selection = (*selection + 1).min(max_index),
        KeyCode::PageUp => *selection = selection.saturating_sub(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => *selection = (*selection + PAGE_SCROLL_SIZE).min(max_index),
        KeyCode::Home => *selection = 0,
        KeyCode::End => *selection = max_index,
        _ => {}
    }
}

fn handle_slots_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.book_selected_slot(),
        KeyCode::Char('[') => app.shift_week(-1),
        KeyCode::Char(']') => app.shift_week(1),
        code => {
            let len = app.data.slots.len();
            navigate(&mut app.data.slot_selection, len, code);
        }
    }
}

fn handle_bookings_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('c') => app.request_cancel_selected(),
        code => {
            let len = app.data.bookings.len();
            navigate(&mut app.data.booking_selection, len, code);
        }
    }
}

fn handle_admin_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.admin_next_page(),
        KeyCode::Char('p') => app.admin_prev_page(),
        code => {
            let len = app
                .data
                .all_bookings
                .as_ref()
                .map(|all| all.bookings().len())
                .unwrap_or(0);
            navigate(&mut app.data.admin_selection, len, code);
        }
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Register,
                LoginFocus::Register => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Register,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
                LoginFocus::Register => LoginFocus::Button,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            // Enter in the password field submits
            LoginFocus::Password | LoginFocus::Button => {
                if !app.is_busy() {
                    app.attempt_login();
                }
            }
            LoginFocus::Register => app.start_register(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button | LoginFocus::Register => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_text_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button | LoginFocus::Register => {}
        },
        _ => {}
    }
    false
}

fn handle_register_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.start_login(),
        KeyCode::Down | KeyCode::Tab => {
            app.register_focus = match app.register_focus {
                RegisterFocus::Name => RegisterFocus::Email,
                RegisterFocus::Email => RegisterFocus::Password,
                RegisterFocus::Password => RegisterFocus::Confirm,
                RegisterFocus::Confirm => RegisterFocus::Button,
                RegisterFocus::Button => RegisterFocus::Back,
                RegisterFocus::Back => RegisterFocus::Name,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.register_focus = match app.register_focus {
                RegisterFocus::Name => RegisterFocus::Back,
                RegisterFocus::Email => RegisterFocus::Name,
                RegisterFocus::Password => RegisterFocus::Email,
                RegisterFocus::Confirm => RegisterFocus::Password,
                RegisterFocus::Button => RegisterFocus::Confirm,
                RegisterFocus::Back => RegisterFocus::Button,
            };
        }
        KeyCode::Enter => match app.register_focus {
            RegisterFocus::Name => app.register_focus = RegisterFocus::Email,
            RegisterFocus::Email => app.register_focus = RegisterFocus::Password,
            RegisterFocus::Password => app.register_focus = RegisterFocus::Confirm,
            RegisterFocus::Confirm | RegisterFocus::Button => {
                if !app.is_busy() {
                    app.attempt_register();
                }
            }
            RegisterFocus::Back => app.start_login(),
        },
        KeyCode::Backspace => {
            if let Some(field) = register_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let is_password = matches!(
                app.register_focus,
                RegisterFocus::Password | RegisterFocus::Confirm
            );
            if let Some(field) = register_field(app) {
                let len = field.chars().count();
                let accepted = if is_password {
                    can_add_password_char(len, c)
                } else {
                    can_add_text_char(len, c)
                };
                if accepted {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
}

/// The text buffer behind the focused registration field, if any.
fn register_field(app: &mut App) -> Option<&mut String> {
    match app.register_focus {
        RegisterFocus::Name => Some(&mut app.register_name),
        RegisterFocus::Email => Some(&mut app.register_email),
        RegisterFocus::Password => Some(&mut app.register_password),
        RegisterFocus::Confirm => Some(&mut app.register_confirm),
        RegisterFocus::Button | RegisterFocus::Back => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use slotbook_core::auth::MemoryStorage;
    use slotbook_core::{ApiConfig, Config};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn login_screen() -> App {
        let mut app = App::new(
            Config::default(),
            ApiConfig::new("http://127.0.0.1:1/api"),
            Arc::new(MemoryStorage::new()),
        )
        .unwrap();
        app.initialize();
        app
    }

    #[test]
    fn test_navigate_clamps() {
        let mut selection = 0;
        navigate(&mut selection, 3, KeyCode::Up);
        assert_eq!(selection, 0);
        navigate(&mut selection, 3, KeyCode::PageDown);
        assert_eq!(selection, 2);
        navigate(&mut selection, 0, KeyCode::Down);
        assert_eq!(selection, 0);
    }

    #[test]
    fn test_login_typing_and_focus() {
        let mut app = login_screen();
        assert_eq!(app.login_focus, LoginFocus::Email);
        for c in "pat@example.com".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_input(&mut app, key(KeyCode::Tab)).unwrap();
        handle_input(&mut app, key(KeyCode::Char('x'))).unwrap();
        handle_input(&mut app, key(KeyCode::Backspace)).unwrap();

        assert_eq!(app.login_email, "pat@example.com");
        assert_eq!(app.login_focus, LoginFocus::Password);
        assert!(app.login_password.is_empty());
    }

    #[test]
    fn test_register_link_and_back() {
        let mut app = login_screen();
        app.login_focus = LoginFocus::Register;
        handle_input(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.state, AppState::Registering);

        handle_input(&mut app, key(KeyCode::Char('P'))).unwrap();
        assert_eq!(app.register_name, "P");

        handle_input(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_quit_from_login_needs_confirmation() {
        let mut app = login_screen();
        assert!(!handle_input(&mut app, key(KeyCode::Esc)).unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);

        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))).unwrap());
        assert_eq!(app.state, AppState::LoggingIn);

        handle_input(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }
}
