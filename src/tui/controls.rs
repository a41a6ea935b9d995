//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('+' | '=') | KeyCode::Right => app.speed_up(),
        KeyCode::Char('-') | KeyCode::Left => app.speed_down(),
        KeyCode::Char('1') => app.switch_preset("easy"),
        KeyCode::Char('2') => app.switch_preset("normal"),
        KeyCode::Char('3') => app.switch_preset("hard"),
        KeyCode::Char('r') => app.restart(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn number_keys_select_presets() {
        let mut app = App::from_preset("normal");
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.preset_name, "hard");
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.preset_name, "easy");
    }

    #[test]
    fn space_pauses_and_q_quits() {
        let mut app = App::from_preset("normal");
        press(&mut app, KeyCode::Char(' '));
        assert!(app.is_paused());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
    }
}
