//! Input Bridge - crossterm events into keyboard/mouse state.
//!
//! Converts raw terminal events into the crate's event types and routes
//! them through the handler registries. The host event loop polls here
//! with a timeout derived from any pending debounce deadline.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use spark_grid::state::input;
//!
//! loop {
//!     if let Some(event) = input::poll_event(Duration::from_millis(16))? {
//!         input::route_event(&event);
//!     }
//!     // run debounce deadlines, redraw, ...
//! }
//! ```

use std::io;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton as CtMouseButton, MouseEventKind,
};
use crossterm::execute;

use crate::state::focus;
use crate::state::keyboard::{self, KeyState, KeyboardEvent, Modifiers};
use crate::state::mouse::{
    self, MouseAction, MouseButton, MouseEvent, ScrollDirection, ScrollInfo,
};

// =============================================================================
// Event Types
// =============================================================================

/// A terminal event after conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyboardEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// An event we do not handle (e.g. paste, focus gained).
    None,
}

// =============================================================================
// Conversion
// =============================================================================

fn convert_modifiers(modifiers: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        alt: modifiers.contains(KeyModifiers::ALT),
        shift: modifiers.contains(KeyModifiers::SHIFT),
    }
}

/// Convert a crossterm key event into a [`KeyboardEvent`].
///
/// Key names follow web conventions so handler registrations read the
/// same as their browser counterparts.
pub fn convert_key_event(event: &KeyEvent) -> KeyboardEvent {
    let key = match event.code {
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Insert => "Insert".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        _ => "Unknown".to_string(),
    };

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    KeyboardEvent {
        key,
        modifiers: convert_modifiers(event.modifiers),
        state,
    }
}

/// Convert a crossterm mouse event into a [`MouseEvent`].
pub fn convert_mouse_event(event: &event::MouseEvent) -> MouseEvent {
    let (action, button, scroll) = match event.kind {
        MouseEventKind::Down(button) => (MouseAction::Press, convert_button(button), None),
        MouseEventKind::Up(button) => (MouseAction::Release, convert_button(button), None),
        MouseEventKind::Drag(button) => (MouseAction::Drag, convert_button(button), None),
        MouseEventKind::Moved => (MouseAction::Move, MouseButton::None, None),
        MouseEventKind::ScrollUp => (
            MouseAction::Scroll,
            MouseButton::None,
            Some(ScrollInfo {
                direction: ScrollDirection::Up,
                amount: 1,
            }),
        ),
        MouseEventKind::ScrollDown => (
            MouseAction::Scroll,
            MouseButton::None,
            Some(ScrollInfo {
                direction: ScrollDirection::Down,
                amount: 1,
            }),
        ),
        MouseEventKind::ScrollLeft => (
            MouseAction::Scroll,
            MouseButton::None,
            Some(ScrollInfo {
                direction: ScrollDirection::Left,
                amount: 1,
            }),
        ),
        MouseEventKind::ScrollRight => (
            MouseAction::Scroll,
            MouseButton::None,
            Some(ScrollInfo {
                direction: ScrollDirection::Right,
                amount: 1,
            }),
        ),
    };

    MouseEvent {
        action,
        button,
        x: event.column,
        y: event.row,
        scroll,
    }
}

fn convert_button(button: CtMouseButton) -> MouseButton {
    match button {
        CtMouseButton::Left => MouseButton::Left,
        CtMouseButton::Right => MouseButton::Right,
        CtMouseButton::Middle => MouseButton::Middle,
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll for a terminal event with a timeout.
///
/// Returns `Ok(None)` when no event arrived within the timeout.
pub fn poll_event(timeout: Duration) -> io::Result<Option<InputEvent>> {
    if event::poll(timeout)? {
        read_event().map(Some)
    } else {
        Ok(None)
    }
}

/// Block until the next terminal event.
pub fn read_event() -> io::Result<InputEvent> {
    Ok(match event::read()? {
        Event::Key(key) => InputEvent::Key(convert_key_event(&key)),
        Event::Mouse(mouse) => InputEvent::Mouse(convert_mouse_event(&mouse)),
        Event::Resize(cols, rows) => InputEvent::Resize(cols, rows),
        _ => InputEvent::None,
    })
}

// =============================================================================
// Routing
// =============================================================================

/// Route a keyboard event through the handler registries.
///
/// The focused component (and its ancestors) get the first chance to
/// consume the key; otherwise it falls through to global and key-bound
/// handlers. Returns true if consumed.
pub fn route_key(event: &KeyboardEvent) -> bool {
    keyboard::update_last_event(event.clone());

    if event.state != KeyState::Press {
        return false;
    }

    let focused = focus::get_focused_index();
    if focused >= 0 && keyboard::dispatch_focused(focused as usize, event) {
        return true;
    }

    keyboard::dispatch_to_handlers(event)
}

/// Route any converted event. Returns true if a handler consumed it.
pub fn route_event(event: &InputEvent) -> bool {
    match event {
        InputEvent::Key(key) => route_key(key),
        InputEvent::Mouse(mouse) => {
            mouse::update_last_event(*mouse);
            false
        }
        _ => false,
    }
}

// =============================================================================
// Mouse Capture
// =============================================================================

/// Enable terminal mouse reporting.
pub fn enable_mouse() -> io::Result<()> {
    execute!(io::stdout(), EnableMouseCapture)
}

/// Disable terminal mouse reporting.
pub fn disable_mouse() -> io::Result<()> {
    execute!(io::stdout(), DisableMouseCapture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry;

    fn setup() {
        registry::reset_registry();
        keyboard::reset_keyboard_state();
        mouse::reset_mouse_state();
        focus::reset_focus_state();
    }

    #[test]
    fn test_convert_arrow_keys() {
        let event = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        let converted = convert_key_event(&event);
        assert_eq!(converted.key, "ArrowDown");
        assert_eq!(converted.state, KeyState::Press);
        assert_eq!(converted.modifiers, Modifiers::none());

        let event = KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT);
        let converted = convert_key_event(&event);
        assert_eq!(converted.key, "ArrowLeft");
        assert!(converted.modifiers.shift);
    }

    #[test]
    fn test_convert_named_keys() {
        let enter = convert_key_event(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(enter.key, "Enter");

        let escape = convert_key_event(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(escape.key, "Escape");

        let space = convert_key_event(&KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
        assert_eq!(space.key, "Space");

        let letter = convert_key_event(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(letter.key, "q");
    }

    #[test]
    fn test_convert_mouse_click() {
        let event = event::MouseEvent {
            kind: MouseEventKind::Down(CtMouseButton::Left),
            column: 12,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        let converted = convert_mouse_event(&event);
        assert_eq!(converted.action, MouseAction::Press);
        assert_eq!(converted.button, MouseButton::Left);
        assert_eq!((converted.x, converted.y), (12, 4));
    }

    #[test]
    fn test_convert_mouse_scroll() {
        let event = event::MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        let converted = convert_mouse_event(&event);
        assert_eq!(converted.action, MouseAction::Scroll);
        assert_eq!(
            converted.scroll,
            Some(ScrollInfo {
                direction: ScrollDirection::Down,
                amount: 1,
            })
        );
    }

    #[test]
    fn test_route_key_prefers_focused() {
        use std::cell::Cell;
        use std::rc::Rc;

        setup();

        let idx = registry::allocate_index(None);
        registry::set_focusable(idx, true);
        focus::focus(idx);

        let focused_hit = Rc::new(Cell::new(false));
        let global_hit = Rc::new(Cell::new(false));

        let focused_clone = focused_hit.clone();
        let _f = keyboard::on_focused(idx, &["Enter"], move || {
            focused_clone.set(true);
            true
        });
        let global_clone = global_hit.clone();
        let _g = keyboard::on_key("Enter", move || {
            global_clone.set(true);
            true
        });

        assert!(route_key(&KeyboardEvent::new("Enter")));
        assert!(focused_hit.get());
        assert!(!global_hit.get());
    }

    #[test]
    fn test_route_key_falls_through_when_unfocused() {
        use std::cell::Cell;
        use std::rc::Rc;

        setup();

        let hit = Rc::new(Cell::new(false));
        let hit_clone = hit.clone();
        let _g = keyboard::on_key("Escape", move || {
            hit_clone.set(true);
            true
        });

        assert!(route_key(&KeyboardEvent::new("Escape")));
        assert!(hit.get());
        assert_eq!(keyboard::last_key(), Some("Escape".to_string()));
    }
}
