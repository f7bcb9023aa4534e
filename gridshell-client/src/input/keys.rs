//! Key translation for terminal input
//!
//! Translates crossterm key events to the byte sequences a PTY
//! expects.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Translate a key event to its terminal byte sequence
///
/// Returns `None` for keys with no terminal representation.
pub fn translate_key(key: &KeyEvent) -> Option<Vec<u8>> {
    let modifiers = key.modifiers;

    match key.code {
        KeyCode::Char(c) => translate_char(c, modifiers),

        KeyCode::Enter => Some(vec![b'\r']),
        KeyCode::Tab => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                Some(b"\x1b[Z".to_vec())
            } else {
                Some(vec![b'\t'])
            }
        }
        KeyCode::Backspace => {
            if modifiers.contains(KeyModifiers::ALT) {
                Some(vec![0x1b, 0x7f])
            } else {
                Some(vec![0x7f])
            }
        }
        KeyCode::Esc => Some(vec![0x1b]),

        KeyCode::Up => Some(translate_arrow('A', modifiers)),
        KeyCode::Down => Some(translate_arrow('B', modifiers)),
        KeyCode::Right => Some(translate_arrow('C', modifiers)),
        KeyCode::Left => Some(translate_arrow('D', modifiers)),

        KeyCode::Home => Some(translate_navigation('H', modifiers)),
        KeyCode::End => Some(translate_navigation('F', modifiers)),
        KeyCode::PageUp => Some(translate_tilde_key(5, modifiers)),
        KeyCode::PageDown => Some(translate_tilde_key(6, modifiers)),
        KeyCode::Insert => Some(translate_tilde_key(2, modifiers)),
        KeyCode::Delete => Some(translate_tilde_key(3, modifiers)),

        KeyCode::F(n) => translate_function_key(n, modifiers),

        _ => None,
    }
}

fn translate_char(c: char, modifiers: KeyModifiers) -> Option<Vec<u8>> {
    if modifiers.contains(KeyModifiers::ALT) {
        // Alt sends ESC followed by the key
        let mut bytes = vec![0x1b];
        if modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() {
            bytes.push((c.to_ascii_lowercase() as u8) - b'a' + 1);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        return Some(bytes);
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        if c.is_ascii_alphabetic() {
            // Ctrl+A = 0x01 etc.
            return Some(vec![(c.to_ascii_lowercase() as u8) - b'a' + 1]);
        }
        match c {
            '@' | ' ' => return Some(vec![0x00]),
            '[' => return Some(vec![0x1b]),
            '\\' => return Some(vec![0x1c]),
            ']' => return Some(vec![0x1d]),
            '^' => return Some(vec![0x1e]),
            '_' => return Some(vec![0x1f]),
            '?' => return Some(vec![0x7f]),
            _ => {}
        }
    }

    let mut buf = [0u8; 4];
    Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
}

fn translate_arrow(direction: char, modifiers: KeyModifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        format!("\x1b[{}", direction).into_bytes()
    } else {
        format!("\x1b[1;{}{}", modifier_code(modifiers), direction).into_bytes()
    }
}

fn translate_navigation(suffix: char, modifiers: KeyModifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        format!("\x1b[{}", suffix).into_bytes()
    } else {
        format!("\x1b[1;{}{}", modifier_code(modifiers), suffix).into_bytes()
    }
}

fn translate_tilde_key(code: u8, modifiers: KeyModifiers) -> Vec<u8> {
    if modifiers.is_empty() {
        format!("\x1b[{}~", code).into_bytes()
    } else {
        format!("\x1b[{};{}~", code, modifier_code(modifiers)).into_bytes()
    }
}

/// xterm-style modifier parameter
fn modifier_code(modifiers: KeyModifiers) -> u8 {
    let mut code = 1;
    if modifiers.contains(KeyModifiers::SHIFT) {
        code += 1;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        code += 2;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        code += 4;
    }
    code
}

fn translate_function_key(n: u8, modifiers: KeyModifiers) -> Option<Vec<u8>> {
    // F1-F4 use SS3, the rest are tilde keys
    let tilde_code = match n {
        1..=4 => {
            let suffix = [b'P', b'Q', b'R', b'S'][(n - 1) as usize] as char;
            return Some(if modifiers.is_empty() {
                format!("\x1bO{}", suffix).into_bytes()
            } else {
                format!("\x1b[1;{}{}", modifier_code(modifiers), suffix).into_bytes()
            });
        }
        5 => 15,
        6 => 17,
        7 => 18,
        8 => 19,
        9 => 20,
        10 => 21,
        11 => 23,
        12 => 24,
        _ => return None,
    };
    Some(translate_tilde_key(tilde_code, modifiers))
}
