//! Key code naming for configuration and diagnostics.
//!
//! Codes on the wire are Windows virtual-key codes, exactly as Raw Input
//! reports them.  This module only translates between those codes and
//! human-readable names; it never remaps a key.

pub mod windows_vk;

pub use windows_vk::{vk_from_name, vk_name, VK_RETURN};

/// Parses a key name or code from configuration.
///
/// Accepts a key name (`"Enter"`, `"space"`), a hexadecimal code
/// (`"0x0D"`), or a decimal code (`"13"`).
///
/// # Examples
///
/// ```rust
/// use keyrelay_core::keymap::parse_key;
///
/// assert_eq!(parse_key("Enter"), Some(0x0D));
/// assert_eq!(parse_key("0x20"), Some(0x20));
/// assert_eq!(parse_key("65"), Some(0x41));
/// ```
pub fn parse_key(text: &str) -> Option<u16> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u16::from_str_radix(hex, 16).ok();
    }
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        // Single digits are key names ("1" is VK 0x31), not raw codes.
        if text.len() > 1 {
            return text.parse().ok();
        }
    }
    vk_from_name(text)
}

/// Formats a key code for logs: `0x41 (A)` or just `0x141`.
pub fn describe(code: u16) -> String {
    match vk_name(code) {
        Some(name) => format!("{code:#04x} ({name})"),
        None => format!("{code:#04x}"),
    }
}
