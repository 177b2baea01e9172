//! Windows Virtual Key (VK) code name table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code".
//! These are defined in `<winuser.h>` and named `VK_*` (e.g., `VK_RETURN = 0x0D`,
//! `VK_SPACE = 0x20`).  Raw Input reports VK codes per device, and those are
//! the codes KeyRelay forwards to the controller.
//!
//! # How this table works
//!
//! `VK_NAME_TABLE` is a compile-time array of 256 optional names indexed by
//! VK code, so `vk_name` is an O(1) lookup.  Letters and digits are filled in
//! by loops; everything else is listed explicitly.

/// `VK_RETURN`, the default pairing key.
pub const VK_RETURN: u16 = 0x0D;
/// `VK_SPACE`.
pub const VK_SPACE: u16 = 0x20;
/// `VK_ESCAPE`.
pub const VK_ESCAPE: u16 = 0x1B;

/// Returns the conventional name of a VK code, e.g. `"Enter"` for 0x0D.
///
/// Codes above 0xFF and unassigned codes return `None`.
pub fn vk_name(code: u16) -> Option<&'static str> {
    VK_NAME_TABLE.get(usize::from(code)).copied().flatten()
}

/// Looks up a VK code by name, ignoring ASCII case.
///
/// Also accepts the `VK_` spelling for the common aliases (`VK_RETURN`).
pub fn vk_from_name(name: &str) -> Option<u16> {
    let trimmed = name.trim();
    if let Some(code) = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|&(_, code)| code)
    {
        return Some(code);
    }
    VK_NAME_TABLE
        .iter()
        .position(|entry| matches!(entry, Some(n) if n.eq_ignore_ascii_case(trimmed)))
        .map(|idx| idx as u16)
}

/// Alternative spellings accepted by [`vk_from_name`].
const ALIASES: &[(&str, u16)] = &[
    ("Return", VK_RETURN),
    ("VK_RETURN", VK_RETURN),
    ("VK_SPACE", VK_SPACE),
    ("VK_ESCAPE", VK_ESCAPE),
    ("Esc", VK_ESCAPE),
    ("Ctrl", 0x11),
    ("Alt", 0x12),
];

/// Complete VK → name table indexed by VK code (0x00–0xFF).
const VK_NAME_TABLE: [Option<&str>; 256] = {
    let mut t: [Option<&str>; 256] = [None; 256];

    // ── Control and editing keys ─────────────────────────────────────────────
    t[0x08] = Some("Backspace");
    t[0x09] = Some("Tab");
    t[0x0C] = Some("Clear");
    t[0x0D] = Some("Enter");
    t[0x10] = Some("Shift");
    t[0x11] = Some("Control");
    t[0x12] = Some("Menu");
    t[0x13] = Some("Pause");
    t[0x14] = Some("CapsLock");
    t[0x1B] = Some("Escape");
    t[0x20] = Some("Space");
    t[0x21] = Some("PageUp");
    t[0x22] = Some("PageDown");
    t[0x23] = Some("End");
    t[0x24] = Some("Home");

    // ── Arrows ───────────────────────────────────────────────────────────────
    t[0x25] = Some("Left");
    t[0x26] = Some("Up");
    t[0x27] = Some("Right");
    t[0x28] = Some("Down");

    t[0x2C] = Some("PrintScreen");
    t[0x2D] = Some("Insert");
    t[0x2E] = Some("Delete");

    // ── Digits (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────────
    const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
    let mut i = 0;
    while i < 10 {
        t[0x30 + i] = Some(DIGITS[i]);
        i += 1;
    }

    // ── Alphabet (VK_A=0x41 … VK_Z=0x5A) ─────────────────────────────────────
    const LETTERS: [&str; 26] = [
        "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
        "S", "T", "U", "V", "W", "X", "Y", "Z",
    ];
    let mut i = 0;
    while i < 26 {
        t[0x41 + i] = Some(LETTERS[i]);
        i += 1;
    }

    t[0x5B] = Some("LeftWin");
    t[0x5C] = Some("RightWin");
    t[0x5D] = Some("Apps");

    // ── Numpad ───────────────────────────────────────────────────────────────
    const NUMPAD: [&str; 10] = [
        "Numpad0", "Numpad1", "Numpad2", "Numpad3", "Numpad4", "Numpad5", "Numpad6", "Numpad7",
        "Numpad8", "Numpad9",
    ];
    let mut i = 0;
    while i < 10 {
        t[0x60 + i] = Some(NUMPAD[i]);
        i += 1;
    }
    t[0x6A] = Some("Multiply");
    t[0x6B] = Some("Add");
    t[0x6D] = Some("Subtract");
    t[0x6E] = Some("Decimal");
    t[0x6F] = Some("Divide");

    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    const FKEYS: [&str; 12] = [
        "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    ];
    let mut i = 0;
    while i < 12 {
        t[0x70 + i] = Some(FKEYS[i]);
        i += 1;
    }

    t[0x90] = Some("NumLock");
    t[0x91] = Some("ScrollLock");

    // ── Side-specific modifiers ──────────────────────────────────────────────
    t[0xA0] = Some("LeftShift");
    t[0xA1] = Some("RightShift");
    t[0xA2] = Some("LeftControl");
    t[0xA3] = Some("RightControl");
    t[0xA4] = Some("LeftAlt");
    t[0xA5] = Some("RightAlt");

    // ── OEM punctuation (US layout) ──────────────────────────────────────────
    t[0xBA] = Some("Semicolon");
    t[0xBB] = Some("Equal");
    t[0xBC] = Some("Comma");
    t[0xBD] = Some("Minus");
    t[0xBE] = Some("Period");
    t[0xBF] = Some("Slash");
    t[0xC0] = Some("Backquote");
    t[0xDB] = Some("BracketLeft");
    t[0xDC] = Some("Backslash");
    t[0xDD] = Some("BracketRight");
    t[0xDE] = Some("Quote");

    t
};
