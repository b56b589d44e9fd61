//! evdev keycode constants
//!
//! Key codes usable as clutch targets, with name lookup for the mapping
//! configuration. Names are the `KEY_*` names of <linux/input-event-codes.h>
//! as known to the `evdev` crate.

use evdev::Key;

// ============================================================================
// Keys
// ============================================================================

/// Caps Lock key (default clutch target)
pub const KEY_CAPSLOCK: u16 = Key::KEY_CAPSLOCK.code();

/// Highest code registered on the virtual keyboard.
///
/// Every code in `1..=KEY_MAX_REGISTERED` is advertised so that a mapping
/// reloaded at runtime can target any ordinary key.
pub const KEY_MAX_REGISTERED: u16 = 255;

// ============================================================================
// Helper Functions
// ============================================================================

/// Kernel name of a code (`KEY_*` or `BTN_*`), if it has one
fn kernel_name(code: u16) -> Option<String> {
    let name = format!("{:?}", Key::new(code));
    (name.starts_with("KEY_") || name.starts_with("BTN_")).then_some(name)
}

/// Look up a key code by name
///
/// Accepts `KEY_CAPSLOCK`, `capslock` or `CapsLock`; the `KEY_` prefix
/// is optional and matching ignores case. Only codes registered on the
/// virtual keyboard are found.
pub fn key_code(name: &str) -> Option<u16> {
    let upper = name.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return None;
    }
    let wanted = if upper.starts_with("KEY_") {
        upper
    } else {
        format!("KEY_{}", upper)
    };
    (1..=KEY_MAX_REGISTERED).find(|&code| kernel_name(code).as_deref() == Some(wanted.as_str()))
}

/// Name of a key code for log output (`KEY_CAPSLOCK`, or the number)
pub fn key_name(code: u16) -> String {
    kernel_name(code).unwrap_or_else(|| format!("key {}", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_code_lookup() {
        assert_eq!(key_code("KEY_CAPSLOCK"), Some(KEY_CAPSLOCK));
        assert_eq!(key_code("capslock"), Some(KEY_CAPSLOCK));
        assert_eq!(key_code(" key_esc "), Some(Key::KEY_ESC.code()));
        assert_eq!(key_code("KEY_I"), Some(23));
        assert_eq!(key_code("KEY_NOPE"), None);
        assert_eq!(key_code(""), None);
        assert_eq!(key_code("KEY_"), None);
    }

    #[test]
    fn test_keypad_and_media_keys() {
        assert_eq!(key_code("KEY_KPENTER"), Some(96));
        assert_eq!(key_code("KEY_KP0"), Some(82));
        assert_eq!(key_code("KEY_102ND"), Some(86));
        assert_eq!(key_code("KEY_SYSRQ"), Some(99));
        assert_eq!(key_code("KEY_MUTE"), Some(113));
        assert_eq!(key_code("volumeup"), Some(115));
        assert_eq!(key_code("KEY_MENU"), Some(139));
    }

    #[test]
    fn test_key_name() {
        assert_eq!(key_name(KEY_CAPSLOCK), "KEY_CAPSLOCK");
        assert_eq!(key_name(96), "KEY_KPENTER");
        assert_eq!(key_name(0x110), "BTN_LEFT");
        // unassigned in input-event-codes.h
        assert_eq!(key_name(84), "key 84");
    }

    #[test]
    fn test_every_named_code_round_trips() {
        let mut named = 0;
        for code in 1..=KEY_MAX_REGISTERED {
            let name = key_name(code);
            if name.starts_with("KEY_") {
                assert_eq!(key_code(&name), Some(code), "{}", name);
                named += 1;
            }
        }
        // 1..=248 are named in input-event-codes.h, bar a few gaps
        assert!(named >= 230, "only {} named codes", named);
    }

    #[test]
    fn test_codes_outside_registered_range_not_found() {
        // BTN_LEFT is 0x110, above the virtual keyboard's range; KEY_RESERVED is 0
        assert_eq!(key_code("BTN_LEFT"), None);
        assert_eq!(key_code("KEY_RESERVED"), None);
    }
}
