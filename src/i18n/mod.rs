//! Internationalization support
//!
//! User-facing text (notifications, slot titles, reports) is translated
//! through `rust-i18n` with Ukrainian as the base language and English as
//! an alternative. The process-wide locale comes from `SVITLO_LANG`;
//! individual chats can override it via their stored language setting,
//! resolved by [`crate::storage::ChatSettings`] and passed to `t!` per
//! message.

use std::sync::OnceLock;

// Note: rust_i18n::i18n! macro is declared in lib.rs (crate root)

static CURRENT_LOCALE: OnceLock<String> = OnceLock::new();

/// Languages the locale files actually cover.
pub const SUPPORTED_LANGS: [&str; 2] = ["uk", "en"];

/// Default language when nothing else is configured.
pub const DEFAULT_LANG: &str = "uk";

/// Set the process-wide locale.
pub fn set_locale(locale: &str) {
    let normalized = normalize_locale(locale);
    rust_i18n::set_locale(&normalized);
    CURRENT_LOCALE.get_or_init(|| normalized.clone());
}

/// Get the process-wide locale.
pub fn current_locale() -> &'static str {
    CURRENT_LOCALE.get().map(|s| s.as_str()).unwrap_or(DEFAULT_LANG)
}

/// Initialize the locale from `SVITLO_LANG`, defaulting to Ukrainian.
pub fn init_from_env() {
    let locale = std::env::var("SVITLO_LANG").unwrap_or_else(|_| DEFAULT_LANG.to_string());
    set_locale(&locale);
}

/// Normalize a language tag to a supported locale.
///
/// `uk`, `ua`, `uk-UA`-style tags map to Ukrainian; English tags to
/// English; anything else falls back to Ukrainian.
pub fn normalize_locale(locale: &str) -> String {
    let lower = locale.to_lowercase();

    if lower.starts_with("en") || lower == "english" {
        "en".to_string()
    } else {
        // uk, ua and everything unrecognized
        "uk".to_string()
    }
}

/// Translate a key with optional parameters (re-export of rust_i18n::t!).
#[doc(inline)]
pub use rust_i18n::t;
