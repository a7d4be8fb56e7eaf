//! Human-readable duration formatting with language-aware plural forms

use crate::i18n::t;

/// Pick the Ukrainian plural form for `n` (one / few / many).
///
/// 1, 21, 31... take the singular; 2-4, 22-24... the paucal; everything
/// else (including 11-14) the plural.
fn plural_uk<'a>(n: i64, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    let n = n.abs();
    let n10 = n % 10;
    let n100 = n % 100;
    if n10 == 1 && n100 != 11 {
        return one;
    }
    if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
        return few;
    }
    many
}

fn pick<'a>(n: i64, lang: &str, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    match lang {
        "uk" => plural_uk(n, one, few, many),
        // English has no paucal; few and many collapse into the plural
        _ => {
            if n.abs() == 1 {
                one
            } else {
                many
            }
        }
    }
}

fn hours_part(n: i64, lang: &str) -> String {
    let one = t!("duration.hour.one", locale = lang);
    let few = t!("duration.hour.few", locale = lang);
    let many = t!("duration.hour.many", locale = lang);
    format!("{n} {}", pick(n, lang, &one, &few, &many))
}

fn minutes_part(n: i64, lang: &str) -> String {
    let one = t!("duration.minute.one", locale = lang);
    let few = t!("duration.minute.few", locale = lang);
    let many = t!("duration.minute.many", locale = lang);
    format!("{n} {}", pick(n, lang, &one, &few, &many))
}

/// Format a duration in seconds as "H hours M minutes" in the given
/// language, dropping zero components ("0 minutes" when empty).
pub fn format_duration(seconds: i64, lang: &str) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(hours_part(hours, lang));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(minutes_part(minutes, lang));
    }
    parts.join(" ")
}
