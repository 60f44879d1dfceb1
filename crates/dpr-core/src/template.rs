//! Rename templates.
//!
//! A template is free text with bracketed placeholders, matched
//! case-insensitively and allowed any number of times:
//!
//! | placeholder               | value                               |
//! |---------------------------|-------------------------------------|
//! | `[original]`, `[filename]`| original base name, no extension    |
//! | `[ext]`                   | original extension, no leading dot  |
//! | `[date]`                  | `YYYYMMDD`                          |
//! | `[time]`                  | `HHMMSS`                            |
//! | `[datetime]`              | `YYYYMMDD-HHMMSS`                   |
//!
//! Any other bracketed token is copied through unchanged. Date and time use
//! local time at the moment of expansion.

use chrono::{Local, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Original,
    Ext,
    Date,
    Time,
    DateTime,
}

impl Placeholder {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "original" | "filename" => Some(Self::Original),
            "ext" => Some(Self::Ext),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "datetime" => Some(Self::DateTime),
            _ => None,
        }
    }
}

/// Split a filename at its last `.` into base name and extension.
///
/// A name without a dot, or whose only dot is the leading one (`.bashrc`),
/// has no extension.
pub fn split_filename(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        None | Some(0) => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

/// True when the template carries its own `[ext]` placeholder.
pub fn contains_ext_placeholder(template: &str) -> bool {
    template.to_ascii_lowercase().contains("[ext]")
}

/// Expand `template` against `original_filename` using the current local time.
pub fn expand(template: &str, original_filename: &str) -> String {
    expand_at(template, original_filename, Local::now().naive_local())
}

/// Expand `template` against `original_filename` at a fixed time.
pub fn expand_at(template: &str, original_filename: &str, now: NaiveDateTime) -> String {
    let (base, ext) = split_filename(original_filename);
    let mut out = String::with_capacity(template.len() + original_filename.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let bracketed = &rest[open..];
        let Some(close) = bracketed.find(']') else {
            out.push_str(bracketed);
            return out;
        };
        let token = &bracketed[1..close];
        if token.contains('[') {
            // `[[date]`: emit the stray bracket and rescan from the next one.
            out.push('[');
            rest = &bracketed[1..];
            continue;
        }
        match Placeholder::parse(token) {
            Some(Placeholder::Original) => out.push_str(base),
            Some(Placeholder::Ext) => out.push_str(ext.unwrap_or("")),
            Some(Placeholder::Date) => out.push_str(&now.format("%Y%m%d").to_string()),
            Some(Placeholder::Time) => out.push_str(&now.format("%H%M%S").to_string()),
            Some(Placeholder::DateTime) => {
                out.push_str(&now.format("%Y%m%d-%H%M%S").to_string())
            }
            None => out.push_str(&bracketed[..=close]),
        }
        rest = &bracketed[close + 1..];
    }

    out.push_str(rest);
    out
}
