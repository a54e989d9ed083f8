//! Reference-date layouts.
//!
//! A layout spells out how the reference moment
//! `Mon Jan 2 15:04:05 -0700 2006` would be written, e.g. `2006-01-02`
//! or `02 Jan 06 15:04 -0700`. [`to_strftime`] rewrites such a layout into
//! the strftime pattern `chrono` parses with. A pattern that already
//! contains `%` is taken to be strftime and returned unchanged.
//!
//! Seconds are followed by an optional fraction even when the layout lists
//! none, and a `Z` offset element also accepts a literal `Z` for UTC.

use std::borrow::Cow;

/// Layout elements and their strftime equivalents. Longer elements come
/// first so that e.g. `2006` is never read as `2` followed by `006`.
const ELEMENTS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("_2006", "_%Y"),
    ("2006", "%Y"),
    ("Z07:00", "%#z"),
    ("Z0700", "%#z"),
    ("Z07", "%#z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("-07", "%#z"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    (".999999999", "%.f"),
    (".999999", "%.f"),
    (".999", "%.f"),
    ("002", "%j"),
    ("__2", "%j"),
    ("15", "%H"),
    ("06", "%y"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%m"),
    ("2", "%d"),
    ("3", "%I"),
    ("4", "%M"),
    ("5", "%S"),
];

pub fn to_strftime(layout: &str) -> Cow<'_, str> {
    if layout.contains('%') {
        return Cow::Borrowed(layout);
    }

    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'scan: while !rest.is_empty() {
        for (element, spec) in ELEMENTS {
            if let Some(tail) = rest.strip_prefix(element) {
                out.push_str(spec);
                if *spec == "%S" && !has_fraction(tail) {
                    out.push_str("%.f");
                }
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    Cow::Owned(out)
}

fn has_fraction(tail: &str) -> bool {
    [".0", ".9"]
        .iter()
        .any(|prefix| tail.starts_with(prefix))
}
