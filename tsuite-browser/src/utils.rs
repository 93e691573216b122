//! Utility functions for TSuite rendering

use std::cmp::Ordering;

/// Format elapsed seconds for human-readable output
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "n/a".to_string();
    }
    if seconds < 0.001 {
        format!("{:.0}μs", seconds * 1_000_000.0)
    } else if seconds < 1.0 {
        format!("{:.1}ms", seconds * 1_000.0)
    } else if seconds < 120.0 {
        format!("{:.2}s", seconds)
    } else {
        let total = seconds.round() as u64;
        format!("{}m{:02}s", total / 60, total % 60)
    }
}

/// Format a percent change with an explicit sign
pub fn format_percent(percent: f64) -> String {
    format!("{:+.1}%", percent)
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make serialized JSON safe to embed inside a `<script>` element
pub fn escape_json_for_script(s: &str) -> String {
    s.replace("</", "<\\/")
}

/// Turn a test name into a file name usable in a static report.
///
/// Distinct names always give distinct slugs: bytes outside `[A-Za-z0-9_-]`
/// become `.XX`, so a `.` only ever starts an escape.
pub fn file_slug(s: &str) -> String {
    if s.is_empty() {
        return ".".to_string();
    }
    urlencoding::encode(s)
        .replace('.', "%2E")
        .replace('~', "%7E")
        .replace('%', ".")
}

/// Compare labels so embedded numbers sort by value (`disk2` before `disk10`)
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let ord = left
                    .trim_start_matches('0')
                    .len()
                    .cmp(&right.trim_start_matches('0').len())
                    .then_with(|| left.trim_start_matches('0').cmp(right.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
