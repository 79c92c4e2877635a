// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// The four whitespace spellings of `src <arrow> dst` a connection line may start with.
pub fn connection_line_prefixes(src: &str, arrow: Arrow, dst: &str) -> [String; 4] {
    let token = arrow.token();
    [
        format!("{src}{token}{dst}"),
        format!("{src} {token}{dst}"),
        format!("{src}{token} {dst}"),
        format!("{src} {token} {dst}"),
    ]
}

/// Removes every line that declares the `src <arrow> dst` connection.
///
/// Line-oriented: a matching line that opens a `{` block is removed together with its block,
/// and `a -> b; c` loses `c` as well. A prefix only matches when the destination ends there,
/// so deleting `a -> b` keeps `a -> bc`.
///
/// Returns `None` when no line matched.
pub fn strip_connection_lines(text: &str, src: &str, arrow: Arrow, dst: &str) -> Option<String> {
    let prefixes = connection_line_prefixes(src, arrow, dst);
    strip_lines(text, |trimmed| declares_connection(trimmed, &prefixes))
}

/// Removes only the `index`-th line connecting `src` to `dst`, whatever its arrow.
///
/// Lines are counted in text order, which in canonical text is edge order, so this addresses
/// the same edge as `(src -> dst)[index]`. Returns `None` when there are not enough lines.
pub fn strip_nth_connection_line(
    text: &str,
    src: &str,
    dst: &str,
    index: usize,
) -> Option<String> {
    let prefixes: Vec<String> = Arrow::TOKENS
        .iter()
        .flat_map(|(_, arrow)| connection_line_prefixes(src, *arrow, dst))
        .collect();
    let mut seen = 0;
    strip_lines(text, |trimmed| {
        if !declares_connection(trimmed, &prefixes) {
            return false;
        }
        seen += 1;
        seen == index + 1
    })
}

fn strip_lines(text: &str, mut doomed: impl FnMut(&str) -> bool) -> Option<String> {
    let mut removed = false;
    let mut open_braces = 0isize;
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        if open_braces > 0 {
            open_braces += brace_balance(line);
            continue;
        }
        if doomed(line.trim()) {
            removed = true;
            open_braces = brace_balance(line).max(0);
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    removed.then_some(out)
}

/// Opened minus closed braces on one line, ignoring quoted text.
fn brace_balance(line: &str) -> isize {
    let mut balance = 0;
    let mut quoted = false;
    let mut escaped = false;
    for ch in line.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            '{' if !quoted => balance += 1,
            '}' if !quoted => balance -= 1,
            _ => {}
        }
    }
    balance
}

fn declares_connection(trimmed: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .any(|prefix| trimmed.strip_prefix(prefix.as_str()).is_some_and(ends_connection_target))
}

fn ends_connection_target(rest: &str) -> bool {
    rest.chars().next().map_or(true, |ch| ch.is_whitespace() || matches!(ch, ':' | ';' | '{'))
}
