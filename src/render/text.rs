// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Approximate advance of one character at the default font size.
pub(crate) const CHAR_WIDTH: f64 = 8.5;
pub(crate) const MAX_LABEL_CHARS: usize = 48;

pub(crate) fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    let len = text_len(text);
    if len <= max_len {
        return text.to_owned();
    }

    if max_len == 1 {
        return "…".to_owned();
    }

    let mut out: String = text.chars().take(max_len - 1).collect();
    out.push('…');
    out
}

pub(crate) fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Label as drawn: first line only, truncated to [`MAX_LABEL_CHARS`].
pub(crate) fn display_label(label: &str) -> String {
    let first_line = label.lines().next().unwrap_or_default();
    truncate_with_ellipsis(first_line, MAX_LABEL_CHARS)
}

pub(crate) fn label_width(label: &str) -> f64 {
    text_len(label) as f64 * CHAR_WIDTH
}
