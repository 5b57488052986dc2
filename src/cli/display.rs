// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal output for the hybdex CLI.
//!
//! Boxed sections, aligned key/value rows and colored numbers. Colors are
//! plain 16-color ANSI and switch off under `NO_COLOR` or when stdout is not
//! a terminal.

use std::sync::OnceLock;

/// Width between the left and right box borders.
pub const BOX_WIDTH: usize = 72;

// ═══════════════════════════════════════════════════════════════════════════
// STYLES
// ═══════════════════════════════════════════════════════════════════════════

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const GRAY: &str = "\x1b[90m";

static COLORS: OnceLock<bool> = OnceLock::new();

/// `NO_COLOR` off and stdout a TTY. Cached after the first call.
pub fn use_colors() -> bool {
    *COLORS.get_or_init(|| std::env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stdout))
}

/// Wrap `text` in `styles` when colors are on.
pub fn paint(styles: &[&str], text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", styles.concat(), text, RESET)
    } else {
        text.to_string()
    }
}

fn border(text: &str) -> String {
    paint(&[GRAY], text)
}

/// Length without ANSI escape sequences.
pub fn visible_len(s: &str) -> usize {
    let mut in_escape = false;
    let mut len = 0;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape && c == 'm' {
            in_escape = false;
        } else if !in_escape {
            len += 1;
        }
    }
    len
}

pub fn pad_left(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_len(s));
    format!("{}{}", " ".repeat(pad), s)
}

pub fn pad_right(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_len(s));
    format!("{}{}", s, " ".repeat(pad))
}

// ═══════════════════════════════════════════════════════════════════════════
// BOXES
// ═══════════════════════════════════════════════════════════════════════════

/// `┌─ LABEL ─────┐`
pub fn section_top(label: &str) {
    println!("{}", rule('┌', '┐', label));
}

/// `├─ LABEL ─────┤`
pub fn section_mid(label: &str) {
    println!("{}", rule('├', '┤', label));
}

/// `└─────────────┘`
pub fn section_bot() {
    println!("{}", border(&format!("└{}┘", "─".repeat(BOX_WIDTH))));
}

/// `│ content     │`
pub fn row(content: &str) {
    let line = pad_right(&format!(" {}", content), BOX_WIDTH);
    println!("{}{}{}", border("│"), line, border("│"));
}

/// A row with the key in a fixed-width column.
pub fn kv(key: &str, value: &str) {
    row(&format!("{} {}", pad_right(&paint(&[DIM], key), 22), value));
}

fn rule(left: char, right: char, label: &str) -> String {
    let label = format!("─ {} ", paint(&[CYAN, BOLD], label));
    let fill = BOX_WIDTH.saturating_sub(visible_len(&label));
    format!(
        "{}{}{}",
        border(&left.to_string()),
        label,
        border(&format!("{}{}", "─".repeat(fill), right))
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// VALUES
// ═══════════════════════════════════════════════════════════════════════════

pub fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Thousands separators: `1234567` becomes `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Milliseconds, green under 5, yellow under 50, red above.
pub fn timing_ms(ms: f64) -> String {
    let text = format!("{:.3} ms", ms);
    let color = if ms < 5.0 {
        GREEN
    } else if ms < 50.0 {
        YELLOW
    } else {
        RED
    };
    paint(&[color], &text)
}

/// Bits per posting, green when at or under one byte.
pub fn bits_per_posting(bits: f64) -> String {
    let color = if bits <= 8.0 { GREEN } else { YELLOW };
    paint(&[color], &format!("{:>6.2} bits/posting", bits))
}

pub fn score_value(score: u32) -> String {
    paint(&[BLUE, BOLD], &format!("{:>7}", score))
}

pub fn error_label(text: &str) -> String {
    paint(&[RED, BOLD], text)
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
