//! Normalisation helpers for device CLI output
//!
//! Shared by the SSH session (prompt matching, echo stripping) and the vendor
//! parsers (field extraction, table slicing).

use std::sync::LazyLock;

use regex::Regex;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("ANSI_ESCAPE is a valid regex pattern")
});

/// Paging prompts printed by devices whose terminal length could not be set
static PAGER_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(--\s*more\s*--.*|press any key to continue.*|<--- more --->)\s*$")
        .expect("PAGER_PROMPT is a valid regex pattern")
});

/// Markers printed by Cisco, HP and Hirschmann CLIs for rejected commands
const CLI_ERROR_MARKERS: &[&str] = &[
    "% invalid input",
    "% unknown command",
    "% incomplete command",
    "% ambiguous command",
    "invalid input ->",
    "error: unrecognized command",
    "error: invalid command",
    "invalid command",
];

/// Strips ANSI escapes, backspaces and carriage returns and trims trailing
/// whitespace on every line.
#[must_use]
pub fn clean_output(raw: &str) -> String {
    let without_ansi = ANSI_ESCAPE.replace_all(raw, "");
    let normalized = without_ansi.replace("\r\n", "\n");

    normalized
        .split('\n')
        .map(|line| {
            // A lone CR rewinds the line; keep what was printed last.
            let line = line.rsplit('\r').find(|part| !part.trim().is_empty()).unwrap_or("");
            line.replace('\u{8}', "").trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns true if the text ends with a pager prompt that needs a keypress
#[must_use]
pub fn ends_with_pager(text: &str) -> bool {
    let tail = last_line(text);
    PAGER_PROMPT.is_match(tail)
}

/// Removes pager prompts left inside captured output
#[must_use]
pub fn strip_pager_prompts(text: &str) -> String {
    text.lines()
        .filter_map(|line| {
            if !PAGER_PROMPT.is_match(line) {
                return Some(line.to_string());
            }
            let rest = PAGER_PROMPT.replace(line, "");
            let rest = rest.trim_end();
            (!rest.is_empty()).then(|| rest.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the last non-empty line of the text
#[must_use]
pub fn last_line(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r', ' '])
        .rsplit('\n')
        .next()
        .unwrap_or("")
        .trim_start_matches('\r')
}

/// Splits a captured command response into body and trailing prompt
///
/// The first line is dropped when it is the echo of `command`; the last
/// line is the prompt the capture stopped at.
#[must_use]
pub fn split_response(output: &str, command: &str) -> (String, String) {
    let mut lines: Vec<&str> = output.trim_end_matches('\n').split('\n').collect();
    let prompt = lines.pop().unwrap_or("").trim().to_string();

    if let Some(first) = lines.first() {
        let cmd = command.trim();
        if !cmd.is_empty() && first.trim_end().ends_with(cmd) {
            lines.remove(0);
        }
    }
    (lines.join("\n"), prompt)
}

/// Returns true if the output is the CLI rejecting the command
#[must_use]
pub fn is_cli_error(text: &str) -> bool {
    let head: String = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    CLI_ERROR_MARKERS.iter().any(|marker| head.contains(marker))
}

/// Extracts the first capture group of the first matching pattern
///
/// Empty captures are skipped so that a later, more permissive pattern can
/// still match.
#[must_use]
pub fn extract_first(text: &str, patterns: &[&Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Derives a hostname from a CLI prompt such as `core-sw01#`,
/// `core-sw01(config)#`, `HP-2920>` or `(GRS1042) >`.
#[must_use]
pub fn hostname_from_prompt(prompt: &str) -> Option<String> {
    let trimmed = prompt.trim().trim_end_matches(['#', '>', '$', ' ']);
    let base = trimmed.split("(config").next().unwrap_or(trimmed);
    let base = base.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if base.is_empty() || base.contains(char::is_whitespace) {
        None
    } else {
        Some(base.to_string())
    }
}

/// Column positions derived from a fixed-width table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<(String, usize)>,
}

impl ColumnLayout {
    /// Builds a layout from a header line, locating each named column
    /// (case-insensitive, matched at a word start).
    ///
    /// Returns `None` if the header contains none of the names.
    #[must_use]
    pub fn from_header(header: &str, names: &[&str]) -> Option<Self> {
        let lower = header.to_lowercase();
        let mut columns: Vec<(String, usize)> = names
            .iter()
            .filter_map(|name| {
                let needle = name.to_lowercase();
                find_word(&lower, &needle).map(|pos| ((*name).to_string(), pos))
            })
            .collect();
        if columns.is_empty() {
            return None;
        }
        columns.sort_by_key(|(_, pos)| *pos);
        Some(Self { columns })
    }

    /// Byte offset of a column
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, pos)| *pos)
    }

    /// Text of a left-aligned column, up to the start of the next column
    #[must_use]
    pub fn field<'a>(&self, row: &'a str, name: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        let start = self.columns[idx].1;
        let end = self
            .columns
            .get(idx + 1)
            .map_or(row.len(), |(_, pos)| (*pos).min(row.len()));
        if start >= end {
            return None;
        }
        let value = row.get(start..end)?.trim();
        (!value.is_empty()).then_some(value)
    }

    /// Whitespace-separated tokens from the start of a column to the end of
    /// the row. Used where trailing columns are right-aligned.
    #[must_use]
    pub fn tokens_from<'a>(&self, row: &'a str, name: &str) -> Vec<&'a str> {
        self.position(name)
            .and_then(|start| row.get(start..))
            .map(|rest| rest.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Finds `needle` in `haystack` where it starts a word
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(pos, _)| pos).find(|&pos| {
        pos == 0
            || haystack[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| !c.is_alphanumeric())
    })
}

/// Returns true for table separator rows (`-----  ----`, `=====`, `+---+`)
#[must_use]
pub fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '-' | '=' | '+' | ' ' | '|'))
}
