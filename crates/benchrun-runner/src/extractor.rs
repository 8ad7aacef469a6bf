//! Recovery of a unified diff from free-form model output.
//!
//! This is a syntactic step only: nothing here checks that the diff applies.

use std::sync::LazyLock;

use regex::Regex;

/// First fenced block tagged `diff`. The interior is captured lazily up to
/// the next closing fence.
static DIFF_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```diff[ \t]*\r?\n(.*?)```").expect("diff fence pattern is valid")
});

/// Extract the best candidate patch from `text`.
///
/// In priority order:
/// 1. the interior of the first ```` ```diff ```` fenced block, trimmed;
/// 2. everything from the first line starting with `---`, `+++` or `@@`;
/// 3. the whole input.
///
/// The result ends with exactly one newline: a missing one is appended and
/// a run of trailing newlines is collapsed.
pub fn extract_patch(text: &str) -> String {
    let body = fenced_diff(text)
        .or_else(|| diff_tail(text))
        .unwrap_or(text)
        .trim_end_matches('\n');

    let mut patch = String::with_capacity(body.len() + 1);
    patch.push_str(body);
    patch.push('\n');
    patch
}

fn fenced_diff(text: &str) -> Option<&str> {
    DIFF_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn diff_tail(text: &str) -> Option<&str> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with("---") || line.starts_with("+++") || line.starts_with("@@") {
            return Some(&text[offset..]);
        }
        offset += line.len();
    }
    None
}
