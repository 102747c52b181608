//! Unified diff generation utilities.
//!
//! Produces standard unified diff text (three lines of context) for a file's
//! text before and after rewriting. The line alignment comes from
//! [`difference::Changeset`].

use difference::{Changeset, Difference};

/// Lines of unchanged context around each hunk.
const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Same,
    Add,
    Rem,
}

impl Tag {
    fn prefix(self) -> char {
        match self {
            Tag::Same => ' ',
            Tag::Add => '+',
            Tag::Rem => '-',
        }
    }
}

/// Generate a unified diff of `before` -> `after` for `path`.
///
/// Returns an empty string when the texts are identical.
pub fn unified_diff(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let changeset = Changeset::new(before, after, "\n");
    let mut lines: Vec<(Tag, &str)> = Vec::new();
    for chunk in &changeset.diffs {
        let (tag, text) = match chunk {
            Difference::Same(text) => (Tag::Same, text),
            Difference::Add(text) => (Tag::Add, text),
            Difference::Rem(text) => (Tag::Rem, text),
        };
        lines.extend(text.split('\n').map(|line| (tag, line)));
    }
    // both texts ending in "\n" leave one phantom empty line at the end
    if lines.last() == Some(&(Tag::Same, "")) {
        lines.pop();
    }

    let mut diff = format!("--- a/{}\n+++ b/{}\n", path, path);
    for (start, end) in hunk_ranges(&lines) {
        write_hunk(&mut diff, &lines, start, end);
    }
    diff
}

/// Group changed lines into `[start, end)` ranges padded with context,
/// merging ranges whose context overlaps.
fn hunk_ranges(lines: &[(Tag, &str)]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (i, (tag, _)) in lines.iter().enumerate() {
        if *tag == Tag::Same {
            continue;
        }
        let start = i.saturating_sub(CONTEXT);
        let end = (i + 1 + CONTEXT).min(lines.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

fn write_hunk(diff: &mut String, lines: &[(Tag, &str)], start: usize, end: usize) {
    let old_before = lines[..start].iter().filter(|(t, _)| *t != Tag::Add).count();
    let new_before = lines[..start].iter().filter(|(t, _)| *t != Tag::Rem).count();
    let old_count = lines[start..end].iter().filter(|(t, _)| *t != Tag::Add).count();
    let new_count = lines[start..end].iter().filter(|(t, _)| *t != Tag::Rem).count();
    let old_start = if old_count == 0 { old_before } else { old_before + 1 };
    let new_start = if new_count == 0 { new_before } else { new_before + 1 };

    diff.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        old_start, old_count, new_start, new_count
    ));
    for (tag, line) in &lines[start..end] {
        diff.push(tag.prefix());
        diff.push_str(line);
        diff.push('\n');
    }
}

// ============================================================================
// Tests
// ============================================================================
