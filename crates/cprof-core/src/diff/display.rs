//! Diff display formatting for user review

use std::fmt::Write;

use crate::diff::ProfileDiff;

/// Format a profile diff for terminal display
#[must_use]
pub fn format_diff_terminal(diff: &ProfileDiff) -> String {
    let mut output = String::new();

    if diff.is_empty() {
        output.push_str("No changes\n");
        return output;
    }

    if let Some((saved, live)) = &diff.description_change {
        let _ = writeln!(output, "Description: \"{saved}\" -> \"{live}\"");
        output.push('\n');
    }

    for scope_diff in &diff.scopes {
        let _ = writeln!(output, "=== {} ===", scope_diff.scope);
        for item in &scope_diff.items {
            let _ = write!(output, "  {} {}: {}", item.op.marker(), item.kind, item.name);
            if let Some(detail) = &item.detail {
                let _ = write!(output, " ({detail})");
            }
            output.push('\n');
        }
        output.push('\n');
    }

    let _ = writeln!(output, "{}", diff.counts().one_line());
    output
}
