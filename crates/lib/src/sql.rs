//! # SQL Extraction
//!
//! Turns a free-form model response into a single SQL statement.

/// Dialect tags a model may put after an opening code fence.
const FENCE_TAGS: [&str; 4] = ["postgresql", "postgres", "psql", "sql"];

/// Strips surrounding whitespace and one pair of markdown code-fence delimiters.
///
/// The statement itself is not inspected: a malformed statement is only
/// discovered when it is executed.
pub fn extract_sql(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = strip_fence_tag(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim().to_string()
}

/// Removes a dialect tag directly following an opening fence, but only when the
/// tag is a whole word, so "```SELECT" keeps its statement intact.
fn strip_fence_tag(after_fence: &str) -> &str {
    for tag in FENCE_TAGS {
        let Some(head) = after_fence.get(..tag.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(tag) {
            continue;
        }
        let rest = &after_fence[tag.len()..];
        let at_boundary = rest
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
        if at_boundary {
            return rest;
        }
    }
    after_fence
}
