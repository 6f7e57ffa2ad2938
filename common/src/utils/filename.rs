//! Dump file naming.

use chrono::{DateTime, Utc};

use crate::models::DumpKind;

/// Scope label used in place of a container name for host dumps.
pub const HOST_SCOPE_LABEL: &str = "host";

/// Builds the file name for a saved dump.
///
/// Shape: `{server}_{container|host}_{database}{_full|_data|_schema}_{timestamp}.sql`
/// with a second-resolution UTC timestamp. Every component is passed through
/// [`sanitize_component`], so the result never contains `:` or path separators.
pub fn dump_filename(
    server_id: &str,
    container_name: Option<&str>,
    database: &str,
    kind: DumpKind,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}_{}{}_{}.sql",
        sanitize_component(server_id),
        sanitize_component(container_name.unwrap_or(HOST_SCOPE_LABEL)),
        sanitize_component(database),
        kind.file_suffix(),
        at.format("%Y-%m-%dT%H-%M-%S"),
    )
}

/// File name for a dump saved under a caller-chosen name.
///
/// The name is sanitised like any other component and gets a `.sql`
/// extension unless it already has one.
pub fn custom_dump_filename(name: &str) -> String {
    let name = sanitize_component(name);
    if name.ends_with(".sql") {
        name
    } else {
        format!("{}.sql", name)
    }
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Leading dots are replaced too so a component cannot produce a hidden file
/// or a `..` segment. An empty input becomes `_`.
pub fn sanitize_component(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let leading_dots = out.chars().take_while(|c| *c == '.').count();
    if leading_dots > 0 {
        out.replace_range(..leading_dots, &"_".repeat(leading_dots));
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
