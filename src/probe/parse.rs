// ABOUTME: Parsers for alembic and psql output.
// ABOUTME: Extracts head revisions, history revisions, and the applied revision.

use crate::types::{MigrationHistory, MigrationId};

use super::ProbeError;

/// `alembic heads` prints one `<rev> (head)` line per head, or
/// `<rev> (effective head)` for a head reached only through `depends_on`.
pub fn parse_heads(output: &str) -> Result<MigrationId, ProbeError> {
    let heads: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| is_head_line(line))
        .filter_map(|line| line.split_whitespace().next())
        .collect();

    match heads.as_slice() {
        [] => Err(ProbeError::NoHead),
        [head] => Ok(MigrationId::new(head)?),
        many => Err(ProbeError::MultipleHeads(
            many.iter().map(|h| h.to_string()).collect(),
        )),
    }
}

fn is_head_line(line: &str) -> bool {
    line.split_once(" (")
        .is_some_and(|(_, suffix)| suffix.ends_with("head)"))
}

/// `alembic history` prints newest first, one `<down> -> <rev> [(flags)], <message>`
/// per revision; merge revisions list their parents comma-separated.
pub fn parse_history(output: &str) -> Result<MigrationHistory, ProbeError> {
    let mut revisions = Vec::new();

    for line in output.lines() {
        let Some((_, after_arrow)) = line.split_once(" -> ") else {
            if !line.trim().is_empty() {
                tracing::debug!("Skipping alembic history line: {}", line);
            }
            continue;
        };

        let rev = after_arrow
            .split(|c: char| c == ',' || c.is_whitespace())
            .find(|part| !part.is_empty())
            .ok_or_else(|| ProbeError::Unparseable(line.to_string()))?;

        revisions.push(MigrationId::new(rev)?);
    }

    Ok(MigrationHistory::new(revisions))
}

/// `psql -tA` prints the bare `version_num`.
pub fn parse_current(output: &str) -> Result<Option<MigrationId>, ProbeError> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(MigrationId::new)
        .transpose()
        .map_err(ProbeError::from)
}
