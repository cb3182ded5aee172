/// Collection differencer.
///
/// Counts are compared first when both sides can report one. Elements are
/// then compared pairwise by position up to the shorter side, each under the
/// path `[i]` with its kind re-resolved from the element's runtime type.
/// Mappings count as collections of entries: entry `i` is compared as
/// `[i].Key` and `[i].Value`. Every mismatch, the count included, is
/// reported in one aggregate.
use tracing::trace;

use super::Walk;
use super::member::both_null;
use crate::failure::{CheckError, ConfigError, Failure, FailureReport};
use crate::kind::ComparisonKind;
use crate::value::{Mapping, Sequence, Value};

impl Walk<'_> {
    /// Compares two sequence values under `path`. `kind` is either
    /// [`ComparisonKind::Collection`] or [`ComparisonKind::Count`].
    pub(super) fn sequence(
        &mut self,
        kind: ComparisonKind,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        if both_null(expected, candidate, path)? {
            return Ok(());
        }

        let mut report = FailureReport::new(path);
        if let (Some(e), Some(c)) = (expected.as_seq(), candidate.as_seq()) {
            self.sequence_items(kind, e, c, &mut report)?;
        } else if let (Some(e), Some(c)) = (expected.as_map(), candidate.as_map()) {
            self.mapping_entries(kind, e, c, &mut report)?;
        } else {
            return Err(ConfigError::ContainerMismatch {
                path: path.to_owned(),
                expected: expected.runtime_type().name().to_owned(),
                actual: candidate.runtime_type().name().to_owned(),
            }
            .into());
        }
        trace!(path, failures = report.len(), "collection compared");
        report.finish()
    }

    fn sequence_items(
        &mut self,
        kind: ComparisonKind,
        expected: &Sequence<'_>,
        candidate: &Sequence<'_>,
        report: &mut FailureReport,
    ) -> Result<(), CheckError> {
        let counts = expected.count().zip(candidate.count());
        let either_empty = expected.is_empty() || candidate.is_empty();
        if !compare_counts(kind, counts, either_empty, report) {
            return Ok(());
        }

        for (i, (e, c)) in expected.items.iter().zip(&candidate.items).enumerate() {
            let outcome = self.element(e, c, &format!("[{i}]"));
            report.absorb(outcome)?;
        }
        Ok(())
    }

    fn mapping_entries(
        &mut self,
        kind: ComparisonKind,
        expected: &Mapping<'_>,
        candidate: &Mapping<'_>,
        report: &mut FailureReport,
    ) -> Result<(), CheckError> {
        let counts = Some((expected.len(), candidate.len()));
        let either_empty = expected.is_empty() || candidate.is_empty();
        if !compare_counts(kind, counts, either_empty, report) {
            return Ok(());
        }

        let pairs = expected.entries.iter().zip(&candidate.entries);
        for (i, ((ek, ev), (ck, cv))) in pairs.enumerate() {
            let outcome = self.element(ek, ck, &format!("[{i}].Key"));
            report.absorb(outcome)?;
            let outcome = self.element(ev, cv, &format!("[{i}].Value"));
            report.absorb(outcome)?;
        }
        Ok(())
    }
}

/// Records a count difference. Returns `false` when elements are not to be
/// compared: the kind is [`ComparisonKind::Count`], or a counted side is
/// empty.
fn compare_counts(
    kind: ComparisonKind,
    counts: Option<(usize, usize)>,
    either_empty: bool,
    report: &mut FailureReport,
) -> bool {
    if let Some((e, c)) = counts {
        if e != c {
            report.push(Failure::new("Count", e, c));
        }
    }
    kind != ComparisonKind::Count && !(counts.is_some() && either_empty)
}
