/// Dictionary differencer.
///
/// Walks the expected keys first, then the keys only the candidate has.
/// Values are compared under `[key]` with their kind re-resolved from the
/// runtime type; every difference lands in one aggregate.
use tracing::trace;

use super::Walk;
use super::member::both_null;
use crate::failure::{CheckError, ConfigError, Failure, FailureReport};
use crate::value::Value;

impl Walk<'_> {
    /// Compares two mapping values under `path`.
    pub(super) fn dictionary(
        &mut self,
        expected: &Value<'_>,
        candidate: &Value<'_>,
        path: &str,
    ) -> Result<(), CheckError> {
        if both_null(expected, candidate, path)? {
            return Ok(());
        }
        let (Some(expected), Some(candidate)) = (expected.as_map(), candidate.as_map()) else {
            return Err(ConfigError::ContainerMismatch {
                path: path.to_owned(),
                expected: expected.runtime_type().name().to_owned(),
                actual: candidate.runtime_type().name().to_owned(),
            }
            .into());
        };

        let mut report = FailureReport::new(path);
        for (key, value) in &expected.entries {
            let key_path = format!("[{key}]");
            match candidate.get(key) {
                None => report.push(Failure::new(key_path, value, "null")),
                Some(other) => {
                    let outcome = self.element(value, other, &key_path);
                    report.absorb(outcome)?;
                }
            }
        }
        for (key, value) in &candidate.entries {
            if !expected.contains_key(key) {
                report.push(Failure::new(format!("[{key}]"), "null", value));
            }
        }

        trace!(path, failures = report.len(), "dictionary compared");
        report.finish()
    }
}
