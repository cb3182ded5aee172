/// Comparison failures and configuration errors.
///
/// A mismatch carries a dot/bracket-qualified path plus the representations
/// of both sides. Container differencers collect child mismatches into an
/// [`AggregateFailure`] so that one assertion reports every difference in
/// the container. Configuration errors are never aggregated.
use std::fmt;

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// A single divergence between expected and candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Qualified path of the diverging member.
    pub path: String,
    /// Representation of the expected side.
    pub expected: String,
    /// Representation of the candidate side.
    pub actual: String,
}

impl Failure {
    /// Builds a failure from any displayable representations.
    pub fn new(
        path: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Expected side absent, candidate side present.
    pub fn null_expected(path: impl Into<String>) -> Self {
        Self::new(path, "null", "not null")
    }

    /// Expected side present, candidate side absent.
    pub fn null_candidate(path: impl Into<String>) -> Self {
        Self::new(path, "not null", "null")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Expected:<{}>. Actual:<{}>",
            self.path, self.expected, self.actual
        )
    }
}

impl std::error::Error for Failure {}

// ---------------------------------------------------------------------------
// AggregateFailure
// ---------------------------------------------------------------------------

/// Every mismatch found inside one container member.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFailure {
    /// Path of the container member.
    pub path: String,
    /// Child mismatches, in discovery order. Never empty.
    pub failures: Vec<CheckError>,
}

impl AggregateFailure {
    /// Flattens nested aggregates into their leaf failures.
    pub fn leaves(&self) -> Vec<&CheckError> {
        let mut out = Vec::new();
        for child in &self.failures {
            match child {
                CheckError::Aggregate(inner) => out.extend(inner.leaves()),
                CheckError::Mismatch(_) | CheckError::Coercion(_) | CheckError::Config(_) => {
                    out.push(child);
                }
            }
        }
        out
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for child in &self.failures {
            write!(f, "\n{child}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

// ---------------------------------------------------------------------------
// CoercionFailure
// ---------------------------------------------------------------------------

/// A value was present but of an unexpected runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure {
    /// Qualified path of the member.
    pub path: String,
    /// Which side held the value: `"expected"` or `"candidate"`.
    pub role: &'static str,
    /// Representation of the offending value.
    pub value: String,
    /// Runtime type of the offending value.
    pub runtime: String,
    /// Type the value had to be unwrapped to.
    pub target: String,
}

impl fmt::Display for CoercionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Could not cast {} value {} ({}) to {}",
            self.path, self.role, self.value, self.runtime, self.target
        )
    }
}

impl std::error::Error for CoercionFailure {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors in how comparison rules were set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An `Id` comparison was requested with no identity strategy assigned.
    NoIdentityStrategy,
    /// A member was marked `Id` but its declared type has no identity.
    IdentityUnsupported {
        /// Member name.
        member: String,
        /// Declared type of the member.
        type_name: String,
    },
    /// Auto-build is disabled and no rule-set was registered for a shape.
    NoRuleSet {
        /// Shape name.
        type_name: String,
    },
    /// The comparison kind cannot be dispatched.
    UnsupportedKind(String),
    /// A rule-set referred to a member the shape does not declare.
    UnknownMember {
        /// Shape name.
        shape: String,
        /// Requested member name.
        member: String,
    },
    /// The two sides of a container member are not the same kind of container.
    ContainerMismatch {
        /// Qualified path of the member.
        path: String,
        /// Description of the expected side.
        expected: String,
        /// Description of the candidate side.
        actual: String,
    },
    /// An `Entity` comparison re-entered a pair already being compared.
    CycleDetected {
        /// Qualified path where the cycle closed.
        path: String,
    },
    /// A member-name pattern in a conventions file is not a valid regex.
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIdentityStrategy => {
                f.write_str("no identity strategy assigned, cannot perform Id check")
            }
            Self::IdentityUnsupported { member, type_name } => {
                write!(f, "member {member}: type ({type_name}) must support Id check")
            }
            Self::NoRuleSet { type_name } => {
                write!(f, "no rule-set registered for {type_name}")
            }
            Self::UnsupportedKind(kind) => write!(f, "cannot perform comparison: {kind}"),
            Self::UnknownMember { shape, member } => {
                write!(f, "{shape} does not declare a member named {member:?}")
            }
            Self::ContainerMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{path}: container kinds differ (expected {expected}, candidate {actual})"
            ),
            Self::CycleDetected { path } => {
                write!(f, "{path}: cycle detected without an Id-kind boundary")
            }
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid member pattern {pattern:?}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// CheckError
// ---------------------------------------------------------------------------

/// Any error raised by a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// One member diverged.
    Mismatch(Failure),
    /// One or more mismatches inside a container member.
    Aggregate(AggregateFailure),
    /// A value could not be unwrapped to the type a comparer expects.
    Coercion(CoercionFailure),
    /// The comparison rules are misconfigured.
    Config(ConfigError),
}

impl CheckError {
    /// Returns `true` for data mismatches, `false` for configuration errors.
    pub fn is_mismatch(&self) -> bool {
        match self {
            Self::Mismatch(_) | Self::Aggregate(_) | Self::Coercion(_) => true,
            Self::Config(_) => false,
        }
    }

    /// Path reported by this error, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Mismatch(f) => Some(&f.path),
            Self::Aggregate(a) => Some(&a.path),
            Self::Coercion(c) => Some(&c.path),
            Self::Config(ConfigError::ContainerMismatch { path, .. })
            | Self::Config(ConfigError::CycleDetected { path }) => Some(path),
            Self::Config(_) => None,
        }
    }

    /// The single failure, if this is a plain mismatch.
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Mismatch(f) => Some(f),
            Self::Aggregate(_) | Self::Coercion(_) | Self::Config(_) => None,
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch(e) => e.fmt(f),
            Self::Aggregate(e) => e.fmt(f),
            Self::Coercion(e) => e.fmt(f),
            Self::Config(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Mismatch(_) | Self::Aggregate(_) | Self::Coercion(_) => None,
        }
    }
}

impl From<Failure> for CheckError {
    fn from(e: Failure) -> Self {
        Self::Mismatch(e)
    }
}

impl From<AggregateFailure> for CheckError {
    fn from(e: AggregateFailure) -> Self {
        Self::Aggregate(e)
    }
}

impl From<CoercionFailure> for CheckError {
    fn from(e: CoercionFailure) -> Self {
        Self::Coercion(e)
    }
}

impl From<ConfigError> for CheckError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// FailureReport
// ---------------------------------------------------------------------------

/// Collects the mismatches found under one container member.
#[derive(Debug)]
pub struct FailureReport {
    path: String,
    failures: Vec<CheckError>,
}

impl FailureReport {
    /// Starts an empty report for the container at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            failures: Vec::new(),
        }
    }

    /// Records a failure.
    pub fn push(&mut self, failure: impl Into<CheckError>) {
        self.failures.push(failure.into());
    }

    /// Records a mismatch from `result`; configuration errors propagate.
    pub fn absorb(&mut self, result: Result<(), CheckError>) -> Result<(), CheckError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_mismatch() => {
                self.failures.push(e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Succeeds when empty, otherwise raises one aggregated failure.
    pub fn finish(self) -> Result<(), CheckError> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(CheckError::Aggregate(AggregateFailure {
            path: self.path,
            failures: self.failures,
        }))
    }
}
