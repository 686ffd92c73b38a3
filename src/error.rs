//! The kernel's error surface (§7). Validation errors abort the offending call; `TimedOut`
//! propagates out of an entire `rewrite` call unchanged; `Fail` is a non-exceptional outcome,
//! folded locally by the driver rather than raised, but kept here so a caller driving the matcher
//! directly through the `Result`-returning entry points gets a typed value for it too.

use crate::atom::Atom;

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("match failed: {reason} (pattern {pattern}, subject {subject})")]
    Fail {
        reason: String,
        pattern: Box<Atom>,
        subject: Box<Atom>,
        #[source]
        cause: Option<Box<RewriteError>>,
    },

    #[error("no such ruleset: {0}")]
    NoSuchRuleset(String),

    #[error("identity rule: pattern and rewrite are structurally equal")]
    IdentityRule,

    #[error("rule pattern must not be a bare (always-bindable) variable")]
    BindablePattern,

    #[error("rule pattern must not be a bare literal unless literal rules are enabled")]
    LiteralPattern,

    #[error("illegal algebraic properties: {0}")]
    IllegalProperties(String),

    #[error("rewrite timed out")]
    TimedOut,

    #[error("native handler construction failed: {0}")]
    NativeHandler(String),
}

impl RewriteError {
    pub fn fail(reason: impl Into<String>, pattern: Atom, subject: Atom) -> Self {
        RewriteError::Fail {
            reason: reason.into(),
            pattern: Box::new(pattern),
            subject: Box::new(subject),
            cause: None,
        }
    }

    pub fn fail_because(reason: impl Into<String>, pattern: Atom, subject: Atom, cause: RewriteError) -> Self {
        RewriteError::Fail {
            reason: reason.into(),
            pattern: Box::new(pattern),
            subject: Box::new(subject),
            cause: Some(Box::new(cause)),
        }
    }
}

pub type RewriteResult<T> = Result<T, RewriteError>;
