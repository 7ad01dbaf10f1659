//! Maps native engine errors onto typed [`IbrsError`] kinds.
//!
//! The engine reports a single numeric code per failure, and several codes
//! are shared by unrelated failure classes. Those are told apart by matching
//! the message text. Rules are checked top to bottom and the first match
//! wins; a code whose message matches none of its rules falls through to
//! later rules and finally to [`ErrorKind::Driver`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ErrorKind, IbrsError, NativeError};

/// One row of the translation table. An empty `pattern` matches any message.
struct Rule {
    code: i32,
    pattern: &'static [&'static str],
    kind: ErrorKind,
}

const RULES: &[Rule] = &[
    Rule {
        code: -104,
        pattern: &[],
        kind: ErrorKind::SyntaxError,
    },
    Rule {
        code: -204,
        pattern: &["dynamic sql error", "table unknown"],
        kind: ErrorKind::TableNotFound,
    },
    Rule {
        code: -204,
        pattern: &["ambiguous field name"],
        kind: ErrorKind::NonUniqueFieldName,
    },
    Rule {
        code: -206,
        pattern: &["table unknown"],
        kind: ErrorKind::InvalidFieldName,
    },
    Rule {
        code: -206,
        pattern: &["column unknown"],
        kind: ErrorKind::InvalidFieldName,
    },
    Rule {
        code: -803,
        pattern: &[],
        kind: ErrorKind::UniqueConstraintViolation,
    },
    Rule {
        code: -530,
        pattern: &[],
        kind: ErrorKind::ForeignKeyConstraintViolation,
    },
    Rule {
        code: -607,
        pattern: &["already exists"],
        kind: ErrorKind::TableExists,
    },
    Rule {
        code: -902,
        pattern: &[],
        kind: ErrorKind::Connection,
    },
];

/// How a rule tests the message text.
enum Matcher {
    Any,
    Text(Regex),
}

impl Matcher {
    /// Case-insensitive, matching across line breaks. Parts must appear in order.
    fn new(pattern: &[&str]) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Matcher::Any);
        }
        let body = pattern
            .iter()
            .map(|part| regex::escape(part))
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("(?is){}", body)).map(Matcher::Text)
    }

    fn is_match(&self, message: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Text(regex) => regex.is_match(message),
        }
    }
}

struct CompiledRule {
    code: i32,
    matcher: Matcher,
    kind: ErrorKind,
}

/// A rule whose pattern does not compile is left out, so it never matches.
fn compile(rules: &[Rule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .filter_map(|rule| match Matcher::new(rule.pattern) {
            Ok(matcher) => Some(CompiledRule {
                code: rule.code,
                matcher,
                kind: rule.kind,
            }),
            Err(e) => {
                tracing::error!(code = rule.code, error = %e, "skipping error translation rule");
                None
            }
        })
        .collect()
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| compile(RULES));

fn classify_with(rules: &[CompiledRule], code: Option<i32>, message: &str) -> ErrorKind {
    let Some(code) = code else {
        return ErrorKind::Driver;
    };
    rules
        .iter()
        .filter(|rule| rule.code == code)
        .find(|rule| rule.matcher.is_match(message))
        .map(|rule| rule.kind)
        .unwrap_or(ErrorKind::Driver)
}

/// Classifies a native error code and message.
pub fn classify(code: Option<i32>, message: &str) -> ErrorKind {
    classify_with(&COMPILED, code, message)
}

/// Converts a native error into a typed error carrying its code and `message`.
///
/// The kind is chosen from the native error's own text; `message` is what
/// the resulting error reports (callers may pass a formatted message with
/// more context, or the native message itself).
pub fn convert_exception(message: &str, native: &NativeError) -> IbrsError {
    let kind = classify(native.code, &native.message);
    tracing::trace!(code = ?native.code, ?kind, "translated native error");
    IbrsError::from_kind(
        kind,
        NativeError {
            code: native.code,
            message: message.to_string(),
        },
    )
}

/// Shorthand for translating a native error without extra context.
pub(crate) fn translate(native: NativeError) -> IbrsError {
    let kind = classify(native.code, &native.message);
    IbrsError::from_kind(kind, native)
}
