//! Safety classifier for the query tool.
//!
//! Advisory, not a security boundary. The check is a case-insensitive substring
//! scan for mutating keywords followed by a space. It does not parse SQL, so a
//! keyword inside a comment or string literal is still matched, and a keyword
//! followed by a tab or newline is not. It only stops casual destructive calls;
//! use database roles and permissions for real access control.

/// Keywords that mark a query as potentially mutating. The trailing space keeps
/// identifiers such as `updated_at` or `created_by` from matching.
pub const DENYLIST: [&str; 7] = [
    "drop ",
    "truncate ",
    "delete ",
    "update ",
    "alter ",
    "create ",
    "insert ",
];

/// Outcome of classifying a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    Allowed,
    /// The first denylist token found in the query.
    Denied { keyword: &'static str },
}

impl SafetyVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Classify query text against the denylist.
///
/// # Examples
///
/// ```
/// use postgres_mcp_server::tools::guard::{classify, SafetyVerdict};
///
/// assert_eq!(classify("SELECT updated_at FROM t"), SafetyVerdict::Allowed);
/// assert_eq!(
///     classify("DROP TABLE t"),
///     SafetyVerdict::Denied { keyword: "drop " }
/// );
/// ```
pub fn classify(sql: &str) -> SafetyVerdict {
    let lower = sql.to_lowercase();
    DENYLIST
        .into_iter()
        .find(|keyword| lower.contains(keyword))
        .map_or(SafetyVerdict::Allowed, |keyword| SafetyVerdict::Denied {
            keyword,
        })
}
