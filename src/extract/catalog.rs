//! Built-in field type catalog
//!
//! Each rule is a regular expression over the raw accumulated page content.
//! Capture groups matter: a match with groups becomes the concatenation of its
//! groups, not the whole match.

/// A named extraction rule
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Field type name used in extraction requests
    pub name: &'static str,

    /// Regular expression applied to the content
    pub pattern: &'static str,

    /// Short human-readable description
    pub description: &'static str,
}

pub const BUILTIN_RULES: &[FieldRule] = &[
    FieldRule {
        name: "phone",
        pattern: r"(\+?\d[\d\s\-()]{6,14}\d)",
        description: "7-15 digit phone numbers with optional +, spaces, hyphens, parentheses",
    },
    FieldRule {
        name: "dob",
        pattern: r"\b(0[1-9]|[12][0-9]|3[01])[-/.](0[1-9]|1[012])[-/.](19|20)\d\d\b",
        description: "day-month-year dates between 1900 and 2099",
    },
    FieldRule {
        name: "email",
        pattern: r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        description: "email addresses",
    },
    FieldRule {
        name: "name",
        pattern: r"\b[A-Z][a-z]{1,}\s[A-Z][a-z]{1,}\b",
        description: "two consecutive capitalized words",
    },
    FieldRule {
        name: "address",
        pattern: r"\d{1,5}\s\w+\s\w+",
        description: "a 1-5 digit number followed by two words",
    },
    FieldRule {
        name: "purchase_id",
        pattern: r"\b[A-Za-z0-9]{6,12}\b",
        description: "standalone 6-12 character alphanumeric tokens",
    },
    FieldRule {
        name: "username",
        pattern: r#"username["'>:\s]+([a-zA-Z0-9._-]{4,})"#,
        description: "values following a literal 'username' label",
    },
    FieldRule {
        name: "transaction_id",
        pattern: r"(TXN[\-_]?[0-9A-Za-z]{6,})",
        description: "TXN-prefixed transaction identifiers",
    },
    FieldRule {
        name: "payout",
        pattern: r"(\$\s?\d{1,3}(,\d{3})*(\.\d{2})?)",
        description: "dollar amounts with optional thousands separators and cents",
    },
];

/// Returns true if `name` is one of the built-in field types
pub fn is_builtin_field(name: &str) -> bool {
    BUILTIN_RULES.iter().any(|rule| rule.name == name)
}
