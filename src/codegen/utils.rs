//! Naming helpers shared by the generators and emitters.

use convert_case::{Case, Casing};

/// Rust keywords that cannot be used as bare identifiers.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    s.to_case(Case::Snake)
}

/// Convert a string to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.to_case(Case::Pascal)
}

/// Convert a string to SCREAMING_SNAKE_CASE
pub fn to_screaming_snake_case(s: &str) -> String {
    s.to_case(Case::ScreamingSnake)
}

/// Escape a string for use in Rust string literals
pub fn escape_rust_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Identifier usable in Rust source, switching keywords to raw identifiers.
pub fn rust_ident(name: &str) -> String {
    match name {
        // These cannot be raw identifiers either.
        "self" | "Self" | "super" | "crate" => format!("{}_", name),
        _ if RUST_KEYWORDS.contains(&name) => format!("r#{}", name),
        _ => name.to_string(),
    }
}

/// True if `name` is a usable Rust type name (PascalCase, not a keyword).
pub fn is_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
        && !RUST_KEYWORDS.contains(&name)
}

/// Turn a `a::b::c` (or `a.b.c`) namespace into the relative directory of
/// its generated files.
pub fn namespace_to_path(namespace: &str) -> String {
    namespace
        .split(|c| c == ':' || c == '.')
        .filter(|segment| !segment.is_empty())
        .map(to_snake_case)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_snake_case("HelloWorld"), "hello_world");
        assert_eq!(to_snake_case("claimId"), "claim_id");
        assert_eq!(to_pascal_case("hello_world"), "HelloWorld");
        assert_eq!(to_screaming_snake_case("hello_world"), "HELLO_WORLD");
        assert_eq!(to_screaming_snake_case("id"), "ID");
        assert_eq!(to_screaming_snake_case("BENE_ID"), "BENE_ID");
    }

    #[test]
    fn test_escape_rust_string() {
        assert_eq!(escape_rust_string("hello\nworld"), "hello\\nworld");
        assert_eq!(escape_rust_string("say \"hello\""), "say \\\"hello\\\"");
    }

    #[test]
    fn test_rust_ident() {
        assert_eq!(rust_ident("amount"), "amount");
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("self"), "self_");
    }

    #[test]
    fn test_is_type_name() {
        assert!(is_type_name("CarrierClaim"));
        assert!(!is_type_name("carrierClaim"));
        assert!(!is_type_name("Carrier Claim"));
        assert!(!is_type_name(""));
    }

    #[test]
    fn test_namespace_to_path() {
        assert_eq!(namespace_to_path("bluebutton::rif"), "bluebutton/rif");
        assert_eq!(namespace_to_path("gov.cms.model"), "gov/cms/model");
        assert_eq!(namespace_to_path(""), "");
    }
}
