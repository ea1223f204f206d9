//! Identifier conversion for generated Rust source.

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["crate", "self", "Self", "super"];

/// Split a catalog name into lowercase words.
///
/// Underscores, dashes, spaces and lower→upper case changes all separate
/// words, so `userID`, `user_id` and `User-Id` agree.
fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in s.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = matches!(prev, Some(p) if (p.is_lowercase() || p.is_ascii_digit()) && c.is_uppercase());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert a table name to a type name: `payment_events` → `PaymentEvents`.
pub fn to_pascal_case(s: &str) -> String {
    let name: String = words(s)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    lead_with_letter(name, "T")
}

/// Convert a column name to a field name: `createdAt` → `created_at`.
pub fn to_snake_case(s: &str) -> String {
    lead_with_letter(words(s).join("_"), "f_")
}

/// Convert to a constant name: `created_at` → `CREATED_AT`.
pub fn to_screaming_snake_case(s: &str) -> String {
    words(s).join("_").to_uppercase()
}

/// Make `ident` usable as a field or module name.
pub fn escape_keyword(ident: &str) -> String {
    if RESERVED.contains(&ident) {
        format!("{}_", ident)
    } else if RUST_KEYWORDS.contains(&ident) {
        format!("r#{}", ident)
    } else {
        ident.to_string()
    }
}

/// Field name for a column, snake-cased and keyword-escaped.
pub fn field_name(column: &str) -> String {
    escape_keyword(&to_snake_case(column))
}

/// Module name for a table: `order_items`, `r#type`, `self_`.
pub fn module_name(table: &str) -> String {
    escape_keyword(&to_snake_case(table))
}

/// Struct name for a table. `self` becomes `Self_`.
pub fn type_name(table: &str) -> String {
    escape_keyword(&to_pascal_case(table))
}

fn lead_with_letter(name: String, prefix: &str) -> String {
    match name.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("{}{}", prefix, name),
        None => prefix.trim_end_matches('_').to_string(),
        _ => name,
    }
}
