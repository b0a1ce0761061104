// =====================================================
// PER-VALUE TEXT TRANSFORMS
// =====================================================
//
// Pure functions over a single column value. Replace-style transforms also
// expose a LIKE pattern so the reader can exclude non-matching rows before
// anything is transformed.


/// A single transform step applied to one column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Convert HTML character references (named and numeric) to literal
    /// characters. Single pass; already-decoded text comes back unchanged.
    DecodeEntities,
    /// Literal, case-sensitive replacement of every occurrence.
    Replace { search: String, replace: String },
    /// Replace, then drop the last `subtract` characters.
    ReplaceSubtract {
        search: String,
        replace: String,
        subtract: usize,
    },
    /// Strip leading and trailing whitespace.
    Trim,
}

impl Transform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Transform::DecodeEntities => decode_entities(value),
            Transform::Replace { search, replace } => value.replace(search.as_str(), replace),
            Transform::ReplaceSubtract {
                search,
                replace,
                subtract,
            } => {
                let replaced = value.replace(search.as_str(), replace);
                truncate_suffix(&replaced, *subtract)
            }
            Transform::Trim => value.trim().to_string(),
        }
    }

    /// LIKE pattern selecting rows this transform can possibly change.
    /// `None` means every row is a candidate.
    pub fn like_pattern(&self) -> Option<String> {
        match self {
            Transform::Replace { search, .. } | Transform::ReplaceSubtract { search, .. } => {
                Some(format!("%{}%", search))
            }
            Transform::DecodeEntities | Transform::Trim => None,
        }
    }
}

/// Applies steps in order.
pub fn apply_steps(steps: &[Transform], value: &str) -> String {
    let mut current = value.to_string();
    for step in steps {
        current = step.apply(&current);
    }
    current
}

fn truncate_suffix(value: &str, subtract: usize) -> String {
    if subtract == 0 {
        return value.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if subtract >= chars.len() {
        return String::new();
    }
    chars[..chars.len() - subtract].iter().collect()
}

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("copy", "\u{a9}"),
    ("reg", "\u{ae}"),
    ("trade", "\u{2122}"),
    ("deg", "\u{b0}"),
    ("hellip", "\u{2026}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("laquo", "\u{ab}"),
    ("raquo", "\u{bb}"),
    ("euro", "\u{20ac}"),
    ("pound", "\u{a3}"),
    ("cent", "\u{a2}"),
    ("yen", "\u{a5}"),
    ("sect", "\u{a7}"),
    ("middot", "\u{b7}"),
    ("times", "\u{d7}"),
    ("divide", "\u{f7}"),
    ("plusmn", "\u{b1}"),
    ("frac12", "\u{bd}"),
    ("frac14", "\u{bc}"),
    ("sup2", "\u{b2}"),
    ("sup3", "\u{b3}"),
    ("bull", "\u{2022}"),
    ("dagger", "\u{2020}"),
    ("permil", "\u{2030}"),
    ("micro", "\u{b5}"),
    ("para", "\u{b6}"),
    ("szlig", "\u{df}"),
    ("agrave", "\u{e0}"),
    ("aacute", "\u{e1}"),
    ("eacute", "\u{e9}"),
    ("egrave", "\u{e8}"),
    ("ouml", "\u{f6}"),
    ("uuml", "\u{fc}"),
    ("auml", "\u{e4}"),
    ("ccedil", "\u{e7}"),
    ("ntilde", "\u{f1}"),
];

/// Single-pass HTML character-reference decoding. Unrecognised references
/// are left untouched.
pub fn decode_entities(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];

        match decode_reference(candidate) {
            Some((decoded, consumed)) => {
                output.push_str(&decoded);
                rest = &candidate[consumed..];
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Decodes one reference starting at `&`. Returns the literal text and the
/// byte length consumed, or `None` when the text is not a reference.
fn decode_reference(candidate: &str) -> Option<(String, usize)> {
    let semicolon = candidate[1..].find(';').map(|pos| pos + 1)?;
    // References are short; a distant semicolon means a bare ampersand.
    if semicolon > 32 {
        return None;
    }
    let body = &candidate[1..semicolon];

    if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse::<u32>().ok()?
        };
        let decoded = char::from_u32(code)?;
        return Some((decoded.to_string(), semicolon + 1));
    }

    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, literal)| (literal.to_string(), semicolon + 1))
}
