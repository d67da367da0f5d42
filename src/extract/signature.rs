//! Tokenizer for C#-style method and property signature lines.
use super::ExtractError;

/// A parsed method signature line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignature {
    pub name: String,
    /// `None` for constructors (no return type before the name).
    pub return_type: Option<String>,
    pub is_static: bool,
    /// (name, type) pairs in declaration order.
    pub parameters: Vec<(String, Option<String>)>,
}

/// Parse a signature line like `void AddForce(Vector3 force)` or
/// `static T Instantiate<T>(T original)`.
///
/// Splits on parentheses and commas at top level, so generic arguments
/// containing commas (`Dictionary<string, int>`) stay intact. A line
/// without parentheses is treated as `return-type name` with no
/// parameter list.
pub fn parse_signature(sig: &str) -> Result<ParsedSignature, ExtractError> {
    let sig = sig.trim();
    if sig.is_empty() {
        return Err(ExtractError::MalformedSignature("empty signature".into()));
    }

    let (head, args) = match find_top_level(sig, '(') {
        Some(open) => {
            let close = sig
                .rfind(')')
                .ok_or_else(|| ExtractError::MalformedSignature(sig.to_string()))?;
            if close < open {
                return Err(ExtractError::MalformedSignature(sig.to_string()));
            }
            (&sig[..open], Some(&sig[open + 1..close]))
        }
        None => (sig, None),
    };

    let mut tokens: Vec<&str> = head.split_whitespace().collect();
    let mut is_static = false;
    while let Some(first) = tokens.first() {
        match *first {
            "static" => {
                is_static = true;
                tokens.remove(0);
            }
            "public" | "protected" => {
                tokens.remove(0);
            }
            _ => break,
        }
    }

    let name = tokens
        .pop()
        .ok_or_else(|| ExtractError::MalformedSignature(sig.to_string()))?;
    let name = strip_generic_suffix(name);
    if !is_identifier(name) {
        return Err(ExtractError::MalformedSignature(sig.to_string()));
    }

    let return_type = if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    };

    let mut parameters = Vec::new();
    if let Some(args) = args {
        for part in split_top_level(args, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let mut words: Vec<&str> = part.split_whitespace().collect();
            // Parameter modifiers carry no type information
            words.retain(|w| !matches!(*w, "ref" | "out" | "in" | "params"));
            match words.as_slice() {
                [] => continue,
                [single] => parameters.push(((*single).to_string(), None)),
                [ty @ .., pname] => {
                    parameters.push(((*pname).to_string(), Some(ty.join(" "))));
                }
            }
        }
    }

    Ok(ParsedSignature {
        name: name.to_string(),
        return_type,
        is_static,
        parameters,
    })
}

/// Find the byte offset of `target` outside any `<>` nesting.
fn find_top_level(s: &str, target: char) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            c if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on `sep` occurrences outside any `<>` nesting.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + sep.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Drop a trailing generic parameter list from a method name (`Instantiate<T>`).
fn strip_generic_suffix(name: &str) -> &str {
    match name.find('<') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
