//! `${name}` placeholder scanning and substitution.
//!
//! Templates appear in action parameter values and notification messages.
//! A placeholder name is a run of ASCII alphanumerics and underscores; any
//! other `${...` sequence is treated as literal text, matching what playbook
//! authors already write today.
//!
//! Substitution is single-pass: a substituted value is never re-scanned for
//! tokens, so parameter values containing `${...}` stay literal and cannot
//! form injection loops.

use std::collections::BTreeMap;

use crate::error::{CordonError, CordonResult};

/// True if `name` is a well-formed placeholder name.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Collect the distinct placeholder names in `template`, in first-appearance
/// order.
///
/// Malformed sequences (`${}`, unterminated `${`, names with other
/// characters) contribute nothing.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if is_valid_name(&after[..end]) => {
                let name = &after[..end];
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[end + 1..];
            }
            Some(_) => {
                // Not a token — skip the `${` and keep scanning. The inner
                // text may itself open a valid token (`${a${b}`).
                rest = after;
            }
            None => break,
        }
    }

    names
}

/// Substitute every `${name}` in `template` with the corresponding value
/// from `parameters`.
///
/// Fails with `CordonError::MissingParameter` naming the first token that
/// has no value. Substituted values are appended verbatim — they are not
/// re-scanned.
pub fn render(template: &str, parameters: &BTreeMap<String, String>) -> CordonResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if is_valid_name(&after[..end]) => {
                let name = &after[..end];
                out.push_str(&rest[..start]);
                match parameters.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(CordonError::MissingParameter {
                            name: name.to_string(),
                        })
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                // Malformed sequence: emit the `${` literally and continue
                // scanning after it.
                out.push_str(&rest[..start + 2]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}
