use std::collections::HashMap;

use crate::error::RbenchError;

/// Substitute `{name}` placeholders in an endpoint template.
///
/// `{{` and `}}` produce literal braces. Unlike request-time templating this
/// is strict: an unknown name, an empty name or an unbalanced brace fails
/// with [`RbenchError::Configuration`] so that planning aborts before any
/// request is sent.
pub fn format_url(template: &str, args: &HashMap<String, String>) -> Result<String, RbenchError> {
    // Fast path: nothing to substitute.
    if !template.contains('{') && !template.contains('}') {
        return Ok(template.to_string());
    }

    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                result.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                result.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                if !closed {
                    return Err(RbenchError::Configuration(format!(
                        "Unclosed placeholder in endpoint '{template}'"
                    )));
                }
                let key = name.trim();
                if key.is_empty() {
                    return Err(RbenchError::Configuration(format!(
                        "Empty placeholder in endpoint '{template}'"
                    )));
                }
                match args.get(key) {
                    Some(value) => result.push_str(value),
                    None => {
                        return Err(RbenchError::Configuration(format!(
                            "No value for placeholder '{key}' in endpoint '{template}'"
                        )))
                    }
                }
            }
            '}' => {
                return Err(RbenchError::Configuration(format!(
                    "Unmatched '}}' in endpoint '{template}'"
                )));
            }
            other => result.push(other),
        }
    }

    Ok(result)
}
