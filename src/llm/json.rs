//! Pulling the JSON object out of a model reply.
//!
//! Models are asked for a fenced ```json block but often add prose around
//! it, drop the language tag, or skip the fence entirely.

/// Extract the JSON text from an LLM reply.
///
/// Tries, in order:
/// 1. The first fenced block, with or without a `json` tag
/// 2. The first balanced `{...}` object that parses as JSON
/// 3. The trimmed reply itself
pub fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(inner) = fenced_block(trimmed) {
        return inner.to_string();
    }

    if let Some(object) = find_json_object(trimmed) {
        return object;
    }

    trimmed.to_string()
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    let end = rest.find("```")?;
    let inner = &rest[..end];

    let inner = inner.strip_prefix("json").unwrap_or(inner);
    Some(inner.trim())
}

fn find_json_object(text: &str) -> Option<String> {
    text.match_indices('{').find_map(|(idx, _)| {
        let candidate = balanced_braces(&text[idx..])?;
        serde_json::from_str::<serde_json::Value>(candidate)
            .is_ok()
            .then(|| candidate.to_string())
    })
}

/// Prefix of `text` up to the brace closing its leading `{`, ignoring
/// braces inside string literals.
fn balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
