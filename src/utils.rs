const FILE_STEM_MAX_LEN: usize = 80;

/// Turns a session id into a safe file stem: ASCII alphanumerics, `_` and `-`
/// only, with runs of separators collapsed. Case is preserved.
pub fn sanitize_file_stem(input: &str) -> String {
    let mapped: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let collapsed = mapped
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let truncated = if collapsed.len() > FILE_STEM_MAX_LEN {
        &collapsed[..FILE_STEM_MAX_LEN]
    } else {
        &collapsed
    };

    let result = truncated.trim_end_matches('-').to_string();

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result
    }
}

/// Truncates a string to max_chars characters, appending "..." if truncated.
/// Safe for UTF-8 multi-byte characters.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncate_at = max_chars.saturating_sub(3);
        let byte_index = s
            .char_indices()
            .nth(truncate_at)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        format!("{}...", &s[..byte_index])
    }
}
