//! Tool name transcoding between the backend and MCP clients
//!
//! The backend registers tools under human-readable names ("Get Weather"),
//! while MCP clients expect machine names ("get_weather"). These two functions
//! bridge the conventions. They are intentionally not exact inverses: internal
//! casing is lost on the way to machine form and is not restored on the way back.

/// Convert a human-readable tool name to machine form
///
/// Trims surrounding whitespace, collapses every run of whitespace into a
/// single underscore and lowercases the result. Empty input comes back as-is.
pub fn to_machine_name(input: &str) -> String {
    if input.is_empty() {
        return input.to_string();
    }

    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Convert a machine tool name back to the backend's human-readable form
///
/// Splits on underscores, uppercases the first character of each segment
/// (leaving the rest of the segment alone) and joins with single spaces.
pub fn to_human_name(input: &str) -> String {
    if input.is_empty() {
        return input.to_string();
    }

    input
        .split('_')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
