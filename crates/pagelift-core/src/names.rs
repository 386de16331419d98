//! Name derivation for export artifacts.
//!
//! The export tool appends a near-unique identifier token to every page
//! file name (`Getting Started 0a1b2c....html`) and embeds the same
//! identifier with varying hyphenation in URLs and element attributes.
//! This module owns the grammar for undoing those decorations:
//!
//! - *suffix token*: the trailing whitespace- or hyphen-delimited token
//!   consisting solely of at least [`MIN_ID_LEN`] hex digits;
//! - *identifier*: hex digits with hyphens removed, case preserved;
//! - *short name*: href basename, extension stripped, percent-decoded,
//!   suffix token stripped.

use percent_encoding::percent_decode_str;

/// Minimum length of a hex token treated as an identifier suffix.
///
/// The export emits 32-digit tokens; requiring 16 keeps genuinely short
/// hex-looking words ("cafe", "decade") in multi-word titles intact.
pub const MIN_ID_LEN: usize = 16;

/// Split a trailing identifier suffix token off a name.
///
/// Returns the name without the suffix and the suffix token itself, if
/// one was present. Only the *last* delimited token is considered; a name
/// that is itself identifier-shaped (no delimiter) is returned unchanged.
#[must_use]
pub fn split_id_suffix(name: &str) -> (&str, Option<&str>) {
    let Some(idx) = name.rfind([' ', '-']) else {
        return (name, None);
    };
    let token = &name[idx + 1..];
    if token.len() >= MIN_ID_LEN && token.bytes().all(|b| b.is_ascii_hexdigit()) {
        (name[..idx].trim_end(), Some(token))
    } else {
        (name, None)
    }
}

/// Strip a trailing identifier suffix token, if present.
#[must_use]
pub fn strip_id_suffix(name: &str) -> &str {
    split_id_suffix(name).0
}

/// Normalize an opaque identifier: remove all hyphens, preserve case.
///
/// The export represents the same identifier with different hyphenation
/// depending on embedding context, so the hyphen-free form is the map key.
#[must_use]
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-').collect()
}

/// Derive a page's short name from an href.
///
/// Takes the basename, strips the `.html` extension, percent-decodes,
/// and strips a trailing identifier suffix token. Case is preserved;
/// use [`name_key`] for map lookups.
#[must_use]
pub fn short_name_from_href(href: &str) -> String {
    let path = href.split(['#', '?']).next().unwrap_or(href);
    let base = path.rsplit('/').next().unwrap_or(path);
    let stem = base.strip_suffix(".html").unwrap_or(base);
    let decoded = percent_decode_str(stem).decode_utf8_lossy();
    strip_id_suffix(decoded.trim()).to_string()
}

/// Map key form of a short name.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Derive the destination file stem for a source page stem.
///
/// Lower-cased, suffix token stripped, whitespace runs hyphenated.
#[must_use]
pub fn output_file_name(stem: &str) -> String {
    strip_id_suffix(stem)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Reformat a sub-block fragment into canonical 8-4-4-4-12 grouping.
///
/// Fragments of at least 32 alphanumeric characters are regrouped from
/// their first 32 characters; anything else is returned unchanged.
#[must_use]
pub fn format_block_fragment(fragment: &str) -> String {
    if fragment.len() >= 32 && fragment.bytes().all(|b| b.is_ascii_alphanumeric()) {
        format!(
            "{}-{}-{}-{}-{}",
            &fragment[0..8],
            &fragment[8..12],
            &fragment[12..16],
            &fragment[16..20],
            &fragment[20..32]
        )
    } else {
        fragment.to_string()
    }
}
