//! Device path handling: canonical form, `sd://`/`mem://` URIs, storage media.

use std::borrow::Cow;

use exword_device::{INTERNAL_MEM, SD_CARD};

/// A storage medium on the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    Internal,
    Sd,
}

impl Medium {
    /// Path prefix of the medium (`\_INTERNAL_00` or `\_SD_00`).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Internal => INTERNAL_MEM,
            Self::Sd => SD_CARD,
        }
    }

    /// Top-level directory of the medium, with trailing separator.
    pub fn root(self) -> &'static str {
        match self {
            Self::Internal => "\\_INTERNAL_00\\",
            Self::Sd => "\\_SD_00\\",
        }
    }

    /// Medium a session path lives on, judged by its first seven characters
    /// only; anything not starting with `\_SD_00` counts as internal memory.
    pub fn of_path(path: &str) -> Self {
        if path.as_bytes().get(..SD_CARD.len()) == Some(SD_CARD.as_bytes()) {
            Self::Sd
        } else {
            Self::Internal
        }
    }
}

/// Parse a `sd://<path>` or `mem://<path>` argument. The path part must be
/// non-empty.
pub fn parse_uri(uri: &str) -> Option<(Medium, &str)> {
    let (medium, rest) = if let Some(rest) = uri.strip_prefix("sd://") {
        (Medium::Sd, rest)
    } else if let Some(rest) = uri.strip_prefix("mem://") {
        (Medium::Internal, rest)
    } else {
        return None;
    };
    if rest.is_empty() {
        None
    } else {
        Some((medium, rest))
    }
}

fn is_separator(ch: char) -> bool {
    ch == '/' || ch == '\\'
}

/// Check whether a path is already canonical: no `/` and no `\\`.
fn is_normalized(path: &str) -> bool {
    !path.contains('/') && !path.contains("\\\\")
}

/// Collapse every run of `/` or `\` into a single `\`. Returns the input
/// unchanged (zero-alloc) when already canonical.
pub fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let mut result = String::with_capacity(path.len());
    let mut prev_sep = false;
    for ch in path.chars() {
        if is_separator(ch) {
            if !prev_sep {
                result.push('\\');
            }
            prev_sep = true;
        } else {
            result.push(ch);
            prev_sep = false;
        }
    }
    Cow::Owned(result)
}

/// Join `prefix`, a separator and a user path, then canonicalize.
///
/// `device_path("\\_INTERNAL_00", "foo//bar")` is `\_INTERNAL_00\foo\bar`.
pub fn device_path(prefix: &str, path: &str) -> String {
    normalize(&format!("{prefix}\\{path}")).into_owned()
}
