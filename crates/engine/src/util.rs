//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! normalization and mapping logic so the engine enforces consistent
//! invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse an optional stored UUID.
pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|v| parse_uuid(v, label)).transpose()
}

/// Canonical form for login identifiers (usernames and emails).
///
/// NFKC folds compatibility characters (full-width letters, ligatures) so
/// visually identical identifiers collide on the unique indexes.
pub(crate) fn normalize_identity(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

/// Licence plates are compared and stored upper-case, without surrounding
/// whitespace.
pub(crate) fn normalize_plate(value: &str) -> String {
    value.trim().to_uppercase()
}

pub(crate) fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
