//! Multi-file archive uploads
//!
//! An upload whose name ends in [`ARCHIVE_EXTENSION`] is a compressed bundle
//! of design files. The translation service needs to be told which file
//! inside the bundle is the primary document; nothing tries to guess it.

/// Extension marking an upload as a compressed multi-file archive
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Whether `name` (a file name or an object id ending in one) denotes an archive
pub fn is_archive(name: &str) -> bool {
    let ext_len = ARCHIVE_EXTENSION.len();
    name.len() >= ext_len
        && name
            .get(name.len() - ext_len..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

/// Normalize a user-supplied entrypoint, treating blank input as absent
pub fn normalize_entrypoint(entrypoint: Option<&str>) -> Option<&str> {
    entrypoint.map(str::trim).filter(|e| !e.is_empty())
}
