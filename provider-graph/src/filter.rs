//! Inclusion filter for discovered entries.
//!
//! An entry must clear every check before the scanner emits it:
//! allowed MIME type, non-zero size under the cap, required system
//! fields present, and the source's own opt-in flag (when exposed)
//! set. Skips are returned as reasons so the scanner can log them
//! individually.

use connector_traits::SourceEntry;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("MIME type {0:?} is not on the allow-list")]
    DisallowedMime(Option<String>),

    #[error("Entry has no content")]
    EmptyContent,

    #[error("Entry is {size} bytes, exceeding the {max} byte cap")]
    Oversized { size: u64, max: u64 },

    #[error("Required system fields are missing")]
    MissingSystemFields,

    #[error("Entry is excluded by its source flag")]
    ExcludedByFlag,

    #[error("Entry lacks a last-modified timestamp")]
    MissingTimestamp,
}

#[derive(Debug, Clone)]
pub struct InclusionFilter {
    /// Empty allow-list admits every MIME type.
    allowed_mime_types: Vec<String>,
    max_content_bytes: u64,
}

impl InclusionFilter {
    pub fn new(allowed_mime_types: Vec<String>, max_content_bytes: u64) -> Self {
        Self {
            allowed_mime_types,
            max_content_bytes,
        }
    }

    /// `None` means the entry is eligible for ingestion.
    pub fn skip_reason(&self, entry: &SourceEntry) -> Option<SkipReason> {
        if entry.size_bytes == 0 {
            return Some(SkipReason::EmptyContent);
        }
        if entry.size_bytes > self.max_content_bytes {
            return Some(SkipReason::Oversized {
                size: entry.size_bytes,
                max: self.max_content_bytes,
            });
        }
        let mime_allowed = match &entry.mime_type {
            Some(mime) => {
                self.allowed_mime_types.is_empty()
                    || self.allowed_mime_types.iter().any(|m| m == mime)
            }
            None => false,
        };
        if !mime_allowed {
            return Some(SkipReason::DisallowedMime(entry.mime_type.clone()));
        }
        if !entry.has_system_fields {
            return Some(SkipReason::MissingSystemFields);
        }
        if entry.include_flag == Some(false) {
            return Some(SkipReason::ExcludedByFlag);
        }
        if entry.last_modified_at.is_none() {
            return Some(SkipReason::MissingTimestamp);
        }
        None
    }
}
