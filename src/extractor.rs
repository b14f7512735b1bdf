//! Audio tag extraction via lofty.
//!
//! Runs on a blocking thread, never on the FUSE loop. Only the text fields
//! leave this module; embedded artwork stays inside the parsed file and is
//! dropped with it.

use std::path::Path;

use lofty::prelude::*;

use crate::error::Result;
use crate::track::TrackTags;

/// Parse the tags of one audio file. A file without any tag block yields an
/// empty `TrackTags` (it shelves under "Unknown"); an unreadable or
/// malformed file is an error and the caller drops the ingestion.
pub fn extract_tags(path: &Path) -> Result<TrackTags> {
    let tagged = lofty::read_from_path(path)?;

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return Ok(TrackTags::default());
    };

    Ok(TrackTags {
        artist: tag.artist().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        album: tag.album().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        year: tag.year().map(|y| y.to_string()),
        track: tag.track(),
        title: tag.title().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
    })
}
