//! The shelf unit: one indexed audio file and its derived virtual names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The three grouping dimensions of the virtual hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Year,
    Album,
    Artist,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Year, Category::Album, Category::Artist];
}

/// Tag fields pulled out of the audio file. All optional: untagged files are
/// still shelved, they just land under "Unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub track: Option<u32>,
    pub title: Option<String>,
}

/// Stat fields of the real file, frozen at discovery time. Virtual file
/// attributes are served from this snapshot verbatim.
#[derive(Debug, Clone, Copy)]
pub struct StatSnapshot {
    pub size: u64,
    pub mtime: SystemTime,
    pub atime: SystemTime,
    pub ctime: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl StatSnapshot {
    pub fn capture(path: &Path) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        let meta = fs::metadata(path)?;
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Ok(Self {
            size: meta.len(),
            mtime,
            atime: meta.accessed().unwrap_or(mtime),
            ctime: meta.created().unwrap_or(mtime),
            uid: meta.uid(),
            gid: meta.gid(),
        })
    }
}

/// One committed record: real path, tags, stat snapshot and the three
/// virtual filenames, derived once at construction and never mutated.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub source_path: PathBuf,
    pub tags: TrackTags,
    pub stat: StatSnapshot,
    year_name: String,
    album_name: String,
    artist_name: String,
}

const UNKNOWN: &str = "Unknown";

fn text(field: &Option<String>) -> &str {
    field.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(UNKNOWN)
}

impl TrackRecord {
    pub fn new(source_path: PathBuf, tags: TrackTags, stat: StatSnapshot) -> Self {
        let artist = text(&tags.artist);
        let album = text(&tags.album);
        let title = text(&tags.title);
        let track = tags.track.unwrap_or(0);

        let year_name = format!("{artist} -- {album} -- {track} -- {title}.mp3");
        let album_name = format!("{track} -- {title}.mp3");
        let artist_name = format!("{album} -- {track} -- {title}.mp3");

        Self { source_path, tags, stat, year_name, album_name, artist_name }
    }

    /// The filename this record carries inside the given category view.
    pub fn virtual_name(&self, category: Category) -> &str {
        match category {
            Category::Year => &self.year_name,
            Category::Album => &self.album_name,
            Category::Artist => &self.artist_name,
        }
    }

    /// The directory this record is grouped under within a category.
    pub fn group_value(&self, category: Category) -> &str {
        match category {
            Category::Year => text(&self.tags.year),
            Category::Album => text(&self.tags.album),
            Category::Artist => text(&self.tags.artist),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn snapshot() -> StatSnapshot {
        StatSnapshot {
            size: 0,
            mtime: SystemTime::UNIX_EPOCH,
            atime: SystemTime::UNIX_EPOCH,
            ctime: SystemTime::UNIX_EPOCH,
            uid: 1000,
            gid: 1000,
        }
    }

    fn miles() -> TrackTags {
        TrackTags {
            artist: Some("Miles".into()),
            album: Some("Kind of Blue".into()),
            year: Some("1959".into()),
            track: Some(1),
            title: Some("So What".into()),
        }
    }

    #[test]
    fn derives_all_three_views() {
        let rec = TrackRecord::new("/real/so_what.mp3".into(), miles(), snapshot());
        assert_eq!(
            rec.virtual_name(Category::Year),
            "Miles -- Kind of Blue -- 1 -- So What.mp3"
        );
        assert_eq!(rec.virtual_name(Category::Album), "1 -- So What.mp3");
        assert_eq!(
            rec.virtual_name(Category::Artist),
            "Kind of Blue -- 1 -- So What.mp3"
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = TrackRecord::new("/real/x.mp3".into(), miles(), snapshot());
        let b = TrackRecord::new("/real/x.mp3".into(), miles(), snapshot());
        for cat in Category::ALL {
            assert_eq!(a.virtual_name(cat), b.virtual_name(cat));
        }
    }

    #[test]
    fn missing_tags_render_as_unknown() {
        let rec = TrackRecord::new("/real/bare.mp3".into(), TrackTags::default(), snapshot());
        assert_eq!(
            rec.virtual_name(Category::Year),
            "Unknown -- Unknown -- 0 -- Unknown.mp3"
        );
        assert_eq!(rec.group_value(Category::Year), "Unknown");
        assert_eq!(rec.group_value(Category::Artist), "Unknown");
    }

    #[test]
    fn blank_tags_count_as_missing() {
        let tags = TrackTags { artist: Some("  ".into()), ..TrackTags::default() };
        let rec = TrackRecord::new("/real/blank.mp3".into(), tags, snapshot());
        assert_eq!(rec.group_value(Category::Artist), "Unknown");
    }

    #[test]
    fn group_values_follow_tags() {
        let rec = TrackRecord::new("/real/so_what.mp3".into(), miles(), snapshot());
        assert_eq!(rec.group_value(Category::Year), "1959");
        assert_eq!(rec.group_value(Category::Album), "Kind of Blue");
        assert_eq!(rec.group_value(Category::Artist), "Miles");
    }
}
