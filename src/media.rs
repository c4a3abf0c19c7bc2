//! Classification of remote entries by filename extension.

use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "heic", "heif", "webp", "raw", "dng", "cr2", "nef",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mov", "mp4", "avi", "mkv", "m4v", "3gp", "wmv", "flv", "webm", "mpg", "mpeg",
];

/// What kind of media a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

impl MediaKind {
    /// Returns true for images and videos.
    #[must_use]
    pub const fn is_media(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Returns the lower-cased extension of a filename, without the dot.
#[must_use]
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Classifies a filename by extension, case-insensitively.
#[must_use]
pub fn media_kind(name: &str) -> MediaKind {
    let Some(ext) = extension(name) else {
        return MediaKind::Unknown;
    };
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Unknown
    }
}

/// Returns true if the filename has an image or video extension.
#[must_use]
pub fn is_media_file(name: &str) -> bool {
    media_kind(name).is_media()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_and_videos() {
        assert_eq!(media_kind("IMG_0001.JPG"), MediaKind::Image);
        assert_eq!(media_kind("IMG_0002.HEIC"), MediaKind::Image);
        assert_eq!(media_kind("photo.cr2"), MediaKind::Image);
        assert_eq!(media_kind("IMG_0003.MOV"), MediaKind::Video);
        assert_eq!(media_kind("clip.3gp"), MediaKind::Video);
        assert_eq!(media_kind("clip.mpeg"), MediaKind::Video);
    }

    #[test]
    fn non_media() {
        assert_eq!(media_kind("notes.txt"), MediaKind::Unknown);
        assert_eq!(media_kind("Photos.sqlite"), MediaKind::Unknown);
        assert_eq!(media_kind("jpg"), MediaKind::Unknown);
        assert_eq!(media_kind(".jpg"), MediaKind::Unknown);
        assert_eq!(media_kind("trailing."), MediaKind::Unknown);
        assert!(!is_media_file("100APPLE"));
    }

    #[test]
    fn only_last_extension_counts() {
        assert_eq!(media_kind("IMG_0001.JPG.txt"), MediaKind::Unknown);
        assert_eq!(media_kind("archive.tar.mp4"), MediaKind::Video);
    }

    #[test]
    fn extension_sets_are_disjoint() {
        assert!(IMAGE_EXTENSIONS.iter().all(|e| !VIDEO_EXTENSIONS.contains(e)));
    }
}
