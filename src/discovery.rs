//! Discovery of media-bearing root directories.
//!
//! Probes a fixed list of well-known roots instead of walking the whole
//! device. Each candidate costs one listing; nothing is recursed into.

use crate::accessor::DirectoryAccessor;
use crate::remote::RemoteService;

/// Roots that commonly hold media, canonical paths first, then sandboxed and
/// private variants.
pub const DEFAULT_CANDIDATE_ROOTS: &[&str] = &[
    "/DCIM",
    "/Media/DCIM",
    "/var/mobile/Media/DCIM",
    "/var/mobile/Media/PhotoData",
    "/var/mobile/Media/Photos",
    "/private/var/mobile/Media/DCIM",
    "/private/var/mobile/Media/PhotoData",
    "/PhotoData",
    "/Photos",
    "/Media/Photos",
    "/Media/PhotoData",
    "/var/mobile/Applications",
    "/Applications",
];

/// How many leading entries are inspected for a media signature.
const SIGNATURE_SAMPLE: usize = 10;
/// A directory with more entries than this is kept regardless of names.
const CROWDED_THRESHOLD: usize = 50;

const SIGNATURE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".heic", ".mov", ".mp4"];
const SIGNATURE_PREFIXES: &[&str] = &["img_", "dsc_", "100apple", "101apple", "102apple"];
const VENDOR_MARKER: &str = "apple";

/// Returns true if a single entry name looks like camera output.
#[must_use]
pub fn has_media_signature(name: &str) -> bool {
    let lower = name.to_lowercase();
    SIGNATURE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || SIGNATURE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
        || lower.contains(VENDOR_MARKER)
}

/// Decides whether a directory listing is worth scanning.
#[must_use]
pub fn looks_media_bearing(entries: &[String]) -> bool {
    if entries.is_empty() {
        return false;
    }
    entries.len() > CROWDED_THRESHOLD
        || entries
            .iter()
            .take(SIGNATURE_SAMPLE)
            .any(|name| has_media_signature(name))
}

/// Returns the candidates that exist, are listable, and look media-bearing,
/// in candidate order.
///
/// Stops early, returning what was found so far, if the accessor's stop token
/// is signalled.
pub async fn discover_roots<S: RemoteService>(
    accessor: &DirectoryAccessor<S>,
    candidates: &[String],
) -> Vec<String> {
    let stop = accessor.stop_token();
    let total = candidates.len() as u64;
    let mut found = Vec::new();

    stop.report_progress(0, total, "Searching for photo directories...");

    for (i, path) in candidates.iter().enumerate() {
        if stop.is_stopped() {
            log::info!("Directory search interrupted");
            break;
        }
        stop.report_progress(i as u64, total, format!("Checking: {path}"));

        let Some(entries) = accessor.list(path).await else {
            continue;
        };
        if looks_media_bearing(&entries) {
            log::info!("Found photo directory: {path} ({} entries)", entries.len());
            found.push(path.clone());
        } else {
            log::debug!("Skipping {path}: no media signature in {} entries", entries.len());
        }
    }

    stop.report_progress(
        total,
        total,
        format!("Found {} usable directories", found.len()),
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::StopToken;
    use crate::remote::fake::FakeService;

    fn candidates(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn signature_rules() {
        assert!(has_media_signature("IMG_0001.JPG"));
        assert!(has_media_signature("clip.MP4"));
        assert!(has_media_signature("DSC_1234"));
        assert!(has_media_signature("100APPLE"));
        assert!(has_media_signature("AppleVault"));
        assert!(!has_media_signature("notes.txt"));
        assert!(!has_media_signature("x"));
    }

    #[test]
    fn only_first_ten_entries_are_sampled() {
        let mut entries: Vec<String> = (0..10).map(|i| format!("file{i}.txt")).collect();
        entries.push("IMG_0001.JPG".to_string());
        assert!(!looks_media_bearing(&entries));
    }

    #[test]
    fn crowded_directory_is_kept() {
        let entries: Vec<String> = (0..51).map(|i| format!("file{i}.txt")).collect();
        assert!(looks_media_bearing(&entries));
        assert!(!looks_media_bearing(&entries[..50]));
        assert!(!looks_media_bearing(&[]));
    }

    #[tokio::test]
    async fn keeps_crowded_and_signed_candidates() {
        let mut service = FakeService::new().dir("/Empty").file("/Docs/readme.txt", b"");
        for i in 0..60 {
            service = service.file(&format!("/var/mobile/Media/PhotoData/blob{i}"), b"");
        }
        let service = service
            .file("/DCIM/IMG_0001.JPG", b"")
            .file("/DCIM/x", b"")
            .file("/DCIM/y", b"");
        let accessor = DirectoryAccessor::new(service, StopToken::new());

        let roots = discover_roots(
            &accessor,
            &candidates(&[
                "/var/mobile/Media/PhotoData",
                "/Missing",
                "/Empty",
                "/Docs",
                "/DCIM",
            ]),
        )
        .await;

        assert_eq!(roots, candidates(&["/var/mobile/Media/PhotoData", "/DCIM"]));
    }

    #[tokio::test]
    async fn one_listing_per_candidate() {
        let service = FakeService::new().file("/DCIM/100APPLE/IMG_0001.JPG", b"");
        let accessor = DirectoryAccessor::new(service, StopToken::new());
        let roots = discover_roots(&accessor, &candidates(&["/DCIM", "/Photos"])).await;
        assert_eq!(roots, candidates(&["/DCIM"]));
        // the missing candidate never reaches enumeration
        assert_eq!(accessor.service().calls("enumerate"), 1);
    }

    #[tokio::test]
    async fn stopped_discovery_returns_partial() {
        let service = FakeService::new().file("/DCIM/IMG_0001.JPG", b"");
        let accessor = DirectoryAccessor::new(service, StopToken::new());
        accessor.stop_token().signal_stop();
        let roots = discover_roots(&accessor, &candidates(&["/DCIM"])).await;
        assert!(roots.is_empty());
    }
}
