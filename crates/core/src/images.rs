//! Image variant selection.
//!
//! TMDB serves every poster and backdrop in several widths. A stored movie
//! keeps one URL per available width, e.g.
//! `https://image.tmdb.org/t/p/w185/kqjL17yufvn9OVLyXYpvtyrFfak.jpg`, where
//! the second-to-last path segment is the size tag: `wNNN` for a fixed width
//! or `original` for the full-size image.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::warn;

static WIDTH_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^w(\d+)$").ok());

const ORIGINAL_TAG: &str = "original";

/// Width of an image variant. `Original` sorts above every fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImageWidth {
    Pixels(u32),
    Original,
}

impl ImageWidth {
    /// Parse a size tag such as `w500` or `original`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag == ORIGINAL_TAG {
            return Some(ImageWidth::Original);
        }

        let re = WIDTH_TAG.as_ref()?;
        let caps = re.captures(tag)?;
        caps.get(1)?.as_str().parse().ok().map(ImageWidth::Pixels)
    }

    /// Whether this width is strictly greater than `min_width` pixels.
    pub fn exceeds(&self, min_width: u32) -> bool {
        match self {
            ImageWidth::Pixels(w) => *w > min_width,
            ImageWidth::Original => true,
        }
    }
}

/// Extract the size tag of a variant URL (the second-to-last path segment).
fn size_tag(variant: &str) -> Option<&str> {
    let path = variant.split(['?', '#']).next()?;
    let mut segments = path.rsplit('/');
    let file = segments.next()?;
    if file.is_empty() {
        return None;
    }
    segments.next().filter(|s| !s.is_empty())
}

/// Pick the smallest variant wider than `min_width`.
///
/// Returns `None` when no variant qualifies, in which case the caller shows
/// its placeholder. A variant with an unreadable size tag is skipped. When two
/// variants share a width the later one wins.
pub fn resolve_image_path(variants: &[String], min_width: u32) -> Option<&str> {
    let mut by_width = BTreeMap::new();

    for variant in variants {
        let width = size_tag(variant).and_then(ImageWidth::from_tag);
        match width {
            Some(width) => {
                by_width.insert(width, variant.as_str());
            }
            None => warn!("Skipping image variant with unknown size tag: {}", variant),
        }
    }

    by_width
        .into_iter()
        .find(|(width, _)| width.exceeds(min_width))
        .map(|(_, path)| path)
}

/// Build one variant URL per base URL for a relative image path.
///
/// Base URLs already carry the size segment (`https://image.tmdb.org/t/p/w185`).
/// A missing or empty fragment yields no variants.
pub fn build_variants(base_urls: &[String], fragment: Option<&str>) -> Vec<String> {
    let fragment = match fragment.map(str::trim) {
        Some(f) if !f.is_empty() => f,
        _ => return Vec::new(),
    };

    let fragment = fragment.trim_start_matches('/');
    base_urls
        .iter()
        .map(|base| format!("{}/{}", base.trim_end_matches('/'), fragment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://image.tmdb.org/t/p";

    fn variants(tags: &[&str]) -> Vec<String> {
        tags.iter()
            .map(|t| format!("{}/{}/poster.jpg", BASE, t))
            .collect()
    }

    #[test]
    fn test_width_tag_parsing() {
        assert_eq!(ImageWidth::from_tag("w92"), Some(ImageWidth::Pixels(92)));
        assert_eq!(ImageWidth::from_tag("w1280"), Some(ImageWidth::Pixels(1280)));
        assert_eq!(ImageWidth::from_tag("original"), Some(ImageWidth::Original));
        assert_eq!(ImageWidth::from_tag("h632"), None);
        assert_eq!(ImageWidth::from_tag("w"), None);
        assert_eq!(ImageWidth::from_tag("w+12"), None);
        assert_eq!(ImageWidth::from_tag("large"), None);
    }

    #[test]
    fn test_original_is_widest() {
        assert!(ImageWidth::Original > ImageWidth::Pixels(u32::MAX));
        assert!(ImageWidth::Original.exceeds(u32::MAX));
    }

    #[test]
    fn test_resolves_next_larger_width() {
        let v = variants(&["w92", "w154", "w500", "original"]);

        assert_eq!(
            resolve_image_path(&v, 154),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        assert_eq!(
            resolve_image_path(&v, 100),
            Some("https://image.tmdb.org/t/p/w154/poster.jpg")
        );
        assert_eq!(
            resolve_image_path(&v, 0),
            Some("https://image.tmdb.org/t/p/w92/poster.jpg")
        );
    }

    #[test]
    fn test_equal_width_is_not_enough() {
        let v = variants(&["w92", "w154", "w500", "original"]);

        assert_eq!(
            resolve_image_path(&v, 500),
            Some("https://image.tmdb.org/t/p/original/poster.jpg")
        );
    }

    #[test]
    fn test_no_qualifying_variant() {
        assert_eq!(resolve_image_path(&[], 154), None);

        let v = variants(&["w92", "w154"]);
        assert_eq!(resolve_image_path(&v, 154), None);
    }

    #[test]
    fn test_unordered_input() {
        let v = variants(&["original", "w500", "w92"]);
        assert_eq!(
            resolve_image_path(&v, 92),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
    }

    #[test]
    fn test_malformed_variants_are_skipped() {
        let v = vec![
            "poster.jpg".to_string(),
            format!("{}/h632/poster.jpg", BASE),
            format!("{}/w342/", BASE),
            format!("{}/w780/poster.jpg", BASE),
        ];

        assert_eq!(
            resolve_image_path(&v, 300),
            Some("https://image.tmdb.org/t/p/w780/poster.jpg")
        );
    }

    #[test]
    fn test_duplicate_width_last_wins() {
        let v = vec![
            format!("{}/w500/first.jpg", BASE),
            format!("{}/w500/second.jpg", BASE),
        ];

        assert_eq!(
            resolve_image_path(&v, 0),
            Some("https://image.tmdb.org/t/p/w500/second.jpg")
        );
    }

    #[test]
    fn test_query_string_is_ignored() {
        let v = vec![format!("{}/w185/poster.jpg?lang=en", BASE)];
        assert_eq!(resolve_image_path(&v, 92), Some(v[0].as_str()));
    }

    #[test]
    fn test_build_variants() {
        let bases = vec![format!("{}/w185", BASE), format!("{}/original/", BASE)];

        assert_eq!(
            build_variants(&bases, Some("/abc.jpg")),
            vec![
                "https://image.tmdb.org/t/p/w185/abc.jpg".to_string(),
                "https://image.tmdb.org/t/p/original/abc.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_variants_without_fragment() {
        let bases = vec![format!("{}/w185", BASE)];

        assert!(build_variants(&bases, None).is_empty());
        assert!(build_variants(&bases, Some("")).is_empty());
        assert!(build_variants(&[], Some("/abc.jpg")).is_empty());
    }

    #[test]
    fn test_built_variants_resolve() {
        let bases: Vec<String> = ["w92", "w185", "w342", "original"]
            .iter()
            .map(|t| format!("{}/{}", BASE, t))
            .collect();
        let v = build_variants(&bases, Some("/abc.jpg"));

        assert_eq!(
            resolve_image_path(&v, 185),
            Some("https://image.tmdb.org/t/p/w342/abc.jpg")
        );
    }
}
