//! Release-name decomposition
//!
//! This module breaks a media filename (or a subtitle release name) into the
//! structured pieces the rest of the pipeline works with: title, year,
//! season/episode, quality tag and codec tag. It is intentionally forgiving:
//! anything it cannot make sense of simply yields `None` and the caller skips
//! the file.

use once_cell::sync::Lazy;
use regex::Regex;

/// Structured metadata extracted from a single filename or release name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    /// Cleaned title with separators collapsed to single spaces
    pub title: String,
    /// Release year, when the name carries one
    pub year: Option<u16>,
    /// Season number for episodic content
    pub season: Option<u32>,
    /// Episode number for episodic content
    pub episode: Option<u32>,
    /// Quality/source tag as written in the name (e.g. "WEBRip")
    pub quality: Option<String>,
    /// Codec tag, normalized to lowercase without separators (e.g. "x264")
    pub codec: Option<String>,
}

static EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})[._ -]?E(\d{1,3})\b|\b(\d{1,2})x(\d{2,3})\b").unwrap()
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

static QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(WEB-?DL|WEBRip|Blu-?Ray|BDRip|BRRip|HDRip|DVDRip|DVDScr|HDTV|PDTV|SDTV|WEB|CAMRip|CAM|TELESYNC|VODRip|DVD|TS|TC|SCR)\b",
    )
    .unwrap()
});

static CODEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(x26[45]|h\.?26[45]|HEVC|XviD|DivX|AV1|VP9|10-?bit)\b").unwrap()
});

// Resolution tokens are only used to delimit the title, never returned.
static RESOLUTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{3,4}p|4k)\b").unwrap());

/// Parses a filename or release name into its structured parts.
///
/// The title is everything before the first structural marker (episode tag,
/// year, resolution, quality or codec) with dots and underscores collapsed to
/// spaces. Returns `None` when no usable title remains, in which case the file
/// does not participate in the pipeline.
pub fn parse(name: &str) -> Option<ParsedFilename> {
    let stem = strip_extension(name.trim());
    if stem.is_empty() {
        return None;
    }

    let episode_captures = EPISODE_RE.captures(stem);
    let year_match = YEAR_RE.find(stem);
    let quality_match = QUALITY_RE.find(stem);
    let codec_match = CODEC_RE.find(stem);
    let resolution_match = RESOLUTION_RE.find(stem);

    // The title ends at the earliest structural marker.
    let mut cut = stem.len();
    if let Some(m) = episode_captures.as_ref().and_then(|c| c.get(0)) {
        cut = cut.min(m.start());
    }
    for m in [year_match, quality_match, codec_match, resolution_match]
        .into_iter()
        .flatten()
    {
        cut = cut.min(m.start());
    }

    let title = clean_title(&stem[..cut]);
    if title.is_empty() {
        return None;
    }

    let (season, episode) = match episode_captures {
        Some(captures) => {
            let season = captures.get(1).or_else(|| captures.get(3));
            let episode = captures.get(2).or_else(|| captures.get(4));
            (
                season.and_then(|m| m.as_str().parse().ok()),
                episode.and_then(|m| m.as_str().parse().ok()),
            )
        }
        None => (None, None),
    };

    Some(ParsedFilename {
        title,
        year: year_match.and_then(|m| m.as_str().parse().ok()),
        season,
        episode,
        quality: quality_match.map(|m| m.as_str().to_string()),
        codec: codec_match.map(|m| normalize_codec(m.as_str())),
    })
}

/// Strips a trailing file extension, but only when the suffix is not itself a
/// structural token (so "Movie.2020.x264" keeps its codec tag) and is not
/// purely numeric (so "H.264" survives intact).
fn strip_extension(name: &str) -> &str {
    if let Some(idx) = name.rfind('.') {
        let ext = &name[idx + 1..];
        let looks_like_extension = (2..=4).contains(&ext.len())
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
            && ext.chars().any(|c| c.is_ascii_alphabetic());
        if looks_like_extension
            && !CODEC_RE.is_match(ext)
            && !QUALITY_RE.is_match(ext)
            && !RESOLUTION_RE.is_match(ext)
            && !YEAR_RE.is_match(ext)
            && idx > 0
        {
            return &name[..idx];
        }
    }
    name
}

/// Collapses separators to single spaces and drops punctuation-only tokens.
fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercases a codec tag and strips separators so "H.264" and "h264" compare equal.
fn normalize_codec(raw: &str) -> String {
    raw.to_ascii_lowercase().replace(['.', '-'], "")
}
