//! Candidate selection
//!
//! Picks exactly one subtitle URL out of the resolver's candidate list, or
//! declares no match. The quality/source tag is the gating signal: without it
//! there is nothing reliable to filter on, and the match is rejected outright.

use crate::catalog::SubtitleCandidate;
use crate::filename_parser;
use crate::movie_query::MovieQuery;
use regex::RegexBuilder;

/// Selects the download URL of the best-matching candidate.
///
/// Candidates are filtered by a case-insensitive literal match of the query's
/// quality tag against the release name; the tag is escaped first so pattern
/// metacharacters in release names stay literal. Among the survivors the
/// first qualifying candidate in provider order wins.
pub fn select_subtitle(query: &MovieQuery, candidates: &[SubtitleCandidate]) -> Option<String> {
    if query.quality.is_empty() {
        return None;
    }

    let quality = RegexBuilder::new(&regex::escape(&query.quality))
        .case_insensitive(true)
        .build()
        .ok()?;

    let filtered: Vec<&SubtitleCandidate> = candidates
        .iter()
        .filter(|candidate| quality.is_match(&candidate.release_name))
        .collect();

    match query.series {
        Some(series) => filtered
            .iter()
            .find(|candidate| {
                candidate.season == series.season
                    && (candidate.episode == Some(series.episode) || candidate.full_season)
            })
            .map(|candidate| candidate.url.clone()),
        None => filtered
            .iter()
            .find(|candidate| movie_matches(query, candidate))
            .map(|candidate| candidate.url.clone()),
    }
}

/// Standalone-movie check: the candidate's release name must re-parse to the
/// same title and year. Codecs must agree only when both sides report one.
fn movie_matches(query: &MovieQuery, candidate: &SubtitleCandidate) -> bool {
    let Some(parsed) = filename_parser::parse(&candidate.release_name) else {
        return false;
    };

    if parsed.title != query.title || parsed.year != query.year {
        return false;
    }

    match parsed.codec {
        Some(codec) if !query.codec.is_empty() => codec == query.codec,
        _ => true,
    }
}
