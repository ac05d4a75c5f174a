//! End-to-end pipeline tests against a mocked catalog, metadata provider and
//! download endpoint.

use std::fs::File;
use std::io::{Cursor, Write};
use std::sync::Arc;
use subfetch::{
    MovieQuery, OmdbProvider, ProgressEvent, Resolver, SubdlCatalog, SubtitleFetcher,
    SubtitlePipeline, build_queries, run_queries, scan_for_media,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn identity(name: &str, sd_id: u64, kind: &str) -> serde_json::Value {
    serde_json::json!({
        "sd_id": sd_id,
        "type": kind,
        "name": name,
        "imdb_id": "tt0000001",
        "year": 2020,
    })
}

fn movie_candidate(release_name: &str, url: &str) -> serde_json::Value {
    serde_json::json!({
        "release_name": release_name,
        "name": release_name,
        "lang": "EN",
        "url": url,
        "season": 0,
        "episode": null,
        "full_season": false,
    })
}

fn episode_candidate(release_name: &str, url: &str, season: u32, episode: Option<u32>) -> serde_json::Value {
    serde_json::json!({
        "release_name": release_name,
        "name": release_name,
        "lang": "EN",
        "url": url,
        "season": season,
        "episode": episode,
        "full_season": episode.is_none(),
    })
}

fn search_body(results: Vec<serde_json::Value>, subtitles: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "status": true,
        "results": results,
        "subtitles": subtitles,
    })
}

fn test_pipeline(server: &MockServer) -> SubtitlePipeline {
    SubtitlePipeline::new(
        Arc::new(SubdlCatalog::with_base_url(
            "catalog-key",
            &format!("{}/subtitles", server.uri()),
        )),
        Arc::new(OmdbProvider::with_base_url(
            "omdb-key",
            &format!("{}/omdb", server.uri()),
        )),
        SubtitleFetcher::with_base_url(&server.uri()),
    )
}

#[tokio::test]
async fn cross_reference_fallback_uses_bounded_round_trips() {
    let server = MockServer::start().await;

    // Free-text search: no exact-title hit.
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("film_name", "Obscure Movie"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![identity("Different Film", 9, "movie")], vec![])),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Exactly one secondary lookup.
    Mock::given(method("GET"))
        .and(path("/omdb"))
        .and(query_param("t", "Obscure Movie"))
        .and(query_param("year", "2020"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"imdb_id": "tt0123456"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Terminal search keyed by the cross-reference id.
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("imdb_id", "tt0123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            vec![],
            vec![movie_candidate("Obscure.Movie.2020.WEBRip.x264", "/download/obscure")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = Arc::new(SubdlCatalog::with_base_url(
        "catalog-key",
        &format!("{}/subtitles", server.uri()),
    ));
    let omdb = Arc::new(OmdbProvider::with_base_url(
        "omdb-key",
        &format!("{}/omdb", server.uri()),
    ));
    let resolver = Resolver::new(catalog, omdb);

    let query = MovieQuery::from_filename("Obscure.Movie.2020.WEBRip.x264.mkv", "EN").unwrap();
    let candidates = resolver.resolve(&query).await.unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].url, "/download/obscure");
    // Mock expectations assert the round-trip counts on drop.
}

#[tokio::test]
async fn full_pipeline_writes_subtitles_next_to_sources() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    File::create(dir.path().join("Movie.Title.2020.WEBRip.x264.mkv")).unwrap();
    File::create(dir.path().join("Show.Name.S02E05.720p.WEBRip.x264.mkv")).unwrap();

    // Movie: exact-title hit, then id-keyed search.
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("film_name", "Movie Title"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![identity("Movie Title", 101, "movie")], vec![])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("sd_id", "101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            vec![],
            vec![
                movie_candidate("Movie.Title.2020.BluRay.x264", "/download/bluray"),
                movie_candidate("Movie.Title.2020.WEBRip.x264", "/download/webrip"),
            ],
        )))
        .mount(&server)
        .await;

    // Episode: exact-title hit, then id-keyed search.
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("film_name", "Show Name"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![identity("Show Name", 202, "tv")], vec![])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("sd_id", "202"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            vec![],
            vec![
                episode_candidate("Show.Name.S02E06.WEBRip", "/download/e06", 2, Some(6)),
                episode_candidate("Show.Name.S02E05.WEBRip", "/download/e05", 2, Some(5)),
            ],
        )))
        .mount(&server)
        .await;

    // Download endpoints. The episodic archive bundles a second episode that
    // must not be extracted.
    Mock::given(method("GET"))
        .and(path("/download/webrip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(zip_archive(&[("Movie.Title.2020.srt", "movie subtitle")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/e05"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_archive(&[
            ("Show.Name.S02E06.srt", "wrong episode"),
            ("Show.Name.S02E05.srt", "episode five"),
        ])))
        .mount(&server)
        .await;

    let filenames = scan_for_media(dir.path()).unwrap();
    let queries = build_queries(&filenames, "EN");
    assert_eq!(queries.len(), 2);

    let summary = run_queries(queries, test_pipeline(&server), dir.path(), |_| {})
        .await
        .unwrap();

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 0);

    let movie_subtitle = dir.path().join("Movie.Title.2020.WEBRip.x264.srt");
    let episode_subtitle = dir.path().join("Show.Name.S02E05.720p.WEBRip.x264.srt");
    assert_eq!(std::fs::read_to_string(movie_subtitle).unwrap(), "movie subtitle");
    assert_eq!(std::fs::read_to_string(episode_subtitle).unwrap(), "episode five");
}

#[tokio::test]
async fn tally_is_exact_for_mixed_outcomes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Four files that succeed (slow path: the download is delayed), three
    // that fail fast, one that cannot be parsed at all.
    let codecs = ["x264", "x265", "H.264", "DivX"];
    for codec in codecs {
        File::create(dir.path().join(format!("Same.Movie.2020.WEBRip.{}.mkv", codec))).unwrap();
    }
    for ext in ["mov", "flv", "m4v"] {
        File::create(dir.path().join(format!("Missing.Film.2020.WEBRip.{}", ext))).unwrap();
    }
    File::create(dir.path().join("2020.WEBRip.mkv")).unwrap();

    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("film_name", "Same Movie"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(vec![identity("Same Movie", 7, "movie")], vec![])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("sd_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            vec![],
            codecs
                .iter()
                .map(|codec| {
                    movie_candidate(
                        &format!("Same.Movie.2020.WEBRip.{}", codec),
                        &format!("/download/{}", codec.to_lowercase().replace('.', "")),
                    )
                })
                .collect(),
        )))
        .mount(&server)
        .await;

    for slug in ["x264", "x265", "h264", "divx"] {
        Mock::given(method("GET"))
            .and(path(format!("/download/{}", slug)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(150))
                    .set_body_bytes(zip_archive(&[("Same.Movie.2020.srt", slug)])),
            )
            .mount(&server)
            .await;
    }

    // The failing title has no identities and no cross-reference id.
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("film_name", "Missing Film"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![], vec![])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/omdb"))
        .and(query_param("t", "Missing Film"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"imdb_id": ""})))
        .mount(&server)
        .await;

    let filenames = scan_for_media(dir.path()).unwrap();
    assert_eq!(filenames.len(), 8);

    // The unparsable filename is skipped up front and never becomes a task.
    let queries = build_queries(&filenames, "EN");
    assert_eq!(queries.len(), 7);

    let mut events = Vec::new();
    let summary = run_queries(queries, test_pipeline(&server), dir.path(), |event| {
        events.push(event);
    })
    .await
    .unwrap();

    assert_eq!(summary.total, 7);
    assert_eq!(summary.success, 4);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.success + summary.failed, summary.total);

    // The reporting loop announced the run and closed it out with the tally.
    assert_eq!(events.first(), Some(&ProgressEvent::Started { total: 7 }));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Finished {
            success: 4,
            failed: 3,
            total: 7
        })
    );

    // Each successful query wrote its own subtitle next to its source file.
    for codec in codecs {
        let subtitle = dir.path().join(format!("Same.Movie.2020.WEBRip.{}.srt", codec));
        assert!(subtitle.exists(), "missing subtitle for codec {}", codec);
    }
    assert!(!dir.path().join("Missing.Film.2020.WEBRip.srt").exists());
}
