//! End-to-end runs over real zstd archives on disk.

use std::fs;
use std::path::{Path, PathBuf};

use orpha_scan::orpha_types::{MatchSet, TermEntry};
use orpha_scan::{
    discover_archives, read_rows, DedupLedger, EntityMatcher, MatcherOptions, MemorySink,
    OutputSink, ScanConfig, Scanner, TermCatalog,
};
use serde_json::json;

const CATALOG_TSV: &str = "orpha_id\tterm\tis_preferred\n\
    ORPHA1\tMarfan syndrome\t1\n\
    ORPHA2\tgastroparesis\t1\n\
    ORPHA803\tamyotrophic lateral sclerosis\t1\n\
    ORPHA586\tcystic fibrosis\t1\n";

fn make_line(name: &str, title: &str, description: &str) -> String {
    json!({
        "display_name": name.trim_start_matches("r/"),
        "name": name,
        "title": title,
        "public_description": description,
        "subscribers": 42,
    })
    .to_string()
}

fn write_archive(dir: &Path, file_name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(file_name);
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(&path, zstd::encode_all(body.as_bytes(), 3).unwrap()).unwrap();
    path
}

fn make_catalog(dir: &Path) -> TermCatalog {
    let path = dir.join("ordo_terms.tsv");
    fs::write(&path, CATALOG_TSV).unwrap();
    TermCatalog::load(&path).unwrap()
}

fn make_matcher(dir: &Path, catalog: &TermCatalog) -> EntityMatcher {
    let model = dir.join("model_rare_disease");
    EntityMatcher::write_model(&model, catalog).unwrap();
    EntityMatcher::load(&model, &MatcherOptions::default()).unwrap()
}

#[test]
fn test_end_to_end_csv_output() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);

    let dumps = dir.path().join("raw_subreddits");
    fs::create_dir_all(&dumps).unwrap();
    write_archive(
        &dumps,
        "subreddits_meta_only.zst",
        &[
            make_line("r/marfansyndrome", "Marfan Syndrome support", "A community"),
            make_line("r/alssupport", "ALS Support", "For patients and carers"),
            make_line("r/gastroparesispals", "Chat", "We talk stomachs"),
            make_line("r/cooking", "Cooking", "Recipes"),
        ],
    );

    let config = ScanConfig::default();
    let archives = discover_archives(&dumps, &config).unwrap();
    assert_eq!(archives.len(), 1);

    let output = dir.path().join("out/candidate_subreddits.csv");
    let mut sink = OutputSink::create(&output).unwrap();
    let outcome = Scanner::new(&catalog, &matcher, config)
        .unwrap()
        .run(&archives, &mut sink)
        .unwrap();
    drop(sink);

    assert!(outcome.has_candidates());
    assert_eq!(outcome.stats.records_processed, 4);
    assert_eq!(outcome.stats.exact_matches, 1);
    assert_eq!(outcome.stats.fuzzy_matches, 1);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "subreddit,orpha_ids\nr/marfansyndrome,ORPHA1\nr/gastroparesispals,FUZZY\n"
    );

    let rows = read_rows(&output).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].orpha_ids, MatchSet::parse("ORPHA1"));
    assert!(rows[1].is_fuzzy());
}

#[test]
fn test_dedup_across_archives() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);

    let first = write_archive(
        dir.path(),
        "a_meta_only.zst",
        &[make_line("r/cf", "Cystic Fibrosis", "")],
    );
    let second = write_archive(
        dir.path(),
        "b_meta_only.zst",
        &[
            make_line("r/cf", "cystic fibrosis again", ""),
            make_line("r/marfan", "marfan syndrome", ""),
        ],
    );

    let mut sink = MemorySink::default();
    let outcome = Scanner::new(&catalog, &matcher, ScanConfig::default())
        .unwrap()
        .run(&[first, second], &mut sink)
        .unwrap();

    let names: Vec<&str> = sink.rows.iter().map(|r| r.subreddit.as_str()).collect();
    assert_eq!(names, vec!["r/cf", "r/marfan"]);
    assert_eq!(outcome.stats.duplicates, 1);
    assert_eq!(outcome.ledger_size, 2);
}

#[test]
fn test_chunked_flush_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);

    let chunk = 10;
    let lines: Vec<String> = (0..2 * chunk + 5)
        .map(|i| make_line(&format!("r/marfan{i}"), "Marfan syndrome", ""))
        .collect();
    let archive = write_archive(dir.path(), "big_meta_only.zst", &lines);

    let config = ScanConfig {
        flush_chunk_size: chunk,
        ..Default::default()
    };
    let mut sink = MemorySink::default();
    let outcome = Scanner::new(&catalog, &matcher, config)
        .unwrap()
        .run(&[archive], &mut sink)
        .unwrap();

    assert_eq!(sink.batches, vec![chunk, chunk, 5]);
    assert_eq!(sink.rows.len(), 2 * chunk + 5);
    assert_eq!(outcome.stats.flushes, 3);
    assert_eq!(outcome.stats.rows_written, (2 * chunk + 5) as u64);
}

#[test]
fn test_corrupt_archive_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);

    let good_before = write_archive(
        dir.path(),
        "a_meta_only.zst",
        &[make_line("r/marfan", "Marfan syndrome", "")],
    );
    let corrupt = dir.path().join("b_meta_only.zst");
    fs::write(&corrupt, b"this is not a zstd frame at all").unwrap();
    let good_after = write_archive(
        dir.path(),
        "c_meta_only.zst",
        &[make_line("r/cfsupport", "cystic fibrosis", "")],
    );
    let missing = dir.path().join("d_meta_only.zst");

    let mut sink = MemorySink::default();
    let outcome = Scanner::new(&catalog, &matcher, ScanConfig::default())
        .unwrap()
        .run(&[good_before, corrupt, good_after, missing], &mut sink)
        .unwrap();

    assert_eq!(outcome.stats.archives_seen, 4);
    assert_eq!(outcome.stats.archives_failed, 2);
    assert_eq!(sink.rows.len(), 2);
}

#[test]
fn test_truncated_archive_keeps_earlier_rows() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);

    let total = 50_000;
    let mut body = (0..total)
        .map(|i| make_line(&format!("r/marfan{i}"), "Marfan syndrome", ""))
        .collect::<Vec<_>>()
        .join("\n");
    body.push('\n');
    let compressed = zstd::encode_all(body.as_bytes(), 3).unwrap();
    let truncated = dir.path().join("a_meta_only.zst");
    fs::write(&truncated, &compressed[..compressed.len() / 2]).unwrap();

    let next = write_archive(
        dir.path(),
        "b_meta_only.zst",
        &[make_line("r/cfsupport", "cystic fibrosis", "")],
    );

    let mut sink = MemorySink::default();
    let outcome = Scanner::new(&catalog, &matcher, ScanConfig::default())
        .unwrap()
        .run(&[truncated, next], &mut sink)
        .unwrap();

    assert_eq!(outcome.stats.archives_seen, 2);
    assert_eq!(outcome.stats.archives_failed, 1);

    let before_cut = sink
        .rows
        .iter()
        .filter(|row| row.subreddit.starts_with("r/marfan"))
        .count();
    assert!(before_cut > 0);
    assert!(before_cut < total);
    assert!(sink.rows.iter().any(|row| row.subreddit == "r/cfsupport"));
    assert_eq!(sink.rows.len(), before_cut + 1);
}

#[test]
fn test_bad_records_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);

    let archive = write_archive(
        dir.path(),
        "mixed_meta_only.zst",
        &[
            "{not json".to_string(),
            json!({"title": "Marfan syndrome"}).to_string(),
            json!({"name": "   ", "title": "Marfan syndrome"}).to_string(),
            make_line("r/marfan", "Marfan syndrome", ""),
            // Short bare name: no fuzzy attempt
            make_line("r/cfx", "nothing here", ""),
        ],
    );

    let mut sink = MemorySink::default();
    let outcome = Scanner::new(&catalog, &matcher, ScanConfig::default())
        .unwrap()
        .run(&[archive], &mut sink)
        .unwrap();

    assert_eq!(outcome.stats.lines_read, 5);
    assert_eq!(outcome.stats.malformed_lines, 1);
    assert_eq!(outcome.stats.missing_name, 2);
    assert_eq!(outcome.stats.records_processed, 2);
    assert_eq!(outcome.stats.fuzzy_attempts, 0);
    assert_eq!(sink.rows.len(), 1);
}

#[test]
fn test_resume_skips_written_names() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = make_catalog(dir.path());
    let matcher = make_matcher(dir.path(), &catalog);
    let output = dir.path().join("candidates.csv");

    let first = write_archive(
        dir.path(),
        "a_meta_only.zst",
        &[make_line("r/marfan", "Marfan syndrome", "")],
    );
    let mut sink = OutputSink::create(&output).unwrap();
    Scanner::new(&catalog, &matcher, ScanConfig::default())
        .unwrap()
        .run(&[first.clone()], &mut sink)
        .unwrap();
    drop(sink);

    let second = write_archive(
        dir.path(),
        "b_meta_only.zst",
        &[make_line("r/cysticfibrosis", "Cystic fibrosis", "")],
    );
    let mut ledger = DedupLedger::new();
    assert_eq!(ledger.seed_from_rows(&read_rows(&output).unwrap()), 1);

    let mut sink = OutputSink::append_existing(&output).unwrap();
    let outcome = Scanner::new(&catalog, &matcher, ScanConfig::default())
        .unwrap()
        .with_ledger(ledger)
        .run(&[first, second], &mut sink)
        .unwrap();
    drop(sink);

    assert_eq!(outcome.stats.duplicates, 1);
    let rows = read_rows(&output).unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.subreddit.as_str()).collect();
    assert_eq!(names, vec!["r/marfan", "r/cysticfibrosis"]);
}

#[test]
fn test_catalog_without_model_dir() {
    let catalog = TermCatalog::from_entries([TermEntry {
        orpha_id: "586".to_string(),
        term: "Cystic Fibrosis".to_string(),
        is_preferred: true,
    }]);
    let matcher = EntityMatcher::from_catalog(&catalog);
    assert_eq!(
        matcher.match_text("r/cf | living with CYSTIC fibrosis"),
        MatchSet::parse("ORPHA586")
    );
}
