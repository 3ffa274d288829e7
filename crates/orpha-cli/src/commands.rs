//! Command implementations.

use orpha_scan::{
    discover_archives, read_rows, DedupLedger, EntityMatcher, OutputSink, ScanOutcome,
    ScanResult, Scanner, TermCatalog,
};

use crate::args::{BuildModelArgs, ScanArgs};

/// Loads the catalog and model, scans every archive and optionally verifies the output.
///
/// All setup (catalog, model, archive discovery, output file) happens before
/// the first archive is opened, so a bad path fails fast.
pub fn run_scan(args: &ScanArgs) -> ScanResult<ScanOutcome> {
    let config = args.scan_config();
    config.validate()?;
    let paths = args.paths();
    let verify = args.verify_command()?;

    tracing::info!("Loading term catalog from: {}", paths.catalog.display());
    let catalog = TermCatalog::load(&paths.catalog)?;

    tracing::info!("Loading entity matcher from: {}", paths.model.display());
    let matcher = EntityMatcher::load(&paths.model, &args.matcher_options())?;
    tracing::info!(
        "Loaded {} terms and {} patterns",
        catalog.len(),
        matcher.pattern_count()
    );

    let archives = discover_archives(&paths.dump_dir, &config)?;
    tracing::info!(
        "Discovered {} archives under {}",
        archives.len(),
        paths.dump_dir.display()
    );

    let mut ledger = DedupLedger::new();
    let mut sink = if args.resume && paths.output.is_file() {
        // Open first so a row cut short by a killed run is dropped before seeding
        let sink = OutputSink::append_existing(&paths.output)?;
        let seeded = ledger.seed_from_rows(&read_rows(&paths.output)?);
        tracing::info!(
            "Resuming {}: {} names already written",
            paths.output.display(),
            seeded
        );
        sink
    } else {
        OutputSink::create(&paths.output)?
    };

    let outcome = Scanner::new(&catalog, &matcher, config)?
        .with_ledger(ledger)
        .run(&archives, &mut sink)?;
    drop(sink);

    tracing::info!(
        "Wrote {} candidates to {} ({} flushes, match rate {:.3}%)",
        outcome.stats.rows_written,
        paths.output.display(),
        outcome.stats.flushes,
        outcome.stats.match_rate()
    );

    if let Some(verify) = verify {
        if outcome.has_candidates() {
            verify.run(&paths.output)?;
        } else {
            tracing::warn!("No candidates written; skipping verification");
        }
    }

    Ok(outcome)
}

/// Compiles the catalog into a model directory. Returns the pattern count.
pub fn run_build_model(args: &BuildModelArgs) -> ScanResult<usize> {
    let catalog = TermCatalog::load(&args.catalog)?;
    EntityMatcher::write_model(&args.model, &catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    use orpha_scan::ScanError;

    fn make_workspace(dir: &Path) -> ScanArgs {
        let catalog = dir.join("ordo_terms.tsv");
        fs::write(
            &catalog,
            "orpha_id\tterm\tis_preferred\nORPHA1\tMarfan syndrome\t1\n",
        )
        .unwrap();

        let model = dir.join("model_rare_disease");
        let written = run_build_model(&BuildModelArgs {
            catalog: catalog.clone(),
            model: model.clone(),
        })
        .unwrap();
        assert_eq!(written, 1);

        let dumps = dir.join("raw_subreddits");
        fs::create_dir_all(&dumps).unwrap();

        ScanArgs {
            catalog,
            model,
            dump_dir: dumps,
            out: dir.join("candidate_subreddits.csv"),
            chunk_size: 1_000_000,
            min_fuzzy_len: 5,
            fuzzy_threshold: 85.0,
            max_window_size: 1 << 31,
            meta_marker: "meta_only".to_string(),
            name_prefix: "r/".to_string(),
            disable: vec!["parser".to_string()],
            resume: false,
            verify: false,
            verify_cmd: None,
        }
    }

    fn write_archive(dir: &Path, lines: &str) -> PathBuf {
        let path = dir.join("subreddits_meta_only.zst");
        fs::write(&path, zstd::encode_all(lines.as_bytes(), 3).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_run_scan_writes_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let args = make_workspace(dir.path());
        write_archive(
            &args.dump_dir,
            "{\"name\":\"r/marfansyndrome\",\"title\":\"Marfan Syndrome support\",\"public_description\":\"\"}\n",
        );

        let outcome = run_scan(&args).unwrap();
        assert_eq!(outcome.stats.rows_written, 1);
        assert_eq!(
            fs::read_to_string(&args.out).unwrap(),
            "subreddit,orpha_ids\nr/marfansyndrome,ORPHA1\n"
        );
    }

    #[test]
    fn test_run_scan_without_archives_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = make_workspace(dir.path());
        let err = run_scan(&args).unwrap_err();
        assert!(matches!(err, ScanError::NoArchives { .. }));
        assert!(!args.out.exists());
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = make_workspace(dir.path());
        write_archive(
            &args.dump_dir,
            "{\"name\":\"r/marfan\",\"title\":\"Marfan syndrome\"}\n",
        );
        args.max_window_size = 1 << 40;

        let err = run_scan(&args).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
        assert!(!args.out.exists());
    }

    #[test]
    fn test_resume_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = make_workspace(dir.path());
        write_archive(
            &args.dump_dir,
            "{\"name\":\"r/marfan\",\"title\":\"Marfan syndrome\"}\n",
        );
        run_scan(&args).unwrap();

        args.resume = true;
        let outcome = run_scan(&args).unwrap();
        assert_eq!(outcome.stats.rows_written, 0);
        assert_eq!(outcome.stats.duplicates, 1);
        assert_eq!(
            fs::read_to_string(&args.out).unwrap(),
            "subreddit,orpha_ids\nr/marfan,ORPHA1\n"
        );
    }

    #[test]
    fn test_resume_after_partial_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = make_workspace(dir.path());
        write_archive(
            &args.dump_dir,
            concat!(
                "{\"name\":\"r/marfan\",\"title\":\"Marfan syndrome\"}\n",
                "{\"name\":\"r/partialna\",\"title\":\"Marfan syndrome\"}\n",
            ),
        );
        fs::write(&args.out, "subreddit,orpha_ids\nr/marfan,ORPHA1\nr/partialna").unwrap();

        args.resume = true;
        let outcome = run_scan(&args).unwrap();
        assert_eq!(outcome.stats.duplicates, 1);
        assert_eq!(outcome.stats.rows_written, 1);
        assert_eq!(
            fs::read_to_string(&args.out).unwrap(),
            "subreddit,orpha_ids\nr/marfan,ORPHA1\nr/partialna,ORPHA1\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_verification_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = make_workspace(dir.path());
        write_archive(
            &args.dump_dir,
            "{\"name\":\"r/marfan\",\"title\":\"Marfan syndrome\"}\n",
        );
        args.verify = true;
        args.verify_cmd = Some("false".to_string());

        let err = run_scan(&args).unwrap_err();
        assert!(matches!(err, ScanError::Verification { .. }));
        // Output is kept for inspection
        assert!(args.out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_verification_skipped_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = make_workspace(dir.path());
        write_archive(
            &args.dump_dir,
            "{\"name\":\"r/cooking\",\"title\":\"Recipes\"}\n",
        );
        args.verify = true;
        args.verify_cmd = Some("false".to_string());

        let outcome = run_scan(&args).unwrap();
        assert!(!outcome.has_candidates());
    }
}
