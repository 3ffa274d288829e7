//! Entity matcher over a phrase-pattern model.
//!
//! The model is a directory in the entity-ruler layout:
//!
//! ```text
//! model_rare_disease/
//! ├── meta.json                  (optional; lists pipeline stages)
//! └── entity_ruler/
//!     └── patterns.jsonl         {"label": "RARE_DISEASE", "id": "ORPHA558", "pattern": "marfan syndrome"}
//! ```
//!
//! Only span-level pattern matching is implemented. Any other stage listed in
//! `meta.json` is skipped, whether or not it is disabled explicitly.
//!
//! ```ignore
//! let matcher = EntityMatcher::load("models/model_rare_disease", &MatcherOptions::default())?;
//! let ids = matcher.match_text("Marfan Syndrome support group");
//! assert!(ids.contains("ORPHA558"));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use orpha_types::{orpha_code, MatchId, MatchSet, OrphaId};
use serde::{Deserialize, Serialize};

use crate::catalog::TermCatalog;
use crate::normalize::{normalize, tokenize};
use crate::types::{MatcherOptions, ScanError, ScanResult};

/// Name of the pattern-matching pipeline stage.
pub const ENTITY_RULER: &str = "entity_ruler";

/// Entity label written for every catalog pattern.
pub const RARE_DISEASE_LABEL: &str = "RARE_DISEASE";

const META_FILE: &str = "meta.json";
const PATTERNS_FILE: &str = "patterns.jsonl";

/// Model metadata (`meta.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelMeta {
    #[serde(default)]
    lang: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    pipeline: Vec<String>,
}

/// One line of `patterns.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternLine {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    id: Option<String>,
    pattern: PatternSpec,
}

/// A phrase string or a list of per-token attribute objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PatternSpec {
    Phrase(String),
    Tokens(Vec<HashMap<String, serde_json::Value>>),
}

impl PatternSpec {
    /// Returns the normalized token sequence, or `None` for token attributes
    /// other than exact text.
    fn to_tokens(&self) -> Option<Vec<String>> {
        match self {
            Self::Phrase(text) => {
                let normalized = normalize(text);
                Some(tokenize(&normalized).into_iter().map(String::from).collect())
            }
            Self::Tokens(specs) => {
                let mut tokens = Vec::new();
                for spec in specs {
                    let text = spec.iter().find_map(|(key, value)| {
                        match key.to_ascii_uppercase().as_str() {
                            "LOWER" | "ORTH" | "TEXT" => value.as_str(),
                            _ => None,
                        }
                    })?;
                    let normalized = normalize(text);
                    tokens.extend(tokenize(&normalized).into_iter().map(String::from));
                }
                Some(tokens)
            }
        }
    }
}

/// Trie node keyed by token.
#[derive(Debug, Default)]
struct PatternNode {
    children: HashMap<String, PatternNode>,
    ids: BTreeSet<OrphaId>,
}

/// Matches normalized text against rare-disease phrase patterns.
///
/// Immutable after construction; share it by reference.
#[derive(Default)]
pub struct EntityMatcher {
    root: PatternNode,
    pattern_count: usize,
}

impl std::fmt::Debug for EntityMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMatcher")
            .field("pattern_count", &self.pattern_count)
            .field("first_tokens", &self.root.children.len())
            .finish()
    }
}

impl EntityMatcher {
    /// Creates a matcher with no patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a model directory.
    ///
    /// # Errors
    /// `ModelNotFound` if the directory or patterns file is missing,
    /// `InvalidModel` for unreadable metadata or pattern lines, `Config` if
    /// the options disable the pattern stage itself.
    pub fn load<P: AsRef<Path>>(dir: P, options: &MatcherOptions) -> ScanResult<Self> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            return Err(ScanError::ModelNotFound {
                path: dir.display().to_string(),
            });
        }

        if options.is_disabled(ENTITY_RULER) {
            return Err(ScanError::Config(format!(
                "the {ENTITY_RULER} stage cannot be disabled"
            )));
        }

        let meta_path = dir.join(META_FILE);
        if meta_path.is_file() {
            let meta: ModelMeta = serde_json::from_reader(BufReader::new(File::open(&meta_path)?))
                .map_err(|e| ScanError::InvalidModel {
                    path: meta_path.display().to_string(),
                    line: 0,
                    reason: e.to_string(),
                })?;
            Self::check_pipeline(&meta, &meta_path, options)?;
        }

        let patterns_path = dir.join(ENTITY_RULER).join(PATTERNS_FILE);
        if !patterns_path.is_file() {
            return Err(ScanError::ModelNotFound {
                path: patterns_path.display().to_string(),
            });
        }

        let mut matcher = Self::new();
        let mut skipped = 0usize;
        let reader = BufReader::new(File::open(&patterns_path)?);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: PatternLine =
                serde_json::from_str(&line).map_err(|e| ScanError::InvalidModel {
                    path: patterns_path.display().to_string(),
                    line: i + 1,
                    reason: e.to_string(),
                })?;

            let Some(id) = parsed.id.filter(|id| !id.trim().is_empty()) else {
                tracing::warn!("Pattern on line {} has no id, skipping", i + 1);
                skipped += 1;
                continue;
            };
            match parsed.pattern.to_tokens() {
                Some(tokens) if !tokens.is_empty() => matcher.add_tokens(tokens, id),
                _ => {
                    tracing::warn!("Unsupported pattern shape on line {}, skipping", i + 1);
                    skipped += 1;
                }
            }
        }

        tracing::info!(
            "Loaded {} patterns from {} ({} skipped)",
            matcher.pattern_count,
            patterns_path.display(),
            skipped
        );

        Ok(matcher)
    }

    fn check_pipeline(meta: &ModelMeta, meta_path: &Path, options: &MatcherOptions) -> ScanResult<()> {
        if meta.pipeline.is_empty() {
            return Ok(());
        }
        if !meta.pipeline.iter().any(|s| s == ENTITY_RULER) {
            return Err(ScanError::InvalidModel {
                path: meta_path.display().to_string(),
                line: 0,
                reason: format!("pipeline has no {ENTITY_RULER} stage"),
            });
        }
        for stage in meta.pipeline.iter().filter(|s| *s != ENTITY_RULER) {
            if options.is_disabled(stage) {
                tracing::debug!("Pipeline stage '{}' disabled", stage);
            } else {
                tracing::debug!("Pipeline stage '{}' not needed for span matching, ignoring", stage);
            }
        }
        Ok(())
    }

    /// Compiles patterns directly from a term catalog.
    pub fn from_catalog(catalog: &TermCatalog) -> Self {
        let mut matcher = Self::new();
        for entry in catalog.iter() {
            matcher.add_phrase(&entry.term, orpha_code(&entry.orpha_id));
        }
        matcher
    }

    /// Writes a model directory for the catalog and returns the pattern count.
    pub fn write_model<P: AsRef<Path>>(dir: P, catalog: &TermCatalog) -> ScanResult<usize> {
        let dir = dir.as_ref();
        let ruler_dir = dir.join(ENTITY_RULER);
        fs::create_dir_all(&ruler_dir)?;

        let meta = ModelMeta {
            lang: "en".to_string(),
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            pipeline: vec![ENTITY_RULER.to_string()],
        };
        let mut meta_out = BufWriter::new(File::create(dir.join(META_FILE))?);
        serde_json::to_writer_pretty(&mut meta_out, &meta)?;
        meta_out.flush()?;

        let mut out = BufWriter::new(File::create(ruler_dir.join(PATTERNS_FILE))?);
        let mut count = 0;
        for entry in catalog.iter() {
            let line = PatternLine {
                label: Some(RARE_DISEASE_LABEL.to_string()),
                id: Some(orpha_code(&entry.orpha_id)),
                pattern: PatternSpec::Phrase(entry.term.clone()),
            };
            serde_json::to_writer(&mut out, &line)?;
            out.write_all(b"\n")?;
            count += 1;
        }
        out.flush()?;

        tracing::info!("Wrote {} patterns to {}", count, dir.display());
        Ok(count)
    }

    /// Adds one phrase pattern.
    pub fn add_phrase(&mut self, phrase: &str, id: OrphaId) {
        if let Some(tokens) = PatternSpec::Phrase(phrase.to_string()).to_tokens() {
            if !tokens.is_empty() {
                self.add_tokens(tokens, id);
            }
        }
    }

    fn add_tokens(&mut self, tokens: Vec<String>, id: OrphaId) {
        let mut node = &mut self.root;
        for token in tokens {
            node = node.children.entry(token).or_default();
        }
        node.ids.insert(id);
        self.pattern_count += 1;
    }

    /// Number of patterns compiled in.
    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    /// Returns true if no patterns are loaded.
    pub fn is_empty(&self) -> bool {
        self.pattern_count == 0
    }

    /// Returns every identifier whose pattern occurs in `text`.
    pub fn match_text(&self, text: &str) -> MatchSet {
        self.match_normalized(&normalize(text))
    }

    /// Same as [`match_text`](Self::match_text) for text that is already
    /// normalized.
    ///
    /// Nested and overlapping spans all contribute.
    pub fn match_normalized(&self, normalized: &str) -> MatchSet {
        let tokens = tokenize(normalized);
        let mut ids = MatchSet::new();

        for start in 0..tokens.len() {
            let mut node = &self.root;
            for token in &tokens[start..] {
                match node.children.get(*token) {
                    Some(next) => {
                        node = next;
                        for id in &node.ids {
                            ids.insert(MatchId::Orpha(id.clone()));
                        }
                    }
                    None => break,
                }
            }
        }

        ids
    }
}
