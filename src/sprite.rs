//! Sprite assembly.
//!
//! Reads every discovered icon, runs it through the optimizer, rewrites its
//! root `<svg>` into a `<symbol>` and joins the results into one hidden
//! sprite document.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::{ResolvedPaths, SpriteConfig};
use crate::error::{Result, SpriteError};
use crate::optimize::Optimizer;
use crate::scanner::{scan_icons, IconEntry};

/// File name of the generated sprite inside the output directory.
pub const SPRITE_FILENAME: &str = "icon-sprite.svg";

/// Opening tag of the sprite wrapper. Hidden so the document can be
/// inlined into a page as-is.
const SPRITE_OPEN: &str =
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="0" style="display: none">"#;
const SPRITE_CLOSE: &str = "</svg>";

/// Root attributes that never make it onto a symbol.
const SYMBOL_STRIPPED_ATTRS: [&[u8]; 4] = [b"width", b"height", b"id", b"xmlns"];

/// A single icon that could not be included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedIcon {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Icons discovered by the scanner.
    pub found: usize,
    /// Icons written into the sprite.
    pub included: usize,
    /// Icons dropped because reading or optimizing them failed.
    pub skipped: Vec<SkippedIcon>,
    /// The sprite file, or `None` when nothing was written.
    pub output: Option<PathBuf>,
}

impl PassReport {
    pub fn wrote(&self) -> bool {
        self.output.is_some()
    }
}

/// Rewrite an optimized icon into a `<symbol>` carrying `id`.
///
/// The root element is renamed and loses its sizing attributes, id and
/// default namespace declaration. Everything below the root is copied
/// through unchanged.
pub fn to_symbol(id: &str, markup: &str) -> std::result::Result<String, String> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut root_done = false;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        match event {
            Event::Start(e) if depth == 0 && !root_done => {
                writer
                    .write_event(Event::Start(symbol_start(id, &e)?))
                    .map_err(|e| e.to_string())?;
                depth = 1;
            }
            Event::Empty(e) if depth == 0 && !root_done => {
                writer
                    .write_event(Event::Empty(symbol_start(id, &e)?))
                    .map_err(|e| e.to_string())?;
                root_done = true;
            }
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e)).map_err(|e| e.to_string())?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                let end = if depth == 0 && !root_done {
                    root_done = true;
                    BytesEnd::new("symbol")
                } else {
                    e
                };
                writer.write_event(Event::End(end)).map_err(|e| e.to_string())?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(|e| e.to_string())?,
        }
    }

    if !root_done {
        return Err("no root element".to_string());
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn symbol_start(id: &str, root: &BytesStart) -> std::result::Result<BytesStart<'static>, String> {
    if root.local_name().as_ref() != b"svg" {
        return Err(format!(
            "root element is <{}>, expected <svg>",
            String::from_utf8_lossy(root.name().as_ref())
        ));
    }

    let mut symbol = BytesStart::new("symbol");
    symbol.push_attribute(("id", id));
    for attr in root.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if SYMBOL_STRIPPED_ATTRS.contains(&attr.key.as_ref()) {
            continue;
        }
        symbol.push_attribute(attr);
    }
    Ok(symbol.into_owned())
}

/// Join symbol fragments into the final sprite document.
pub fn assemble(symbols: &[String]) -> String {
    let mut sprite = String::from(SPRITE_OPEN);
    sprite.push('\n');
    for symbol in symbols {
        sprite.push_str(symbol);
        sprite.push('\n');
    }
    sprite.push_str(SPRITE_CLOSE);
    sprite
}

/// Check the source directory and make sure the output directory exists.
pub fn ensure_directories(paths: &ResolvedPaths) -> Result<()> {
    if !paths.source_dir.exists() {
        return Err(SpriteError::Config {
            message: format!(
                "Source directory {} does not exist",
                paths.source_dir.display()
            ),
            help: Some("Check the source_dir setting or pass --source".to_string()),
        });
    }
    if !paths.source_dir.is_dir() {
        return Err(SpriteError::config(format!(
            "Source path {} is not a directory",
            paths.source_dir.display()
        )));
    }

    if paths.output_dir.exists() {
        if !paths.output_dir.is_dir() {
            return Err(SpriteError::config(format!(
                "Output path {} is not a directory",
                paths.output_dir.display()
            )));
        }
    } else {
        fs::create_dir_all(&paths.output_dir).map_err(|e| {
            SpriteError::io(
                &paths.output_dir,
                format!("Failed to create output directory: {}", e),
            )
        })?;
        info!("Output directory {} created", paths.output_dir.display());
    }

    Ok(())
}

/// Runs generation passes for one configuration.
///
/// Passes are serialized: the build hook and the change watcher share one
/// generator, and only one of them writes the sprite at a time.
pub struct SpriteGenerator {
    config: SpriteConfig,
    optimizer: Arc<dyn Optimizer>,
    pass_lock: Mutex<()>,
}

impl SpriteGenerator {
    pub fn new(config: SpriteConfig, optimizer: Arc<dyn Optimizer>) -> Self {
        Self {
            config,
            optimizer,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    /// Canonical path of the sprite this generator writes. Creates the
    /// output directory if needed.
    pub fn output_file(&self) -> Result<PathBuf> {
        Ok(self.prepare()?.output_file())
    }

    /// Resolve, check and canonicalize both directories.
    fn prepare(&self) -> Result<ResolvedPaths> {
        let paths = self.config.resolve()?;
        ensure_directories(&paths)?;
        Ok(ResolvedPaths {
            source_dir: canonical_dir(&paths.source_dir)?,
            output_dir: canonical_dir(&paths.output_dir)?,
        })
    }

    /// Run one full generation pass.
    pub fn generate(&self) -> Result<PassReport> {
        // A poisoned lock only means an earlier pass panicked; the sprite
        // is rewritten from scratch anyway.
        let _guard = self
            .pass_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let paths = self.prepare()?;
        let output_file = paths.output_file();
        let entries = scan_icons(&paths.source_dir, Some(&output_file))?;

        let mut report = PassReport {
            found: entries.len(),
            ..Default::default()
        };

        if entries.is_empty() {
            warn!(
                "No icons found in {}, leaving {} untouched",
                paths.source_dir.display(),
                output_file.display()
            );
            return Ok(report);
        }

        let results: Vec<Result<String>> = entries
            .par_iter()
            .map(|entry| self.render_icon(entry))
            .collect();

        let mut symbols = Vec::with_capacity(results.len());
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(symbol) => symbols.push(symbol),
                Err(e) => {
                    error!("Skipping {}: {}", entry.source_path.display(), e);
                    report.skipped.push(SkippedIcon {
                        path: entry.source_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.included = symbols.len();

        if symbols.is_empty() {
            warn!(
                "All {} icon(s) failed, leaving {} untouched",
                report.found,
                output_file.display()
            );
            return Ok(report);
        }

        write_sprite(&output_file, &assemble(&symbols))?;
        info!(
            "Icon sprite generated with {} icon(s) at {}",
            report.included,
            output_file.display()
        );

        report.output = Some(output_file);
        Ok(report)
    }

    fn render_icon(&self, entry: &IconEntry) -> Result<String> {
        let source = fs::read_to_string(&entry.source_path).map_err(|e| {
            SpriteError::io(&entry.source_path, format!("Failed to read icon: {}", e))
        })?;

        let optimized = self.optimizer.optimize(&source, &entry.source_path)?;

        let symbol = to_symbol(&entry.id, &optimized).map_err(|message| SpriteError::Optimize {
            path: entry.source_path.clone(),
            message,
        })?;

        debug!("Rendered {} as #{}", entry.source_path.display(), entry.id);
        Ok(symbol)
    }
}

fn canonical_dir(dir: &Path) -> Result<PathBuf> {
    fs::canonicalize(dir)
        .map_err(|e| SpriteError::io(dir, format!("Failed to resolve directory: {}", e)))
}

/// Write the sprite in one whole-file write.
pub fn write_sprite(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| SpriteError::io(path, format!("Failed to write sprite: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::{OptimizerConfig, SvgOptimizer};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const ARROW: &str = r#"<svg width="24" height="24"><path d="M0 0"/></svg>"#;
    const CLOSE: &str = r#"<svg viewBox="0 0 16 16" width="16" height="16"><path d="M1 1L15 15"/></svg>"#;

    fn generator(source: &Path, output: &Path) -> SpriteGenerator {
        let config = SpriteConfig::new(source, output);
        let optimizer = SvgOptimizer::new(OptimizerConfig::default());
        SpriteGenerator::new(config, Arc::new(optimizer))
    }

    struct Failing;

    impl Optimizer for Failing {
        fn optimize(&self, _source: &str, path: &Path) -> Result<String> {
            Err(SpriteError::Optimize {
                path: path.to_path_buf(),
                message: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_to_symbol_renames_root() {
        let symbol = to_symbol(
            "arrow",
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="24" height="24"><path d="M0 0"/></svg>"#,
        )
        .unwrap();
        assert_eq!(
            symbol,
            r#"<symbol id="arrow" viewBox="0 0 24 24"><path d="M0 0"/></symbol>"#
        );
    }

    #[test]
    fn test_to_symbol_replaces_existing_id() {
        let symbol = to_symbol("new", r#"<svg id="old"><g><path d="M0 0"/></g></svg>"#).unwrap();
        assert_eq!(symbol, r#"<symbol id="new"><g><path d="M0 0"/></g></symbol>"#);
    }

    #[test]
    fn test_to_symbol_empty_root() {
        let symbol = to_symbol("dot", r#"<svg viewBox="0 0 1 1"/>"#).unwrap();
        assert_eq!(symbol, r#"<symbol id="dot" viewBox="0 0 1 1"/>"#);
    }

    #[test]
    fn test_to_symbol_keeps_prefixed_namespaces() {
        let symbol = to_symbol(
            "link",
            r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="a.svg"/></svg>"#,
        )
        .unwrap();
        assert!(symbol.contains("xmlns:xlink"));
    }

    #[test]
    fn test_to_symbol_rejects_non_svg_root() {
        assert!(to_symbol("x", "<g></g>").is_err());
    }

    #[test]
    fn test_assemble() {
        let sprite = assemble(&["<symbol id=\"a\"/>".to_string(), "<symbol id=\"b\"/>".to_string()]);
        insta::assert_snapshot!(sprite, @r#"
        <svg xmlns="http://www.w3.org/2000/svg" width="0" height="0" style="display: none">
        <symbol id="a"/>
        <symbol id="b"/>
        </svg>
        "#);
    }

    #[test]
    fn test_generate_scenario() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("dist");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();
        fs::write(source.join("nested/close.svg"), CLOSE).unwrap();

        let report = generator(&source, &output).generate().unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.included, 2);
        assert!(report.skipped.is_empty());

        let sprite = fs::read_to_string(output.join(SPRITE_FILENAME)).unwrap();
        insta::assert_snapshot!(sprite, @r#"
        <svg xmlns="http://www.w3.org/2000/svg" width="0" height="0" style="display: none">
        <symbol id="arrow"><path d="M0 0"/></symbol>
        <symbol id="nested_close" viewBox="0 0 16 16"><path d="M1 1L15 15"/></symbol>
        </svg>
        "#);
    }

    #[test]
    fn test_generate_is_idempotent() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("dist");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();
        fs::write(source.join("close.svg"), CLOSE).unwrap();

        let gen = generator(&source, &output);
        gen.generate().unwrap();
        let first = fs::read(output.join(SPRITE_FILENAME)).unwrap();
        gen.generate().unwrap();
        let second = fs::read(output.join(SPRITE_FILENAME)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_creates_output_directory() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("public/assets/sprites");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();

        let report = generator(&source, &output).generate().unwrap();

        let expected = fs::canonicalize(&output).unwrap().join(SPRITE_FILENAME);
        assert_eq!(report.output, Some(expected));
        assert!(output.join(SPRITE_FILENAME).is_file());
    }

    #[test]
    fn test_generate_missing_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("missing-icons");

        let err = generator(&source, &dir.path().join("dist"))
            .generate()
            .unwrap_err();

        assert!(err.is_config());
        assert!(err.to_string().contains("missing-icons"));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_generate_output_is_a_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        fs::create_dir_all(&source).unwrap();
        let output = dir.path().join("dist");
        fs::write(&output, "oops").unwrap();

        let err = generator(&source, &output).generate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_generate_empty_source_leaves_previous_output() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("dist");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join(SPRITE_FILENAME), "previous").unwrap();

        let report = generator(&source, &output).generate().unwrap();

        assert_eq!(report.found, 0);
        assert!(!report.wrote());
        assert_eq!(
            fs::read_to_string(output.join(SPRITE_FILENAME)).unwrap(),
            "previous"
        );
    }

    #[test]
    fn test_generate_skips_corrupt_icon() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("dist");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();
        fs::write(source.join("broken.svg"), "<svg><path></svg>").unwrap();
        fs::write(source.join("binary.svg"), [0xff, 0xfe, 0x00, 0x81]).unwrap();
        fs::write(source.join("close.svg"), CLOSE).unwrap();

        let report = generator(&source, &output).generate().unwrap();

        assert_eq!(report.found, 4);
        assert_eq!(report.included, 2);
        assert_eq!(report.skipped.len(), 2);

        let sprite = fs::read_to_string(output.join(SPRITE_FILENAME)).unwrap();
        assert!(sprite.contains(r#"<symbol id="arrow""#));
        assert!(sprite.contains(r#"<symbol id="close""#));
        assert!(!sprite.contains("broken"));
        assert!(!sprite.contains("binary"));
        assert!(!sprite.contains("\n\n"));
    }

    #[test]
    fn test_generate_all_failed_leaves_previous_output() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("dist");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&output).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();
        fs::write(output.join(SPRITE_FILENAME), "previous").unwrap();

        let gen = SpriteGenerator::new(SpriteConfig::new(&source, &output), Arc::new(Failing));
        let report = gen.generate().unwrap();

        assert_eq!(report.skipped.len(), 1);
        let arrow = fs::canonicalize(source.join("arrow.svg")).unwrap();
        assert_eq!(
            report.skipped[0].reason,
            format!("Failed to optimize {}: boom", arrow.display())
        );
        assert_eq!(
            fs::read_to_string(output.join(SPRITE_FILENAME)).unwrap(),
            "previous"
        );
    }

    #[test]
    fn test_generate_output_inside_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = source.join("dist");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();

        let gen = generator(&source, &output);
        gen.generate().unwrap();
        let report = gen.generate().unwrap();

        assert_eq!(report.found, 1);
        let sprite = fs::read_to_string(output.join(SPRITE_FILENAME)).unwrap();
        assert!(!sprite.contains("dist_icon-sprite"));
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_symlinked_source_never_reads_own_sprite() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("arrow.svg"), ARROW).unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("link")).unwrap();

        // Same directory reached two ways: through the link and directly.
        let source = dir.path().join("link");
        let output = real.join("dist");
        let gen = generator(&source, &output);

        for _ in 0..3 {
            let report = gen.generate().unwrap();
            assert_eq!(report.found, 1);
        }

        let sprite = fs::read_to_string(output.join(SPRITE_FILENAME)).unwrap();
        assert!(!sprite.contains("dist_icon-sprite"));
        assert_eq!(sprite.matches("<symbol").count(), 1);
    }

    #[test]
    fn test_generate_output_given_through_parent_dir() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(source.join("arrow.svg"), ARROW).unwrap();

        let gen = generator(&source, &dir.path().join("other/../icons/dist"));
        gen.generate().unwrap();
        let report = gen.generate().unwrap();

        assert_eq!(report.found, 1);
        assert_eq!(
            gen.output_file().unwrap(),
            fs::canonicalize(source.join("dist")).unwrap().join(SPRITE_FILENAME)
        );
    }

    #[test]
    fn test_generate_duplicate_ids_write_nothing() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icons");
        let output = dir.path().join("dist");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a/b.svg"), ARROW).unwrap();
        fs::write(source.join("a_b.svg"), ARROW).unwrap();

        let err = generator(&source, &output).generate().unwrap_err();

        assert!(matches!(err, SpriteError::DuplicateId { .. }));
        assert!(!output.join(SPRITE_FILENAME).exists());
    }
}
