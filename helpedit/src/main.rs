//! helpedit - help page editing and maintenance tool
//!
//! Keeps the persisted copy of a help page in step with the edited one,
//! regenerates navigation indexes and upgrades legacy help markup.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(dead_code)]

mod cli;
mod config;
mod document;
mod dom;
mod templates;

// Editing pipeline
mod navigation;
mod preprocess;
mod session;
mod sync;
mod upgrade;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::EditorConfig;
use document::{DocumentKind, HelpDocument};
use encoding_rs::UTF_8;
use navigation::Link;
use session::{BufferedWidget, EditSession};
use std::path::{Path, PathBuf};
use upgrade::UpgradeReport;
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Main entry point for the helpedit CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = EditorConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    match cli.command {
        Commands::New {
            kind,
            title,
            description,
            categories,
            parameters,
            template,
            output,
        } => {
            let fields = templates::HelpFields {
                title,
                description,
                categories,
                parameters,
            };
            handle_new_command(
                kind.unwrap_or(config.kind),
                &fields,
                template.as_deref(),
                output.as_deref(),
            )?;
        }

        Commands::Upgrade {
            input,
            kind,
            in_place,
            output,
        } => {
            handle_upgrade_command(&input, kind.unwrap_or(config.kind), in_place, output)?;
        }

        Commands::Index { input, output } => {
            handle_index_command(&input, output.as_deref())?;
        }

        Commands::Edit {
            input,
            content,
            kind,
            links,
            output,
        } => {
            handle_edit_command(
                &input,
                content.as_deref(),
                kind.unwrap_or(config.kind),
                &links,
                output.as_deref(),
                &config,
            )?;
        }

        Commands::ShowConfig => {
            handle_show_config_command(&config)?;
        }
    }

    Ok(())
}

/// Handle the new command
fn handle_new_command(
    kind: DocumentKind,
    fields: &templates::HelpFields,
    template_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let template = match template_path {
        Some(path) => read_help_file(path)?,
        None => templates::get_template(kind).content.to_string(),
    };

    let help = templates::render_help(&template, kind, fields)
        .with_context(|| format!("Failed to render {} help", kind))?;

    match output {
        Some(path) => {
            write_file(path, &help)?;
            println!("✓ Created {} help: {}", kind, path.display());
        }
        None => print!("{}", help),
    }

    Ok(())
}

/// Handle the upgrade command
fn handle_upgrade_command(
    input: &Path,
    kind: DocumentKind,
    in_place: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let jobs: Vec<(PathBuf, PathBuf)> = if input.is_dir() {
        let target_root = match (in_place, output) {
            (true, _) => input.to_path_buf(),
            (false, Some(dir)) => dir,
            (false, None) => anyhow::bail!(
                "Upgrading a directory requires --in-place or --output <DIR>"
            ),
        };
        discover_help_files(input)
            .into_iter()
            .map(|path| {
                let relative = path.strip_prefix(input).unwrap_or(&path).to_path_buf();
                (path, target_root.join(relative))
            })
            .collect()
    } else {
        let target = match (in_place, output) {
            (true, _) => input.to_path_buf(),
            (false, Some(path)) => path,
            (false, None) => anyhow::bail!(
                "Upgrading a file requires --in-place or --output <FILE>"
            ),
        };
        vec![(input.to_path_buf(), target)]
    };

    println!("Upgrading {} help file(s) as {} help...", jobs.len(), kind);

    // Each file gets its own document, so files can be processed independently
    #[cfg(feature = "parallel")]
    let reports: Result<Vec<UpgradeReport>> = jobs
        .par_iter()
        .map(|(source, target)| upgrade_file(source, target, kind))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let reports: Result<Vec<UpgradeReport>> = jobs
        .iter()
        .map(|(source, target)| upgrade_file(source, target, kind))
        .collect();

    let reports = reports?;
    let anchors: usize = reports.iter().map(|r| r.anchors_removed).sum();
    let synthesized = reports.iter().filter(|r| r.content_synthesized).count();

    println!(
        "✓ Upgraded {} file(s): {} empty anchor(s) removed, {} content element(s) added",
        reports.len(),
        anchors,
        synthesized
    );

    Ok(())
}

/// Upgrade a single help file
fn upgrade_file(source: &Path, target: &Path, kind: DocumentKind) -> Result<UpgradeReport> {
    let raw = read_help_file(source)?;
    let doc = HelpDocument::parse(&raw);
    let report = upgrade::upgrade_document(&doc, kind);

    let help = doc
        .to_page()
        .with_context(|| format!("Failed to serialize {}", source.display()))?;
    write_file(target, &help)?;

    log::info!("Upgraded {} -> {}", source.display(), target.display());
    Ok(report)
}

/// Find every .html/.htm file below `root`, in a stable order
fn discover_help_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            matches!(
                e.path().extension().and_then(|s| s.to_str()),
                Some("html") | Some("htm")
            )
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Handle the index command
fn handle_index_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (raw, encoding) = preprocess::decode_help(&bytes);
    let doc = HelpDocument::parse(&raw);

    // The page is written back as UTF-8
    if encoding != UTF_8 {
        upgrade::force_utf8(&doc);
    }

    match navigation::rebuild_index(&doc) {
        Some(entries) => println!("✓ Navigation index rebuilt with {} entries", entries),
        None => println!("No navigation block in {}, nothing to do", input.display()),
    }

    let help = doc
        .to_page()
        .with_context(|| format!("Failed to serialize {}", input.display()))?;
    write_file(output.unwrap_or(input), &help)?;

    Ok(())
}

/// Handle the edit command
fn handle_edit_command(
    input: &Path,
    content: Option<&Path>,
    kind: DocumentKind,
    links: &[Link],
    output: Option<&Path>,
    config: &EditorConfig,
) -> Result<()> {
    let raw = read_help_file(input)?;

    let mut session = EditSession::open(&raw, kind, BufferedWidget::new(), config)
        .with_context(|| format!("Failed to open {} for editing", input.display()))?;

    if let Some(path) = content {
        let fragment = read_help_file(path)?;
        session.widget_mut().edit(fragment);
    }

    if !links.is_empty() && !session.set_links(links) {
        log::warn!("{} has no navigation block, links were not added", input.display());
    }

    let help = session.close().context("Failed to produce the edited help")?;

    let target = output.unwrap_or(input);
    write_file(target, &help)?;
    println!("✓ Successfully wrote: {}", target.display());

    Ok(())
}

/// Handle the show-config command
fn handle_show_config_command(config: &EditorConfig) -> Result<()> {
    println!("# kind: {}, widget width: {}", config.kind, config.width());
    print!("{}", config.to_toml().context("Failed to render configuration")?);
    Ok(())
}

/// Read a help page or fragment, decoding legacy encodings to UTF-8
fn read_help_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (text, encoding) = preprocess::decode_help(&bytes);
    if encoding != UTF_8 {
        log::info!("Decoded {} as {}", path.display(), encoding.name());
    }
    Ok(text.into_owned())
}

/// Write a file, creating parent directories if they don't exist
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("helpedit-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_discover_help_files() {
        let files = discover_help_files(&fixtures());
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(
            names,
            vec!["legacy-latin1.html", "legacy-menu.html", "legacy-program.html"]
        );
    }

    #[test]
    fn test_upgrade_legacy_menu_file() {
        let dir = scratch_dir("upgrade-menu");
        let target = dir.join("menu.html");

        let report = upgrade_file(
            &fixtures().join("legacy-menu.html"),
            &target,
            DocumentKind::Menu,
        )
        .unwrap();

        assert_eq!(report.anchors_removed, 2);
        assert_eq!(report.index_entries, Some(2));
        let help = std::fs::read_to_string(&target).unwrap();
        assert!(!help.contains("iso-8859-1"));
        assert!(help.contains("<a href=\"#header_1\">Usage</a>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_upgrade_latin1_file() {
        let dir = scratch_dir("upgrade-latin1");
        let target = dir.join("latin1.html");

        let report = upgrade_file(
            &fixtures().join("legacy-latin1.html"),
            &target,
            DocumentKind::Menu,
        )
        .unwrap();

        assert_eq!(report.anchors_removed, 1);
        let help = std::fs::read_to_string(&target).unwrap();
        assert!(help.starts_with("<!DOCTYPE html>"));
        assert!(help.contains("charset=UTF-8"));
        assert!(!help.contains("iso-8859-1"));
        assert!(help.contains("<title>Processamento Sísmico</title>"));
        assert!(help.contains("<h2 id=\"header_0\">Introdução</h2>"));
        assert!(help.contains("<a href=\"#header_0\">Introdução</a>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_upgrade_file_requires_target() {
        let input = fixtures().join("legacy-menu.html");
        let before = std::fs::read(&input).unwrap();

        assert!(handle_upgrade_command(&input, DocumentKind::Menu, false, None).is_err());
        assert_eq!(std::fs::read(&input).unwrap(), before);
    }

    #[test]
    fn test_upgrade_directory_mirrors_layout() {
        let dir = scratch_dir("upgrade-dir");

        handle_upgrade_command(&fixtures(), DocumentKind::Program, false, Some(dir.clone()))
            .unwrap();

        let program = std::fs::read_to_string(dir.join("legacy-program.html")).unwrap();
        assert!(program.contains("<div class=\"content\">"));
        assert!(dir.join("legacy-menu.html").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_upgrade_directory_requires_target() {
        assert!(handle_upgrade_command(&fixtures(), DocumentKind::Menu, false, None).is_err());
    }

    #[test]
    fn test_new_writes_program_help() {
        let dir = scratch_dir("new");
        let target = dir.join("agc.html");
        let fields = templates::HelpFields {
            title: "Gain Control".to_string(),
            parameters: vec!["Window".to_string()],
            ..Default::default()
        };

        handle_new_command(DocumentKind::Program, &fields, None, Some(&target)).unwrap();

        let help = std::fs::read_to_string(&target).unwrap();
        assert!(help.starts_with("<!DOCTYPE html>"));
        assert!(help.contains("<title>Gain Control</title>"));
        assert!(help.contains("<span class=\"label\">[Window]</span>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_new_from_custom_template() {
        let dir = scratch_dir("new-custom");
        std::fs::create_dir_all(&dir).unwrap();
        let template = dir.join("template.html");
        std::fs::write(
            &template,
            "<html><body><div class=\"navigation\"></div><div class=\"content\"><h2>Flow/Program Title</h2></div></body></html>",
        )
        .unwrap();
        let target = dir.join("menu.html");
        let fields = templates::HelpFields {
            title: "Stacking".to_string(),
            ..Default::default()
        };

        handle_new_command(DocumentKind::Menu, &fields, Some(&template), Some(&target)).unwrap();

        let help = std::fs::read_to_string(&target).unwrap();
        assert!(help.contains("<li><a href=\"#header_0\">Stacking</a></li>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_index_in_place_keeps_doctype() {
        let dir = scratch_dir("index");
        std::fs::create_dir_all(&dir).unwrap();
        let page = dir.join("help.html");
        std::fs::write(
            &page,
            "<!DOCTYPE html><html><body><div class=\"navigation\"><h2>Index</h2><ul><li>stale</li></ul></div>\
             <div class=\"content\"><h2>Intro</h2><h2>Usage</h2></div></body></html>",
        )
        .unwrap();

        handle_index_command(&page, None).unwrap();

        let help = std::fs::read_to_string(&page).unwrap();
        assert!(help.starts_with("<!DOCTYPE html><html>"));
        assert!(!help.contains("stale"));
        assert!(help.contains("<li><a href=\"#header_1\">Usage</a></li>"));
        assert!(help.contains("<h2 id=\"header_0\">Intro</h2>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_index_of_latin1_page_is_written_as_utf8() {
        let dir = scratch_dir("index-latin1");
        let target = dir.join("latin1.html");

        handle_index_command(&fixtures().join("legacy-latin1.html"), Some(&target)).unwrap();

        let help = std::fs::read_to_string(&target).unwrap();
        assert!(help.contains("charset=UTF-8"));
        assert!(!help.contains("iso-8859-1"));
        assert!(help.contains("Introdução</h2>"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_edit_replaces_content() {
        let dir = scratch_dir("edit");
        std::fs::create_dir_all(&dir).unwrap();
        let fragment = dir.join("fragment.html");
        std::fs::write(&fragment, "<h2>Overview</h2><p>new text</p>").unwrap();
        let target = dir.join("menu.html");

        handle_edit_command(
            &fixtures().join("legacy-menu.html"),
            Some(&fragment),
            DocumentKind::Menu,
            &[Link::new("Manual", "manual.html")],
            Some(&target),
            &EditorConfig::default(),
        )
        .unwrap();

        let help = std::fs::read_to_string(&target).unwrap();
        assert!(help.contains("<h2 id=\"header_0\">Overview</h2><p>new text</p>"));
        assert!(!help.contains("Introduction"));
        assert!(help.contains("<a href=\"manual.html\">Manual</a>"));
        assert!(help.contains("href=\"gebr.css\""));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
