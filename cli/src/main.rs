//! kmlview CLI - KML document inspection and viewport layout tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;

use kmlview::render::{to_json, to_text, KmlSerializer};
use kmlview::{Document, JsonFormat, KmlView, LayoutOptions, StyleSheet};

#[derive(Parser)]
#[command(name = "kmlview")]
#[command(author = "kmlview contributors")]
#[command(version)]
#[command(about = "Inspect KML documents and simulate lazy viewport layout", long_about = None)]
struct Cli {
    /// Input KML file (shows document information)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Style sheet (JSON array of style definitions)
    #[arg(long, global = true, value_name = "JSON", env = "KMLVIEW_STYLES")]
    styles: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document information
    Info {
        /// Input KML file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Lay out a viewport and report paragraph geometry
    Layout {
        /// Input KML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Viewport top
        #[arg(long, default_value = "0")]
        y: f64,

        /// Viewport height
        #[arg(long, default_value = "900")]
        height: f64,

        /// Line width (overrides the layout options)
        #[arg(long)]
        width: Option<f64>,

        /// Layout options (JSON file)
        #[arg(long, value_name = "JSON")]
        layout: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert KML to JSON
    Json {
        /// Input KML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Convert KML to plain text
    Text {
        /// Input KML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Re-serialize KML in canonical form
    #[command(alias = "fmt")]
    Format {
        /// Input KML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// One paragraph per line
        #[arg(long)]
        indent: bool,
    },

    /// Show version information
    Version,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let styles = cli.styles.as_deref();

    let result = match cli.command {
        Some(Commands::Info { input }) => cmd_info(&input, styles),
        Some(Commands::Layout {
            input,
            y,
            height,
            width,
            layout,
            json,
        }) => cmd_layout(&input, styles, y, height, width, layout.as_deref(), json),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, styles, output.as_deref(), compact),
        Some(Commands::Text { input, output }) => cmd_text(&input, styles, output.as_deref()),
        Some(Commands::Format {
            input,
            output,
            indent,
        }) => cmd_format(&input, styles, output.as_deref(), indent),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                cmd_info(&input, styles)
            } else {
                println!("{}", "Usage: kmlview <FILE>".yellow());
                println!("       kmlview --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn builder(styles: Option<&Path>, layout: LayoutOptions) -> kmlview::Result<KmlView> {
    let mut view = KmlView::new().with_layout_options(layout);
    if let Some(path) = styles {
        let sheet = StyleSheet::from_json_file(path)?;
        debug!("Loaded {} styles from {}", sheet.len(), path.display());
        view = view.with_styles(sheet);
    }
    Ok(view)
}

fn load_document(input: &Path, styles: Option<&Path>) -> kmlview::Result<Document> {
    builder(styles, LayoutOptions::default())?.load_file(input)
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        print!("{}", content);
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn cmd_info(input: &Path, styles: Option<&Path>) -> CliResult {
    let doc = load_document(input, styles)?;
    let stats = doc.stats();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Paragraphs".bold(), stats.paragraphs);

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), stats.words);
    println!("{}: {}", "Characters".bold(), stats.characters);
    println!(
        "{}: {}",
        "Characters (no spaces)".bold(),
        stats.non_space_characters
    );
    println!("{}: {:.1}", "Estimated height".bold(), stats.total_height);

    Ok(())
}

fn cmd_layout(
    input: &Path,
    styles: Option<&Path>,
    y: f64,
    height: f64,
    width: Option<f64>,
    layout: Option<&Path>,
    json: bool,
) -> CliResult {
    let mut options = match layout {
        Some(path) => LayoutOptions::from_json(&fs::read_to_string(path)?)?,
        None => LayoutOptions::default(),
    };
    if let Some(width) = width {
        options = options.with_line_width(width);
    }

    let mut doc = builder(styles, options)?.load_file(input)?;
    let estimated = doc.total_height();
    let visible = doc.layout_viewport(y, height)?;

    let mut rows = Vec::new();
    if let Some(range) = visible.clone() {
        for index in range {
            let lines = doc.layout(index)?.map(|l| l.line_count()).unwrap_or(0);
            rows.push((index, doc.paragraph_y(index)?, doc.paragraph_height(index)?, lines));
        }
    }

    if json {
        let paragraphs: Vec<serde_json::Value> = rows
            .iter()
            .map(|(index, y, height, lines)| {
                serde_json::json!({
                    "index": index,
                    "y": y,
                    "height": height,
                    "lines": lines,
                })
            })
            .collect();
        let report = serde_json::json!({
            "viewport": { "y": y, "height": height },
            "visible": visible.map(|r| [*r.start(), *r.end()]),
            "paragraphs": paragraphs,
            "estimated_height": estimated,
            "total_height": doc.total_height(),
            "live_layouts": doc.live_layout_count(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Viewport Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {:.1} + {:.1}", "Viewport".bold(), y, height);

    if rows.is_empty() {
        println!("{}", "Document is empty".yellow());
    }
    for (index, y, height, lines) in &rows {
        println!(
            "  {} {:>6}  y={:<10.1} h={:<8.1} lines={}",
            "¶".dimmed(),
            index,
            y,
            height,
            lines
        );
    }

    println!();
    println!(
        "{}: {:.1} {}",
        "Total height".bold(),
        doc.total_height(),
        format!("(estimated {:.1})", estimated).dimmed()
    );
    println!("{}: {}", "Live layouts".bold(), doc.live_layout_count());

    Ok(())
}

fn cmd_json(input: &Path, styles: Option<&Path>, output: Option<&Path>, compact: bool) -> CliResult {
    let doc = load_document(input, styles)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = to_json(&doc, format)?;
    write_output(output, &json)
}

fn cmd_text(input: &Path, styles: Option<&Path>, output: Option<&Path>) -> CliResult {
    let doc = load_document(input, styles)?;
    write_output(output, &to_text(&doc))
}

fn cmd_format(input: &Path, styles: Option<&Path>, output: Option<&Path>, indent: bool) -> CliResult {
    let doc = load_document(input, styles)?;
    let kml = KmlSerializer::new().indented(indent).serialize(&doc);
    write_output(output, &kml)
}

fn cmd_version() {
    println!("{} {}", "kmlview".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Lazy-layout KML document inspector");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_document_with_styles() {
        let mut kml = tempfile::NamedTempFile::new().unwrap();
        write!(kml, r#"<kml><p><span style="loud">hi</span></p></kml>"#).unwrap();
        let mut styles = tempfile::NamedTempFile::new().unwrap();
        write!(styles, r#"[{{"id": "loud", "bold": true}}]"#).unwrap();

        let doc = load_document(kml.path(), Some(styles.path())).unwrap();
        assert!(doc.paragraph_formats(0).unwrap()[0].format.bold);
    }

    #[test]
    fn test_load_document_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_document(&dir.path().join("missing.kml"), None).is_err());
    }

    #[test]
    fn test_cli_parses_layout_flags() {
        let cli = Cli::parse_from([
            "kmlview", "layout", "doc.kml", "--y", "120", "--height", "400", "--width", "500",
        ]);
        match cli.command {
            Some(Commands::Layout { y, height, width, .. }) => {
                assert_eq!(y, 120.0);
                assert_eq!(height, 400.0);
                assert_eq!(width, Some(500.0));
            }
            _ => panic!("expected layout command"),
        }
    }
}
