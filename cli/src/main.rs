//! lexdoc CLI - document viewer and clause diff tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use lexdoc::{
    extract_as, to_json, DiffEngine, DiffSummary, Document, EditKind, EngineConfig, ExtractOptions,
    JsonFormat, Outcome, PageSelection, Point, RenderEngine, RenderedPage, Severity,
    SourceFormat, ViewerController, ViewerOptions,
};

#[derive(Parser)]
#[command(name = "lexdoc")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Render, select and compare PDF, DOCX and text documents", long_about = None)]
struct Cli {
    /// Declared format (pdf, docx, txt or a MIME type), overriding the extension
    #[arg(long, global = true, value_name = "TAG")]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document information
    Info {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the linear text of a document
    Text {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Dump the extracted content model as JSON
    Json {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Render one page through the viewer
    Render {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page number (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Zoom in percent
        #[arg(short, long, default_value = "100")]
        zoom: u32,

        /// Viewport offset in device pixels, as X,Y
        #[arg(long, value_name = "X,Y", value_parser = parse_point)]
        offset: Option<Point>,

        /// Write the raster as PNG
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Write the text overlay as JSON
        #[arg(long, value_name = "FILE")]
        overlay: Option<PathBuf>,

        /// Engine configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Render every page to a directory
    RenderAll {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Zoom in percent
        #[arg(short, long, default_value = "100")]
        zoom: u32,

        /// Pages to render (e.g., "1-5" or "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Engine configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Resolve a drag gesture to selected text
    Select {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page number (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Drag start in device pixels, as X,Y
        #[arg(long, value_name = "X,Y", value_parser = parse_point)]
        from: Point,

        /// Drag end in device pixels, as X,Y
        #[arg(long, value_name = "X,Y", value_parser = parse_point)]
        to: Point,

        /// Zoom in percent
        #[arg(short, long, default_value = "100")]
        zoom: u32,

        /// Engine configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List the clauses of a document
    Clauses {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Engine configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Compare two documents clause by clause
    Diff {
        /// Earlier document
        #[arg(value_name = "A")]
        a: PathBuf,

        /// Later document
        #[arg(value_name = "B")]
        b: PathBuf,

        /// Engine configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print edits as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let format = cli.format.as_deref();

    let result = match cli.command {
        Commands::Info { input } => cmd_info(&input, format),
        Commands::Text { input, output } => cmd_text(&input, format, output.as_deref()),
        Commands::Json {
            input,
            output,
            compact,
        } => cmd_json(&input, format, output.as_deref(), compact),
        Commands::Render {
            input,
            page,
            zoom,
            offset,
            png,
            overlay,
            config,
        } => {
            cmd_render(
                &input,
                format,
                config.as_deref(),
                page,
                zoom,
                offset.unwrap_or_default(),
                png.as_deref(),
                overlay.as_deref(),
            )
            .await
        }
        Commands::RenderAll {
            input,
            output,
            zoom,
            pages,
            config,
        } => {
            cmd_render_all(&input, format, config.as_deref(), &output, zoom, pages.as_deref()).await
        }
        Commands::Select {
            input,
            page,
            from,
            to,
            zoom,
            config,
        } => cmd_select(&input, format, config.as_deref(), page, from, to, zoom).await,
        Commands::Clauses { input, config } => cmd_clauses(&input, format, config.as_deref()),
        Commands::Diff { a, b, config, json } => cmd_diff(&a, &b, format, config.as_deref(), json),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("invalid X in '{}'", s))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("invalid Y in '{}'", s))?;
    Ok(Point::new(x, y))
}

fn load_document(input: &Path, format: Option<&str>) -> lexdoc::Result<Document> {
    let source_format = match format {
        Some(tag) => SourceFormat::from_declared(tag)?,
        None => SourceFormat::from_path(input)?,
    };
    let data = fs::read(input)?;
    log::debug!("Extracting {} as {}", input.display(), source_format);
    // Lenient so damaged pages still show up in info and render-all
    extract_as(&data, source_format, &ExtractOptions::new().lenient())
}

fn load_config(config: Option<&Path>) -> lexdoc::Result<EngineConfig> {
    match config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn load_engine(config: Option<&Path>) -> lexdoc::Result<DiffEngine> {
    DiffEngine::new(&load_config(config)?)
}

fn open_viewer(
    doc: Document,
    zoom: u32,
    config: Option<&Path>,
) -> lexdoc::Result<ViewerController> {
    let engine = RenderEngine::from_config(&load_config(config)?)?;
    Ok(ViewerController::new(
        Arc::new(doc),
        engine,
        ViewerOptions::new().with_initial_zoom(zoom),
    ))
}

fn page_index(page: usize) -> Result<usize, String> {
    page.checked_sub(1)
        .ok_or_else(|| "page numbers start at 1".to_string())
}

fn write_or_print(output: Option<&Path>, content: &str) -> std::io::Result<()> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_info(input: &Path, format: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input, format)?;
    let metadata = doc.metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), doc.source_format());
    println!("{}: {}", "Pages".bold(), doc.page_count());

    if let Some(ref version) = metadata.pdf_version {
        println!("{}: PDF {}", "Version".bold(), version);
    }
    if let Some(ref encoding) = metadata.encoding {
        println!("{}: {}", "Encoding".bold(), encoding);
    }
    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.linear_text();
    println!("{}: {}", "Runs".bold(), doc.run_count());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());

    for page in doc.pages() {
        let (width, height) = page.dimensions();
        println!(
            "  {} page {}: {} runs, {} chars, {}",
            "├─".dimmed(),
            page.index + 1,
            page.text_runs.len(),
            page.char_count(),
            if width > 0.0 {
                format!("{:.0}x{:.0}", width, height)
            } else {
                "flowed".to_string()
            }
        );
    }

    Ok(())
}

fn cmd_text(
    input: &Path,
    format: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input, format)?;
    write_or_print(output, &doc.linear_text())?;
    Ok(())
}

fn cmd_json(
    input: &Path,
    format: Option<&str>,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input, format)?;

    let json_format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = to_json(&doc, json_format)?;
    write_or_print(output, &json)?;
    Ok(())
}

async fn cmd_render(
    input: &Path,
    format: Option<&str>,
    config: Option<&Path>,
    page: usize,
    zoom: u32,
    offset: Point,
    png: Option<&Path>,
    overlay: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input, format)?;
    let viewer = open_viewer(doc, zoom, config)?;
    viewer.go_to_page(page_index(page)?)?;
    viewer.set_viewport_offset(offset);

    let rendered = match viewer.render_current().await? {
        Outcome::Completed(rendered) => rendered,
        Outcome::Cancelled => return Err("render was cancelled".into()),
    };

    println!(
        "{} page {} at {}% ({:?})",
        "Rendered".green().bold(),
        page,
        viewer.zoom_percent(),
        rendered.strategy
    );
    if let Some(ref raster) = rendered.raster {
        println!("{}: {}x{}", "Raster".bold(), raster.width(), raster.height());
    }
    println!("{}: {}", "Spans".bold(), rendered.overlay_spans.len());

    if let Some(path) = png {
        match rendered.raster {
            Some(ref raster) => {
                raster.save_png(path)?;
                println!("{} {}", "Saved to".green(), path.display());
            }
            None => println!("{}", "Page has no raster; skipping PNG".yellow()),
        }
    }
    if let Some(path) = overlay {
        fs::write(path, to_json(&rendered.overlay_spans, JsonFormat::Pretty)?)?;
        println!("{} {}", "Saved to".green(), path.display());
    }

    Ok(())
}

async fn cmd_render_all(
    input: &Path,
    format: Option<&str>,
    config: Option<&Path>,
    output: &Path,
    zoom: u32,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let doc = load_document(input, format)?;
    let viewer = open_viewer(doc, zoom, config)?;
    let indices = page_selection.indices(viewer.page_count());
    fs::create_dir_all(output)?;

    let pb = ProgressBar::new(indices.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| e.to_string())?
            .progress_chars("#>-"),
    );

    let mut written = 0;
    for index in indices {
        pb.set_message(format!("page {}", index + 1));
        viewer.go_to_page(index)?;

        match viewer.render_current().await {
            Ok(Outcome::Completed(rendered)) => {
                save_page(&rendered, output)?;
                written += 1;
            }
            Ok(Outcome::Cancelled) => {}
            Err(e) => pb.println(format!("{} page {}: {}", "Failed".red(), index + 1, e)),
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    let failed = viewer.failed_pages();
    println!(
        "\n{} {} pages rendered to {}",
        "Done!".green().bold(),
        written,
        output.display()
    );
    if !failed.is_empty() {
        let list: Vec<String> = failed.iter().map(|i| (i + 1).to_string()).collect();
        println!("{} {}", "Failed pages:".yellow(), list.join(", "));
    }

    Ok(())
}

fn save_page(rendered: &RenderedPage, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let stem = format!("page-{:03}", rendered.page_index + 1);
    if let Some(ref raster) = rendered.raster {
        raster.save_png(output.join(format!("{}.png", stem)))?;
    }
    let overlay = to_json(&rendered.overlay_spans, JsonFormat::Pretty)?;
    fs::write(output.join(format!("{}.json", stem)), overlay)?;
    Ok(())
}

async fn cmd_select(
    input: &Path,
    format: Option<&str>,
    config: Option<&Path>,
    page: usize,
    from: Point,
    to: Point,
    zoom: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input, format)?;
    let viewer = open_viewer(doc, zoom, config)?;
    viewer.go_to_page(page_index(page)?)?;

    if viewer.render_current().await?.is_cancelled() {
        return Err("render was cancelled".into());
    }

    match viewer.select(from, to) {
        Some(selection) => {
            let range = selection.range;
            println!(
                "{} runs {}:{} .. {}:{}",
                "Range".bold(),
                range.start_run,
                range.start_offset,
                range.end_run,
                range.end_offset
            );
            println!("{}", selection.text);
        }
        None => println!("{}", "Nothing selected".yellow()),
    }

    Ok(())
}

fn cmd_clauses(
    input: &Path,
    format: Option<&str>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(config)?;
    let doc = load_document(input, format)?;
    let clauses = engine.clauses(&doc);

    println!("{} ({})", "Clauses".cyan().bold(), clauses.len());
    println!("{}", "─".repeat(40).dimmed());
    for clause in &clauses {
        let label = clause.label.as_deref().unwrap_or("-");
        println!(
            "{:>4}  {} {}  {}",
            clause.index,
            label.bold(),
            clause.title,
            format!("p.{}", clause.page_index + 1).dimmed()
        );
    }

    Ok(())
}

fn cmd_diff(
    a: &Path,
    b: &Path,
    format: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(config)?;
    let doc_a = load_document(a, format)?;
    let doc_b = load_document(b, format)?;
    let edits = engine.diff(&doc_a, &doc_b);

    let summary = DiffSummary::from_edits(&edits);
    if json {
        let report = serde_json::json!({ "edits": edits, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for edit in &edits {
        let severity = match edit.severity {
            Severity::High => "HIGH".red().bold(),
            Severity::Medium => "MED ".yellow(),
            Severity::Low => "LOW ".dimmed(),
        };
        let marker = match edit.kind {
            EditKind::Insert => "+".green(),
            EditKind::Delete => "-".red(),
            EditKind::Modify => "~".yellow(),
        };
        let clause = edit.clause_b.as_ref().or(edit.clause_a.as_ref());
        let heading = clause
            .map(|c| match c.label {
                Some(ref label) => format!("{} {}", label, c.title),
                None => c.title.clone(),
            })
            .unwrap_or_default();
        println!("{} {} {:<6} {}", severity, marker, edit.kind, heading);
    }

    println!();
    println!(
        "{} {} edits ({} inserted, {} deleted, {} modified; {} high)",
        "Summary:".bold(),
        summary.total(),
        summary.inserts,
        summary.deletes,
        summary.modifies,
        summary.high
    );

    Ok(())
}
