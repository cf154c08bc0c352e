mod config;
mod fetcher;
mod paginator;
mod parser;
mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Settings;
use crate::fetcher::HttpFetcher;
use crate::paginator::Paginator;
use crate::render::{DocumentRenderer, Renderer};

#[derive(Parser)]
#[command(name = "novel_fetch", about = "Download a paginated web novel into a single document")]
struct Cli {
    /// Address of the book or chapter's first page (prompted for when omitted)
    url: Option<String>,
    /// Output file; extension picks the format (.pdf, .html, .txt)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Path to the wkhtmltopdf binary used for PDF output
    #[arg(long)]
    wkhtmltopdf: Option<PathBuf>,
    /// Stop after this many pages (default: follow until the book ends)
    #[arg(long)]
    max_pages: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?.apply_overrides(cli.output, cli.wkhtmltopdf, cli.max_pages);

    let url = match cli.url {
        Some(url) => url,
        None => prompt("Enter the URL of the book: ")?,
    };
    if url.is_empty() {
        println!("No URL given.");
        return Ok(ExitCode::FAILURE);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} pages | {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let paginator = Paginator::new(HttpFetcher::new()?)
        .with_max_pages(settings.max_pages)
        .with_progress(pb);
    let Some(book) = paginator.collect(&url).await else {
        println!("Failed to extract the book content.");
        return Ok(ExitCode::FAILURE);
    };
    let text = book.text();
    if text.trim().is_empty() {
        println!("Failed to extract the book content.");
        return Ok(ExitCode::FAILURE);
    }
    info!(pages = book.pages.len(), stop = ?book.stop, chars = text.len(), "book collected");

    let renderer = DocumentRenderer::new(&settings.wkhtmltopdf);
    if let Err(e) = renderer.render(&text, &settings.output).await {
        println!("Error converting the document: {:#}", e);
        return Ok(ExitCode::FAILURE);
    }

    println!(
        "Saved {} pages at {} in {:.1}s",
        book.pages.len(),
        settings.output.display(),
        t0.elapsed().as_secs_f64()
    );
    Ok(ExitCode::SUCCESS)
}

fn prompt(question: &str) -> io::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
