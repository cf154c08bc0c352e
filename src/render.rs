use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Pdf,
    Html,
    Text,
}

impl RenderFormat {
    /// Chosen by extension; anything unrecognised is rendered as PDF.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("html") | Some("htm") => RenderFormat::Html,
            Some("txt") => RenderFormat::Text,
            _ => RenderFormat::Pdf,
        }
    }
}

/// Minimal page shell: UTF-8 declared, a font stack that covers accented Latin, text kept verbatim.
pub fn html_document(text: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         body {{ font-family: \"DejaVu Sans\", \"Noto Sans\", \"Arial Unicode MS\", sans-serif; }}\n\
         pre {{ font-family: inherit; white-space: pre-wrap; word-wrap: break-word; }}\n\
         </style>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>\n",
        escape_html(text)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

pub trait Renderer {
    async fn render(&self, text: &str, output: &Path) -> Result<()>;
}

/// Writes the collected text to disk, converting through `wkhtmltopdf` for PDF output.
pub struct DocumentRenderer {
    wkhtmltopdf: PathBuf,
}

impl DocumentRenderer {
    pub fn new(wkhtmltopdf: impl Into<PathBuf>) -> Self {
        Self {
            wkhtmltopdf: wkhtmltopdf.into(),
        }
    }

    async fn render_pdf(&self, html: &str, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.wkhtmltopdf)
            .args(["--encoding", "utf-8", "--quiet", "-"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.wkhtmltopdf.display()))?;

        let mut stdin = child
            .stdin
            .take()
            .context("wkhtmltopdf stdin not captured")?;
        stdin
            .write_all(html.as_bytes())
            .await
            .context("Failed to pipe HTML to wkhtmltopdf")?;
        drop(stdin);

        let out = child
            .wait_with_output()
            .await
            .context("wkhtmltopdf did not finish")?;
        if !out.status.success() {
            bail!(
                "wkhtmltopdf exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(())
    }
}

impl Renderer for DocumentRenderer {
    async fn render(&self, text: &str, output: &Path) -> Result<()> {
        let format = RenderFormat::from_path(output);
        match format {
            RenderFormat::Pdf => self.render_pdf(&html_document(text), output).await?,
            RenderFormat::Html => tokio::fs::write(output, html_document(text))
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?,
            RenderFormat::Text => tokio::fs::write(output, text)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?,
        }
        info!(path = %output.display(), ?format, "document rendered");
        Ok(())
    }
}
