//! Renders a search result page to a PDF document. Chromium only.

use anyhow::Result;
use trypw::{ContextOptions, PdfOptions, Session};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session.chromium().launch().await?;
    let context = browser.new_context(ContextOptions::default()).await?;
    let page = context.new_page().await?;

    page.goto("https://www.google.com/search?q=Google").await?;
    page.pdf_to_file("document.pdf", PdfOptions::default()).await?;

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
