//! Crawls the Hacker News front page and prints a numbered list of the
//! story titles, then screenshots the page.

use anyhow::{Context, Result};
use trypw::{ContextOptions, ScreenshotOptions, Session};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session.webkit().launch().await?;
    let context = browser.new_context(ContextOptions::default()).await?;
    let page = context.new_page().await?;
    page.goto("https://news.ycombinator.com").await?;

    // Every story row carries the "athing" class; the title link sits in
    // the row's title cell.
    let entries = page.query_selector_all(".athing").await?;
    for (index, entry) in entries.iter().enumerate() {
        let title = entry
            .query_selector("td.title > a")
            .await?
            .context("story row without a title link")?;
        println!("{}: {}", index + 1, title.inner_text().await?);
    }

    page.screenshot_to_file("Y-Combinator.png", ScreenshotOptions::default())
        .await?;

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
