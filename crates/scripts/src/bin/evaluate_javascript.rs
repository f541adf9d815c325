//! Evaluates a script in the page and prints the marshalled result.

use anyhow::Result;
use trypw::{ContextOptions, Session};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session.webkit().launch().await?;
    let context = browser.new_context(ContextOptions::default()).await?;
    let page = context.new_page().await?;
    page.goto("https://www.example.com/").await?;

    let dimensions = page
        .evaluate_json(
            "() => ({ \
               width: document.documentElement.clientWidth, \
               height: document.documentElement.clientHeight, \
               deviceScaleFactor: window.devicePixelRatio \
             })",
        )
        .await?;
    println!("{dimensions}");

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
