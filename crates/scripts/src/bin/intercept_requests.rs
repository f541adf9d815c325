//! Logs every network request made during a navigation, then lets each one
//! continue unchanged.

use anyhow::Result;
use trypw::{ContextOptions, Resolution, Session};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session.webkit().launch().await?;
    let context = browser.new_context(ContextOptions::default()).await?;
    let page = context.new_page().await?;

    let _binding = page
        .route("**/*", |request| {
            println!("{}", request.url());
            Resolution::Continue
        })
        .await?;

    page.goto("http://todomvc.com").await?;

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
