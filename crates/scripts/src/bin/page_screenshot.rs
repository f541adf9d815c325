//! Takes a viewport screenshot of the same page in two engines.

use anyhow::Result;
use trypw::{ContextOptions, ScreenshotOptions, Session};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;

    for browser_type in [session.chromium(), session.webkit()] {
        let name = browser_type.name().to_string();
        tracing::info!(engine = %name, "capturing screenshot");

        let browser = browser_type.launch().await?;
        let context = browser.new_context(ContextOptions::default()).await?;
        let page = context.new_page().await?;
        page.goto("http://whatsmyuseragent.org/").await?;
        page.screenshot_to_file(format!("example-{name}.png"), ScreenshotOptions::default())
            .await?;
        browser.close().await?;
    }

    session.shutdown().await?;
    Ok(())
}
