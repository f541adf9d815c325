//! Records a video of a short GitHub search flow and prints where the
//! recording was saved.

use anyhow::{Context, Result};
use trypw::{ContextOptions, Session};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session.chromium().launch().await?;
    let context = browser
        .new_context(ContextOptions::builder().record_video_dir("videos").build())
        .await?;
    let page = context.new_page().await?;

    page.goto("https://github.com").await?;
    page.fill("input[name=\"q\"]", "Playwright").await?;
    page.press("input[name=\"q\"]", "Enter").await?;
    page.click(".repo-list-item:nth-child(1) a").await?;

    let video = page
        .video_path()
        .await?
        .context("recording was enabled but the driver reported no video path")?;
    println!("video saved to {}", video.display());

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
