//! Answers a backend endpoint with a synthetic response and screenshots the
//! result.
//!
//! The intercepted endpoint is the code-execution service of the page being
//! visited; fulfilling it with canned JSON makes the page render our banner
//! instead of really running anything.

use anyhow::Result;
use serde_json::json;
use trypw::{ContextOptions, FulfillOptions, Resolution, ScreenshotOptions, Session};

const IMAGE_URL: &str = "https://via.placeholder.com/300x70/e74c3c/2c3e50/?text=Yey%20Playwright!";

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session.chromium().launch().await?;
    let context = browser.new_context(ContextOptions::default()).await?;
    let page = context.new_page().await?;
    page.goto("https://try.playwright.tech").await?;

    let _binding = page
        .route("https://try.playwright.tech/service/control/run", |_request| {
            Resolution::Fulfill(FulfillOptions::default().status(200).json_body(&json!({
                "version": "We are intercepting Requests",
                "duration": 12346789,
                "files": [{
                    "filename": "banner.png",
                    "publicURL": IMAGE_URL,
                    "extension": ".png",
                }],
                "logs": [],
            })))
        })
        .await?;

    // Register the waiter first so the banner response cannot slip past
    // between the click and the screenshot.
    let banner = page.wait_for_response(IMAGE_URL);
    page.click("\"Run\"").await?;
    banner.await?;

    page.screenshot_to_file("window.png", ScreenshotOptions::default())
        .await?;

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
