//! Emulates a phone with a granted geolocation near the Colosseum and asks
//! the map to locate the device.

use anyhow::{Context, Result};
use trypw::{ContextOptions, Geolocation, ScreenshotOptions, Session, devices};

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let pixel = devices::device("Pixel 5").context("unknown device preset")?;

    let session = Session::launch().await?;
    let browser = session.chromium().launch().await?;
    let options = ContextOptions::builder()
        .device(pixel)
        .geolocation(Geolocation::new(41.889938, 12.492507))
        .permissions(vec!["geolocation".to_string()])
        .build();
    let context = browser.new_context(options).await?;
    let page = context.new_page().await?;

    page.goto("https://www.openstreetmap.org").await?;

    // Locating the device pans the map; wait for a freshly fetched tile so
    // the screenshot shows the new position.
    let tile = page.wait_for_request("**/*.png");
    page.click("a.control-button.geolocate").await?;
    tile.await?;

    page.screenshot_to_file("colosseum-pixel-5.png", ScreenshotOptions::default())
        .await?;

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
