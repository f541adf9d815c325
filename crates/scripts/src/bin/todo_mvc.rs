//! End-to-end flow against the TodoMVC reference app: add a todo, complete
//! it, walk the filters, and clear the list, asserting the count at every
//! step.

use anyhow::{Result, ensure};
use trypw::{ContextOptions, LaunchOptions, Page, Session};

const TODO_NAME: &str = "Bake a cake";

async fn count_of_todos(page: &Page) -> Result<u64> {
    let count = page
        .evaluate_typed("() => document.querySelectorAll('ul.todo-list > li').length")
        .await?;
    Ok(count)
}

#[tokio::main]
async fn main() -> Result<()> {
    trypw_scripts::init_logging();

    let session = Session::launch().await?;
    let browser = session
        .chromium()
        .launch_with_options(LaunchOptions::default().slow_mo(50.0))
        .await?;
    let context = browser.new_context(ContextOptions::default()).await?;
    let page = context.new_page().await?;

    page.goto("http://todomvc.com/examples/react/").await?;

    // Initially the list is empty.
    ensure!(count_of_todos(&page).await? == 0, "expected an empty list");

    // Add one entry.
    page.click("input.new-todo").await?;
    page.fill("input.new-todo", TODO_NAME).await?;
    page.press("input.new-todo", "Enter").await?;
    ensure!(count_of_todos(&page).await? == 1, "expected one entry");

    let first_entry: String = page
        .evaluate_typed(
            "() => document.querySelector('ul.todo-list > li:nth-child(1) label').textContent",
        )
        .await?;
    ensure!(first_entry == TODO_NAME, "unexpected entry text: {first_entry}");

    // The list is persistent across reloads.
    page.reload().await?;
    ensure!(count_of_todos(&page).await? == 1, "entry lost on reload");

    // Complete the entry, then walk the filters.
    page.click("input.toggle").await?;
    page.click("\"Active\"").await?;
    ensure!(count_of_todos(&page).await? == 0, "completed entry still active");
    page.click("\"Completed\"").await?;
    ensure!(count_of_todos(&page).await? == 1, "entry missing from completed");

    // Clear completed entries.
    page.click("\"Clear completed\"").await?;
    ensure!(count_of_todos(&page).await? == 0, "list not cleared");

    browser.close().await?;
    session.shutdown().await?;
    Ok(())
}
