use droid_pages::{logging, AppiumConfig, HomePage, Page, Session};

#[tokio::main]
async fn main() -> droid_pages::Result<()> {
    logging::init();

    let config = AppiumConfig::default().with_env_overrides();
    println!("Connecting to Appium at {}...", config.server_url);
    let driver = droid_pages::AppiumDriver::start(&config).await?;

    let outcome = search(&driver, &config, "Python programming").await;
    driver.quit().await?;
    outcome
}

async fn search(driver: &dyn Session, config: &AppiumConfig, term: &str) -> droid_pages::Result<()> {
    let home = HomePage::new(Page::with_wait(driver, config.wait_policy()))
        .skip_onboarding()
        .await?;
    println!("Search box visible: {}", home.is_search_displayed().await);

    println!("Searching for {term:?}...");
    let search = home.search_for(term).await?;
    if !search.is_results_displayed().await {
        println!("No results showed up");
        return Ok(());
    }

    let first = search.first_result_text().await?;
    println!("First result: {first}");

    let article = search.click_first_result().await?;
    println!("Article open: {}", article.is_article_displayed().await);

    Ok(())
}
