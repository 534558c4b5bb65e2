mod crawler_utils;
mod error;
mod github_api_utils;
mod settings;
use crawler_utils::crawler_helper::crawl_all_pages;
use error::CrawlerError;
use github_api_utils::github_api_helper::GithubGraphqlFetcher;
use settings::CrawlerSettings;

use dotenv::dotenv;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

// Github search stops paginating after this many results
const SEARCH_RESULT_CAP: u64 = 1000;

fn init_logger() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

async fn run_crawler() -> Result<(), CrawlerError> {
    let settings = CrawlerSettings::from_env()?;
    let fetcher = GithubGraphqlFetcher::new(&settings)?;
    info!(
        "Searching repositories matching '{}', {} per page",
        github_api_utils::search_repo_query::search_expression(settings.min_stars),
        settings.page_size
    );

    let summary = crawl_all_pages(&fetcher, &settings).await?;
    if summary.repository_count > SEARCH_RESULT_CAP {
        warn!(
            "Github reported {} matching repositories but search results stop at {}",
            summary.repository_count, SEARCH_RESULT_CAP
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // load env variables
    dotenv().ok();
    init_logger();
    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("crawler");
    match mode {
        "crawler" => {
            if let Err(err) = run_crawler().await {
                error!("{err}");
                std::process::exit(1);
            }
        }
        _ => {
            error!("Unrecognized argument {}, closing...", mode);
            std::process::exit(2);
        }
    }
}
