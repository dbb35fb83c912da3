use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::app::Result;
use crate::config::SourceConfig;
use crate::domain::{SearchQuery, WorkSummary};
use crate::fetcher::parser::{self, NO_TEXT_PLACEHOLDER};
use crate::fetcher::ContentSource;

pub struct HttpSource {
    client: Client,
    base_url: Url,
    max_results: usize,
    view_full_work: bool,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            max_results: config.max_results,
            view_full_work: config.view_full_work,
        })
    }

    pub fn search_url(&self, query: &SearchQuery) -> Result<Url> {
        let mut params: Vec<(&str, String)> = vec![
            ("commit", "Search".to_string()),
            ("work_search[query]", query.text.clone()),
        ];

        if query.page > 1 {
            params.push(("page", query.page.to_string()));
        }
        if let Some(sort) = query.backend_sort {
            params.push(("work_search[sort_column]", sort.column().to_string()));
        }
        if query.complete_only {
            params.push(("work_search[complete]", "T".to_string()));
        }
        if let Some(rating) = query.rating {
            params.push(("work_search[rating_ids]", rating.id().to_string()));
        }

        let endpoint = self.base_url.join("/works/search")?;
        Ok(Url::parse_with_params(endpoint.as_str(), &params)?)
    }

    /// The URL actually requested for a work. The work's identity link is
    /// left untouched.
    pub fn work_url(&self, link: &str) -> Result<Url> {
        let mut url = self.base_url.join(link)?;
        if self.view_full_work {
            url.query_pairs_mut().append_pair("view_full_work", "true");
        }
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<WorkSummary>> {
        let url = self.search_url(query)?;
        let body = self.get_text(url).await?;
        let results = parser::parse_search_results(&body, &self.base_url, self.max_results);
        tracing::info!("Search '{}' returned {} works", query.text, results.len());
        Ok(results)
    }

    async fn fetch_work(&self, link: &str) -> Result<String> {
        let url = self.work_url(link)?;
        let body = self.get_text(url).await?;

        match parser::parse_work_text(&body) {
            Some(text) => Ok(text),
            None => {
                tracing::warn!("No text container found at {}", link);
                Ok(NO_TEXT_PLACEHOLDER.to_string())
            }
        }
    }
}
