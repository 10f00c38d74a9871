use aidbox_core::SearchSet;
use aidbox_http::HttpClient;
use anyhow::Result;

use crate::cli::OutputFormat;
use crate::output::{print_resources, print_success};

/// Builds a search from `key=value` arguments. Keys go through the usual
/// alias mapping (`birth_date__ge=1990` becomes `birth-date=ge1990`).
pub(crate) fn build_search(resource_type: &str, raw_params: &[String]) -> Result<SearchSet> {
    raw_params
        .iter()
        .try_fold(SearchSet::new(resource_type), |search, raw| {
            let Some((key, value)) = raw.split_once('=') else {
                anyhow::bail!("Invalid search parameter \"{raw}\". Expected key=value");
            };
            Ok(search.search(key, value))
        })
}

pub async fn search(
    client: &HttpClient,
    resource_type: &str,
    raw_params: &[String],
    count: Option<u32>,
    sort: Option<&str>,
    all: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut search = build_search(resource_type, raw_params)?;
    if let Some(count) = count {
        search = search.limit(count);
    }
    if let Some(sort) = sort {
        search = search.sort(sort);
    }

    if all {
        let resources = client.fetch_all(&search).await?;
        let total = resources.len() as u64;
        print_resources(&resources, Some(total), format);
    } else {
        let page = client.fetch_page(&search).await?;
        print_resources(&page.resources, page.total, format);
    }
    Ok(())
}

pub async fn count(client: &HttpClient, resource_type: &str, raw_params: &[String]) -> Result<()> {
    let search = build_search(resource_type, raw_params)?;
    let total = client.count(&search).await?;
    print_success(&format!("{total} {resource_type} resource(s) match"));
    Ok(())
}
