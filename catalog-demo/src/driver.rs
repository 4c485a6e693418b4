//! The demo sequence.
//!
//! Runs the goods catalog through index creation, single and batch upserts,
//! point lookup, sorted listing, the price range finder, match and term
//! queries with paging and sorting, and a terms aggregation on brand.

use catalog_repository::goods::queries;
use catalog_repository::query::{SearchRequest, TermsBucket};
use catalog_repository::{GoodRepository, SearchIndexError};
use catalog_shared::{Good, Page, Pageable, Sort};
use serde::Serialize;
use tracing::{info, instrument};

use crate::DemoError;

/// Page size of the paged term query.
pub const DEMO_PAGE_SIZE: usize = 3;

/// The first good, saved on its own.
pub fn first_good() -> Good {
    Good::with_brand(1, "小米手机", 2999.3, "小米")
}

/// Goods saved in one batch.
pub fn batch_goods() -> Vec<Good> {
    vec![
        Good::with_brand(2, "apple手机", 6288.0, "apple"),
        Good::with_brand(3, "华为手机", 3695.8, "华为"),
        Good::with_brand(4, "OPPO手机", 4633.3, "OPPO"),
        Good::with_brand(5, "华为手机", 1999.4, "华为"),
        Good::with_brand(6, "小米电视", 4888.8, "小米"),
    ]
}

/// Everything the demo read back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    /// Whether this run created the index.
    pub index_created: bool,
    pub saved: Good,
    pub saved_batch: Vec<Good>,
    pub found_by_id: Option<Good>,
    pub all_by_price_desc: Vec<Good>,
    pub price_between: Vec<Good>,
    /// Match query on title for "小米".
    pub title_matches: Vec<Good>,
    /// The same match query, as a page with totals.
    pub title_match_page: Page<Good>,
    /// Term query on title for "手机", first page.
    pub term_page: Page<Good>,
    /// Term query on title for "手机", sorted by price descending.
    pub term_sorted: Page<Good>,
    pub brand_buckets: Vec<TermsBucket>,
}

/// Run the demo sequence against `repository`.
///
/// With `recreate_index` the index is dropped first, so the run starts from an
/// empty catalog.
#[instrument(skip(repository), fields(index = %repository.index_name()))]
pub async fn run_demo(
    repository: &GoodRepository,
    recreate_index: bool,
) -> Result<DemoReport, DemoError> {
    if recreate_index && repository.delete_index().await? {
        info!("Dropped existing index");
    }

    // Index lifecycle
    let index_created = repository.create_index().await?;
    repository.put_mapping().await?;

    // Writes
    let saved = repository.save(first_good()).await?;
    info!(good = %saved, "Saved good");
    let saved_batch = repository.save_all(batch_goods()).await?;
    info!(count = saved_batch.len(), "Saved goods");
    repository.refresh().await?;

    // Reads
    let found_by_id = repository.find_by_id(saved.id).await?;
    match &found_by_id {
        Some(good) => info!(good = %good, "Found by id"),
        None => info!(id = saved.id, "Not found by id"),
    }

    let all_by_price_desc = repository.find_all(Sort::desc(queries::PRICE_FIELD)).await?;
    log_goods("All goods by price desc", &all_by_price_desc);

    let price_between = repository.find_by_price_between(2000.0, 4000.0).await?;
    log_goods("Goods priced 2000 to 4000", &price_between);

    let title_matches = repository.search(queries::title_matches("小米")).await?;
    log_goods("Title matches '小米'", &title_matches);

    let title_match_page = repository
        .search_page(SearchRequest::new(queries::title_matches("小米")))
        .await?;
    info!(
        total_elements = title_match_page.total_elements,
        total_pages = title_match_page.total_pages(),
        "Title match page"
    );

    let term_page = repository
        .search_page(
            SearchRequest::new(queries::title_term("手机"))
                .with_pageable(Pageable::of(0, DEMO_PAGE_SIZE)),
        )
        .await?;
    info!(
        total_elements = term_page.total_elements,
        total_pages = term_page.total_pages(),
        size = term_page.size(),
        number = term_page.number(),
        "Term query page"
    );
    log_goods("Term query page content", &term_page.content);

    let term_sorted = repository
        .search_page(
            SearchRequest::new(queries::title_term("手机"))
                .with_sort(Sort::desc(queries::PRICE_FIELD)),
        )
        .await?;
    info!(total_elements = term_sorted.total_elements, "Sorted term query");
    log_goods("Sorted term query content", &term_sorted.content);

    // Aggregation, without fetching any source
    let aggregated = repository
        .search_aggregated(
            SearchRequest::match_all()
                .without_source()
                .with_aggregation(queries::brand_aggregation()),
        )
        .await?;
    let brand_buckets = aggregated
        .aggregations
        .terms(queries::BRANDS_AGGREGATION)
        .map(|terms| terms.buckets.clone())
        .ok_or_else(|| {
            SearchIndexError::parse(format!(
                "Aggregation '{}' missing from response",
                queries::BRANDS_AGGREGATION
            ))
        })?;
    for bucket in &brand_buckets {
        info!(brand = %bucket.key, doc_count = bucket.doc_count, "Brand bucket");
    }

    Ok(DemoReport {
        index_created,
        saved,
        saved_batch,
        found_by_id,
        all_by_price_desc,
        price_between,
        title_matches,
        title_match_page,
        term_page,
        term_sorted,
        brand_buckets,
    })
}

fn log_goods(message: &str, goods: &[Good]) {
    info!(count = goods.len(), "{}", message);
    for good in goods {
        info!(good = %good, "{}", message);
    }
}
