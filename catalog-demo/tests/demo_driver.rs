//! Integration tests for the demo driver.
//!
//! These run the full demo sequence against the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use catalog_demo::driver::{batch_goods, first_good, DEMO_PAGE_SIZE};
use catalog_demo::{run_demo, DemoReport};
use catalog_repository::{GoodRepository, MemoryStore};
use catalog_shared::Good;

fn repository() -> GoodRepository {
    GoodRepository::new(Arc::new(MemoryStore::new()))
}

fn sorted_ids(goods: &[Good]) -> Vec<i64> {
    let mut ids: Vec<i64> = goods.iter().map(|g| g.id).collect();
    ids.sort_unstable();
    ids
}

fn bucket_counts(report: &DemoReport) -> BTreeMap<String, u64> {
    report
        .brand_buckets
        .iter()
        .map(|b| (b.key.clone(), b.doc_count))
        .collect()
}

#[tokio::test]
async fn test_demo_on_fresh_store() {
    let repository = repository();

    let report = run_demo(&repository, false).await.unwrap();

    assert!(report.index_created);
    assert_eq!(report.saved, first_good());
    assert_eq!(report.saved_batch, batch_goods());
    assert_eq!(report.found_by_id, Some(first_good()));

    let by_price: Vec<i64> = report.all_by_price_desc.iter().map(|g| g.id).collect();
    assert_eq!(by_price, vec![2, 6, 4, 3, 1, 5]);

    assert_eq!(sorted_ids(&report.price_between), vec![1, 3]);
    assert_eq!(sorted_ids(&report.title_matches), vec![1, 6]);

    assert_eq!(report.title_match_page.total_elements, 2);
    assert_eq!(report.title_match_page.total_pages(), 1);

    assert_eq!(report.term_page.total_elements, 5);
    assert_eq!(report.term_page.len(), DEMO_PAGE_SIZE);
    assert_eq!(report.term_page.total_pages(), 2);
    assert_eq!(report.term_page.number(), 0);

    let sorted_prices: Vec<f64> = report.term_sorted.iter().map(|g| g.price).collect();
    assert_eq!(sorted_prices, vec![6288.0, 4633.3, 3695.8, 2999.3, 1999.4]);

    let expected: BTreeMap<String, u64> = [("apple", 1), ("华为", 2), ("OPPO", 1), ("小米", 2)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(bucket_counts(&report), expected);
}

#[tokio::test]
async fn test_brand_buckets_ordered_by_count() {
    let report = run_demo(&repository(), false).await.unwrap();

    let counts: Vec<u64> = report.brand_buckets.iter().map(|b| b.doc_count).collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_demo_is_repeatable() {
    let repository = repository();
    let first = run_demo(&repository, false).await.unwrap();

    let second = run_demo(&repository, false).await.unwrap();

    // Upserts keyed by id leave the catalog unchanged
    assert!(!second.index_created);
    assert_eq!(second.all_by_price_desc, first.all_by_price_desc);
    assert_eq!(bucket_counts(&second), bucket_counts(&first));
    assert_eq!(repository.count().await.unwrap(), 6);
}

#[tokio::test]
async fn test_demo_recreates_index() {
    let repository = repository();
    repository
        .save(Good::new(99, "旧商品", 10.0))
        .await
        .unwrap();

    let report = run_demo(&repository, true).await.unwrap();

    assert!(report.index_created);
    assert_eq!(repository.count().await.unwrap(), 6);
    assert_eq!(repository.find_by_id(99).await.unwrap(), None);
}
