use super::mflow_api_client::{
    CatalogEntry, CatalogSource, FetchError, InvalidEntry, MflowProduct,
};
use super::processors::{process_product, ItemOutcome};
use super::sku_resolver::SkuResolver;
use crate::shared::config::SyncConfig;
use crate::shared::data::catalog_store::CatalogStore;
use contracts::domain::a001_store_product::ProductType;
use contracts::usecases::u501_sync_from_mflow::{ItemError, SyncReport};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Ошибка запуска синхронизации целиком
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to fetch mflow catalog: {0}")]
    Fetch(#[from] FetchError),
    #[error("mflow sync is already running")]
    AlreadyRunning,
}

/// Executor для UseCase синхронизации каталога mflow в магазин
pub struct SyncExecutor {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn CatalogStore>,
    config: SyncConfig,
    run_lock: Mutex<()>,
}

impl SyncExecutor {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Один проход синхронизации: загрузить каталог и разнести первые
    /// `batch_limit` товаров по магазину. Параллельный вызов в том же
    /// процессе сразу получает `AlreadyRunning`.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let session_id = Uuid::new_v4().to_string();
        let mut report = SyncReport::new(session_id.clone());
        tracing::info!("Starting mflow catalog sync, session {}", session_id);

        let entries = match self.source.fetch_products().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("mflow sync {} aborted: {}", session_id, e);
                return Err(e.into());
            }
        };
        report.fetched = entries.len() as i32;
        tracing::info!("Got {} products from mflow API", entries.len());

        let resolver = SkuResolver::new(self.store.as_ref(), self.config.sku_suffix_attempts);

        for (idx, entry) in entries.iter().enumerate() {
            let counter = idx + 1;
            if counter > self.config.batch_limit {
                tracing::info!(
                    "Batch limit {} reached, {} products left for later runs",
                    self.config.batch_limit,
                    entries.len() - idx
                );
                break;
            }
            report.processed += 1;

            let remote = match entry {
                CatalogEntry::Product(remote) => remote,
                CatalogEntry::Invalid(invalid) => {
                    report.add_error(invalid_entry_error(invalid));
                    continue;
                }
            };

            match process_product(&resolver, self.store.as_ref(), remote).await {
                Ok(outcome) => apply_outcome(&mut report, remote, outcome),
                Err(e) => {
                    tracing::error!("Failed to sync product '{}' (mflow id {}): {}", remote.sku, remote.id, e);
                    report.add_error(item_error(remote, e.to_string()));
                }
            }
        }

        report.complete();
        tracing::info!(
            "mflow sync {} finished: processed {}/{}, created {} ({} simple, {} variable), updated {}, skipped {}, variations {} created / {} skipped, SKU rewrites {}, errors {}",
            report.session_id,
            report.processed,
            report.fetched,
            report.created(),
            report.created_simple,
            report.created_variable,
            report.updated,
            report.skipped(),
            report.variations_created,
            report.variations_skipped,
            report.sku_rewrites,
            report.errors
        );

        Ok(report)
    }
}

fn item_error(remote: &MflowProduct, message: String) -> ItemError {
    ItemError {
        sku: remote.sku.clone(),
        remote_id: remote.id.clone(),
        message,
    }
}

fn invalid_entry_error(invalid: &InvalidEntry) -> ItemError {
    ItemError {
        sku: invalid.sku.clone(),
        remote_id: invalid.id.clone(),
        message: format!("catalog entry #{} could not be read: {}", invalid.index, invalid.error),
    }
}

fn apply_outcome(report: &mut SyncReport, remote: &MflowProduct, outcome: ItemOutcome) {
    match outcome {
        ItemOutcome::Updated => report.updated += 1,
        ItemOutcome::SkippedUnknownType => report.skipped_unknown_type += 1,
        ItemOutcome::SkippedVariationSku => report.skipped_variation_sku += 1,
        ItemOutcome::Created(created) => {
            match created.product_type {
                ProductType::Simple => report.created_simple += 1,
                ProductType::Variable => report.created_variable += 1,
            }
            if created.sku_rewritten {
                report.sku_rewrites += 1;
            }
            report.variations_created += created.variations.created;
            report.variations_skipped += created.variations.skipped;
            for failure in created.variations.failures {
                report.add_error(failure);
            }
            if let Some(e) = created.link_error {
                report.add_error(item_error(
                    remote,
                    format!("product {} saved but not linked: {}", created.id, e),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::catalog_store::MFLOW_PRODUCT_ID_META_KEY;
    use crate::shared::data::memory_store::InMemoryCatalogStore;
    use crate::usecases::u501_sync_from_mflow::mflow_api_client::{
        MflowProductType, MflowVariation,
    };
    use async_trait::async_trait;
    use contracts::usecases::u501_sync_from_mflow::SyncStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticSource {
        result: Result<Vec<CatalogEntry>, FetchError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn ok(products: Vec<MflowProduct>) -> Arc<Self> {
            Self::entries(products.into_iter().map(CatalogEntry::Product).collect())
        }

        fn entries(entries: Vec<CatalogEntry>) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(entries),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: FetchError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(products: Vec<MflowProduct>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(products.into_iter().map(CatalogEntry::Product).collect()),
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch_products(&self) -> Result<Vec<CatalogEntry>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    fn single(n: usize) -> MflowProduct {
        MflowProduct {
            id: n.to_string(),
            sku: format!("SKU-{}", n),
            name: format!("Product {}", n),
            description: String::new(),
            price: "10.00".into(),
            stock_quantity: Some(n as i64),
            product_type: MflowProductType::Single,
            variations: Vec::new(),
        }
    }

    fn config(batch_limit: usize) -> SyncConfig {
        SyncConfig {
            batch_limit,
            sku_suffix_attempts: 5,
        }
    }

    fn executor(
        source: Arc<StaticSource>,
        store: Arc<InMemoryCatalogStore>,
        batch_limit: usize,
    ) -> SyncExecutor {
        SyncExecutor::new(source, store, config(batch_limit))
    }

    #[tokio::test]
    async fn test_batch_cap() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let products: Vec<_> = (1..=20).map(single).collect();
        let executor = executor(StaticSource::ok(products), store.clone(), 12);

        let report = executor.sync().await.unwrap();
        assert_eq!(report.fetched, 20);
        assert_eq!(report.processed, 12);
        assert_eq!(report.created_simple, 12);
        assert_eq!(report.status, SyncStatus::Completed);

        assert_eq!(store.products().len(), 12);
        assert!(store.product_by_sku("SKU-12").is_some());
        assert!(store.product_by_sku("SKU-13").is_none());
    }

    #[tokio::test]
    async fn test_short_list_is_fully_processed() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let executor = executor(StaticSource::ok((1..=3).map(single).collect()), store.clone(), 12);

        let report = executor.sync().await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(store.products().len(), 3);
    }

    #[tokio::test]
    async fn test_second_run_updates_instead_of_creating() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let executor = executor(StaticSource::ok((1..=5).map(single).collect()), store.clone(), 12);

        let first = executor.sync().await.unwrap();
        assert_eq!(first.created(), 5);
        let before = store.products();

        let second = executor.sync().await.unwrap();
        assert_eq!(second.created(), 0);
        assert_eq!(second.updated, 5);
        assert_eq!(second.sku_rewrites, 0);
        assert_ne!(first.session_id, second.session_id);

        let after = store.products();
        assert_eq!(after.len(), 5);
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.id, a.id);
            assert_eq!(b.sku, a.sku);
            assert_eq!(b.name, a.name);
            assert_eq!(b.regular_price, a.regular_price);
            assert_eq!(b.stock_quantity, a.stock_quantity);
            assert_eq!(
                store.meta(a.id, MFLOW_PRODUCT_ID_META_KEY),
                Some(a.stock_quantity.unwrap().to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let executor = executor(
            StaticSource::failing(FetchError::Transport("connection refused".into())),
            store.clone(),
            12,
        );

        let err = executor.sync().await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(FetchError::Transport(_))));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_save_error_does_not_abort_batch() {
        let store = Arc::new(InMemoryCatalogStore::new());
        store.fail_on_sku("SKU-2");
        let executor = executor(StaticSource::ok((1..=3).map(single).collect()), store.clone(), 12);

        let report = executor.sync().await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.created_simple, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.error_messages[0].sku, "SKU-2");
        assert_eq!(report.error_messages[0].remote_id, "2");
        assert_eq!(report.status, SyncStatus::CompletedWithErrors);
        assert!(store.product_by_sku("SKU-3").is_some());
    }

    #[tokio::test]
    async fn test_unknown_types_count_toward_cap() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let mut products: Vec<_> = (1..=12)
            .map(|n| {
                let mut p = single(n);
                p.product_type = MflowProductType::Unknown;
                p
            })
            .collect();
        products.push(single(13));
        let executor = executor(StaticSource::ok(products), store.clone(), 12);

        let report = executor.sync().await.unwrap();
        assert_eq!(report.processed, 12);
        assert_eq!(report.skipped_unknown_type, 12);
        assert_eq!(report.created(), 0);
        assert_eq!(report.errors, 0);
        assert_eq!(report.status, SyncStatus::Completed);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_reported_and_counted() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let mut entries: Vec<_> = (1..=3).map(|n| CatalogEntry::Product(single(n))).collect();
        entries.insert(
            1,
            CatalogEntry::Invalid(InvalidEntry {
                index: 1,
                sku: "BROKEN".into(),
                id: "99".into(),
                error: "invalid type: string, expected a sequence".into(),
            }),
        );
        let executor = executor(StaticSource::entries(entries), store.clone(), 3);

        let report = executor.sync().await.unwrap();
        assert_eq!(report.fetched, 4);
        assert_eq!(report.processed, 3);
        assert_eq!(report.created_simple, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.error_messages[0].sku, "BROKEN");
        assert_eq!(report.error_messages[0].remote_id, "99");
        assert_eq!(report.status, SyncStatus::CompletedWithErrors);

        assert!(store.product_by_sku("SKU-1").is_some());
        assert!(store.product_by_sku("SKU-2").is_some());
        // сломанная запись тоже занимает место в пакете
        assert!(store.product_by_sku("SKU-3").is_none());
    }

    #[tokio::test]
    async fn test_variable_product_counts() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let shirt = MflowProduct {
            id: "18".into(),
            sku: "SH".into(),
            name: "Shirt".into(),
            product_type: MflowProductType::Variable,
            variations: vec![
                MflowVariation {
                    sku: "SH-G".into(),
                    name: "Gray".into(),
                    ..Default::default()
                },
                MflowVariation {
                    sku: "SH-R".into(),
                    name: "Red".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let executor = executor(StaticSource::ok(vec![shirt]), store.clone(), 12);

        let report = executor.sync().await.unwrap();
        assert_eq!(report.created_variable, 1);
        assert_eq!(report.variations_created, 2);
        assert_eq!(store.variations().len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_run_is_rejected() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let source = StaticSource::slow(vec![single(1)], Duration::from_millis(100));
        let executor = executor(source.clone(), store.clone(), 12);

        let (first, second) = tokio::join!(executor.sync(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            executor.sync().await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(SyncError::AlreadyRunning)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // после завершения lock освобождён
        let third = executor.sync().await.unwrap();
        assert_eq!(third.updated, 1);
    }
}
