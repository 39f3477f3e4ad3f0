use contracts::domain::a001_store_product::StoreProductId;
use contracts::domain::a002_store_variation::StoreVariation;
use contracts::usecases::u501_sync_from_mflow::ItemError;

use super::super::mflow_api_client::MflowProduct;
use super::super::sku_resolver::SkuResolver;
use crate::shared::data::catalog_store::CatalogStore;

const COLOR_ATTRIBUTE: &str = "color";

/// Итог создания вариаций одного вариативного товара
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariationSummary {
    pub created: i32,
    /// Артикул уже есть в магазине, вариация не трогается
    pub skipped: i32,
    pub failures: Vec<ItemError>,
}

/// Создать вариации нового родителя по данным mflow.
/// Ошибка одной вариации не останавливает остальные.
pub async fn materialize_variations(
    resolver: &SkuResolver<'_>,
    store: &dyn CatalogStore,
    parent_id: StoreProductId,
    remote: &MflowProduct,
) -> VariationSummary {
    let mut summary = VariationSummary::default();

    for remote_variation in &remote.variations {
        let fail = |message: String| ItemError {
            sku: remote_variation.sku.clone(),
            remote_id: remote.id.clone(),
            message,
        };

        match resolver.find_by_sku(&remote_variation.sku).await {
            Ok(Some(owner)) => {
                tracing::debug!(
                    "Variation SKU '{}' already exists ({:?}), skipping",
                    remote_variation.sku,
                    owner
                );
                summary.skipped += 1;
            }
            Ok(None) => {
                let mut variation = StoreVariation::new_for_insert(
                    parent_id,
                    remote_variation.sku.clone(),
                    remote_variation.price.clone(),
                    remote_variation.manage_stock,
                    remote_variation.stock_quantity,
                );
                variation.set_attribute(COLOR_ATTRIBUTE, remote_variation.name.clone());

                match store.insert_variation(&variation).await {
                    Ok(id) => {
                        tracing::debug!(
                            "Created variation {} '{}' for parent {}",
                            id,
                            remote_variation.sku,
                            parent_id
                        );
                        summary.created += 1;
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to create variation '{}' of '{}': {}",
                            remote_variation.sku,
                            remote.sku,
                            e
                        );
                        summary.failures.push(fail(e.to_string()));
                    }
                }
            }
            Err(e) => {
                tracing::error!("SKU lookup failed for variation '{}': {}", remote_variation.sku, e);
                summary.failures.push(fail(e.to_string()));
            }
        }
    }

    summary
}
