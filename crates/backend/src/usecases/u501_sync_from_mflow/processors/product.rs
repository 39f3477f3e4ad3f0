use contracts::domain::a001_store_product::{
    ProductAttribute, ProductType, StoreProduct, StoreProductId,
};

use super::super::mflow_api_client::{MflowProduct, MflowProductType};
use super::super::sku_resolver::SkuResolver;
use super::variation::{materialize_variations, VariationSummary};
use crate::shared::data::catalog_store::{
    CatalogStore, SkuOwner, StoreError, MFLOW_PRODUCT_ID_META_KEY,
};

/// Что произошло с одним товаром mflow
#[derive(Debug)]
pub enum ItemOutcome {
    Updated,
    Created(CreatedProduct),
    /// Тип не Single и не Variable
    SkippedUnknownType,
    /// Артикул в магазине принадлежит вариации
    SkippedVariationSku,
}

/// Новый товар магазина
#[derive(Debug)]
pub struct CreatedProduct {
    pub id: StoreProductId,
    pub product_type: ProductType,
    pub sku: String,
    pub sku_rewritten: bool,
    /// Пусто для простых товаров
    pub variations: VariationSummary,
    /// Товар записан, но связь с mflow сохранить не удалось
    pub link_error: Option<StoreError>,
}

/// Обработать один товар (upsert по артикулу)
pub async fn process_product(
    resolver: &SkuResolver<'_>,
    store: &dyn CatalogStore,
    remote: &MflowProduct,
) -> Result<ItemOutcome, StoreError> {
    match resolver.find_by_sku(&remote.sku).await? {
        Some(SkuOwner::Product(id)) => update_product(store, id, remote).await,
        Some(SkuOwner::Variation(id)) => {
            tracing::warn!(
                "SKU '{}' belongs to variation {}, product skipped",
                remote.sku,
                id
            );
            Ok(ItemOutcome::SkippedVariationSku)
        }
        None => match remote.product_type {
            MflowProductType::Single => create_single_product(resolver, store, remote).await,
            MflowProductType::Variable => create_variable_product(resolver, store, remote).await,
            MflowProductType::Unknown => {
                tracing::debug!("Product '{}' has unknown type, skipping", remote.sku);
                Ok(ItemOutcome::SkippedUnknownType)
            }
        },
    }
}

/// Обновить найденный товар: имя, цена, остаток, артикул.
/// Связь с mflow не переписывается.
pub async fn update_product(
    store: &dyn CatalogStore,
    id: StoreProductId,
    remote: &MflowProduct,
) -> Result<ItemOutcome, StoreError> {
    tracing::debug!("Updating existing product: {}", remote.sku);

    let mut product = store
        .load_product(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("product {}", id)))?;

    product.name = remote.name.clone();
    product.regular_price = remote.price.clone();
    product.stock_quantity = remote.stock_quantity;
    product.sku = remote.sku.clone();
    product.before_write();

    store.update_product(&product).await?;

    match store.get_meta(id, MFLOW_PRODUCT_ID_META_KEY).await {
        Ok(Some(linked)) if linked != remote.id => tracing::warn!(
            "Product '{}' is linked to mflow id {}, but the catalog now reports {}",
            remote.sku,
            linked,
            remote.id
        ),
        Ok(_) => {}
        Err(e) => tracing::debug!("Could not read mflow link of '{}': {}", remote.sku, e),
    }

    Ok(ItemOutcome::Updated)
}

/// Создать простой товар
pub async fn create_single_product(
    resolver: &SkuResolver<'_>,
    store: &dyn CatalogStore,
    remote: &MflowProduct,
) -> Result<ItemOutcome, StoreError> {
    let claimed = resolver.claim_sku(&remote.sku).await?;
    tracing::debug!("Inserting new simple product: {}", claimed.sku);

    let product = StoreProduct::new_simple(
        remote.name.clone(),
        remote.description.clone(),
        claimed.sku.clone(),
        remote.price.clone(),
        remote.stock_quantity,
    );
    let id = store.insert_product(&product).await?;
    let link_error = link_to_remote(store, id, remote).await.err();

    Ok(ItemOutcome::Created(CreatedProduct {
        id,
        product_type: ProductType::Simple,
        sku: claimed.sku,
        sku_rewritten: claimed.rewritten,
        variations: VariationSummary::default(),
        link_error,
    }))
}

/// Создать вариативный товар: сначала родитель, потом вариации
pub async fn create_variable_product(
    resolver: &SkuResolver<'_>,
    store: &dyn CatalogStore,
    remote: &MflowProduct,
) -> Result<ItemOutcome, StoreError> {
    let claimed = resolver.claim_sku(&remote.sku).await?;
    tracing::debug!("Inserting new variable product: {}", claimed.sku);

    let parent = StoreProduct::new_variable(
        remote.name.clone(),
        remote.description.clone(),
        claimed.sku.clone(),
        vec![ProductAttribute::color()],
    );
    let id = store.insert_product(&parent).await?;

    let variations = materialize_variations(resolver, store, id, remote).await;
    let link_error = link_to_remote(store, id, remote).await.err();

    Ok(ItemOutcome::Created(CreatedProduct {
        id,
        product_type: ProductType::Variable,
        sku: claimed.sku,
        sku_rewritten: claimed.rewritten,
        variations,
        link_error,
    }))
}

/// Записать mflow id в метаданные и сбросить кэш товара
async fn link_to_remote(
    store: &dyn CatalogStore,
    id: StoreProductId,
    remote: &MflowProduct,
) -> Result<(), StoreError> {
    let result = store
        .set_meta(id, MFLOW_PRODUCT_ID_META_KEY, &remote.id)
        .await;
    store.invalidate_cache(id).await;
    if let Err(e) = &result {
        tracing::error!("Failed to link product {} to mflow id {}: {}", id, remote.id, e);
    }
    result
}
