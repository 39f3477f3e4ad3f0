use async_trait::async_trait;
use contracts::domain::a001_store_product::{StoreProduct, StoreProductId};
use contracts::domain::a002_store_variation::{StoreVariation, StoreVariationId};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::catalog_store::{CatalogStore, SkuOwner, StoreError};
use crate::domain::a001_store_product::{meta_repository, repository as product_repository};
use crate::domain::a002_store_variation::repository as variation_repository;

/// Магазин поверх SQLite (sea-orm) с кэшем загруженных товаров
#[derive(Clone)]
pub struct DbCatalogStore {
    db: DatabaseConnection,
    cache: Arc<RwLock<HashMap<StoreProductId, StoreProduct>>>,
}

impl DbCatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cached(&self, id: StoreProductId) -> Option<StoreProduct> {
        self.cache.read().ok()?.get(&id).cloned()
    }

    fn put_cache(&self, product: &StoreProduct) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(product.id, product.clone());
        }
    }

    /// Артикул свободен, если он пустой или принадлежит самой записи
    async fn ensure_sku_free(&self, sku: &str, own: Option<SkuOwner>) -> Result<(), StoreError> {
        match self.find_id_by_sku(sku).await? {
            Some(owner) if Some(owner) != own => Err(StoreError::DuplicateSku(sku.to_string())),
            _ => Ok(()),
        }
    }
}

fn map_db_error(err: anyhow::Error, sku: &str) -> StoreError {
    if let Some(db_err) = err.downcast_ref::<DbErr>() {
        if let Some(SqlErr::UniqueConstraintViolation(_)) = db_err.sql_err() {
            return StoreError::DuplicateSku(sku.to_string());
        }
        if matches!(db_err, DbErr::RecordNotUpdated) {
            return StoreError::NotFound(sku.to_string());
        }
    }
    StoreError::Storage(err.to_string())
}

fn storage(err: anyhow::Error) -> StoreError {
    StoreError::Storage(err.to_string())
}

#[async_trait]
impl CatalogStore for DbCatalogStore {
    async fn find_id_by_sku(&self, sku: &str) -> Result<Option<SkuOwner>, StoreError> {
        if let Some(id) = product_repository::find_id_by_sku(&self.db, sku)
            .await
            .map_err(storage)?
        {
            return Ok(Some(SkuOwner::Product(StoreProductId(id))));
        }
        let variation = variation_repository::find_id_by_sku(&self.db, sku)
            .await
            .map_err(storage)?;
        Ok(variation.map(|id| SkuOwner::Variation(StoreVariationId(id))))
    }

    async fn load_product(&self, id: StoreProductId) -> Result<Option<StoreProduct>, StoreError> {
        if let Some(product) = self.cached(id) {
            return Ok(Some(product));
        }
        let loaded = product_repository::get_by_id(&self.db, id.value())
            .await
            .map_err(storage)?;
        if let Some(product) = &loaded {
            self.put_cache(product);
        }
        Ok(loaded)
    }

    async fn insert_product(&self, product: &StoreProduct) -> Result<StoreProductId, StoreError> {
        product.validate().map_err(StoreError::Validation)?;
        self.ensure_sku_free(&product.sku, None).await?;
        product_repository::insert(&self.db, product)
            .await
            .map_err(|e| map_db_error(e, &product.sku))?;
        Ok(product.id)
    }

    async fn update_product(&self, product: &StoreProduct) -> Result<(), StoreError> {
        product.validate().map_err(StoreError::Validation)?;
        self.ensure_sku_free(&product.sku, Some(SkuOwner::Product(product.id)))
            .await?;
        product_repository::update(&self.db, product)
            .await
            .map_err(|e| map_db_error(e, &product.sku))?;
        self.put_cache(product);
        Ok(())
    }

    async fn insert_variation(
        &self,
        variation: &StoreVariation,
    ) -> Result<StoreVariationId, StoreError> {
        variation.validate().map_err(StoreError::Validation)?;
        if self.load_product(variation.parent_id).await?.is_none() {
            return Err(StoreError::NotFound(format!(
                "parent product {}",
                variation.parent_id
            )));
        }
        self.ensure_sku_free(&variation.sku, None).await?;
        variation_repository::insert(&self.db, variation)
            .await
            .map_err(|e| map_db_error(e, &variation.sku))?;
        Ok(variation.id)
    }

    async fn set_meta(
        &self,
        id: StoreProductId,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        meta_repository::upsert(&self.db, id.value(), key, value)
            .await
            .map_err(storage)
    }

    async fn get_meta(&self, id: StoreProductId, key: &str) -> Result<Option<String>, StoreError> {
        meta_repository::get(&self.db, id.value(), key)
            .await
            .map_err(storage)
    }

    async fn invalidate_cache(&self, id: StoreProductId) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(&id);
        }
    }
}
