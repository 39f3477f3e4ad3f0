//! In-memory реализация [`CatalogStore`] для тестов синхронизации.

use async_trait::async_trait;
use contracts::domain::a001_store_product::{StoreProduct, StoreProductId};
use contracts::domain::a002_store_variation::{StoreVariation, StoreVariationId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::catalog_store::{CatalogStore, SkuOwner, StoreError};

#[derive(Default)]
struct State {
    products: Vec<StoreProduct>,
    variations: Vec<StoreVariation>,
    meta: HashMap<(StoreProductId, String), String>,
    invalidated: Vec<StoreProductId>,
    failing_skus: HashSet<String>,
    writes: usize,
    lookups: usize,
}

#[derive(Default)]
pub struct InMemoryCatalogStore {
    state: Mutex<State>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Положить товар в обход счётчика записей (исходное состояние магазина)
    pub fn seed_product(&self, product: StoreProduct) -> StoreProductId {
        let id = product.id;
        self.state.lock().unwrap().products.push(product);
        id
    }

    pub fn seed_variation(&self, variation: StoreVariation) -> StoreVariationId {
        let id = variation.id;
        self.state.lock().unwrap().variations.push(variation);
        id
    }

    /// Любая запись с этим артикулом будет падать с ошибкой хранилища
    pub fn fail_on_sku(&self, sku: &str) {
        self.state.lock().unwrap().failing_skus.insert(sku.to_string());
    }

    pub fn products(&self) -> Vec<StoreProduct> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn variations(&self) -> Vec<StoreVariation> {
        self.state.lock().unwrap().variations.clone()
    }

    pub fn product_by_sku(&self, sku: &str) -> Option<StoreProduct> {
        self.products().into_iter().find(|p| p.sku == sku)
    }

    pub fn meta(&self, id: StoreProductId, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .meta
            .get(&(id, key.to_string()))
            .cloned()
    }

    pub fn invalidated(&self) -> Vec<StoreProductId> {
        self.state.lock().unwrap().invalidated.clone()
    }

    /// Сколько раз магазин что-либо записал (товары, вариации, метаданные)
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn lookup_count(&self) -> usize {
        self.state.lock().unwrap().lookups
    }
}

impl State {
    fn owner_of(&self, sku: &str) -> Option<SkuOwner> {
        if sku.is_empty() {
            return None;
        }
        if let Some(p) = self
            .products
            .iter()
            .find(|p| p.sku == sku && !p.metadata.is_deleted)
        {
            return Some(SkuOwner::Product(p.id));
        }
        self.variations
            .iter()
            .find(|v| v.sku == sku && !v.metadata.is_deleted)
            .map(|v| SkuOwner::Variation(v.id))
    }

    fn check_write(&self, sku: &str, own: Option<SkuOwner>) -> Result<(), StoreError> {
        if self.failing_skus.contains(sku) {
            return Err(StoreError::Storage(format!("injected failure for '{}'", sku)));
        }
        match self.owner_of(sku) {
            Some(owner) if Some(owner) != own => Err(StoreError::DuplicateSku(sku.to_string())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_id_by_sku(&self, sku: &str) -> Result<Option<SkuOwner>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.lookups += 1;
        Ok(state.owner_of(sku))
    }

    async fn load_product(&self, id: StoreProductId) -> Result<Option<StoreProduct>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: &StoreProduct) -> Result<StoreProductId, StoreError> {
        product.validate().map_err(StoreError::Validation)?;
        let mut state = self.state.lock().unwrap();
        state.check_write(&product.sku, None)?;
        state.products.push(product.clone());
        state.writes += 1;
        Ok(product.id)
    }

    async fn update_product(&self, product: &StoreProduct) -> Result<(), StoreError> {
        product.validate().map_err(StoreError::Validation)?;
        let mut state = self.state.lock().unwrap();
        state.check_write(&product.sku, Some(SkuOwner::Product(product.id)))?;
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| StoreError::NotFound(product.id.to_string()))?;
        *slot = product.clone();
        state.writes += 1;
        Ok(())
    }

    async fn insert_variation(
        &self,
        variation: &StoreVariation,
    ) -> Result<StoreVariationId, StoreError> {
        variation.validate().map_err(StoreError::Validation)?;
        let mut state = self.state.lock().unwrap();
        if !state.products.iter().any(|p| p.id == variation.parent_id) {
            return Err(StoreError::NotFound(format!(
                "parent product {}",
                variation.parent_id
            )));
        }
        state.check_write(&variation.sku, None)?;
        state.variations.push(variation.clone());
        state.writes += 1;
        Ok(variation.id)
    }

    async fn set_meta(
        &self,
        id: StoreProductId,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.meta.insert((id, key.to_string()), value.to_string());
        state.writes += 1;
        Ok(())
    }

    async fn get_meta(&self, id: StoreProductId, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.meta(id, key))
    }

    async fn invalidate_cache(&self, id: StoreProductId) {
        self.state.lock().unwrap().invalidated.push(id);
    }
}
