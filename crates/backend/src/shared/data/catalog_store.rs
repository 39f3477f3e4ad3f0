use async_trait::async_trait;
use contracts::domain::a001_store_product::{StoreProduct, StoreProductId};
use contracts::domain::a002_store_variation::{StoreVariation, StoreVariationId};

/// Ключ метаданных, связывающий товар магазина с товаром mflow
pub const MFLOW_PRODUCT_ID_META_KEY: &str = "mflow_product_id";

/// Кому в магазине принадлежит артикул. Товары и вариации делят
/// одно пространство артикулов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkuOwner {
    Product(StoreProductId),
    Variation(StoreVariationId),
}

/// Ошибка операции с магазином. Для синхронизации восстановима:
/// запись бросается, пакет идёт дальше.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("SKU '{0}' is already used by another record")]
    DuplicateSku(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Контракт локального магазина, через который синхронизация пишет каталог
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Точный поиск по артикулу, без нормализации регистра и пробелов
    async fn find_id_by_sku(&self, sku: &str) -> Result<Option<SkuOwner>, StoreError>;

    async fn load_product(&self, id: StoreProductId) -> Result<Option<StoreProduct>, StoreError>;

    async fn insert_product(&self, product: &StoreProduct) -> Result<StoreProductId, StoreError>;

    async fn update_product(&self, product: &StoreProduct) -> Result<(), StoreError>;

    /// Родитель должен существовать на момент вставки
    async fn insert_variation(
        &self,
        variation: &StoreVariation,
    ) -> Result<StoreVariationId, StoreError>;

    async fn set_meta(&self, id: StoreProductId, key: &str, value: &str)
        -> Result<(), StoreError>;

    async fn get_meta(&self, id: StoreProductId, key: &str) -> Result<Option<String>, StoreError>;

    /// Сбросить закэшированные данные товара
    async fn invalidate_cache(&self, id: StoreProductId);
}
