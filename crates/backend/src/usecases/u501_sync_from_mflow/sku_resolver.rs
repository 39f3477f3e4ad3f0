use rand::Rng;

use crate::shared::data::catalog_store::{CatalogStore, SkuOwner, StoreError};

/// Артикул, под которым будет создан новый товар
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedSku {
    pub sku: String,
    /// true, если исходный артикул был занят и к нему добавлен суффикс
    pub rewritten: bool,
}

/// Поиск записей магазина по артикулу и генерация свободного артикула
pub struct SkuResolver<'a> {
    store: &'a dyn CatalogStore,
    suffix_attempts: u32,
}

impl<'a> SkuResolver<'a> {
    /// `suffix_attempts` - сколько вариантов с суффиксом пробовать.
    /// При 1 сгенерированный артикул повторно не проверяется.
    pub fn new(store: &'a dyn CatalogStore, suffix_attempts: u32) -> Self {
        Self {
            store,
            suffix_attempts: suffix_attempts.max(1),
        }
    }

    /// Точное совпадение артикула. Пустой артикул ни с чем не совпадает.
    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<SkuOwner>, StoreError> {
        if sku.is_empty() {
            return Ok(None);
        }
        self.store.find_id_by_sku(sku).await
    }

    /// `<base>-NNNN`, где NNNN от 1000 до 9999
    pub fn make_unique_sku(base_sku: &str) -> String {
        Self::make_unique_sku_with(base_sku, &mut rand::thread_rng())
    }

    pub fn make_unique_sku_with<R: Rng + ?Sized>(base_sku: &str, rng: &mut R) -> String {
        format!("{}-{}", base_sku, rng.gen_range(1000..=9999))
    }

    /// Вернуть артикул для создания товара. Занятый артикул переписывается
    /// суффиксом; последний вариант берётся без проверки, уникальность
    /// тогда проверит магазин при записи.
    pub async fn claim_sku(&self, requested: &str) -> Result<ClaimedSku, StoreError> {
        if self.find_by_sku(requested).await?.is_none() {
            return Ok(ClaimedSku {
                sku: requested.to_string(),
                rewritten: false,
            });
        }

        let mut attempt = 1;
        loop {
            let candidate = Self::make_unique_sku(requested);
            if attempt >= self.suffix_attempts || self.find_by_sku(&candidate).await?.is_none() {
                tracing::warn!(
                    "SKU '{}' is already taken, using '{}' (attempt {})",
                    requested,
                    candidate,
                    attempt
                );
                return Ok(ClaimedSku {
                    sku: candidate,
                    rewritten: true,
                });
            }
            attempt += 1;
        }
    }
}
