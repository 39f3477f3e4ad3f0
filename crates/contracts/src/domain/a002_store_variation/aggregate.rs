use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::a001_store_product::aggregate::{validate_price, StoreProductId};
use crate::domain::common::{AggregateId, EntityMetadata};

/// Уникальный идентификатор вариации товара
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreVariationId(pub Uuid);

impl StoreVariationId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for StoreVariationId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(StoreVariationId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

impl std::fmt::Display for StoreVariationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Вариация вариативного товара. Принадлежит ровно одному родителю.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreVariation {
    pub id: StoreVariationId,
    #[serde(rename = "parentId")]
    pub parent_id: StoreProductId,
    pub sku: String,
    #[serde(rename = "regularPrice")]
    pub regular_price: String,
    #[serde(rename = "manageStock")]
    pub manage_stock: bool,
    #[serde(rename = "stockQuantity")]
    pub stock_quantity: Option<i64>,
    /// Значения атрибутов родителя: slug -> значение
    pub attributes: BTreeMap<String, String>,
    pub metadata: EntityMetadata,
}

impl StoreVariation {
    pub fn new_for_insert(
        parent_id: StoreProductId,
        sku: String,
        regular_price: String,
        manage_stock: bool,
        stock_quantity: Option<i64>,
    ) -> Self {
        Self {
            id: StoreVariationId::new_v4(),
            parent_id,
            sku,
            regular_price,
            manage_stock,
            stock_quantity,
            attributes: BTreeMap::new(),
            metadata: EntityMetadata::new(),
        }
    }

    pub fn set_attribute(&mut self, slug: &str, value: String) {
        self.attributes.insert(slug.to_string(), value);
    }

    pub fn color(&self) -> Option<&str> {
        self.attributes.get("color").map(String::as_str)
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.parent_id.value().is_nil() {
            return Err("Вариация должна ссылаться на родительский товар".into());
        }
        validate_price(&self.regular_price)
    }
}
