use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{AggregateId, EntityMetadata};

// ============================================================================
// ID Type
// ============================================================================

/// Уникальный идентификатор товара в локальном магазине
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreProductId(pub Uuid);

impl StoreProductId {
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

impl AggregateId for StoreProductId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(StoreProductId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

impl std::fmt::Display for StoreProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Product type & attributes
// ============================================================================

/// Тип товара магазина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Простой товар без вариаций
    Simple,
    /// Вариативный товар (вариации различаются значением атрибута)
    Variable,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Variable => "variable",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(ProductType::Simple),
            "variable" => Some(ProductType::Variable),
            _ => None,
        }
    }
}

/// Атрибут уровня товара (схема для вариаций)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    /// Ключ атрибута, под которым вариации хранят своё значение
    pub slug: String,
    /// Отображаемое имя
    pub name: String,
    /// Значение по умолчанию
    pub value: String,
    pub is_visible: bool,
    pub is_variation: bool,
    pub is_taxonomy: bool,
}

impl ProductAttribute {
    /// Атрибут "Цвет" вариативного товара mflow: видим на карточке,
    /// используется для вариаций, не привязан к таксономии
    pub fn color() -> Self {
        Self {
            slug: "color".to_string(),
            name: "Color".to_string(),
            value: String::new(),
            is_visible: true,
            is_variation: true,
            is_taxonomy: false,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Товар локального магазина
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProduct {
    pub id: StoreProductId,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub name: String,
    pub description: String,
    /// Артикул; уникальность обеспечивает магазин. Пустая строка = без артикула
    pub sku: String,
    /// Цена как десятичная строка (пустая, если не задана)
    #[serde(rename = "regularPrice")]
    pub regular_price: String,
    #[serde(rename = "stockQuantity")]
    pub stock_quantity: Option<i64>,
    pub attributes: Vec<ProductAttribute>,
    pub metadata: EntityMetadata,
}

impl StoreProduct {
    /// Создать простой товар для вставки
    pub fn new_simple(
        name: String,
        description: String,
        sku: String,
        regular_price: String,
        stock_quantity: Option<i64>,
    ) -> Self {
        Self {
            id: StoreProductId::new_v4(),
            product_type: ProductType::Simple,
            name,
            description,
            sku,
            regular_price,
            stock_quantity,
            attributes: Vec::new(),
            metadata: EntityMetadata::new(),
        }
    }

    /// Создать вариативный товар для вставки.
    /// Цена и остаток у родителя не задаются, их несут вариации.
    pub fn new_variable(
        name: String,
        description: String,
        sku: String,
        attributes: Vec<ProductAttribute>,
    ) -> Self {
        Self {
            id: StoreProductId::new_v4(),
            product_type: ProductType::Variable,
            name,
            description,
            sku,
            regular_price: String::new(),
            stock_quantity: None,
            attributes,
            metadata: EntityMetadata::new(),
        }
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Название товара не может быть пустым".into());
        }
        validate_price(&self.regular_price)
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.metadata.touch();
        self.metadata.increment_version();
    }
}

/// Цена допустима, если она пуста либо является неотрицательным десятичным числом
pub fn validate_price(price: &str) -> Result<(), String> {
    let trimmed = price.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
        _ => Err(format!("Некорректная цена: '{}'", price)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_product_validates() {
        let p = StoreProduct::new_simple(
            "Widget".into(),
            "A widget".into(),
            "A1".into(),
            "9.99".into(),
            Some(5),
        );
        assert!(p.validate().is_ok());
        assert_eq!(p.product_type, ProductType::Simple);
        assert!(p.attributes.is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        let p = StoreProduct::new_simple(" ".into(), String::new(), "A1".into(), "1".into(), None);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_price_validation() {
        assert!(validate_price("").is_ok());
        assert!(validate_price("12").is_ok());
        assert!(validate_price(" 12.50 ").is_ok());
        assert!(validate_price("abc").is_err());
        assert!(validate_price("-1").is_err());
        assert!(validate_price("NaN").is_err());
    }

    #[test]
    fn test_variable_product_carries_color_attribute() {
        let p = StoreProduct::new_variable(
            "Shirt".into(),
            String::new(),
            "SH".into(),
            vec![ProductAttribute::color()],
        );
        assert_eq!(p.attributes.len(), 1);
        let color = &p.attributes[0];
        assert_eq!(color.slug, "color");
        assert_eq!(color.name, "Color");
        assert_eq!(color.value, "");
        assert!(color.is_visible && color.is_variation && !color.is_taxonomy);
        assert_eq!(p.regular_price, "");
        assert_eq!(p.stock_quantity, None);
    }

    #[test]
    fn test_before_write_bumps_version() {
        let mut p = StoreProduct::new_simple("W".into(), String::new(), "A".into(), "1".into(), None);
        let created = p.metadata.updated_at;
        p.before_write();
        assert_eq!(p.metadata.version, 1);
        assert!(p.metadata.updated_at >= created);
    }

    #[test]
    fn test_product_type_round_trip_names() {
        assert_eq!(ProductType::from_str_opt("simple"), Some(ProductType::Simple));
        assert_eq!(ProductType::from_str_opt(ProductType::Variable.as_str()), Some(ProductType::Variable));
        assert_eq!(ProductType::from_str_opt("grouped"), None);
    }
}
