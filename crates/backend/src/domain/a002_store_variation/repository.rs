use chrono::Utc;
use contracts::domain::a001_store_product::StoreProductId;
use contracts::domain::a002_store_variation::{StoreVariation, StoreVariationId};
use contracts::domain::common::{AggregateId, EntityMetadata};
use std::collections::BTreeMap;
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_store_variation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub parent_id: String,
    pub sku: String,
    pub regular_price: String,
    pub manage_stock: bool,
    pub stock_quantity: Option<i64>,
    pub attributes_json: String,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for StoreVariation {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let attributes: BTreeMap<String, String> =
            serde_json::from_str(&m.attributes_json).unwrap_or_default();

        StoreVariation {
            id: StoreVariationId::from_string(&m.id).unwrap_or_else(|_| StoreVariationId::new_v4()),
            parent_id: StoreProductId::from_string(&m.parent_id)
                .unwrap_or_else(|_| StoreProductId::new(Uuid::nil())),
            sku: m.sku,
            regular_price: m.regular_price,
            manage_stock: m.manage_stock,
            stock_quantity: m.stock_quantity,
            attributes,
            metadata,
        }
    }
}

/// Точный поиск по артикулу. Пустой артикул ничего не находит.
pub async fn find_id_by_sku(db: &DatabaseConnection, sku: &str) -> anyhow::Result<Option<Uuid>> {
    if sku.is_empty() {
        return Ok(None);
    }
    let result = Entity::find()
        .filter(Column::Sku.eq(sku))
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(result.and_then(|m| Uuid::parse_str(&m.id).ok()))
}

pub async fn insert(db: &DatabaseConnection, aggregate: &StoreVariation) -> anyhow::Result<Uuid> {
    let uuid = aggregate.id.value();
    let active = ActiveModel {
        id: Set(aggregate.id.as_string()),
        parent_id: Set(aggregate.parent_id.as_string()),
        sku: Set(aggregate.sku.clone()),
        regular_price: Set(aggregate.regular_price.clone()),
        manage_stock: Set(aggregate.manage_stock),
        stock_quantity: Set(aggregate.stock_quantity),
        attributes_json: Set(serde_json::to_string(&aggregate.attributes)?),
        is_deleted: Set(aggregate.metadata.is_deleted),
        created_at: Set(Some(aggregate.metadata.created_at)),
        updated_at: Set(Some(aggregate.metadata.updated_at)),
        version: Set(aggregate.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}
