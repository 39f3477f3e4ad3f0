use chrono::Utc;
use contracts::domain::a001_store_product::{
    ProductAttribute, ProductType, StoreProduct, StoreProductId,
};
use contracts::domain::common::{AggregateId, EntityMetadata};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_store_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_type: String,
    pub name: String,
    pub description: String,
    pub sku: String,
    pub regular_price: String,
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

impl From<Model> for StoreProduct {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let attributes: Vec<ProductAttribute> =
            serde_json::from_str(&m.attributes_json).unwrap_or_default();

        StoreProduct {
            id: StoreProductId::from_string(&m.id).unwrap_or_else(|_| StoreProductId::new_v4()),
            product_type: ProductType::from_str_opt(&m.product_type)
                .unwrap_or(ProductType::Simple),
            name: m.name,
            description: m.description,
            sku: m.sku,
            regular_price: m.regular_price,
            stock_quantity: m.stock_quantity,
            attributes,
            metadata,
        }
    }
}

fn attributes_json(aggregate: &StoreProduct) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&aggregate.attributes)?)
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<StoreProduct>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
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

pub async fn insert(db: &DatabaseConnection, aggregate: &StoreProduct) -> anyhow::Result<Uuid> {
    let uuid = aggregate.id.value();
    let active = ActiveModel {
        id: Set(aggregate.id.as_string()),
        product_type: Set(aggregate.product_type.as_str().to_string()),
        name: Set(aggregate.name.clone()),
        description: Set(aggregate.description.clone()),
        sku: Set(aggregate.sku.clone()),
        regular_price: Set(aggregate.regular_price.clone()),
        stock_quantity: Set(aggregate.stock_quantity),
        attributes_json: Set(attributes_json(aggregate)?),
        is_deleted: Set(aggregate.metadata.is_deleted),
        created_at: Set(Some(aggregate.metadata.created_at)),
        updated_at: Set(Some(aggregate.metadata.updated_at)),
        version: Set(aggregate.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}

pub async fn update(db: &DatabaseConnection, aggregate: &StoreProduct) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(aggregate.id.as_string()),
        product_type: Set(aggregate.product_type.as_str().to_string()),
        name: Set(aggregate.name.clone()),
        description: Set(aggregate.description.clone()),
        sku: Set(aggregate.sku.clone()),
        regular_price: Set(aggregate.regular_price.clone()),
        stock_quantity: Set(aggregate.stock_quantity),
        attributes_json: Set(attributes_json(aggregate)?),
        is_deleted: Set(aggregate.metadata.is_deleted),
        updated_at: Set(Some(aggregate.metadata.updated_at)),
        version: Set(aggregate.metadata.version),
        created_at: sea_orm::ActiveValue::NotSet,
    };
    active.update(db).await?;
    Ok(())
}
