use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Произвольные метаданные товара (ключ-значение)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_store_product_meta")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub meta_key: String,
    pub meta_value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Записать значение, перезаписав предыдущее
pub async fn upsert(
    db: &DatabaseConnection,
    product_id: Uuid,
    key: &str,
    value: &str,
) -> anyhow::Result<()> {
    let active = ActiveModel {
        product_id: Set(product_id.to_string()),
        meta_key: Set(key.to_string()),
        meta_value: Set(value.to_string()),
    };
    Entity::insert(active)
        .on_conflict(
            OnConflict::columns([Column::ProductId, Column::MetaKey])
                .update_column(Column::MetaValue)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn get(db: &DatabaseConnection, product_id: Uuid, key: &str) -> anyhow::Result<Option<String>> {
    let result = Entity::find()
        .filter(Column::ProductId.eq(product_id.to_string()))
        .filter(Column::MetaKey.eq(key))
        .one(db)
        .await?;
    Ok(result.map(|m| m.meta_value))
}
