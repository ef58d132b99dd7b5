//! Blacklist database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::BlacklistEntry;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "black_lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeUtc,
    pub domain: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BlacklistEntry {
    fn from(model: Model) -> Self {
        BlacklistEntry {
            id: model.id,
            created_at: model.created_at,
            domain: model.domain,
        }
    }
}
