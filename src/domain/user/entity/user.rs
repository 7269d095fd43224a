use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity supplied by the auth provider
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::domain::room::entity::room_participant::Entity")]
    RoomParticipant,
    #[sea_orm(has_many = "crate::domain::vote::entity::vote::Entity")]
    Vote,
}

impl Related<crate::domain::room::entity::room_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoomParticipant.def()
    }
}

impl Related<crate::domain::vote::entity::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
