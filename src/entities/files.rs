use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Logical file: what the business graph links to, independent of where the bytes live.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub format: String,
    pub size: i64,
    pub extension: String,
    pub created_at: DateTimeUtc,
    pub document_type: Option<String>, // concept URI
    pub case_id: Option<String>,       // set for case attachments
    pub derived_from: Option<String>,  // set for generated documents
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::remote_files::Entity")]
    RemoteFiles,
    #[sea_orm(has_many = "super::local_files::Entity")]
    LocalFiles,
}

impl Related<super::remote_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RemoteFiles.def()
    }
}

impl Related<super::local_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocalFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
