use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "films")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// `name` lower-cased in Rust. SQLite's `LOWER` only folds ASCII.
    pub name_folded: String,
    pub description: String,
    /// ISO `YYYY-MM-DD`, so lexical order matches calendar order.
    pub release_date: String,
    pub duration: i32,
    pub mpa_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mpa_rating::Entity",
        from = "Column::MpaId",
        to = "super::mpa_rating::Column::Id"
    )]
    MpaRating,
}

impl Related<super::mpa_rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MpaRating.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
