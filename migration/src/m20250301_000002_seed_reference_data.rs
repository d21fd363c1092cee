use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_catalog::{Genres, MpaRatings};

const GENRES: [(i32, &str); 6] = [
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Animation"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

const MPA_RATINGS: [(i32, &str); 5] = [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut genres = Query::insert();
        genres.into_table(Genres::Table).columns([Genres::Id, Genres::Name]);
        for (id, name) in GENRES {
            genres.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(genres).await?;

        let mut ratings = Query::insert();
        ratings.into_table(MpaRatings::Table).columns([MpaRatings::Id, MpaRatings::Name]);
        for (id, name) in MPA_RATINGS {
            ratings.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(ratings).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.exec_stmt(Query::delete().from_table(Genres::Table).to_owned()).await?;
        manager.exec_stmt(Query::delete().from_table(MpaRatings::Table).to_owned()).await?;
        Ok(())
    }
}
