use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MpaRatings::Table)
                    .if_not_exists()
                    .col(pk_auto(MpaRatings::Id))
                    .col(string(MpaRatings::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string(Genres::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(pk_auto(Directors::Id))
                    .col(string(Directors::Name))
                    .col(string(Directors::NameFolded))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string(Films::Name))
                    .col(string(Films::NameFolded))
                    .col(string(Films::Description))
                    .col(string(Films::ReleaseDate))
                    .col(integer(Films::Duration))
                    .col(integer_null(Films::MpaId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_mpa")
                            .from(Films::Table, Films::MpaId)
                            .to(MpaRatings::Table, MpaRatings::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_release_date")
                    .table(Films::Table)
                    .col(Films::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        // Link rows keep their auto id so association order survives a round trip.
        manager
            .create_table(
                Table::create()
                    .table(FilmGenres::Table)
                    .if_not_exists()
                    .col(pk_auto(FilmGenres::Id))
                    .col(integer(FilmGenres::FilmId))
                    .col(integer(FilmGenres::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_genres_film")
                            .from(FilmGenres::Table, FilmGenres::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_genres_genre")
                            .from(FilmGenres::Table, FilmGenres::GenreId)
                            .to(Genres::Table, Genres::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_genres_unique")
                    .table(FilmGenres::Table)
                    .col(FilmGenres::FilmId)
                    .col(FilmGenres::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmDirectors::Table)
                    .if_not_exists()
                    .col(pk_auto(FilmDirectors::Id))
                    .col(integer(FilmDirectors::FilmId))
                    .col(integer(FilmDirectors::DirectorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_directors_film")
                            .from(FilmDirectors::Table, FilmDirectors::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_directors_director")
                            .from(FilmDirectors::Table, FilmDirectors::DirectorId)
                            .to(Directors::Table, Directors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_directors_unique")
                    .table(FilmDirectors::Table)
                    .col(FilmDirectors::FilmId)
                    .col(FilmDirectors::DirectorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_uniq(Users::Email))
                    .col(string(Users::Login))
                    .col(string(Users::Name))
                    .col(string_null(Users::Birthday))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmLikes::Table)
                    .if_not_exists()
                    .col(pk_auto(FilmLikes::Id))
                    .col(integer(FilmLikes::FilmId))
                    .col(integer(FilmLikes::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_likes_film")
                            .from(FilmLikes::Table, FilmLikes::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_likes_user")
                            .from(FilmLikes::Table, FilmLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_likes_unique")
                    .table(FilmLikes::Table)
                    .col(FilmLikes::FilmId)
                    .col(FilmLikes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_likes_user")
                    .table(FilmLikes::Table)
                    .col(FilmLikes::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Friendships::Table)
                    .if_not_exists()
                    .col(pk_auto(Friendships::Id))
                    .col(integer(Friendships::UserId))
                    .col(integer(Friendships::FriendId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendships_user")
                            .from(Friendships::Table, Friendships::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendships_friend")
                            .from(Friendships::Table, Friendships::FriendId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_friendships_unique")
                    .table(Friendships::Table)
                    .col(Friendships::UserId)
                    .col(Friendships::FriendId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(pk_auto(Reviews::Id))
                    .col(string(Reviews::Content))
                    .col(boolean(Reviews::IsPositive))
                    .col(integer(Reviews::UserId))
                    .col(integer(Reviews::FilmId))
                    .col(big_integer(Reviews::Useful).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_user")
                            .from(Reviews::Table, Reviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_film")
                            .from(Reviews::Table, Reviews::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReviewRatings::Table)
                    .if_not_exists()
                    .col(pk_auto(ReviewRatings::Id))
                    .col(integer(ReviewRatings::ReviewId))
                    .col(integer(ReviewRatings::UserId))
                    .col(boolean(ReviewRatings::IsUseful))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_ratings_review")
                            .from(ReviewRatings::Table, ReviewRatings::ReviewId)
                            .to(Reviews::Table, Reviews::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_ratings_unique")
                    .table(ReviewRatings::Table)
                    .col(ReviewRatings::ReviewId)
                    .col(ReviewRatings::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FeedEvents::Table)
                    .if_not_exists()
                    .col(pk_auto(FeedEvents::Id))
                    .col(integer(FeedEvents::UserId))
                    .col(big_integer(FeedEvents::Timestamp))
                    .col(string(FeedEvents::EventType))
                    .col(string(FeedEvents::Operation))
                    .col(integer(FeedEvents::EntityId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feed_events_user_timestamp")
                    .table(FeedEvents::Table)
                    .col(FeedEvents::UserId)
                    .col(FeedEvents::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FeedEvents::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ReviewRatings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Friendships::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmLikes::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmDirectors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Directors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MpaRatings::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum MpaRatings {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Genres {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Directors {
    Table,
    Id,
    Name,
    NameFolded,
}

#[derive(DeriveIden)]
enum Films {
    Table,
    Id,
    Name,
    NameFolded,
    Description,
    ReleaseDate,
    Duration,
    MpaId,
}

#[derive(DeriveIden)]
enum FilmGenres {
    Table,
    Id,
    FilmId,
    GenreId,
}

#[derive(DeriveIden)]
enum FilmDirectors {
    Table,
    Id,
    FilmId,
    DirectorId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Login,
    Name,
    Birthday,
}

#[derive(DeriveIden)]
enum FilmLikes {
    Table,
    Id,
    FilmId,
    UserId,
}

#[derive(DeriveIden)]
enum Friendships {
    Table,
    Id,
    UserId,
    FriendId,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    Content,
    IsPositive,
    UserId,
    FilmId,
    Useful,
}

#[derive(DeriveIden)]
enum ReviewRatings {
    Table,
    Id,
    ReviewId,
    UserId,
    IsUseful,
}

#[derive(DeriveIden)]
enum FeedEvents {
    Table,
    Id,
    UserId,
    Timestamp,
    EventType,
    Operation,
    EntityId,
}
