//! User comments and ratings for a location
use crate::{
    Database,
    core::{
        error::{Error, Result},
        loadable::Loadable,
        query::{DynFilterPart, filter::FilterPart},
    },
    location::Location,
    policy,
    user::User,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, sqlite::SqliteQueryResult};
use time::OffsetDateTime;
use tracing::debug;

/// The maximum number of characters in a comment
pub const MAX_COMMENT_LENGTH: usize = 500;

/// The rating given when a comment doesn't specify one
pub const DEFAULT_RATING: i64 = 5;

#[derive(Clone, Debug)]
pub enum Filter {
    Id(i64),
    LocationId(i64),
    UserId(i64),
}

impl FilterPart for Filter {
    fn add_to_query(&self, builder: &mut QueryBuilder<Sqlite>) {
        match self {
            Self::Id(id) => _ = builder.push(" C.commentid = ").push_bind(*id),
            Self::LocationId(id) => _ = builder.push(" C.locid = ").push_bind(*id),
            Self::UserId(id) => _ = builder.push(" C.userid = ").push_bind(*id),
        }
    }
}

/// A comment that a user left about a location
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[sqlx(rename = "commentid")]
    pub id: i64,

    #[sqlx(rename = "locid")]
    pub location_id: i64,

    #[sqlx(rename = "userid")]
    pub user_id: i64,

    /// The name of the user who wrote the comment
    pub username: String,

    #[sqlx(rename = "commenttext")]
    pub text: String,

    pub rating: i64,

    #[sqlx(rename = "createdat")]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The user-supplied parts of a new comment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub location_id: Option<i64>,
    pub text: Option<String>,
    pub rating: Option<i64>,
}

/// A [NewComment] that has passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidComment {
    pub location_id: i64,
    pub text: String,
    pub rating: i64,
}

impl NewComment {
    /// Check the comment and fill in default values. The text is trimmed and
    /// must not be empty or longer than [MAX_COMMENT_LENGTH] characters.
    pub fn validate(&self) -> Result<ValidComment> {
        let text = self.text.as_deref().map(str::trim).unwrap_or_default();
        let (Some(location_id), false) = (self.location_id, text.is_empty()) else {
            return Err(Error::InvalidData(
                "Location and comment text required".to_string(),
            ));
        };
        if text.chars().count() > MAX_COMMENT_LENGTH {
            return Err(Error::InvalidData(format!(
                "Comment text must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }
        let rating = self.rating.unwrap_or(DEFAULT_RATING);
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidData(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(ValidComment {
            location_id,
            text: text.to_string(),
            rating,
        })
    }
}

#[async_trait]
impl Loadable for Comment {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = id
    }

    async fn load(id: Self::Id, db: &Database) -> Result<Self> {
        Self::build_query(Some(Filter::Id(id).into()))
            .build_query_as()
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }

    async fn delete_id(id: &Self::Id, db: &Database) -> Result<SqliteQueryResult> {
        sqlx::query("DELETE FROM vn_comments WHERE commentid=?")
            .bind(id)
            .execute(db.pool())
            .await
            .map_err(|e| e.into())
    }
}

impl Comment {
    fn build_query(filter: Option<DynFilterPart>) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(
            r#"SELECT C.commentid, C.locid, C.userid, U.username, C.commenttext, C.rating,
            C.createdat FROM vn_comments C
            INNER JOIN vn_users U ON U.userid=C.userid"#,
        );
        if let Some(f) = filter {
            qb.push(" WHERE ");
            f.add_to_query(&mut qb);
        }
        qb.push(" ORDER BY C.createdat DESC, C.commentid DESC");
        qb
    }

    /// Load the comments for a location, newest first
    pub async fn load_for_location(location_id: i64, db: &Database) -> Result<Vec<Comment>> {
        Self::build_query(Some(Filter::LocationId(location_id).into()))
            .build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Validate a new comment by `user` and store it in the database. Returns
    /// the stored comment. Fails with a not-found error if the location
    /// doesn't exist.
    pub async fn create(new: &NewComment, user: &User, db: &Database) -> Result<Comment> {
        let valid = new.validate()?;
        Location::load(valid.location_id, db).await?;
        let id = sqlx::query(
            "INSERT INTO vn_comments (locid, userid, commenttext, rating) VALUES (?, ?, ?, ?)",
        )
        .bind(valid.location_id)
        .bind(user.id)
        .bind(&valid.text)
        .bind(valid.rating)
        .execute(db.pool())
        .await?
        .last_insert_rowid();
        debug!(id, location = valid.location_id, user = user.id, "Added comment");
        Self::load(id, db).await
    }

    /// Delete a comment on behalf of `actor`. Only the author of the comment or
    /// an administrator may delete it.
    pub async fn delete_as(id: i64, actor: &User, db: &Database) -> Result<()> {
        let mut comment = Self::load(id, db).await?;
        policy::authorize(actor.id, comment.user_id, actor.role).check()?;
        comment.delete(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Role;
    use sqlx::{Pool, Sqlite};
    use test_log::test;

    fn new_comment(location_id: Option<i64>, text: Option<&str>, rating: Option<i64>) -> NewComment {
        NewComment {
            location_id,
            text: text.map(str::to_string),
            rating,
        }
    }

    #[test]
    fn test_validate() {
        let valid = new_comment(Some(1), Some("  Lovely hall  "), None)
            .validate()
            .expect("valid comment rejected");
        assert_eq!(valid.text, "Lovely hall");
        assert_eq!(valid.rating, DEFAULT_RATING);

        assert!(new_comment(None, Some("text"), None).validate().is_err());
        assert!(new_comment(Some(1), None, None).validate().is_err());
        assert!(new_comment(Some(1), Some("   "), None).validate().is_err());
        assert!(new_comment(Some(1), Some("ok"), Some(0)).validate().is_err());
        assert!(new_comment(Some(1), Some("ok"), Some(6)).validate().is_err());
        assert!(new_comment(Some(1), Some("ok"), Some(1)).validate().is_ok());

        // the limit counts characters, not bytes
        let max = "é".repeat(MAX_COMMENT_LENGTH);
        assert!(new_comment(Some(1), Some(&max), None).validate().is_ok());
        let too_long = "a".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(new_comment(Some(1), Some(&too_long), None).validate().is_err());
    }

    #[test(sqlx::test(
        migrations = "../db/migrations/",
        fixtures(path = "../../db/fixtures", scripts("users", "locations", "comments"))
    ))]
    async fn test_load_newest_first(pool: Pool<Sqlite>) {
        let db = Database::from(pool);
        let comments = Comment::load_for_location(1, &db).await.expect("load failed");
        assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1, 3]);
        assert_eq!(comments[0].username, "otheruser");
        assert_eq!(comments[1].text, "Great acoustics");

        let json = serde_json::to_value(&comments[1]).expect("serialize failed");
        assert_eq!(json["locationId"], 1);
        assert_eq!(json["createdAt"], "2024-03-01T10:00:00Z");

        let none = Comment::load_for_location(5, &db).await.expect("load failed");
        assert!(none.is_empty());
    }

    #[test(sqlx::test(
        migrations = "../db/migrations/",
        fixtures(path = "../../db/fixtures", scripts("users", "locations", "comments"))
    ))]
    async fn test_create(pool: Pool<Sqlite>) {
        let db = Database::from(pool);
        let user = User::load(1, &db).await.expect("load user failed");
        let comment = Comment::create(&new_comment(Some(1), Some("Wonderful"), Some(4)), &user, &db)
            .await
            .expect("create failed");
        assert_eq!(comment.id, 5);
        assert_eq!(comment.username, "testuser");
        assert_eq!(comment.rating, 4);

        // newly created comments come first
        let comments = Comment::load_for_location(1, &db).await.expect("load failed");
        assert_eq!(comments[0].id, 5);

        let err = Comment::create(&new_comment(Some(42), Some("Where?"), None), &user, &db)
            .await
            .expect_err("comment on missing location");
        assert!(err.is_not_found());
    }

    #[test(sqlx::test(
        migrations = "../db/migrations/",
        fixtures(path = "../../db/fixtures", scripts("users", "locations", "comments"))
    ))]
    async fn test_delete_permissions(pool: Pool<Sqlite>) {
        let db = Database::from(pool);
        let author = User::load(1, &db).await.expect("load user failed");
        let other = User::load(3, &db).await.expect("load user failed");
        let admin = User::load(2, &db).await.expect("load user failed");
        assert_eq!(admin.role, Role::Admin);

        assert!(matches!(
            Comment::delete_as(1, &other, &db).await,
            Err(Error::PermissionDenied)
        ));
        Comment::load(1, &db).await.expect("comment should still exist");

        Comment::delete_as(1, &author, &db).await.expect("author delete failed");
        assert!(Comment::load(1, &db).await.unwrap_err().is_not_found());

        Comment::delete_as(2, &admin, &db).await.expect("admin delete failed");
        assert!(
            Comment::delete_as(2, &admin, &db)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
