//! Moderation warnings: append-only per member until an admin clears them.

use crate::{
    core::db_id,
    entities::{Warning, warning},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Records a warning.
pub async fn add_warning(
    db: &DatabaseConnection,
    guild_id: u64,
    user_id: u64,
    moderator_id: u64,
    reason: &str,
    at: DateTime<Utc>,
) -> Result<warning::Model> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::Config {
            message: "A warning needs a reason".to_string(),
        });
    }

    let model = warning::ActiveModel {
        guild_id: Set(db_id(guild_id)?),
        user_id: Set(db_id(user_id)?),
        moderator_id: Set(db_id(moderator_id)?),
        reason: Set(reason.to_string()),
        timestamp: Set(at),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Warnings for a member, oldest first.
pub async fn list_warnings(
    db: &DatabaseConnection,
    guild_id: u64,
    user_id: u64,
) -> Result<Vec<warning::Model>> {
    Warning::find()
        .filter(warning::Column::GuildId.eq(db_id(guild_id)?))
        .filter(warning::Column::UserId.eq(db_id(user_id)?))
        .order_by_asc(warning::Column::Timestamp)
        .order_by_asc(warning::Column::WarnId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes every warning for a member. Returns how many were removed.
pub async fn clear_warnings(db: &DatabaseConnection, guild_id: u64, user_id: u64) -> Result<u64> {
    let result = Warning::delete_many()
        .filter(warning::Column::GuildId.eq(db_id(guild_id)?))
        .filter(warning::Column::UserId.eq(db_id(user_id)?))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeDelta;

    const GUILD: u64 = 1;
    const MEMBER: u64 = 2;
    const MODERATOR: u64 = 3;

    #[tokio::test]
    async fn test_warnings_are_listed_in_order() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        add_warning(&db, GUILD, MEMBER, MODERATOR, "second", now).await?;
        add_warning(&db, GUILD, MEMBER, MODERATOR, "first", now - TimeDelta::hours(1)).await?;
        add_warning(&db, GUILD, MEMBER + 1, MODERATOR, "someone else", now).await?;

        let warnings = list_warnings(&db, GUILD, MEMBER).await?;
        let reasons: Vec<&str> = warnings.iter().map(|w| w.reason.as_str()).collect();
        assert_eq!(reasons, vec!["first", "second"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_only_affects_member() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        add_warning(&db, GUILD, MEMBER, MODERATOR, "a", now).await?;
        add_warning(&db, GUILD, MEMBER, MODERATOR, "b", now).await?;
        add_warning(&db, GUILD, MEMBER + 1, MODERATOR, "c", now).await?;

        assert_eq!(clear_warnings(&db, GUILD, MEMBER).await?, 2);
        assert!(list_warnings(&db, GUILD, MEMBER).await?.is_empty());
        assert_eq!(list_warnings(&db, GUILD, MEMBER + 1).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_warning_requires_reason() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_warning(&db, GUILD, MEMBER, MODERATOR, "   ", Utc::now()).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }
}
