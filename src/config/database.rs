//! Database configuration module.
//!
//! Both storage backends go through one `SeaORM` `DatabaseConnection`: an `sqlite://` URL gives
//! the embedded single-file store, a `postgres://` URL the networked one. Tables are generated
//! from the entity definitions with `Schema::create_table_from_entity`, so the schema always
//! matches the Rust structs, and are created with `IF NOT EXISTS` so startup is idempotent.

use crate::entities::{
    CommandAlias, GuildSettings, LoggingSettings, TicketSettings, User, Warning,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::TableCreateStatement,
};

/// Opens a connection pool for `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    tracing::info!("Connected to {:?} database", db.get_database_backend());
    Ok(db)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Creates all six tables if they do not exist yet.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = [
        table_for(&schema, User),
        table_for(&schema, TicketSettings),
        table_for(&schema, GuildSettings),
        table_for(&schema, LoggingSettings),
        table_for(&schema, Warning),
        table_for(&schema, CommandAlias),
    ];

    for statement in &statements {
        db.execute(builder.build(statement)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Every table is queryable
        User::find().limit(1).all(&db).await?;
        TicketSettings::find().limit(1).all(&db).await?;
        GuildSettings::find().limit(1).all(&db).await?;
        LoggingSettings::find().limit(1).all(&db).await?;
        Warning::find().limit(1).all(&db).await?;
        CommandAlias::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
