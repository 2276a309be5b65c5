use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectionTrait, EntityTrait, Schema};

use crate::error::DbError;
use crate::lifecycle::BackendCore;

/// A schema shape that can be applied to an opened backend.
///
/// Every sea-orm entity is a `Model` through the blanket impl below;
/// hand-rolled descriptors only need to produce a create-table statement
/// for the dialect carried by the `Schema`.
pub trait Model: Send + Sync {
    /// Identifier used in logs and migration errors, normally the table
    /// name.
    fn descriptor(&self) -> String;

    /// The create-table statement for this model under the given dialect.
    fn create_statement(&self, schema: &Schema) -> TableCreateStatement;
}

impl<E> Model for E
where
    E: EntityTrait + Copy + Send + Sync,
{
    fn descriptor(&self) -> String {
        self.table_name().to_string()
    }

    fn create_statement(&self, schema: &Schema) -> TableCreateStatement {
        schema.create_table_from_entity(*self)
    }
}

/// Apply each model's schema in the order given.
///
/// Models are not reordered or deduplicated; creation uses IF NOT EXISTS,
/// so re-running against an already-migrated backend changes nothing.
/// Forward foreign-key references are accepted by the supported engines at
/// creation time, so the caller's order only matters where the engine
/// itself enforces one.
pub(crate) async fn run_migrations(
    core: &BackendCore,
    models: &[&dyn Model],
) -> Result<(), DbError> {
    let conn = core.connection().ok_or(DbError::NotInitialized {
        operation: "migrate",
    })?;
    let builder = conn.get_database_backend();
    let schema = Schema::new(builder);
    let logger = core.logger();

    for model in models {
        let mut statement = model.create_statement(&schema);
        statement.if_not_exists();
        conn.execute(builder.build(&statement))
            .await
            .map_err(|e| DbError::MigrationFailed {
                model: model.descriptor(),
                source: e,
            })?;
        logger.info("applied model schema", &model.descriptor());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_migrations;
    use crate::error::DbError;
    use crate::lifecycle::BackendCore;

    #[tokio::test]
    async fn migrate_before_init_is_an_error() {
        let core = BackendCore::new();
        let err = run_migrations(&core, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::NotInitialized {
                operation: "migrate"
            }
        ));
    }
}
