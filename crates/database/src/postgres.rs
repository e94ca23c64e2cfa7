/// Schema carried by every persisted model. `init_tables!` replays each
/// model's DDL at startup; statements must therefore be idempotent
/// (`CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT EXISTS`).
pub trait PgModel {
    const TABLE_NAME: &'static str;
    const CREATE_TABLE_SQL: &'static str;
    const INDEXES_SQL: &'static [&'static str] = &[];
}

/// Postgres aborts one of two colliding serializable transactions with
/// 40001, and a lock cycle with 40P01. Both leave no partial state behind,
/// so the whole operation can be replayed.
pub fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some("40001") | Some("40P01")
        ),
        _ => false,
    }
}

/// Sets up the process-wide connection pool and ensures tables exist for
/// every registered model.
///
/// # Generated function
/// - `async fn connect(drop_tables: bool, create_tables: bool) -> &'static sqlx::PgPool`
///
/// # Example
/// ```rust,ignore
/// init_tables!([User, CreditAccount, Card]);
///
/// #[tokio::main]
/// async fn main() {
///     let pool = connect(false, true).await;
///     // ... use pool
/// }
/// ```
#[macro_export]
macro_rules! init_tables {
    ([$($model:ty),* $(,)?]) => {
        static POOL: tokio::sync::OnceCell<sqlx::PgPool> = tokio::sync::OnceCell::const_new();

        pub async fn connect(drop_tables: bool, create_tables: bool) -> &'static sqlx::PgPool {
            POOL.get_or_init(|| async {
                let database_url = std::env::var("DATABASE_URL")
                    .expect("DATABASE_URL environment variable not set");

                let pool = sqlx::PgPool::connect(&database_url).await
                    .expect("Failed to connect to database");

                if drop_tables {
                    $(
                        let drop_sql = format!(
                            "DROP TABLE IF EXISTS \"{}\" CASCADE;",
                            <$model as $crate::PgModel>::TABLE_NAME
                        );
                        sqlx::query(&drop_sql).execute(&pool).await
                            .unwrap_or_else(|e| {
                                tracing::warn!("Failed to drop table for '{}': {:?}", stringify!($model), e);
                                sqlx::postgres::PgQueryResult::default()
                            });
                    )*
                }

                if create_tables {
                    $(
                        sqlx::query(<$model as $crate::PgModel>::CREATE_TABLE_SQL)
                            .execute(&pool).await
                            .unwrap_or_else(|e| panic!(
                                "Failed to create table for '{}'. Error: {:?}",
                                stringify!($model), e
                            ));

                        for index_sql in <$model as $crate::PgModel>::INDEXES_SQL {
                            sqlx::query(index_sql).execute(&pool).await
                                .unwrap_or_else(|e| panic!(
                                    "Failed to create index for '{}'. SQL: {}. Error: {:?}",
                                    stringify!($model), index_sql, e
                                ));
                        }
                    )*
                }

                pool
            }).await
        }
    };
}
