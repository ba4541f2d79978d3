use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{BranchCredentials, BranchDescriptor, Category};
use crate::error::{BranchwatchError, Result};
use crate::services::registry::BranchRegistry;

/// Branch registry read from the central directory database
#[derive(Clone)]
pub struct PostgresBranchRegistry {
    pool: PgPool,
    allowed: Vec<Category>,
}

impl PostgresBranchRegistry {
    /// Connect to the directory database
    pub async fn new(database_url: &str, max_connections: u32, allowed: Vec<Category>) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;

        info!("Branch directory pool configured");
        Ok(Self { pool, allowed })
    }

    /// Create a registry from an existing connection pool
    pub fn from_pool(pool: PgPool, allowed: Vec<Category>) -> Self {
        Self { pool, allowed }
    }

    fn admits(&self, category: Category, wanted: Option<Category>) -> bool {
        self.allowed.contains(&category) && wanted.map_or(true, |w| w == category)
    }

    /// Parse raw rows. A row that cannot be decoded or admitted is skipped on
    /// its own and never fails the listing.
    fn collect(&self, rows: &[PgRow], wanted: Option<Category>) -> Vec<BranchDescriptor> {
        rows.iter()
            .filter_map(|row| match DirectoryRow::read(row) {
                Ok(raw) => raw.into_descriptor(),
                Err(e) => {
                    warn!("Skipping unreadable directory row: {}", e);
                    None
                }
            })
            .filter(|b| self.admits(b.category, wanted))
            .collect()
    }
}

// Category tags are matched after parsing so aliases in the directory are
// recognized.
const LIST_BRANCHES_QUERY: &str = r#"
    SELECT id, name, host, port, database_name, username, password, category
    FROM branches
    WHERE active
    ORDER BY id
"#;

const FIND_BRANCH_QUERY: &str = r#"
    SELECT id, name, host, port, database_name, username, password, category
    FROM branches
    WHERE active AND id = $1
"#;

/// One `branches` row as stored; every column may be missing
#[derive(Debug, Clone, Default)]
struct DirectoryRow {
    id: Option<String>,
    name: Option<String>,
    host: Option<String>,
    port: Option<i32>,
    database_name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    category: Option<String>,
}

impl DirectoryRow {
    fn read(row: &PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            host: row.try_get("host")?,
            port: row.try_get("port")?,
            database_name: row.try_get("database_name")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            category: row.try_get("category")?,
        })
    }

    /// `None` only when the row has no id or no recognizable category.
    /// Missing connection fields are kept blank so the descriptor is flagged
    /// as incomplete when the branch is visited.
    fn into_descriptor(self) -> Option<BranchDescriptor> {
        let id = match self.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                warn!("Skipping directory row without an id");
                return None;
            }
        };

        let tag = self.category.unwrap_or_default();
        let category = match tag.parse::<Category>() {
            Ok(category) => category,
            Err(_) => {
                debug!(branch = %id, tag = %tag, "Skipping branch with unknown category tag");
                return None;
            }
        };

        Some(BranchDescriptor {
            name: self.name.unwrap_or_else(|| id.clone()),
            host: self.host.unwrap_or_default(),
            port: self
                .port
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(0),
            database: self.database_name.unwrap_or_default(),
            credentials: BranchCredentials::new(
                self.username.unwrap_or_default(),
                self.password.unwrap_or_default(),
            ),
            category,
            id,
        })
    }
}

#[async_trait]
impl BranchRegistry for PostgresBranchRegistry {
    async fn list_branches(&self, category: Option<Category>) -> Result<Vec<BranchDescriptor>> {
        let rows = sqlx::query(LIST_BRANCHES_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BranchwatchError::RegistryUnavailable(e.to_string()))?;

        let branches = self.collect(&rows, category);
        debug!(rows = rows.len(), count = branches.len(), "Listed branches from directory");
        Ok(branches)
    }

    async fn find_branch(&self, id: &str) -> Result<Option<BranchDescriptor>> {
        let rows = sqlx::query(FIND_BRANCH_QUERY)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BranchwatchError::RegistryUnavailable(e.to_string()))?;

        Ok(self.collect(&rows, None).into_iter().next())
    }
}
