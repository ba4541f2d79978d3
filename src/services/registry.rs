//! Branch directory abstraction shared by the financial fan-out and the
//! health probe.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::{BranchDescriptor, Category};
use crate::error::Result;

/// Read-only list of branches, optionally filtered by category
#[async_trait]
pub trait BranchRegistry: Send + Sync {
    /// Branches in registry order. Only allow-listed categories are returned.
    async fn list_branches(&self, category: Option<Category>) -> Result<Vec<BranchDescriptor>>;

    /// Look a single branch up by id
    async fn find_branch(&self, id: &str) -> Result<Option<BranchDescriptor>> {
        Ok(self
            .list_branches(None)
            .await?
            .into_iter()
            .find(|b| b.id == id))
    }
}

/// Registry backed by the `[[branches]]` section of the config
#[derive(Debug, Clone)]
pub struct StaticBranchRegistry {
    branches: Vec<BranchDescriptor>,
}

impl StaticBranchRegistry {
    pub fn new(branches: Vec<BranchDescriptor>, allowed: &[Category]) -> Self {
        let allowed: HashSet<Category> = allowed.iter().copied().collect();
        Self {
            branches: branches
                .into_iter()
                .filter(|b| allowed.contains(&b.category))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

#[async_trait]
impl BranchRegistry for StaticBranchRegistry {
    async fn list_branches(&self, category: Option<Category>) -> Result<Vec<BranchDescriptor>> {
        Ok(self
            .branches
            .iter()
            .filter(|b| category.map_or(true, |c| b.category == c))
            .cloned()
            .collect())
    }
}
