use std::time::Duration;

/// Applied and pending migration versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Applied migration versions in ascending order.
    pub applied_versions: Vec<String>,
    /// Embedded migration versions not yet applied, in ascending order.
    pub pending_versions: Vec<String>,
}

impl MigrationStatus {
    /// Creates a new migration status.
    pub fn new(
        applied_versions: impl Into<Vec<String>>,
        pending_versions: impl Into<Vec<String>>,
    ) -> Self {
        Self {
            applied_versions: applied_versions.into(),
            pending_versions: pending_versions.into(),
        }
    }

    /// Returns the last applied migration version, if any.
    pub fn last_applied_version(&self) -> Option<&str> {
        self.applied_versions.last().map(String::as_str)
    }

    /// Returns the number of pending migrations.
    #[inline]
    pub fn pending_migrations(&self) -> usize {
        self.pending_versions.len()
    }

    /// Returns true if all embedded migrations have been applied.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Outcome of a [`run_pending_migrations`](super::run_pending_migrations) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Versions applied during this run.
    pub processed_versions: Vec<String>,
}

impl MigrationResult {
    /// Creates a migration result.
    pub fn new(duration: Duration, processed_versions: Vec<String>) -> Self {
        Self {
            duration,
            processed_versions,
        }
    }

    /// Returns whether the run had nothing to apply.
    #[inline]
    pub fn is_no_op(&self) -> bool {
        self.processed_versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_status() {
        let status = MigrationStatus::new(
            vec!["20250115000000".to_owned()],
            vec!["20250201000000".to_owned()],
        );

        assert!(!status.is_up_to_date());
        assert_eq!(status.pending_migrations(), 1);
        assert_eq!(status.last_applied_version(), Some("20250115000000"));
        assert!(MigrationStatus::default().is_up_to_date());
    }

    #[test]
    fn test_migration_result_no_op() {
        let result = MigrationResult::new(Duration::from_millis(12), vec![]);
        assert!(result.is_no_op());
    }
}
