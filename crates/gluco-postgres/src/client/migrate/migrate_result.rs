use std::time::Duration;

/// Applied and pending migration versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Applied migration versions in chronological order
    pub applied_versions: Vec<String>,
    /// Embedded migration versions not yet applied
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

    /// Returns the next pending migration version, if any.
    pub fn next_pending_version(&self) -> Option<&str> {
        self.pending_versions.first().map(|s| s.as_str())
    }

    /// Returns the number of applied migrations.
    #[inline]
    pub fn applied_migrations(&self) -> usize {
        self.applied_versions.len()
    }

    /// Returns the number of pending migrations.
    #[inline]
    pub fn pending_migrations(&self) -> usize {
        self.pending_versions.len()
    }

    /// Returns true if all migrations have been applied.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Total duration of the run
    pub duration: Duration,
    /// Versions applied by this run
    pub processed_versions: Vec<String>,
}

impl MigrationResult {
    /// Creates a successful migration result.
    pub fn success(duration: Duration, processed_versions: Vec<String>) -> Self {
        Self {
            duration,
            processed_versions,
        }
    }

    /// Returns whether nothing had to be applied.
    pub fn is_no_op(&self) -> bool {
        self.processed_versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts() {
        let status = MigrationStatus::new(vec!["20250101000000".to_owned()], vec![]);
        assert!(status.is_up_to_date());
        assert_eq!(status.applied_migrations(), 1);
        assert_eq!(status.next_pending_version(), None);

        let pending = MigrationStatus::new(vec![], vec!["20250101000000".to_owned()]);
        assert!(!pending.is_up_to_date());
        assert_eq!(pending.next_pending_version(), Some("20250101000000"));
    }

    #[test]
    fn no_op_result() {
        assert!(MigrationResult::success(Duration::ZERO, vec![]).is_no_op());
        assert!(!MigrationResult::success(Duration::ZERO, vec!["1".to_owned()]).is_no_op());
    }
}
