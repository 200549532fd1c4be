//! Policy configuration loading.
//!
//! This module provides the [`PolicyLoader`] type for loading leave
//! policies from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};

use super::types::{GrantTable, LeavePolicy, PolicyFile};

/// Loads and provides access to the leave policy.
///
/// The `PolicyLoader` reads YAML configuration files from a directory
/// and builds the [`LeavePolicy`] the ledger operates under.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/art39/
/// ├── policy.yaml       # metadata, fiscal calendar, caps, thresholds
/// └── grant_table.yaml  # seniority step table
/// ```
///
/// # Example
///
/// ```no_run
/// use leave_ledger::config::PolicyLoader;
///
/// let loader = PolicyLoader::load("./config/art39").unwrap();
/// let policy = loader.policy();
/// println!("Policy: {}", policy.metadata().name);
/// ```
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    policy: LeavePolicy,
}

impl PolicyLoader {
    /// Loads the policy from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/art39")
    ///
    /// # Returns
    ///
    /// Returns a `PolicyLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    /// - The grant table has no steps (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();

        let policy_path = path.join("policy.yaml");
        let policy_file = Self::load_yaml::<PolicyFile>(&policy_path)?;

        if !(1..=12).contains(&policy_file.fiscal.start_month) {
            return Err(LedgerError::ConfigParseError {
                path: policy_path.display().to_string(),
                message: format!(
                    "fiscal start_month must be 1-12, got {}",
                    policy_file.fiscal.start_month
                ),
            });
        }

        let table_path = path.join("grant_table.yaml");
        let grant_table = Self::load_yaml::<GrantTable>(&table_path)?;

        if grant_table.steps.is_empty() {
            return Err(LedgerError::ConfigParseError {
                path: table_path.display().to_string(),
                message: "grant table has no steps".to_string(),
            });
        }

        Ok(Self {
            policy: LeavePolicy::new(policy_file, grant_table),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> LedgerResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| LedgerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| LedgerError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded policy.
    pub fn policy(&self) -> &LeavePolicy {
        &self.policy
    }

    /// Consumes the loader and returns the policy.
    pub fn into_policy(self) -> LeavePolicy {
        self.policy
    }
}
