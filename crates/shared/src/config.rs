//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Period closure configuration.
    #[serde(default)]
    pub closure: ClosureConfig,
}

/// Period closure configuration.
///
/// The trial-balance tolerance and the account-code conventions come from the
/// municipal chart of accounts and are deliberately tunable rather than
/// hard-coded.
#[derive(Debug, Clone, Deserialize)]
pub struct ClosureConfig {
    /// Maximum absolute debit/credit difference tolerated by the trial
    /// balance check.
    #[serde(default = "default_trial_balance_tolerance")]
    pub trial_balance_tolerance: Decimal,
    /// Account-code prefix identifying income accounts.
    #[serde(default = "default_income_prefix")]
    pub income_prefix: String,
    /// Account-code prefix identifying expense accounts.
    #[serde(default = "default_expense_prefix")]
    pub expense_prefix: String,
    /// Summary account debited when closing aggregate income.
    #[serde(default = "default_income_summary_account")]
    pub income_summary_account: String,
    /// Summary account credited when closing aggregate expense.
    #[serde(default = "default_expense_summary_account")]
    pub expense_summary_account: String,
    /// Equity account receiving the period result.
    #[serde(default = "default_result_account")]
    pub result_account: String,
}

fn default_trial_balance_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_income_prefix() -> String {
    "4".to_string()
}

fn default_expense_prefix() -> String {
    "5".to_string()
}

fn default_income_summary_account() -> String {
    "4999".to_string()
}

fn default_expense_summary_account() -> String {
    "5999".to_string()
}

fn default_result_account() -> String {
    "3999".to_string()
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            trial_balance_tolerance: default_trial_balance_tolerance(),
            income_prefix: default_income_prefix(),
            expense_prefix: default_expense_prefix(),
            income_summary_account: default_income_summary_account(),
            expense_summary_account: default_expense_summary_account(),
            result_account: default_result_account(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TESORIA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
