use serde::{de::Deserializer, Deserialize, Serialize};
use std::{fmt, path::PathBuf};

const DATA_DIR_NAME: &str = "loan-ledger";

/// User preferences for the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub overpayment_policy: OverpaymentPolicy,
    #[serde(default = "Config::default_reset_dismissed")]
    pub reset_dismissed_on_session_start: bool,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for loan data. Defaults to `<data dir>/loan-ledger`.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overpayment_policy: OverpaymentPolicy::default(),
            reset_dismissed_on_session_start: Self::default_reset_dismissed(),
            backup_retention: Self::default_backup_retention(),
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_reset_dismissed() -> bool {
        true
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DATA_DIR_NAME)
    }
}

/// What happens when a payment pushes received money past the sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverpaymentPolicy {
    /// Accept the payment and surface a warning.
    Warn,
    /// Refuse the payment.
    Reject,
}

impl OverpaymentPolicy {
    fn from_value(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some(raw) if raw.eq_ignore_ascii_case("reject") => OverpaymentPolicy::Reject,
            _ => OverpaymentPolicy::Warn,
        }
    }
}

impl Default for OverpaymentPolicy {
    fn default() -> Self {
        OverpaymentPolicy::Warn
    }
}

impl fmt::Display for OverpaymentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverpaymentPolicy::Warn => "warn",
            OverpaymentPolicy::Reject => "reject",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for OverpaymentPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(OverpaymentPolicy::from_value(value))
    }
}
