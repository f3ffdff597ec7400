use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::auth::Credentials;
use crate::clients::VeracodeEndpoints;
use crate::errors::ConfigError;

pub const DEFAULT_LIST_BUILDS_URL: &str =
    "https://analysiscenter.veracode.com/api/5.0/getbuildlist.do";
pub const DEFAULT_SUMMARY_REPORT_URL: &str =
    "https://analysiscenter.veracode.com/api/4.0/summaryreport.do";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Veracode API 配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct VeracodeConfig {
    pub list_builds_url: String,
    pub summary_report_url: String,
    /// 请求超时（秒）
    pub timeout: u64,
    pub user_agent: String,
    /// 仅供命令行使用；HTTP 门面从请求头获取凭据
    pub api_user: Option<String>,
    pub api_password: Option<String>,
}

impl Default for VeracodeConfig {
    fn default() -> Self {
        Self {
            list_builds_url: DEFAULT_LIST_BUILDS_URL.to_string(),
            summary_report_url: DEFAULT_SUMMARY_REPORT_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECONDS,
            user_agent: concat!("veracode-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
            api_user: None,
            api_password: None,
        }
    }
}

impl VeracodeConfig {
    /// 从环境变量合并配置，环境变量优先
    pub fn merge_with_env(mut self, env_map: &HashMap<String, String>) -> Self {
        if let Some(user) = env_map.get("VERACODE_API_USER") {
            self.api_user = Some(user.clone());
        }
        if let Some(password) = env_map.get("VERACODE_API_PASSWORD") {
            self.api_password = Some(password.clone());
        }
        if let Some(url) = env_map.get("VERACODE_LIST_BUILDS_URL") {
            self.list_builds_url = url.clone();
        }
        if let Some(url) = env_map.get("VERACODE_SUMMARY_REPORT_URL") {
            self.summary_report_url = url.clone();
        }
        if let Some(timeout) = env_map
            .get("VERACODE_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.timeout = timeout;
        }
        self
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.list_builds_url, &self.summary_report_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.timeout == 0 {
            return Err(ConfigError::FieldMissing("veracode.timeout".to_string()));
        }
        Ok(())
    }

    pub fn endpoints(&self) -> VeracodeEndpoints {
        VeracodeEndpoints {
            list_builds: self.list_builds_url.clone(),
            summary_report: self.summary_report_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Connection pool carrying the configured user agent.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| {
                ConfigError::Other(format!(
                    "Cannot build HTTP client with user agent {:?}: {}",
                    self.user_agent, e
                ))
            })
    }

    /// Credentials for command-line use.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let user = self
            .api_user
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::FieldMissing("VERACODE_API_USER".to_string()))?;
        let password = self
            .api_password
            .as_deref()
            .ok_or_else(|| ConfigError::FieldMissing("VERACODE_API_PASSWORD".to_string()))?;
        Ok(Credentials::new(user, password))
    }
}
