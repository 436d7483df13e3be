/// 呼叫提供者配置
///
/// 启动时构造一次，随后传入控制器；不存在全局共享配置
use crate::error::ConfigError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9\-\s().]{1,31}$").expect("valid phone number regex"));

static EMAIL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// 远端号码类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleType {
    /// 电话号码，例如 555-0100 或 +86 10 1234 5678
    PhoneNumber,

    /// 邮箱地址
    EmailAddress,

    /// 任意非空字符串
    Generic,
}

impl HandleType {
    /// 判断号码是否符合该类型
    pub fn matches(&self, handle: &str) -> bool {
        match self {
            HandleType::PhoneNumber => PHONE_NUMBER.is_match(handle),
            HandleType::EmailAddress => EMAIL_ADDRESS.is_match(handle),
            HandleType::Generic => !handle.trim().is_empty(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandleType::PhoneNumber => "phoneNumber",
            HandleType::EmailAddress => "emailAddress",
            HandleType::Generic => "generic",
        }
    }
}

/// 提供者配置
#[derive(Debug, Clone)]
pub struct ProviderConfiguration {
    /// 在系统通话界面展示的名称
    pub localized_name: String,

    /// 是否支持视频通话
    pub supports_video: bool,

    /// 每个通话组的最大呼叫数
    ///
    /// 仅作为描述信息携带与校验，控制器不据此限制呼叫数量
    pub maximum_calls_per_call_group: usize,

    /// 支持的号码类型，默认仅作为描述信息
    pub supported_handle_types: Vec<HandleType>,

    /// 为 true 时拒绝不匹配 `supported_handle_types` 的来电与外呼，默认关闭
    pub enforce_handle_types: bool,
}

impl ProviderConfiguration {
    /// 创建新的提供者配置
    ///
    /// 默认支持视频、每组一路呼叫、号码类型为电话号码且不强制校验
    pub fn new(localized_name: impl Into<String>) -> Self {
        Self {
            localized_name: localized_name.into(),
            supports_video: true,
            maximum_calls_per_call_group: 1,
            supported_handle_types: vec![HandleType::PhoneNumber],
            enforce_handle_types: false,
        }
    }

    /// 设置是否支持视频
    pub fn with_video(mut self, supports_video: bool) -> Self {
        self.supports_video = supports_video;
        self
    }

    /// 设置每组最大呼叫数
    pub fn with_maximum_calls_per_call_group(mut self, maximum: usize) -> Self {
        self.maximum_calls_per_call_group = maximum;
        self
    }

    /// 设置支持的号码类型
    pub fn with_handle_types(mut self, handle_types: Vec<HandleType>) -> Self {
        self.supported_handle_types = handle_types;
        self
    }

    /// 设置是否按号码类型拒绝呼叫
    pub fn with_handle_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_handle_types = enforce;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.localized_name.trim().is_empty() {
            return Err(ConfigError::Missing("localized_name".into()));
        }
        if self.maximum_calls_per_call_group == 0 {
            return Err("maximum_calls_per_call_group must be at least 1".into());
        }
        if self.supported_handle_types.is_empty() {
            return Err(ConfigError::Missing("supported_handle_types".into()));
        }
        Ok(())
    }

    /// 号码是否被接受
    ///
    /// 未开启强制校验时接受任意号码
    pub fn accepts_handle(&self, handle: &str) -> bool {
        !self.enforce_handle_types || self.matches_handle_type(handle)
    }

    /// 号码是否匹配任一支持的类型
    pub fn matches_handle_type(&self, handle: &str) -> bool {
        self.supported_handle_types
            .iter()
            .any(|handle_type| handle_type.matches(handle))
    }
}

impl Default for ProviderConfiguration {
    fn default() -> Self {
        Self::new("Hotline")
    }
}

impl fmt::Display for ProviderConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handle_types: Vec<&str> = self
            .supported_handle_types
            .iter()
            .map(HandleType::as_str)
            .collect();
        write!(
            f,
            "{} (video: {}, maxCallsPerGroup: {}, handleTypes: [{}])",
            self.localized_name,
            self.supports_video,
            self.maximum_calls_per_call_group,
            handle_types.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_handles() {
        assert!(HandleType::PhoneNumber.matches("555-0100"));
        assert!(HandleType::PhoneNumber.matches("+86 10 1234 5678"));
        assert!(!HandleType::PhoneNumber.matches("alice@example.com"));
        assert!(!HandleType::PhoneNumber.matches(""));
    }

    #[test]
    fn test_any_handle_accepted_by_default() {
        let config = ProviderConfiguration::default();

        for handle in ["alice", "7", "*67 5550200", "Bob", "555-0100"] {
            assert!(config.accepts_handle(handle), "{} should be accepted", handle);
        }
        assert!(!config.matches_handle_type("alice"));
    }

    #[test]
    fn test_accepts_handle_uses_any_type() {
        let config = ProviderConfiguration::default()
            .with_handle_types(vec![HandleType::PhoneNumber, HandleType::EmailAddress])
            .with_handle_enforcement(true);

        assert!(config.accepts_handle("555-0200"));
        assert!(config.accepts_handle("bob@example.com"));
        assert!(!config.accepts_handle("not a handle"));
    }

    #[test]
    fn test_validate() {
        assert!(ProviderConfiguration::default().validate().is_ok());
        assert!(ProviderConfiguration::new("  ").validate().is_err());
        assert!(ProviderConfiguration::default()
            .with_maximum_calls_per_call_group(0)
            .validate()
            .is_err());
        assert!(ProviderConfiguration::default()
            .with_handle_types(Vec::new())
            .validate()
            .is_err());
    }

    #[test]
    fn test_display() {
        let description = ProviderConfiguration::default().to_string();
        assert_eq!(
            description,
            "Hotline (video: true, maxCallsPerGroup: 1, handleTypes: [phoneNumber])"
        );
    }
}
