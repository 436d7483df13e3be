/// 工具函数模块
///
/// 日志初始化与呼叫 ID 生成
use tracing::Level;
use uuid::Uuid;

/// 初始化日志
///
/// 无法识别的级别回退到 info；重复初始化时静默忽略
///
/// # 示例
/// ```rust,no_run
/// use call_provider::utils::initialize_logging;
///
/// initialize_logging("debug");
/// ```
pub fn initialize_logging(level: &str) {
    let level = parse_level(level).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn parse_level(level: &str) -> Option<Level> {
    level.trim().parse::<Level>().ok()
}

/// 生成新的呼叫 ID（UUID v4）
pub fn new_call_id() -> Uuid {
    Uuid::new_v4()
}

/// 解析外部传入的呼叫 ID
pub fn parse_call_id(value: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_new_call_id_uniqueness() {
        let mut ids = std::collections::HashSet::new();

        for _ in 0..1000 {
            ids.insert(new_call_id());
        }

        // 1000 个呼叫 ID 应该都是唯一的
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_parse_call_id() {
        let id = new_call_id();
        assert_eq!(parse_call_id(&format!(" {} ", id)).unwrap(), id);
        assert!(parse_call_id("A1").is_err());
    }
}
