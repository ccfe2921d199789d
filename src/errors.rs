use std::fmt;

#[derive(Debug, Clone)]
pub enum GeodiscountError {
    CacheConnection(String),
    CachePluginNotFound(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    StoragePluginNotFound(String),
}

impl GeodiscountError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeodiscountError::CacheConnection(_) => "E001",
            GeodiscountError::CachePluginNotFound(_) => "E002",
            GeodiscountError::DatabaseConfig(_) => "E003",
            GeodiscountError::DatabaseConnection(_) => "E004",
            GeodiscountError::DatabaseOperation(_) => "E005",
            GeodiscountError::Validation(_) => "E006",
            GeodiscountError::NotFound(_) => "E007",
            GeodiscountError::StoragePluginNotFound(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeodiscountError::CacheConnection(_) => "Cache Connection Error",
            GeodiscountError::CachePluginNotFound(_) => "Cache Plugin Not Found",
            GeodiscountError::DatabaseConfig(_) => "Database Configuration Error",
            GeodiscountError::DatabaseConnection(_) => "Database Connection Error",
            GeodiscountError::DatabaseOperation(_) => "Database Operation Error",
            GeodiscountError::Validation(_) => "Validation Error",
            GeodiscountError::NotFound(_) => "Resource Not Found",
            GeodiscountError::StoragePluginNotFound(_) => "Storage Plugin Not Found",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeodiscountError::CacheConnection(msg) => msg,
            GeodiscountError::CachePluginNotFound(msg) => msg,
            GeodiscountError::DatabaseConfig(msg) => msg,
            GeodiscountError::DatabaseConnection(msg) => msg,
            GeodiscountError::DatabaseOperation(msg) => msg,
            GeodiscountError::Validation(msg) => msg,
            GeodiscountError::NotFound(msg) => msg,
            GeodiscountError::StoragePluginNotFound(msg) => msg,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeodiscountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeodiscountError {}

// 便捷的构造函数
impl GeodiscountError {
    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::CacheConnection(msg.into())
    }

    pub fn cache_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::CachePluginNotFound(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::NotFound(msg.into())
    }

    pub fn storage_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        GeodiscountError::StoragePluginNotFound(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GeodiscountError {
    fn from(err: sea_orm::DbErr) -> Self {
        GeodiscountError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GeodiscountError {
    fn from(err: std::io::Error) -> Self {
        GeodiscountError::DatabaseConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeodiscountError>;
