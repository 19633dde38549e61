use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub shop: ShopConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Which record store implementation backs the service.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Firebase,
    File,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown store backend: {other}")),
        }
    }
}

/// Connection settings for the hosted key-path database.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub project_id: String,
    /// Database secret or ID token sent as the `auth` query parameter.
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: String::new(),
            project_id: String::new(),
            auth_token: String::new(),
            data_file: default_data_file(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    #[serde(default = "default_order_phone")]
    pub order_phone: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self { order_phone: default_order_phone() }
    }
}

fn default_data_file() -> String { "data/store.json".to_string() }
fn default_connect_timeout() -> u64 { 10 }
fn default_order_phone() -> String { "+963992984704".to_string() }

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content).map_err(|e| anyhow!("配置文件 {path} 无效: {e}"))
}

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to environment-only
    /// configuration when the file is missing, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = Self::load_or_env(&config_path())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Read `path`; only a missing file falls back to [`AppConfig::from_env`].
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_env(path: &str) -> Result<Self> {
        match load_from_file(path) {
            Ok(cfg) => Ok(cfg),
            Err(e) if is_missing_file(&e) => Ok(Self::from_env()),
            Err(e) => Err(e),
        }
    }

    /// Defaults overlaid with the environment; used when no config file exists.
    pub fn from_env() -> Self {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(backend) = std::env::var("STORE_BACKEND").ok().and_then(|b| b.parse().ok()) {
            cfg.store.backend = backend;
        }
        if let Ok(file) = std::env::var("STORE_DATA_FILE") {
            cfg.store.data_file = file;
        }
        if let Ok(phone) = std::env::var("SHOP_ORDER_PHONE") {
            cfg.shop.order_phone = phone;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 存储连接信息允许由环境变量补齐
        self.store.normalize_from_env();
        self.store.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        fill_from_env(&mut self.database_url, "FIREBASE_DATABASE_URL");
        fill_from_env(&mut self.project_id, "FIREBASE_PROJECT_ID");
        fill_from_env(&mut self.auth_token, "FIREBASE_AUTH_TOKEN");
        self.derive_database_url();
    }

    /// Derive the default Realtime Database URL from the project id when none was given.
    fn derive_database_url(&mut self) {
        if self.database_url.trim().is_empty() && !self.project_id.trim().is_empty() {
            self.database_url = format!("https://{}-default-rtdb.firebaseio.com", self.project_id.trim());
        }
        self.database_url = self.database_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("store.connect_timeout_secs 必须为正整数秒"));
        }
        match self.backend {
            StoreBackend::Firebase => {
                if self.database_url.is_empty() {
                    return Err(anyhow!(
                        "store.database_url 为空；请在 config.toml 或环境变量 FIREBASE_DATABASE_URL / FIREBASE_PROJECT_ID 中提供"
                    ));
                }
                if !self.database_url.to_lowercase().starts_with("https://") {
                    return Err(anyhow!("store.database_url 必须以 https:// 开头"));
                }
            }
            StoreBackend::File => {
                if self.data_file.trim().is_empty() {
                    return Err(anyhow!("store.data_file 不能为空"));
                }
            }
            StoreBackend::Memory => {}
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        fill_from_env(&mut self.jwt_secret, "JWT_SECRET");
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret 为空；请在 config.toml 或环境变量 JWT_SECRET 中提供"));
        }
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

fn fill_from_env(field: &mut String, key: &str) {
    if field.trim().is_empty() {
        if let Ok(v) = std::env::var(key) {
            *field = v;
        }
    }
}
