use async_trait::async_trait;
use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::shared::config::{MflowConfig, Secret};

const PRODUCTS_PATH: &str = "/api/v1/products/listAll";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Ошибка получения каталога. Для запуска синхронизации фатальна.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Повторять имеет смысл сетевые сбои, 5xx и 429
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Decode(_) => false,
        }
    }
}

/// Источник удалённого каталога товаров
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Записи каталога в порядке ответа, включая неразобранные
    async fn fetch_products(&self) -> Result<Vec<CatalogEntry>, FetchError>;
}

/// HTTP-клиент для API mflow ERP
pub struct MflowApiClient {
    client: reqwest::Client,
    base_url: String,
    public_key: Secret,
    secret_key: Secret,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl MflowApiClient {
    pub fn new(config: &MflowConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .no_proxy()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            public_key: config.public_key.clone(),
            secret_key: config.secret_key.clone(),
            retry_attempts: config.retry_attempts,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn products_url(&self) -> String {
        format!("{}{}", self.base_url, PRODUCTS_PATH)
    }

    /// Один запрос без повторов
    async fn fetch_once(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        let url = self.products_url();
        tracing::info!(
            "mflow API: GET {} (public_key={}, secret_key={})",
            url,
            self.public_key,
            self.secret_key
        );

        let response = self
            .client
            .get(&url)
            .header("x-mflow-public-key", self.public_key.expose())
            .header("x-mflow-secret-key", self.secret_key.expose())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        tracing::info!("mflow API response: {} for {}", status, url);

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("reading body of {}: {}", url, e)))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let entries = parse_products_body(&body)?;
        tracing::info!("mflow API: got {} products", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl CatalogSource for MflowApiClient {
    async fn fetch_products(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        let mut attempt = 0;
        let mut delay = self.retry_backoff;
        loop {
            match self.fetch_once().await {
                Ok(products) => return Ok(products),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        "mflow API request failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.retry_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Разобрать тело ответа /products/listAll.
/// Отсутствующий, null или пустой `products` даёт пустой список.
/// Каждый товар разбирается отдельно: неразборчивая запись становится
/// `CatalogEntry::Invalid` и не мешает остальным.
pub fn parse_products_body(body: &str) -> Result<Vec<CatalogEntry>, FetchError> {
    let response: MflowProductsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let entries = response
        .products
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let sku = field_as_string(&raw, "sku");
            let id = field_as_string(&raw, "id");
            match serde_json::from_value::<MflowProduct>(raw) {
                Ok(product) => CatalogEntry::Product(product),
                Err(e) => {
                    tracing::warn!("mflow catalog entry #{} ('{}') skipped: {}", index, sku, e);
                    CatalogEntry::Invalid(InvalidEntry {
                        index,
                        sku,
                        id,
                        error: e.to_string(),
                    })
                }
            }
        })
        .collect();
    Ok(entries)
}

fn field_as_string(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Ответ от API /api/v1/products/listAll
#[derive(Debug, Clone, Deserialize)]
pub struct MflowProductsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Value>,
}

/// Элемент каталога в порядке ответа API
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    Product(MflowProduct),
    Invalid(InvalidEntry),
}

/// Запись каталога, которую не удалось разобрать как товар
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    /// Позиция в массиве `products`
    pub index: usize,
    pub sku: String,
    pub id: String,
    pub error: String,
}

/// Товар из каталога mflow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MflowProduct {
    /// ID товара в mflow
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Артикул, по нему идёт сопоставление с магазином
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Цена (десятичная строка)
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub stock_quantity: Option<i64>,
    #[serde(rename = "type", default, deserialize_with = "lenient_product_type")]
    pub product_type: MflowProductType,
    /// Есть только у вариативных товаров
    #[serde(default, deserialize_with = "null_as_default")]
    pub variations: Vec<MflowVariation>,
}

/// Тип товара mflow. Сравнение точное, с учётом регистра.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MflowProductType {
    Single,
    Variable,
    #[default]
    Unknown,
}

impl MflowProductType {
    pub fn from_remote(value: &str) -> Self {
        match value {
            "Single" => Self::Single,
            "Variable" => Self::Variable,
            _ => Self::Unknown,
        }
    }
}

/// Вариация товара mflow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MflowVariation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: String,
    /// Значение атрибута "color"
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub manage_stock: bool,
    #[serde(default, deserialize_with = "lenient_int")]
    pub stock_quantity: Option<i64>,
}

// Поля ниже никогда не валят разбор товара: странное значение
// превращается в пустое с предупреждением в логе.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            tracing::warn!("mflow: expected string or number, got {}; using empty value", other);
            String::new()
        }
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Null => None,
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_int)),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => {
            let parsed = s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().and_then(float_to_int));
            if parsed.is_none() {
                tracing::warn!("mflow: invalid integer '{}', treated as missing", s);
            }
            parsed
        }
        other => {
            tracing::warn!("mflow: expected integer, got {}; treated as missing", other);
            None
        }
    }))
}

/// Дробная часть отбрасывается, как у чисел в JSON
fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "y" => true,
            "" | "0" | "false" | "no" | "off" | "n" => false,
            other => {
                tracing::warn!("mflow: invalid boolean '{}', treated as false", other);
                false
            }
        },
        Some(other) => {
            tracing::warn!("mflow: expected boolean, got {}; treated as false", other);
            false
        }
    })
}

fn lenient_product_type<'de, D>(deserializer: D) -> Result<MflowProductType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => MflowProductType::from_remote(&s),
        _ => MflowProductType::Unknown,
    })
}
