use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Итог одного запуска синхронизации каталога mflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub session_id: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Сколько товаров вернул API
    pub fetched: i32,
    /// Сколько товаров просмотрено (не больше лимита пакета)
    pub processed: i32,

    pub created_simple: i32,
    pub created_variable: i32,
    pub updated: i32,
    /// Тип товара не Single и не Variable
    pub skipped_unknown_type: i32,
    /// Артикул уже занят вариацией, а не товаром
    pub skipped_variation_sku: i32,
    /// Сколько раз артикул пришлось переписать из-за коллизии
    pub sku_rewrites: i32,

    pub variations_created: i32,
    pub variations_skipped: i32,

    pub errors: i32,
    pub error_messages: Vec<ItemError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Синхронизация выполняется
    Running,
    /// Завершена без ошибок
    Completed,
    /// Завершена, но часть записей не сохранилась
    CompletedWithErrors,
}

/// Ошибка по отдельной записи. Пакет при этом продолжается.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemError {
    /// Артикул записи mflow (товара или вариации)
    pub sku: String,
    /// ID товара в mflow
    pub remote_id: String,
    pub message: String,
}

impl SyncReport {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            status: SyncStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            fetched: 0,
            processed: 0,
            created_simple: 0,
            created_variable: 0,
            updated: 0,
            skipped_unknown_type: 0,
            skipped_variation_sku: 0,
            sku_rewrites: 0,
            variations_created: 0,
            variations_skipped: 0,
            errors: 0,
            error_messages: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ItemError) {
        self.errors += 1;
        self.error_messages.push(error);
    }

    /// Всего созданных товаров (без вариаций)
    pub fn created(&self) -> i32 {
        self.created_simple + self.created_variable
    }

    /// Всего пропущенных товаров
    pub fn skipped(&self) -> i32 {
        self.skipped_unknown_type + self.skipped_variation_sku
    }

    pub fn complete(&mut self) {
        self.status = if self.errors > 0 {
            SyncStatus::CompletedWithErrors
        } else {
            SyncStatus::Completed
        };
        self.completed_at = Some(Utc::now());
    }
}
