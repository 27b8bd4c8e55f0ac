use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KvEntryRow {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}

impl KvEntryRow {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.updated_at)
            .single()
            .unwrap_or_default()
    }
}
