use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Display identity for a conversation participant or notification actor.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

impl Identity {
    /// Human-readable label: display name when set, email otherwise.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
        }
    }
}

/// Seller-side view of a listing, as courier needs it for conversation
/// creation and fan-out (owned by the marketplace app otherwise).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ListingRow {
    pub id: Uuid,
    pub store_id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_display_name() {
        let ident = Identity {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            display_name: Some("Ana".into()),
        };
        assert_eq!(ident.label(), "Ana");
    }

    #[test]
    fn label_falls_back_to_email() {
        let ident = Identity {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            display_name: None,
        };
        assert_eq!(ident.label(), "ana@example.com");
    }
}
