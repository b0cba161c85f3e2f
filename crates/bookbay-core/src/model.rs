use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::MarketError;

pub type BookId = String;
pub type UserId = String; // ULID string
pub type SessionId = String;
pub type MessageId = String; // msg_<ulid>
pub type OrderId = String; // ord_<ulid>

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::New,
        Condition::LikeNew,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::LikeNew => "like-new",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| MarketError::Invalid(format!("unknown condition '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub condition: Condition,
    pub category: Vec<String>,
    pub cover_image: String,
    pub seller_name: String,
    pub seller_rating: f32,
    pub location: String,
    pub date_added: NaiveDate,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub best_seller: bool,
}

impl Book {
    pub fn has_any_category<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter().any(|t| self.category.contains(t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user; credentials stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub from_id: UserId,
    pub subject: String,
    #[serde(default)]
    pub content: String,
    pub date: NaiveDate,
    pub unread: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub unit_price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub subtotal: f64,
    pub shipping: f64,
    pub discount: f64,
    pub total: f64,
    #[serde(default)]
    pub coupon: Option<String>,
    pub delivery: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Seller-submitted listing before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub author: String,
    pub description: String,
    pub condition: String,
    pub category: String,
    pub price: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_uses_kebab_case() {
        let json = serde_json::to_string(&Condition::LikeNew).unwrap();
        assert_eq!(json, "\"like-new\"");
        assert_eq!("like-new".parse::<Condition>().unwrap(), Condition::LikeNew);
        assert!("mint".parse::<Condition>().is_err());
    }

    #[test]
    fn book_reads_camel_case_record() {
        let raw = r#"{
            "id": "9", "title": "Dune", "author": "Frank Herbert",
            "description": "Spice.", "price": 7.5, "condition": "good",
            "category": ["fiction"], "coverImage": "https://x/y.jpg",
            "sellerName": "Arrakis Books", "sellerRating": 4.2,
            "location": "Tucson, AZ", "dateAdded": "2023-08-01"
        }"#;
        let b: Book = serde_json::from_str(raw).unwrap();
        assert_eq!(b.condition, Condition::Good);
        assert_eq!(b.original_price, None);
        assert!(!b.featured);
        assert_eq!(b.date_added, NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());
    }
}
