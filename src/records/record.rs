//! The structured record produced upstream for one expense document.

use super::amount::deserialize_amount;
use super::date::parse_date;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Spending category of a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Taxi,
    Train,
    Flight,
    Hotel,
    Meal,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Taxi,
        Category::Train,
        Category::Flight,
        Category::Hotel,
        Category::Meal,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taxi => "taxi",
            Self::Train => "train",
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Meal => "meal",
            Self::Other => "other",
        }
    }

    /// Lenient parse; anything unrecognized is `Other`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "taxi" | "cab" | "ride" | "ride_hailing" => Self::Taxi,
            "train" | "rail" | "railway" => Self::Train,
            "flight" | "air" | "airfare" | "plane" => Self::Flight,
            "hotel" | "lodging" | "accommodation" => Self::Hotel,
            "meal" | "food" | "dining" | "restaurant" => Self::Meal,
            _ => Self::Other,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed expense document.
///
/// Field names follow this crate; the upstream extractor's key names
/// (`type`, `date`, `invoice_number`, `is_invoice`, `order_number`,
/// `file_path`) are accepted as aliases. Nulls and missing fields fall back
/// to empty values so a sparse extraction still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(alias = "type", deserialize_with = "nullable_category")]
    pub category: Category,

    #[serde(deserialize_with = "nullable_string")]
    pub subtype: String,

    /// Non-negative; zero means the amount is unknown
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,

    #[serde(alias = "date", deserialize_with = "nullable_string")]
    pub issue_date: String,

    #[serde(deserialize_with = "nullable_string")]
    pub service_date: String,

    #[serde(deserialize_with = "nullable_string")]
    pub merchant: String,

    #[serde(alias = "invoice_number", deserialize_with = "nullable_string")]
    pub document_number: String,

    /// Invoice-grade document (vs voucher / receipt / itinerary)
    #[serde(alias = "is_invoice", deserialize_with = "nullable_bool")]
    pub is_formal: bool,

    #[serde(alias = "order_number", deserialize_with = "nullable_string")]
    pub order_reference: String,

    #[serde(deserialize_with = "nullable_string")]
    pub description: String,

    #[serde(deserialize_with = "nullable_string")]
    pub raw_text: String,

    #[serde(alias = "file_path")]
    pub source_path: PathBuf,
}

impl Record {
    /// Service date when present, else issue date, else empty
    pub fn effective_date(&self) -> &str {
        let service = self.service_date.trim();
        if !service.is_empty() {
            return service;
        }
        self.issue_date.trim()
    }

    /// Effective date as a calendar day, when it parses
    pub fn effective_day(&self) -> Option<NaiveDate> {
        parse_date(self.effective_date())
    }

    pub fn has_known_amount(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn has_order_reference(&self) -> bool {
        !self.order_reference.trim().is_empty()
    }

    /// Lower-cased extension of the source file, without the dot
    pub fn extension(&self) -> Option<String> {
        self.source_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_category<'de, D>(deserializer: D) -> Result<Category, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| Category::parse(&s))
        .unwrap_or_default())
}

fn nullable_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
