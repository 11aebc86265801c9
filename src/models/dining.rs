// 🍽️ Dining Log
//
// Restaurant visits and takeout orders, so the household remembers what it
// ordered where and whether it was worth it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiningKind {
    DineIn,
    Takeout,
    Delivery,
}

impl DiningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiningKind::DineIn => "dine_in",
            DiningKind::Takeout => "takeout",
            DiningKind::Delivery => "delivery",
        }
    }
}

impl fmt::Display for DiningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiningKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "dine_in" => Ok(DiningKind::DineIn),
            "takeout" => Ok(DiningKind::Takeout),
            "delivery" => Ok(DiningKind::Delivery),
            other => Err(PlannerError::invalid("dining kind", format!("unknown kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningLog {
    pub id: String,
    pub household_id: String,
    pub restaurant: String,
    pub visited_on: NaiveDate,
    pub kind: DiningKind,

    /// What was ordered, in order
    #[serde(default)]
    pub dishes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,

    /// 1..=5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl DiningLog {
    pub fn validate(&self) -> Result<()> {
        if self.restaurant.trim().is_empty() {
            return Err(PlannerError::invalid("restaurant", "restaurant name is empty"));
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(PlannerError::invalid("rating", format!("{rating} is outside 1-5")));
            }
        }
        if let Some(cost) = self.total_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(PlannerError::invalid("total_cost", "must be a non-negative amount"));
            }
        }
        Ok(())
    }
}

/// Visit as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct DiningDraft {
    pub restaurant: String,
    pub visited_on: NaiveDate,
    pub kind: DiningKind,
    #[serde(default)]
    pub dishes: Vec<String>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DiningDraft {
    pub fn into_log(self, household_id: &str) -> Result<DiningLog> {
        let log = DiningLog {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            restaurant: self.restaurant.trim().to_string(),
            visited_on: self.visited_on,
            kind: self.kind,
            dishes: self
                .dishes
                .into_iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            total_cost: self.total_cost,
            rating: self.rating,
            notes: self.notes,
            created_at: Utc::now(),
        };
        log.validate()?;
        Ok(log)
    }
}
