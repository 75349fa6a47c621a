use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of a `DailyLookup`, keyed by `Day::slug`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyLookupEntry {
    pub day_identifier: String,
    pub percentage_modifier: f64,
    pub intensity_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyLookup {
    pub id: Uuid,
    pub entries: Vec<DailyLookupEntry>,
}

impl DailyLookup {
    pub fn entry_for(&self, day_slug: &str) -> Option<&DailyLookupEntry> {
        self.entries.iter().find(|e| e.day_identifier == day_slug)
    }
}

/// One entry of a `WeeklyLookup`, keyed by week number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyLookupEntry {
    pub week_number: u32,
    pub percentages: Vec<f64>,
    pub reps: Vec<u32>,
    pub percentage_modifier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyLookup {
    pub id: Uuid,
    pub entries: Vec<WeeklyLookupEntry>,
}

impl WeeklyLookup {
    pub fn entry_for(&self, week_number: u32) -> Option<&WeeklyLookupEntry> {
        self.entries.iter().find(|e| e.week_number == week_number)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDailyLookup {
    pub entries: Vec<DailyLookupEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWeeklyLookup {
    pub entries: Vec<WeeklyLookupEntry>,
}
