use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A liftable exercise in the catalog (squat, bench, deadlift, press, accessories...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lift {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_competition_lift: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLift {
    pub name: String,
    pub slug: String,
    pub is_competition_lift: bool,
}

/// Which reference value a `LoadStrategy` percentage is taken of.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaxType {
    OneRm,
    TrainingMax,
}

/// A lifter's current value for `(lift, maxType)`. History is append-only; the
/// "current" value is the latest row by `created_at` per the spec's LiftMax
/// lifecycle rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiftMax {
    pub id: Uuid,
    pub lifter_id: Uuid,
    pub lift_id: Uuid,
    pub max_type: MaxType,
    pub value: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Which key (if any) a `LoadStrategy` consults in a lookup table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LookupKey {
    Day,
    Week,
}

/// How a prescription's weight is computed from a reference max.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStrategy {
    PercentOf {
        reference_type: MaxType,
        percentage: f64,
        lookup_key: Option<LookupKey>,
    },
}

/// How a prescription's sets/reps are expanded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetScheme {
    Fixed { sets: u32, reps: u32 },
    Amrap { sets: u32, reps: u32 },
    Greyskull {
        fixed_sets: u32,
        fixed_reps: u32,
        amrap_sets: u32,
        min_amrap_reps: u32,
    },
    Stage,
}

/// One row in a Day's ordered prescription list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: Uuid,
    pub lift_id: Uuid,
    pub load_strategy: LoadStrategy,
    pub set_scheme: SetScheme,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrescription {
    pub lift_id: Uuid,
    pub load_strategy: LoadStrategy,
    pub set_scheme: SetScheme,
    pub order: i32,
}

/// A named training day, holding an ordered sequence of prescriptions. The
/// slug doubles as the lookup key a `DailyLookup` keys off of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Day {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub prescriptions: Vec<Prescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDay {
    pub name: String,
    pub slug: String,
    pub prescription_ids: Vec<Uuid>,
}

/// A single week of a cycle: a mapping from weekday name to `Day`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Week {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub week_number: u32,
    pub days: std::collections::BTreeMap<String, Day>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWeek {
    pub cycle_id: Uuid,
    pub week_number: u32,
    pub days: std::collections::BTreeMap<String, Uuid>,
}

/// A fixed-length sequence of weeks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cycle {
    pub id: Uuid,
    pub name: String,
    pub length_weeks: u32,
    pub weeks: Vec<Week>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCycle {
    pub name: String,
    pub length_weeks: u32,
}
