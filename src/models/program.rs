use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub cycle_id: Uuid,
    pub weekly_lookup_id: Option<Uuid>,
    pub daily_lookup_id: Option<Uuid>,
    pub default_rounding: Option<f64>,
    pub difficulty: String,
    pub days_per_week: u32,
    pub focus: String,
    pub has_amrap: bool,
    /// Whether this program opts in to meet-taper weighting (spec.md §4.3
    /// step 3: "If the program integration opts-in to taper"). Defaults to
    /// `false`: most programs have no meet date and no taper story at all.
    pub taper_enabled: bool,
}

impl Program {
    /// `Rounder`'s increment for this program: declared `defaultRounding`, or
    /// the system default of 5.0 per spec.md §4.1/§9.
    pub fn rounding(&self) -> f64 {
        self.default_rounding.unwrap_or(5.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgram {
    pub name: String,
    pub slug: String,
    pub cycle_id: Uuid,
    pub weekly_lookup_id: Option<Uuid>,
    pub daily_lookup_id: Option<Uuid>,
    pub default_rounding: Option<f64>,
    pub difficulty: String,
    pub days_per_week: u32,
    pub focus: String,
    pub has_amrap: bool,
    #[serde(default)]
    pub taper_enabled: bool,
}

/// Query parameters accepted by `GET /programs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramFilter {
    pub difficulty: Option<String>,
    pub days_per_week: Option<u32>,
    pub focus: Option<String>,
    pub has_amrap: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProgramFilter {
    /// Clamp to the pagination bounds the catalog API enforces: 1..=100,
    /// default 20; offset non-negative, default 0.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn matches(&self, program: &Program) -> bool {
        if let Some(d) = &self.difficulty {
            if &program.difficulty != d {
                return false;
            }
        }
        if let Some(dpw) = self.days_per_week {
            if program.days_per_week != dpw {
                return false;
            }
        }
        if let Some(f) = &self.focus {
            if &program.focus != f {
                return false;
            }
        }
        if let Some(amrap) = self.has_amrap {
            if program.has_amrap != amrap {
                return false;
            }
        }
        if let Some(q) = &self.search {
            let q = q.to_lowercase();
            if !program.name.to_lowercase().contains(&q) && !program.focus.to_lowercase().contains(&q) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        let has_more = offset + (items.len() as i64) < total;
        Self { items, total, limit, offset, has_more }
    }
}

/// One exercise of `GET /programs/{id}`'s `sampleWeek`.
#[derive(Debug, Clone, Serialize)]
pub struct SampleWeekDay {
    pub day_name: String,
    pub day_slug: String,
    pub lifts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub sample_week: Vec<SampleWeekDay>,
    pub lift_requirements: Vec<String>,
    pub estimated_session_minutes: u32,
}
