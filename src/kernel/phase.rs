//! Meet-countdown phase resolution (spec.md §4.2). Advisory only: the
//! kernel never mutates `currentWeek` based on meet date (spec.md §9).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    OffSeason,
    Prep1,
    Prep2,
    Peak,
    MeetWeek,
    Taper,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PhaseInfo {
    pub phase: Phase,
    pub days_out: i64,
    pub taper_multiplier: f64,
}

impl Phase {
    pub fn taper_multiplier(self) -> f64 {
        match self {
            Phase::MeetWeek => 0.4,
            Phase::Peak => 0.7,
            Phase::Taper => 0.85,
            Phase::Prep2 => 0.95,
            Phase::Prep1 => 1.0,
            Phase::OffSeason => 1.0,
        }
    }
}

/// Resolve `(meetDate, now)` to a phase, days-out, and taper multiplier.
///
/// `meetDate` absent yields `off_season` with `daysOut = 0`. Otherwise
/// `daysOut` is the non-negative calendar-day distance; a meet date on or
/// before `now` is treated as `meet_week` (daysOut clamped to 0).
pub fn resolve(meet_date: Option<NaiveDate>, now: NaiveDate) -> PhaseInfo {
    let Some(meet_date) = meet_date else {
        return PhaseInfo { phase: Phase::OffSeason, days_out: 0, taper_multiplier: Phase::OffSeason.taper_multiplier() };
    };

    let days_out = (meet_date - now).num_days().max(0);

    let phase = if days_out <= 7 {
        Phase::MeetWeek
    } else if days_out <= 21 {
        Phase::Peak
    } else if days_out <= 56 {
        Phase::Prep2
    } else {
        Phase::Prep1
    };

    PhaseInfo { phase, days_out, taper_multiplier: phase.taper_multiplier() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(offset: i64) -> (Option<NaiveDate>, NaiveDate) {
        let now = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        (Some(now + chrono::Duration::days(offset)), now)
    }

    #[test]
    fn no_meet_date_is_off_season() {
        let info = resolve(None, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(info.phase, Phase::OffSeason);
        assert_eq!(info.days_out, 0);
        assert_eq!(info.taper_multiplier, 1.0);
    }

    #[test]
    fn phase_bands_match_spec_literals() {
        let cases = [
            (7, Phase::MeetWeek, 0.4),
            (14, Phase::Peak, 0.7),
            (21, Phase::Peak, 0.7),
            (28, Phase::Prep2, 0.95),
            (49, Phase::Prep2, 0.95),
            (56, Phase::Prep2, 0.95),
            (84, Phase::Prep1, 1.0),
            (112, Phase::Prep1, 1.0),
        ];
        for (offset, phase, mult) in cases {
            let (meet, now) = d(offset);
            let info = resolve(meet, now);
            assert_eq!(info.phase, phase, "offset {offset}");
            assert_eq!(info.days_out, offset);
            assert_eq!(info.taper_multiplier, mult, "offset {offset}");
        }
    }

    #[test]
    fn meet_date_in_the_past_is_meet_week_with_zero_days_out() {
        let now = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let meet = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let info = resolve(Some(meet), now);
        assert_eq!(info.phase, Phase::MeetWeek);
        assert_eq!(info.days_out, 0);
    }
}
