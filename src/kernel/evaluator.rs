//! PrescriptionEvaluator (spec.md §4.3): composes a prescription plus
//! lifter context into a concrete, ordered list of prescribed sets. Pure
//! and deterministic — same inputs, byte-identical output.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult};
use crate::kernel::phase::PhaseInfo;
use crate::kernel::rounder;
use crate::models::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PrescribedSet {
    pub set_number: u32,
    pub weight: f64,
    pub target_reps: u32,
    pub is_amrap: bool,
}

/// Everything the evaluator needs about the lifter and program, assembled
/// by the `WorkoutProjector` before invoking `evaluate`.
pub struct LifterContext<'a> {
    pub lifter_id: Uuid,
    pub program: &'a Program,
    pub daily_lookup: Option<&'a DailyLookup>,
    pub weekly_lookup: Option<&'a WeeklyLookup>,
    pub week_number: u32,
    pub day_slug: &'a str,
    pub phase_info: PhaseInfo,
    /// Whether this program integration opts in to meet-taper weighting
    /// (spec.md §4.3 step 3: "If the program integration opts-in to taper").
    pub apply_taper: bool,
    /// Resolver for the lifter's current max: `(lift_id, max_type) -> value`.
    pub max_lookup: &'a dyn Fn(Uuid, MaxType) -> Option<f64>,
    /// Resolver for the lifter's active stage for a STAGE scheme, keyed by
    /// the StageProgression linked to this lift.
    pub stage_lookup: &'a dyn Fn(Uuid) -> Option<(ProgressionDefinition, usize)>,
}

/// Evaluate one prescription into its ordered prescribed sets.
pub fn evaluate(prescription: &Prescription, ctx: &LifterContext<'_>) -> KernelResult<Vec<PrescribedSet>> {
    let LoadStrategy::PercentOf { reference_type, percentage, lookup_key } = &prescription.load_strategy;

    // For STAGE schemes the "percentage" path still resolves a base max so
    // stages with a percentage-free scheme simply ignore it; the scheme
    // expansion below decides what matters.
    let base_max = (ctx.max_lookup)(prescription.lift_id, *reference_type)
        .ok_or(KernelError::MissingMax { lift_id: prescription.lift_id })?;

    let mut modifier = 1.0f64;
    let mut reps_override: Option<u32> = None;

    if matches!(lookup_key, Some(LookupKey::Day)) {
        if let Some(daily) = ctx.daily_lookup {
            if let Some(entry) = daily.entry_for(ctx.day_slug) {
                modifier *= entry.percentage_modifier / 100.0;
            }
        }
    }
    if matches!(lookup_key, Some(LookupKey::Week)) {
        if let Some(weekly) = ctx.weekly_lookup {
            if let Some(entry) = weekly.entry_for(ctx.week_number) {
                modifier *= entry.percentage_modifier / 100.0;
                if matches!(prescription.set_scheme, SetScheme::Fixed { .. }) {
                    reps_override = entry.reps.first().copied();
                }
            }
        }
    }

    let mut raw = base_max * (percentage / 100.0) * modifier;
    if ctx.apply_taper {
        raw *= ctx.phase_info.taper_multiplier;
    }
    let weight = rounder::round(raw, ctx.program.rounding());

    let sets = match &prescription.set_scheme {
        SetScheme::Fixed { sets, reps } => {
            let reps = reps_override.unwrap_or(*reps);
            (1..=*sets)
                .map(|n| PrescribedSet { set_number: n, weight, target_reps: reps, is_amrap: false })
                .collect()
        }
        SetScheme::Amrap { sets, reps } => (1..=*sets)
            .map(|n| PrescribedSet {
                set_number: n,
                weight,
                target_reps: *reps,
                is_amrap: n == *sets,
            })
            .collect(),
        SetScheme::Greyskull { fixed_sets, fixed_reps, amrap_sets, min_amrap_reps } => {
            let mut out = Vec::with_capacity((*fixed_sets + *amrap_sets) as usize);
            for n in 1..=*fixed_sets {
                out.push(PrescribedSet { set_number: n, weight, target_reps: *fixed_reps, is_amrap: false });
            }
            for n in 1..=*amrap_sets {
                out.push(PrescribedSet {
                    set_number: fixed_sets + n,
                    weight,
                    target_reps: *min_amrap_reps,
                    is_amrap: true,
                });
            }
            out
        }
        SetScheme::Stage => {
            let (definition, stage_index) = (ctx.stage_lookup)(prescription.lift_id)
                .ok_or(KernelError::MissingMax { lift_id: prescription.lift_id })?;
            let ProgressionDefinition::StageProgression { stages, .. } = definition else {
                return Err(KernelError::Validation(
                    "STAGE scheme requires a linked StageProgression".into(),
                ));
            };
            let stage = stages.get(stage_index).ok_or_else(|| {
                KernelError::Validation("stage index out of range".into())
            })?;
            (1..=stage.sets)
                .map(|n| PrescribedSet {
                    set_number: n,
                    weight,
                    target_reps: stage.reps,
                    is_amrap: stage.is_amrap && n == stage.sets,
                })
                .collect()
        }
    };

    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lift_id() -> Uuid {
        Uuid::from_u128(1)
    }

    fn program() -> Program {
        Program {
            id: Uuid::from_u128(100),
            name: "Test".into(),
            slug: "test".into(),
            cycle_id: Uuid::from_u128(200),
            weekly_lookup_id: None,
            daily_lookup_id: None,
            default_rounding: None,
            difficulty: "intermediate".into(),
            days_per_week: 3,
            focus: "strength".into(),
            has_amrap: true,
            taper_enabled: false,
        }
    }

    #[test]
    fn btm_week1_monday_squat_fixed_5x5_at_90_percent() {
        let prescription = Prescription {
            id: Uuid::from_u128(10),
            lift_id: lift_id(),
            load_strategy: LoadStrategy::PercentOf { reference_type: MaxType::TrainingMax, percentage: 90.0, lookup_key: None },
            set_scheme: SetScheme::Fixed { sets: 5, reps: 5 },
            order: 1,
        };
        let program = program();
        let max_lookup = |_lift: Uuid, _mt: MaxType| Some(315.0);
        let stage_lookup = |_lift: Uuid| None;
        let ctx = LifterContext {
            lifter_id: Uuid::from_u128(1000),
            program: &program,
            daily_lookup: None,
            weekly_lookup: None,
            week_number: 1,
            day_slug: "monday",
            phase_info: crate::kernel::phase::resolve(None, chrono::Utc::now().date_naive()),
            apply_taper: false,
            max_lookup: &max_lookup,
            stage_lookup: &stage_lookup,
        };

        let sets = evaluate(&prescription, &ctx).unwrap();
        assert_eq!(sets.len(), 5);
        for s in &sets {
            assert_eq!(s.weight, 285.0);
            assert_eq!(s.target_reps, 5);
            assert!(!s.is_amrap);
        }
    }

    #[test]
    fn btm_week1_monday_press_amrap_1x5_at_70_percent() {
        let prescription = Prescription {
            id: Uuid::from_u128(11),
            lift_id: lift_id(),
            load_strategy: LoadStrategy::PercentOf { reference_type: MaxType::TrainingMax, percentage: 70.0, lookup_key: None },
            set_scheme: SetScheme::Amrap { sets: 1, reps: 5 },
            order: 2,
        };
        let program = program();
        let max_lookup = |_lift: Uuid, _mt: MaxType| Some(145.0);
        let stage_lookup = |_lift: Uuid| None;
        let ctx = LifterContext {
            lifter_id: Uuid::from_u128(1000),
            program: &program,
            daily_lookup: None,
            weekly_lookup: None,
            week_number: 1,
            day_slug: "monday",
            phase_info: crate::kernel::phase::resolve(None, chrono::Utc::now().date_naive()),
            apply_taper: false,
            max_lookup: &max_lookup,
            stage_lookup: &stage_lookup,
        };

        let sets = evaluate(&prescription, &ctx).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].weight, 100.0);
        assert_eq!(sets[0].target_reps, 5);
        assert!(sets[0].is_amrap);
    }

    #[test]
    fn texas_method_volume_monday_with_daily_lookup() {
        let prescription = Prescription {
            id: Uuid::from_u128(12),
            lift_id: lift_id(),
            load_strategy: LoadStrategy::PercentOf { reference_type: MaxType::TrainingMax, percentage: 100.0, lookup_key: Some(LookupKey::Day) },
            set_scheme: SetScheme::Fixed { sets: 5, reps: 5 },
            order: 1,
        };
        let daily = DailyLookup {
            id: Uuid::from_u128(50),
            entries: vec![
                DailyLookupEntry { day_identifier: "volume".into(), percentage_modifier: 90.0, intensity_level: "high".into() },
                DailyLookupEntry { day_identifier: "recovery".into(), percentage_modifier: 72.0, intensity_level: "low".into() },
                DailyLookupEntry { day_identifier: "intensity".into(), percentage_modifier: 100.0, intensity_level: "max".into() },
            ],
        };
        let program = program();
        let max_lookup = |_lift: Uuid, _mt: MaxType| Some(315.0);
        let stage_lookup = |_lift: Uuid| None;
        let ctx = LifterContext {
            lifter_id: Uuid::from_u128(1000),
            program: &program,
            daily_lookup: Some(&daily),
            weekly_lookup: None,
            week_number: 1,
            day_slug: "volume",
            phase_info: crate::kernel::phase::resolve(None, chrono::Utc::now().date_naive()),
            apply_taper: false,
            max_lookup: &max_lookup,
            stage_lookup: &stage_lookup,
        };

        let sets = evaluate(&prescription, &ctx).unwrap();
        // 315 * 0.9 = 283.5 -> 285
        assert_eq!(sets[0].weight, 285.0);
    }

    #[test]
    fn missing_max_is_an_error() {
        let prescription = Prescription {
            id: Uuid::from_u128(13),
            lift_id: lift_id(),
            load_strategy: LoadStrategy::PercentOf { reference_type: MaxType::OneRm, percentage: 80.0, lookup_key: None },
            set_scheme: SetScheme::Fixed { sets: 3, reps: 5 },
            order: 1,
        };
        let program = program();
        let max_lookup = |_lift: Uuid, _mt: MaxType| None;
        let stage_lookup = |_lift: Uuid| None;
        let ctx = LifterContext {
            lifter_id: Uuid::from_u128(1000),
            program: &program,
            daily_lookup: None,
            weekly_lookup: None,
            week_number: 1,
            day_slug: "monday",
            phase_info: crate::kernel::phase::resolve(None, chrono::Utc::now().date_naive()),
            apply_taper: false,
            max_lookup: &max_lookup,
            stage_lookup: &stage_lookup,
        };

        let err = evaluate(&prescription, &ctx).unwrap_err();
        assert!(matches!(err, KernelError::MissingMax { .. }));
    }

    /// spec.md §4.3 step 3: "If the program integration opts-in to taper,
    /// multiply by `phaseInfo.taperMultiplier`." Exercises the opt-in via
    /// `Program.taper_enabled` rather than leaving `apply_taper` unreachable.
    #[test]
    fn taper_enabled_program_multiplies_by_phase_taper() {
        let prescription = Prescription {
            id: Uuid::from_u128(14),
            lift_id: lift_id(),
            load_strategy: LoadStrategy::PercentOf { reference_type: MaxType::TrainingMax, percentage: 90.0, lookup_key: None },
            set_scheme: SetScheme::Fixed { sets: 1, reps: 5 },
            order: 1,
        };
        let mut program = program();
        program.taper_enabled = true;
        let max_lookup = |_lift: Uuid, _mt: MaxType| Some(315.0);
        let stage_lookup = |_lift: Uuid| None;
        let now = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let meet_date = now + chrono::Duration::days(14);
        let phase_info = crate::kernel::phase::resolve(Some(meet_date), now);
        assert_eq!(phase_info.phase, crate::kernel::phase::Phase::Peak);
        assert_eq!(phase_info.taper_multiplier, 0.7);

        let ctx = LifterContext {
            lifter_id: Uuid::from_u128(1000),
            program: &program,
            daily_lookup: None,
            weekly_lookup: None,
            week_number: 1,
            day_slug: "monday",
            phase_info,
            apply_taper: program.taper_enabled,
            max_lookup: &max_lookup,
            stage_lookup: &stage_lookup,
        };

        let sets = evaluate(&prescription, &ctx).unwrap();
        // 315 * 0.9 * 0.7 = 198.45 -> 200.
        assert_eq!(sets[0].weight, 200.0);
    }
}
