//! Gym PR tracking: one-rep-max estimates and weight conversion.

use std::fmt;
use std::str::FromStr;

const KG_PER_LB_FACTOR: f64 = 2.2;

/// Unit of a weight argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Unit {
    #[name = "kg"]
    Kg,
    #[name = "lb"]
    Lb,
}

impl Unit {
    /// Accepts the spellings people actually type (`lbs`, `pounds`, `kilogrammes`...).
    pub fn parse_loose(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => Some(Unit::Lb),
            "kg" | "kgs" | "kilogram" | "kilograms" | "kilogramme" | "kilogrammes" => {
                Some(Unit::Kg)
            }
            _ => None,
        }
    }
}

/// How a PR for an exercise is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, poise::ChoiceParameter)]
pub enum ExerciseCategory {
    /// Heaviest weight, stored in kg.
    Max,
    Reps,
    /// Seconds.
    Time,
}

impl ExerciseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Max => "Max",
            ExerciseCategory::Reps => "Reps",
            ExerciseCategory::Time => "Time",
        }
    }
}

impl FromStr for ExerciseCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Max" => Ok(ExerciseCategory::Max),
            "Reps" => Ok(ExerciseCategory::Reps),
            "Time" => Ok(ExerciseCategory::Time),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneRepMax {
    Brzycki,
    Epley,
    Lander,
    Lombardi,
    Mayhew,
    OConner,
    Wathen,
}

impl OneRepMax {
    pub const ALL: [OneRepMax; 7] = [
        OneRepMax::Brzycki,
        OneRepMax::Epley,
        OneRepMax::Lander,
        OneRepMax::Lombardi,
        OneRepMax::Mayhew,
        OneRepMax::OConner,
        OneRepMax::Wathen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OneRepMax::Brzycki => "Brzycki",
            OneRepMax::Epley => "Epley",
            OneRepMax::Lander => "Lander",
            OneRepMax::Lombardi => "Lombardi",
            OneRepMax::Mayhew => "Mayhew",
            OneRepMax::OConner => "O'Conner",
            OneRepMax::Wathen => "Wathen",
        }
    }

    /// Estimated one-rep max for `reps` repetitions of `weight`.
    pub fn estimate(&self, weight: f64, reps: u32) -> f64 {
        let r = f64::from(reps);
        match self {
            OneRepMax::Brzycki => weight * (36.0 / (37.0 - r)),
            OneRepMax::Epley => weight * (1.0 + r / 30.0),
            OneRepMax::Lander => 100.0 * (weight / (101.3 - 2.67123 * r)),
            // Kept as the community has always computed it.
            OneRepMax::Lombardi => (weight * r).powf(0.1),
            OneRepMax::Mayhew => (100.0 * weight) / (52.2 + 41.9 * (-0.055 * r).exp()),
            OneRepMax::OConner => weight * (1.0 + r / 40.0),
            OneRepMax::Wathen => (100.0 * weight) / (48.8 + 53.8 * (-0.075 * r).exp()),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn lb_to_kg(value: f64) -> f64 {
    round2(round2(value) / KG_PER_LB_FACTOR)
}

pub fn kg_to_lb(value: f64) -> f64 {
    round2(KG_PER_LB_FACTOR * round2(value))
}

/// Normalize a weight to `(kg, lb)`.
pub fn both_units(weight: f64, unit: Unit) -> (f64, f64) {
    match unit {
        Unit::Kg => (weight, kg_to_lb(weight)),
        Unit::Lb => (lb_to_kg(weight), weight),
    }
}

/// Markdown body listing every formula's estimate.
pub fn one_rep_max_report(weight: f64, unit: Unit, reps: u32) -> String {
    let (kg, lb) = both_units(weight, unit);
    let mut out = format!("### Your 1RM based on {reps} reps of {kg} kg / {lb} lb should be\n");
    for formula in OneRepMax::ALL {
        let max_kg = round2(formula.estimate(kg, reps));
        let max_lb = kg_to_lb(max_kg);
        out.push_str(&format!(
            "- {} formula:\n  - ≈ {max_kg} kg / {max_lb} lb.\n",
            formula.name()
        ));
    }
    out
}

/// A PR value rendered for its category.
pub fn format_pr(category: ExerciseCategory, value: f64) -> String {
    match category {
        ExerciseCategory::Max => format!("{value} kg / {} lb", kg_to_lb(value)),
        ExerciseCategory::Reps => format!("{} reps", value as i64),
        ExerciseCategory::Time => format!("{value} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn formulas_for_known_inputs() {
        assert!(close(OneRepMax::Brzycki.estimate(100.0, 10), 133.333333));
        assert!(close(OneRepMax::Epley.estimate(100.0, 10), 133.333333));
        assert!(close(OneRepMax::OConner.estimate(100.0, 10), 125.0));
        assert!(close(OneRepMax::Lander.estimate(100.0, 10), 100.0 * 100.0 / 74.5877));
        assert!(close(OneRepMax::Lombardi.estimate(100.0, 10), 1000f64.powf(0.1)));
        assert!(close(
            OneRepMax::Mayhew.estimate(100.0, 10),
            10_000.0 / (52.2 + 41.9 * (-0.55f64).exp())
        ));
        assert!(close(
            OneRepMax::Wathen.estimate(100.0, 10),
            10_000.0 / (48.8 + 53.8 * (-0.75f64).exp())
        ));
    }

    #[test]
    fn single_rep_is_close_to_weight() {
        assert!(close(OneRepMax::Brzycki.estimate(80.0, 1), 80.0));
        assert!(close(OneRepMax::Epley.estimate(90.0, 0), 90.0));
    }

    #[test]
    fn unit_conversion() {
        assert_eq!(lb_to_kg(220.0), 100.0);
        assert_eq!(kg_to_lb(100.0), 220.0);
        assert_eq!(lb_to_kg(135.0), 61.36);
        assert_eq!(both_units(100.0, Unit::Kg), (100.0, 220.0));
    }

    #[test]
    fn loose_unit_names() {
        assert_eq!(Unit::parse_loose("Pounds"), Some(Unit::Lb));
        assert_eq!(Unit::parse_loose("kilogrammes"), Some(Unit::Kg));
        assert_eq!(Unit::parse_loose("stone"), None);
    }

    #[test]
    fn report_lists_every_formula() {
        let report = one_rep_max_report(100.0, Unit::Kg, 5);
        for formula in OneRepMax::ALL {
            assert!(report.contains(formula.name()));
        }
        assert!(report.starts_with("### Your 1RM based on 5 reps of 100 kg / 220 lb"));
    }

    #[test]
    fn pr_formatting() {
        assert_eq!(format_pr(ExerciseCategory::Reps, 12.0), "12 reps");
        assert_eq!(format_pr(ExerciseCategory::Max, 100.0), "100 kg / 220 lb");
        assert_eq!(ExerciseCategory::from_str("Time"), Ok(ExerciseCategory::Time));
    }
}
