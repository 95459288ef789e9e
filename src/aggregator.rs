// ABOUTME: Formula aggregation: per-line mass, nutrient and cost projection plus formula totals
// ABOUTME: Pure computation over loaded formula lines, ordered by category for display
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! # Formula Aggregator
//!
//! [`compute`] turns the lines of one formula into display-ordered
//! projections and formula-level totals.
//!
//! - Quantities are normalized to kilograms. Only `g` is converted; any
//!   other unit is taken as kilograms already.
//! - Absent nutritional or price data contributes zero. Incomplete
//!   ingredients never fail a formula.
//! - Retained water is reported on its own and is not part of the moisture
//!   percentage.
//! - Values keep full precision. Rounding belongs to [`presentation`].

use crate::models::{Category, FormulaLineView};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Grams per kilogram
const GRAMS_PER_KG: f64 = 1000.0;

/// Mass unit of a line quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassUnit {
    /// Grams, converted by dividing by 1000
    Grams,
    /// Kilograms, and every unit that is not grams
    Kilograms,
}

impl MassUnit {
    /// Classify a unit string; surrounding whitespace and case are ignored
    #[must_use]
    pub fn parse(unit: &str) -> Self {
        if unit.trim().eq_ignore_ascii_case("g") {
            Self::Grams
        } else {
            Self::Kilograms
        }
    }

    /// Convert `quantity` in `unit` to kilograms
    ///
    /// A non-finite quantity converts to zero.
    #[must_use]
    pub fn normalize_to_kg(quantity: f64, unit: &str) -> f64 {
        if !quantity.is_finite() {
            return 0.0;
        }
        match Self::parse(unit) {
            Self::Grams => quantity / GRAMS_PER_KG,
            Self::Kilograms => quantity,
        }
    }
}

/// A presentation ratio that may be undefined
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    /// Defined ratio
    Value(f64),
    /// Denominator was zero
    NotApplicable,
}

impl Ratio {
    /// `numerator / denominator` when the denominator is positive
    #[must_use]
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Self::Value(numerator / denominator)
        } else {
            Self::NotApplicable
        }
    }

    /// Two-decimal text, or `N/A`
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// The ratio rounded to `places` decimals
    #[must_use]
    pub fn rounded(self, places: u32) -> Self {
        match self {
            Self::Value(v) => Self::Value(presentation::round_to(v, places)),
            Self::NotApplicable => Self::NotApplicable,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// One formula line projected into kilograms, nutrients and cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineProjection {
    /// Formula line identifier
    pub line_id: Uuid,
    /// Resolved user ingredient
    pub ingredient_id: Uuid,
    /// Ingredient display name
    pub name: String,
    /// Display category
    pub category: Category,
    /// Quantity as entered
    pub original_quantity: f64,
    /// Unit as entered
    pub original_unit: String,
    /// Line mass in kilograms
    pub kg_total: f64,
    /// Protein mass in kilograms
    pub kg_protein: f64,
    /// Fat mass in kilograms
    pub kg_fat: f64,
    /// Water mass in kilograms
    pub kg_water: f64,
    /// Retention coefficient, zero when absent
    pub water_retention_factor: f64,
    /// `kg_total × price_per_kg`
    pub line_cost: f64,
    /// Category priority, 1 sorts first
    pub sort_priority: u8,
}

impl LineProjection {
    /// Project a single loaded line
    #[must_use]
    pub fn from_line(line: &FormulaLineView) -> Self {
        let kg_total = MassUnit::normalize_to_kg(line.quantity, &line.unit);
        Self {
            line_id: line.line_id,
            ingredient_id: line.ingredient_id,
            name: line.ingredient_name.clone(),
            category: line.category,
            original_quantity: line.quantity,
            original_unit: line.unit.clone(),
            kg_total,
            kg_protein: kg_total * percent(line.protein_percent),
            kg_fat: kg_total * percent(line.fat_percent),
            kg_water: kg_total * percent(line.water_percent),
            water_retention_factor: or_zero(line.water_retention_factor),
            line_cost: kg_total * or_zero(line.price_per_kg),
            sort_priority: line.category.priority(),
        }
    }

    /// Water the line is expected to absorb during processing
    #[must_use]
    pub fn retained_water_kg(&self) -> f64 {
        self.kg_total * self.water_retention_factor
    }
}

/// Formula-level totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaTotals {
    /// Sum of line masses
    pub total_kg: f64,
    /// Sum of protein masses
    pub total_protein_kg: f64,
    /// Sum of fat masses
    pub total_fat_kg: f64,
    /// Sum of measured water masses
    pub total_water_kg: f64,
    /// Informational; excluded from `water_perc`
    pub total_retained_water_kg: f64,
    /// Sum of line costs
    pub total_cost: f64,
    /// `total_cost / total_kg`, zero for an empty formula
    pub cost_per_kg: f64,
    /// Protein share of total mass, percent
    pub protein_perc: f64,
    /// Fat share of total mass, percent
    pub fat_perc: f64,
    /// Measured water share of total mass, percent
    pub water_perc: f64,
    /// `water_perc / protein_perc`
    pub water_to_protein_ratio: Ratio,
    /// `fat_perc / protein_perc`
    pub fat_to_protein_ratio: Ratio,
}

impl FormulaTotals {
    /// Roll up projections; the result does not depend on their order
    #[must_use]
    pub fn from_projections(lines: &[LineProjection]) -> Self {
        let total_kg: f64 = lines.iter().map(|l| l.kg_total).sum();
        let total_protein_kg: f64 = lines.iter().map(|l| l.kg_protein).sum();
        let total_fat_kg: f64 = lines.iter().map(|l| l.kg_fat).sum();
        let total_water_kg: f64 = lines.iter().map(|l| l.kg_water).sum();
        let total_retained_water_kg: f64 = lines.iter().map(LineProjection::retained_water_kg).sum();
        let total_cost: f64 = lines.iter().map(|l| l.line_cost).sum();

        let share = |part: f64| {
            if total_kg > 0.0 {
                part / total_kg
            } else {
                0.0
            }
        };
        let protein_perc = share(total_protein_kg) * 100.0;
        let fat_perc = share(total_fat_kg) * 100.0;
        let water_perc = share(total_water_kg) * 100.0;

        Self {
            total_kg,
            total_protein_kg,
            total_fat_kg,
            total_water_kg,
            total_retained_water_kg,
            total_cost,
            cost_per_kg: share(total_cost),
            protein_perc,
            fat_perc,
            water_perc,
            water_to_protein_ratio: Ratio::of(water_perc, protein_perc),
            fat_to_protein_ratio: Ratio::of(fat_perc, protein_perc),
        }
    }

    /// Copy rounded for display: masses to 3 decimals, money, percentages
    /// and ratios to 2
    #[must_use]
    pub fn rounded(&self) -> Self {
        use presentation::{round_mass, round_to};
        Self {
            total_kg: round_mass(self.total_kg),
            total_protein_kg: round_mass(self.total_protein_kg),
            total_fat_kg: round_mass(self.total_fat_kg),
            total_water_kg: round_mass(self.total_water_kg),
            total_retained_water_kg: round_mass(self.total_retained_water_kg),
            total_cost: round_to(self.total_cost, 2),
            cost_per_kg: round_to(self.cost_per_kg, 2),
            protein_perc: round_to(self.protein_perc, 2),
            fat_perc: round_to(self.fat_perc, 2),
            water_perc: round_to(self.water_perc, 2),
            water_to_protein_ratio: self.water_to_protein_ratio.rounded(2),
            fat_to_protein_ratio: self.fat_to_protein_ratio.rounded(2),
        }
    }
}

/// Ordered projections plus totals for one formula
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaSummary {
    /// Lines sorted by category priority, then heaviest first
    pub lines: Vec<LineProjection>,
    /// Formula totals
    pub totals: FormulaTotals,
}

impl FormulaSummary {
    /// Copy rounded for display
    #[must_use]
    pub fn rounded(&self) -> Self {
        use presentation::{round_mass, round_to};
        Self {
            lines: self
                .lines
                .iter()
                .map(|l| LineProjection {
                    kg_total: round_mass(l.kg_total),
                    kg_protein: round_mass(l.kg_protein),
                    kg_fat: round_mass(l.kg_fat),
                    kg_water: round_mass(l.kg_water),
                    line_cost: round_to(l.line_cost, 2),
                    ..l.clone()
                })
                .collect(),
            totals: self.totals.rounded(),
        }
    }
}

/// Project, order and total a formula's lines
#[must_use]
pub fn compute(lines: &[FormulaLineView]) -> FormulaSummary {
    let mut projections: Vec<LineProjection> = lines.iter().map(LineProjection::from_line).collect();
    // Vec::sort_by is stable, so equal keys keep load order
    projections.sort_by(display_order);
    let totals = FormulaTotals::from_projections(&projections);
    FormulaSummary {
        lines: projections,
        totals,
    }
}

fn display_order(a: &LineProjection, b: &LineProjection) -> Ordering {
    a.sort_priority
        .cmp(&b.sort_priority)
        .then_with(|| b.kg_total.total_cmp(&a.kg_total))
}

fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn percent(value: Option<f64>) -> f64 {
    or_zero(value) / 100.0
}

/// Rounding for output boundaries
pub mod presentation {
    /// Round to `places` decimals
    #[must_use]
    pub fn round_to(value: f64, places: u32) -> f64 {
        let factor = 10_f64.powi(places as i32);
        (value * factor).round() / factor
    }

    /// Masses are shown to the gram
    #[must_use]
    pub fn round_mass(kg: f64) -> f64 {
        round_to(kg, 3)
    }
}
