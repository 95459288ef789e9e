// ABOUTME: Plain-text formula report for narrative generation and export
// ABOUTME: Renders sorted ingredient masses, totals, ratios, and optional reference context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Formula report rendering
//!
//! The report is built from an already computed [`FormulaSummary`], so totals
//! are identical whether or not a report is ever produced.

use crate::aggregator::FormulaSummary;
use crate::models::ReferenceEntry;
use std::fmt::Write as _;

/// Render the report block for one formula
///
/// `references` are appended as a context section when not empty.
#[must_use]
pub fn render_formula_report(
    product_name: &str,
    summary: &FormulaSummary,
    references: &[ReferenceEntry],
) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "Producto: {product_name}");
    out.push_str("Ingredientes:\n");
    for line in &summary.lines {
        let _ = writeln!(out, "- {}: {:.3} kg", line.name, line.kg_total);
    }

    let totals = &summary.totals;
    out.push_str("Resultados:\n");
    let _ = writeln!(out, "- Peso Total: {:.3} kg", totals.total_kg);
    let _ = writeln!(out, "- Costo/Kg: ${:.2}", totals.cost_per_kg);
    let _ = writeln!(out, "- % Proteína: {:.2}%", totals.protein_perc);
    let _ = writeln!(out, "- % Grasa: {:.2}%", totals.fat_perc);
    let _ = writeln!(out, "- % Humedad: {:.2}%", totals.water_perc);
    let _ = writeln!(out, "- Ratio Agua/Proteína: {}", totals.water_to_protein_ratio);
    let _ = writeln!(out, "- Ratio Grasa/Proteína: {}", totals.fat_to_protein_ratio);
    let _ = writeln!(
        out,
        "- Agua Retenida (informativo): {:.3} kg",
        totals.total_retained_water_kg
    );

    if !references.is_empty() {
        out.push_str("Contexto:\n");
        for entry in references {
            let _ = writeln!(out, "### {}\n{}", entry.title, entry.content);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::compute;
    use crate::models::{Category, FormulaLineView};
    use chrono::Utc;
    use uuid::Uuid;

    fn view(name: &str, category: Category, quantity: f64, unit: &str) -> FormulaLineView {
        FormulaLineView {
            line_id: Uuid::new_v4(),
            ingredient_id: Uuid::new_v4(),
            ingredient_name: name.to_owned(),
            quantity,
            unit: unit.to_owned(),
            protein_percent: Some(18.0),
            fat_percent: Some(12.0),
            water_percent: Some(65.0),
            water_retention_factor: None,
            price_per_kg: Some(4.0),
            category,
        }
    }

    #[test]
    fn test_report_lists_lines_in_display_order() {
        let summary = compute(&[
            view("Sal", Category::Seasoning, 250.0, "g"),
            view("Carne de cerdo", Category::Meat, 10.0, "kg"),
        ]);
        let report = render_formula_report("Salchicha", &summary, &[]);

        let meat = report.find("- Carne de cerdo: 10.000 kg").unwrap();
        let salt = report.find("- Sal: 0.250 kg").unwrap();
        assert!(meat < salt);
        assert!(report.starts_with("Producto: Salchicha\n"));
        assert!(report.contains("- Peso Total: 10.250 kg"));
        assert!(report.contains("- Costo/Kg: $4.00"));
        assert!(!report.contains("Contexto:"));
    }

    #[test]
    fn test_report_shows_not_applicable_ratios() {
        let report = render_formula_report("Vacía", &compute(&[]), &[]);
        assert!(report.contains("- Ratio Agua/Proteína: N/A"));
        assert!(report.contains("- % Humedad: 0.00%"));
    }

    #[test]
    fn test_report_appends_reference_context() {
        let entry = ReferenceEntry {
            id: Uuid::new_v4(),
            title: "Manual de embutidos".to_owned(),
            kind: Some("libro".to_owned()),
            content: "La salchicha requiere fosfatos.".to_owned(),
            created_at: Utc::now(),
        };
        let report = render_formula_report("Salchicha", &compute(&[]), &[entry]);
        assert!(report.contains("Contexto:\n### Manual de embutidos\nLa salchicha requiere fosfatos.\n"));
    }
}
