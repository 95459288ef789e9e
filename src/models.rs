// ABOUTME: Domain records shared by persistence, aggregation, and HTTP layers
// ABOUTME: Defines users, ingredients, formulas, formula lines, categories, and reference entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Domain models
//!
//! Ingredient names and formula product names are unique per owner without
//! regard to case. The comparison key is derived by [`name_key`] and stored
//! next to the display name, so lookups never depend on database collation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Case-insensitive comparison key for a user-supplied name
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ingredient category, ordered for display
///
/// The discriminant is the display priority: meat first, colorants last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Category {
    /// Meat raw materials ("Cárnico")
    Meat = 1,
    /// Water and ice ("Agua/Hielo")
    WaterIce = 2,
    /// Binders, extenders and other non-meat ingredients ("Retenedor/No Cárnico")
    #[default]
    Binder = 3,
    /// Seasonings and additives ("Condimento/Aditivo")
    Seasoning = 4,
    /// Colorants ("Colorante")
    Colorant = 5,
}

impl Category {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Meat => "meat",
            Self::WaterIce => "water_ice",
            Self::Binder => "binder",
            Self::Seasoning => "seasoning",
            Self::Colorant => "colorant",
        }
    }

    /// Spanish label used on formula sheets
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Meat => "Cárnico",
            Self::WaterIce => "Agua/Hielo",
            Self::Binder => "Retenedor/No Cárnico",
            Self::Seasoning => "Condimento/Aditivo",
            Self::Colorant => "Colorante",
        }
    }

    /// Display priority, 1 sorts first
    #[must_use]
    pub const fn priority(&self) -> u8 {
        *self as u8
    }

    /// Parse a stored key or a Spanish label; anything unrecognized is a binder
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "meat" | "cárnico" | "carnico" => Self::Meat,
            "water_ice" | "agua/hielo" | "agua" | "hielo" => Self::WaterIce,
            "seasoning" | "condimento/aditivo" | "condimento" | "aditivo" => Self::Seasoning,
            "colorant" | "colorante" => Self::Colorant,
            _ => Self::Binder,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Nutritional and commercial attributes shared by base and user ingredients
///
/// Numeric fields are optional: a missing value contributes zero to every
/// computation instead of failing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IngredientAttributes {
    /// Display name, exactly as stored
    #[serde(alias = "nombre")]
    pub name: String,
    /// Protein content, percent of mass
    #[serde(default)]
    pub protein_percent: Option<f64>,
    /// Fat content, percent of mass
    #[serde(default)]
    pub fat_percent: Option<f64>,
    /// Water content, percent of mass
    #[serde(default)]
    pub water_percent: Option<f64>,
    /// Secondary "Ve" protein metric; stored and returned, never computed with
    #[serde(default, alias = "Ve_Protein_Percent")]
    pub ve_protein_percent: Option<f64>,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Process water absorbed per kg of ingredient
    #[serde(default)]
    pub water_retention_factor: Option<f64>,
    /// Recommended minimum usage, percent of formula
    #[serde(default)]
    pub min_usage_percent: Option<f64>,
    /// Recommended maximum usage, percent of formula
    #[serde(default)]
    pub max_usage_percent: Option<f64>,
    /// Price per kilogram
    #[serde(default, alias = "precio_por_kg")]
    pub price_per_kg: Option<f64>,
    /// Display category
    #[serde(default, alias = "categoria")]
    pub category: Category,
}

/// System-wide catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseIngredient {
    /// Unique identifier
    pub id: Uuid,
    /// Attributes copied into user catalogs on first use
    #[serde(flatten)]
    pub attributes: IngredientAttributes,
}

/// An ingredient in one user's private catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIngredient {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Nutritional and commercial attributes
    #[serde(flatten)]
    pub attributes: IngredientAttributes,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login name (an email address in practice)
    pub username: String,
    /// Display name
    pub full_name: Option<String>,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// A named recipe owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Product name, unique per owner regardless of case
    pub product_name: String,
    /// Free-text description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One formula line joined with the attributes of its resolved ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaLineView {
    /// Line identifier
    pub line_id: Uuid,
    /// Resolved user ingredient
    pub ingredient_id: Uuid,
    /// Ingredient display name
    pub ingredient_name: String,
    /// Quantity as entered
    pub quantity: f64,
    /// Unit as entered
    pub unit: String,
    /// Protein content, percent
    pub protein_percent: Option<f64>,
    /// Fat content, percent
    pub fat_percent: Option<f64>,
    /// Water content, percent
    pub water_percent: Option<f64>,
    /// Retained water coefficient
    pub water_retention_factor: Option<f64>,
    /// Price per kilogram
    pub price_per_kg: Option<f64>,
    /// Display category
    pub category: Category,
}

/// Entry in the shared technical reference library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Kind of source (book, article, regulation, ...)
    pub kind: Option<String>,
    /// Body text searched by keyword
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parses_spanish_labels() {
        assert_eq!(Category::parse("Cárnico"), Category::Meat);
        assert_eq!(Category::parse("Agua/Hielo"), Category::WaterIce);
        assert_eq!(Category::parse("Retenedor/No Cárnico"), Category::Binder);
        assert_eq!(Category::parse("Condimento/Aditivo"), Category::Seasoning);
        assert_eq!(Category::parse("colorante"), Category::Colorant);
    }

    #[test]
    fn test_category_unknown_defaults_to_binder() {
        assert_eq!(Category::parse(""), Category::Binder);
        assert_eq!(Category::parse("spice rack"), Category::Binder);
        assert_eq!(Category::default().priority(), 3);
    }

    #[test]
    fn test_category_round_trips_storage_key() {
        for category in [
            Category::Meat,
            Category::WaterIce,
            Category::Binder,
            Category::Seasoning,
            Category::Colorant,
        ] {
            assert_eq!(Category::parse(category.as_str()), category);
            assert_eq!(Category::parse(category.label()), category);
        }
    }

    #[test]
    fn test_attributes_accept_legacy_field_names() {
        let json = r#"{
            "nombre": "Pork Shoulder",
            "protein_percent": 18.5,
            "Ve_Protein_Percent": 16.0,
            "precio_por_kg": 4.2,
            "categoria": "Cárnico"
        }"#;
        let attrs: IngredientAttributes = serde_json::from_str(json).unwrap();
        assert_eq!(attrs.name, "Pork Shoulder");
        assert_eq!(attrs.ve_protein_percent, Some(16.0));
        assert_eq!(attrs.price_per_kg, Some(4.2));
        assert_eq!(attrs.category, Category::Meat);
        assert_eq!(attrs.fat_percent, None);
    }

    #[test]
    fn test_name_key_is_trimmed_lowercase() {
        assert_eq!(name_key("  Pork SHOULDER "), "pork shoulder");
        assert_eq!(name_key("CÁRNICO"), "cárnico");
    }
}
