//! Dose units and their conversion into a common basis.
//!
//! Amounts are summed in micrograms-equivalent whenever a unit has a
//! canonical factor. Weight units sit on a ×1000 ladder and can be promoted
//! to a larger unit for display; substance-specific millilitres and Alcohol
//! units convert to micrograms through a density, but keep their own display
//! unit. Literal millilitres, counts and unrecognized tokens have no
//! conversion and are only ever summed with themselves.

use crate::config::UnitsConfig;
use once_cell::sync::Lazy;

/// Units on the microgram → kilogram ladder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeightUnit {
    Microgram,
    Milligram,
    Gram,
    Kilogram,
}

impl WeightUnit {
    /// Micrograms per one of this unit
    pub fn factor(self) -> f64 {
        match self {
            WeightUnit::Microgram => 1.0,
            WeightUnit::Milligram => 1_000.0,
            WeightUnit::Gram => 1_000_000.0,
            WeightUnit::Kilogram => 1_000_000_000.0,
        }
    }

    /// The next unit up the ladder, if any
    pub fn next(self) -> Option<WeightUnit> {
        match self {
            WeightUnit::Microgram => Some(WeightUnit::Milligram),
            WeightUnit::Milligram => Some(WeightUnit::Gram),
            WeightUnit::Gram => Some(WeightUnit::Kilogram),
            WeightUnit::Kilogram => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Microgram => "μg",
            WeightUnit::Milligram => "mg",
            WeightUnit::Gram => "g",
            WeightUnit::Kilogram => "kg",
        }
    }
}

/// Liquids whose millilitres convert to weight through a known density
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Liquid {
    Ethanol,
    Ghb,
    Gbl,
    Bdo,
}

/// A resolved dose unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoseUnit {
    /// Empty or unrecognized token; displays the raw token text instead
    Default,
    Weight(WeightUnit),
    /// Substance-specific millilitres
    Density(Liquid),
    /// One Alcohol unit (a fixed volume of ethanol)
    StandardDrink,
    /// Millilitres of something without a known density
    Millilitre,
    /// Tablets, tabs, hits ("x")
    Count,
}

impl DoseUnit {
    /// Display label; empty for the default unit
    pub fn label(self) -> &'static str {
        match self {
            DoseUnit::Default => "",
            DoseUnit::Weight(w) => w.label(),
            DoseUnit::Density(_) | DoseUnit::Millilitre => "mL",
            DoseUnit::StandardDrink => "u",
            DoseUnit::Count => "x",
        }
    }
}

static STANDARD_TABLE: Lazy<UnitTable> = Lazy::new(|| UnitTable::new(&UnitsConfig::default()));

/// Conversion factors for the units that have one
#[derive(Clone, Debug, PartialEq)]
pub struct UnitTable {
    ethanol_ml: f64,
    ghb_ml: f64,
    gbl_ml: f64,
    bdo_ml: f64,
    alcohol_unit: f64,
}

impl UnitTable {
    /// Build a table from configured constants
    pub fn new(config: &UnitsConfig) -> Self {
        let mg = WeightUnit::Milligram.factor();
        Self {
            ethanol_ml: config.ethanol_mg_per_ml * mg,
            ghb_ml: config.ghb_mg_per_ml * mg,
            gbl_ml: config.gbl_mg_per_ml * mg,
            bdo_ml: config.bdo_mg_per_ml * mg,
            alcohol_unit: config.alcohol_unit_ml * config.ethanol_mg_per_ml * mg,
        }
    }

    /// The table built from default constants
    pub fn standard() -> &'static UnitTable {
        &STANDARD_TABLE
    }

    /// Resolve a unit token in the context of a substance
    ///
    /// Substance names are matched case-insensitively, since drug names are
    /// title-cased on entry (`"ghb"` becomes `"Ghb"`).
    pub fn resolve(&self, drug: &str, token: &str) -> DoseUnit {
        let drug = drug.to_lowercase();
        match token {
            "μg" | "µg" => DoseUnit::Weight(WeightUnit::Microgram),
            "mg" => DoseUnit::Weight(WeightUnit::Milligram),
            "g" => DoseUnit::Weight(WeightUnit::Gram),
            "kg" => DoseUnit::Weight(WeightUnit::Kilogram),
            "x" => DoseUnit::Count,
            "u" if drug == "alcohol" => DoseUnit::StandardDrink,
            "mL" => match drug.as_str() {
                "ethanol" | "etoh" => DoseUnit::Density(Liquid::Ethanol),
                "ghb" => DoseUnit::Density(Liquid::Ghb),
                "gbl" => DoseUnit::Density(Liquid::Gbl),
                "bdo" | "1,4-bdo" | "14bdo" => DoseUnit::Density(Liquid::Bdo),
                _ => DoseUnit::Millilitre,
            },
            _ => DoseUnit::Default,
        }
    }

    /// Micrograms-equivalent per one unit, if the unit converts at all
    pub fn canonical_factor(&self, unit: DoseUnit) -> Option<f64> {
        match unit {
            DoseUnit::Weight(w) => Some(w.factor()),
            DoseUnit::Density(Liquid::Ethanol) => Some(self.ethanol_ml),
            DoseUnit::Density(Liquid::Ghb) => Some(self.ghb_ml),
            DoseUnit::Density(Liquid::Gbl) => Some(self.gbl_ml),
            DoseUnit::Density(Liquid::Bdo) => Some(self.bdo_ml),
            DoseUnit::StandardDrink => Some(self.alcohol_unit),
            DoseUnit::Default | DoseUnit::Millilitre | DoseUnit::Count => None,
        }
    }
}
