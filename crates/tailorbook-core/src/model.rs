// Domain types shared by the store and the HTTP layer.

use serde::{Deserialize, Serialize};

/// A registered customer of the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

impl Customer {
    /// Case-insensitive substring match on the customer name. The query is
    /// used as typed, so an empty query matches every customer and
    /// surrounding spaces must match too.
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Filter customers by name the same way the shop's UI search box does.
pub fn filter_customers<'a>(customers: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    customers.iter().filter(|c| c.matches(query)).collect()
}

/// A garment category (shirt, trousers, ...) with its own measurement template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingType {
    pub id: i64,
    pub name: String,
}

/// One named body dimension from the fixed measurement catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementDefinition {
    pub id: i64,
    pub name: String,
}

/// A templated measurement for one customer and clothing type, with the
/// stored value overlaid when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReading {
    pub measurement_id: i64,
    pub name: String,
    pub value: Option<f64>,
}

/// A single value to write. `value: None` clears the stored reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementInput {
    pub measurement_id: i64,
    pub value: Option<f64>,
}

/// Everything the landing view needs: all customers plus the clothing types
/// shown as buttons next to each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub customers: Vec<Customer>,
    pub clothing_types: Vec<ClothingType>,
}

/// Outcome of a measurement save batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    /// Rows inserted or updated.
    pub saved: usize,
    /// Entries dropped: incomplete ones, or ones whose measurement is not
    /// templated for the clothing type.
    pub skipped: usize,
}
