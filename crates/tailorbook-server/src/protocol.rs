// Wire types for the JSON endpoint: POST bodies, GET query parameters, and
// the `{success, message?, ...payload}` response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tailorbook_core::model::{MeasurementInput, MeasurementReading};

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Every response body: a success flag, an optional human-readable message,
/// and the payload's fields inlined next to them.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            message: None,
            payload,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Payload for responses that carry nothing beyond the flag and message.
#[derive(Debug, Default, Serialize)]
pub struct NoPayload {}

#[derive(Debug, Serialize)]
pub struct MeasurementsPayload {
    pub measurements: Vec<MeasurementReading>,
}

#[derive(Debug, Serialize)]
pub struct CustomerCreated {
    pub customer_id: i64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// GET query string. Both ids must be present and non-blank to ask for
/// measurements; otherwise the request is an overview.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointQuery {
    pub customer_id: Option<String>,
    pub clothing_type_id: Option<String>,
}

impl EndpointQuery {
    /// `Some((customer_id, clothing_type_id))` when both are given.
    pub fn measurement_key(&self) -> Result<Option<(i64, i64)>, ApiError> {
        let given = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        match (given(&self.customer_id), given(&self.clothing_type_id)) {
            (Some(customer), Some(clothing)) => {
                let customer = parse_id(&customer, "customer_id")?;
                let clothing = parse_id(&clothing, "clothing_type_id")?;
                Ok(Some((customer, clothing)))
            }
            _ => Ok(None),
        }
    }
}

/// An id as clients send it: a JSON integer or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Int(i64),
    Text(String),
}

impl IdInput {
    fn resolve(&self, field: &str) -> Result<i64, ApiError> {
        match self {
            IdInput::Int(id) => Ok(*id),
            IdInput::Text(text) => parse_id(text, field),
        }
    }
}

/// A measurement value as clients send it. Form inputs arrive as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueInput {
    Number(f64),
    Text(String),
}

impl ValueInput {
    /// Blank strings clear the value; anything else must be a number.
    fn resolve(&self, measurement_id: i64) -> Result<Option<f64>, ApiError> {
        match self {
            ValueInput::Number(n) => Ok(Some(*n)),
            ValueInput::Text(text) if text.trim().is_empty() => Ok(None),
            ValueInput::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "value `{text}` for measurement {measurement_id} is not a number"
                    ))
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCustomerRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCustomerRequest {
    pub customer_id: Option<IdInput>,
}

impl DeleteCustomerRequest {
    pub fn customer_id(&self) -> Result<i64, ApiError> {
        self.customer_id
            .as_ref()
            .ok_or_else(|| ApiError::Validation("Customer ID is required".into()))?
            .resolve("customer_id")
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveMeasurementsRequest {
    pub customer_id: Option<IdInput>,
    pub clothing_type_id: Option<IdInput>,
    /// Kept raw so one malformed entry is skipped instead of failing the
    /// whole body.
    pub measurements: Option<Vec<Value>>,
}

/// A save request with ids resolved and entries converted.
#[derive(Debug, PartialEq)]
pub struct SaveBatch {
    pub customer_id: i64,
    pub clothing_type_id: i64,
    pub entries: Vec<MeasurementInput>,
    /// Entries dropped for missing fields.
    pub incomplete: usize,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    measurement_id: Option<IdInput>,
    value: Option<ValueInput>,
}

impl SaveMeasurementsRequest {
    pub fn into_batch(self) -> Result<SaveBatch, ApiError> {
        let (Some(customer_id), Some(clothing_type_id), Some(raw_entries)) =
            (self.customer_id, self.clothing_type_id, self.measurements)
        else {
            return Err(ApiError::Validation(
                "Customer ID, clothing type ID, and measurements are required".into(),
            ));
        };

        let customer_id = customer_id.resolve("customer_id")?;
        let clothing_type_id = clothing_type_id.resolve("clothing_type_id")?;

        let mut entries = Vec::with_capacity(raw_entries.len());
        let mut incomplete = 0;
        for raw in raw_entries {
            let Ok(RawEntry {
                measurement_id: Some(measurement_id),
                value: Some(value),
            }) = serde_json::from_value::<RawEntry>(raw)
            else {
                incomplete += 1;
                continue;
            };
            // An id that is not a number cannot be templated anywhere.
            let Ok(measurement_id) = measurement_id.resolve("measurement_id") else {
                incomplete += 1;
                continue;
            };
            entries.push(MeasurementInput {
                measurement_id,
                value: value.resolve(measurement_id)?,
            });
        }

        Ok(SaveBatch {
            customer_id,
            clothing_type_id,
            entries,
            incomplete,
        })
    }
}

fn parse_id(text: &str, field: &str) -> Result<i64, ApiError> {
    text.trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("{field} must be an integer")))
}
