//! Firestore REST document encoding.
//!
//! Documents carry their fields as typed values:
//! `{"fields": {"trailName": {"stringValue": "Ridge Loop"}, "rating": {"integerValue": "4"}}}`.
//! Integers travel as decimal strings.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::RemoteError;
use crate::models::{Difficulty, Ride, RideDetails, RouteType};
use crate::ride_id::RideId;

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;

/// A document as returned by Firestore.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

/// Response of a collection list call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    pub next_page_token: Option<String>,
}

/// One element of a `runQuery` response stream. Elements without a
/// document only report progress.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResult {
    pub document: Option<RawDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: String,
}

/// Request body carrying every ride field except the identifier.
pub(crate) fn encode_fields(details: &RideDetails) -> Value {
    json!({
        "fields": {
            "area": { "stringValue": details.area },
            "timeToDrive": { "stringValue": details.time_to_drive },
            "trailName": { "stringValue": details.trail_name },
            "difficulty": { "stringValue": details.difficulty.label() },
            "distance": { "stringValue": details.distance },
            "elevation": { "stringValue": details.elevation },
            "routeType": { "stringValue": details.route_type.label() },
            "rating": { "integerValue": details.rating.to_string() },
            "reviewLink": { "stringValue": details.review_link },
            "notes": { "stringValue": details.notes },
        }
    })
}

/// Structured query selecting rides by exact area.
pub(crate) fn area_query(collection: &str, area: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "area" },
                    "op": "EQUAL",
                    "value": { "stringValue": area }
                }
            }
        }
    })
}

impl RawDocument {
    pub fn into_ride(self) -> Result<Ride, RemoteError> {
        let id = RideId::from_document_name(&self.name)
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        let missing =
            |field: &str| RemoteError::Decode(format!("document {}: missing field {}", id, field));

        let text = |field: &str| -> Result<String, RemoteError> {
            self.fields
                .get(field)
                .and_then(string_value)
                .ok_or_else(|| missing(field))
        };
        let optional_text = |field: &str| -> String {
            self.fields
                .get(field)
                .and_then(string_value)
                .unwrap_or_default()
        };

        let difficulty: Difficulty = text("difficulty")?
            .parse()
            .map_err(|e: String| RemoteError::Decode(format!("document {}: {}", id, e)))?;
        let route_type: RouteType = text("routeType")?
            .parse()
            .map_err(|e: String| RemoteError::Decode(format!("document {}: {}", id, e)))?;
        let rating = self
            .fields
            .get("rating")
            .and_then(integer_value)
            .ok_or_else(|| missing("rating"))?;
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| {
                RemoteError::Decode(format!("document {}: rating {} out of range", id, rating))
            })?;

        let details = RideDetails {
            area: text("area")?,
            time_to_drive: optional_text("timeToDrive"),
            trail_name: text("trailName")?,
            difficulty,
            distance: text("distance")?,
            elevation: text("elevation")?,
            route_type,
            rating,
            review_link: optional_text("reviewLink"),
            notes: optional_text("notes"),
        };
        Ok(details.into_ride(id))
    }
}

fn string_value(value: &Value) -> Option<String> {
    value
        .get("stringValue")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn integer_value(value: &Value) -> Option<i64> {
    if let Some(v) = value.get("integerValue") {
        return match v {
            Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        };
    }
    // Clients that wrote the rating as a double still produce a usable value
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64)
}
