use serde::{Deserialize, Serialize};
use std::fmt;

use super::difficulty::Difficulty;
use super::route_type::RouteType;
use crate::ride_id::RideId;

/// Everything about a ride except its identifier. This is what gets sent
/// to the remote collection on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideDetails {
    pub area: String,
    pub time_to_drive: String,
    pub trail_name: String,
    pub difficulty: Difficulty,
    pub distance: String,
    pub elevation: String,
    pub route_type: RouteType,
    pub rating: u8,
    #[serde(default)]
    pub review_link: String,
    #[serde(default)]
    pub notes: String,
}

impl RideDetails {
    pub fn new(
        area: impl Into<String>,
        trail_name: impl Into<String>,
        difficulty: Difficulty,
        route_type: RouteType,
    ) -> Self {
        Self {
            area: area.into(),
            time_to_drive: String::new(),
            trail_name: trail_name.into(),
            difficulty,
            distance: String::new(),
            elevation: String::new(),
            route_type,
            rating: 5,
            review_link: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_time_to_drive(mut self, time_to_drive: impl Into<String>) -> Self {
        self.time_to_drive = time_to_drive.into();
        self
    }

    pub fn with_distance(mut self, distance: impl Into<String>) -> Self {
        self.distance = distance.into();
        self
    }

    pub fn with_elevation(mut self, elevation: impl Into<String>) -> Self {
        self.elevation = elevation.into();
        self
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_review_link(mut self, review_link: impl Into<String>) -> Self {
        self.review_link = review_link.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Attach an identifier, producing a persisted ride.
    pub fn into_ride(self, id: RideId) -> Ride {
        Ride {
            id: Some(id),
            details: self,
        }
    }
}

/// A catalogued ride. `id` is `None` until the remote collection assigns one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RideId>,
    #[serde(flatten)]
    pub details: RideDetails,
}

impl Ride {
    /// A ride that has not been persisted yet.
    pub fn unsaved(details: RideDetails) -> Self {
        Self { id: None, details }
    }

    /// The identifier, if it is present and non-blank.
    pub fn persisted_id(&self) -> Option<&RideId> {
        self.id.as_ref().filter(|id| !id.is_blank())
    }

    pub fn has_id(&self, id: &RideId) -> bool {
        self.id.as_ref() == Some(id)
    }
}

impl fmt::Display for Ride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.details;
        writeln!(f, "{}", d.trail_name)?;
        writeln!(f, "{}", "=".repeat(d.trail_name.chars().count()))?;

        if let Some(id) = &self.id {
            writeln!(f, "ID: {}", id)?;
        }
        writeln!(f, "Area: {}", d.area)?;
        if !d.time_to_drive.is_empty() {
            writeln!(f, "Time to drive: {}", d.time_to_drive)?;
        }
        writeln!(f, "Difficulty: {}", d.difficulty)?;
        writeln!(f, "Distance: {}", d.distance)?;
        writeln!(f, "Elevation: {}", d.elevation)?;
        writeln!(f, "Route type: {}", d.route_type)?;
        writeln!(f, "Rating: {}/5", d.rating)?;

        if !d.review_link.is_empty() {
            writeln!(f, "Review: {}", d.review_link)?;
        }
        if !d.notes.is_empty() {
            writeln!(f, "\nNotes:\n{}", d.notes)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ridge_loop() -> RideDetails {
        RideDetails::new("Everstoke", "Ridge Loop", Difficulty::Easy, RouteType::Loop)
            .with_distance("5 miles")
            .with_elevation("500 ft")
            .with_rating(4)
            .with_time_to_drive("20 minutes")
    }

    #[test]
    fn test_details_defaults() {
        let details = RideDetails::new("Area", "Trail", Difficulty::Easy, RouteType::Loop);
        assert_eq!(details.rating, 5);
        assert!(details.review_link.is_empty());
        assert!(details.notes.is_empty());
    }

    #[test]
    fn test_json_uses_camel_case_and_flattens_id() {
        let ride = ridge_loop().into_ride(RideId::parse("abc123").unwrap());
        let value = serde_json::to_value(&ride).unwrap();

        assert_eq!(value["id"], "abc123");
        assert_eq!(value["trailName"], "Ridge Loop");
        assert_eq!(value["timeToDrive"], "20 minutes");
        assert_eq!(value["routeType"], "Loop");
        assert_eq!(value["rating"], 4);
    }

    #[test]
    fn test_unsaved_ride_omits_id() {
        let ride = Ride::unsaved(ridge_loop());
        let value = serde_json::to_value(&ride).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_missing_optional_text_fields_default_to_empty() {
        let json = r#"{
            "area": "Everstoke",
            "timeToDrive": "",
            "trailName": "Ridge Loop",
            "difficulty": "Easy",
            "distance": "5 miles",
            "elevation": "500 ft",
            "routeType": "Out & Back",
            "rating": 3
        }"#;
        let ride: Ride = serde_json::from_str(json).unwrap();
        assert!(ride.id.is_none());
        assert_eq!(ride.details.route_type, RouteType::OutAndBack);
        assert!(ride.details.notes.is_empty());
    }

    #[test]
    fn test_persisted_id_ignores_blank() {
        let ride: Ride = serde_json::from_str(
            r#"{"id":"","area":"A","timeToDrive":"","trailName":"T","difficulty":"Easy",
                "distance":"1 mi","elevation":"1 ft","routeType":"Loop","rating":1}"#,
        )
        .unwrap();
        assert!(ride.id.is_some());
        assert!(ride.persisted_id().is_none());
    }

    #[test]
    fn test_ride_display() {
        let ride = ridge_loop()
            .with_notes("Fast and flowy")
            .into_ride(RideId::parse("abc123").unwrap());
        let output = format!("{}", ride);
        assert!(output.contains("Ridge Loop"));
        assert!(output.contains("Area: Everstoke"));
        assert!(output.contains("Rating: 4/5"));
        assert!(output.contains("Fast and flowy"));
    }
}
