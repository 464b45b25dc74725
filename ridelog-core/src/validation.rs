//! Declarative validation schema for ride input.
//!
//! Input arrives as a [`RideForm`] of plain strings. Each field has an
//! ordered list of rules; the first rule a field fails produces its error
//! message, and every failing field is reported together.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationError};
use crate::models::{Difficulty, RideDetails, RouteType};

static DISTANCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\d+(\.\d+)?\s*(miles?|mi|km|kilometers?)?$").unwrap()
});

// Digits may be grouped with commas, which is how elevations are displayed.
static ELEVATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,3}(,\d{3})+|\d+)\s*(ft|feet|m|meters?)?$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$").unwrap()
});

/// One check applied to a field value.
pub enum Rule {
    Required(&'static str),
    MinLength(usize, &'static str),
    Pattern(&'static Lazy<Regex>, &'static str),
    Integer(&'static str),
    Min(i64, &'static str),
    Max(i64, &'static str),
    Custom(fn(&str) -> bool, &'static str),
}

impl Rule {
    /// Returns the rule's message when `value` fails it.
    fn check(&self, value: &str) -> Option<&'static str> {
        let passes = match self {
            Rule::Required(_) => !value.trim().is_empty(),
            Rule::MinLength(min, _) => value.trim().chars().count() >= *min,
            Rule::Pattern(regex, _) => regex.is_match(value.trim()),
            Rule::Integer(_) => value.trim().parse::<i64>().is_ok(),
            Rule::Min(min, _) => value.trim().parse::<i64>().is_ok_and(|v| v >= *min),
            Rule::Max(max, _) => value.trim().parse::<i64>().is_ok_and(|v| v <= *max),
            Rule::Custom(predicate, _) => predicate(value),
        };
        if passes {
            None
        } else {
            Some(self.message())
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Rule::Required(m)
            | Rule::MinLength(_, m)
            | Rule::Pattern(_, m)
            | Rule::Integer(m)
            | Rule::Min(_, m)
            | Rule::Max(_, m)
            | Rule::Custom(_, m) => m,
        }
    }
}

/// The rules for a single form field.
pub struct FieldRules {
    pub field: &'static str,
    pub value: fn(&RideForm) -> &str,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required(_)))
    }

    fn evaluate(&self, form: &RideForm) -> Option<FieldError> {
        let value = (self.value)(form);
        // Optional fields are only checked when filled in
        if !self.is_required() && value.trim().is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find_map(|rule| rule.check(value))
            .map(|message| FieldError {
                field: self.field,
                message: message.to_string(),
            })
    }
}

/// The ride schema.
pub static RIDE_SCHEMA: Lazy<Vec<FieldRules>> = Lazy::new(|| {
    vec![
        FieldRules {
            field: "area",
            value: |f| f.area.as_str(),
            rules: vec![
                Rule::Required("Area is required"),
                Rule::MinLength(2, "Area must be at least 2 characters"),
            ],
        },
        FieldRules {
            field: "trailName",
            value: |f| f.trail_name.as_str(),
            rules: vec![
                Rule::Required("Trail name is required"),
                Rule::MinLength(2, "Trail name must be at least 2 characters"),
            ],
        },
        FieldRules {
            field: "difficulty",
            value: |f| f.difficulty.as_str(),
            rules: vec![
                Rule::Required("Difficulty is required"),
                Rule::Custom(
                    |v| v.parse::<Difficulty>().is_ok(),
                    "Invalid difficulty level",
                ),
            ],
        },
        FieldRules {
            field: "distance",
            value: |f| f.distance.as_str(),
            rules: vec![
                Rule::Required("Distance is required"),
                Rule::Pattern(
                    &DISTANCE_REGEX,
                    "Please enter a valid distance (e.g., 10 miles, 5.5 km)",
                ),
            ],
        },
        FieldRules {
            field: "elevation",
            value: |f| f.elevation.as_str(),
            rules: vec![
                Rule::Required("Elevation is required"),
                Rule::Pattern(
                    &ELEVATION_REGEX,
                    "Please enter a valid elevation (e.g., 1200 ft, 500m)",
                ),
            ],
        },
        FieldRules {
            field: "routeType",
            value: |f| f.route_type.as_str(),
            rules: vec![
                Rule::Required("Route type is required"),
                Rule::Custom(|v| v.parse::<RouteType>().is_ok(), "Invalid route type"),
            ],
        },
        FieldRules {
            field: "rating",
            value: |f| f.rating.as_str(),
            rules: vec![
                Rule::Required("Rating is required"),
                Rule::Integer("Rating must be a whole number"),
                Rule::Min(1, "Minimum rating is 1"),
                Rule::Max(5, "Maximum rating is 5"),
            ],
        },
        FieldRules {
            field: "reviewLink",
            value: |f| f.review_link.as_str(),
            rules: vec![Rule::Pattern(&URL_REGEX, "Please enter a valid URL")],
        },
    ]
});

/// Raw ride input, one string per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RideForm {
    pub area: String,
    pub time_to_drive: String,
    pub trail_name: String,
    pub difficulty: String,
    pub distance: String,
    pub elevation: String,
    pub route_type: String,
    pub rating: String,
    pub review_link: String,
    pub notes: String,
}

impl Default for RideForm {
    fn default() -> Self {
        Self {
            area: String::new(),
            time_to_drive: String::new(),
            trail_name: String::new(),
            difficulty: String::new(),
            distance: String::new(),
            elevation: String::new(),
            route_type: String::new(),
            rating: "5".to_string(),
            review_link: String::new(),
            notes: String::new(),
        }
    }
}

impl RideForm {
    /// Every schema violation, in schema order.
    pub fn errors(&self) -> Vec<FieldError> {
        RIDE_SCHEMA
            .iter()
            .filter_map(|rules| rules.evaluate(self))
            .collect()
    }

    /// Check the form and convert it into typed ride details.
    pub fn validate(&self) -> Result<RideDetails, ValidationError> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(ValidationError::Fields(errors));
        }

        let invalid = |field: &'static str, message: String| {
            ValidationError::Fields(vec![FieldError { field, message }])
        };

        Ok(RideDetails {
            area: self.area.trim().to_string(),
            time_to_drive: self.time_to_drive.trim().to_string(),
            trail_name: self.trail_name.trim().to_string(),
            difficulty: self
                .difficulty
                .parse()
                .map_err(|e| invalid("difficulty", e))?,
            distance: self.distance.trim().to_string(),
            elevation: self.elevation.trim().to_string(),
            route_type: self
                .route_type
                .parse()
                .map_err(|e| invalid("routeType", e))?,
            rating: self
                .rating
                .trim()
                .parse()
                .map_err(|_| invalid("rating", "Rating must be a whole number".to_string()))?,
            review_link: self.review_link.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

impl From<&RideDetails> for RideForm {
    fn from(details: &RideDetails) -> Self {
        Self {
            area: details.area.clone(),
            time_to_drive: details.time_to_drive.clone(),
            trail_name: details.trail_name.clone(),
            difficulty: details.difficulty.to_string(),
            distance: details.distance.clone(),
            elevation: details.elevation.clone(),
            route_type: details.route_type.to_string(),
            rating: details.rating.to_string(),
            review_link: details.review_link.clone(),
            notes: details.notes.clone(),
        }
    }
}

impl RideDetails {
    /// Re-check typed details against the schema, so values built in code
    /// (e.g. a rating of 0) are rejected the same way form input is.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let errors = RideForm::from(self).errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(errors))
        }
    }
}
