use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteType {
    Loop,
    #[serde(rename = "Out & Back")]
    OutAndBack,
    #[serde(rename = "Point to Point")]
    PointToPoint,
}

impl RouteType {
    pub const ALL: [RouteType; 3] = [
        RouteType::Loop,
        RouteType::OutAndBack,
        RouteType::PointToPoint,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RouteType::Loop => "Loop",
            RouteType::OutAndBack => "Out & Back",
            RouteType::PointToPoint => "Point to Point",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RouteType {
    type Err = String;

    /// Accepts the display labels as well as kebab-case forms
    /// (`out-and-back`, `point-to-point`) so they can be typed on a shell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loop" => Ok(RouteType::Loop),
            "out & back" | "out-and-back" | "out and back" => Ok(RouteType::OutAndBack),
            "point to point" | "point-to-point" => Ok(RouteType::PointToPoint),
            _ => Err(format!(
                "Invalid route type '{}'. Valid options: Loop, Out & Back, Point to Point",
                s
            )),
        }
    }
}
