mod difficulty;
mod ride;
mod route_type;

pub use difficulty::Difficulty;
pub use ride::{Ride, RideDetails};
pub use route_type::RouteType;
