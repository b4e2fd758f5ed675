mod distance;
mod locator;

pub use distance::{haversine_km, EARTH_RADIUS_KM};
pub use locator::{rank_by_distance, NearbyDrop, NearbyLocator, NearbyQuery};
