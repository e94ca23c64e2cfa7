mod cards;
mod collection;
mod misc;
mod packs;
mod stripe;
mod user;

pub use cards::card_routes;
pub use collection::collection_routes;
pub use misc::misc_routes;
pub use packs::pack_routes;
pub use stripe::stripe_routes;
pub use user::user_routes;
