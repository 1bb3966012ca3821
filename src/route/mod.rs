pub mod assistant;
pub mod auth;
pub mod card;
pub mod docs;
pub mod model;
pub mod post;
pub mod preferences;
pub mod visit;
