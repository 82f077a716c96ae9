pub mod derive;
pub mod geo;
pub mod normalize;
pub mod output;
pub mod service;
pub mod store;
