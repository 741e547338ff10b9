pub mod models;

pub use models::{Artwork, ArtworkPatch, NewArtwork, Role, SessionUser};
