mod track_file;
mod types;
mod validator;

pub use track_file::TrackFileConnector;
pub use types::{TrackLayout, TrackMetadata};
pub use validator::TrackValidator;
