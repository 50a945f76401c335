//! Track catalog: the `Track` model and the directory scanner that builds it.

mod display;
mod model;
mod scan;

pub use display::display_from_fields;
pub use model::Track;
pub use scan::scan;
