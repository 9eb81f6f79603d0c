mod grant;
mod models;
mod viewer;

pub use grant::Grant;
pub use models::*;
pub use viewer::Viewer;
