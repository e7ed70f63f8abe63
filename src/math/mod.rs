pub mod bounds;
pub mod frustum;
pub mod plane;
