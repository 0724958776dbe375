pub mod frustum;
