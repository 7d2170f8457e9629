pub mod routes;

pub use routes::auth_routes;
