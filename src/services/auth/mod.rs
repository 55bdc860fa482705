pub mod factory;
pub mod gate;
pub mod jwt;
pub mod password;

pub use factory::build_jwt_service;
pub use gate::{GateError, VerifiedAccessToken, authorize};
pub use jwt::{JwtService, TokenVerifier};
