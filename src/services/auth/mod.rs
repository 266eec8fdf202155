pub mod authorizer;
pub mod decision;
pub mod factory;
pub mod token;

pub use authorizer::Authorizer;
pub use decision::Decision;
pub use factory::build_authorizer;
pub use token::TokenCandidate;
