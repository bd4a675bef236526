//! Account, token and topic services
mod account_service;
mod message_service;
mod token_service;

pub use self::account_service::AccountService;
pub use self::message_service::MessageService;
pub use self::token_service::TokenService;
