pub mod decimal;
pub mod password;
pub mod sanitize;
pub mod token;
