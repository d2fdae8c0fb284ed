pub mod credentials;
pub mod email;
pub mod providers;
pub mod session;
pub mod signout;
