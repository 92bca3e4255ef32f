mod env;
pub use env::EnvCredentialProvider;

mod config;
pub use config::ConfigCredentialProvider;

mod static_provider;
pub use static_provider::StaticCredentialProvider;
