//! Credential source adapters.

mod laravel_credentials;

pub use laravel_credentials::LaravelCredentialSource;
