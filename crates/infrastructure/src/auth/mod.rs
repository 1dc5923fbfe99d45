mod bcrypt_verifier;
mod hmac_token_issuer;

pub use bcrypt_verifier::BcryptCredentialVerifier;
pub use hmac_token_issuer::HmacTokenIssuer;
