//! Shared validation helpers used by both the config tree (`config::*`) and
//! the infrastructure config loader's post-parse re-validation pass.

use crate::ip_matcher::IpEntry;

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

pub fn validate_port(port: u16) -> Result<(), String> {
    if port == 0 {
        return Err("port must be in 1..=65535".into());
    }
    Ok(())
}

pub fn validate_bcrypt_hash(hash: &str) -> Result<(), String> {
    if BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p)) {
        Ok(())
    } else {
        Err("bcrypt hash must start with $2a$, $2b$, or $2y$".into())
    }
}

pub fn validate_ip_or_cidr_list(label: &str, entries: &[String]) -> Result<(), String> {
    for entry in entries {
        IpEntry::parse(entry).map_err(|e| format!("{label}: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_port() {
        assert!(validate_port(0).is_err());
        assert!(validate_port(1).is_ok());
    }

    #[test]
    fn accepts_only_known_bcrypt_prefixes() {
        assert!(validate_bcrypt_hash("$2b$12$abcdefghijklmnopqrstuv").is_ok());
        assert!(validate_bcrypt_hash("plaintext").is_err());
    }

    #[test]
    fn validates_ip_and_cidr_list() {
        assert!(validate_ip_or_cidr_list("x", &["10.0.0.1".into(), "10.0.0.0/8".into()]).is_ok());
        assert!(validate_ip_or_cidr_list("x", &["garbage".into()]).is_err());
    }
}
