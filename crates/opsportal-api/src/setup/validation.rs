//! Configuration validation
//!
//! `Config::validate` rejects configurations that cannot work at all. The checks
//! here cover settings that would run but are unsafe or unusual.

use anyhow::Result;
use opsportal_core::Config;

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.jwt_secret() == config.master_api_key() {
        return Err(anyhow::anyhow!(
            "JWT_SECRET and MASTER_API_KEY must differ"
        ));
    }

    if config.request_body_limit_bytes() == 0 {
        return Err(anyhow::anyhow!("Request body limit cannot be 0"));
    }

    if config.idempotency_ttl_secs() == 0 {
        tracing::warn!("IDEMPOTENCY_TTL_SECS is 0 - retried time entries will be logged twice");
    }

    if is_production && config.jwt_secret().len() < 64 {
        tracing::warn!(
            "JWT secret is shorter than 64 characters - consider using a longer secret"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsportal_core::BaseConfig;

    fn config(jwt_secret: &str, master_api_key: &str) -> Config {
        Config {
            base: BaseConfig {
                server_port: 3000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: 30,
                jwt_secret: jwt_secret.to_string(),
                master_api_key: master_api_key.to_string(),
                environment: "test".to_string(),
                http_concurrency_limit: 100,
                request_timeout_secs: 60,
                request_body_limit_bytes: 65_536,
                idempotency_ttl_secs: 86_400,
            },
            database_url: "postgres://localhost/opsportal".to_string(),
        }
    }

    #[test]
    fn test_distinct_secrets_pass() {
        let cfg = config(
            "jwt-secret-that-is-at-least-32-characters",
            "master-key-that-is-at-least-32-characters",
        );
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_shared_secret_rejected() {
        let secret = "shared-secret-that-is-at-least-32-characters";
        assert!(validate_config(&config(secret, secret)).is_err());
    }
}
