use anyhow::Result;
use std::env;

const DEV_SECRET: &str = "your-super-secret-key-minimum-32-characters-long-for-security";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_seconds: u64, // 7 days
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = match env::var("JWT_SECRET") {
            Ok(secret) => {
                if secret.len() < 32 {
                    return Err(anyhow::anyhow!(
                        "JWT_SECRET must be at least 32 characters"
                    ));
                }
                secret
            }
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, using the built-in development secret");
                DEV_SECRET.to_string()
            }
        };

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "SupportSystem".to_string());
        let audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "SupportSystemClients".to_string());

        let expiry_seconds = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(604800);

        Ok(Self {
            secret,
            issuer,
            audience,
            expiry_seconds,
        })
    }
}
