use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Per-IP limits for credential endpoints (`auth`) and everything behind a token (`api`).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub api: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            api: RateLimitRule::new(20, 40),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_rate_limit_config(&raw) {
                Ok(parsed) => cfg = cfg.apply_partial(parsed),
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    fn apply_partial(mut self, parsed: PartialRateLimitConfig) -> Self {
        if let Some(rule) = parsed.global {
            self.auth = rule;
            self.api = rule;
        }
        if let Some(rule) = parsed.auth {
            self.auth = rule;
        }
        if let Some(rule) = parsed.api {
            self.api = rule;
        }
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct PartialRateLimitConfig {
    global: Option<RateLimitRule>,
    auth: Option<RateLimitRule>,
    api: Option<RateLimitRule>,
}

fn parse_rate_limit_config(raw: &str) -> Result<PartialRateLimitConfig, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    // "10:20" applies to both groups.
    if !trimmed.contains('=') {
        let rule = parse_rule(trimmed)?;
        return Ok(PartialRateLimitConfig {
            global: Some(rule),
            ..Default::default()
        });
    }

    // "auth=5:10,api=20:40"
    let mut parsed = PartialRateLimitConfig::default();
    for item in trimmed.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, raw_rule) = item
            .split_once('=')
            .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
        let rule = parse_rule(raw_rule.trim())?;
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => parsed.auth = Some(rule),
            "api" | "protected" => parsed.api = Some(rule),
            other => {
                return Err(format!("unknown group '{}', expected auth/api", other));
            }
        }
    }

    Ok(parsed)
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 {
        return Err("per_second must be > 0".to_string());
    }
    if burst_size == 0 {
        return Err("burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_rule_applies_to_both_groups() {
        let parsed = parse_rate_limit_config("12:24").unwrap();
        let cfg = RateLimitConfig::default().apply_partial(parsed);
        assert_eq!(cfg.auth, RateLimitRule::new(12, 24));
        assert_eq!(cfg.api, RateLimitRule::new(12, 24));
    }

    #[test]
    fn grouped_rules() {
        let parsed = parse_rate_limit_config("auth=1:2, api=5:6").unwrap();
        assert_eq!(parsed.auth, Some(RateLimitRule::new(1, 2)));
        assert_eq!(parsed.api, Some(RateLimitRule::new(5, 6)));
    }

    #[test]
    fn grouped_rule_overrides_only_its_group() {
        let parsed = parse_rate_limit_config("auth=1:2").unwrap();
        let cfg = RateLimitConfig::default().apply_partial(parsed);
        assert_eq!(cfg.auth, RateLimitRule::new(1, 2));
        assert_eq!(cfg.api, RateLimitConfig::default().api);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(parse_rate_limit_config("0:5").is_err());
        assert!(parse_rate_limit_config("auth=abc").unwrap_err().contains("invalid rule"));
        assert!(parse_rate_limit_config("admin=1:1").unwrap_err().contains("unknown group"));
    }
}
