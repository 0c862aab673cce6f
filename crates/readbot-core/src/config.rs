use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Telegram caps `getUpdates` at 100 updates per call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Long-poll window ceiling. teloxide's default HTTP client gives up after 17s,
/// so a longer poll turns every quiet period into a transport error.
pub const MAX_POLL_TIMEOUT_SECS: u64 = 15;

/// Typed process configuration.
///
/// Credentials and the storage location are required; everything else has a default.
#[derive(Clone, Debug)]
pub struct Config {
    // Required
    pub telegram_bot_token: String,
    pub database_url: String,

    // Polling
    pub batch_size: usize,
    pub poll_timeout: Duration,

    // Outbound throttling
    pub send_min_interval: Duration,
    pub chat_min_interval: Duration,
}

impl Config {
    /// Load from the process environment, after an optional `.env` file.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let database_url = get("DATABASE_URL").ok_or_else(|| {
            Error::Config("DATABASE_URL environment variable is required".to_string())
        })?;

        let batch_size = parse_num::<usize>(&get, "BATCH_SIZE")?
            .unwrap_or(MAX_BATCH_SIZE)
            .clamp(1, MAX_BATCH_SIZE);
        let poll_timeout_secs = parse_num(&get, "POLL_TIMEOUT_SECS")?.unwrap_or(10);
        if poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "POLL_TIMEOUT_SECS must be at most {MAX_POLL_TIMEOUT_SECS}, got {poll_timeout_secs}"
            )));
        }
        let poll_timeout = Duration::from_secs(poll_timeout_secs);

        let send_min_interval =
            Duration::from_millis(parse_num(&get, "SEND_MIN_INTERVAL_MS")?.unwrap_or(40));
        let chat_min_interval =
            Duration::from_millis(parse_num(&get, "CHAT_MIN_INTERVAL_MS")?.unwrap_or(1050));

        Ok(Self {
            telegram_bot_token,
            database_url,
            batch_size,
            poll_timeout,
            send_min_interval,
            chat_min_interval,
        })
    }
}

fn parse_num<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_values_set() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("DATABASE_URL", "sqlite://pages.db"),
        ]))
        .unwrap();

        assert_eq!(cfg.telegram_bot_token, "123:abc");
        assert_eq!(cfg.database_url, "sqlite://pages.db");
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.poll_timeout, Duration::from_secs(10));
        assert_eq!(cfg.send_min_interval, Duration::from_millis(40));
        assert_eq!(cfg.chat_min_interval, Duration::from_millis(1050));
    }

    #[test]
    fn missing_token_is_config_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "sqlite://x.db")])).unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn blank_database_url_is_config_error() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("DATABASE_URL", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("DATABASE_URL")));
    }

    #[test]
    fn batch_size_is_clamped() {
        let base = [("TELEGRAM_BOT_TOKEN", "t"), ("DATABASE_URL", "d")];

        let big = Config::from_lookup(lookup(&[base[0], base[1], ("BATCH_SIZE", "500")])).unwrap();
        assert_eq!(big.batch_size, 100);

        let zero = Config::from_lookup(lookup(&[base[0], base[1], ("BATCH_SIZE", "0")])).unwrap();
        assert_eq!(zero.batch_size, 1);
    }

    #[test]
    fn poll_timeout_above_http_timeout_is_rejected() {
        let base = [("TELEGRAM_BOT_TOKEN", "t"), ("DATABASE_URL", "d")];

        let err = Config::from_lookup(lookup(&[base[0], base[1], ("POLL_TIMEOUT_SECS", "60")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("at most 15")));

        let max = Config::from_lookup(lookup(&[base[0], base[1], ("POLL_TIMEOUT_SECS", "15")]))
            .unwrap();
        assert_eq!(max.poll_timeout, Duration::from_secs(15));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("DATABASE_URL", "d"),
            ("POLL_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("POLL_TIMEOUT_SECS")));
    }

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# comment\nTELEGRAM_BOT_TOKEN=\"abc\"\n\nDATABASE_URL = 'sqlite://a.db'\nbroken\n=nokey\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TELEGRAM_BOT_TOKEN".to_string(), "abc".to_string()),
                ("DATABASE_URL".to_string(), "sqlite://a.db".to_string()),
            ]
        );
    }
}
