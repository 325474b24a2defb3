use std::{
    env,
    net::{AddrParseError, SocketAddr},
};

use core_sim::SimConfig;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATA_PATH: &str = "data/scenarios.json";
const ADDR_KEY: &str = "TIME_MACHINE_ADDR";
const DATA_PATH_KEY: &str = "TIME_MACHINE_DATA_PATH";
const TICK_MS_KEY: &str = "TIME_MACHINE_TICK_MS";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub data_path: String,
    pub tick_interval_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TIME_MACHINE_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("TIME_MACHINE_DATA_PATH must not be empty or whitespace")]
    InvalidDataPath,
    #[error("TIME_MACHINE_TICK_MS must be a whole number of milliseconds greater than 0")]
    InvalidTickInterval,
    #[error("{0} contains non-unicode data")]
    NonUnicode(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ADDR_KEY)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => default_listen_addr(),
        };

        let data_path = match read_env(DATA_PATH_KEY)? {
            Some(value) => {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidDataPath);
                }
                value
            }
            None => DEFAULT_DATA_PATH.to_owned(),
        };

        let tick_interval_ms = match read_env(TICK_MS_KEY)? {
            Some(value) => match value.parse::<u64>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => return Err(ConfigError::InvalidTickInterval),
            },
            None => SimConfig::default().tick_interval_ms,
        };

        Ok(Self {
            listen_addr,
            data_path,
            tick_interval_ms,
        })
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig::with_tick_interval_ms(self.tick_interval_ms)
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn default_listen_addr() -> SocketAddr {
    DEFAULT_LISTEN_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)))
}

#[cfg(test)]
mod tests {
    use std::{env, sync::Mutex};

    use super::{Config, ConfigError, ADDR_KEY, DATA_PATH_KEY, TICK_MS_KEY};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<std::ffi::OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }

        #[cfg(unix)]
        fn set_os(key: &'static str, value: std::ffi::OsString) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.take() {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    fn reset_config_env_baseline() -> [EnvVarGuard; 3] {
        [
            EnvVarGuard::unset(ADDR_KEY),
            EnvVarGuard::unset(DATA_PATH_KEY),
            EnvVarGuard::unset(TICK_MS_KEY),
        ]
    }

    #[test]
    fn defaults_when_env_is_unset() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.data_path, "data/scenarios.json");
        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.sim_config().starting_capital, 10_000.0);
    }

    #[test]
    fn uses_overrides_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _addr = EnvVarGuard::set(ADDR_KEY, "127.0.0.1:9090");
        let _path = EnvVarGuard::set(DATA_PATH_KEY, "/srv/eras.json");
        let _tick = EnvVarGuard::set(TICK_MS_KEY, "250");

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.data_path, "/srv/eras.json");
        assert_eq!(config.sim_config().tick_interval_ms, 250);
    }

    #[test]
    fn returns_error_for_invalid_listen_address_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ADDR_KEY, "not-an-addr");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidListenAddr(_)));
    }

    #[test]
    fn returns_error_for_whitespace_data_path() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(DATA_PATH_KEY, "   ");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidDataPath));
    }

    #[test]
    fn rejects_zero_and_non_numeric_tick_intervals() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        for bad in ["0", "-5", "fast", "1.5"] {
            let _guard = EnvVarGuard::set(TICK_MS_KEY, bad);
            let err = Config::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTickInterval), "{bad} accepted");
        }
    }

    #[cfg(unix)]
    #[test]
    fn returns_error_for_non_unicode_env_var() {
        use std::os::unix::ffi::OsStringExt;

        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set_os(
            DATA_PATH_KEY,
            std::ffi::OsString::from_vec(vec![0x66, 0x6f, 0x80]),
        );

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::NonUnicode(DATA_PATH_KEY)));
        assert_eq!(
            err.to_string(),
            "TIME_MACHINE_DATA_PATH contains non-unicode data"
        );
    }
}
