//! Server configuration read from the environment.

use std::time::Duration;

use addrctl_schema::SyncOptions;
use addrctl_worker::BackoffPolicy;

const DEFAULT_RESYNC: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
	#[error("required variable `{0}` is not set")]
	Missing(&'static str),
	#[error("variable `{var}` has invalid value `{value}`")]
	Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerOptions {
	/// Namespace the server operates in.
	pub namespace: String,
	pub resync_interval: Duration,
	pub enable_rbac: bool,
	/// Identity store calls are issued as, when set.
	pub impersonate_user: Option<String>,
	pub watch_backoff_initial: Duration,
	pub watch_backoff_max: Duration,
}

impl Default for ServerOptions {
	fn default() -> Self {
		let backoff = BackoffPolicy::default();
		Self {
			namespace: String::new(),
			resync_interval: DEFAULT_RESYNC,
			enable_rbac: false,
			impersonate_user: None,
			watch_backoff_initial: backoff.initial,
			watch_backoff_max: backoff.max,
		}
	}
}

impl ServerOptions {
	/// Parses options from `(name, value)` pairs. Unknown names are ignored.
	pub fn from_env<I, K, V>(vars: I) -> Result<Self, OptionsError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut options = Self::default();
		let mut namespace = None;
		for (key, value) in vars {
			let value = value.into();
			match key.as_ref() {
				"NAMESPACE" => namespace = Some(value).filter(|v| !v.trim().is_empty()),
				"RESYNC_INTERVAL" => {
					options.resync_interval = Duration::from_secs(parse_number("RESYNC_INTERVAL", &value)?);
					if options.resync_interval.is_zero() {
						return Err(OptionsError::Invalid {
							var: "RESYNC_INTERVAL",
							value,
						});
					}
				}
				"ENABLE_RBAC" => options.enable_rbac = parse_bool("ENABLE_RBAC", &value)?,
				"IMPERSONATE_USER" => options.impersonate_user = Some(value).filter(|v| !v.is_empty()),
				"WATCH_BACKOFF_INITIAL_MS" => {
					options.watch_backoff_initial = Duration::from_millis(parse_number("WATCH_BACKOFF_INITIAL_MS", &value)?);
				}
				"WATCH_BACKOFF_MAX_MS" => {
					options.watch_backoff_max = Duration::from_millis(parse_number("WATCH_BACKOFF_MAX_MS", &value)?);
				}
				_ => {}
			}
		}
		options.namespace = namespace.ok_or(OptionsError::Missing("NAMESPACE"))?;
		Ok(options)
	}

	pub fn from_process_env() -> Result<Self, OptionsError> {
		Self::from_env(std::env::vars())
	}

	/// Synchronizer settings derived from these options.
	pub fn sync_options(&self) -> SyncOptions {
		SyncOptions {
			resync_interval: self.resync_interval,
			backoff: BackoffPolicy::new(self.watch_backoff_initial, self.watch_backoff_max),
		}
	}
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, OptionsError> {
	value.trim().parse().map_err(|_| OptionsError::Invalid {
		var,
		value: value.to_owned(),
	})
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, OptionsError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" => Ok(true),
		"false" => Ok(false),
		_ => Err(OptionsError::Invalid {
			var,
			value: value.to_owned(),
		}),
	}
}
