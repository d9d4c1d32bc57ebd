use serde::Deserialize;
use std::path::PathBuf;

use crate::errors::AppError;

const DEFAULT_AUTH_URL: &str =
    "https://api.c.pfcld.com/v1/jwt-generator-business-ms/jwt/generateToken";
const DEFAULT_ELIGIBILITY_URL: &str =
    "https://api.c.pfcld.com/v1/veritec-business-ms/veritec/eligibility";
const DEFAULT_STATE_PATH: &str = ".eligibility/state.json";

/// Token lifetime assumed when the auth endpoint omits `expiresIn`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 28_800;

/// What a bulk run hands back when the token expires part-way through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialResults {
    /// Return the outcomes collected before the 401.
    Keep,
    /// Drop them; the run reports only the expiry.
    Discard,
}

impl std::str::FromStr for PartialResults {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(PartialResults::Keep),
            "discard" => Ok(PartialResults::Discard),
            other => Err(AppError::Config(format!(
                "ELIG_PARTIAL_RESULTS must be 'keep' or 'discard', got '{}'",
                other
            ))),
        }
    }
}

/// Client credential triple sent to the token endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub authorization_server_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("authorization_server_id", &self.authorization_server_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth_url: String,
    pub eligibility_url: String,
    /// `None` when any of the three credential variables is unset.
    pub credentials: Option<Credentials>,
    /// Where the token cache persists. `None` disables persistence.
    pub state_path: Option<PathBuf>,
    /// Set via ELIG_DEFAULT_EXPIRES_IN. Default: 28800.
    pub default_expires_in: u64,
    /// Set via ELIG_PARTIAL_RESULTS. Default: keep.
    pub partial_results: PartialResults,
}

pub fn load() -> Result<Config, AppError> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> Result<Config, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let auth_url = lookup("ELIG_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.into());
    let eligibility_url =
        lookup("ELIG_ELIGIBILITY_URL").unwrap_or_else(|| DEFAULT_ELIGIBILITY_URL.into());
    validate_url("ELIG_AUTH_URL", &auth_url)?;
    validate_url("ELIG_ELIGIBILITY_URL", &eligibility_url)?;

    let credentials = match (
        lookup("ELIG_AUTH_SERVER_ID"),
        lookup("ELIG_CLIENT_ID"),
        lookup("ELIG_CLIENT_SECRET"),
    ) {
        (Some(authorization_server_id), Some(client_id), Some(client_secret)) => Some(Credentials {
            authorization_server_id,
            client_id,
            client_secret,
        }),
        _ => None,
    };

    let state_path = match lookup("ELIG_STATE_PATH") {
        Some(p) if p.trim().is_empty() => None,
        Some(p) => Some(PathBuf::from(p)),
        None => Some(PathBuf::from(DEFAULT_STATE_PATH)),
    };

    let partial_results = match lookup("ELIG_PARTIAL_RESULTS") {
        Some(v) => v.parse()?,
        None => PartialResults::Keep,
    };

    Ok(Config {
        auth_url,
        eligibility_url,
        credentials,
        state_path,
        default_expires_in: lookup("ELIG_DEFAULT_EXPIRES_IN")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        partial_results,
    })
}

fn validate_url(name: &str, value: &str) -> Result<(), AppError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| AppError::Config(format!("{} is not a valid URL ({}): {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let cfg = from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(cfg.eligibility_url, DEFAULT_ELIGIBILITY_URL);
        assert!(cfg.credentials.is_none());
        assert_eq!(cfg.state_path, Some(PathBuf::from(DEFAULT_STATE_PATH)));
        assert_eq!(cfg.default_expires_in, 28_800);
        assert_eq!(cfg.partial_results, PartialResults::Keep);
    }

    #[test]
    fn test_credentials_need_all_three_vars() {
        let cfg = from_lookup(lookup_from(&[
            ("ELIG_AUTH_SERVER_ID", "aus"),
            ("ELIG_CLIENT_ID", "cid"),
        ]))
        .unwrap();
        assert!(cfg.credentials.is_none());

        let cfg = from_lookup(lookup_from(&[
            ("ELIG_AUTH_SERVER_ID", "aus"),
            ("ELIG_CLIENT_ID", "cid"),
            ("ELIG_CLIENT_SECRET", "shh"),
        ]))
        .unwrap();
        let creds = cfg.credentials.unwrap();
        assert_eq!(creds.client_id, "cid");
        assert!(!format!("{:?}", creds).contains("shh"));
    }

    #[test]
    fn test_empty_state_path_disables_persistence() {
        let cfg = from_lookup(lookup_from(&[("ELIG_STATE_PATH", "  ")])).unwrap();
        assert!(cfg.state_path.is_none());
    }

    #[test]
    fn test_partial_results_parsing() {
        let cfg = from_lookup(lookup_from(&[("ELIG_PARTIAL_RESULTS", "Discard")])).unwrap();
        assert_eq!(cfg.partial_results, PartialResults::Discard);

        let err = from_lookup(lookup_from(&[("ELIG_PARTIAL_RESULTS", "maybe")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = from_lookup(lookup_from(&[("ELIG_AUTH_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_bad_expires_in_falls_back() {
        let cfg = from_lookup(lookup_from(&[("ELIG_DEFAULT_EXPIRES_IN", "soon")])).unwrap();
        assert_eq!(cfg.default_expires_in, DEFAULT_EXPIRES_IN_SECS);
    }
}
