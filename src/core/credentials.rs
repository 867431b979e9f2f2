//! Registry of calling services and their shared secrets.
use std::{collections::HashMap, fmt};

const PAIR_SEPARATOR: char = '|';
const ID_SECRET_SEPARATOR: char = ':';

/// Service identifier → shared secret. Built once at start-up and only read afterwards.
#[derive(Clone, Default)]
pub struct ServiceCredentials {
    secrets: HashMap<String, String>,
}

impl ServiceCredentials {
    /// Parse `id:secret|id:secret`.
    ///
    /// The secret is everything after the first `:`, so secrets may contain
    /// colons. Pairs without a separator, with an empty id or with an empty
    /// secret are skipped. A later pair for the same id replaces an earlier one.
    pub fn parse(raw: &str) -> Self {
        let mut secrets = HashMap::new();

        for pair in raw.split(PAIR_SEPARATOR) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            match pair.split_once(ID_SECRET_SEPARATOR) {
                Some((id, secret)) if !id.trim().is_empty() && !secret.is_empty() => {
                    secrets.insert(id.trim().to_string(), secret.to_string());
                }
                _ => {
                    tracing::warn!(
                        entry = %pair.split(ID_SECRET_SEPARATOR).next().unwrap_or_default(),
                        "Skipping malformed service credential entry"
                    );
                }
            }
        }

        Self { secrets }
    }

    pub fn secret(&self, service_id: &str) -> Option<&str> {
        self.secrets.get(service_id).map(String::as_str)
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.secrets.contains_key(service_id)
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.secrets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.service_ids().collect();
        ids.sort_unstable();
        f.debug_struct("ServiceCredentials")
            .field("service_ids", &ids)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let creds = ServiceCredentials::parse("svcA:alpha|svcB:beta");
        assert_eq!(creds.len(), 2);
        assert_eq!(creds.secret("svcA"), Some("alpha"));
        assert_eq!(creds.secret("svcB"), Some("beta"));
        assert_eq!(creds.secret("svcC"), None);
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let creds = ServiceCredentials::parse("svcA:alpha||broken|:nosvc|empty:| svcB : beta");
        assert_eq!(creds.len(), 2);
        assert!(creds.contains("svcA"));
        assert!(!creds.contains("broken"));
        assert!(!creds.contains("empty"));
        assert_eq!(creds.secret("svcB"), Some(" beta"));
    }

    #[test]
    fn test_secret_may_contain_colons() {
        let creds = ServiceCredentials::parse("svcA:a:b:c");
        assert_eq!(creds.secret("svcA"), Some("a:b:c"));
    }

    #[test]
    fn test_later_entry_wins() {
        let creds = ServiceCredentials::parse("svcA:old|svcA:new");
        assert_eq!(creds.secret("svcA"), Some("new"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = ServiceCredentials::parse("svcA:topsecret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("svcA"));
        assert!(!rendered.contains("topsecret"));
    }
}
