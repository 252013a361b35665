use std::collections::HashMap;

use anyhow::{Result, bail};
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required query parameters: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Picks the `names` out of `params`, failing with every name that is absent or empty.
///
/// # Errors
/// Returns all missing names at once, in the order they were requested.
pub fn required<'a, const N: usize>(
    params: &'a HashMap<String, String>,
    names: [&'static str; N],
) -> Result<[&'a str; N], ValidationError> {
    let mut values = [""; N];
    let mut missing = Vec::new();
    for (slot, name) in values.iter_mut().zip(names) {
        match params.get(name).map(String::as_str) {
            Some(value) if !value.is_empty() => *slot = value,
            _ => missing.push(name),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(ValidationError { missing })
    }
}

pub fn webhook_url(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        bail!("URL Scheme is {:?} instead of http(s)", url.scheme());
    }
    if url.host_str().is_none_or(str::is_empty) {
        bail!("URL has no host");
    }
    if let Some(frag) = url.fragment() {
        bail!("Expected no fragment, got {frag}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn all_present() {
        let params = params(&[("to", "B"), ("from", "A"), ("extra", "x")]);
        let [to, from] = required(&params, ["to", "from"]).unwrap();
        assert_eq!((to, from), ("B", "A"));
    }

    #[test]
    fn missing_and_empty_are_reported_together() {
        let params = params(&[("to", "B"), ("from", "")]);
        let err = required(&params, ["to", "from", "id"]).unwrap_err();
        assert_eq!(err.missing, ["from", "id"]);
        assert_eq!(err.to_string(), "missing required query parameters: from, id");
    }

    #[test]
    fn webhook_urls() {
        let ok = Url::parse("https://discord.com/api/webhooks/1/abc").unwrap();
        assert!(webhook_url(&ok).is_ok());
        let local = Url::parse("http://127.0.0.1:9000/hook").unwrap();
        assert!(webhook_url(&local).is_ok());

        let ftp = Url::parse("ftp://discord.com/x").unwrap();
        assert!(webhook_url(&ftp).is_err());
        let frag = Url::parse("https://discord.com/x#frag").unwrap();
        assert!(webhook_url(&frag).is_err());
    }
}
