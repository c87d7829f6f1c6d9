// fetch.rs - one-shot resource loading (HTTP or local file)

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch `source` in full. URLs get a single GET with no timeout and no
/// retry; anything else is read as a file path.
pub fn fetch_bytes(source: &str) -> Result<Vec<u8>, FetchError> {
    if !is_remote(source) {
        return std::fs::read(Path::new(source)).map_err(|e| FetchError::File {
            path: source.to_string(),
            source: e,
        });
    }

    let http = |e: reqwest::Error| FetchError::Http {
        url: source.to_string(),
        source: e,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(None::<std::time::Duration>)
        .build()
        .map_err(http)?;

    log::debug!("GET {}", source);
    let bytes = client
        .get(source)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(http)?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sources() {
        assert!(is_remote("https://eoimages.gsfc.nasa.gov/x.jpg"));
        assert!(is_remote("http://localhost:8000/land.geojson"));
        assert!(!is_remote("assets/earth.jpg"));
        assert!(!is_remote("/tmp/https.jpg"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = fetch_bytes("definitely/not/here.jpg").unwrap_err();
        assert!(matches!(err, FetchError::File { .. }));
        assert!(err.to_string().contains("definitely/not/here.jpg"));
    }
}
