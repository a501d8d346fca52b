pub mod file;
pub mod http;

use crate::core::loader::MetricsSource;

/// Picks the source for a location: `http://` and `https://` go over the
/// network, anything else is a file path.
pub fn source_for(location: &str) -> Box<dyn MetricsSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(http::HttpMetricsSource::new(location))
    } else {
        Box::new(file::FileMetricsSource::new(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_for_location() {
        assert_eq!(
            source_for("https://example.com/data/dashboard_data.json").location(),
            "https://example.com/data/dashboard_data.json"
        );
        assert_eq!(
            source_for("data/dashboard_data.json").location(),
            "data/dashboard_data.json"
        );
    }
}
