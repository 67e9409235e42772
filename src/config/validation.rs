use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks that the start URL is a well-formed http(s) URL and that the
/// numeric knobs are within sane bounds. Returns the first violation found.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    match Url::parse(&config.crawl.start_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => {
            return Err(ConfigError::Validation(format!(
                "start-url must be http or https, got scheme '{}'",
                url.scheme()
            )));
        }
        Err(e) => {
            return Err(ConfigError::Validation(format!(
                "start-url is not a valid URL: {}",
                e
            )));
        }
    }

    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.http.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be 10 or fewer, got {}",
            config.http.max_retries
        )));
    }

    if config.output.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory must not be empty".to_string(),
        ));
    }

    if config.output.summary_filename.trim().is_empty()
        || config.output.summary_filename.contains('/')
    {
        return Err(ConfigError::Validation(format!(
            "summary-filename must be a bare file name, got '{}'",
            config.output.summary_filename
        )));
    }

    Ok(())
}
