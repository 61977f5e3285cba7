//! Subscription URL construction.

use url::Url;

use crate::core::Config;
use crate::error::{ConnectionError, JetstreamError};

/// Builds the subscription URL for `config`.
///
/// Collections and DIDs are repeated query pairs (`wantedCollections=a&wantedCollections=b`).
/// Optional parameters are omitted when unset.
pub fn build_url(config: &Config) -> Result<Url, JetstreamError> {
    let mut url = Url::parse(&config.endpoint).map_err(|e| {
        ConnectionError::connect(format!("invalid endpoint {:?}: {e}", config.endpoint))
    })?;

    {
        let mut query = url.query_pairs_mut();
        for collection in &config.wanted_collections {
            query.append_pair("wantedCollections", collection);
        }
        for did in &config.wanted_dids {
            query.append_pair("wantedDids", did);
        }
        if let Some(cursor) = config.cursor {
            query.append_pair("cursor", &cursor.to_string());
        }
        if let Some(max) = config.max_message_size_bytes {
            query.append_pair("maxMessageSizeBytes", &max.to_string());
        }
        if config.compress {
            query.append_pair("compress", "true");
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_query() {
        let url = build_url(&Config::default()).expect("default endpoint parses");
        assert_eq!(url.as_str(), "wss://jetstream1.us-east.bsky.network/subscribe");
    }

    #[test]
    fn repeats_filters_and_appends_options() {
        let config = Config {
            endpoint: "wss://example.test/subscribe".into(),
            wanted_collections: vec!["app.bsky.feed.post".into(), "app.bsky.feed.like".into()],
            wanted_dids: vec!["did:plc:abc".into()],
            cursor: Some(1725911162329308),
            max_message_size_bytes: Some(4096),
            compress: true,
            ..Config::default()
        };
        let url = build_url(&config).expect("valid");
        assert_eq!(
            url.as_str(),
            "wss://example.test/subscribe?wantedCollections=app.bsky.feed.post\
             &wantedCollections=app.bsky.feed.like&wantedDids=did%3Aplc%3Aabc\
             &cursor=1725911162329308&maxMessageSizeBytes=4096&compress=true"
        );
    }

    #[test]
    fn bad_endpoint_is_a_connect_error() {
        let config = Config {
            endpoint: "not a url".into(),
            ..Config::default()
        };
        let err = build_url(&config).expect_err("invalid endpoint");
        assert_eq!(err.as_label(), "connection_connect");
    }
}
