//! RSS feed fetcher with security measures.
//!
//! This module provides functionality to fetch and parse RSS 2.0 feeds
//! with SSRF protection and resource limits.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use ::rss::Channel;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::RssConfig;
use crate::error::{FetchError, GatorError, Result};
use crate::rss::html::unescape_entities;
use crate::rss::types::{ParsedFeed, ParsedItem};

/// Something that can turn a feed URL into a parsed feed.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    /// Fetch and parse the feed at `url`.
    ///
    /// Cancelling `cancel` aborts the request promptly with
    /// [`FetchError::Network`].
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<ParsedFeed, FetchError>;
}

/// RSS feed fetcher with security measures.
pub struct RssFetcher {
    client: Client,
    max_feed_size: u64,
    block_private_hosts: bool,
}

impl RssFetcher {
    /// Create a new fetcher from configuration.
    pub fn new(config: &RssConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            block_private_hosts: config.block_private_hosts,
        })
    }

    async fn fetch_uncancelled(&self, url: &str) -> std::result::Result<ParsedFeed, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("failed to fetch feed: {}", e)))?;

        // Check response status
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        // Check content length if available
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                });
            }
        }

        // Read body chunk by chunk so an unannounced oversize body is cut off
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read response: {}", e)))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size,
                    max: self.max_feed_size,
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        parse_feed(&body)
    }
}

impl FeedSource for RssFetcher {
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<ParsedFeed, FetchError> {
        validate_url(url, self.block_private_hosts)?;

        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Network("request cancelled".to_string())),
            result = self.fetch_uncancelled(url) => result,
        }
    }
}

impl<F: FeedSource + ?Sized> FeedSource for &F {
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<ParsedFeed, FetchError> {
        (**self).fetch(url, cancel).await
    }
}

/// Validate a feed URL.
///
/// The URL must be absolute http or https with a host. With
/// `block_private_hosts`, loopback, private, link-local and reserved hosts
/// are rejected as well.
pub fn validate_url(url: &str, block_private_hosts: bool) -> std::result::Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

    // Check scheme
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| FetchError::InvalidUrl("URL has no host".to_string()))?;

    if !block_private_hosts {
        return Ok(());
    }

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(FetchError::InvalidUrl(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => {
            let ip = IpAddr::V4(ipv4);
            if is_private_ip(&ip) {
                return Err(FetchError::InvalidUrl(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
        url::Host::Ipv6(ipv6) => {
            let ip = IpAddr::V6(ipv6);
            if is_private_ip(&ip) {
                return Err(FetchError::InvalidUrl(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
    }

    Ok(())
}

/// Check if a hostname is forbidden.
fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    let forbidden_suffixes = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    forbidden_suffixes
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();

            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Documentation: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
                || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
                || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
        }
        IpAddr::V6(ipv6) => {
            let segments = ipv6.segments();

            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse an RSS 2.0 document.
///
/// XML escapes are decoded by the parser; textual fields are then unescaped
/// once more because many feeds double-escape their content.
pub fn parse_feed(bytes: &[u8]) -> std::result::Result<ParsedFeed, FetchError> {
    let channel = Channel::read_from(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let items = channel
        .items()
        .iter()
        .map(|item| ParsedItem {
            title: item.title().map(unescape_entities).unwrap_or_default(),
            link: item.link().map(unescape_entities),
            description: item.description().map(unescape_entities),
            pub_date: item.pub_date().map(str::to_string),
        })
        .collect();

    Ok(ParsedFeed {
        title: unescape_entities(channel.title()),
        link: unescape_entities(channel.link()),
        description: unescape_entities(channel.description()),
        items,
    })
}
