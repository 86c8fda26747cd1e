use reqwest::Url;

pub const DEFAULT_SERVER_URL: &str = "https://cloud.example.tld";
pub const DEFAULT_API_PORT: u16 = 443;
pub const DEFAULT_RTMP_PORT: u16 = 1935;
pub const DEFAULT_RTSP_PORT: u16 = 6604;
pub const DEFAULT_HLS_PORT: u16 = 16604;

/// Platform endpoints, built once at startup and handed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_url: String,
    pub api_port: u16,
    pub rtmp_port: u16,
    pub rtsp_port: u16,
    pub hls_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_port: DEFAULT_API_PORT,
            rtmp_port: DEFAULT_RTMP_PORT,
            rtsp_port: DEFAULT_RTSP_PORT,
            hls_port: DEFAULT_HLS_PORT,
        }
    }
}

impl ServerConfig {
    /// Server URL without a trailing slash, with the API port inserted
    /// when the URL has none and the port is not the scheme default.
    pub fn api_base(&self) -> String {
        let trimmed = self.server_url.trim_end_matches('/');
        let Ok(mut url) = Url::parse(trimmed) else {
            return trimmed.to_string();
        };

        if url.port().is_none()
            && url.port_or_known_default() != Some(self.api_port)
            && url.set_port(Some(self.api_port)).is_ok()
        {
            return url.as_str().trim_end_matches('/').to_string();
        }

        trimmed.to_string()
    }

    pub fn action_url(&self, action: &str) -> String {
        format!("{}/{action}", self.api_base())
    }

    /// Bare host of the server URL, used as the default streaming host.
    pub fn hostname(&self) -> String {
        let without_scheme = self
            .server_url
            .split_once("://")
            .map_or(self.server_url.as_str(), |(_, rest)| rest);
        let authority = without_scheme.split('/').next().unwrap_or_default();
        authority
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    pub fn web_player_base(&self) -> String {
        let trimmed = self.server_url.trim_end_matches('/');
        match trimmed.strip_prefix("https://") {
            Some(rest) => format!("http://{rest}"),
            None => trimmed.to_string(),
        }
    }
}
