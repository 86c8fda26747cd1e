use crate::domain::server::ServerConfig;

const AV_TYPE_LIVE_VIDEO: u8 = 1;
const HLS_REQUEST_REAL_TIME: u8 = 1;
const LIVE_API_ACTION: &str = "StandardApiAction_realTimeVedio.action";
const WEB_PLAYER_PATH: &str = "808gps/open/player/video.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamKind {
    #[default]
    Main,
    Sub,
}

impl StreamKind {
    pub fn code(self) -> u8 {
        match self {
            Self::Main => 0,
            Self::Sub => 1,
        }
    }
}

/// Inputs shared by the RTSP and RTMP builders.
///
/// Zero `port` or `av_type` and an empty `host` fall back to the
/// configured defaults (`av_type` 1 is live video, 2 is audio listen).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealtimeLinkOptions {
    pub host: String,
    pub port: u16,
    pub jsession: String,
    pub device_id: String,
    pub channel: u32,
    pub stream: StreamKind,
    pub av_type: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HlsLinkOptions {
    pub host: String,
    pub port: u16,
    pub jsession: String,
    pub device_id: String,
    pub channel: u32,
    pub stream: StreamKind,
    pub request_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLinks {
    pub web_player_by_device: String,
    pub web_player_by_vehicle: String,
    pub live_api: String,
}

impl PlayerLinks {
    pub fn labeled(&self) -> [(&'static str, &str); 3] {
        [
            ("Web Player ID", self.web_player_by_device.as_str()),
            ("Web Player VI", self.web_player_by_vehicle.as_str()),
            ("Live API", self.live_api.as_str()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct LinkBuilder {
    server: ServerConfig,
}

impl LinkBuilder {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    pub fn rtsp(&self, options: &RealtimeLinkOptions) -> String {
        self.realtime("rtsp", self.server.rtsp_port, options)
    }

    pub fn rtmp(&self, options: &RealtimeLinkOptions) -> String {
        self.realtime("rtmp", self.server.rtmp_port, options)
    }

    pub fn hls(&self, options: &HlsLinkOptions) -> String {
        let host = self.host_or_default(&options.host);
        let port = non_zero_or(options.port, self.server.hls_port);
        let request_type = non_zero_or(options.request_type, HLS_REQUEST_REAL_TIME);

        format!(
            "https://{host}:{port}/hls/{request_type}_{}_{}_{}.m3u8?jsession={}",
            options.device_id,
            options.channel,
            options.stream.code(),
            options.jsession
        )
    }

    pub fn player_links(
        &self,
        jsession: &str,
        device_id: &str,
        vehicle_id: &str,
        account: &str,
        password: &str,
    ) -> PlayerLinks {
        let player = format!("{}/{WEB_PLAYER_PATH}", self.server.web_player_base());

        PlayerLinks {
            web_player_by_device: format!(
                "{player}?lang=en&devIdno={device_id}&account={account}&password={password}"
            ),
            web_player_by_vehicle: format!(
                "{player}?lang=en&vehiIdno={vehicle_id}&account={account}&password={password}"
            ),
            live_api: format!(
                "{}?jsession={jsession}&DevIDNO={device_id}&Chn=1&Sec=300&Label=test",
                self.server.action_url(LIVE_API_ACTION)
            ),
        }
    }

    fn realtime(&self, scheme: &str, default_port: u16, options: &RealtimeLinkOptions) -> String {
        let host = self.host_or_default(&options.host);
        let port = non_zero_or(options.port, default_port);
        let av_type = non_zero_or(options.av_type, AV_TYPE_LIVE_VIDEO);

        format!(
            "{scheme}://{host}:{port}/3/3?AVType={av_type}&jsession={}&DevIDNO={}&Channel={}&Stream={}",
            options.jsession,
            options.device_id,
            options.channel,
            options.stream.code()
        )
    }

    fn host_or_default(&self, host: &str) -> String {
        if host.trim().is_empty() {
            self.server.hostname()
        } else {
            host.to_string()
        }
    }
}

fn non_zero_or<T: PartialEq + Default>(value: T, fallback: T) -> T {
    if value == T::default() { fallback } else { value }
}
