use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use chrono::Local;

use crate::adapters::alarm_log::AlarmLogFile;
use crate::adapters::cmsv_api::SessionClient;
use crate::adapters::http_transport::{Fetched, HttpFetcher, TrustLevel};
use crate::adapters::link_export::write_export;
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::poller::{AlarmPoller, AlarmSelection, PollerStats, SharedSelection};
use crate::app::render;
use crate::domain::equipment_status::StatusWords;
use crate::domain::links::{HlsLinkOptions, LinkBuilder, RealtimeLinkOptions, StreamKind};
use crate::domain::models::{AlarmPage, Device, Session};

pub const USAGE: &str = "cmsv_client <links [--save] | vehicles | alarms | decode <s1> <s2> <s3> <s4> | stream <DevIDNO> [channel] [sub] | watch>; watch stops on Enter and keeps running when stdin is closed";

const ALARM_HEADING: &str = "DEVICE ALARMS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Links {
        save: bool,
    },
    Vehicles,
    Alarms,
    Decode(StatusWords),
    Stream {
        device_id: String,
        channel: u32,
        stream: StreamKind,
    },
    Watch,
}

impl Command {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, AppError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        match args.as_slice() {
            ["links"] => Ok(Self::Links { save: false }),
            ["links", "--save"] => Ok(Self::Links { save: true }),
            ["vehicles"] => Ok(Self::Vehicles),
            ["alarms"] => Ok(Self::Alarms),
            ["decode", s1, s2, s3, s4] => Ok(Self::Decode(StatusWords::new(
                parse_word(s1)?,
                parse_word(s2)?,
                parse_word(s3)?,
                parse_word(s4)?,
            ))),
            ["stream", device_id, rest @ ..] => parse_stream(device_id, rest),
            ["watch"] => Ok(Self::Watch),
            _ => Err(AppError::usage(USAGE)),
        }
    }
}

/// Status words arrive either as signed platform integers or as raw unsigned bits.
fn parse_word(raw: &str) -> Result<u32, AppError> {
    raw.parse::<i32>()
        .map(|value| value as u32)
        .or_else(|_| raw.parse::<u32>())
        .map_err(|_| AppError::usage(format!("status word `{raw}` is not a 32-bit integer")))
}

fn parse_stream(device_id: &str, rest: &[&str]) -> Result<Command, AppError> {
    let (channel, stream) = match rest {
        [] => (0, StreamKind::Main),
        [channel] => (parse_channel(channel)?, StreamKind::Main),
        [channel, "sub"] => (parse_channel(channel)?, StreamKind::Sub),
        _ => return Err(AppError::usage(USAGE)),
    };

    Ok(Command::Stream {
        device_id: device_id.to_string(),
        channel,
        stream,
    })
}

fn parse_channel(raw: &str) -> Result<u32, AppError> {
    raw.parse()
        .map_err(|_| AppError::usage(format!("channel `{raw}` is not a number")))
}

pub fn run(config: AppConfig, command: Command) -> Result<(), AppError> {
    let client = SessionClient::connect(config.server.clone())?;
    execute(
        &config,
        client,
        command,
        std::io::stdin().lock(),
        std::io::stdout(),
    )
}

/// Logs in and watches alarms until Enter is pressed.
pub fn run_watch(config: AppConfig) -> Result<(), AppError> {
    run(config, Command::Watch)
}

pub fn execute<F, R, W>(
    config: &AppConfig,
    client: SessionClient<F>,
    command: Command,
    input: R,
    mut out: W,
) -> Result<(), AppError>
where
    F: HttpFetcher,
    R: BufRead,
    W: Write + Send + 'static,
{
    if let Command::Decode(words) = command {
        write!(out, "{}", render::status_report(words))?;
        return Ok(());
    }

    let (account, password) = config.credentials()?;
    let login = client.login(account, password)?;
    let session = login.value;
    tracing::info!(
        account,
        downgraded = login.trust == TrustLevel::Downgraded,
        "logged in"
    );

    match command {
        Command::Links { save } => {
            let fetched = client.list_devices(&session)?;
            notice_trust(&mut out, &[login.trust, fetched.trust])?;

            let devices = filter_devices(fetched.value, &config.device_filter);
            let builder = LinkBuilder::new(config.server.clone());
            let listing: String = devices
                .iter()
                .map(|device| {
                    let links = builder.player_links(
                        session.as_str(),
                        &device.device_id,
                        &device.vehicle_id,
                        account,
                        password,
                    );
                    render::device_links(&device.display_name(), &links)
                })
                .collect();

            write!(out, "Found {} devices\n\n{listing}", devices.len())?;
            if save {
                let path = write_export(
                    Path::new(&config.export_dir),
                    account,
                    devices.len(),
                    Local::now().date_naive(),
                    &listing,
                )?;
                writeln!(out, "Saved links to {}", path.display())?;
            }
        }
        Command::Vehicles => {
            let fetched = client.vehicle_info(&session)?;
            notice_trust(&mut out, &[login.trust, fetched.trust])?;
            write!(out, "{}", render::vehicle_info(&fetched.value)?)?;
        }
        Command::Alarms => {
            let fetched =
                client.alarms(&session, &config.device_filter, config.coordinate_system)?;
            notice_trust(&mut out, &[login.trust, fetched.trust])?;
            write!(out, "{}", render::alarm_report(ALARM_HEADING, &fetched.value))?;
            AlarmLogFile::new(&config.alarm_log_path).append(&fetched.value.alarms)?;
        }
        Command::Stream {
            device_id,
            channel,
            stream,
        } => {
            notice_trust(&mut out, &[login.trust])?;
            let builder = LinkBuilder::new(config.server.clone());
            let realtime = RealtimeLinkOptions {
                jsession: session.as_str().to_string(),
                device_id: device_id.clone(),
                channel,
                stream,
                ..RealtimeLinkOptions::default()
            };
            let hls = HlsLinkOptions {
                jsession: session.as_str().to_string(),
                device_id,
                channel,
                stream,
                ..HlsLinkOptions::default()
            };

            writeln!(out, "RTSP: {}", builder.rtsp(&realtime))?;
            writeln!(out, "RTMP: {}", builder.rtmp(&realtime))?;
            writeln!(out, "HLS: {}", builder.hls(&hls))?;
        }
        Command::Watch => {
            notice_trust(&mut out, &[login.trust])?;
            let stats = watch(config, client, session, input, out)?;
            tracing::info!(
                ticks = stats.ticks,
                deliveries = stats.deliveries,
                failures = stats.failures,
                "alarm watch finished"
            );
        }
        Command::Decode(_) => {}
    }

    Ok(())
}

/// Polls alarms for the configured device until a line arrives on `input`.
/// A closed `input` (a service, or `< /dev/null`) keeps polling until the
/// process is terminated.
pub fn watch<F, R, W>(
    config: &AppConfig,
    client: SessionClient<F>,
    session: Session,
    mut input: R,
    mut out: W,
) -> Result<PollerStats, AppError>
where
    F: HttpFetcher,
    R: BufRead,
    W: Write + Send + 'static,
{
    writeln!(
        out,
        "Watching alarms every {} ms, press Enter to stop",
        config.poll_interval_ms
    )?;

    let selection = SharedSelection::new(AlarmSelection {
        session: Some(session),
        device_id: config.device_filter.clone(),
        coordinates: config.coordinate_system,
    });
    let log = AlarmLogFile::new(&config.alarm_log_path);
    let sink = move |page: &Fetched<AlarmPage>| {
        let mut report = String::new();
        if page.is_downgraded() {
            report.push_str(render::DOWNGRADED_TRUST_NOTICE);
            report.push('\n');
        }
        let heading = format!("AUTO REFRESH ALARMS ({})", Local::now().format("%H:%M:%S"));
        report.push_str(&render::alarm_report(&heading, &page.value));
        if let Err(error) = out.write_all(report.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %error, "failed to print alarm report");
        }
        if let Err(error) = log.append(&page.value.alarms) {
            tracing::warn!(
                error = %error,
                path = %log.path().display(),
                "failed to append alarm log"
            );
        }
    };

    let mut poller = AlarmPoller::new(Duration::from_millis(config.poll_interval_ms));
    poller.start(client, selection, sink)?;

    let entered = wait_for_enter(&mut input);
    if matches!(entered, Ok(false)) {
        tracing::info!("stdin closed, alarm watch runs until the process is terminated");
        loop {
            std::thread::park();
        }
    }
    let stats = poller.stats();
    poller.shutdown();
    entered?;

    Ok(stats)
}

/// `Ok(false)` means `input` reached EOF without a line.
fn wait_for_enter<R: BufRead>(input: &mut R) -> std::io::Result<bool> {
    let mut line = String::new();
    Ok(input.read_line(&mut line)? > 0)
}

fn filter_devices(devices: Vec<Device>, device_filter: &str) -> Vec<Device> {
    if device_filter.is_empty() {
        return devices;
    }
    devices
        .into_iter()
        .filter(|device| device.device_id == device_filter)
        .collect()
}

fn notice_trust<W: Write>(out: &mut W, trust: &[TrustLevel]) -> std::io::Result<()> {
    if trust.contains(&TrustLevel::Downgraded) {
        writeln!(out, "{}", render::DOWNGRADED_TRUST_NOTICE)?;
    }
    Ok(())
}
