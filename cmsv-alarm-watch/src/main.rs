fn main() {
    if let Err(err) = cmsv_client::app::run_alarm_watch() {
        eprintln!("alarm watch failed: {err}");
        std::process::exit(1);
    }
}
