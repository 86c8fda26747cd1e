fn main() {
    if let Err(err) = cmsv_client::app::run() {
        eprintln!("cmsv_client failed: {err}");
        std::process::exit(1);
    }
}
