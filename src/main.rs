mod annotations;
mod app;
mod config;
mod dataset;
mod error;
mod logging;
mod samples;
mod session;
mod setup;
mod ui;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
