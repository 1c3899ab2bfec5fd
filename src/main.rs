use std::{panic, process};

use log::{error, info};
use tokio_util::sync::CancellationToken;
use uricast::config::{self, Config};
use uricast::gist::{self, GstBackend};
use uricast::pipeline::{self, EventLoop};

fn main() {
    tracing_subscriber::fmt::init();

    let matches = config::command().get_matches();
    let conf = Config::from_matches(&matches);

    // kill the main thread as soon as a secondary thread panics
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(105);
    }));

    if let Err(err) = gist::init() {
        error!("Failed to initialize GStreamer: {}", err);
        process::exit(-1);
    }

    // Ctrl-C stops the event loop, teardown still runs
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || on_signal.cancel()) {
        error!("Error setting Ctrl-C handler: {}", err);
        process::exit(-1);
    }

    info!(
        "Playing {} to {} ({}x{})",
        conf.uri,
        conf.variant.name(),
        conf.width,
        conf.height
    );

    let spec = conf.graph_spec();
    let mut event_loop = EventLoop::new(conf.poll_interval, cancel);

    match pipeline::run(&GstBackend, &spec, &mut event_loop) {
        Ok(report) => process::exit(report.exit_code()),
        Err(err) => {
            error!("{}", err);
            process::exit(-1);
        }
    }
}
