use std::time::Duration;

use clap::{Arg, ArgMatches, Command};

use crate::pipeline::{
    CapsSpec, DEFAULT_POLL_INTERVAL, GraphSpec, PropertyValue, StageKind, StageSpec,
};

pub const UDP_TEST_URI: &str =
    "https://media.githubusercontent.com/media/Haxerus/test-video-repo/master/test_video.webm";
pub const DISPLAY_TEST_URI: &str =
    "https://gstreamer.freedesktop.org/data/media/sintel_trailer-480p.webm";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5004;
/// 360p
pub const DEFAULT_WIDTH: i32 = 640;
pub const DEFAULT_HEIGHT: i32 = 360;
pub const DEFAULT_GRAPH_NAME: &str = "data-pipeline";
pub const RAW_VIDEO: &str = "video/x-raw";

/// Where the decoded video ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// H.264, RTP payloaded, sent over UDP
    Udp,
    /// Platform video sink
    Display,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Udp => "udp",
            Variant::Display => "display",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "udp" => Some(Variant::Udp),
            "display" => Some(Variant::Display),
            _ => None,
        }
    }

    pub fn default_uri(&self) -> &'static str {
        match self {
            Variant::Udp => UDP_TEST_URI,
            Variant::Display => DISPLAY_TEST_URI,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub variant: Variant,
    pub uri: String,
    pub width: i32,
    pub height: i32,
    pub host: String,
    pub port: u16,
    pub media_prefix: String,
    pub graph_name: String,
    pub poll_interval: Duration,
}

impl Config {
    pub fn for_variant(variant: Variant) -> Self {
        Config {
            variant,
            uri: variant.default_uri().to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            media_prefix: RAW_VIDEO.to_string(),
            graph_name: DEFAULT_GRAPH_NAME.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Apply command line overrides on top of the variant defaults
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let variant = matches
            .get_one::<String>("output")
            .and_then(|name| Variant::from_name(name))
            .unwrap_or(Variant::Udp);

        let mut conf = Config::for_variant(variant);

        if let Some(uri) = matches.get_one::<String>("uri") {
            conf.uri = uri.clone();
        }
        if let Some(host) = matches.get_one::<String>("host") {
            conf.host = host.clone();
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            conf.port = *port;
        }
        if let Some(width) = matches.get_one::<i32>("width") {
            conf.width = *width;
        }
        if let Some(height) = matches.get_one::<i32>("height") {
            conf.height = *height;
        }
        if let Some(ms) = matches.get_one::<u64>("poll-ms") {
            conf.poll_interval = Duration::from_millis(*ms);
        }

        conf
    }

    /// Graph declaration for the configured variant
    ///
    /// `source` has no static link: its pads appear once the container has
    /// been inspected and are routed to `video_convert` at runtime.
    pub fn graph_spec(&self) -> GraphSpec {
        let resize_caps = CapsSpec::new(RAW_VIDEO)
            .with_int("width", self.width)
            .with_int("height", self.height);

        let spec = GraphSpec::new(self.graph_name.as_str())
            .stage(
                StageSpec::new("source", StageKind::Decode, "uridecodebin")
                    .with_property("uri", PropertyValue::Str(self.uri.clone())),
            )
            .stage(StageSpec::new("video_convert", StageKind::Convert, "videoconvert"))
            .stage(StageSpec::new("video_resize", StageKind::Scale, "videoscale"))
            .stage(
                StageSpec::new("video_resize_capsfilter", StageKind::Filter, "capsfilter")
                    .with_property("caps", PropertyValue::Caps(resize_caps)),
            )
            .stage(StageSpec::new("video_rate", StageKind::Rate, "videorate"));

        let spec = match self.variant {
            Variant::Udp => spec
                .stage(StageSpec::new("encoder", StageKind::Encode, "x264enc"))
                .stage(StageSpec::new("payloader", StageKind::Packetize, "rtph264pay"))
                .stage(
                    StageSpec::new("udp_sink", StageKind::Sink, "udpsink")
                        .with_property("host", PropertyValue::Str(self.host.clone()))
                        .with_property("port", PropertyValue::Int(i32::from(self.port))),
                )
                .chain(&[
                    "video_convert",
                    "video_resize",
                    "video_resize_capsfilter",
                    "video_rate",
                    "encoder",
                    "payloader",
                    "udp_sink",
                ]),
            Variant::Display => spec
                .stage(StageSpec::new("video_sink", StageKind::Sink, "autovideosink"))
                .chain(&[
                    "video_convert",
                    "video_resize",
                    "video_resize_capsfilter",
                    "video_rate",
                    "video_sink",
                ]),
        };

        spec.dynamic("source", "video_convert", &self.media_prefix)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::for_variant(Variant::Udp)
    }
}

/// Command line definition; every argument is optional
pub fn command() -> Command {
    Command::new(app_name())
        .version(version())
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT")
                .help("Where to send the video (udp/display).")
                .value_parser(["udp", "display"])
                .ignore_case(true)
                .default_value("udp"),
        )
        .arg(
            Arg::new("uri")
                .short('u')
                .long("uri")
                .value_name("URI")
                .help("Media URI to play. Defaults to a test clip for the chosen output."),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("UDP destination host."),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("UDP destination port.")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("WIDTH")
                .help("Width of the scaled video.")
                .value_parser(clap::value_parser!(i32).range(1..)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("HEIGHT")
                .help("Height of the scaled video.")
                .value_parser(clap::value_parser!(i32).range(1..)),
        )
        .arg(
            Arg::new("poll-ms")
                .long("poll-ms")
                .value_name("MILLIS")
                .help("Longest single wait on the message channel, in milliseconds.")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}
