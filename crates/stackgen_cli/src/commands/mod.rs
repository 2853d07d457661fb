//! CLI command definitions.
//!
//! This module defines the command structure for the stackgen CLI and the
//! option flags shared by its subcommands.

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

use stackgen_core::OptionOverrides;

pub mod build;
pub mod options;

/// stackgen - render container config files from build options
#[derive(Parser)]
#[command(name = "stackgen")]
#[command(version, about = "stackgen - render container config files from build options")]
#[command(long_about = r#"
stackgen renders the nginx, php, php-fpm, supervisord and fastcgi params
config files of a PHP application image. It runs once, at image build time.

COMMANDS:
  build    → Render and write all config files
  options  → Print the resolved build options

Boolean options accept an optional value: `--https`, `--https=true`,
`--ext-redis=false`. Every option can also be set through a STACKGEN_*
environment variable.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Template error
  4 - Filesystem error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render and write all config files
    Build(build::BuildArgs),

    /// Print the resolved build options as YAML
    Options(options::OptionsArgs),
}

/// Build options, one flag per option.
#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// Port nginx listens on
    #[arg(long, env = "STACKGEN_PORT")]
    port: Option<u16>,

    /// PHP memory_limit [default: 64M, dev: 512M]
    #[arg(long, env = "STACKGEN_MEMORY_LIMIT")]
    memory_limit: Option<String>,

    /// PHP max_execution_time in seconds [default: 30, dev: 60]
    #[arg(long, env = "STACKGEN_MAX_EXECUTION_TIME")]
    max_execution_time: Option<u32>,

    /// PHP max_input_time in seconds [default: 30]
    #[arg(long, env = "STACKGEN_MAX_INPUT_TIME")]
    max_input_time: Option<u32>,

    /// Request body limit for nginx and PHP [default: 8M, dev: 32M]
    #[arg(long, env = "STACKGEN_HTTP_MAX_SIZE")]
    http_max_size: Option<String>,

    /// Redirect http to https
    #[arg(long, env = "STACKGEN_HTTPS", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    https: Option<bool>,

    /// Redirect www to non-www
    #[arg(long, env = "STACKGEN_NON_WWW", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    non_www: Option<bool>,

    /// Long browser cache for css and js
    #[arg(long, env = "STACKGEN_CACHE_CSS_JS", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    cache_css_js: Option<bool>,

    /// Long browser cache for media files
    #[arg(long, env = "STACKGEN_CACHE_MEDIA", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    cache_media: Option<bool>,

    /// Load the xdebug extension
    #[arg(long, env = "STACKGEN_XDEBUG", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    xdebug: Option<bool>,

    /// xdebug profiler output directory, /dev/null disables the profiler
    #[arg(long, env = "STACKGEN_XDEBUG_PROFILER", value_name = "DIR")]
    xdebug_profiler: Option<String>,

    /// opcache preload script, /dev/null disables preloading
    #[arg(long, env = "STACKGEN_PRELOAD", value_name = "FILE")]
    preload: Option<String>,

    /// User the preload script runs as
    #[arg(long, env = "STACKGEN_PRELOAD_USER")]
    preload_user: Option<String>,

    /// Turn opcache off
    #[arg(long, env = "STACKGEN_OPCACHE_DISABLE", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    opcache_disable: Option<bool>,

    /// CPU cores php-fpm is sized for [default: 2, dev: 1]
    #[arg(long, env = "STACKGEN_CPU_CORES")]
    cpu_cores: Option<u32>,

    /// php-fpm pm.max_children [default: 8 x cpu cores]
    #[arg(long, env = "STACKGEN_MAX_CHILDREN")]
    max_children: Option<u32>,

    /// php-fpm pm.process_idle_timeout [default: 10s]
    #[arg(long, env = "STACKGEN_PROCESS_IDLE_TIMEOUT")]
    process_idle_timeout: Option<String>,

    /// php-fpm pm.max_requests [default: 500]
    #[arg(long, env = "STACKGEN_MAX_REQUESTS")]
    max_requests: Option<u32>,

    /// Keep the memcached extension [default: true]
    #[arg(long, env = "STACKGEN_EXT_MEMCACHED", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    ext_memcached: Option<bool>,

    /// Keep the swoole extension [default: true]
    #[arg(long, env = "STACKGEN_EXT_SWOOLE", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    ext_swoole: Option<bool>,

    /// Keep the redis extension [default: true]
    #[arg(long, env = "STACKGEN_EXT_REDIS", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    ext_redis: Option<bool>,

    /// Keep the imagick extension [default: true]
    #[arg(long, env = "STACKGEN_EXT_IMAGICK", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    ext_imagick: Option<bool>,

    /// Use development defaults
    #[arg(long, env = "STACKGEN_DEV", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    dev: Option<bool>,

    /// Do not run nginx under supervisord
    #[arg(long, env = "STACKGEN_DISABLE_NGINX", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    disable_nginx: Option<bool>,

    /// Apply Google Cloud Run settings
    #[arg(long, env = "STACKGEN_GCLOUD_RUN", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    gcloud_run: Option<bool>,

    /// Directory to create, may be repeated
    #[arg(long, env = "STACKGEN_MKDIR", value_name = "DIR")]
    mkdir: Vec<String>,
}

impl From<OptionArgs> for OptionOverrides {
    fn from(args: OptionArgs) -> Self {
        Self {
            port: args.port,
            memory_limit: args.memory_limit,
            max_execution_time: args.max_execution_time,
            max_input_time: args.max_input_time,
            http_max_size: args.http_max_size,
            https: args.https,
            non_www: args.non_www,
            cache_css_js: args.cache_css_js,
            cache_media: args.cache_media,
            xdebug: args.xdebug,
            xdebug_profiler: args.xdebug_profiler,
            preload: args.preload,
            preload_user: args.preload_user,
            opcache_disable: args.opcache_disable,
            cpu_cores: args.cpu_cores,
            max_children: args.max_children,
            process_idle_timeout: args.process_idle_timeout,
            max_requests: args.max_requests,
            ext_memcached: args.ext_memcached,
            ext_swoole: args.ext_swoole,
            ext_redis: args.ext_redis,
            ext_imagick: args.ext_imagick,
            dev: args.dev,
            disable_nginx: args.disable_nginx,
            gcloud_run: args.gcloud_run,
            mkdir: args.mkdir,
        }
    }
}
