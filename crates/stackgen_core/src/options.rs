//! Build options and their defaults.
//!
//! [`OptionOverrides`] holds what the caller explicitly asked for.
//! [`OptionOverrides::resolve`] fills everything else from the production
//! defaults, or from the dev defaults when `dev` is set.

use std::fmt;

use serde::Serialize;

/// Port the web server template listens on.
pub const DEFAULT_PORT: u16 = 8080;

/// Path value that marks a path-typed option as switched off.
pub const DISABLED_PATH: &str = "/dev/null";

/// Optional PHP extensions shipped enabled in the base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Memcached,
    Swoole,
    Redis,
    Imagick,
}

impl Extension {
    pub const ALL: [Extension; 4] = [
        Extension::Memcached,
        Extension::Swoole,
        Extension::Redis,
        Extension::Imagick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memcached => "memcached",
            Self::Swoole => "swoole",
            Self::Redis => "redis",
            Self::Imagick => "imagick",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fully resolved build options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildOptions {
    pub port: u16,
    pub memory_limit: String,
    pub max_execution_time: u32,
    pub max_input_time: u32,
    /// Request body limit, shared by nginx and PHP upload/post limits.
    pub http_max_size: String,
    pub https: bool,
    pub non_www: bool,
    pub cache_css_js: bool,
    pub cache_media: bool,
    pub xdebug: bool,
    pub xdebug_profiler: String,
    pub preload: String,
    pub preload_user: Option<String>,
    pub opcache_disable: bool,
    pub cpu_cores: u32,
    pub max_children: Option<u32>,
    pub process_idle_timeout: String,
    pub max_requests: u32,
    pub ext_memcached: bool,
    pub ext_swoole: bool,
    pub ext_redis: bool,
    pub ext_imagick: bool,
    pub dev: bool,
    pub disable_nginx: bool,
    pub gcloud_run: bool,
    pub mkdir: Vec<String>,
    /// Not settable from the command line, follows `dev`.
    pub validate_timestamps: u8,
    /// Not settable from the command line, follows `dev`.
    pub revalidate_freq: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::defaults(false)
    }
}

impl BuildOptions {
    /// Defaults for a production or a dev build.
    pub fn defaults(dev: bool) -> Self {
        let mut options = Self {
            port: DEFAULT_PORT,
            memory_limit: "64M".to_string(),
            max_execution_time: 30,
            max_input_time: 30,
            http_max_size: "8M".to_string(),
            https: false,
            non_www: false,
            cache_css_js: false,
            cache_media: false,
            xdebug: false,
            xdebug_profiler: DISABLED_PATH.to_string(),
            preload: DISABLED_PATH.to_string(),
            preload_user: None,
            opcache_disable: false,
            cpu_cores: 2,
            max_children: None,
            process_idle_timeout: "10s".to_string(),
            max_requests: 500,
            ext_memcached: true,
            ext_swoole: true,
            ext_redis: true,
            ext_imagick: true,
            dev,
            disable_nginx: false,
            gcloud_run: false,
            mkdir: Vec::new(),
            validate_timestamps: 0,
            revalidate_freq: 2,
        };

        if dev {
            options.memory_limit = "512M".to_string();
            options.http_max_size = "32M".to_string();
            options.max_execution_time = 60;
            options.cpu_cores = 1;
            options.validate_timestamps = 1;
            options.revalidate_freq = 0;
        }

        options
    }

    pub fn xdebug_profiler_enabled(&self) -> bool {
        self.xdebug_profiler != DISABLED_PATH
    }

    pub fn preload_enabled(&self) -> bool {
        self.preload != DISABLED_PATH
    }

    pub fn extension_enabled(&self, extension: Extension) -> bool {
        match extension {
            Extension::Memcached => self.ext_memcached,
            Extension::Swoole => self.ext_swoole,
            Extension::Redis => self.ext_redis,
            Extension::Imagick => self.ext_imagick,
        }
    }

    /// Extensions switched off for this build.
    pub fn disabled_extensions(&self) -> Vec<Extension> {
        Extension::ALL
            .into_iter()
            .filter(|ext| !self.extension_enabled(*ext))
            .collect()
    }
}

/// Options explicitly provided by the caller. `None` means "use the
/// default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub port: Option<u16>,
    pub memory_limit: Option<String>,
    pub max_execution_time: Option<u32>,
    pub max_input_time: Option<u32>,
    pub http_max_size: Option<String>,
    pub https: Option<bool>,
    pub non_www: Option<bool>,
    pub cache_css_js: Option<bool>,
    pub cache_media: Option<bool>,
    pub xdebug: Option<bool>,
    pub xdebug_profiler: Option<String>,
    pub preload: Option<String>,
    pub preload_user: Option<String>,
    pub opcache_disable: Option<bool>,
    pub cpu_cores: Option<u32>,
    pub max_children: Option<u32>,
    pub process_idle_timeout: Option<String>,
    pub max_requests: Option<u32>,
    pub ext_memcached: Option<bool>,
    pub ext_swoole: Option<bool>,
    pub ext_redis: Option<bool>,
    pub ext_imagick: Option<bool>,
    pub dev: Option<bool>,
    pub disable_nginx: Option<bool>,
    pub gcloud_run: Option<bool>,
    pub mkdir: Vec<String>,
}

impl OptionOverrides {
    /// Apply the overrides on top of the matching defaults.
    pub fn resolve(self) -> BuildOptions {
        let overrides = self;
        let mut options = BuildOptions::defaults(overrides.dev.unwrap_or(false));

        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = overrides.$field {
                        options.$field = value;
                    }
                )*
            };
        }

        apply!(
            port,
            memory_limit,
            max_execution_time,
            max_input_time,
            http_max_size,
            https,
            non_www,
            cache_css_js,
            cache_media,
            xdebug,
            xdebug_profiler,
            preload,
            opcache_disable,
            cpu_cores,
            process_idle_timeout,
            max_requests,
            ext_memcached,
            ext_swoole,
            ext_redis,
            ext_imagick,
            disable_nginx,
            gcloud_run,
        );

        options.preload_user = overrides.preload_user.filter(|user| !user.is_empty());
        options.max_children = overrides.max_children.filter(|n| *n > 0);
        options.mkdir = overrides.mkdir;
        options
    }
}
