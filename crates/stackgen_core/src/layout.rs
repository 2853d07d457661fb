//! Where templates are read from and where config files are written.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BuildError, BuildResult};
use crate::options::Extension;

/// The five generated config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// php.ini fragment.
    RuntimeSettings,
    /// php-fpm.conf.
    ProcessManager,
    /// nginx.conf.
    WebServer,
    /// supervisord.conf.
    Supervisor,
    /// nginx fastcgi params include.
    ProxyParams,
}

impl Artifact {
    pub const ALL: [Artifact; 5] = [
        Artifact::RuntimeSettings,
        Artifact::WebServer,
        Artifact::Supervisor,
        Artifact::ProcessManager,
        Artifact::ProxyParams,
    ];

    /// Template file, relative to the assets directory.
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::RuntimeSettings => "php/99_settings.ini.template",
            Self::ProcessManager => "php-fpm/php-fpm.conf.template",
            Self::WebServer => "nginx/nginx.conf.template",
            Self::Supervisor => "supervisord/supervisord.conf.template",
            Self::ProxyParams => "nginx/fastcgi_params.conf.template",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuntimeSettings => "php",
            Self::ProcessManager => "php-fpm",
            Self::WebServer => "nginx",
            Self::Supervisor => "supervisord",
            Self::ProxyParams => "fastcgi-params",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination paths of the generated config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputPaths {
    pub nginx: PathBuf,
    pub php: PathBuf,
    pub supervisord: PathBuf,
    pub php_fpm: PathBuf,
    pub fastcgi_params: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            nginx: PathBuf::from("/etc/nginx/nginx.conf"),
            php: PathBuf::from("/etc/php8/conf.d/99_settings.ini"),
            supervisord: PathBuf::from("/etc/supervisor/supervisord.conf"),
            php_fpm: PathBuf::from("/etc/php8/php-fpm.conf"),
            fastcgi_params: PathBuf::from("/etc/nginx/includes/fastcgi-params.conf"),
        }
    }
}

/// Config files of the optional PHP extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionPaths {
    pub memcached: PathBuf,
    pub redis: PathBuf,
    pub swoole: PathBuf,
    pub imagick: PathBuf,
}

impl Default for ExtensionPaths {
    fn default() -> Self {
        Self {
            memcached: PathBuf::from("/etc/php8/conf.d/20_memcached.ini"),
            redis: PathBuf::from("/etc/php8/conf.d/20_redis.ini"),
            swoole: PathBuf::from("/etc/php8/conf.d/00_swoole.ini"),
            imagick: PathBuf::from("/etc/php8/conf.d/00_imagick.ini"),
        }
    }
}

/// Paths used by a build.
///
/// Every output, extension and `mkdir` path is re-based under `root` when
/// one is set, so a build can target a staging directory instead of `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildLayout {
    /// Directory holding the template sources and section snippets.
    pub assets: PathBuf,
    pub root: Option<PathBuf>,
    pub outputs: OutputPaths,
    pub extensions: ExtensionPaths,
}

impl Default for BuildLayout {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            root: None,
            outputs: OutputPaths::default(),
            extensions: ExtensionPaths::default(),
        }
    }
}

impl BuildLayout {
    pub fn new(assets: impl Into<PathBuf>) -> Self {
        Self {
            assets: assets.into(),
            ..Default::default()
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Load a layout from a YAML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path = path.as_ref();
        debug!("Loading layout from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        serde_yaml::from_str(&content).map_err(|e| BuildError::InvalidLayout {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of an asset (template or snippet).
    pub fn asset(&self, name: &str) -> PathBuf {
        self.assets.join(name)
    }

    pub fn template(&self, artifact: Artifact) -> PathBuf {
        self.asset(artifact.template_name())
    }

    pub fn output(&self, artifact: Artifact) -> PathBuf {
        let path = match artifact {
            Artifact::RuntimeSettings => &self.outputs.php,
            Artifact::ProcessManager => &self.outputs.php_fpm,
            Artifact::WebServer => &self.outputs.nginx,
            Artifact::Supervisor => &self.outputs.supervisord,
            Artifact::ProxyParams => &self.outputs.fastcgi_params,
        };
        self.rebase(path)
    }

    pub fn extension(&self, extension: Extension) -> PathBuf {
        let path = match extension {
            Extension::Memcached => &self.extensions.memcached,
            Extension::Swoole => &self.extensions.swoole,
            Extension::Redis => &self.extensions.redis,
            Extension::Imagick => &self.extensions.imagick,
        };
        self.rebase(path)
    }

    /// Apply the root prefix to `path`.
    pub fn rebase(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.root {
            Some(root) => {
                let relative: PathBuf = path
                    .components()
                    .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
                    .collect();
                root.join(relative)
            }
            None => path.to_path_buf(),
        }
    }
}
