//! Config composition policy.
//!
//! The [`Builder`] turns resolved [`BuildOptions`] into five composed
//! templates, then writes them out together with the filesystem side
//! effects of the build: extension pruning, directory creation and the
//! nginx port patch.

use std::fs;
use std::path::PathBuf;

use stackgen_templates::FileTemplate;
use tracing::{debug, info, warn};

use crate::error::{BuildError, BuildResult};
use crate::layout::{Artifact, BuildLayout};
use crate::options::{BuildOptions, Extension, DEFAULT_PORT};

const NGINX_HTTPS: &str = "nginx/nginx-https.conf";
const NGINX_NON_WWW: &str = "nginx/nginx-non-www.conf";
const NGINX_CACHE_CSS_JS: &str = "nginx/nginx-cache-css-js-long.conf";
const NGINX_CACHE_MEDIA: &str = "nginx/nginx-cache-media-long.conf";
const XDEBUG_PROFILER: &str = "php/xdebug.profiler.ini.template";
const SUPERVISORD_PHP: &str = "supervisord/php.conf";
const SUPERVISORD_NGINX: &str = "supervisord/nginx.conf";

/// Cloud Run runs a fixed-size php-fpm pool.
const GCLOUD_RUN_MAX_CHILDREN: u32 = 30;

/// php-fpm pool sizing derived from the CPU count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpmSizing {
    pub max_children: u32,
    pub start_servers: u32,
    pub min_spare_servers: u32,
    pub max_spare_servers: u32,
}

impl FpmSizing {
    pub fn new(cpu_cores: u32, max_children: Option<u32>) -> Self {
        let cores = cpu_cores.max(1);
        let start_servers = cores.saturating_mul(4);
        let max_children = max_children
            .unwrap_or(start_servers.saturating_mul(2))
            .max(start_servers);

        Self {
            max_children,
            start_servers,
            min_spare_servers: cores.saturating_mul(2),
            max_spare_servers: start_servers,
        }
    }
}

/// The five templates of a build, fully composed but not yet rendered.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub php: FileTemplate,
    pub nginx: FileTemplate,
    pub supervisord: FileTemplate,
    pub php_fpm: FileTemplate,
    pub fastcgi_params: FileTemplate,
}

impl BuildPlan {
    pub fn get(&self, artifact: Artifact) -> &FileTemplate {
        match artifact {
            Artifact::RuntimeSettings => &self.php,
            Artifact::ProcessManager => &self.php_fpm,
            Artifact::WebServer => &self.nginx,
            Artifact::Supervisor => &self.supervisord,
            Artifact::ProxyParams => &self.fastcgi_params,
        }
    }

    /// Templates in write order.
    pub fn into_templates(self) -> [(Artifact, FileTemplate); 5] {
        [
            (Artifact::RuntimeSettings, self.php),
            (Artifact::WebServer, self.nginx),
            (Artifact::Supervisor, self.supervisord),
            (Artifact::ProcessManager, self.php_fpm),
            (Artifact::ProxyParams, self.fastcgi_params),
        ]
    }
}

/// What a build did on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
    pub port_patched: bool,
}

/// Applies the composition policy for one set of options.
pub struct Builder {
    options: BuildOptions,
    layout: BuildLayout,
}

impl Builder {
    pub fn new(options: BuildOptions, layout: BuildLayout) -> Self {
        Self { options, layout }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Run the whole build. The first failure aborts it; files already
    /// written or deleted stay that way.
    pub fn run(&self) -> BuildResult<BuildReport> {
        if self.options.dev {
            info!("Enabling dev mode.");
        }

        let plan = self.plan()?;
        let mut report = BuildReport {
            deleted: self.prune_extensions()?,
            directories: self.create_directories()?,
            ..Default::default()
        };

        info!("Writing config files.");
        for (artifact, template) in plan.into_templates() {
            let target = self.layout.output(artifact);
            template.render_to_file(&target)?;
            report.written.push(target);
        }

        report.port_patched = self.patch_port()?;
        Ok(report)
    }

    /// Compose all five templates without touching the filesystem beyond
    /// reading section snippets.
    pub fn plan(&self) -> BuildResult<BuildPlan> {
        let mut plan = BuildPlan {
            php: FileTemplate::new(self.layout.template(Artifact::RuntimeSettings)),
            nginx: FileTemplate::new(self.layout.template(Artifact::WebServer)),
            supervisord: FileTemplate::new(self.layout.template(Artifact::Supervisor)),
            php_fpm: FileTemplate::new(self.layout.template(Artifact::ProcessManager)),
            fastcgi_params: FileTemplate::new(self.layout.template(Artifact::ProxyParams)),
        };

        self.prepare_php(&mut plan.php)?;
        self.prepare_nginx(&mut plan.nginx)?;
        self.prepare_supervisord(&mut plan.supervisord)?;
        self.prepare_php_fpm(&mut plan.php_fpm);
        self.prepare_fastcgi(&mut plan.fastcgi_params);

        if self.options.gcloud_run {
            self.prepare_gcloud_run(&mut plan.php_fpm, &mut plan.php, &mut plan.fastcgi_params);
        }

        Ok(plan)
    }

    /// Render every artifact in memory, port patch included.
    pub fn preview(&self) -> BuildResult<Vec<(Artifact, String)>> {
        let plan = self.plan()?;
        self.disabled_extension_configs()?;

        let mut rendered = Vec::with_capacity(Artifact::ALL.len());
        for (artifact, template) in plan.into_templates() {
            let mut content = template.render()?;
            if artifact == Artifact::WebServer && self.options.port != DEFAULT_PORT {
                content = content.replace(
                    &listen_directive(DEFAULT_PORT),
                    &listen_directive(self.options.port),
                );
            }
            rendered.push((artifact, content));
        }
        Ok(rendered)
    }

    fn prepare_nginx(&self, template: &mut FileTemplate) -> BuildResult<()> {
        if self.options.https {
            info!("Enabling http => https redirection.");
            template.add_section_from_file("server", self.layout.asset(NGINX_HTTPS))?;
        }

        if self.options.non_www {
            info!("Enabling www => non-www redirection.");
            template.add_section_from_file("server", self.layout.asset(NGINX_NON_WWW))?;
        }

        if self.options.cache_css_js {
            info!("Enabling cache css and js.");
            template.add_section_from_file("server", self.layout.asset(NGINX_CACHE_CSS_JS))?;
        }

        if self.options.cache_media {
            info!("Enabling cache media.");
            template.add_section_from_file("server", self.layout.asset(NGINX_CACHE_MEDIA))?;
        }

        template.add_variable("client_max_body_size", &self.options.http_max_size);
        Ok(())
    }

    fn prepare_php(&self, template: &mut FileTemplate) -> BuildResult<()> {
        let options = &self.options;

        if options.xdebug {
            info!("Enabling xdebug.");
            template.add_section("append", "zend_extension=xdebug.so");
        }

        if options.xdebug_profiler_enabled() {
            info!("Enabling xdebug profiler.");
            let snippet = FileTemplate::render_static(
                self.layout.asset(XDEBUG_PROFILER),
                [("output_dir", &options.xdebug_profiler)],
            )?;
            template.add_section("append", snippet);
        }

        template
            .add_variable("max_execution_time", options.max_execution_time)
            .add_variable("max_input_time", options.max_input_time)
            .add_variable("memory_limit", &options.memory_limit)
            .add_variable("upload_max_filesize", &options.http_max_size)
            .add_variable("post_max_size", &options.http_max_size)
            .add_variable("opcache.validate_timestamps", options.validate_timestamps)
            .add_variable("opcache.enable", u8::from(!options.opcache_disable))
            .add_variable("opcache.enable_cli", 0)
            .add_variable("opcache.memory_consumption", 128)
            .add_variable("opcache.revalidate_freq", options.revalidate_freq);

        if options.preload_enabled() {
            info!("Enabling preload.");
            template.add_section("append", format!("opcache.preload={}", options.preload));

            if let Some(user) = &options.preload_user {
                template.add_section("append", format!("opcache.preload_user={}", user));
            }
        }

        Ok(())
    }

    fn prepare_php_fpm(&self, template: &mut FileTemplate) {
        let sizing = FpmSizing::new(self.options.cpu_cores, self.options.max_children);
        debug!("php-fpm sizing: {:?}", sizing);

        template
            .add_variable("fpm.pm", "dynamic")
            .add_variable("fpm.max_children", sizing.max_children)
            .add_variable("fpm.start_servers", sizing.start_servers)
            .add_variable("fpm.min_spare_servers", sizing.min_spare_servers)
            .add_variable("fpm.max_spare_servers", sizing.max_spare_servers)
            .add_variable("fpm.process_idle_timeout", &self.options.process_idle_timeout)
            .add_variable("fpm.max_requests", self.options.max_requests);
    }

    fn prepare_supervisord(&self, template: &mut FileTemplate) -> BuildResult<()> {
        template.add_section_from_file("append", self.layout.asset(SUPERVISORD_PHP))?;

        if self.options.disable_nginx {
            info!("Disabling nginx.");
        } else {
            template.add_section_from_file("append", self.layout.asset(SUPERVISORD_NGINX))?;
        }

        Ok(())
    }

    fn prepare_fastcgi(&self, template: &mut FileTemplate) {
        // Left for nginx to substitute at request time.
        template.add_variable("server_port", "$server_port");
    }

    fn prepare_gcloud_run(
        &self,
        php_fpm: &mut FileTemplate,
        php: &mut FileTemplate,
        fastcgi_params: &mut FileTemplate,
    ) {
        info!("Applying Cloud Run settings.");

        php_fpm
            .add_variable("fpm.pm", "static")
            .add_variable("fpm.max_children", GCLOUD_RUN_MAX_CHILDREN);

        php.add_variable("memory_limit", "512M")
            .add_variable("opcache.memory_consumption", 256);

        fastcgi_params.add_variable("server_port", 443);
    }

    /// Delete the config files of disabled extensions. A missing file means
    /// the base image is not what the build expects.
    fn prune_extensions(&self) -> BuildResult<Vec<PathBuf>> {
        let configs = self.disabled_extension_configs()?;
        let mut deleted = Vec::with_capacity(configs.len());

        for (extension, path) in configs {
            info!("Disabling {} extension.", extension);
            fs::remove_file(&path).map_err(|e| BuildError::io(&path, e))?;
            deleted.push(path);
        }

        Ok(deleted)
    }

    /// Config files of the disabled extensions, all checked to exist.
    fn disabled_extension_configs(&self) -> BuildResult<Vec<(Extension, PathBuf)>> {
        self.options
            .disabled_extensions()
            .into_iter()
            .map(|extension| {
                let path = self.layout.extension(extension);
                if path.is_file() {
                    Ok((extension, path))
                } else {
                    Err(BuildError::MissingExtensionConfig {
                        extension: extension.to_string(),
                        path,
                    })
                }
            })
            .collect()
    }

    fn create_directories(&self) -> BuildResult<Vec<PathBuf>> {
        let mut created = Vec::with_capacity(self.options.mkdir.len());

        for dir in &self.options.mkdir {
            info!("Creating directory with path {}.", dir);
            let path = self.layout.rebase(dir);
            fs::create_dir_all(&path).map_err(|e| BuildError::io(&path, e))?;
            created.push(path);
        }

        Ok(created)
    }

    /// The nginx template hardcodes the default port, so a custom port is
    /// patched into the written file.
    fn patch_port(&self) -> BuildResult<bool> {
        let port = self.options.port;
        if port == DEFAULT_PORT {
            return Ok(false);
        }

        info!("Setting port to {}.", port);
        let nginx = self.layout.output(Artifact::WebServer);
        let replaced = FileTemplate::replace_in_file(
            &nginx,
            &listen_directive(DEFAULT_PORT),
            &listen_directive(port),
        )?;

        if replaced == 0 {
            warn!("No `{}` directive found in {:?}", listen_directive(DEFAULT_PORT), nginx);
        }

        Ok(true)
    }
}

fn listen_directive(port: u16) -> String {
    format!("listen {};", port)
}
