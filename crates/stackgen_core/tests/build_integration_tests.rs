//! Integration tests for full builds against the shipped assets.

use std::fs;
use std::path::{Path, PathBuf};

use stackgen_core::{
    Artifact, BuildError, BuildLayout, Builder, Extension, OptionOverrides,
};
use tempfile::{tempdir, TempDir};

fn assets_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets")
}

/// Staging root with the extension configs a base image ships with.
fn staged_layout() -> (TempDir, BuildLayout) {
    let temp = tempdir().unwrap();
    let layout = BuildLayout::new(assets_path()).root(temp.path());

    for extension in Extension::ALL {
        let path = layout.extension(extension);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("extension={}.so\n", extension)).unwrap();
    }

    (temp, layout)
}

fn read_output(layout: &BuildLayout, artifact: Artifact) -> String {
    fs::read_to_string(layout.output(artifact)).unwrap()
}

#[test]
fn test_default_build_writes_all_artifacts() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides::default().resolve();

    let report = Builder::new(options, layout.clone()).run().unwrap();

    assert_eq!(report.written.len(), 5);
    assert!(report.deleted.is_empty());
    assert!(!report.port_patched);

    for artifact in Artifact::ALL {
        let content = read_output(&layout, artifact);
        assert!(!content.contains("${"), "{} has unresolved placeholders", artifact);
    }

    let nginx = read_output(&layout, Artifact::WebServer);
    assert!(nginx.contains("listen 8080;"));
    assert!(nginx.contains("client_max_body_size 8M;"));
    assert!(!nginx.contains("https://"));

    let fastcgi = read_output(&layout, Artifact::ProxyParams);
    assert!(fastcgi.contains("fastcgi_param SERVER_PORT $server_port;"));

    let supervisord = read_output(&layout, Artifact::Supervisor);
    assert!(supervisord.contains("[program:php-fpm]"));
    assert!(supervisord.contains("[program:nginx]"));
}

#[test]
fn test_end_to_end_port_https_and_cores() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        port: Some(9090),
        https: Some(true),
        cpu_cores: Some(4),
        max_children: None,
        dev: Some(false),
        ..Default::default()
    }
    .resolve();

    let report = Builder::new(options, layout.clone()).run().unwrap();
    assert!(report.port_patched);

    let nginx = read_output(&layout, Artifact::WebServer);
    assert!(nginx.contains("return 301 https://$host$request_uri;"));
    assert!(nginx.contains("listen 9090;"));
    assert!(!nginx.contains("listen 8080;"));

    let fpm = read_output(&layout, Artifact::ProcessManager);
    assert!(fpm.contains("pm = dynamic"));
    assert!(fpm.contains("pm.start_servers = 16"));
    assert!(fpm.contains("pm.max_children = 32"));
    assert!(fpm.contains("pm.min_spare_servers = 8"));
    assert!(fpm.contains("pm.max_spare_servers = 16"));

    let php = read_output(&layout, Artifact::RuntimeSettings);
    assert!(php.contains("opcache.validate_timestamps = 0"));
}

#[test]
fn test_dev_mode_defaults() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        dev: Some(true),
        ..Default::default()
    }
    .resolve();

    Builder::new(options, layout.clone()).run().unwrap();

    let php = read_output(&layout, Artifact::RuntimeSettings);
    assert!(php.contains("memory_limit = 512M"));
    assert!(php.contains("max_execution_time = 60"));
    assert!(php.contains("upload_max_filesize = 32M"));
    assert!(php.contains("post_max_size = 32M"));
    assert!(php.contains("opcache.validate_timestamps = 1"));
    assert!(php.contains("opcache.revalidate_freq = 0"));

    let nginx = read_output(&layout, Artifact::WebServer);
    assert!(nginx.contains("client_max_body_size 32M;"));

    // One core: 4 start servers, 8 children.
    let fpm = read_output(&layout, Artifact::ProcessManager);
    assert!(fpm.contains("pm.start_servers = 4"));
    assert!(fpm.contains("pm.max_children = 8"));
}

#[test]
fn test_nginx_sections_in_option_order() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        https: Some(true),
        non_www: Some(true),
        cache_css_js: Some(true),
        cache_media: Some(true),
        ..Default::default()
    }
    .resolve();

    Builder::new(options, layout.clone()).run().unwrap();

    let nginx = read_output(&layout, Artifact::WebServer);
    let https = nginx.find("https://$host").unwrap();
    let non_www = nginx.find("$non_www").unwrap();
    let css = nginx.find("css|js").unwrap();
    let media = nginx.find("jpg|jpeg").unwrap();
    assert!(https < non_www && non_www < css && css < media);
}

#[test]
fn test_php_append_section() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        xdebug: Some(true),
        xdebug_profiler: Some("/var/www/profiler".to_string()),
        preload: Some("/var/www/html/preload.php".to_string()),
        preload_user: Some("www-data".to_string()),
        opcache_disable: Some(true),
        ..Default::default()
    }
    .resolve();

    Builder::new(options, layout.clone()).run().unwrap();

    let php = read_output(&layout, Artifact::RuntimeSettings);
    let xdebug = php.find("zend_extension=xdebug.so").unwrap();
    let profiler = php.find("xdebug.output_dir = /var/www/profiler").unwrap();
    let preload = php.find("opcache.preload=/var/www/html/preload.php").unwrap();
    let user = php.find("opcache.preload_user=www-data").unwrap();
    assert!(xdebug < profiler && profiler < preload && preload < user);
    assert!(php.contains("opcache.enable = 0"));
}

#[test]
fn test_preload_user_requires_preload() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        preload_user: Some("www-data".to_string()),
        ..Default::default()
    }
    .resolve();

    Builder::new(options, layout.clone()).run().unwrap();

    let php = read_output(&layout, Artifact::RuntimeSettings);
    assert!(!php.contains("opcache.preload"));
}

#[test]
fn test_disable_nginx_supervision() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        disable_nginx: Some(true),
        ..Default::default()
    }
    .resolve();

    Builder::new(options, layout.clone()).run().unwrap();

    let supervisord = read_output(&layout, Artifact::Supervisor);
    assert!(supervisord.contains("[program:php-fpm]"));
    assert!(!supervisord.contains("[program:nginx]"));
}

#[test]
fn test_gcloud_run_overrides() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        gcloud_run: Some(true),
        memory_limit: Some("128M".to_string()),
        ..Default::default()
    }
    .resolve();

    Builder::new(options, layout.clone()).run().unwrap();

    let fpm = read_output(&layout, Artifact::ProcessManager);
    assert!(fpm.contains("pm = static"));
    assert!(fpm.contains("pm.max_children = 30"));

    let php = read_output(&layout, Artifact::RuntimeSettings);
    assert!(php.contains("memory_limit = 512M"));
    assert!(php.contains("opcache.memory_consumption = 256"));

    let fastcgi = read_output(&layout, Artifact::ProxyParams);
    assert!(fastcgi.contains("fastcgi_param SERVER_PORT 443;"));
}

#[test]
fn test_disabled_extensions_are_deleted() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        ext_memcached: Some(false),
        ext_swoole: Some(false),
        ext_redis: Some(false),
        ext_imagick: Some(false),
        ..Default::default()
    }
    .resolve();

    let report = Builder::new(options, layout.clone()).run().unwrap();

    assert_eq!(report.deleted.len(), 4);
    for extension in Extension::ALL {
        assert!(!layout.extension(extension).exists());
    }
}

#[test]
fn test_missing_extension_config_fails() {
    let (_temp, layout) = staged_layout();
    let missing = layout.extension(Extension::Redis);
    fs::remove_file(&missing).unwrap();

    let options = OptionOverrides {
        ext_memcached: Some(false),
        ext_swoole: Some(false),
        ext_redis: Some(false),
        ext_imagick: Some(false),
        ..Default::default()
    }
    .resolve();

    let err = Builder::new(options, layout).run().unwrap_err();
    match &err {
        BuildError::MissingExtensionConfig { extension, path } => {
            assert_eq!(extension, "redis");
            assert_eq!(path, &missing);
        }
        other => panic!("expected missing extension config, got {:?}", other),
    }
    assert!(err.to_string().contains("20_redis.ini"));
}

#[test]
fn test_mkdir_creates_directories() {
    let (temp, layout) = staged_layout();
    let options = OptionOverrides {
        mkdir: vec![
            "/var/www/html/temp/cache".to_string(),
            "/var/www/html/log".to_string(),
        ],
        ..Default::default()
    }
    .resolve();

    let report = Builder::new(options, layout).run().unwrap();

    assert_eq!(report.directories.len(), 2);
    assert!(temp.path().join("var/www/html/temp/cache").is_dir());
    assert!(temp.path().join("var/www/html/log").is_dir());
}

#[test]
fn test_missing_assets_fail_before_writing() {
    let temp = tempdir().unwrap();
    let layout = BuildLayout::new(temp.path().join("no-assets")).root(temp.path());
    let options = OptionOverrides::default().resolve();

    let err = Builder::new(options, layout.clone()).run().unwrap_err();
    assert!(matches!(err, BuildError::Template(_)));
    assert!(!layout.output(Artifact::RuntimeSettings).exists());
}

#[test]
fn test_preview_matches_written_output() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        port: Some(8000),
        cache_media: Some(true),
        ..Default::default()
    }
    .resolve();

    let builder = Builder::new(options, layout.clone());
    let preview = builder.preview().unwrap();

    // Preview touches nothing on disk.
    assert!(!layout.output(Artifact::WebServer).exists());

    builder.run().unwrap();
    for (artifact, content) in preview {
        assert_eq!(content, read_output(&layout, artifact), "{} differs", artifact);
    }
}

#[test]
fn test_preview_checks_disabled_extension_configs() {
    let (_temp, layout) = staged_layout();
    let missing = layout.extension(Extension::Imagick);
    fs::remove_file(&missing).unwrap();

    let options = OptionOverrides {
        ext_swoole: Some(false),
        ext_imagick: Some(false),
        ..Default::default()
    }
    .resolve();

    let err = Builder::new(options, layout.clone()).preview().unwrap_err();
    match err {
        BuildError::MissingExtensionConfig { extension, path } => {
            assert_eq!(extension, "imagick");
            assert_eq!(path, missing);
        }
        other => panic!("expected missing extension config, got {:?}", other),
    }

    assert!(layout.extension(Extension::Swoole).is_file());
    for artifact in Artifact::ALL {
        assert!(!layout.output(artifact).exists());
    }
}

#[test]
fn test_missing_extension_config_deletes_nothing() {
    let (_temp, layout) = staged_layout();
    fs::remove_file(layout.extension(Extension::Redis)).unwrap();

    let options = OptionOverrides {
        ext_memcached: Some(false),
        ext_redis: Some(false),
        ..Default::default()
    }
    .resolve();

    assert!(Builder::new(options, layout.clone()).run().is_err());
    assert!(layout.extension(Extension::Memcached).is_file());
}

#[test]
fn test_plan_variables() {
    let (_temp, layout) = staged_layout();
    let options = OptionOverrides {
        max_children: Some(100),
        ..Default::default()
    }
    .resolve();

    let plan = Builder::new(options, layout).plan().unwrap();
    let fpm = plan.get(Artifact::ProcessManager);
    assert_eq!(fpm.variable("fpm.max_children"), Some("100"));
    assert_eq!(fpm.variable("fpm.process_idle_timeout"), Some("10s"));
    assert_eq!(
        plan.get(Artifact::ProxyParams).variable("server_port"),
        Some("$server_port")
    );
}
