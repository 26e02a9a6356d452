use super::*;

#[test]
fn defaults_resolve_to_in_memory_service_on_port_3000() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert!(settings.database.url.is_none());
    assert_eq!(
        settings.scheduler.poll_interval,
        Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
    );
    assert_eq!(settings.storage.directory, PathBuf::from(DEFAULT_ARTIFACT_DIR));
    assert_eq!(settings.render.delimiter, ',');
    assert_eq!(settings.render.geometry, PageGeometry::A4);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.scheduler.poll_interval_ms = Some(5_000);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        scheduler_poll_interval_ms: Some(250),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.scheduler.poll_interval, Duration::from_millis(250));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_falls_back_to_memory() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_poll_interval_is_rejected() {
    let mut raw = RawSettings::default();
    raw.scheduler.poll_interval_ms = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero interval");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "scheduler.poll_interval_ms",
            ..
        }
    ));
}

#[test]
fn zero_pool_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero pool");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.max_connections",
            ..
        }
    ));
}

#[test]
fn render_overrides_apply_to_geometry_and_delimiter() {
    let mut raw = RawSettings::default();
    raw.apply_render_overrides(&RenderOverrides {
        font_size: Some(8.0),
        margin: Some(20.0),
        delimiter: Some(';'),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.render.geometry.font_size, 8.0);
    assert_eq!(settings.render.geometry.margin, 20.0);
    assert_eq!(settings.render.delimiter, ';');
}

#[test]
fn unusable_geometry_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.margin = Some(400.0);

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid { key: "render", .. })
    ));
}

#[test]
fn multi_character_delimiter_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.delimiter = Some("::".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "render.delimiter",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["spiralpress"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "spiralpress",
        "render",
        "--render-delimiter",
        ";",
        "words.txt",
        "out.pdf",
    ]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.input, PathBuf::from("words.txt"));
            assert_eq!(render.output, PathBuf::from("out.pdf"));
            assert_eq!(render.render.delimiter, Some(';'));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "spiralpress",
        "serve",
        "--database-url",
        "postgres://example",
        "--storage-directory",
        "/var/lib/spiralpress",
        "--log-json",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            let overrides = serve.overrides;
            assert_eq!(overrides.database_url.as_deref(), Some("postgres://example"));
            assert_eq!(
                overrides.storage_directory,
                Some(PathBuf::from("/var/lib/spiralpress"))
            );
            assert_eq!(overrides.log_json, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
