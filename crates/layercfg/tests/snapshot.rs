//! Snapshot tests
//!
//! Loads the fixture directory /tests/data/config/ and compares if the
//! fully resolved output changes.

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("LAYERCFG_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/config");
    let mut config = layercfg::Config::new(path).expect("fixture directory exists");

    let all = layercfg::Value::Object(
        layercfg::Configuration::all(&mut config).expect("valid configuration"),
    );

    insta::assert_json_snapshot!("directory", all);
}
