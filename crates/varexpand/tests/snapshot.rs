//! Snapshot tests
//!
//! Loads each *.env file in /tests/ individually and compares if the
//! expanded output (or the error and partial output) changes.

fn render(path: &std::path::Path) -> String {
    let mut sources = varexpand::sources::VariableSources::default();
    sources.load_file(path).expect("fixture must load");

    match varexpand::expand(sources.to_variables()) {
        Ok(expansions) => varexpand::sources::render_dotenv(&expansions),
        Err(err) => format!(
            "error: {err}\n\npartial:\n{}",
            varexpand::sources::render_dotenv(&err.partial)
        ),
    }
}

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("VAREXPAND_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("*.env", |path| {
        let rendered = render(path);
        insta::assert_snapshot!(rendered);
    });
}
