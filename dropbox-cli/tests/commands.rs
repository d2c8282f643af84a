use clap::Parser;
use dropbox_cli::{
    commands::{self, Command},
    errors::CliError,
    settings::Settings,
};
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Debug, Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

fn parse(args: &[&str]) -> Command {
    Args::try_parse_from(std::iter::once("dropbox").chain(args.iter().copied()))
        .unwrap()
        .command
}

fn settings(server: &MockServer) -> Settings {
    Settings {
        access_token: Some("tok".into()),
        base_url: Some(server.uri()),
        ..Settings::default()
    }
}

#[test]
fn authorize_url_is_offline() {
    let command = parse(&["authorize-url", "my-app", "https://example.com/cb"]);
    let value = commands::run_offline(&command).unwrap();

    assert!(value["url"]
        .as_str()
        .unwrap()
        .starts_with("https://www.dropbox.com/1/oauth2/authorize?"));

    assert!(commands::run_offline(&parse(&["account"])).is_none());
}

#[test]
fn write_flags() {
    match parse(&["put", "a.txt", "/a.txt", "--no-overwrite", "--parent-rev", "abc"]) {
        Command::Put { path, write, .. } => {
            let options: dropbox::WriteOptions = write.into();

            assert_eq!(path, "/a.txt");
            assert!(!options.overwrite);
            assert_eq!(options.parent_rev.as_deref(), Some("abc"));
        }
        c => panic!("unexpected command: {c:?}"),
    }
}

#[tokio::test]
async fn mkdir_prints_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fileops/create_folder"))
        .and(query_param("path", "/new"))
        .and(query_param("root", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "/new",
            "is_dir": true,
            "bytes": 0,
            "size": "0 bytes"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server);
    let client = settings.to_client().unwrap();

    let value = commands::run(&client, &settings, parse(&["mkdir", "/new"]))
        .await
        .unwrap();

    assert_eq!(value["path"], "/new");
    assert_eq!(value["is_dir"], true);
}

#[tokio::test]
async fn upload_uses_flags_over_settings() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/chunked_upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "upload_id": "abc",
            "offset": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/commit_chunked_upload/auto/up.toml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "/up.toml",
            "bytes": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server);
    let client = settings.to_client().unwrap();
    let local = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let len = std::fs::metadata(local).unwrap().len();

    commands::run(
        &client,
        &settings,
        parse(&["upload", local, "/up.toml", "--chunk-size", "100"]),
    )
    .await
    .unwrap();

    let chunks = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/chunked_upload")
        .count() as u64;

    assert_eq!(chunks, (len + 99) / 100);
}

#[tokio::test]
async fn not_found_exit_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fileops/delete"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let settings = settings(&server);
    let client = settings.to_client().unwrap();

    let err = commands::run(&client, &settings, parse(&["rm", "/gone"]))
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Dropbox(_)));
    assert_eq!(err.exit_code(), 3);
}
