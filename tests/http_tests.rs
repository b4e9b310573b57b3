//! HTTP collaborator tests using wiremock.
//! These tests verify the tarball fetcher and the release downloader against
//! a local mock server.

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitedeploy::error::DeployError;
use sitedeploy::release::{sha512_hex, ReleaseDownloader};
use sitedeploy::webhook::{Credentials, GithubTarballFetcher, SourceFetcher};

fn project_tarball() -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut root = tar::Header::new_gnu();
    root.set_entry_type(tar::EntryType::Directory);
    root.set_size(0);
    root.set_mode(0o755);
    root.set_cksum();
    builder
        .append_data(&mut root, "alice-blog-0f1e2d/", std::io::empty())
        .unwrap();

    for (name, body) in [
        ("alice-blog-0f1e2d/Makefile", "all:\n"),
        ("alice-blog-0f1e2d/content/index.txt", "hello"),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

// ============================================================================
// TARBALL FETCH
// ============================================================================

#[tokio::test]
async fn test_tarball_fetch_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/blog/tarball/master"))
        .and(header("Authorization", "Basic Ym90OnNlY3JldA=="))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(project_tarball()))
        .expect(1)
        .mount(&server)
        .await;

    let work = tempdir().unwrap();
    let fetcher = GithubTarballFetcher::with_api(server.uri(), work.path());
    let creds = Credentials::parse("bot:secret").unwrap();

    let root = fetcher
        .fetch("alice/blog", "master", Some(&creds))
        .await
        .unwrap();
    assert_eq!(root, work.path().join("alice-blog-0f1e2d"));
    assert_eq!(
        std::fs::read_to_string(root.join("content/index.txt")).unwrap(),
        "hello"
    );
}

#[tokio::test]
async fn test_tarball_fetch_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/blog/tarball/master"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let work = tempdir().unwrap();
    let fetcher = GithubTarballFetcher::with_api(server.uri(), work.path());
    let err = fetcher.fetch("alice/blog", "master", None).await.unwrap_err();
    assert!(matches!(err, DeployError::Fetch(_)));
}

// ============================================================================
// RELEASE DOWNLOAD
// ============================================================================

async fn release_server(body: &'static [u8], advertised: &[u8]) -> MockServer {
    let server = MockServer::start().await;
    let listing = r#"<html><body>
        <a href="blogc-0.20.0.tar.gz">blogc-0.20.0.tar.gz</a>
        <a href="blogc-0.20.0.tar.gz.sha512">blogc-0.20.0.tar.gz.sha512</a>
        </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/blogc/blogc-0.20.0/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blogc/blogc-0.20.0/blogc-0.20.0.tar.gz.sha512"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "{}  blogc-0.20.0.tar.gz\n",
            sha512_hex(advertised)
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blogc/blogc-0.20.0/blogc-0.20.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_release_download_verifies_and_resumes() {
    let server = release_server(b"release tarball", b"release tarball").await;
    let dest = tempdir().unwrap();
    let downloader = ReleaseDownloader::new(format!("{}/blogc", server.uri()), dest.path());

    let files = downloader.download("0.20.0").await.unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].downloaded);
    assert_eq!(files[0].path, dest.path().join("0.20.0/blogc-0.20.0.tar.gz"));
    assert!(dest.path().join("0.20.0/blogc-0.20.0.tar.gz.sha512").exists());

    let again = downloader.download("0.20.0").await.unwrap();
    assert!(!again[0].downloaded);
}

#[tokio::test]
async fn test_release_checksum_mismatch() {
    let server = release_server(b"tampered", b"release tarball").await;
    let dest = tempdir().unwrap();
    let downloader = ReleaseDownloader::new(format!("{}/blogc", server.uri()), dest.path());

    let err = downloader.download("0.20.0").await.unwrap_err();
    assert!(matches!(err, DeployError::Checksum { .. }));
}

#[tokio::test]
async fn test_release_without_distfiles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blogc/blogc-9.9.9/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let dest = tempdir().unwrap();
    let downloader = ReleaseDownloader::new(format!("{}/blogc", server.uri()), dest.path());
    assert!(downloader.download("9.9.9").await.is_err());
}
