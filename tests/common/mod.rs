use std::net::SocketAddr;
use std::path::Path;

use tempfile::TempDir;

use lanshare::config::ShareConfig;
use lanshare::http::HttpServer;

/// A server running on an ephemeral loopback port over a temp directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }
}

/// Spawn a real server with the given config. The root directory is
/// replaced with a fresh temp dir owned by the returned handle.
pub async fn spawn_server(mut config: ShareConfig) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    config.serve.root_dir = root.path().to_path_buf();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config).unwrap();
    tokio::spawn(server.run(listener));

    TestServer { addr, root }
}

/// Client that does not follow redirects, so 301/303 are observable.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
