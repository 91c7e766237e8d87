//! Development server for the output directory.
//!
//! Files are served as-is. Unmatched routes without a file extension are app
//! routes and get `/index.html`; anything else unmatched is a 404.

use std::fs::File;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

const INDEX: &str = "index.html";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Unable to listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    File(PathBuf),
    NotFound,
}

/// Map a request URL onto a file under `root`.
pub fn resolve(root: &Path, url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let relative = PathBuf::from(path.trim_start_matches('/'));
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Route::NotFound;
    }

    let candidate = root.join(&relative);
    if candidate.is_file() {
        return Route::File(candidate);
    }
    let index = candidate.join(INDEX);
    if candidate.is_dir() && index.is_file() {
        return Route::File(index);
    }

    let app_route = relative.extension().is_none();
    let root_index = root.join(INDEX);
    if app_route && root_index.is_file() {
        Route::File(root_index)
    } else {
        Route::NotFound
    }
}

pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).unwrap_or_default() {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "webmanifest" => "application/json",
        "ts" | "txt" | "temp" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn respond(root: &Path, request: Request) {
    let url = request.url().to_string();
    let result = match resolve(root, &url) {
        Route::File(path) => match File::open(&path) {
            Ok(file) => {
                let mut response = Response::from_file(file);
                let mime = content_type(&path).as_bytes();
                if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], mime) {
                    response = response.with_header(header);
                }
                request.respond(response)
            }
            Err(error) => {
                log::warn!("Unable to open {}: {error}", path.display());
                let response = Response::from_string("Internal Server Error").with_status_code(500);
                request.respond(response)
            }
        },
        Route::NotFound => {
            log::debug!("404 {url}");
            request.respond(Response::from_string("Not Found").with_status_code(404))
        }
    };
    if let Err(error) = result {
        log::warn!("Failed to respond to {url}: {error}");
    }
}

/// Serve `root` on `port` until the process is stopped.
pub fn serve(root: &Path, port: u16) -> Result<(), ServeError> {
    let server =
        Server::http(("0.0.0.0", port)).map_err(|source| ServeError::Bind { port, source })?;
    log::info!("Serving {} on http://localhost:{port}/", root.display());
    for request in server.incoming_requests() {
        respond(root, request);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("definitions")).unwrap();
        fs::create_dir_all(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join(INDEX), "<html>").unwrap();
        fs::write(tmp.path().join("definitions/manifest.json"), "{}").unwrap();
        fs::write(tmp.path().join("docs/index.html"), "<docs>").unwrap();
        tmp
    }

    #[test]
    fn files_are_served() {
        let tmp = site();
        let root = tmp.path();
        assert_eq!(
            resolve(root, "/definitions/manifest.json?v=3"),
            Route::File(root.join("definitions/manifest.json"))
        );
        assert_eq!(resolve(root, "/"), Route::File(root.join(INDEX)));
        assert_eq!(resolve(root, "/docs"), Route::File(root.join("docs").join(INDEX)));
    }

    #[test]
    fn app_routes_fall_back_to_index() {
        let tmp = site();
        let root = tmp.path();
        assert_eq!(resolve(root, "/collections/season-25"), Route::File(root.join(INDEX)));
        assert_eq!(resolve(root, "/definitions/Missing.json"), Route::NotFound);
    }

    #[test]
    fn traversal_is_rejected() {
        let tmp = site();
        assert_eq!(resolve(tmp.path(), "/../secret"), Route::NotFound);
    }

    #[test]
    fn no_index_no_fallback() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(resolve(tmp.path(), "/anything"), Route::NotFound);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("a.json")), "application/json");
        assert_eq!(content_type(Path::new("Enums.d.ts")), "text/plain; charset=utf-8");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
