//! Static file serving module
//!
//! Resolves request paths against the document root, serves files with
//! `Last-Modified` support, and falls back to index files or a directory
//! listing for directories.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a non-API GET/HEAD request from the document root
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let root = &state.document_root;
    let Some(target) = translate_path(root, ctx.path) else {
        return http::build_404_response();
    };

    let Ok(metadata) = fs::metadata(&target).await else {
        // File not found is common (404), no need to log at warning level
        return http::build_404_response();
    };

    if !stays_under_root(root, &target, ctx.path) {
        return http::build_404_response();
    }

    if metadata.is_dir() {
        return serve_directory(ctx, state, &target).await;
    }

    // A trailing slash names a directory; a file there is not a match
    if ctx.path.ends_with('/') {
        return http::build_404_response();
    }

    serve_file(ctx, &target, &metadata).await
}

/// Map a raw request path onto the document root
///
/// The path is percent-decoded and normalized: empty and `.` segments are
/// skipped, `..` removes the previous segment and can never climb above
/// the root. Returns `None` when the path is not valid UTF-8 or contains a
/// NUL byte.
pub fn translate_path(root: &Path, raw_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(raw_path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(segments);
    Some(path)
}

/// Reject targets that resolve outside the root through symlinks
fn stays_under_root(root: &Path, target: &Path, request_path: &str) -> bool {
    let Ok(canonical) = target.canonicalize() else {
        return false;
    };
    if canonical.starts_with(root) {
        return true;
    }
    logger::log_warning(&format!(
        "Path traversal attempt blocked: {} -> {}",
        request_path,
        canonical.display()
    ));
    false
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_301_response(&location);
    }

    let static_config = &state.config.static_files;
    for index_file in &static_config.index_files {
        let candidate = dir.join(index_file);
        if let Ok(metadata) = fs::metadata(&candidate).await {
            if metadata.is_file() {
                return serve_file(ctx, &candidate, &metadata).await;
            }
        }
    }

    if static_config.directory_listing {
        listing::serve_listing(dir, ctx.path).await
    } else {
        http::build_404_response()
    }
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    metadata: &Metadata,
) -> Response<Full<Bytes>> {
    let last_modified = metadata
        .modified()
        .ok()
        .map(|modified| (modified, cache::format_http_date(modified)));

    if let Some((modified, ref header)) = last_modified {
        if cache::is_not_modified(ctx.if_modified_since, ctx.has_if_none_match, modified) {
            return http::build_304_response(header);
        }
    }

    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let header = last_modified.map_or_else(
        || cache::format_http_date(std::time::SystemTime::now()),
        |(_, header)| header,
    );
    http::build_file_response(Bytes::from(content), mime::content_type_for(path), &header)
}
