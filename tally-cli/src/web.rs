use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::get,
};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tally_charts::{Pipeline, PipelineRun};
use tally_core::is_report_file;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub csv_path: Arc<PathBuf>,
    /// Rooted, no trailing slash
    pub url_prefix: Arc<str>,
}

pub fn app(url_prefix: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(&format!("{url_prefix}/{{file}}"), get(static_image))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Recompute every report from the ledger and return the dashboard.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    let pipeline = state.pipeline.clone();
    let csv_path = state.csv_path.clone();
    let run = tokio::task::spawn_blocking(move || pipeline.run(&csv_path))
        .await
        .map_err(internal)?
        .map_err(|e| internal(format!("{e:#}")))?;

    info!(kept = run.kept, dropped = run.dropped, "served dashboard");
    Ok(Html(render_page(&run, &state.url_prefix)))
}

/// Serve one of the rendered report images.
pub async fn static_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !is_report_file(&file) {
        return Err((StatusCode::NOT_FOUND, format!("no such image: {file}")));
    }

    let path = state.pipeline.out_dir().join(&file);
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, format!("not rendered yet: {file}")),
        _ => internal(format!("reading {}: {e}", path.display())),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        bytes,
    ))
}

pub fn render_page(run: &PipelineRun, url_prefix: &str) -> String {
    let body: String = run
        .outcomes
        .iter()
        .map(|outcome| {
            let def = &outcome.def;
            let title = escape_html(def.title);
            let content = match &outcome.result {
                Ok(_) => format!(
                    "<img src=\"{url_prefix}/{}\" alt=\"{title}\">",
                    def.file_name
                ),
                Err(e) => format!("<p class=\"error\">{}</p>", escape_html(&format!("{e:#}"))),
            };
            format!(
                "  <section id=\"{}\">\n    <h2>{title}</h2>\n    {content}\n  </section>\n",
                def.id
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Household Spending Dashboard</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem auto; max-width: 1240px; color: #222; }}
    section {{ margin-bottom: 2.5rem; }}
    img {{ max-width: 100%; border: 1px solid #ddd; }}
    .meta {{ color: #666; }}
    .error {{ color: #b00020; }}
  </style>
</head>
<body>
  <h1>Household Spending Dashboard</h1>
  <p class="meta">{kept} transactions, {dropped} skipped (unreadable date)</p>
{body}</body>
</html>
"#,
        kept = run.kept,
        dropped = run.dropped,
    )
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
