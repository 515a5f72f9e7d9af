//! Portal routes
//!
//! The single portal page: GET renders the upload form, POST accepts a
//! multipart form with a `scroll` file field, runs the ingestion pipeline
//! once on a blocking worker, and renders the page again with the result.
//!
//! No pipeline logic lives here; this module only moves bytes in and
//! interpolates the two result strings out.

use axum::extract::{Multipart, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::scroll::{self, RenderResult, UploadedScroll};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(portal_page).post(unseal_scroll))
}

/// GET / — the empty portal page
async fn portal_page() -> Html<String> {
    render_page(&RenderResult::empty())
}

/// POST / — one scroll upload, one pipeline invocation
async fn unseal_scroll(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    let mut scroll = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("scroll") {
            let file_name = field.file_name().unwrap_or("scroll").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("could not read scroll field: {e}")))?
                .to_vec();
            scroll = Some(UploadedScroll { file_name, data });
            break;
        }
    }

    let Some(scroll) = scroll else {
        // No scroll field means the pipeline is not invoked at all.
        return Ok(render_page(&RenderResult::empty()));
    };

    let upload_id = Uuid::new_v4();
    tracing::info!(
        %upload_id,
        file_name = %scroll.file_name,
        size = scroll.data.len(),
        "scroll received"
    );

    // The pipeline is synchronous (entity fetches block), so it runs off
    // the async runtime.
    let policy = *state.policy();
    let result = tokio::task::spawn_blocking(move || scroll::handle_upload(&scroll, &policy))
        .await
        .map_err(|e| AppError::Internal(format!("scroll pipeline task failed: {e}")))?;

    Ok(render_page(&result))
}

/// Marker in the page template replaced by the rendered result blocks.
const RESULTS_SLOT: &str = "<!-- results -->";

fn render_page(result: &RenderResult) -> Html<String> {
    let mut blocks = String::new();
    if let Some(preview) = &result.raw_preview {
        blocks.push_str(&result_block("Portal Response", preview));
    }
    if let Some(summary) = &result.extraction_summary {
        blocks.push_str(&result_block("Whispers from the archive", summary));
    }
    Html(PORTAL_PAGE.replace(RESULTS_SLOT, &blocks))
}

fn result_block(title: &str, body: &str) -> String {
    format!(
        "<div class=\"result\"><h3>{}</h3><pre>{}</pre></div>",
        html_escape::encode_text(title),
        html_escape::encode_text(body),
    )
}

const PORTAL_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>Samurai Scroll Portal</title>
  <link href="https://fonts.googleapis.com/css2?family=Sawarabi+Mincho&display=swap" rel="stylesheet">
  <style>
    :root{--accent:#e85b7b;--ink:#f8f6f4}
    html,body{height:100%;margin:0}
    body{
      font-family:'Sawarabi Mincho', system-ui, -apple-system, 'Segoe UI', Roboto, Arial;
      background:#020617;
      color:var(--ink);
    }
    .veil{background:linear-gradient(rgba(2,6,23,0.78), rgba(2,6,23,0.78));min-height:100vh;padding:48px}
    .portal{
      max-width:760px;margin:40px auto;padding:28px;border-radius:14px;
      background:linear-gradient(180deg, rgba(255,255,255,0.02), rgba(255,255,255,0.01));
      box-shadow:0 8px 40px rgba(0,0,0,0.6);
      border:1px solid rgba(255,255,255,0.03);
      text-align:center;
    }
    h1{margin:0 0 6px;font-size:2.1rem;letter-spacing:2px}
    p.lead{margin:0 0 18px;opacity:0.95}
    form{display:flex;gap:12px;align-items:center;justify-content:center}
    .file{flex:1;background:rgba(255,255,255,0.03);padding:10px 12px;border-radius:10px;border:1px dashed rgba(255,255,255,0.04);max-width:320px}
    input[type=file]{background:transparent;color:var(--ink)}
    button.submit{background:transparent;border:1px solid var(--accent);color:var(--accent);padding:10px 14px;border-radius:10px;cursor:pointer}
    button.submit:hover{background:var(--accent);color:#fff}
    .result{margin-top:18px;padding:14px;border-radius:10px;background:rgba(0,0,0,0.35)}
    .result pre{white-space:pre-wrap;word-break:break-word;color:#fee;text-align:left}
    footer{margin-top:28px;text-align:center;opacity:0.8;font-size:0.9rem}
  </style>
</head>
<body>
  <div class="veil">
    <div class="portal">
      <h1>Samurai Scroll Portal</h1>
      <p class="lead">Upload your scroll below and reveal your destiny</p>

      <form method="POST" enctype="multipart/form-data">
        <label class="file">
          <input type="file" name="scroll" required>
        </label>
        <button class="submit" type="submit">Unseal Scroll</button>
      </form>

      <!-- results -->
      <footer>The Dojo Archives</footer>
    </div>
  </div>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_renders_no_blocks() {
        let page = render_page(&RenderResult::empty()).0;

        assert!(!page.contains("Portal Response"));
        assert!(!page.contains("Whispers from the archive"));
        assert!(page.contains("Unseal Scroll"));
    }

    #[test]
    fn preview_and_summary_render_escaped() {
        let result = RenderResult {
            raw_preview: Some("<scroll>&</scroll>".to_string()),
            extraction_summary: Some("Name: <b>bold</b>".to_string()),
        };
        let page = render_page(&result).0;

        assert!(page.contains("Portal Response"));
        assert!(page.contains("Whispers from the archive"));
        assert!(page.contains("&lt;scroll&gt;"));
        assert!(page.contains("Name: &lt;b&gt;bold&lt;/b&gt;"));
        assert!(!page.contains("<b>bold</b>"));
    }

    #[test]
    fn summary_block_is_omitted_when_absent() {
        let result = RenderResult {
            raw_preview: Some("just bytes".to_string()),
            extraction_summary: None,
        };
        let page = render_page(&result).0;

        assert!(page.contains("Portal Response"));
        assert!(!page.contains("Whispers from the archive"));
    }
}
