use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::error::SearchError;
use crate::loader::DocumentFormat;
use crate::search::SearchHit;

/// Body of `POST /search`, accepted as JSON or as an urlencoded form
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub folder_name: String,
    pub keyword: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn rejection(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

impl From<JsonRejection> for SearchRequestRejection {
    fn from(e: JsonRejection) -> Self {
        Self(rejection(e.status(), e.body_text()))
    }
}

impl From<FormRejection> for SearchRequestRejection {
    fn from(e: FormRejection) -> Self {
        Self(rejection(e.status(), e.body_text()))
    }
}

pub struct SearchRequestRejection(Response);

impl IntoResponse for SearchRequestRejection {
    fn into_response(self) -> Response {
        self.0
    }
}

impl<S> FromRequest<S> for SearchRequest
where
    S: Send + Sync,
{
    type Rejection = SearchRequestRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<SearchRequest>::from_request(req, state).await?;
            Ok(body)
        } else {
            let Json(body) = Json::<SearchRequest>::from_request(req, state).await?;
            Ok(body)
        }
    }
}

/// One entry of the `POST /search` response
#[derive(Debug, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub hit: SearchHit,
    pub highlighted_url: Option<String>,
}

/// Percent-encode each `/`-separated segment of a relative path
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn base_url(headers: &HeaderMap, public_url: Option<&str>) -> String {
    if let Some(url) = public_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

fn highlighted_route(format: DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Pdf => "highlighted_pdfs",
        DocumentFormat::Docx => "highlighted_docx",
    }
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: SearchRequest,
) -> Result<Json<Vec<SearchResult>>, SearchError> {
    tracing::info!(
        "Search {:?} in folder {:?}",
        request.keyword,
        request.folder_name
    );

    let service = state.service.clone();
    let folder = request.folder_name.clone();
    let keyword = request.keyword;
    let limit = request.limit;
    let hits = tokio::task::spawn_blocking(move || service.search(&folder, &keyword, limit, true))
        .await
        .map_err(|e| SearchError::Task(e.to_string()))??;

    let base = base_url(&headers, state.public_url.as_deref());
    let folder = urlencoding::encode(&request.folder_name);
    let results = hits
        .into_iter()
        .map(|hit| {
            let highlighted_url = hit.highlighted_path.as_deref().map(|path| {
                format!(
                    "{base}/{}/{folder}/{}",
                    highlighted_route(hit.format),
                    encode_path(path)
                )
            });
            SearchResult {
                hit,
                highlighted_url,
            }
        })
        .collect();

    Ok(Json(results))
}

async fn serve_file(
    state: &AppState,
    folder: &str,
    file: &str,
    format: DocumentFormat,
) -> Result<Response, SearchError> {
    let path = state.service.resolve_file(folder, file, format)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| SearchError::FileNotFound(path.clone()))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "'"))
        .unwrap_or_default();

    Ok((
        [
            (CONTENT_TYPE, format.media_type().to_string()),
            (CONTENT_DISPOSITION, format!("inline; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response())
}

pub async fn highlighted_pdf(
    State(state): State<AppState>,
    Path((folder, file)): Path<(String, String)>,
) -> Result<Response, SearchError> {
    serve_file(&state, &folder, &file, DocumentFormat::Pdf).await
}

pub async fn highlighted_docx(
    State(state): State<AppState>,
    Path((folder, file)): Path<(String, String)>,
) -> Result<Response, SearchError> {
    serve_file(&state, &folder, &file, DocumentFormat::Docx).await
}

pub async fn pdf(
    State(state): State<AppState>,
    Path((folder, file)): Path<(String, String)>,
) -> Result<Response, SearchError> {
    serve_file(&state, &folder, &file, DocumentFormat::Pdf).await
}

pub async fn docx(
    State(state): State<AppState>,
    Path((folder, file)): Path<(String, String)>,
) -> Result<Response, SearchError> {
    serve_file(&state, &folder, &file, DocumentFormat::Docx).await
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
