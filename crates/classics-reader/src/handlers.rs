use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use classics_db::{DictionaryStore, Store};
use classics_lexicon::{Lexicon, OCCURRENCE_LIMIT, confidence_shares};
use classics_morphy::{CandidateSource, GreekLemmatizer, LemmaCandidate};
use classics_types::{Language, OccurrenceRecord, ResolvedEntry, WordMatch, normalize};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const DEFAULT_SUGGEST_LIMIT: usize = 10;
pub const MAX_SUGGEST_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub lexicon: Arc<Lexicon<Store>>,
    pub lemmatizer: GreekLemmatizer,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct WordQuery {
    #[serde(default)]
    pub word: String,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub prefix: String,
    pub language: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct OccurrenceQuery {
    #[serde(default)]
    pub lemma: String,
}

#[derive(Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub known_only: bool,
}

#[derive(Serialize)]
pub struct NormalizeResponse {
    word: String,
    language: Option<&'static str>,
    normalized: String,
}

#[derive(Serialize)]
pub struct EntryItem {
    lemma: String,
    definition: String,
    direct: bool,
    confidence: Option<f64>,
    share: Option<f64>,
    morph_info: Option<String>,
}

#[derive(Serialize)]
pub struct EntriesResponse {
    word: String,
    language: Option<&'static str>,
    items: Vec<EntryItem>,
}

#[derive(Serialize)]
pub struct EntryResponse {
    word: String,
    language: Option<&'static str>,
    entry: Option<EntryItem>,
}

#[derive(Serialize)]
pub struct LemmaResponse {
    word: String,
    language: Option<&'static str>,
    lemma: Option<String>,
}

#[derive(Serialize)]
pub struct Suggestion {
    headword: String,
    headword_normalized: String,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    prefix: String,
    language: Option<&'static str>,
    limit: usize,
    items: Vec<Suggestion>,
}

#[derive(Serialize)]
pub struct OccurrenceItem {
    book_id: String,
    line_number: u32,
    line_text: String,
    matches: Vec<MatchItem>,
}

#[derive(Serialize)]
pub struct MatchItem {
    word: String,
    position: u32,
}

#[derive(Serialize)]
pub struct OccurrencesResponse {
    lemma: String,
    total: usize,
    limit: usize,
    truncated: bool,
    items: Vec<OccurrenceItem>,
}

#[derive(Serialize)]
pub struct CandidateItem {
    lemma: String,
    source: &'static str,
    rule: Option<String>,
}

#[derive(Serialize)]
pub struct CandidatesResponse {
    word: String,
    known_only: bool,
    items: Vec<CandidateItem>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/robots.txt", get(robots))
        .route("/healthz", get(healthz))
        .route("/v1/normalize", get(normalize_word))
        .route("/v1/entries", get(entries))
        .route("/v1/entry", get(entry))
        .route("/v1/lemma", get(lemma))
        .route("/v1/suggest", get(suggest))
        .route("/v1/occurrences", get(occurrences))
        .route("/v1/candidates", get(candidates))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

/// Crawlers are turned away from the whole service. The body is always
/// labelled plain text; only the cache header follows `disable_cache`.
async fn robots(State(state): State<AppState>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    if !state.disable_cache {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(ROBOTS_CACHE));
    }
    (headers, ROBOTS_TXT).into_response()
}

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";
const ROBOTS_CACHE: &str = "public, max-age=86400";

/// Missing language means Greek; an unrecognised label yields `None` and an
/// empty result rather than an error.
fn parse_language(raw: Option<&str>) -> Option<Language> {
    match raw {
        None => Some(Language::Greek),
        Some(raw) => Language::parse(raw),
    }
}

async fn normalize_word(
    State(state): State<AppState>,
    Query(params): Query<WordQuery>,
) -> Response {
    let language = parse_language(params.language.as_deref());
    let normalized = language
        .map(|language| normalize(&params.word, language))
        .unwrap_or_default();
    let response = NormalizeResponse {
        word: params.word,
        language: language.map(Language::as_str),
        normalized,
    };
    json_response(&state, LONG_CACHE, response)
}

async fn entries(
    State(state): State<AppState>,
    Query(params): Query<WordQuery>,
) -> Result<Response, ApiError> {
    let language = parse_language(params.language.as_deref());
    let items = match language {
        Some(language) => {
            let lexicon = Arc::clone(&state.lexicon);
            let word = params.word.clone();
            let resolved = blocking(move || lexicon.resolve_all(&word, language)).await?;
            let shares = confidence_shares(&resolved);
            resolved
                .into_iter()
                .zip(shares)
                .map(|(entry, share)| entry_item(entry, share))
                .collect()
        }
        None => Vec::new(),
    };
    let response = EntriesResponse {
        word: params.word,
        language: language.map(Language::as_str),
        items,
    };
    Ok(json_response(&state, SHORT_CACHE, response))
}

async fn entry(
    State(state): State<AppState>,
    Query(params): Query<WordQuery>,
) -> Result<Response, ApiError> {
    let language = parse_language(params.language.as_deref());
    let entry = match language {
        Some(language) => {
            let lexicon = Arc::clone(&state.lexicon);
            let word = params.word.clone();
            blocking(move || lexicon.resolve_first(&word, language))
                .await?
                .map(|entry| entry_item(entry, None))
        }
        None => None,
    };
    let response = EntryResponse {
        word: params.word,
        language: language.map(Language::as_str),
        entry,
    };
    Ok(json_response(&state, SHORT_CACHE, response))
}

async fn lemma(
    State(state): State<AppState>,
    Query(params): Query<WordQuery>,
) -> Result<Response, ApiError> {
    let language = parse_language(params.language.as_deref());
    let lemma = match language {
        Some(language) => {
            let lexicon = Arc::clone(&state.lexicon);
            let word = params.word.clone();
            blocking(move || lexicon.lemma_for_word(&word, language)).await?
        }
        None => None,
    };
    let response = LemmaResponse {
        word: params.word,
        language: language.map(Language::as_str),
        lemma,
    };
    Ok(json_response(&state, SHORT_CACHE, response))
}

async fn suggest(
    State(state): State<AppState>,
    Query(params): Query<SuggestQuery>,
) -> Result<Response, ApiError> {
    let mut limit = params.limit.unwrap_or(DEFAULT_SUGGEST_LIMIT);
    if limit == 0 {
        return Err(ApiError::bad_request("limit must be >= 1"));
    }
    if limit > MAX_SUGGEST_LIMIT {
        limit = MAX_SUGGEST_LIMIT;
    }

    let language = parse_language(params.language.as_deref());
    let items = match language {
        Some(language) => {
            let lexicon = Arc::clone(&state.lexicon);
            let prefix = params.prefix.clone();
            blocking(move || lexicon.suggest(&prefix, language, limit))
                .await?
                .into_iter()
                .map(|entry| Suggestion {
                    headword: entry.headword,
                    headword_normalized: entry.headword_normalized,
                })
                .collect()
        }
        None => Vec::new(),
    };
    let response = SuggestResponse {
        prefix: params.prefix,
        language: language.map(Language::as_str),
        limit,
        items,
    };
    Ok(json_response(&state, SHORT_CACHE, response))
}

async fn occurrences(
    State(state): State<AppState>,
    Query(params): Query<OccurrenceQuery>,
) -> Result<Response, ApiError> {
    let lexicon = Arc::clone(&state.lexicon);
    let lemma = params.lemma.clone();
    let (total, records) = blocking(move || {
        let total = lexicon.count_occurrences(&lemma);
        let records = lexicon.find_occurrences(&lemma);
        (total, records)
    })
    .await?;

    // The two numbers come from separate queries; never report fewer than shown.
    let total = total.max(records.len());
    let response = OccurrencesResponse {
        lemma: params.lemma,
        total,
        limit: OCCURRENCE_LIMIT,
        truncated: total > records.len(),
        items: records.into_iter().map(occurrence_item).collect(),
    };
    Ok(json_response(&state, SHORT_CACHE, response))
}

async fn candidates(
    State(state): State<AppState>,
    Query(params): Query<CandidateQuery>,
) -> Result<Response, ApiError> {
    let lemmatizer = state.lemmatizer;
    let word = params.word.clone();
    let found = if params.known_only {
        let lexicon = Arc::clone(&state.lexicon);
        blocking(move || {
            lemmatizer.lemmas_for(&word, |lemma| {
                match lexicon.store().entry(lemma, Language::Greek) {
                    Ok(found) => found.is_some(),
                    Err(err) => {
                        error!("dictionary check failed for candidate {lemma:?}: {err:#}");
                        false
                    }
                }
            })
        })
        .await?
    } else {
        lemmatizer.candidates(&word)
    };
    let response = CandidatesResponse {
        word: params.word,
        known_only: params.known_only,
        items: found.into_iter().map(candidate_item).collect(),
    };
    Ok(json_response(&state, LONG_CACHE, response))
}

const SHORT_CACHE: &str = "public, max-age=300";
const LONG_CACHE: &str = "public, max-age=3600";

fn json_response<T: Serialize>(state: &AppState, cache: &'static str, body: T) -> Response {
    if state.disable_cache {
        Json(body).into_response()
    } else {
        (
            [(header::CACHE_CONTROL, HeaderValue::from_static(cache))],
            Json(body),
        )
            .into_response()
    }
}

/// Run a corpus lookup off the async workers. If the request is dropped the
/// lookup still finishes and its result is discarded.
async fn blocking<T, F>(lookup: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(lookup).await.map_err(|err| {
        error!("lookup task failed: {err}");
        ApiError::Internal
    })
}

fn entry_item(entry: ResolvedEntry, share: Option<f64>) -> EntryItem {
    EntryItem {
        direct: entry.is_direct_match(),
        confidence: entry.confidence(),
        morph_info: entry.morph_info().map(str::to_string),
        share,
        lemma: entry.lemma,
        definition: entry.definition,
    }
}

fn occurrence_item(record: OccurrenceRecord) -> OccurrenceItem {
    OccurrenceItem {
        book_id: record.book_id,
        line_number: record.line_number,
        line_text: record.line_text,
        matches: record
            .matches
            .into_iter()
            .map(|WordMatch { word, position }| MatchItem { word, position })
            .collect(),
    }
}

fn candidate_item(cand: LemmaCandidate) -> CandidateItem {
    let (source, rule) = match cand.source {
        CandidateSource::Surface => ("surface", None),
        CandidateSource::NounEnding { ending } => ("noun_ending", Some(format!("-{ending}"))),
        CandidateSource::VerbEnding { ending } => ("verb_ending", Some(format!("-{ending}"))),
        CandidateSource::Augment { ending } => ("augment", Some(format!("ε- -{ending}"))),
        CandidateSource::Contraction {
            contracted,
            expansion,
        } => ("contraction", Some(format!("{contracted} > {expansion}"))),
    };
    CandidateItem {
        lemma: cand.lemma,
        source,
        rule,
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
