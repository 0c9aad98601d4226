//! In-process stand-ins for the three literature APIs and the inference API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use medpulse_ingestion::aggregator::Aggregator;
use medpulse_ingestion::sources::clinicaltrials::ClinicalTrialsClient;
use medpulse_ingestion::sources::medrxiv::MedRxivClient;
use medpulse_ingestion::sources::pubmed::PubMedClient;
use medpulse_ingestion::sources::LiteratureSource;
use serde_json::json;

/// How one upstream endpoint answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Ok,
    ServerError,
    Malformed,
}

#[derive(Clone, Default)]
pub struct Upstream {
    pub pubmed: Mode,
    pub clinicaltrials: Mode,
    pub medrxiv: Mode,
    /// Every literature request, any endpoint.
    pub calls: Arc<AtomicUsize>,
    /// Query strings seen, as `(endpoint, term)`.
    pub queries: Arc<Mutex<Vec<(String, String)>>>,
    pub inference_calls: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn literature_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, endpoint: &str, params: &HashMap<String, String>, key: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let term = params.get(key).cloned().unwrap_or_default();
        self.queries.lock().unwrap().push((endpoint.to_string(), term));
    }
}

pub const PUBMED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE">
      <PMID Version="1">39000001</PMID>
      <Article>
        <Journal><JournalIssue><PubDate><Year>2024</Year></PubDate></JournalIssue></Journal>
        <ArticleTitle>Smart insulin pen with dose logging</ArticleTitle>
        <Abstract><AbstractText>A connected device that records every dose.</AbstractText></Abstract>
        <AuthorList>
          <Author><LastName>Silva</LastName><ForeName>Ana</ForeName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn esearch(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("esearch", &params, "term");
    match up.pubmed {
        Mode::Ok => Json(json!({"esearchresult": {"count": "1", "idlist": ["39000001"]}})).into_response(),
        Mode::ServerError => server_error(),
        Mode::Malformed => "this is not json".into_response(),
    }
}

async fn efetch(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("efetch", &params, "id");
    match up.pubmed {
        Mode::Ok => PUBMED_XML.into_response(),
        Mode::ServerError => server_error(),
        Mode::Malformed => "<PubmedArticleSet><PubmedArticle><Medline".into_response(),
    }
}

async fn study_fields(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("clinicaltrials", &params, "expr");
    match up.clinicaltrials {
        Mode::Ok => Json(json!({"StudyFieldsResponse": {"StudyFields": [{
            "NCTId": ["NCT05000001"],
            "BriefTitle": ["Remote cardiac monitoring device"],
            "BriefSummary": ["Evaluates a patch-based ECG monitor."],
            "LocationFacility": ["Mayo Clinic"],
            "StartDate": ["March 2023"]
        }]}}))
        .into_response(),
        Mode::ServerError => server_error(),
        Mode::Malformed => "<html>maintenance</html>".into_response(),
    }
}

async fn medrxiv(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("medrxiv", &params, "q");
    match up.medrxiv {
        Mode::Ok => Json(json!({"results": [{
            "title": "Low-cost ultrasound probe for rural clinics",
            "abstract": "A handheld probe evaluated in 40 clinics.",
            "authors": ["K. Osei", "L. Mensah"],
            "date": "2024-10-02",
            "doi": "10.1101/2024.10.02.24314000"
        }]}))
        .into_response(),
        Mode::ServerError => server_error(),
        Mode::Malformed => Json(json!({"results": "unavailable"})).into_response(),
    }
}

/// Inference stand-in: echoes the model path so each backend's output is
/// distinguishable.
async fn inference(State(up): State<Upstream>, uri: Uri) -> Response {
    up.inference_calls.fetch_add(1, Ordering::SeqCst);
    let model = uri.path().trim_start_matches("/models/").to_string();
    Json(json!([{"summary_text": format!("summary from {model}")}])).into_response()
}

pub struct StubServer {
    pub base: String,
    pub upstream: Upstream,
}

impl StubServer {
    pub async fn start(upstream: Upstream) -> Self {
        let app = Router::new()
            .route("/eutils/esearch.fcgi", get(esearch))
            .route("/eutils/efetch.fcgi", get(efetch))
            .route("/ct/query/study_fields", get(study_fields))
            .route("/medrxiv/details/medrxiv", get(medrxiv))
            .route("/models/{*model}", post(inference))
            .with_state(upstream.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base: format!("http://{addr}"), upstream }
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", self.base)
    }

    /// PubMed, ClinicalTrials.gov and medRxiv clients pointed at this server.
    pub fn aggregator(&self) -> Aggregator {
        let timeout = Duration::from_secs(5);
        let sources: Vec<Arc<dyn LiteratureSource>> = vec![
            Arc::new(
                PubMedClient::new(timeout)
                    .unwrap()
                    .with_base_url(format!("{}/eutils", self.base)),
            ),
            Arc::new(
                ClinicalTrialsClient::new(timeout)
                    .unwrap()
                    .with_base_url(format!("{}/ct/query/study_fields", self.base)),
            ),
            Arc::new(
                MedRxivClient::new(timeout)
                    .unwrap()
                    .with_base_url(format!("{}/medrxiv/details/medrxiv", self.base)),
            ),
        ];
        Aggregator::new(sources)
    }
}
