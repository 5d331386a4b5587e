use axum::extract::Extension;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::RwLock;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum MonitorMessage {
    Job(JobMessage),
}

/// Outcome of a single job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobMessage {
    pub id: &'static str,
    pub ok: bool,
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: time::OffsetDateTime,
}

impl JobMessage {
    pub fn success(id: &'static str, summary: String) -> Self {
        Self {
            id,
            ok: true,
            summary,
            at: time::OffsetDateTime::now_utc(),
        }
    }

    pub fn failure(id: &'static str, summary: String) -> Self {
        Self {
            id,
            ok: false,
            summary,
            at: time::OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Default)]
struct MonitorData {
    /// Last run of each job
    pub jobs: BTreeMap<&'static str, JobMessage>,
}

type SharedState = Arc<RwLock<MonitorData>>;

pub struct Monitor {
    port: u16,
    tx: mpsc::Sender<MonitorMessage>,
    rx: mpsc::Receiver<MonitorMessage>,
}

impl Monitor {
    pub fn new(port: u16) -> Self {
        let (tx, rx) = mpsc::channel(32);
        Self { port, tx, rx }
    }

    pub fn sender(&self) -> mpsc::Sender<MonitorMessage> {
        self.tx.clone()
    }

    pub async fn start(&mut self) {
        let state = SharedState::default();

        self.start_server(state.clone());

        while let Some(msg) = self.rx.recv().await {
            match msg {
                MonitorMessage::Job(job) => {
                    if let Ok(mut data) = state.write() {
                        data.jobs.insert(job.id, job);
                    }
                }
            };
        }
    }

    fn start_server(&self, state: SharedState) {
        let app = Router::new()
            .route(
                "/",
                get(|| async { "Hey there, you're probably after /status" }),
            )
            .route("/status", get(status))
            .layer(Extension(state));

        let address = SocketAddr::from(([0, 0, 0, 0], self.port));
        tokio::spawn(async move {
            tracing::info!("listening on {}", &address);

            if let Err(e) = axum::Server::bind(&address)
                .serve(app.into_make_service())
                .await
            {
                tracing::error!("status server stopped: {e}");
            }
        });
    }
}

async fn status(Extension(state): Extension<SharedState>) -> Json<Vec<JobMessage>> {
    let jobs = match state.read() {
        Ok(data) => data.jobs.values().cloned().collect(),
        Err(_) => vec![],
    };
    Json(jobs)
}
