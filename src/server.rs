use crate::data::{Catalog, Classroom, Session, Teacher, Timetable};
use crate::engine::{self, Diagnostics, SolveError, SolverParams};
use crate::sample;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::info;
use serde::{Deserialize, Serialize};

/// Request body for a timetable run. Every collection is optional; a
/// missing one is backfilled from the sample catalog so the endpoint can
/// be exercised without any data on hand.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub sessions: Option<Vec<Session>>,
    pub teachers: Option<Vec<Teacher>>,
    pub classrooms: Option<Vec<Classroom>>,
    pub semester: Option<String>,
    #[serde(default)]
    pub params: SolverParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub timetable: Timetable,
    pub best_fitness: f64,
    pub generations_run: usize,
    pub converged: bool,
    pub diagnostics: Diagnostics,
}

/// The only user-visible failure surface: every rejected run becomes a
/// JSON error object with a failure status.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn resolve_catalog(
    sessions: Option<Vec<Session>>,
    teachers: Option<Vec<Teacher>>,
    classrooms: Option<Vec<Classroom>>,
) -> Catalog {
    Catalog {
        sessions: sessions.unwrap_or_else(sample::sessions),
        teachers: teachers.unwrap_or_else(sample::teachers),
        classrooms: classrooms.unwrap_or_else(sample::classrooms),
    }
}

fn status_for(error: &SolveError) -> StatusCode {
    match error {
        SolveError::InvalidParams(_) => StatusCode::BAD_REQUEST,
        SolveError::EmptyCatalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

async fn generate_handler(
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorBody>)> {
    if let Some(semester) = &request.semester {
        info!("Generating timetable for semester {semester}");
    }
    let catalog = resolve_catalog(request.sessions, request.teachers, request.classrooms);

    match engine::solve(&catalog, &request.params) {
        Ok(outcome) => Ok(Json(GenerateResponse {
            timetable: outcome.best.to_timetable(&catalog),
            best_fitness: outcome.best_score,
            generations_run: outcome.generations_run,
            converged: outcome.converged,
            diagnostics: outcome.diagnostics,
        })),
        Err(error) => Err((
            status_for(&error),
            Json(ErrorBody {
                error: error.to_string(),
            }),
        )),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/timetable/generate", post(generate_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
