//! Single binary web server exposing the tournament engine over a JSON API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT. Log level via RUST_LOG.

use actix_web::{
    delete, get, patch, post,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tournament_engine::{
    generate_bracket, generate_round_robin, group_standings, update_match, ErrorKind, Group,
    MatchId, MatchUpdate, MemoryStore, PlayoffOptions, RoundRobinOptions, Stage, StageKind, Store,
    TeamId, Tournament, TournamentError, TournamentId,
};
use uuid::Uuid;

/// In-memory state: every tournament with its groups, stages and matches.
type AppState = Data<RwLock<MemoryStore>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupBody {
    id: Option<String>,
    name: String,
    #[serde(default)]
    team_ids: Vec<TeamId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTournamentBody {
    id: Option<TournamentId>,
    name: String,
    #[serde(default)]
    groups: Vec<GroupBody>,
    #[serde(default = "default_group_stage_name")]
    group_stage_name: String,
}

fn default_group_stage_name() -> String {
    "Group stage".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedTournament {
    tournament: Tournament,
    stage: Stage,
    groups: Vec<Group>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct StagePath {
    id: String,
}

#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

/// Map an engine error to a JSON error response with the matching status.
fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::BadRequest => HttpResponse::BadRequest().json(body),
        ErrorKind::Conflict => HttpResponse::Conflict().json(body),
    }
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-engine",
    })
}

/// Register a tournament with its groups; creates its group stage.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut store = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let tournament = Tournament::new(
        body.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        body.name.trim(),
    );
    let groups: Vec<Group> = body
        .groups
        .into_iter()
        .map(|g| {
            Group::new(
                g.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                tournament.id.clone(),
                g.name,
                g.team_ids,
            )
        })
        .collect();
    let stage = Stage::new(
        Uuid::new_v4().to_string(),
        tournament.id.clone(),
        StageKind::Group,
        body.group_stage_name,
        1,
    );

    store.add_tournament(tournament.clone());
    for g in &groups {
        store.add_group(g.clone());
    }
    let stage = match store.insert_stage(stage) {
        Ok(stage) => stage,
        Err(e) => return error_response(&e),
    };
    log::info!("Created tournament {} with {} group(s)", tournament.id, groups.len());
    HttpResponse::Ok().json(CreatedTournament {
        tournament,
        stage,
        groups,
    })
}

/// Full ranked table of every group.
#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let store = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if store.tournament(&path.id).is_none() {
        return error_response(&TournamentError::TournamentNotFound(path.id.clone()));
    }
    HttpResponse::Ok().json(group_standings(&*store, &path.id))
}

/// Generate group fixtures. Returns `{ "created": n }`.
#[post("/api/tournaments/{id}/round-robin")]
async fn api_generate_round_robin(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<RoundRobinOptions>,
) -> HttpResponse {
    let mut store = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match generate_round_robin(&mut *store, &path.id, &body) {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => error_response(&e),
    }
}

/// Generate the playoff bracket. Returns all playoff matches.
#[post("/api/tournaments/{id}/playoffs")]
async fn api_generate_playoffs(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<PlayoffOptions>,
) -> HttpResponse {
    let mut store = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match generate_bracket(&mut *store, &path.id, &body) {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => error_response(&e),
    }
}

/// Matches of a stage by kick-off, then round.
#[get("/api/stages/{id}/matches")]
async fn api_stage_matches(state: AppState, path: Path<StagePath>) -> HttpResponse {
    let store = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if store.stage(&path.id).is_none() {
        return error_response(&TournamentError::StageNotFound);
    }
    let mut matches = store.matches_in_stage(&path.id);
    matches.sort_by(|a, b| a.date.cmp(&b.date).then(a.round.cmp(&b.round)));
    HttpResponse::Ok().json(matches)
}

/// Edit status/score/events of a match; dependent bracket slots follow.
#[patch("/api/matches/{id}")]
async fn api_update_match(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<MatchUpdate>,
) -> HttpResponse {
    let mut store = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match update_match(&mut *store, path.id, body.into_inner()) {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => error_response(&e),
    }
}

/// Delete a match together with its events.
#[delete("/api/matches/{id}")]
async fn api_delete_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match store.delete_match(path.id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(MemoryStore::new()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_standings)
            .service(api_generate_round_robin)
            .service(api_generate_playoffs)
            .service(api_stage_matches)
            .service(api_update_match)
            .service(api_delete_match)
    })
    .bind(bind)?
    .run()
    .await
}
