//! REST + server-sent-event surface over the progression engine.

mod stream;

use crate::config::DurationTable;
use crate::logic::{
    attach_names, board, compute_standings, pool_rank, standings_csv, ClockRegistry, ClockView,
    DisplaySlot, MatchClock, SessionId,
};
use crate::models::{IdentityProvider, TeamId, TournamentError, TournamentResult};
use crate::session::{Sessions, ViewSession};
use crate::store::{ChangeFilter, ScheduleStore};
use actix_session::config::CookieContentSecurity;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{
    delete, get, post,
    web::{self, Data, Json, Path, Query},
    HttpResponse, Responder,
};
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Cookie field holding the server-side session id.
const SESSION_COOKIE_KEY: &str = "sid";

/// Shared server state.
pub struct AppState {
    pub store: Arc<dyn ScheduleStore>,
    pub clocks: Arc<ClockRegistry>,
    pub sessions: Sessions,
    pub identity: Arc<dyn IdentityProvider>,
}

type State = Data<AppState>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    active_clocks: usize,
    sessions: usize,
}

#[derive(Deserialize)]
struct SignInBody {
    operator_id: String,
}

#[derive(Deserialize)]
struct BoardQuery {
    #[serde(default)]
    visible: Option<bool>,
}

#[derive(Deserialize)]
struct ScoreBody {
    slot: DisplaySlot,
    delta: i32,
}

#[derive(Deserialize)]
struct DurationBody {
    text: String,
}

#[derive(Deserialize)]
struct OvertimeBody {
    #[serde(default)]
    minutes: String,
}

#[derive(Deserialize)]
struct EndBody {
    #[serde(default)]
    confirm: bool,
}

/// Path segment: event id (e.g. /api/events/{id})
#[derive(Deserialize)]
struct EventPath {
    id: String,
}

/// Path segments: event id and team id (e.g. /api/events/{id}/pools/{team}/rank)
#[derive(Deserialize)]
struct EventTeamPath {
    id: String,
    team: String,
}

/// Path segment: match id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct MatchPath {
    id: String,
}

#[derive(Serialize)]
struct BoardRow<'a> {
    #[serde(flatten)]
    entry: &'a crate::logic::BoardEntry,
    name_a: &'a str,
    name_b: &'a str,
}

#[derive(Serialize)]
struct ActionResponse<T: Serialize> {
    result: T,
    clock: ClockView,
}

/// Cookie session middleware. `secure` restricts the cookie to HTTPS.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_content_security(CookieContentSecurity::Private)
        .build()
}

/// Register every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_sign_in)
        .service(api_sign_out)
        .service(api_list_events)
        .service(api_event_board)
        .service(api_standings)
        .service(api_standings_csv)
        .service(api_pool_rank)
        .service(api_event_stream)
        .service(api_get_match)
        .service(api_match_stream)
        .service(api_clock_stream)
        .service(api_start)
        .service(api_score)
        .service(api_swap)
        .service(api_pause)
        .service(api_duration)
        .service(api_overtime)
        .service(api_end);
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Validation(_) => HttpResponse::BadRequest().json(body),
        TournamentError::Unauthorized { .. } => HttpResponse::Forbidden().json(body),
        TournamentError::NotSignedIn => HttpResponse::Unauthorized().json(body),
        TournamentError::MatchNotFound(_) | TournamentError::EventNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        TournamentError::InvalidStatus { .. }
        | TournamentError::InvalidState(_)
        | TournamentError::ConfirmationRequired
        | TournamentError::InvariantViolation(_) => HttpResponse::Conflict().json(body),
        TournamentError::Store(_) => HttpResponse::ServiceUnavailable().json(body),
    }
}

fn respond<T: Serialize>(result: TournamentResult<T>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn cookie_session_id(session: &Session) -> Option<SessionId> {
    session.get::<SessionId>(SESSION_COOKIE_KEY).ok().flatten()
}

/// Run `f` against this browser's view session, creating one if needed.
fn with_view<T>(
    state: &AppState,
    session: &Session,
    f: impl FnOnce(&mut ViewSession) -> T,
) -> TournamentResult<(SessionId, T)> {
    let (id, out) = state.sessions.with(cookie_session_id(session), f)?;
    if let Err(e) = session.insert(SESSION_COOKIE_KEY, id) {
        warn!("Could not store session cookie: {e}");
    }
    Ok((id, out))
}

/// Team names for the event, from the session cache (rebuilt when the event changes).
fn event_names(
    state: &AppState,
    session: &Session,
    event_id: &str,
) -> TournamentResult<HashMap<TeamId, String>> {
    let (_, cached) = with_view(state, session, |v| v.event() == Some(event_id))?;
    let teams = if cached {
        Vec::new()
    } else {
        state.store.teams_for_event(event_id)?
    };
    let (_, names) = with_view(state, session, |v| {
        if !cached {
            v.select_event(event_id, &teams);
        }
        v.names().clone()
    })?;
    Ok(names)
}

/// Select `match_id` in the session (releasing the previously selected clock) and run a clock
/// action as the signed-in operator.
fn clock_action<T>(
    state: &AppState,
    session: &Session,
    match_id: &str,
    action: impl FnOnce(&mut MatchClock, &dyn ScheduleStore, &DurationTable) -> TournamentResult<T>,
) -> TournamentResult<ActionResponse<T>>
where
    T: Serialize,
{
    let (sid, (operator, previous)) = with_view(state, session, |v| {
        (v.require_operator().cloned(), v.select_match(match_id))
    })?;
    if let Some(previous) = previous {
        state.clocks.release(&previous, sid)?;
    }
    let (result, clock) = state.clocks.operate(&operator?, match_id, sid, action)?;
    Ok(ActionResponse { result, clock })
}

#[get("/api/health")]
async fn api_health(state: State) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-progression",
        active_clocks: state.clocks.active(),
        sessions: state.sessions.len(),
    })
}

/// Start an operator session.
#[post("/api/session")]
async fn api_sign_in(state: State, session: Session, body: Json<SignInBody>) -> HttpResponse {
    let Some(operator) = state.identity.operator(body.operator_id.trim()) else {
        return error_response(&TournamentError::NotSignedIn);
    };
    info!("Operator {} signed in", operator.id);
    let signed_in = operator.clone();
    respond(with_view(&state, &session, move |v| v.sign_in(signed_in)).map(|_| operator))
}

/// End the session and let go of any clocks it held.
#[delete("/api/session")]
async fn api_sign_out(state: State, session: Session) -> HttpResponse {
    if let Some(id) = cookie_session_id(&session) {
        if let Err(e) = state.clocks.release_all(id) {
            return error_response(&e);
        }
        if let Some(mut view) = state.sessions.remove(id) {
            if let Some(op) = view.sign_out() {
                info!("Operator {} signed out", op.id);
            }
        }
    }
    session.purge();
    HttpResponse::NoContent().finish()
}

#[get("/api/events")]
async fn api_list_events(state: State) -> HttpResponse {
    respond(state.store.events())
}

/// Matches of an event in display order, each with its visibility decision.
#[get("/api/events/{id}/matches")]
async fn api_event_board(
    state: State,
    session: Session,
    path: Path<EventPath>,
    query: Query<BoardQuery>,
) -> HttpResponse {
    let result = (|| -> TournamentResult<_> {
        state.store.event(&path.id)?;
        let all = state.store.matches_for_event(&path.id)?;
        let slots = state.store.slot_table(&path.id)?;
        let names = event_names(&state, &session, &path.id)?;
        Ok((board(&all, &slots), names))
    })();
    let (rows, names) = match result {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    let name = |id: &str| names.get(id).map(String::as_str).unwrap_or(id).to_string();
    let out: Result<Vec<_>, _> = rows
        .iter()
        .filter(|row| query.visible.map_or(true, |v| row.visible == v))
        .map(|entry| {
            serde_json::to_value(BoardRow {
                entry,
                name_a: &name(&entry.game.competitor_a),
                name_b: &name(&entry.game.competitor_b),
            })
        })
        .collect();
    match out {
        Ok(out) => HttpResponse::Ok().json(out),
        Err(e) => {
            error!("Board for {} failed to serialize: {e}", path.id);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

fn event_standings(
    state: &AppState,
    session: &Session,
    event_id: &str,
) -> TournamentResult<Vec<crate::models::Standing>> {
    state.store.event(event_id)?;
    let all = state.store.matches_for_event(event_id)?;
    let slots = state.store.slot_table(event_id)?;
    let mut rows = compute_standings(&all, &slots);
    attach_names(&mut rows, &event_names(state, session, event_id)?);
    Ok(rows)
}

#[get("/api/events/{id}/standings")]
async fn api_standings(state: State, session: Session, path: Path<EventPath>) -> HttpResponse {
    respond(event_standings(&state, &session, &path.id))
}

#[get("/api/events/{id}/standings.csv")]
async fn api_standings_csv(state: State, session: Session, path: Path<EventPath>) -> HttpResponse {
    let rows = match event_standings(&state, &session, &path.id) {
        Ok(rows) => rows,
        Err(e) => return error_response(&e),
    };
    match standings_csv(&rows) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .body(csv),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Rank of one team within its pool; `rank` is null when not applicable.
#[get("/api/events/{id}/pools/{team}/rank")]
async fn api_pool_rank(state: State, path: Path<EventTeamPath>) -> HttpResponse {
    let result = (|| -> TournamentResult<_> {
        state.store.event(&path.id)?;
        let all = state.store.matches_for_event(&path.id)?;
        let slots = state.store.slot_table(&path.id)?;
        Ok(serde_json::json!({
            "competitor": path.team,
            "rank": pool_rank(&all, &slots, &path.team),
        }))
    })();
    respond(result)
}

#[get("/api/events/{id}/stream")]
async fn api_event_stream(state: State, path: Path<EventPath>) -> HttpResponse {
    if let Err(e) = state.store.event(&path.id) {
        return error_response(&e);
    }
    stream::changes(state.store.subscribe(ChangeFilter::Event(path.id.clone())))
}

/// Match record plus the shared clock. Selecting a match releases the previous one.
#[get("/api/matches/{id}")]
async fn api_get_match(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    let result = (|| -> TournamentResult<_> {
        let game = state.store.get_match(&path.id)?;
        let (sid, (operator, previous)) = with_view(&state, &session, |v| {
            (v.operator().cloned(), v.select_match(&path.id))
        })?;
        if let Some(previous) = previous {
            state.clocks.release(&previous, sid)?;
        }
        let read_only = !operator.is_some_and(|op| op.may_operate(&game));
        let clock = state.clocks.acquire(&path.id, sid)?.for_viewer(read_only);
        Ok(serde_json::json!({ "match": game, "clock": clock }))
    })();
    respond(result)
}

#[get("/api/matches/{id}/stream")]
async fn api_match_stream(state: State, path: Path<MatchPath>) -> HttpResponse {
    if let Err(e) = state.store.get_match(&path.id) {
        return error_response(&e);
    }
    stream::changes(state.store.subscribe(ChangeFilter::Match(path.id.clone())))
}

#[get("/api/matches/{id}/clock/stream")]
async fn api_clock_stream(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    let result = (|| -> TournamentResult<_> {
        let game = state.store.get_match(&path.id)?;
        let (sid, operator) = with_view(&state, &session, |v| v.operator().cloned())?;
        let read_only = !operator.is_some_and(|op| op.may_operate(&game));
        let (initial, rx) = state.clocks.watch(&path.id, sid)?;
        Ok((initial, rx, read_only))
    })();
    match result {
        Ok((initial, rx, read_only)) => stream::clock_views(initial, rx, read_only),
        Err(e) => error_response(&e),
    }
}

#[post("/api/matches/{id}/start")]
async fn api_start(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    respond(clock_action(&state, &session, &path.id, |clock, store, durations| {
        clock.start(store, durations, Utc::now())
    }))
}

#[post("/api/matches/{id}/score")]
async fn api_score(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    respond(clock_action(&state, &session, &path.id, |clock, _, _| {
        clock.adjust_score(body.slot, body.delta, Instant::now())
    }))
}

#[post("/api/matches/{id}/swap")]
async fn api_swap(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    respond(clock_action(&state, &session, &path.id, |clock, _, _| {
        clock.swap_sides()
    }))
}

#[post("/api/matches/{id}/pause")]
async fn api_pause(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    respond(clock_action(&state, &session, &path.id, |clock, _, _| {
        clock.toggle_pause()
    }))
}

#[post("/api/matches/{id}/duration")]
async fn api_duration(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Json<DurationBody>,
) -> HttpResponse {
    respond(clock_action(&state, &session, &path.id, |clock, _, _| {
        clock.set_duration(&body.text)
    }))
}

#[post("/api/matches/{id}/overtime")]
async fn api_overtime(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Json<OvertimeBody>,
) -> HttpResponse {
    respond(clock_action(&state, &session, &path.id, |clock, _, _| {
        clock.grant_overtime(&body.minutes)
    }))
}

#[post("/api/matches/{id}/end")]
async fn api_end(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Option<Json<EndBody>>,
) -> HttpResponse {
    let confirmed = body.map(|b| b.confirm).unwrap_or(false);
    respond(clock_action(&state, &session, &path.id, |clock, store, _| {
        clock.end(store, confirmed)
    }))
}
