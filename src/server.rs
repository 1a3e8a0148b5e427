//! HTTP surface: authentication, reads, and the mutations routed through
//! [`engine`] and [`runner`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::From;
use itertools::Itertools as _;
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    api, config,
    db::{self, log, Repository},
    engine::{self, Command, Effect, Permission},
    runner,
};

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    repo: Arc<dyn Repository>,

    jwt_expiration_time: Duration,

    jwt_decoding_key: DecodingKey,

    jwt_encoding_key: EncodingKey,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, jwt: &config::Jwt) -> Self {
        Self {
            repo,
            jwt_expiration_time: jwt.expiration_time,
            jwt_decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
            jwt_encoding_key: EncodingKey::from_secret(jwt.secret.as_bytes()),
        }
    }
}

pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/auth", post(auth))
        .route("/user", get(get_user))
        .route("/ticket", get(list_tickets).post(add_ticket))
        .route("/ticket/:id", get(get_ticket).patch(edit_ticket))
        .route(
            "/ticket/:id/subticket",
            get(list_subtickets)
                .post(add_subticket)
                .patch(close_subtickets),
        )
        .route("/ticket/:id/log", get(get_action_logs))
        .route("/subticket/:id", patch(edit_subticket))
        .with_state(state)
}

/// Status code and operator-facing message of a refused operation.
fn rejection(e: &engine::Error) -> Response {
    use engine::Error as E;

    let status = match e {
        E::NoChange => StatusCode::OK,
        E::MissingReason | E::Validation(_) => StatusCode::BAD_REQUEST,
        E::Forbidden(_) => StatusCode::FORBIDDEN,
        E::TicketNotFound(_) | E::SubticketNotFound(_) => StatusCode::NOT_FOUND,
        E::OpenSubtickets(_)
        | E::Archived
        | E::TicketSolved
        | E::SubticketClosed
        | E::NoPendingSubtickets => StatusCode::CONFLICT,
    };
    (status, e.to_string()).into_response()
}

#[derive(Deserialize)]
struct AuthInput {
    login: String,
    password: String,
}

async fn auth(
    State(state): State<SharedAppState>,
    Json(AuthInput { login, password }): Json<AuthInput>,
) -> Result<String, AuthError> {
    use AuthError as E;

    let password_hash = api::user::PasswordHash::new(&password);

    let user = state
        .repo
        .get_user_by_login(&login)
        .await?
        .filter(|u| u.password_hash == password_hash)
        .ok_or(E::WrongLoginOrPassword)?;

    let expires_at = OffsetDateTime::now_utc() + state.jwt_expiration_time;
    encode(
        &Header::default(),
        &AuthClaims {
            user_id: user.id,
            exp: expires_at.unix_timestamp(),
        },
        &state.jwt_encoding_key,
    )
    .map_err(|_| E::InvalidToken)
}

#[derive(Debug, From)]
pub enum AuthError {
    #[from]
    DbError(db::Error),
    InvalidToken,
    WrongLoginOrPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::WrongLoginOrPassword => StatusCode::FORBIDDEN,
        }
        .into_response()
    }
}

async fn get_user(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
) -> Result<Json<api::User>, GetUserError> {
    use GetUserError as E;

    let my = state
        .repo
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;

    Ok(Json(api::User::from(&my)))
}

#[derive(Debug, From)]
pub enum GetUserError {
    #[from]
    DbError(db::Error),
    UserNotFound,
}

impl IntoResponse for GetUserError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct ListTicketsInput {
    offset: usize,
    limit: usize,
    #[serde(default)]
    archived: bool,
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    _: AuthClaims,
    Query(ListTicketsInput {
        offset,
        limit,
        archived,
    }): Query<ListTicketsInput>,
) -> Result<Json<api::ticket::List>, ListTicketsError> {
    use ListTicketsError as E;

    let page_fut = state.repo.get_tickets_page(archived, offset, limit);
    let total_count_fut = state.repo.get_tickets_count(archived);
    let (page, total_count) = tokio::try_join!(page_fut, total_count_fut)?;

    let user_ids = page
        .iter()
        .map(|ticket| ticket.advisor)
        .unique()
        .collect::<Vec<_>>();
    let users = state.repo.get_users_by_ids(&user_ids).await?;

    let tickets = page
        .into_iter()
        .map(|ticket| {
            let advisor = users
                .get(&ticket.advisor)
                .ok_or(E::UserNotFound(ticket.advisor))?;
            Ok::<_, E>(api::Ticket::new(ticket, api::User::from(advisor)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(api::ticket::List {
        tickets,
        total_count,
    }))
}

#[derive(Debug, From)]
pub enum ListTicketsError {
    #[from]
    DbError(db::Error),
    UserNotFound(api::user::Id),
}

impl IntoResponse for ListTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_) | Self::UserNotFound(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTicketInput {
    kind: api::ticket::Kind,
    reported_by: String,
    #[serde(default)]
    initial_diagnosis: String,
    node: String,
    olt: String,
    #[serde(default)]
    service_unavailable: bool,
    #[serde(with = "time::serde::rfc3339")]
    creation_date: OffsetDateTime,
}

async fn add_ticket(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Json(input): Json<AddTicketInput>,
) -> Result<Json<api::Ticket>, AddTicketError> {
    use AddTicketError as E;

    let my = state
        .repo
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;
    engine::authorize(&my, Permission::TicketCreate)?;

    let new = db::ticket::New {
        kind: input.kind,
        reported_by: input.reported_by.trim().to_owned(),
        initial_diagnosis: input.initial_diagnosis,
        node: input.node.trim().to_owned(),
        olt: input.olt.trim().to_owned(),
        service_unavailable: input.service_unavailable,
        advisor: my.id,
        creation_date: input.creation_date,
    };
    let now = OffsetDateTime::now_utc();
    engine::admit_ticket(&new, now)?;

    let ticket = state.repo.create_ticket(new).await?;
    tracing::info!(ticket = %ticket.code, user = %my.name, "ticket created");

    runner::execute(
        state.repo.as_ref(),
        &[Effect::Log(log::Entry {
            ticket_id: ticket.id,
            ticket_code: ticket.code.clone(),
            action: "Ticket created.".into(),
            user: my.name.clone(),
            timestamp: now,
        })],
    )
    .await?;

    Ok(Json(api::Ticket::new(ticket, api::User::from(&my))))
}

#[derive(Debug, From)]
pub enum AddTicketError {
    #[from]
    DbError(db::Error),
    #[from]
    Rejected(engine::Error),
    UserNotFound,
}

impl IntoResponse for AddTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(e) => rejection(&e),
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn get_ticket(
    State(state): State<SharedAppState>,
    _: AuthClaims,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<api::Ticket>, GetTicketError> {
    use GetTicketError as E;

    let ticket = state
        .repo
        .get_ticket_by_id(id)
        .await?
        .ok_or(E::TicketNotFound)?;
    let advisor = state
        .repo
        .get_user_by_id(ticket.advisor)
        .await?
        .ok_or(E::UserNotFound)?;

    Ok(Json(api::Ticket::new(ticket, api::User::from(&advisor))))
}

#[derive(Debug, From)]
pub enum GetTicketError {
    #[from]
    DbError(db::Error),
    TicketNotFound,
    UserNotFound,
}

impl IntoResponse for GetTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(content = "data", rename_all = "camelCase", tag = "op")]
enum EditTicketInput {
    #[serde(rename_all = "camelCase")]
    ChangeStatus {
        status: api::ticket::Status,
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
        #[serde(default)]
        reason: Option<String>,
    },
    Edit(TicketDetailsInput),
    Archive,
    Restore,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketDetailsInput {
    kind: api::ticket::Kind,
    reported_by: String,
    #[serde(default)]
    initial_diagnosis: String,
    node: String,
    olt: String,
    #[serde(default)]
    service_unavailable: bool,
}

impl From<TicketDetailsInput> for engine::TicketDetails {
    fn from(input: TicketDetailsInput) -> Self {
        Self {
            kind: input.kind,
            reported_by: input.reported_by,
            initial_diagnosis: input.initial_diagnosis,
            node: input.node,
            olt: input.olt,
            service_unavailable: input.service_unavailable,
        }
    }
}

async fn edit_ticket(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::ticket::Id>,
    Json(op): Json<EditTicketInput>,
) -> Result<Json<api::Ticket>, EditTicketError> {
    use EditTicketError as E;
    use EditTicketInput as Op;

    let my = state
        .repo
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;
    let (ticket, subtickets) = tokio::try_join!(
        state.repo.get_ticket_by_id(id),
        state.repo.get_subtickets_by_ticket(id),
    )?;
    let ticket = ticket.ok_or(E::TicketNotFound)?;

    let command = match op {
        Op::ChangeStatus { status, at, reason } => Command::ChangeStatus {
            ticket: id,
            change: engine::ChangeStatus { status, at, reason },
        },
        Op::Edit(input) => Command::EditTicket {
            ticket: id,
            details: input.into(),
        },
        Op::Archive => Command::Archive { ticket: id },
        Op::Restore => Command::Restore { ticket: id },
    };

    let now = OffsetDateTime::now_utc();
    let ticket = match engine::State::new([ticket.clone()], subtickets)
        .dispatch(&my, command, now)
    {
        Ok(reduced) => {
            runner::execute(state.repo.as_ref(), &reduced.effects).await?;
            let updated = reduced.state.ticket(id)?.clone();
            tracing::info!(
                ticket = %updated.code,
                user = %my.name,
                status = %updated.status,
                archived = updated.archived,
                "ticket updated"
            );
            updated
        }
        Err(engine::Error::NoChange) => ticket,
        Err(e) => return Err(e.into()),
    };

    let advisor = state
        .repo
        .get_user_by_id(ticket.advisor)
        .await?
        .ok_or(E::UserNotFound)?;

    Ok(Json(api::Ticket::new(ticket, api::User::from(&advisor))))
}

#[derive(Debug, From)]
pub enum EditTicketError {
    #[from]
    DbError(db::Error),
    #[from]
    Rejected(engine::Error),
    TicketNotFound,
    UserNotFound,
}

impl IntoResponse for EditTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(e) => rejection(&e),
            Self::TicketNotFound => StatusCode::NOT_FOUND.into_response(),
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn list_subtickets(
    State(state): State<SharedAppState>,
    _: AuthClaims,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<Vec<api::Subticket>>, ListSubticketsError> {
    use ListSubticketsError as E;

    let (ticket, subtickets) = tokio::try_join!(
        state.repo.get_ticket_by_id(id),
        state.repo.get_subtickets_by_ticket(id),
    )?;
    ticket.ok_or(E::TicketNotFound)?;

    Ok(Json(
        subtickets.into_iter().map(api::Subticket::from).collect(),
    ))
}

#[derive(Debug, From)]
pub enum ListSubticketsError {
    #[from]
    DbError(db::Error),
    TicketNotFound,
}

impl IntoResponse for ListSubticketsError {
    fn into_response(self) -> Response {
        match self {
            Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSubticketInput {
    cto: String,
    card: i16,
    port: i16,
    #[serde(default)]
    city: String,
    client_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    event_start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    reported_to_pext_date: OffsetDateTime,
}

async fn add_subticket(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::ticket::Id>,
    Json(input): Json<AddSubticketInput>,
) -> Result<Json<api::Subticket>, AddSubticketError> {
    use AddSubticketError as E;

    let my = state
        .repo
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;
    engine::authorize(&my, Permission::TicketCreate)?;

    let parent = state
        .repo
        .get_ticket_by_id(id)
        .await?
        .ok_or(E::TicketNotFound)?;

    let new = db::subticket::New {
        ticket_id: parent.id,
        cto: input.cto.trim().to_owned(),
        card: input.card,
        port: input.port,
        city: input.city,
        client_count: input.client_count,
        event_start_date: input.event_start_date,
        reported_to_pext_date: input.reported_to_pext_date,
        creator: my.id,
    };
    let now = OffsetDateTime::now_utc();
    engine::admit_subticket(&new, &parent, now)?;

    let subticket = state.repo.create_subticket(new).await?;
    tracing::info!(
        ticket = %parent.code,
        subticket = %subticket.code,
        user = %my.name,
        "subticket created"
    );

    runner::execute(
        state.repo.as_ref(),
        &[Effect::Log(log::Entry {
            ticket_id: parent.id,
            ticket_code: parent.code,
            action: format!("Subticket {} created.", subticket.code),
            user: my.name,
            timestamp: now,
        })],
    )
    .await?;

    Ok(Json(api::Subticket::from(subticket)))
}

#[derive(Debug, From)]
pub enum AddSubticketError {
    #[from]
    DbError(db::Error),
    #[from]
    Rejected(engine::Error),
    TicketNotFound,
    UserNotFound,
}

impl IntoResponse for AddSubticketError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(e) => rejection(&e),
            Self::TicketNotFound => StatusCode::NOT_FOUND.into_response(),
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClosingInput {
    #[serde(with = "time::serde::rfc3339")]
    event_end_date: OffsetDateTime,
    root_cause: String,
    #[serde(default)]
    bad_praxis: Option<bool>,
    solution: String,
    #[serde(default)]
    status_post_sla: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    event_responsible: String,
}

impl From<ClosingInput> for engine::Closing {
    fn from(input: ClosingInput) -> Self {
        Self {
            event_end_date: input.event_end_date,
            root_cause: input.root_cause,
            bad_praxis: input.bad_praxis,
            solution: input.solution,
            status_post_sla: input.status_post_sla,
            comment: input.comment,
            event_responsible: input.event_responsible,
        }
    }
}

async fn close_subtickets(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::ticket::Id>,
    Json(input): Json<ClosingInput>,
) -> Result<Json<api::subticket::BatchReport>, CloseSubticketsError> {
    use CloseSubticketsError as E;

    let my = state
        .repo
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;
    let (ticket, subtickets) = tokio::try_join!(
        state.repo.get_ticket_by_id(id),
        state.repo.get_subtickets_by_ticket(id),
    )?;
    let ticket = ticket.ok_or(E::TicketNotFound)?;
    let code = ticket.code.clone();

    let items = engine::State::new([ticket], subtickets).plan_close_all(
        &my,
        id,
        &input.into(),
        OffsetDateTime::now_utc(),
    )?;
    let mut outcome = runner::execute_batch(state.repo.as_ref(), items).await;

    if outcome.closed.is_empty() && !outcome.failed.is_empty() {
        let (_, failure) = outcome.failed.swap_remove(0);
        return Err(match failure {
            runner::Failure::Rejected(e) => E::Rejected(e),
            runner::Failure::Store(e) => E::DbError(e),
        });
    }
    if !outcome.failed.is_empty() {
        tracing::warn!(
            ticket = %code,
            closed = outcome.closed.len(),
            failed = outcome.failed.len(),
            "batch close partially failed"
        );
    } else {
        tracing::info!(
            ticket = %code,
            closed = outcome.closed.len(),
            "subtickets closed"
        );
    }

    Ok(Json(api::subticket::BatchReport {
        closed: outcome
            .closed
            .into_iter()
            .map(api::Subticket::from)
            .collect(),
        failed: outcome
            .failed
            .into_iter()
            .map(|(code, failure)| api::subticket::BatchFailure {
                code,
                message: match failure {
                    runner::Failure::Rejected(e) => e.to_string(),
                    runner::Failure::Store(e) => e.to_string(),
                },
            })
            .collect(),
    }))
}

#[derive(Debug, From)]
pub enum CloseSubticketsError {
    #[from]
    DbError(db::Error),
    #[from]
    Rejected(engine::Error),
    TicketNotFound,
    UserNotFound,
}

impl IntoResponse for CloseSubticketsError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(e) => rejection(&e),
            Self::TicketNotFound => StatusCode::NOT_FOUND.into_response(),
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(content = "data", rename_all = "camelCase", tag = "op")]
enum EditSubticketInput {
    Close(ClosingInput),
    Reopen,
    Edit(SubticketDetailsInput),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubticketDetailsInput {
    cto: String,
    card: i16,
    port: i16,
    #[serde(default)]
    city: String,
    client_count: i32,
}

impl From<SubticketDetailsInput> for engine::SubticketDetails {
    fn from(input: SubticketDetailsInput) -> Self {
        Self {
            cto: input.cto,
            card: input.card,
            port: input.port,
            city: input.city,
            client_count: input.client_count,
        }
    }
}

async fn edit_subticket(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::subticket::Id>,
    Json(op): Json<EditSubticketInput>,
) -> Result<Json<api::Subticket>, EditSubticketError> {
    use EditSubticketError as E;
    use EditSubticketInput as Op;

    let my = state
        .repo
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;
    let subticket = state
        .repo
        .get_subticket_by_id(id)
        .await?
        .ok_or(E::SubticketNotFound)?;
    let parent = state
        .repo
        .get_ticket_by_id(subticket.ticket_id)
        .await?
        .ok_or(E::TicketNotFound)?;

    let command = match op {
        Op::Close(input) => Command::CloseSubticket {
            subticket: id,
            closing: input.into(),
        },
        Op::Reopen => Command::ReopenSubticket { subticket: id },
        Op::Edit(input) => Command::EditSubticket {
            subticket: id,
            details: input.into(),
        },
    };

    let subticket = match engine::State::new([parent], [subticket.clone()])
        .dispatch(&my, command, OffsetDateTime::now_utc())
    {
        Ok(reduced) => {
            runner::execute(state.repo.as_ref(), &reduced.effects).await?;
            let updated = reduced.state.subticket(id)?.clone();
            tracing::info!(
                subticket = %updated.code,
                user = %my.name,
                status = ?updated.status(),
                "subticket updated"
            );
            updated
        }
        Err(engine::Error::NoChange) => subticket,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(api::Subticket::from(subticket)))
}

#[derive(Debug, From)]
pub enum EditSubticketError {
    #[from]
    DbError(db::Error),
    #[from]
    Rejected(engine::Error),
    SubticketNotFound,
    TicketNotFound,
    UserNotFound,
}

impl IntoResponse for EditSubticketError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(e) => rejection(&e),
            Self::SubticketNotFound => StatusCode::NOT_FOUND.into_response(),
            Self::DbError(_) | Self::TicketNotFound | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn get_action_logs(
    State(state): State<SharedAppState>,
    _: AuthClaims,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<Vec<api::ActionLog>>, GetActionLogsError> {
    use GetActionLogsError as E;

    let (ticket, logs) = tokio::try_join!(
        state.repo.get_ticket_by_id(id),
        state.repo.get_action_logs(id),
    )?;
    ticket.ok_or(E::TicketNotFound)?;

    Ok(Json(logs.into_iter().map(api::ActionLog::from).collect()))
}

#[derive(Debug, From)]
pub enum GetActionLogsError {
    #[from]
    DbError(db::Error),
    TicketNotFound,
}

impl IntoResponse for GetActionLogsError {
    fn into_response(self) -> Response {
        match self {
            Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct AuthClaims {
    user_id: api::user::Id,
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AuthClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<Self>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}
