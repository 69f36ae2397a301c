use crate::{
    api::AppState,
    domain::{
        Account, AccountRepository, Error, Transfer, TransferCommand, TransferError,
        TransferRepository,
    },
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use error_ext::StdErrorExt;
use futures::TryStreamExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use tokio::time::Instant;
use tracing::{error, instrument, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

#[derive(OpenApi)]
#[openapi(
    paths(open_account, accounts, account_by_id, create_transfer, transfer_by_id),
    components(schemas(Account, Error, OpenAccount, Transfer, TransferCommand, TransferCreated))
)]
pub struct ApiDoc;

pub fn app<A, T>() -> Router<AppState<A, T>>
where
    A: AccountRepository,
    T: TransferRepository,
{
    Router::new()
        .route("/accounts", post(open_account::<A, T>).get(accounts::<A, T>))
        .route("/accounts/:id", get(account_by_id::<A, T>))
        .route("/transfers", post(create_transfer::<A, T>))
        .route("/transfers/:id", get(transfer_by_id::<A, T>))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenAccount {
    #[serde(default)]
    #[schema(value_type = String, example = "100.00")]
    balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferCreated {
    id: Uuid,
}

#[utoipa::path(
    post,
    path = "/v0/accounts",
    request_body = OpenAccount,
    responses(
        (status = 201, description = "account opened", body = Account),
        (status = 400, description = "negative initial balance", body = Error),
    )
)]
#[instrument(skip(app_state))]
async fn open_account<A, T>(
    State(app_state): State<AppState<A, T>>,
    Json(request): Json<OpenAccount>,
) -> Result<impl IntoResponse, ApiError>
where
    A: AccountRepository,
    T: TransferRepository,
{
    let account = Account::open(Uuid::now_v7(), request.balance).map_err(|error| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            Error::new("Account.InvalidBalance", error.to_string()),
        )
    })?;

    app_state
        .account_repository
        .save(&account)
        .await
        .map_err(ApiError::internal)?;

    let location = format!("/v0/accounts/{}", account.id());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(account),
    ))
}

#[utoipa::path(
    get,
    path = "/v0/accounts",
    responses(
        (status = 200, description = "all accounts ordered by ID", body = [Account]),
    )
)]
#[instrument(skip(app_state))]
async fn accounts<A, T>(
    State(app_state): State<AppState<A, T>>,
) -> Result<Json<Vec<Account>>, ApiError>
where
    A: AccountRepository,
    T: TransferRepository,
{
    let accounts = app_state
        .account_repository
        .accounts()
        .await
        .map_err(ApiError::internal)?
        .try_collect::<Vec<_>>()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(accounts))
}

#[utoipa::path(
    get,
    path = "/v0/accounts/{id}",
    params(("id" = Uuid, Path, description = "account ID")),
    responses(
        (status = 200, description = "account", body = Account),
        (status = 404, description = "unknown account", body = Error),
    )
)]
#[instrument(skip(app_state))]
async fn account_by_id<A, T>(
    State(app_state): State<AppState<A, T>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, ApiError>
where
    A: AccountRepository,
    T: TransferRepository,
{
    app_state
        .account_repository
        .account_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .map(Json)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                Error::new("Account.NotFound", format!("account with ID {id} not found")),
            )
        })
}

#[utoipa::path(
    post,
    path = "/v0/transfers",
    request_body = TransferCommand,
    responses(
        (status = 201, description = "transfer completed", body = TransferCreated),
        (status = 400, description = "invalid transfer or insufficient balance", body = Error),
        (status = 404, description = "unknown source or destination account", body = Error),
        (status = 503, description = "transfer could not be applied in time", body = Error),
        (status = 500, description = "internal error", body = Error),
    )
)]
#[instrument(skip(app_state))]
async fn create_transfer<A, T>(
    State(app_state): State<AppState<A, T>>,
    Json(command): Json<TransferCommand>,
) -> Result<impl IntoResponse, ApiError>
where
    A: AccountRepository,
    T: TransferRepository,
{
    let deadline = Instant::now() + app_state.transfer_timeout;
    let transfer = app_state
        .transfer_service
        .transfer_with_deadline(command, deadline)
        .await
        .inspect_err(|error| {
            warn!(%error, retryable = error.is_retryable(), "transfer failed");
        })?;

    let id = transfer.id();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/v0/transfers/{id}"))],
        Json(TransferCreated { id }),
    ))
}

#[utoipa::path(
    get,
    path = "/v0/transfers/{id}",
    params(("id" = Uuid, Path, description = "transfer ID")),
    responses(
        (status = 200, description = "transfer", body = Transfer),
        (status = 404, description = "unknown transfer", body = Error),
    )
)]
#[instrument(skip(app_state))]
async fn transfer_by_id<A, T>(
    State(app_state): State<AppState<A, T>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transfer>, ApiError>
where
    A: AccountRepository,
    T: TransferRepository,
{
    app_state
        .transfer_repository
        .transfer_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .map(Json)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                Error::new("Transfer.NotFound", format!("transfer with ID {id} not found")),
            )
        })
}

#[derive(Debug)]
struct ApiError {
    status_code: StatusCode,
    error: Error,
}

impl ApiError {
    fn new(status_code: StatusCode, error: Error) -> Self {
        debug_assert!(!error.is_none(), "failure must carry an error");
        Self { status_code, error }
    }

    fn internal<E>(error: E) -> Self
    where
        E: StdError,
    {
        error!(error = error.as_chain(), "repository failure");
        TransferError::InternalError.into()
    }
}

impl From<TransferError> for ApiError {
    fn from(error: TransferError) -> Self {
        let status_code = match error {
            TransferError::InvalidAmount(_)
            | TransferError::InvalidAccountId
            | TransferError::SameAccount(_)
            | TransferError::InsufficientBalance(_)
            | TransferError::BalanceOverflow(_) => StatusCode::BAD_REQUEST,

            TransferError::SourceAccountNotFound(_)
            | TransferError::DestinationAccountNotFound(_) => StatusCode::NOT_FOUND,

            TransferError::DeadlineExceeded => StatusCode::SERVICE_UNAVAILABLE,

            TransferError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::new(status_code, error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.error)).into_response()
    }
}
