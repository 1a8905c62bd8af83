use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode as HttpStatus},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use surety_common::{
    Amount, ErrorKind, FlightKey, FlightState, Identity, OracleIndex, StatusCode, SuretyError,
};
use surety_ledger::{Airline, RegistrationStatus, ResponseOutcome, Surety};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

/// Header carrying the caller identity, authenticated by the host in front of the node.
pub const CALLER_HEADER: &str = "x-caller";

#[derive(Clone)]
pub struct AppState {
    pub surety: Arc<Surety>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] SuretyError),
    #[error("Missing x-caller header")]
    MissingCaller,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

impl ApiError {
    pub fn status(&self) -> HttpStatus {
        match self {
            ApiError::Engine(err) => match err.kind() {
                ErrorKind::Unauthorized => HttpStatus::UNAUTHORIZED,
                ErrorKind::OperationsSuspended => HttpStatus::SERVICE_UNAVAILABLE,
                ErrorKind::InvalidState => HttpStatus::CONFLICT,
                ErrorKind::CapacityExceeded => HttpStatus::UNPROCESSABLE_ENTITY,
                ErrorKind::NothingToWithdraw => HttpStatus::NOT_FOUND,
                ErrorKind::Internal => HttpStatus::INTERNAL_SERVER_ERROR,
            },
            ApiError::MissingCaller => HttpStatus::UNAUTHORIZED,
            ApiError::BadRequest(_) => HttpStatus::BAD_REQUEST,
            ApiError::NotFound(_) => HttpStatus::NOT_FOUND,
        }
    }

    fn kind(&self) -> String {
        match self {
            ApiError::Engine(err) => serde_json::to_value(err.kind())
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "internal".to_string()),
            ApiError::MissingCaller => "unauthorized".to_string(),
            ApiError::BadRequest(_) => "bad_request".to_string(),
            ApiError::NotFound(_) => "not_found".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// --- DTOs. Amounts travel as decimal strings of base units. ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDto {
    pub airline: String,
    pub flight: String,
    pub timestamp: u64,
}

impl From<&FlightDto> for FlightKey {
    fn from(dto: &FlightDto) -> Self {
        FlightKey::new(dto.airline.as_str(), dto.flight.as_str(), dto.timestamp)
    }
}

impl From<&FlightKey> for FlightDto {
    fn from(key: &FlightKey) -> Self {
        Self {
            airline: key.airline.to_string(),
            flight: key.flight.clone(),
            timestamp: key.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OperationalDto {
    pub operational: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterAirlineRequest {
    pub airline: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub airline: String,
}

#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct FundingDto {
    pub airline: String,
    pub funded: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct AirlineDto {
    pub id: String,
    pub name: String,
    pub registered: bool,
    pub active: bool,
    pub funded: String,
    /// Endorsements on the pending ballot.
    pub votes: u32,
}

impl From<&Airline> for AirlineDto {
    fn from(airline: &Airline) -> Self {
        Self {
            id: airline.id.to_string(),
            name: airline.name.clone(),
            registered: airline.is_registered(),
            active: airline.can_participate(),
            funded: airline.funded.to_string(),
            votes: airline.ballot.votes(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub caller: String,
    pub authorized: bool,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub flight: FlightDto,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct PolicyDto {
    pub passenger: String,
    pub flight: FlightDto,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct CreditedDto {
    pub flight: FlightDto,
    pub credited: u32,
}

#[derive(Debug, Serialize)]
pub struct CreditDto {
    pub passenger: String,
    pub credit: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterOracleRequest {
    pub fee: String,
}

#[derive(Debug, Serialize)]
pub struct IndexesDto {
    pub oracle: String,
    pub indexes: [OracleIndex; 3],
}

#[derive(Debug, Serialize)]
pub struct FetchDto {
    pub index: OracleIndex,
    pub flight: FlightDto,
}

#[derive(Debug, Serialize)]
pub struct FlightStatusDto {
    pub flight: FlightDto,
    pub state: FlightState,
    pub status: Option<StatusCode>,
}

#[derive(Debug, Deserialize)]
pub struct OracleResponseRequest {
    pub index: OracleIndex,
    pub flight: FlightDto,
    pub status: u8,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/operational", get(get_operational).post(set_operational))
        .route("/api/callers", post(authorize_caller))
        .route("/api/airlines", get(list_airlines).post(register_airline))
        .route("/api/airlines/vote", post(vote_airline))
        .route("/api/airlines/fund", post(fund_airline))
        .route("/api/airlines/{id}", get(get_airline))
        .route("/api/insurance", post(purchase_policy))
        .route("/api/insurance/credit", post(credit_insurees))
        .route("/api/insurance/withdraw", post(withdraw))
        .route("/api/insurance/credit/{passenger}", get(get_credit))
        .route("/api/oracles", post(register_oracle))
        .route("/api/oracles/{id}/indexes", get(get_indexes))
        .route("/api/oracles/responses", post(submit_response))
        .route("/api/flights/status", get(get_flight_status).post(fetch_flight_status))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
}

pub async fn start_rest_api(port: u16, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    info!("REST API listening on 0.0.0.0:{}", port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    axum::serve(listener, app).await
}

fn caller(headers: &HeaderMap) -> Result<Identity, ApiError> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Identity::from)
        .ok_or(ApiError::MissingCaller)
}

fn parse_amount(raw: &str) -> Result<Amount, ApiError> {
    raw.trim()
        .parse::<Amount>()
        .map_err(|e| ApiError::BadRequest(format!("invalid amount '{}': {}", raw, e)))
}

pub async fn get_operational(State(state): State<AppState>) -> Json<OperationalDto> {
    Json(OperationalDto {
        operational: state.surety.is_operational().await,
    })
}

pub async fn set_operational(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OperationalDto>,
) -> ApiResult<OperationalDto> {
    let caller = caller(&headers)?;
    let operational = state.surety.set_operational(&caller, req.operational).await?;
    Ok(Json(OperationalDto { operational }))
}

pub async fn authorize_caller(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AuthorizeRequest>,
) -> ApiResult<AuthorizeStatus> {
    let admin = caller(&headers)?;
    let target = Identity::from(req.caller);
    let authorized = if req.authorized {
        state.surety.authorize_caller(&admin, &target).await?
    } else {
        state.surety.deauthorize_caller(&admin, &target).await?
    };
    Ok(Json(AuthorizeStatus {
        authorized,
        caller: target.to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct AuthorizeStatus {
    pub caller: String,
    pub authorized: bool,
}

pub async fn register_airline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterAirlineRequest>,
) -> ApiResult<RegistrationStatus> {
    let sponsor = caller(&headers)?;
    let status = state
        .surety
        .register_airline(&sponsor, &Identity::from(req.airline), &req.name)
        .await?;
    Ok(Json(status))
}

pub async fn vote_airline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VoteRequest>,
) -> ApiResult<RegistrationStatus> {
    let voter = caller(&headers)?;
    let status = state
        .surety
        .add_vote_to_airline(&voter, &Identity::from(req.airline))
        .await?;
    Ok(Json(status))
}

/// The caller funds itself.
pub async fn fund_airline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FundRequest>,
) -> ApiResult<FundingDto> {
    let airline = caller(&headers)?;
    let amount = parse_amount(&req.amount)?;
    let receipt = state.surety.add_funding(&airline, amount).await?;
    Ok(Json(FundingDto {
        airline: airline.to_string(),
        funded: receipt.funded.to_string(),
        active: receipt.active,
    }))
}

pub async fn list_airlines(State(state): State<AppState>) -> Json<Vec<AirlineDto>> {
    let airlines = state.surety.registered_airlines().await;
    Json(airlines.iter().map(AirlineDto::from).collect())
}

pub async fn get_airline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AirlineDto> {
    state
        .surety
        .airline(&Identity::from(id.as_str()))
        .await
        .map(|a| Json(AirlineDto::from(&a)))
        .ok_or_else(|| ApiError::NotFound(format!("Airline '{}'", id)))
}

pub async fn purchase_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<PolicyDto> {
    let passenger = caller(&headers)?;
    let amount = parse_amount(&req.amount)?;
    let flight = FlightKey::from(&req.flight);
    state.surety.purchase_policy(&passenger, &flight, amount).await?;
    Ok(Json(PolicyDto {
        passenger: passenger.to_string(),
        flight: req.flight,
        amount: amount.to_string(),
    }))
}

pub async fn credit_insurees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(flight): Json<FlightDto>,
) -> ApiResult<CreditedDto> {
    let caller = caller(&headers)?;
    let credited = state
        .surety
        .credit_insurees(&caller, &FlightKey::from(&flight))
        .await?;
    Ok(Json(CreditedDto { flight, credited }))
}

pub async fn withdraw(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<CreditDto> {
    let passenger = caller(&headers)?;
    let amount = state.surety.withdraw(&passenger).await?;
    Ok(Json(CreditDto {
        passenger: passenger.to_string(),
        credit: amount.to_string(),
    }))
}

pub async fn get_credit(
    State(state): State<AppState>,
    Path(passenger): Path<String>,
) -> Json<CreditDto> {
    let credit = state.surety.credit_of(&Identity::from(passenger.as_str())).await;
    Json(CreditDto {
        passenger,
        credit: credit.to_string(),
    })
}

pub async fn register_oracle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterOracleRequest>,
) -> ApiResult<IndexesDto> {
    let oracle = caller(&headers)?;
    let fee = parse_amount(&req.fee)?;
    let indexes = state.surety.register_oracle(&oracle, fee).await?;
    Ok(Json(IndexesDto {
        oracle: oracle.to_string(),
        indexes,
    }))
}

pub async fn get_indexes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IndexesDto> {
    let indexes = state.surety.oracle_indexes(&Identity::from(id.as_str())).await?;
    Ok(Json(IndexesDto { oracle: id, indexes }))
}

pub async fn fetch_flight_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(flight): Json<FlightDto>,
) -> ApiResult<FetchDto> {
    let requester = caller(&headers)?;
    let index = state
        .surety
        .fetch_flight_status(&requester, &FlightKey::from(&flight))
        .await?;
    Ok(Json(FetchDto { index, flight }))
}

pub async fn get_flight_status(
    State(state): State<AppState>,
    Query(flight): Query<FlightDto>,
) -> Json<FlightStatusDto> {
    let key = FlightKey::from(&flight);
    let record = state.surety.flight_record(&key).await;
    Json(FlightStatusDto {
        state: record.state,
        status: record.status,
        flight: FlightDto::from(&key),
    })
}

pub async fn submit_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OracleResponseRequest>,
) -> ApiResult<ResponseOutcome> {
    let oracle = caller(&headers)?;
    let status = StatusCode::try_from(req.status)?;
    let outcome = state
        .surety
        .submit_oracle_response(&oracle, req.index, &FlightKey::from(&req.flight), status)
        .await?;
    Ok(Json(outcome))
}
