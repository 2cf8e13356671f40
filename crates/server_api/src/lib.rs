use std::str::FromStr;

use serde_json::Value;
use shared::{
    domain::{LedgerEntry, PointsKey, PointsRecord, TxId},
    error::{ApiError, ErrorCode},
    protocol::{RecordPointsRequest, TxReceipt},
};
use storage::Storage;
use tracing::{debug, info};

/// Bounds of the `queryAllPoints` scan. Keys compare as strings.
pub const RANGE_START_KEY: &str = "0";
pub const RANGE_END_KEY: &str = "999";

pub const POINTS_NOT_FOUND_MESSAGE: &str = "Could not locate points transaction";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

/// Functions the ledger accepts by name through [`invoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerFunction {
    InitLedger,
    QueryPoints,
    RecordPoints,
    QueryAllPoints,
    ChangePointsHolder,
}

impl LedgerFunction {
    pub fn name(self) -> &'static str {
        match self {
            LedgerFunction::InitLedger => "initLedger",
            LedgerFunction::QueryPoints => "queryPoints",
            LedgerFunction::RecordPoints => "recordPoints",
            LedgerFunction::QueryAllPoints => "queryAllPoints",
            LedgerFunction::ChangePointsHolder => "changePointsHolder",
        }
    }

    /// Required argument count; `None` for functions that ignore arguments.
    fn arity(self) -> Option<usize> {
        match self {
            LedgerFunction::InitLedger | LedgerFunction::QueryAllPoints => None,
            LedgerFunction::QueryPoints => Some(1),
            LedgerFunction::RecordPoints => Some(5),
            LedgerFunction::ChangePointsHolder => Some(2),
        }
    }
}

impl FromStr for LedgerFunction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initLedger" => Ok(LedgerFunction::InitLedger),
            "queryPoints" => Ok(LedgerFunction::QueryPoints),
            "recordPoints" => Ok(LedgerFunction::RecordPoints),
            "queryAllPoints" => Ok(LedgerFunction::QueryAllPoints),
            "changePointsHolder" => Ok(LedgerFunction::ChangePointsHolder),
            _ => Err(ApiError::new(
                ErrorCode::InvalidFunction,
                "Invalid Smart Contract function name.",
            )),
        }
    }
}

const SEED_RECORDS: [(&str, &str, &str, &str); 10] = [
    ("923F", "67.0006, -70.5476", "1504054225", "Miriam"),
    ("M83T", "91.2395, -49.4594", "1504057825", "Dave"),
    ("T012", "58.0148, 59.01391", "1493517025", "Igor"),
    ("P490", "-45.0945, 0.7949", "1496105425", "Amalea"),
    ("S439", "-107.6043, 19.5003", "1493512301", "Rafa"),
    ("J205", "-155.2304, -15.8723", "1494117101", "Shen"),
    ("S22L", "103.8842, 22.1277", "1496104301", "Leila"),
    ("EI89", "-132.3207, -34.0983", "1485066691", "Yuan"),
    ("129R", "153.0054, 12.6429", "1485153091", "Carlo"),
    ("49W4", "51.9435, 8.2735", "1487745091", "Fatima"),
];

pub fn seed_records() -> Vec<PointsRecord> {
    SEED_RECORDS
        .iter()
        .map(|(scheme_id, location, timestamp, holder)| PointsRecord {
            scheme_id: (*scheme_id).to_string(),
            location: (*location).to_string(),
            timestamp: (*timestamp).to_string(),
            holder: (*holder).to_string(),
        })
        .collect()
}

/// Writes the seed records under keys `"1"` through `"10"`.
pub async fn init_ledger(ctx: &ApiContext) -> Result<Vec<TxReceipt>, ApiError> {
    let mut receipts = Vec::with_capacity(SEED_RECORDS.len());
    for (i, record) in seed_records().into_iter().enumerate() {
        let key = PointsKey((i + 1).to_string());
        receipts.push(put_record(ctx, &key, &record, LedgerFunction::InitLedger).await?);
        debug!(%key, holder = %record.holder, "seeded points record");
    }
    info!(count = receipts.len(), "ledger initialised");
    Ok(receipts)
}

pub async fn query_points(ctx: &ApiContext, key: &PointsKey) -> Result<PointsRecord, ApiError> {
    load_record(ctx, key)
        .await?
        .ok_or_else(|| ApiError::not_found(POINTS_NOT_FOUND_MESSAGE))
}

/// Upserts a record. No field is validated here; see
/// [`record_points_checked`] for the typed entry point.
pub async fn record_points(
    ctx: &ApiContext,
    key: &PointsKey,
    record: PointsRecord,
) -> Result<TxReceipt, ApiError> {
    let receipt = put_record(ctx, key, &record, LedgerFunction::RecordPoints).await?;
    info!(%key, tx_id = %receipt.tx_id, holder = %record.holder, "points recorded");
    Ok(receipt)
}

pub async fn record_points_checked(
    ctx: &ApiContext,
    request: &RecordPointsRequest,
) -> Result<TxReceipt, ApiError> {
    validate_record_request(request)?;
    let record = PointsRecord {
        scheme_id: request.scheme_id.clone(),
        timestamp: request.timestamp.clone(),
        location: request.location(),
        holder: request.holder.clone(),
    };
    record_points(ctx, &request.id, record).await
}

pub fn validate_record_request(request: &RecordPointsRequest) -> Result<(), ApiError> {
    if request.id.as_str().trim().is_empty() {
        return Err(ApiError::validation("id must not be empty"));
    }
    if request.holder.trim().is_empty() {
        return Err(ApiError::validation("holder must not be empty"));
    }
    if request.scheme_id.trim().is_empty() {
        return Err(ApiError::validation("scheme_id must not be empty"));
    }
    if !request.longitude.is_finite() || !(-180.0..=180.0).contains(&request.longitude) {
        return Err(ApiError::validation("longitude must be within [-180, 180]"));
    }
    if !request.latitude.is_finite() || !(-90.0..=90.0).contains(&request.latitude) {
        return Err(ApiError::validation("latitude must be within [-90, 90]"));
    }
    Ok(())
}

pub async fn query_all_points(ctx: &ApiContext) -> Result<Vec<LedgerEntry>, ApiError> {
    let states = ctx
        .storage
        .get_state_by_range(RANGE_START_KEY, RANGE_END_KEY)
        .await
        .map_err(internal)?;

    let mut entries = Vec::with_capacity(states.len());
    for state in states {
        let record = decode_record(&state.key, &state.value)?;
        entries.push(LedgerEntry {
            key: state.key,
            record,
        });
    }
    debug!(count = entries.len(), "queried all points");
    Ok(entries)
}

pub async fn change_points_holder(
    ctx: &ApiContext,
    key: &PointsKey,
    holder: &str,
) -> Result<TxReceipt, ApiError> {
    let mut record = query_points(ctx, key).await?;
    // Whether `holder` is a legitimate recipient is not checked.
    record.holder = holder.to_string();
    let receipt = put_record(ctx, key, &record, LedgerFunction::ChangePointsHolder).await?;
    info!(%key, tx_id = %receipt.tx_id, %holder, "points holder changed");
    Ok(receipt)
}

/// Dispatches a ledger call by function name with positional string
/// arguments. `recordPoints` takes `[key, scheme_id, location, timestamp,
/// holder]`; `changePointsHolder` takes `[key, holder]`.
pub async fn invoke(ctx: &ApiContext, function: &str, args: &[String]) -> Result<Value, ApiError> {
    let function = function.parse::<LedgerFunction>()?;
    if let Some(expected) = function.arity() {
        if args.len() != expected {
            return Err(ApiError::validation(format!(
                "Incorrect number of arguments. Expecting {expected}"
            )));
        }
    }

    match function {
        LedgerFunction::InitLedger => {
            init_ledger(ctx).await?;
            Ok(Value::Null)
        }
        LedgerFunction::QueryPoints => {
            let record = query_points(ctx, &PointsKey(args[0].clone())).await?;
            to_value(&record)
        }
        LedgerFunction::RecordPoints => {
            let record = PointsRecord {
                scheme_id: args[1].clone(),
                location: args[2].clone(),
                timestamp: args[3].clone(),
                holder: args[4].clone(),
            };
            let receipt = record_points(ctx, &PointsKey(args[0].clone()), record).await?;
            to_value(&receipt)
        }
        LedgerFunction::QueryAllPoints => to_value(&query_all_points(ctx).await?),
        LedgerFunction::ChangePointsHolder => {
            let receipt =
                change_points_holder(ctx, &PointsKey(args[0].clone()), &args[1]).await?;
            to_value(&receipt)
        }
    }
}

async fn load_record(ctx: &ApiContext, key: &PointsKey) -> Result<Option<PointsRecord>, ApiError> {
    let Some(bytes) = ctx.storage.get_state(key).await.map_err(internal)? else {
        return Ok(None);
    };
    decode_record(key, &bytes).map(Some)
}

async fn put_record(
    ctx: &ApiContext,
    key: &PointsKey,
    record: &PointsRecord,
    function: LedgerFunction,
) -> Result<TxReceipt, ApiError> {
    let bytes = serde_json::to_vec(record)
        .map_err(|e| ApiError::internal(format!("failed to encode record '{key}': {e}")))?;
    let tx_id = TxId::generate();
    let committed_at = ctx
        .storage
        .put_state(key, &bytes, &tx_id, function.name())
        .await
        .map_err(internal)?;
    Ok(TxReceipt {
        tx_id,
        key: key.clone(),
        committed_at,
    })
}

fn decode_record(key: &PointsKey, bytes: &[u8]) -> Result<PointsRecord, ApiError> {
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::internal(format!("corrupt record under key '{key}': {e}")))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
