//! Compute budget estimation
//!
//! Simulates a draft at the network ceiling, then declares what the draft
//! actually consumed plus a safety margin.

use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount, commitment_config::CommitmentLevel,
    instruction::Instruction, pubkey::Pubkey,
};
use tracing::{debug, info};

use crate::metrics::metrics;
use crate::rpc::{ChainClient, SimulationConfig};
use crate::tx_builder::assembler::assemble;
use crate::tx_builder::errors::SendError;
use crate::tx_builder::instructions::MAX_COMPUTE_UNIT_LIMIT;
use crate::tx_builder::logs::error_message_from_logs;

const PPM: u128 = 1_000_000;

/// Inputs for one estimate
pub struct BudgetRequest<'a> {
    pub payer: &'a Pubkey,
    pub instructions: &'a [Instruction],
    pub priority_fee: u64,
    pub lookup_tables: &'a [AddressLookupTableAccount],
    pub margin: f64,
    pub blockhash_commitment: CommitmentLevel,
    pub label: Option<&'a str>,
}

/// `ceil(units * margin)`, capped at [`MAX_COMPUTE_UNIT_LIMIT`].
///
/// The margin is applied in parts per million so `200_000 * 1.1` is exactly
/// `220_000`.
pub fn apply_margin(units: u64, margin: f64) -> u32 {
    let margin_ppm = (margin * PPM as f64).round().max(0.0) as u128;
    let Some(scaled) = u128::from(units).checked_mul(margin_ppm) else {
        return MAX_COMPUTE_UNIT_LIMIT;
    };
    let limit = scaled.div_ceil(PPM);
    u32::try_from(limit)
        .unwrap_or(MAX_COMPUTE_UNIT_LIMIT)
        .min(MAX_COMPUTE_UNIT_LIMIT)
}

/// Caller-supplied limit verbatim, else a simulated estimate.
pub async fn resolve_compute_unit_limit<C>(
    client: &C,
    explicit: Option<u32>,
    request: &BudgetRequest<'_>,
) -> Result<u32, SendError>
where
    C: ChainClient + ?Sized,
{
    match explicit {
        Some(units) => {
            debug!(compute_unit_limit = units, "Using caller compute unit limit, skipping simulation");
            Ok(units)
        }
        None => estimate_compute_unit_limit(client, request).await,
    }
}

/// Simulate a ceiling-limited draft and derive the limit from it.
pub async fn estimate_compute_unit_limit<C>(
    client: &C,
    request: &BudgetRequest<'_>,
) -> Result<u32, SendError>
where
    C: ChainClient + ?Sized,
{
    let placeholder = client
        .get_latest_blockhash(request.blockhash_commitment)
        .await
        .map_err(|e| SendError::BlockhashUnavailable(e.to_string()))?;

    let draft = assemble(
        request.payer,
        placeholder.blockhash,
        request.instructions,
        MAX_COMPUTE_UNIT_LIMIT,
        request.priority_fee,
        request.lookup_tables,
    )?;

    let outcome = client
        .simulate_transaction(
            &draft,
            SimulationConfig::unsigned_draft(request.blockhash_commitment),
        )
        .await
        .map_err(|e| {
            let logs = e.logs().to_vec();
            SendError::SimulationFailed {
                message: error_message_from_logs(&logs, &e.to_string()),
                logs,
            }
        })?;

    let logs = outcome.logs.unwrap_or_default();
    let label = request.label.unwrap_or("");
    for line in &logs {
        debug!(label, "{}", line);
    }

    if let Some(err) = outcome.err {
        return Err(SendError::SimulationFailed {
            message: error_message_from_logs(&logs, &err),
            logs,
        });
    }

    let units = match outcome.units_consumed {
        Some(units) if units > 0 => units,
        _ => return Err(SendError::SimulationInconclusive { logs }),
    };
    metrics().simulated_compute_units.observe(units as f64);

    let limit = apply_margin(units, request.margin);
    info!(
        label,
        units_consumed = units,
        compute_unit_limit = limit,
        "Compute budget estimated"
    );
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_is_exact() {
        assert_eq!(apply_margin(200_000, 1.1), 220_000);
        assert_eq!(apply_margin(100_001, 1.1), 110_002);
        assert_eq!(apply_margin(12_345, 1.0), 12_345);
        assert_eq!(apply_margin(3, 1.5), 5);
    }

    #[test]
    fn test_margin_capped_at_network_ceiling() {
        assert_eq!(apply_margin(1_300_000, 1.1), MAX_COMPUTE_UNIT_LIMIT);
        assert_eq!(apply_margin(u64::MAX, 2.0), MAX_COMPUTE_UNIT_LIMIT);
    }

    #[test]
    fn test_huge_margin_saturates_instead_of_overflowing() {
        assert_eq!(apply_margin(200_000, 1e33), MAX_COMPUTE_UNIT_LIMIT);
        assert_eq!(apply_margin(1, f64::MAX), MAX_COMPUTE_UNIT_LIMIT);
        assert_eq!(apply_margin(u64::MAX, 1e20), MAX_COMPUTE_UNIT_LIMIT);
    }
}
