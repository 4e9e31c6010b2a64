//! Instruction planning and ordering validation
//!
//! Every transaction the pipeline builds has the same shape:
//! 1. `set_compute_unit_price` (omitted when the priority fee is zero)
//! 2. `set_compute_unit_limit` (always present)
//! 3. Caller instructions, in the order supplied, unmodified

use crate::tx_builder::errors::SendError;
use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Per-transaction compute ceiling enforced by the network.
pub const MAX_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

/// Borsh tag of `ComputeBudgetInstruction::SetComputeUnitLimit`
const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
/// Borsh tag of `ComputeBudgetInstruction::SetComputeUnitPrice`
const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

/// Ordered instruction list with the budget values it was built from
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
    pub compute_unit_limit: u32,
    pub priority_fee: u64,
}

/// Compose the final instruction list.
pub fn plan_instructions(
    compute_unit_limit: u32,
    priority_fee: u64,
    caller: &[Instruction],
) -> InstructionPlan {
    let mut instructions = Vec::with_capacity(caller.len() + 2);
    if priority_fee > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(priority_fee));
    }
    instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(compute_unit_limit));
    instructions.extend_from_slice(caller);

    InstructionPlan {
        instructions,
        compute_unit_limit,
        priority_fee,
    }
}

fn compute_budget_tag(ix: &Instruction) -> Option<u8> {
    if ix.program_id != solana_sdk::compute_budget::id() {
        return None;
    }
    ix.data.first().copied()
}

/// Reject caller instruction lists the pipeline cannot wrap.
///
/// The pipeline owns the compute-unit limit and price directives; a caller
/// list that carries its own would be rejected on chain as duplicates.
pub fn validate_caller_instructions(caller: &[Instruction]) -> Result<(), SendError> {
    if caller.is_empty() {
        return Err(SendError::invalid_request("Instruction list is empty"));
    }
    for (idx, ix) in caller.iter().enumerate() {
        match compute_budget_tag(ix) {
            Some(SET_COMPUTE_UNIT_LIMIT_TAG) | Some(SET_COMPUTE_UNIT_PRICE_TAG) => {
                return Err(SendError::invalid_request(format!(
                    "Instruction {} sets compute budget; pass it through the send options instead",
                    idx
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Validate the composed order (debug/test only)
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(
    instructions: &[Instruction],
    priority_fee: u64,
) -> Result<(), SendError> {
    let mut iter = instructions.iter().enumerate();

    if priority_fee > 0 {
        match iter.next() {
            Some((_, ix)) if compute_budget_tag(ix) == Some(SET_COMPUTE_UNIT_PRICE_TAG) => {}
            _ => {
                return Err(SendError::assembly_failed(
                    "Priority fee set but first instruction is not set_compute_unit_price",
                ))
            }
        }
    }

    match iter.next() {
        Some((_, ix)) if compute_budget_tag(ix) == Some(SET_COMPUTE_UNIT_LIMIT_TAG) => {}
        Some((idx, _)) => {
            return Err(SendError::assembly_failed(format!(
                "Expected set_compute_unit_limit at position {}",
                idx
            )))
        }
        None => return Err(SendError::assembly_failed("Instruction list is empty")),
    }

    for (idx, ix) in iter {
        if matches!(
            compute_budget_tag(ix),
            Some(SET_COMPUTE_UNIT_LIMIT_TAG) | Some(SET_COMPUTE_UNIT_PRICE_TAG)
        ) {
            return Err(SendError::assembly_failed(format!(
                "Duplicate compute budget directive at position {}",
                idx
            )));
        }
    }

    Ok(())
}

/// No-op version of sanity_check_ix_order for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(
    _instructions: &[Instruction],
    _priority_fee: u64,
) -> Result<(), SendError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

    fn fund_ix() -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3, 4],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    #[test]
    fn test_zero_fee_starts_with_limit() {
        let caller = vec![fund_ix()];
        let plan = plan_instructions(220_000, 0, &caller);
        assert_eq!(plan.instructions.len(), 2);
        assert_eq!(
            plan.instructions[0],
            ComputeBudgetInstruction::set_compute_unit_limit(220_000)
        );
        assert_eq!(plan.instructions[1], caller[0]);
    }

    #[test]
    fn test_fee_comes_first() {
        let caller = vec![fund_ix(), fund_ix()];
        let plan = plan_instructions(220_000, 50_000, &caller);
        assert_eq!(plan.instructions.len(), 4);
        assert_eq!(
            plan.instructions[0],
            ComputeBudgetInstruction::set_compute_unit_price(50_000)
        );
        assert_eq!(
            plan.instructions[1],
            ComputeBudgetInstruction::set_compute_unit_limit(220_000)
        );
        assert_eq!(&plan.instructions[2..], &caller[..]);
    }

    #[test]
    fn test_validate_caller_instructions() {
        assert!(validate_caller_instructions(&[fund_ix()]).is_ok());
        assert!(matches!(
            validate_caller_instructions(&[]),
            Err(SendError::InvalidRequest(_))
        ));
        assert!(validate_caller_instructions(&[
            fund_ix(),
            ComputeBudgetInstruction::set_compute_unit_limit(1)
        ])
        .is_err());
        // heap frame requests are left alone
        assert!(validate_caller_instructions(&[
            ComputeBudgetInstruction::request_heap_frame(64 * 1024),
            fund_ix()
        ])
        .is_ok());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_accepts_planned_order() {
        let plan = plan_instructions(300_000, 10_000, &[fund_ix()]);
        assert!(sanity_check_ix_order(&plan.instructions, 10_000).is_ok());

        let plan = plan_instructions(300_000, 0, &[fund_ix()]);
        assert!(sanity_check_ix_order(&plan.instructions, 0).is_ok());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_rejects_bad_order() {
        let swapped = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
            ComputeBudgetInstruction::set_compute_unit_price(10_000),
            fund_ix(),
        ];
        assert!(sanity_check_ix_order(&swapped, 10_000).is_err());

        let missing_limit = vec![fund_ix()];
        assert!(sanity_check_ix_order(&missing_limit, 0).is_err());
        assert!(sanity_check_ix_order(&[], 0).is_err());

        let duplicate = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
            ComputeBudgetInstruction::set_compute_unit_limit(100_000),
        ];
        assert!(sanity_check_ix_order(&duplicate, 0).is_err());
    }
}
