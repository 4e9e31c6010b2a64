//! Shared helpers for scenario tests

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    transaction::VersionedTransaction,
};

/// Compute budget directive decoded from a compiled transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDirective {
    UnitLimit(u32),
    UnitPrice(u64),
}

/// Stand-in for a program client's contribution instruction.
pub fn contribution_ix(funder: &Pubkey) -> Instruction {
    Instruction::new_with_bytes(
        Pubkey::new_unique(),
        &[0x10, 0x27, 0, 0, 0, 0, 0, 0],
        vec![
            AccountMeta::new(*funder, true),
            AccountMeta::new(Pubkey::new_unique(), false),
            AccountMeta::new_readonly(Pubkey::new_unique(), false),
        ],
    )
}

/// Program ids of every instruction, in order
pub fn program_ids(tx: &VersionedTransaction) -> Vec<Pubkey> {
    let keys = tx.message.static_account_keys();
    tx.message
        .instructions()
        .iter()
        .map(|ix| keys[usize::from(ix.program_id_index)])
        .collect()
}

/// Compute budget directives in instruction order
pub fn budget_directives(tx: &VersionedTransaction) -> Vec<BudgetDirective> {
    let keys = tx.message.static_account_keys();
    tx.message
        .instructions()
        .iter()
        .filter(|ix| keys[usize::from(ix.program_id_index)] == solana_sdk::compute_budget::id())
        .filter_map(|ix| match ix.data.first()? {
            2 => Some(BudgetDirective::UnitLimit(u32::from_le_bytes(
                ix.data.get(1..5)?.try_into().ok()?,
            ))),
            3 => Some(BudgetDirective::UnitPrice(u64::from_le_bytes(
                ix.data.get(1..9)?.try_into().ok()?,
            ))),
            _ => None,
        })
        .collect()
}
