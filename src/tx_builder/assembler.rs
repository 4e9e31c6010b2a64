//! Transaction assembly
//!
//! Lookup tables are an address-compression optimization: one that cannot
//! be resolved is dropped and the transaction is compiled without it.

use futures::future::join_all;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use tracing::{debug, warn};

use crate::metrics::metrics;
use crate::rpc::ChainClient;
use crate::tx_builder::errors::SendError;
use crate::tx_builder::instructions::{plan_instructions, sanity_check_ix_order};

/// Fetch every table concurrently, keeping input order and dropping failures.
pub async fn resolve_lookup_tables<C>(
    client: &C,
    addresses: &[Pubkey],
) -> Vec<AddressLookupTableAccount>
where
    C: ChainClient + ?Sized,
{
    let fetched = join_all(
        addresses
            .iter()
            .map(|address| async move { (address, client.get_address_lookup_table(address).await) }),
    )
    .await;

    let mut tables = Vec::with_capacity(fetched.len());
    for (address, result) in fetched {
        match result {
            Ok(Some(table)) => {
                debug!(table = %address, addresses = table.addresses.len(), "Lookup table resolved");
                tables.push(table);
            }
            Ok(None) => {
                warn!(table = %address, reason = "not found", "LookupResolutionDegraded");
                metrics().lookup_tables_dropped.inc();
            }
            Err(e) => {
                warn!(table = %address, reason = %e, "LookupResolutionDegraded");
                metrics().lookup_tables_dropped.inc();
            }
        }
    }
    tables
}

/// Compile an unsigned v0 transaction.
///
/// Signature slots are zero-filled, one per required signer.
pub fn assemble(
    payer: &Pubkey,
    recent_blockhash: Hash,
    instructions: &[Instruction],
    compute_unit_limit: u32,
    priority_fee: u64,
    lookup_tables: &[AddressLookupTableAccount],
) -> Result<VersionedTransaction, SendError> {
    let plan = plan_instructions(compute_unit_limit, priority_fee, instructions);
    sanity_check_ix_order(&plan.instructions, priority_fee)?;

    let message = v0::Message::try_compile(payer, &plan.instructions, lookup_tables, recent_blockhash)
        .map_err(|e| SendError::assembly_failed(format!("Failed to compile v0 message: {}", e)))?;
    let required = usize::from(message.header.num_required_signatures);

    Ok(VersionedTransaction {
        signatures: vec![Signature::default(); required],
        message: VersionedMessage::V0(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::compute_budget::ComputeBudgetInstruction;
    use solana_sdk::instruction::AccountMeta;

    fn decompiled_program_ids(tx: &VersionedTransaction) -> Vec<Pubkey> {
        let keys = tx.message.static_account_keys();
        tx.message
            .instructions()
            .iter()
            .map(|ix| keys[usize::from(ix.program_id_index)])
            .collect()
    }

    #[test]
    fn test_assemble_orders_budget_first() {
        let payer = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let ix = Instruction::new_with_bytes(
            program,
            &[9],
            vec![AccountMeta::new(payer, true), AccountMeta::new(Pubkey::new_unique(), false)],
        );

        let tx = assemble(&payer, Hash::new_unique(), &[ix], 220_000, 50_000, &[]).unwrap();
        let ids = decompiled_program_ids(&tx);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], solana_sdk::compute_budget::id());
        assert_eq!(ids[1], solana_sdk::compute_budget::id());
        assert_eq!(ids[2], program);
        assert_eq!(
            tx.message.instructions()[0].data,
            ComputeBudgetInstruction::set_compute_unit_price(50_000).data
        );
        assert_eq!(tx.signatures, vec![Signature::default()]);
        assert_eq!(tx.message.static_account_keys()[0], payer);
    }

    #[test]
    fn test_assemble_uses_lookup_tables() {
        let payer = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let in_table = Pubkey::new_unique();
        let ix = Instruction::new_with_bytes(
            program,
            &[1],
            vec![AccountMeta::new(payer, true), AccountMeta::new(in_table, false)],
        );
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![in_table],
        };

        let tx = assemble(&payer, Hash::new_unique(), &[ix], 100_000, 0, &[table]).unwrap();
        assert!(!tx.message.static_account_keys().contains(&in_table));
        assert_eq!(tx.message.address_table_lookups().map(|l| l.len()), Some(1));
    }
}
