//! Conversion of RPC transaction responses into [`ParsedTransaction`]

use solana_pubkey::Pubkey;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiCompiledInstruction,
    UiInnerInstructions, UiInstruction, UiMessage, UiTransactionStatusMeta,
};

use crate::analyzer::stack_height::reconstruct_stack_heights;
use crate::errors::{DetectorError, DetectorResult};
use crate::models::{InnerInstructionGroup, InstructionRecord, ParsedTransaction, TransactionMeta};
use crate::utils::{decode_instruction_data, parse_pubkey};

/// Convert a `getTransaction` response.
///
/// Account keys are resolved in runtime order: static keys, then writable and
/// readonly lookup-table addresses. Stack heights missing from old data are
/// reconstructed from the logs.
pub fn from_encoded(encoded: &EncodedConfirmedTransactionWithStatusMeta) -> DetectorResult<ParsedTransaction> {
    let with_meta = &encoded.transaction;
    let (signature, mut account_keys, instructions) = decode_message(&with_meta.transaction)?;

    let meta = match &with_meta.meta {
        Some(meta) => {
            account_keys.extend(loaded_addresses(meta)?);
            Some(convert_meta(meta)?)
        }
        None => None,
    };

    let mut parsed = ParsedTransaction {
        signature,
        slot: Some(encoded.slot),
        account_keys,
        instructions,
        meta,
    };
    reconstruct_stack_heights(&mut parsed);
    Ok(parsed)
}

/// Parse a `getTransaction` JSON response, either the full JSON-RPC envelope
/// or its `result` object
pub fn from_json(json: &str) -> DetectorResult<ParsedTransaction> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;
    if let Some(result) = value.get_mut("result") {
        value = result.take();
    }
    if value.is_null() {
        return Err(DetectorError::TransactionParsing(
            "response does not contain a transaction".to_string(),
        ));
    }
    let encoded: EncodedConfirmedTransactionWithStatusMeta = serde_json::from_value(value)?;
    from_encoded(&encoded)
}

type DecodedMessage = (Option<String>, Vec<Pubkey>, Vec<InstructionRecord>);

fn decode_message(transaction: &EncodedTransaction) -> DetectorResult<DecodedMessage> {
    if let EncodedTransaction::Json(ui_transaction) = transaction {
        let raw = match &ui_transaction.message {
            UiMessage::Raw(raw) => raw,
            UiMessage::Parsed(_) => {
                return Err(DetectorError::TransactionParsing(
                    "jsonParsed messages are not supported, request json or base64 encoding".to_string(),
                ))
            }
        };
        let account_keys = raw
            .account_keys
            .iter()
            .map(|key| parse_pubkey(key, "account key"))
            .collect::<DetectorResult<Vec<_>>>()?;
        let instructions = raw
            .instructions
            .iter()
            .map(convert_instruction)
            .collect::<DetectorResult<Vec<_>>>()?;
        return Ok((ui_transaction.signatures.first().cloned(), account_keys, instructions));
    }

    let versioned = transaction.decode().ok_or_else(|| {
        DetectorError::TransactionParsing("transaction payload could not be decoded".to_string())
    })?;
    let instructions = versioned
        .message
        .instructions()
        .iter()
        .map(|ix| InstructionRecord::new(ix.program_id_index, ix.accounts.clone(), ix.data.clone()))
        .collect();
    Ok((
        versioned.signatures.first().map(|signature| signature.to_string()),
        versioned.message.static_account_keys().to_vec(),
        instructions,
    ))
}

fn convert_instruction(ix: &UiCompiledInstruction) -> DetectorResult<InstructionRecord> {
    Ok(InstructionRecord {
        program_id_index: ix.program_id_index,
        accounts: ix.accounts.clone(),
        data: decode_instruction_data(&ix.data)?,
        stack_height: ix.stack_height,
    })
}

fn convert_group(group: &UiInnerInstructions) -> DetectorResult<InnerInstructionGroup> {
    let instructions = group
        .instructions
        .iter()
        .map(|ix| match ix {
            UiInstruction::Compiled(compiled) => convert_instruction(compiled),
            UiInstruction::Parsed(_) => Err(DetectorError::TransactionParsing(
                "parsed inner instructions are not supported, request json or base64 encoding".to_string(),
            )),
        })
        .collect::<DetectorResult<Vec<_>>>()?;
    Ok(InnerInstructionGroup::new(group.index, instructions))
}

fn convert_meta(meta: &UiTransactionStatusMeta) -> DetectorResult<TransactionMeta> {
    let inner_instructions = match &meta.inner_instructions {
        OptionSerializer::Some(groups) => Some(
            groups
                .iter()
                .map(convert_group)
                .collect::<DetectorResult<Vec<_>>>()?,
        ),
        _ => None,
    };
    let log_messages = match &meta.log_messages {
        OptionSerializer::Some(logs) => Some(logs.clone()),
        _ => None,
    };

    Ok(TransactionMeta {
        pre_balances: meta.pre_balances.clone(),
        post_balances: meta.post_balances.clone(),
        inner_instructions,
        log_messages,
        failed: meta.err.is_some(),
    })
}

fn loaded_addresses(meta: &UiTransactionStatusMeta) -> DetectorResult<Vec<Pubkey>> {
    match &meta.loaded_addresses {
        OptionSerializer::Some(loaded) => loaded
            .writable
            .iter()
            .chain(loaded.readonly.iter())
            .map(|key| parse_pubkey(key, "loaded address"))
            .collect(),
        _ => Ok(Vec::new()),
    }
}
