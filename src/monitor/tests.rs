use super::*;
use std::collections::HashMap;
use serde_json::{json, Value};

use crate::config::DetectorConfig;
use crate::constants::programs::SYSTEM_PROGRAM_ID;
use crate::constants::system::CREATE_ACCOUNT;
use crate::models::{AccountClass, AccountInfo};

struct Keys {
    payer: Pubkey,
    program: Pubkey,
    new_account: Pubkey,
    readonly: Pubkey,
}

impl Keys {
    fn new() -> Self {
        Self {
            payer: Pubkey::new_unique(),
            program: Pubkey::new_unique(),
            new_account: Pubkey::new_unique(),
            readonly: Pubkey::new_unique(),
        }
    }
}

fn create_account_data(owner: &Pubkey) -> String {
    let mut data = CREATE_ACCOUNT.to_le_bytes().to_vec();
    data.extend_from_slice(&2_039_280u64.to_le_bytes());
    data.extend_from_slice(&165u64.to_le_bytes());
    data.extend_from_slice(owner.as_ref());
    bs58::encode(data).into_string()
}

/// `getTransaction` result for a v0 transaction whose new account comes
/// from an address lookup table.
///
/// Key order: payer, system program, program, then loaded writable
/// `new_account` (index 3) and loaded readonly `readonly` (index 4).
fn rpc_result(keys: &Keys, with_stack_height: bool, logs: Option<Vec<String>>) -> Value {
    let mut inner = json!({
        "programIdIndex": 1,
        "accounts": [0, 3],
        "data": create_account_data(&keys.program),
    });
    if with_stack_height {
        inner["stackHeight"] = json!(2);
    }

    let mut meta = json!({
        "err": null,
        "status": { "Ok": null },
        "fee": 5000,
        "preBalances": [10_000_000, 1, 1, 0, 1],
        "postBalances": [7_955_720, 1, 1, 2_039_280, 1],
        "innerInstructions": [{ "index": 0, "instructions": [inner] }],
        "loadedAddresses": {
            "writable": [keys.new_account.to_string()],
            "readonly": [keys.readonly.to_string()],
        },
    });
    if let Some(logs) = logs {
        meta["logMessages"] = json!(logs);
    }

    json!({
        "slot": 250_000_000u64,
        "blockTime": 1_700_000_000i64,
        "version": 0,
        "transaction": {
            "signatures": ["5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"],
            "message": {
                "header": {
                    "numRequiredSignatures": 1,
                    "numReadonlySignedAccounts": 0,
                    "numReadonlyUnsignedAccounts": 2,
                },
                "accountKeys": [
                    keys.payer.to_string(),
                    SYSTEM_PROGRAM_ID.to_string(),
                    keys.program.to_string(),
                ],
                "recentBlockhash": keys.readonly.to_string(),
                "instructions": [{
                    "programIdIndex": 2,
                    "accounts": [0, 3, 1],
                    "data": "3Bxs4h24hBtQy9rw",
                    "stackHeight": null,
                }],
            },
        },
        "meta": meta,
    })
}

#[test]
fn test_from_json_resolves_lookup_table_keys() {
    let keys = Keys::new();
    let tx = transaction::from_json(&rpc_result(&keys, true, None).to_string()).unwrap();

    assert_eq!(tx.slot, Some(250_000_000));
    assert_eq!(
        tx.account_keys,
        vec![keys.payer, SYSTEM_PROGRAM_ID, keys.program, keys.new_account, keys.readonly]
    );
    assert_eq!(tx.instructions.len(), 1);
    assert_eq!(tx.instructions[0].accounts, vec![0, 3, 1]);

    let groups = tx.inner_groups();
    assert_eq!(groups.len(), 1);
    let create = &groups[0].instructions[0];
    assert_eq!(create.stack_height, Some(2));
    assert_eq!(create.program_id(&tx.account_keys), Some(&SYSTEM_PROGRAM_ID));
    assert_eq!(create.account(&tx.account_keys, 1), Some(&keys.new_account));
    assert_eq!(&create.data[..4], &CREATE_ACCOUNT.to_le_bytes());
}

#[test]
fn test_from_json_accepts_rpc_envelope() {
    let keys = Keys::new();
    let envelope = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": rpc_result(&keys, true, None),
    });
    let tx = transaction::from_json(&envelope.to_string()).unwrap();
    assert!(tx.signature.is_some());
    assert_eq!(tx.account_keys.len(), 5);
}

#[test]
fn test_from_json_rejects_null_result() {
    let envelope = json!({ "jsonrpc": "2.0", "id": 1, "result": null });
    let result = transaction::from_json(&envelope.to_string());
    assert!(matches!(result, Err(DetectorError::TransactionParsing(_))));
}

#[test]
fn test_from_json_rejects_garbage() {
    assert!(transaction::from_json("not json").is_err());
}

#[test]
fn test_from_json_reconstructs_heights_from_logs() {
    let keys = Keys::new();
    let logs = vec![
        format!("Program {} invoke [1]", keys.program),
        format!("Program {} invoke [2]", SYSTEM_PROGRAM_ID),
        format!("Program {} success", SYSTEM_PROGRAM_ID),
        format!("Program {} success", keys.program),
    ];
    let tx = transaction::from_json(&rpc_result(&keys, false, Some(logs)).to_string()).unwrap();
    assert_eq!(tx.inner_groups()[0].instructions[0].stack_height, Some(2));
}

#[test]
fn test_from_json_without_logs_leaves_heights_unset() {
    let keys = Keys::new();
    let tx = transaction::from_json(&rpc_result(&keys, false, None).to_string()).unwrap();
    assert_eq!(tx.inner_groups()[0].instructions[0].stack_height, None);
}

#[test]
fn test_missing_meta_surfaces_as_missing_metadata() {
    let keys = Keys::new();
    let mut result = rpc_result(&keys, true, None);
    result["meta"] = Value::Null;
    let tx = transaction::from_json(&result.to_string()).unwrap();
    assert!(tx.meta.is_none());
    assert_eq!(tx.account_keys.len(), 3);

    let detector = AccountCreationDetector::new(DetectorConfig::default());
    assert!(matches!(
        detector.collect_candidates(&tx, &[]),
        Err(DetectorError::MissingMetadata(_))
    ));
}

#[tokio::test]
async fn test_converted_transaction_detects_created_account() {
    let keys = Keys::new();
    let tx = transaction::from_json(&rpc_result(&keys, true, None).to_string()).unwrap();

    let mut lookup = HashMap::new();
    lookup.insert(keys.new_account, AccountInfo::new(keys.program, 2_039_280));
    let detector = AccountCreationDetector::new(DetectorConfig::default());

    let created = analyze_transaction(&detector, &tx, &keys.payer, &lookup).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].account, keys.new_account);
    assert_eq!(created[0].class, AccountClass::ProgramOwnedUnclassified);
    assert!(created[0].signals.balance);
    assert!(created[0].signals.allocation);
}

fn detected(signature: &str, created: Vec<CreatedAccountRecord>) -> TransactionOutcome {
    TransactionOutcome::Detected {
        signature: signature.to_string(),
        slot: 10,
        created,
    }
}

#[test]
fn test_scan_report_summaries() {
    let record = CreatedAccountRecord {
        account: Pubkey::new_unique(),
        class: AccountClass::ProgramOwnedUnclassified,
        owner: Some(Pubkey::new_unique()),
        signals: Default::default(),
    };
    let report = ScanReport {
        subject: Pubkey::new_unique().to_string(),
        pages: 1,
        outcomes: vec![
            detected("a", vec![record.clone()]),
            TransactionOutcome::Skipped {
                signature: "b".to_string(),
                slot: 9,
            },
            TransactionOutcome::Failed {
                signature: "c".to_string(),
                slot: 8,
                error: "Account lookup failed: timeout".to_string(),
                retryable: true,
            },
            detected("d", vec![record.clone(), record]),
        ],
    };

    assert_eq!(report.created().count(), 3);
    assert_eq!(report.failures(), 1);

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["outcomes"][0]["status"], "detected");
    assert_eq!(value["outcomes"][1]["status"], "skipped");
    assert_eq!(value["outcomes"][2]["retryable"], true);
}

#[test]
fn test_parse_signature_rejects_invalid() {
    assert!(matches!(
        parse_signature("not-a-signature"),
        Err(DetectorError::TransactionParsing(_))
    ));
}
