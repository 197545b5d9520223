use std::collections::HashMap;
use std::fs;
use solana_pda_detector::analyzer::{self, SeedComponent};
use solana_pda_detector::config::{Configuration, DetectorConfig};
use solana_pda_detector::constants::programs::{SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
use solana_pda_detector::models::{
    AccountClass, AccountInfo, InnerInstructionGroup, InstructionRecord, ParsedTransaction,
    TransactionMeta,
};
use solana_pda_detector::{AccountCreationDetector, DetectorError};
use solana_pubkey::Pubkey;
use tempfile::tempdir;

/// A deposit into a protocol that creates a vault PDA for the depositor two
/// levels deep and funds a fresh system-owned account on the way.
///
/// Keys: 0 depositor, 1 system program, 2 protocol, 3 router, 4 vault,
/// 5 fee wallet.
fn deposit(depositor: Pubkey, protocol: Pubkey, vault: Pubkey) -> ParsedTransaction {
    let router = Pubkey::new_unique();
    let fee_wallet = Pubkey::new_unique();
    let mut create = 0u32.to_le_bytes().to_vec();
    create.extend_from_slice(&[0u8; 48]);
    let mut transfer = 2u32.to_le_bytes().to_vec();
    transfer.extend_from_slice(&[0u8; 8]);

    ParsedTransaction {
        signature: Some("deposit".to_string()),
        slot: Some(42),
        account_keys: vec![depositor, SYSTEM_PROGRAM_ID, protocol, router, vault, fee_wallet],
        instructions: vec![InstructionRecord::new(3, vec![0, 4, 5, 2, 1], vec![9])],
        meta: Some(TransactionMeta {
            pre_balances: vec![5_000_000, 1, 1, 1, 0, 0],
            post_balances: vec![2_000_000, 1, 1, 1, 2_000_000, 900_000],
            inner_instructions: Some(vec![InnerInstructionGroup::new(
                0,
                vec![
                    InstructionRecord::new(2, vec![0, 4, 1], vec![1]).with_stack_height(2),
                    InstructionRecord::new(1, vec![0, 4], create).with_stack_height(3),
                    InstructionRecord::new(1, vec![0, 5], transfer).with_stack_height(2),
                ],
            )]),
            log_messages: None,
            failed: false,
        }),
    }
}

#[tokio::test]
async fn test_detects_vault_created_by_nested_cpi() {
    let depositor = Pubkey::new_unique();
    let protocol = Pubkey::new_unique();
    let recipe = analyzer::SeedRecipe::new(
        "vault",
        protocol,
        vec![SeedComponent::Literal("vault".to_string()), SeedComponent::Subject],
    );
    let vault = recipe.derive(&depositor).unwrap().unwrap();
    let tx = deposit(depositor, protocol, vault);

    let tree = analyzer::build_transaction_tree(&tx).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 2);
    assert_eq!(tree[0].children[0].children[0].depth, 3);

    let mut lookup = HashMap::new();
    lookup.insert(vault, AccountInfo::new(protocol, 2_000_000));
    lookup.insert(tx.account_keys[5], AccountInfo::new(SYSTEM_PROGRAM_ID, 900_000));

    let mut config = DetectorConfig::default();
    config.recipes = vec![recipe];
    let detector = AccountCreationDetector::new(config);
    let created = detector.detect(&tx, &tree, &depositor, &lookup).await.unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].account, vault);
    assert_eq!(created[0].class.to_string(), format!("program-owned-matched:{}", protocol));
    assert!(created[0].signals.balance && created[0].signals.allocation);
}

#[tokio::test]
async fn test_unsupported_depth_jump_is_reported() {
    let depositor = Pubkey::new_unique();
    let mut tx = deposit(depositor, Pubkey::new_unique(), Pubkey::new_unique());
    if let Some(groups) = tx.meta.as_mut().and_then(|meta| meta.inner_instructions.as_mut()) {
        groups[0].instructions[1].stack_height = Some(4);
    }
    let detector = AccountCreationDetector::new(DetectorConfig::default());
    let result = analyzer::analyze_transaction(&detector, &tx, &depositor, &HashMap::<Pubkey, AccountInfo>::new()).await;
    assert!(matches!(result, Err(DetectorError::MalformedInput(_))));
}

#[test]
fn test_configuration_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("detector.json");
    let program = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let json = format!(
        r#"{{
            "detector": {{
                "filter": {{ "keep_system_owned": true }},
                "ata": {{ "mints": ["{mint}"] }},
                "max_concurrent_lookups": 2,
                "recipes": [
                    {{
                        "name": "position",
                        "program_id": "{program}",
                        "seeds": [{{ "literal": "position" }}, "subject", {{ "hex": "00ff" }}]
                    }}
                ]
            }},
            "scan": {{ "page_size": 250, "max_pages": null }}
        }}"#
    );
    fs::write(&path, json).unwrap();

    let config = Configuration::from_file(&path).unwrap();
    assert!(config.detector.filter.keep_system_owned);
    assert!(!config.detector.filter.keep_subject);
    assert_eq!(config.detector.ata.mints, vec![mint]);
    assert!(config.detector.ata.infer_mint_from_account_data);
    assert_eq!(config.detector.max_concurrent_lookups, 2);
    assert_eq!(config.detector.program_ids.token_programs[0], TOKEN_PROGRAM_ID);
    assert_eq!(config.detector.recipes[0].program_id, program);
    assert_eq!(config.detector.recipes[0].seeds[1], SeedComponent::Subject);
    assert_eq!(config.scan.page_size, 250);
    assert_eq!(config.scan.max_pages, None);
    assert_eq!(config.scan.rpc_timeout_secs, 30);

    let loaded = Configuration::load(Some(&path)).unwrap();
    assert_eq!(loaded.detector, config.detector);
}

#[test]
fn test_omitted_max_pages_scans_one_page() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.json");
    fs::write(&path, r#"{ "scan": { "page_size": 50 } }"#).unwrap();

    let config = Configuration::from_file(&path).unwrap();
    assert_eq!(config.scan.page_size, 50);
    assert_eq!(config.scan.max_pages, Some(1));
}

#[test]
fn test_configuration_rejects_invalid_values() {
    let dir = tempdir().unwrap();

    let path = dir.path().join("page.json");
    fs::write(&path, r#"{ "scan": { "page_size": 5000 } }"#).unwrap();
    assert!(matches!(Configuration::from_file(&path), Err(DetectorError::Config(_))));

    let path = dir.path().join("lookups.json");
    fs::write(&path, r#"{ "detector": { "max_concurrent_lookups": 0 } }"#).unwrap();
    assert!(matches!(Configuration::from_file(&path), Err(DetectorError::Config(_))));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{ detector").unwrap();
    assert!(matches!(Configuration::from_file(&path), Err(DetectorError::Config(_))));

    assert!(Configuration::from_file(&dir.path().join("missing.json")).is_err());
}

#[tokio::test]
async fn test_token_account_classified_without_mint_list() {
    let wallet = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let ata = analyzer::recipes::associated_token_address(
        &wallet,
        &mint,
        &TOKEN_PROGRAM_ID,
        &solana_pda_detector::constants::programs::ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .unwrap();
    let mut tx = deposit(wallet, Pubkey::new_unique(), ata);
    tx.meta.as_mut().unwrap().pre_balances[5] = 1;

    let mut data = vec![0u8; 165];
    data[..32].copy_from_slice(mint.as_ref());
    let mut lookup = HashMap::new();
    lookup.insert(ata, AccountInfo::new(TOKEN_PROGRAM_ID, 2_000_000).with_data(data));

    let detector = AccountCreationDetector::new(DetectorConfig::default());
    let created = analyzer::analyze_transaction(&detector, &tx, &wallet, &lookup).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].class, AccountClass::AssociatedTokenAccount { mint });
}
