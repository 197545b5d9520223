use super::*;
use solana_pubkey::Pubkey;

fn leaf(program: u8) -> InstructionRecord {
    InstructionRecord::new(program, vec![0, 1], vec![1, 2, 3])
}

#[test]
fn test_account_class_tags() {
    let program = Pubkey::new_unique();
    assert_eq!(AccountClass::SelfAccount.to_string(), "self");
    assert_eq!(AccountClass::SystemOwned.to_string(), "system-owned");
    assert_eq!(
        AccountClass::ProgramOwnedUnclassified.to_string(),
        "program-owned-unclassified"
    );
    assert_eq!(
        AccountClass::AssociatedTokenAccount { mint: program }.to_string(),
        "associated-token-account"
    );
    let matched = AccountClass::ProgramOwnedMatched {
        program_id: program,
        recipe: "vault".to_string(),
    };
    assert_eq!(matched.to_string(), format!("program-owned-matched:{}", program));
    assert!(!matched.is_associated_token_account());
}

#[test]
fn test_created_account_record_serialization() {
    let account = Pubkey::new_unique();
    let owner = Pubkey::new_unique();
    let record = CreatedAccountRecord {
        account,
        class: AccountClass::ProgramOwnedUnclassified,
        owner: Some(owner),
        signals: Signals {
            balance: true,
            allocation: false,
        },
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["account"], account.to_string());
    assert_eq!(value["owner"], owner.to_string());
    assert_eq!(value["class"], "program-owned-unclassified");
    assert_eq!(value["signals"]["balance"], true);

    let subject = CreatedAccountRecord {
        owner: None,
        class: AccountClass::SelfAccount,
        ..record
    };
    assert!(serde_json::to_value(&subject).unwrap()["owner"].is_null());
}

#[test]
fn test_pre_order_walks_depth_first() {
    let records: Vec<InstructionRecord> = (0..5).map(leaf).collect();
    let mut first = CallNode::new(&records[0], 1);
    let mut nested = CallNode::new(&records[1], 2);
    nested.children.push(CallNode::new(&records[2], 3));
    first.children.push(nested);
    first.children.push(CallNode::new(&records[3], 2));
    let second = CallNode::new(&records[4], 1);
    let forest = vec![first, second];

    let order: Vec<u8> = pre_order(&forest)
        .map(|node| node.instruction.program_id_index)
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    assert_eq!(forest[0].descendant_count(), 3);
    assert_eq!(forest[1].descendant_count(), 0);
    assert_eq!(forest[0].children[0].pre_order().count(), 2);
}

#[test]
fn test_instruction_resolves_accounts() {
    let keys = vec![Pubkey::new_unique(), Pubkey::new_unique()];
    let ix = InstructionRecord::new(1, vec![0, 7], vec![]);
    assert_eq!(ix.program_id(&keys), Some(&keys[1]));
    assert_eq!(ix.account(&keys, 0), Some(&keys[0]));
    assert_eq!(ix.account(&keys, 1), None);
    assert_eq!(ix.account(&keys, 2), None);
}

#[test]
fn test_transaction_accessors_without_meta() {
    let tx = ParsedTransaction::default();
    assert!(tx.inner_groups().is_empty());
    assert!(tx.log_messages().is_none());
    assert_eq!(tx.label(), "<unsigned>");
}

#[test]
fn test_group_declares_stack_height() {
    let group = InnerInstructionGroup::new(0, vec![leaf(1), leaf(2)]);
    assert!(!group.declares_stack_height());
    let group = InnerInstructionGroup::new(0, vec![leaf(1), leaf(2).with_stack_height(2)]);
    assert!(group.declares_stack_height());
}

#[test]
fn test_token_account_mint() {
    let mint = Pubkey::new_unique();
    let mut data = vec![0u8; 165];
    data[..32].copy_from_slice(mint.as_ref());
    let info = AccountInfo::new(Pubkey::new_unique(), 2_039_280).with_data(data);
    assert_eq!(info.token_account_mint(), Some(mint));

    let short = AccountInfo::new(Pubkey::new_unique(), 1).with_data(vec![0u8; 64]);
    assert_eq!(short.token_account_mint(), None);
}
