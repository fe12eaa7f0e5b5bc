//! Contract-level parsing and lookup.

use chainsock_abi::{AbiError, Contract, DecodedReturn};
use chainsock_core::{keccak, Address, Bytes4, Log, Uint256, Value};

const ERC20_ABI: &str = r#"[
    {
        "type": "constructor",
        "inputs": [{"name": "supply", "type": "uint256"}],
        "stateMutability": "nonpayable"
    },
    {
        "name": "transfer",
        "type": "function",
        "inputs": [
            {"name": "to", "type": "address"},
            {"name": "amount", "type": "uint256"}
        ],
        "outputs": [{"name": "", "type": "bool"}],
        "constant": false,
        "payable": false,
        "stateMutability": "nonpayable"
    },
    {
        "name": "balanceOf",
        "type": "function",
        "inputs": [{"name": "owner", "type": "address"}],
        "outputs": [{"name": "balance", "type": "uint"}],
        "constant": true,
        "payable": false,
        "stateMutability": "view"
    },
    {
        "name": "Transfer",
        "type": "event",
        "anonymous": false,
        "inputs": [
            {"name": "from", "type": "address", "indexed": true},
            {"name": "to", "type": "address", "indexed": true},
            {"name": "value", "type": "uint256", "indexed": false}
        ]
    },
    {"type": "fallback", "payable": true, "stateMutability": "payable"},
    {"type": "receive", "stateMutability": "payable"}
]"#;

#[test]
fn lookups_by_name_selector_and_topic() {
    let c = Contract::from_json(ERC20_ABI).unwrap();

    let transfer = c.function("transfer").unwrap();
    assert_eq!(transfer.selector(), Bytes4::from_hex("0xa9059cbb").unwrap());
    assert_eq!(
        c.function_by_selector(&transfer.selector()).unwrap().name(),
        "transfer"
    );
    assert_eq!(
        c.function("balanceOf").unwrap().signature(),
        "balanceOf(address)"
    );

    let event = c.event("Transfer").unwrap();
    let topic = keccak::signature_hash("Transfer(address,address,uint256)");
    assert_eq!(event.topic(), topic);
    assert_eq!(c.event_by_topic(&topic).unwrap().name(), "Transfer");

    assert!(c.fallback().unwrap().payable);
    assert_eq!(c.constructor().unwrap().inputs.len(), 1);
    assert_eq!(c.functions().count(), 2);
}

#[test]
fn second_fallback_is_rejected() {
    let abi = r#"[
        {"type": "fallback", "stateMutability": "nonpayable"},
        {"type": "fallback", "stateMutability": "payable"}
    ]"#;
    assert!(matches!(
        Contract::from_json(abi),
        Err(AbiError::MultipleFallbacks { count: 2 })
    ));
}

#[test]
fn tuple_parameters_are_rejected() {
    let abi = r#"[{
        "name": "swap",
        "type": "function",
        "inputs": [{"name": "p", "type": "tuple", "components": [{"name": "a", "type": "uint256"}]}],
        "outputs": []
    }]"#;
    assert!(matches!(
        Contract::from_json(abi),
        Err(AbiError::UnsupportedType { .. })
    ));
}

#[test]
fn overloaded_name_keeps_last_declaration() {
    let abi = r#"[
        {"name": "f", "type": "function", "inputs": [{"name": "a", "type": "uint256"}], "outputs": []},
        {"name": "f", "type": "function", "inputs": [{"name": "a", "type": "address"}], "outputs": []}
    ]"#;
    let c = Contract::from_json(abi).unwrap();
    assert_eq!(c.function("f").unwrap().signature(), "f(address)");
    assert!(c
        .function_by_selector(&keccak::selector("f(uint256)"))
        .is_some());
}

#[test]
fn return_and_log_decoding_through_contract() {
    let c = Contract::from_json(ERC20_ABI).unwrap();

    let mut word = [0u8; 32];
    word[30] = 0x01;
    let balance = c.function("balanceOf").unwrap().decode_return(&word).unwrap();
    assert_eq!(
        balance,
        DecodedReturn::Single(Value::from(Uint256::try_from(256u64).unwrap()))
    );

    let event = c.event("Transfer").unwrap();
    let from = Address::from_array([0x01; 20]);
    let mut from_topic = [0u8; 32];
    from_topic[12..].copy_from_slice(from.as_array());
    let log = Log {
        address: Address::from_array([0xee; 20]),
        topics: vec![
            event.topic(),
            chainsock_core::Bytes32::from_array(from_topic),
            chainsock_core::Bytes32::from_array([0u8; 32]),
        ],
        data: format!("0x{:064x}", 7u64),
        block_hash: None,
        block_number: None,
        transaction_hash: None,
        transaction_index: None,
        log_index: None,
        removed: false,
    };
    let decoded = event.decode_log(&log).unwrap().unwrap();
    assert_eq!(decoded.get("from"), Some(&Value::from(from)));
    assert_eq!(decoded.get("to"), Some(&Value::from(Address::ZERO)));
    assert_eq!(
        decoded.get("value").and_then(Value::as_u256),
        Some(alloy_primitives::U256::from(7u64))
    );
}
