//! End-to-end call/result/event flow against a token ABI

use alloy_primitives::U256;

use tvmkit::abi::{
    decode_outputs, decode_single, topic, AbiType, AbiValue, CallBuilder, ContractAbi, EventLog,
    LogDecoder,
};
use tvmkit::Address;

const TOKEN_ABI: &str = r#"[
    {"type":"constructor","inputs":[{"name":"supply","type":"uint256"}],"stateMutability":"nonpayable"},
    {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
    {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
    {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}],"anonymous":false}
]"#;

fn recipient() -> Address {
    Address::from_hex("41a614f803b6fd780986a42c78ec9c7f77e6ded13c").unwrap()
}

#[test]
fn abi_surface_reports_signatures_and_mutability() {
    let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
    assert_eq!(
        abi.methods_signatures(),
        vec!["transfer(address,uint256)", "balanceOf(address)"]
    );
    assert_eq!(
        abi.events_signatures(),
        vec!["Transfer(address,address,uint256)"]
    );
    assert!(abi.is_read_only("balanceOf").unwrap());
    assert!(!abi.is_read_only("transfer").unwrap());
}

#[test]
fn both_authoring_surfaces_produce_identical_calldata() {
    let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();

    let typed = CallBuilder::for_function(&abi, "transfer")
        .unwrap()
        .add_address(recipient())
        .add_uint(U256::from(1_000_000u64))
        .build()
        .unwrap();

    let b58 = recipient().to_base58();
    let stringified = CallBuilder::new("transfer(address,uint256)")
        .unwrap()
        .args_from_strings(&[b58.as_str(), "1000000"])
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(typed, stringified);
    assert_eq!(typed[..4], [0xa9, 0x05, 0x9c, 0xbb]);
    assert_eq!(typed.len(), 4 + 64);
}

#[test]
fn result_buffers_decode_against_declared_outputs() {
    let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();

    // balanceOf returns a single uint256.
    let result = U256::from(987_654_321u64).to_be_bytes::<32>();
    let outputs = abi.function("balanceOf").unwrap().output_types();
    let values = decode_outputs(&outputs, &result).unwrap();
    assert_eq!(values[0].as_uint().unwrap(), U256::from(987_654_321u64));

    let single = decode_single(&AbiType::Uint(256), &result).unwrap();
    assert_eq!(single.as_uint().unwrap(), U256::from(987_654_321u64));
}

#[test]
fn transfer_log_round_trips_through_the_decoder() {
    let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
    let decoder = LogDecoder::new(&abi);

    let from = Address::from_bytes(&[0x11; 20]).unwrap();
    let to = recipient();
    let word = |a: &Address| {
        let mut w = [0u8; 32];
        w[12..].copy_from_slice(a.payload());
        w.into()
    };

    let log = EventLog {
        address: Address::from_bytes(&[0xcc; 20]).unwrap(),
        topics: vec![
            topic("Transfer(address,address,uint256)"),
            word(&from),
            word(&to),
        ],
        data: U256::from(31_337u64).to_be_bytes::<32>().to_vec(),
    };

    let event = decoder.interpret(log).event().cloned().expect("recognized");
    assert_eq!(event.signature, "Transfer(address,address,uint256)");
    assert_eq!(event.value("from").unwrap().as_address().unwrap(), &from);
    assert_eq!(event.value("to").unwrap().as_address().unwrap(), &to);
    assert_eq!(
        event.value("value").unwrap().as_uint().unwrap(),
        U256::from(31_337u64)
    );
    assert_eq!(event.kind("value").unwrap(), &AbiType::Uint(256));
}

#[test]
fn constructor_arguments_append_to_bytecode() {
    let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
    let deploy_args = CallBuilder::for_constructor(&abi)
        .add_uint(U256::from(21_000_000u64))
        .build_constructor()
        .unwrap();

    let mut deployment = vec![0x60, 0x80, 0x60, 0x40]; // bytecode prefix stand-in
    deployment.extend_from_slice(&deploy_args);
    assert_eq!(deployment.len(), 4 + 32);
    assert_eq!(
        U256::from_be_slice(&deployment[4..]),
        U256::from(21_000_000u64)
    );
}

#[test]
fn dynamic_arguments_survive_a_full_round_trip() {
    let types = [
        AbiType::parse("string").unwrap(),
        AbiType::parse("uint256[]").unwrap(),
    ];
    let call = CallBuilder::new("submit(string,uint256[])")
        .unwrap()
        .add_string("hello chain")
        .add_array(vec![
            AbiValue::Uint(U256::from(1u64)),
            AbiValue::Uint(U256::from(2u64)),
        ])
        .build()
        .unwrap();

    let values = decode_outputs(&types, &call[4..]).unwrap();
    assert_eq!(values[0].as_str().unwrap(), "hello chain");
    assert_eq!(values[1].as_array().unwrap().len(), 2);
}
