//! Insert → search → count → traverse against one hosted domain.

use super::harness::{group, transaction, user, TestNode, DOMAIN};
use dl_02_transaction_format::{Asset, TransactionBuilder};
use shared_crypto::Ed25519KeyPair;
use shared_types::{status, Command, DomainId, KeyType, TransactionId};

#[tokio::test]
async fn test_two_events_in_one_group() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut client = node.connect(1).await;
    client.register(&DOMAIN).await;

    let mut tx = TransactionBuilder::new()
        .timestamp(1)
        .event(group(7), Asset::new(user(1), b"first".to_vec(), b"a".to_vec()))
        .event(group(7), Asset::new(user(1), b"second".to_vec(), b"b".to_vec()))
        .witness(user(1))
        .build()
        .unwrap();
    tx.sign(user(1), &Ed25519KeyPair::from_seed([1; 32]));
    let reply = client.insert(&DOMAIN, &tx).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::ESUCCESS));

    let mut count = client.request(Command::RequestCountTransactions, &DOMAIN);
    count.set_id(KeyType::AssetGroupId, &group(7));
    client.send(count).await;
    let reply = client.recv_command(Command::ResponseCountTransactions).await;
    assert_eq!(reply.int(KeyType::Count), Some(2));

    let mut search = client.request(Command::RequestSearchWithConditions, &DOMAIN);
    search
        .set_id(KeyType::AssetGroupId, &group(7))
        .set_int(KeyType::Count, 2);
    client.send(search).await;
    let reply = client.recv_command(Command::ResponseSearchWithConditions).await;
    assert_eq!(
        reply.list(KeyType::Transactions).unwrap(),
        &[tx.serialize().unwrap()][..]
    );

    let mut traverse = client.request(Command::RequestTraverseTransactions, &DOMAIN);
    traverse
        .set_id(KeyType::TransactionId, &tx.transaction_id)
        .set_int(KeyType::Direction, 1)
        .set_int(KeyType::HopCount, 3);
    client.send(traverse).await;
    let reply = client.recv_command(Command::ResponseTraverseTransactions).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::ENOTRANSACTION));
}

#[tokio::test]
async fn test_insert_search_count_traverse() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut client = node.connect(1).await;
    client.register(&DOMAIN).await;

    let root = transaction(1, 1, 100, &[]);
    let child = transaction(1, 1, 101, &[root.transaction_id]);
    for tx in [&root, &child] {
        let reply = client.insert(&DOMAIN, tx).await;
        assert_eq!(reply.int(KeyType::Status), Some(status::ESUCCESS));
        assert_eq!(
            reply.id::<TransactionId>(KeyType::TransactionId).unwrap(),
            Some(tx.transaction_id)
        );
    }

    // By id.
    let mut search = client.request(Command::RequestSearchTransaction, &DOMAIN);
    search.set_id(KeyType::TransactionId, &child.transaction_id);
    client.send(search).await;
    let reply = client.recv_command(Command::ResponseSearchTransaction).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::ESUCCESS));
    assert_eq!(
        reply.bytes(KeyType::TransactionData),
        Some(child.serialize().unwrap().as_slice())
    );

    // By condition.
    let mut search = client.request(Command::RequestSearchWithConditions, &DOMAIN);
    search
        .set_id(KeyType::AssetGroupId, &group(1))
        .set_int(KeyType::Count, 10);
    client.send(search).await;
    let reply = client.recv_command(Command::ResponseSearchWithConditions).await;
    let mut found = reply.list(KeyType::Transactions).unwrap().to_vec();
    found.sort();
    let mut expected = vec![root.serialize().unwrap(), child.serialize().unwrap()];
    expected.sort();
    assert_eq!(found, expected);
    assert!(!reply.contains(KeyType::CompromisedTransactions));

    let mut count = client.request(Command::RequestCountTransactions, &DOMAIN);
    count.set_id(KeyType::UserId, &user(1));
    client.send(count).await;
    let reply = client.recv_command(Command::ResponseCountTransactions).await;
    assert_eq!(reply.int(KeyType::Count), Some(2));

    // Toward the past from the child reaches the root.
    let mut traverse = client.request(Command::RequestTraverseTransactions, &DOMAIN);
    traverse
        .set_id(KeyType::TransactionId, &child.transaction_id)
        .set_int(KeyType::Direction, 1)
        .set_int(KeyType::HopCount, 3);
    client.send(traverse).await;
    let reply = client.recv_command(Command::ResponseTraverseTransactions).await;
    assert_eq!(reply.bool(KeyType::AllIncluded), Some(true));
    assert_eq!(
        reply.tree(KeyType::TransactionTree).unwrap(),
        &[vec![root.serialize().unwrap()]][..]
    );

    // The root has no ancestors.
    let mut traverse = client.request(Command::RequestTraverseTransactions, &DOMAIN);
    traverse
        .set_id(KeyType::TransactionId, &root.transaction_id)
        .set_int(KeyType::Direction, 1)
        .set_int(KeyType::HopCount, 3);
    client.send(traverse).await;
    let reply = client.recv_command(Command::ResponseTraverseTransactions).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::ENOTRANSACTION));
    assert_eq!(
        reply.id::<TransactionId>(KeyType::TransactionId).unwrap(),
        Some(root.transaction_id)
    );

    node.stop().await;
}

#[tokio::test]
async fn test_rejected_insert_is_counted() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut client = node.connect(1).await;
    client.register(&DOMAIN).await;

    let mut insert = client.request(Command::RequestInsert, &DOMAIN);
    insert.set_bytes(KeyType::TransactionData, b"not a transaction".to_vec());
    client.send(insert).await;
    let reply = client.recv_command(Command::ResponseInsert).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::EINVALID_COMMAND));
    assert_eq!(reply.text(KeyType::Reason), Some("Bad transaction format"));

    let stats = client.request(Command::RequestGetStats, &DOMAIN);
    client.send(stats).await;
    let reply = client.recv_command(Command::ResponseGetStats).await;
    let stats: serde_json::Value = serde_json::from_str(reply.text(KeyType::Stats).unwrap()).unwrap();
    assert_eq!(stats["transaction"]["invalid"], 1);
    assert_eq!(stats["transaction"]["insert_fail_count"], 1);
    assert_eq!(stats["client"]["total_num"], 1);
}

#[tokio::test]
async fn test_insert_into_unknown_domain() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut client = node.connect(1).await;
    let elsewhere = DomainId::new([0xEE; 32]);

    let reply = client.insert(&elsewhere, &transaction(1, 1, 0, &[])).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::EINVALID_COMMAND));
    assert_eq!(reply.text(KeyType::Reason), Some("Set up the domain, first!"));
}

#[tokio::test]
async fn test_missing_and_malformed_params() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut client = node.connect(1).await;
    client.register(&DOMAIN).await;

    let search = client.request(Command::RequestSearchTransaction, &DOMAIN);
    client.send(search).await;
    let reply = client.recv_command(Command::ResponseSearchTransaction).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::EINVALID_COMMAND));
    assert_eq!(reply.text(KeyType::Reason), Some("lack of mandatory params"));

    let mut search = client.request(Command::RequestSearchTransaction, &DOMAIN);
    search.set_bytes(KeyType::TransactionId, vec![0xAB; 5]);
    client.send(search).await;
    let reply = client.recv_command(Command::ResponseSearchTransaction).await;
    assert_eq!(reply.text(KeyType::Reason), Some("invalid params"));

    let mut search = client.request(Command::RequestSearchTransaction, &DOMAIN);
    search.set_id(KeyType::TransactionId, &TransactionId::new([0x42; 32]));
    client.send(search).await;
    let reply = client.recv_command(Command::ResponseSearchTransaction).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::ENOTRANSACTION));
}
