//! Signature gathering and user-to-user messaging between two clients.

use super::harness::{user, TestNode, DOMAIN};
use dl_04_domain_registry::DEFAULT_ANYCAST_TTL;
use shared_types::{status, Command, Identifier, KeyType, Message};
use std::time::Duration;

fn gather_request(requester: &super::harness::TestClient, signers: &[u8]) -> Message {
    let mut gather = requester.request(Command::RequestGatherSignature, &DOMAIN);
    gather
        .set_bytes(KeyType::TransactionData, b"unsigned transaction".to_vec())
        .set_list(
            KeyType::DestinationUserIds,
            signers.iter().map(|n| user(*n).to_vec()).collect(),
        );
    gather
}

#[tokio::test]
async fn test_gather_signature_between_two_users() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut requester = node.connect(1).await;
    let mut signer = node.connect(2).await;
    requester.register(&DOMAIN).await;
    signer.register(&DOMAIN).await;

    let gather = gather_request(&requester, &[1, 2]);
    requester.send(gather).await;

    let ask = signer.recv_command(Command::RequestSignature).await;
    assert_eq!(ask.bytes(KeyType::SourceUserId), Some(user(1).as_bytes().as_slice()));
    assert_eq!(ask.bytes(KeyType::TransactionData), Some(&b"unsigned transaction"[..]));
    assert_eq!(ask.int(KeyType::Status), Some(status::ESUCCESS));

    let mut answer = signer.request(Command::ResponseSignature, &DOMAIN);
    answer
        .set_id(KeyType::DestinationUserId, &user(1))
        .set_int(KeyType::Status, status::ESUCCESS)
        .set_bytes(KeyType::Signature, vec![0x5A; 64])
        .set_int(KeyType::RefIndex, 0);
    if let Some(query_id) = ask.bytes(KeyType::QueryId) {
        answer.set_bytes(KeyType::QueryId, query_id.to_vec());
    }
    signer.send(answer).await;

    let relayed = requester.recv_command(Command::ResponseGatherSignature).await;
    assert_eq!(relayed.int(KeyType::Status), Some(status::ESUCCESS));
    assert_eq!(relayed.bytes(KeyType::Signature), Some(&[0x5A; 64][..]));
    assert_eq!(relayed.bytes(KeyType::SourceUserId), Some(user(2).as_bytes().as_slice()));
    assert_eq!(relayed.int(KeyType::RefIndex), Some(0));

    // The requester never signs for itself.
    requester.expect_silence(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_refusal_is_relayed() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut requester = node.connect(1).await;
    let mut signer = node.connect(2).await;
    requester.register(&DOMAIN).await;
    signer.register(&DOMAIN).await;

    let gather = gather_request(&requester, &[2]);
    requester.send(gather).await;
    signer.recv_command(Command::RequestSignature).await;

    let mut refusal = signer.request(Command::ResponseSignature, &DOMAIN);
    refusal
        .set_id(KeyType::DestinationUserId, &user(1))
        .set_int(KeyType::Status, status::EBADTRANSACTION)
        .set_text(KeyType::Reason, "will not sign");
    signer.send(refusal).await;

    let relayed = requester.recv_command(Command::ResponseGatherSignature).await;
    assert_eq!(relayed.int(KeyType::Status), Some(status::EBADTRANSACTION));
    assert_eq!(relayed.text(KeyType::Reason), Some("will not sign"));
    assert!(!relayed.contains(KeyType::Signature));
}

#[tokio::test]
async fn test_gather_without_destinations_fails() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut requester = node.connect(1).await;
    requester.register(&DOMAIN).await;

    let mut gather = gather_request(&requester, &[2]);
    gather.remove(KeyType::DestinationUserIds);
    requester.send(gather).await;

    let reply = requester.recv_command(Command::ResponseGatherSignature).await;
    assert_eq!(reply.int(KeyType::Status), Some(status::EINVALID_COMMAND));
    assert_eq!(reply.text(KeyType::Reason), Some("Fail to forward transaction"));
}

#[tokio::test]
async fn test_message_relay_and_anycast_ttl() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut alice = node.connect(1).await;
    let mut bob = node.connect(2).await;
    alice.register(&DOMAIN).await;
    bob.register(&DOMAIN).await;

    let mut hello = alice.request(Command::Message, &DOMAIN);
    hello
        .set_id(KeyType::DestinationUserId, &user(2))
        .set_bytes(KeyType::Message, b"hello".to_vec())
        .set_bool(KeyType::IsAnycast, true);
    alice.send(hello).await;

    let received = bob.recv_command(Command::Message).await;
    assert_eq!(received.bytes(KeyType::Message), Some(&b"hello"[..]));
    assert_eq!(received.int(KeyType::AnycastTtl), Some(DEFAULT_ANYCAST_TTL));
    assert_eq!(received.bytes(KeyType::SourceUserId), Some(user(1).as_bytes().as_slice()));
}

#[tokio::test]
async fn test_stored_messages_reach_late_user() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut alice = node.connect(1).await;
    alice.register(&DOMAIN).await;

    let mut note = alice.request(Command::Message, &DOMAIN);
    note.set_id(KeyType::DestinationUserId, &user(3))
        .set_bytes(KeyType::Message, b"while you were away".to_vec());
    alice.send(note).await;
    alice.sync().await;

    let mut carol = node.connect(3).await;
    carol.register(&DOMAIN).await;
    let mut fetch = carol.request(Command::RequestGetStoredMessages, &DOMAIN);
    fetch.set_bytes(KeyType::QueryId, vec![0x77]);
    carol.send(fetch).await;

    let stored = carol.recv_command(Command::Message).await;
    assert_eq!(stored.bytes(KeyType::Message), Some(&b"while you were away"[..]));
    assert_eq!(stored.bytes(KeyType::QueryId), Some(&[0x77u8][..]));
}
