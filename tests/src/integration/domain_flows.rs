//! Domain lifecycle, insert notifications and introspection.

use super::harness::{group, transaction, user, TestNode, DOMAIN};
use shared_types::{status, Command, DomainId, Identifier, KeyType, NodeId, TransactionId};
use std::time::Duration;

const NEW_DOMAIN: DomainId = DomainId::new([0xA1; 32]);

#[tokio::test]
async fn test_setup_and_close_domain() {
    let node = TestNode::start(&[]).await;
    let mut admin = node.connect(9).await;

    let mut setup = admin.request(Command::RequestSetupDomain, &NEW_DOMAIN);
    setup.set_text(KeyType::BbcConfiguration, r#"{"name": "e2e"}"#);
    admin.send(setup.clone()).await;
    let reply = admin.recv_command(Command::ResponseSetupDomain).await;
    assert_eq!(reply.bool(KeyType::Result), Some(true));
    assert_eq!(reply.id::<DomainId>(KeyType::DomainId).unwrap(), Some(NEW_DOMAIN));

    admin.send(setup).await;
    let reply = admin.recv_command(Command::ResponseSetupDomain).await;
    assert_eq!(reply.bool(KeyType::Result), Some(false));
    assert_eq!(reply.text(KeyType::Reason), Some("Already exists"));

    let list = admin.request(Command::RequestGetDomainList, &NEW_DOMAIN);
    admin.send(list).await;
    let reply = admin.recv_command(Command::ResponseGetDomainList).await;
    let expected = [&[0u8, 1][..], NEW_DOMAIN.as_bytes()].concat();
    assert_eq!(reply.bytes(KeyType::DomainList), Some(expected.as_slice()));

    let get_node_id = admin.request(Command::RequestGetNodeId, &NEW_DOMAIN);
    admin.send(get_node_id.clone()).await;
    let reply = admin.recv_command(Command::ResponseGetNodeId).await;
    assert_eq!(reply.bool(KeyType::Result), Some(true));
    let node_id = reply.id::<NodeId>(KeyType::NodeId).unwrap().unwrap();

    let config = admin.request(Command::RequestGetConfig, &NEW_DOMAIN);
    admin.send(config).await;
    let reply = admin.recv_command(Command::ResponseGetConfig).await;
    let config: serde_json::Value =
        serde_json::from_str(reply.text(KeyType::BbcConfiguration).unwrap()).unwrap();
    let entry = &config["domains"][NEW_DOMAIN.to_hex()];
    assert_eq!(entry["name"], "e2e");
    assert_eq!(entry["node_id"], node_id.to_hex());

    let close = admin.request(Command::RequestCloseDomain, &NEW_DOMAIN);
    admin.send(close.clone()).await;
    let reply = admin.recv_command(Command::ResponseCloseDomain).await;
    assert_eq!(reply.bool(KeyType::Result), Some(true));
    assert!(!reply.contains(KeyType::DomainId));

    admin.send(close).await;
    let reply = admin.recv_command(Command::ResponseCloseDomain).await;
    assert_eq!(reply.bool(KeyType::Result), Some(false));
    assert_eq!(reply.text(KeyType::Reason), Some("No such domain"));

    admin.send(get_node_id).await;
    let reply = admin.recv_command(Command::ResponseGetNodeId).await;
    assert_eq!(reply.bool(KeyType::Result), Some(false));
}

#[tokio::test]
async fn test_configuration_survives_restart() {
    let node = TestNode::start(&[]).await;
    let mut admin = node.connect(9).await;
    let setup = admin.request(Command::RequestSetupDomain, &NEW_DOMAIN);
    admin.send(setup).await;
    admin.recv_command(Command::ResponseSetupDomain).await;
    let node_id = node.service.registry().get(&NEW_DOMAIN).unwrap().node_id().to_hex();
    drop(admin);

    let dir = node.stop().await;
    let raw = std::fs::read_to_string(dir.path().join(dl_05_core_service::CONFIG_FILE_NAME)).unwrap();
    let config: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(config["domains"][NEW_DOMAIN.to_hex()]["node_id"], node_id);
}

#[tokio::test]
async fn test_insert_notification_subscription() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut inserter = node.connect(1).await;
    let mut watcher = node.connect(2).await;
    inserter.register(&DOMAIN).await;
    watcher.register(&DOMAIN).await;

    let mut subscribe = watcher.request(Command::RequestInsertNotification, &DOMAIN);
    subscribe.set_id(KeyType::AssetGroupId, &group(1));
    watcher.send(subscribe).await;

    let list = watcher.request(Command::RequestGetNotificationList, &DOMAIN);
    watcher.send(list).await;
    let reply = watcher.recv_command(Command::ResponseGetNotificationList).await;
    assert_eq!(reply.bool(KeyType::Result), Some(true));
    let expected = [
        &[0u8, 1][..],
        group(1).as_bytes(),
        &[0u8, 1][..],
        user(2).as_bytes(),
    ]
    .concat();
    assert_eq!(reply.bytes(KeyType::NotificationList), Some(expected.as_slice()));

    let tx = transaction(1, 1, 7, &[]);
    inserter.insert(&DOMAIN, &tx).await;
    let notice = watcher.recv_command(Command::NotifyInserted).await;
    assert_eq!(
        notice.id::<TransactionId>(KeyType::TransactionId).unwrap(),
        Some(tx.transaction_id)
    );
    assert_eq!(notice.list(KeyType::AssetGroupIds).unwrap(), &[group(1).to_vec()][..]);

    let mut cancel = watcher.request(Command::CancelInsertNotification, &DOMAIN);
    cancel.set_id(KeyType::AssetGroupId, &group(1));
    watcher.send(cancel).await;
    watcher.sync().await;

    inserter.insert(&DOMAIN, &transaction(1, 1, 8, &[])).await;
    watcher.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_users_follow_connections() {
    let node = TestNode::start(&[DOMAIN]).await;
    let mut stays = node.connect(1).await;
    let mut leaves = node.connect(2).await;
    stays.register(&DOMAIN).await;
    leaves.register(&DOMAIN).await;

    let users = stays.request(Command::RequestGetUsers, &DOMAIN);
    stays.send(users.clone()).await;
    let reply = stays.recv_command(Command::ResponseGetUsers).await;
    assert_eq!(reply.bytes(KeyType::UserList).unwrap()[..2], [0, 2]);

    let bye = leaves.request(Command::Unregister, &DOMAIN);
    leaves.send(bye).await;
    leaves.expect_closed().await;

    stays.send(users).await;
    let reply = stays.recv_command(Command::ResponseGetUsers).await;
    let expected = [&[0u8, 1][..], user(1).as_bytes()].concat();
    assert_eq!(reply.bytes(KeyType::UserList), Some(expected.as_slice()));

    let stats = stays.request(Command::RequestGetStats, &DOMAIN);
    stays.send(stats).await;
    let reply = stays.recv_command(Command::ResponseGetStats).await;
    let stats: serde_json::Value = serde_json::from_str(reply.text(KeyType::Stats).unwrap()).unwrap();
    assert_eq!(stats["client"]["total_num"], 1);
    assert_eq!(status::ESUCCESS, reply.int(KeyType::Status).unwrap());
}
