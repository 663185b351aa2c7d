//! Node and client fixtures shared by the flow tests.

use dl_01_message_codec::MessageCodec;
use dl_02_transaction_format::{Asset, Transaction, TransactionBuilder};
use dl_04_domain_registry::DomainConfig;
use dl_05_core_service::{
    CoreConfig, CoreServer, CoreService, JsonConfigStore, ServiceError, CONFIG_FILE_NAME,
};
use futures::{SinkExt, StreamExt};
use shared_crypto::Ed25519KeyPair;
use shared_types::{
    AssetGroupId, Command, DomainId, Identifier, KeyType, Message, TransactionId, UserId,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

pub const DOMAIN: DomainId = DomainId::new([0xD0; 32]);

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub fn user(n: u8) -> UserId {
    UserId::new([n; 32])
}

pub fn group(n: u8) -> AssetGroupId {
    AssetGroupId::new([n; 32])
}

/// Transaction with one asset of `user(u)` in `group(g)`, referencing
/// `parents` and signed by its owner.
pub fn transaction(g: u8, u: u8, timestamp: i64, parents: &[TransactionId]) -> Transaction {
    let nonce = [&[g, u][..], &timestamp.to_be_bytes()].concat();
    let mut builder = TransactionBuilder::new()
        .timestamp(timestamp)
        .event(group(g), Asset::new(user(u), nonce, b"e2e asset".to_vec()))
        .witness(user(u));
    for parent in parents {
        builder = builder.reference(group(g), *parent, 0);
    }
    let mut tx = builder.build().unwrap();
    tx.sign(user(u), &Ed25519KeyPair::from_seed([u; 32]));
    tx
}

/// A node serving on `127.0.0.1:<ephemeral>` with its config in a temp dir.
pub struct TestNode {
    pub addr: SocketAddr,
    pub service: Arc<CoreService>,
    pub store: Arc<JsonConfigStore>,
    pub dir: TempDir,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<Result<(), ServiceError>>,
}

impl TestNode {
    pub async fn start(domains: &[DomainId]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::default();
        for domain_id in domains {
            config.set_domain(domain_id, DomainConfig::default());
        }
        let store = Arc::new(JsonConfigStore::new(dir.path().join(CONFIG_FILE_NAME), config));
        let service = CoreService::bootstrap(store.clone()).unwrap();

        let server = CoreServer::bind_addr(service.clone(), "127.0.0.1:0".parse().unwrap(), 16)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(server.run(shutdown_rx));

        Self {
            addr,
            service,
            store,
            dir,
            shutdown_tx,
            server,
        }
    }

    pub async fn connect(&self, n: u8) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        TestClient {
            user: user(n),
            frames: Framed::new(stream, MessageCodec::new()),
        }
    }

    /// Stop accepting and persist the configuration.
    pub async fn stop(self) -> TempDir {
        self.shutdown_tx.send(true).unwrap();
        tokio::time::timeout(RECV_TIMEOUT, self.server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        self.service.shutdown();
        self.dir
    }
}

pub struct TestClient {
    pub user: UserId,
    frames: Framed<TcpStream, MessageCodec>,
}

impl TestClient {
    /// Request from this client's user in `domain_id`.
    pub fn request(&self, command: Command, domain_id: &DomainId) -> Message {
        let mut msg = Message::with_command(command);
        msg.set_id(KeyType::SourceUserId, &self.user)
            .set_id(KeyType::DomainId, domain_id)
            .set_bytes(KeyType::QueryId, self.user.as_bytes()[..2].to_vec());
        msg
    }

    pub async fn send(&mut self, message: Message) {
        self.frames.send(message).await.unwrap();
    }

    pub async fn recv(&mut self) -> Message {
        tokio::time::timeout(RECV_TIMEOUT, self.frames.next())
            .await
            .expect("no message within timeout")
            .expect("connection closed")
            .unwrap()
    }

    /// Next message carrying `command`, skipping anything else.
    pub async fn recv_command(&mut self, command: Command) -> Message {
        loop {
            let msg = self.recv().await;
            if msg.command() == Some(command) {
                return msg;
            }
        }
    }

    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(msg)) = tokio::time::timeout(wait, self.frames.next()).await {
            panic!("unexpected message: {:?}", msg.map(|m| m.command()));
        }
    }

    /// Wait until the node closes this connection.
    pub async fn expect_closed(&mut self) {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.frames.next()).await {
                Ok(None) | Ok(Some(Err(_))) => return,
                Ok(Some(Ok(_))) => continue,
                Err(_) => panic!("connection still open"),
            }
        }
    }

    /// Send and wait for the direct `RESPONSE_GET_STATS`. Everything sent
    /// before has been dispatched once this returns.
    pub async fn sync(&mut self) {
        let stats = self.request(Command::RequestGetStats, &DOMAIN);
        self.send(stats).await;
        self.recv_command(Command::ResponseGetStats).await;
    }

    pub async fn register(&mut self, domain_id: &DomainId) {
        let register = self.request(Command::Register, domain_id);
        self.send(register).await;
        self.sync().await;
    }

    /// Insert `tx` and return the node's answer.
    pub async fn insert(&mut self, domain_id: &DomainId, tx: &Transaction) -> Message {
        let mut insert = self.request(Command::RequestInsert, domain_id);
        insert.set_bytes(KeyType::TransactionData, tx.serialize().unwrap());
        self.send(insert).await;
        self.recv_command(Command::ResponseInsert).await
    }
}
