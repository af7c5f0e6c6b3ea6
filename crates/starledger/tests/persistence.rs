//! SQLite-backed coordinator: durability across reopen.

use starledger::core::{sign_message, Keypair, Payload};
use starledger::store::{height_key, KvStore, SqliteStore};
use starledger::{Coordinator, LedgerConfig, ProofState};

#[tokio::test]
async fn chain_and_proofs_survive_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger_path = dir.path().join("ledger.db");
    let proof_path = dir.path().join("proofs.db");

    let keypair = Keypair::from_seed(&[21u8; 32]);
    let address = keypair.address();

    let (genesis, first) = {
        let c = Coordinator::open_sqlite(&ledger_path, &proof_path, LedgerConfig::default()).await?;
        let genesis = c.get_by_height(0).await?.expect("genesis written on open");

        let record = c.request_challenge(&address).await?;
        c.verify(&address, &sign_message(&keypair, &record.message))
            .await?;
        let first = c
            .submit(&address, Payload::owned(address.as_str(), b"one".to_vec()))
            .await?;

        // Leave a pending challenge behind.
        c.request_challenge(&address).await?;
        (genesis, first)
    };

    let c = Coordinator::open_sqlite(&ledger_path, &proof_path, LedgerConfig::default()).await?;

    assert_eq!(c.get_by_height(0).await?, Some(genesis));
    assert_eq!(c.current_height().await?, Some(1));
    assert_eq!(c.get_by_hash(&first.hash).await?, Some(first));

    let pending = c.station().get(&address).await?.expect("record persisted");
    assert_eq!(pending.state, ProofState::Pending);

    c.verify(&address, &sign_message(&keypair, &pending.message))
        .await?;
    let second = c
        .submit(&address, Payload::owned(address.as_str(), b"two".to_vec()))
        .await?;
    assert_eq!(second.height, 2);
    assert!(c.validate_chain().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn reopen_does_not_rewrite_genesis() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger_path = dir.path().join("ledger.db");
    let proof_path = dir.path().join("proofs.db");

    let first = Coordinator::open_sqlite(&ledger_path, &proof_path, LedgerConfig::default())
        .await?
        .get_by_height(0)
        .await?;

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let second = Coordinator::open_sqlite(&ledger_path, &proof_path, LedgerConfig::default())
        .await?
        .get_by_height(0)
        .await?;
    assert_eq!(first, second);

    let store = SqliteStore::open(&ledger_path)?;
    assert_eq!(store.len().await?, 1);
    assert!(store.get(&height_key(0)).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn tampering_on_disk_is_detected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let ledger_path = dir.path().join("ledger.db");
    let proof_path = dir.path().join("proofs.db");

    let c = Coordinator::open_sqlite(&ledger_path, &proof_path, LedgerConfig::default()).await?;
    for seed in [31u8, 32, 33] {
        let keypair = Keypair::from_seed(&[seed; 32]);
        let address = keypair.address();
        let record = c.request_challenge(&address).await?;
        c.verify(&address, &sign_message(&keypair, &record.message))
            .await?;
        c.submit(&address, Payload::owned(address.as_str(), vec![seed]))
            .await?;
    }

    let mut block = c.get_by_height(2).await?.expect("block 2");
    block.body.data = b"rewritten".to_vec().into();
    c.ledger()
        .store()
        .put(&height_key(2), &block.to_bytes()?)
        .await?;

    let violations = c.validate_chain().await?;
    assert_eq!(starledger::invalid_heights(&violations), vec![2]);
    assert!(!c.ledger().validate_block(2).await?);
    Ok(())
}
