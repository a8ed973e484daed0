//! Integration tests for complete command exchanges.
//!
//! Each test drives both ends of the link concurrently and checks the
//! exact byte sequence each node put on the line.

mod common;

use doorlock_protocol::{HANDSHAKE_TOKEN, Opcode, ProtocolError};

const T: u8 = HANDSHAKE_TOKEN;

#[tokio::test]
async fn test_check_exchange_bytes() {
    let common::LinkPair {
        mut control,
        mut hmi,
        control_tx,
        hmi_tx,
    } = common::link_pair();

    let hmi_side = async {
        hmi.request(Opcode::CheckCredential).await?;
        hmi.send_payload(&[2, 6, 4, 9, 5]).await?;
        hmi
            .expect_reply(&[Opcode::Match, Opcode::Mismatch], "match or mismatch")
            .await
    };
    let control_side = async {
        let op = control.accept_request().await?;
        let payload = control.recv_payload(op.payload_len()).await?;
        control.send(Opcode::Match).await?;
        Ok::<_, ProtocolError>((op, payload))
    };

    let (reply, request) = tokio::join!(hmi_side, control_side);
    let (op, payload) = request.unwrap();

    assert_eq!(reply.unwrap(), Opcode::Match);
    assert_eq!(op, Opcode::CheckCredential);
    assert_eq!(payload, vec![2, 6, 4, 9, 5]);

    assert_eq!(hmi_tx.sent(), vec![T, 0x02, 2, 6, 4, 9, 5]);
    assert_eq!(control_tx.sent(), vec![T, T, T, T, T, T, 0x03]);
    common::assert_no_overruns(&control_tx, &hmi_tx);
}

#[tokio::test]
async fn test_boot_exchange_bytes() {
    let common::LinkPair {
        mut control,
        mut hmi,
        control_tx,
        hmi_tx,
    } = common::link_pair();

    let hmi_side = async {
        hmi.send_ready().await?;
        hmi
            .expect_reply(
                &[Opcode::CredentialFound, Opcode::CredentialNotFound],
                "found or not-found",
            )
            .await
    };
    let control_side = async {
        control.wait_ready().await?;
        control.send(Opcode::CredentialNotFound).await
    };

    let (reply, sent) = tokio::join!(hmi_side, control_side);
    sent.unwrap();
    assert_eq!(reply.unwrap(), Opcode::CredentialNotFound);

    assert_eq!(hmi_tx.sent(), vec![T]);
    assert_eq!(control_tx.sent(), vec![0x08]);
}

#[tokio::test]
async fn test_open_exchange_has_no_reply() {
    let mut pair = common::link_pair();

    let (sent, accepted) = tokio::join!(
        pair.hmi.request(Opcode::OpenDoor),
        pair.control.accept_request()
    );
    sent.unwrap();

    assert_eq!(accepted.unwrap(), Opcode::OpenDoor);
    assert_eq!(pair.hmi_tx.sent(), vec![T, 0x06]);
    assert_eq!(pair.control_tx.sent(), vec![T]);
}

#[tokio::test]
async fn test_back_to_back_exchanges_stay_in_step() {
    let common::LinkPair {
        mut control,
        mut hmi,
        control_tx,
        hmi_tx,
    } = common::link_pair();

    let hmi_side = async {
        for _ in 0..3 {
            hmi.request(Opcode::SetCredential).await?;
            hmi.send_payload(&[1, 1, 1, 1, 1]).await?;
            hmi
                .expect_reply(&[Opcode::CredentialFound], "found")
                .await?;
        }
        Ok::<_, ProtocolError>(())
    };
    let control_side = async {
        for _ in 0..3 {
            let op = control.accept_request().await?;
            control.recv_payload(op.payload_len()).await?;
            control.send(Opcode::CredentialFound).await?;
        }
        Ok::<_, ProtocolError>(())
    };

    let (a, b) = tokio::join!(hmi_side, control_side);
    a.unwrap();
    b.unwrap();
    common::assert_no_overruns(&control_tx, &hmi_tx);
}

#[tokio::test]
async fn test_peer_drop_surfaces_as_transport_error() {
    let pair = common::link_pair();
    let mut hmi = pair.hmi;
    drop(pair.control);

    assert!(matches!(
        hmi.request(Opcode::OpenDoor).await,
        Err(ProtocolError::Hardware(_))
    ));
}
