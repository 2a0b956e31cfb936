//! End-to-end credential exchange over a jumpered pair of simulated lines.
//!
//! Topology mirrors the bench setup: the transmitter drives lines 26 (data)
//! and 27 (clock), jumpered onto the receiver's lines 17 and 19. All tests
//! run under paused time so the strobe delays and the 30 second lockout
//! window elapse instantly.

use gateline_core::{Credential, Error, LineId, constants::LOCK_DURATION};
use gateline_gpio::{LineHandle, LineRegistry, SimChip};
use gateline_link::{CredentialReceiver, CredentialTransmitter, RxState, SendOutcome};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const TX_DATA: LineId = LineId::new(26);
const TX_CLOCK: LineId = LineId::new(27);
const RX_DATA: LineId = LineId::new(17);
const RX_CLOCK: LineId = LineId::new(19);

fn secret() -> Credential {
    Credential::new("1234").unwrap()
}

/// Build the jumpered registry and export the two line pairs.
fn bench() -> LineRegistry {
    let mut chip = SimChip::new();
    chip.link(TX_DATA, RX_DATA).unwrap();
    chip.link(TX_CLOCK, RX_CLOCK).unwrap();

    let registry = LineRegistry::new(chip);
    for line in [RX_DATA, RX_CLOCK, TX_DATA, TX_CLOCK] {
        registry.export(line).unwrap();
    }
    registry
}

fn open_pair(registry: &LineRegistry, data: LineId, clock: LineId) -> (LineHandle, LineHandle) {
    (
        registry.open_line(data).unwrap(),
        registry.open_line(clock).unwrap(),
    )
}

/// Spawn the receive loop, returning the receiver once it unlocks.
fn spawn_receiver(
    registry: &LineRegistry,
) -> JoinHandle<Result<CredentialReceiver, Error>> {
    let (data, clock) = open_pair(registry, RX_DATA, RX_CLOCK);
    let mut receiver = CredentialReceiver::new(data, clock, secret()).unwrap();
    tokio::spawn(async move {
        receiver.run().await?;
        Ok(receiver)
    })
}

fn transmitter(registry: &LineRegistry) -> CredentialTransmitter {
    let (data, clock) = open_pair(registry, TX_DATA, TX_CLOCK);
    CredentialTransmitter::new(data, clock, secret()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn correct_credential_unlocks_end_to_end() {
    let registry = bench();
    let receiving = spawn_receiver(&registry);
    let mut tx = transmitter(&registry);

    let outcome = tx.send_candidate("1234").await.unwrap();
    assert_eq!(outcome, SendOutcome::Accepted);

    let receiver = timeout(Duration::from_secs(60), receiving)
        .await
        .expect("receiver should unlock")
        .unwrap()
        .unwrap();
    assert_eq!(receiver.state(), RxState::Unlocked);
    assert_eq!(receiver.policy().fail_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn wrong_attempts_are_denied_then_accepted() {
    let registry = bench();
    let receiving = spawn_receiver(&registry);
    let mut tx = transmitter(&registry);

    assert_eq!(
        tx.send_candidate("9999").await.unwrap(),
        SendOutcome::Denied { fail_count: 1 }
    );
    assert_eq!(
        tx.send_candidate("4321").await.unwrap(),
        SendOutcome::Denied { fail_count: 2 }
    );
    assert_eq!(tx.send_candidate("1234").await.unwrap(), SendOutcome::Accepted);

    let receiver = timeout(Duration::from_secs(60), receiving)
        .await
        .expect("receiver should unlock")
        .unwrap()
        .unwrap();
    // The receiver saw the same two bad frames before the good one.
    assert_eq!(receiver.state(), RxState::Unlocked);
    assert_eq!(receiver.policy().fail_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_input_transmits_dummy_and_counts_a_failure() {
    let registry = bench();
    let mut receiving = spawn_receiver(&registry);
    let mut tx = transmitter(&registry);

    let outcome = tx.send_candidate("12a4").await.unwrap();
    assert_eq!(outcome, SendOutcome::Denied { fail_count: 1 });
    assert_eq!(tx.policy().fail_count(), 1);

    // The dummy frame reached the receiver and was denied, not accepted.
    assert!(
        timeout(Duration::from_secs(5), &mut receiving).await.is_err(),
        "a dummy frame must never unlock the receiver"
    );

    assert_eq!(tx.send_candidate("1234").await.unwrap(), SendOutcome::Accepted);
    let receiver = timeout(Duration::from_secs(60), receiving)
        .await
        .expect("receiver should unlock")
        .unwrap()
        .unwrap();
    // One dummy denial, then the reset on accept.
    assert_eq!(receiver.policy().fail_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn deliberate_all_zero_candidate_is_not_charged() {
    let registry = bench();
    let mut tx = transmitter(&registry);

    // "0000" is a valid candidate; it goes out on the wire (a listening
    // receiver would count the mismatch) but the transmitter does not
    // charge it as an attempt.
    let outcome = tx.send_candidate("0000").await.unwrap();
    assert_eq!(outcome, SendOutcome::Denied { fail_count: 0 });
    assert_eq!(tx.policy().fail_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_lock_both_ends() {
    let registry = bench();
    let receiving = spawn_receiver(&registry);
    let mut tx = transmitter(&registry);

    for expected in 1..5u32 {
        assert_eq!(
            tx.send_candidate("0001").await.unwrap(),
            SendOutcome::Denied {
                fail_count: expected
            }
        );
    }
    let fifth = tx.send_candidate("0001").await.unwrap();
    assert!(matches!(fifth, SendOutcome::Locked { .. }));

    // While its window is open the transmitter refuses to drive the lines.
    let refused = tx.send_candidate("1234").await.unwrap();
    assert!(matches!(refused, SendOutcome::StillLocked { .. }));

    // After both windows pass, the exchange completes normally.
    tokio::time::sleep(LOCK_DURATION + Duration::from_secs(1)).await;
    assert_eq!(tx.send_candidate("1234").await.unwrap(), SendOutcome::Accepted);

    let receiver = timeout(Duration::from_secs(60), receiving)
        .await
        .expect("receiver should unlock")
        .unwrap()
        .unwrap();
    assert_eq!(receiver.state(), RxState::Unlocked);
}

#[tokio::test(start_paused = true)]
async fn locked_receiver_drops_bits_until_the_window_passes() {
    let registry = bench();
    let mut receiving = spawn_receiver(&registry);

    // Five bad frames lock the receiver.
    let mut first_tx = transmitter(&registry);
    for _ in 0..5 {
        first_tx.send_candidate("0001").await.unwrap();
    }

    // A fresh transmitter (independent attempt counter, as a separate
    // process would have) sends the correct credential into the window.
    let mut second_tx = transmitter(&registry);
    assert_eq!(
        second_tx.send_candidate("1234").await.unwrap(),
        SendOutcome::Accepted
    );

    // Every bit of that frame fell inside the window and was dropped; the
    // receiver must not have unlocked.
    assert!(
        timeout(Duration::from_secs(5), &mut receiving).await.is_err(),
        "bits inside the lockout window must be dropped"
    );

    // Once the window passes, a new frame resyncs from scratch and unlocks.
    tokio::time::sleep(LOCK_DURATION).await;
    assert_eq!(
        second_tx.send_candidate("1234").await.unwrap(),
        SendOutcome::Accepted
    );

    let receiver = timeout(Duration::from_secs(60), receiving)
        .await
        .expect("receiver should unlock after the window")
        .unwrap()
        .unwrap();
    assert_eq!(receiver.state(), RxState::Unlocked);
}
