//! Loopback demonstrator for the gateline credential link.
//!
//! Builds a simulated chip with the transmit pair (26 data, 27 clock)
//! jumpered onto the receive pair (17 data, 19 clock), exports all four
//! lines through the registry, spawns the receiver task and runs the
//! interactive transmitter console on stdin. The receiver and the
//! transmitter each keep their own attempt counter, exactly as two separate
//! processes would.
//!
//! The secret is taken from `GATELINE_SECRET` (default `1234`).

use anyhow::{Context, Result};
use gateline_core::{Credential, LineId};
use gateline_gpio::{LineRegistry, SimChip};
use gateline_link::{CredentialReceiver, CredentialTransmitter, SendOutcome};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TX_DATA: LineId = LineId::new(26);
const TX_CLOCK: LineId = LineId::new(27);
const RX_DATA: LineId = LineId::new(17);
const RX_CLOCK: LineId = LineId::new(19);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let secret = match std::env::var("GATELINE_SECRET") {
        Ok(value) => Credential::new(&value).context("GATELINE_SECRET must be 4 digits")?,
        Err(_) => Credential::new("1234")?,
    };

    let mut chip = SimChip::new();
    chip.link(TX_DATA, RX_DATA).context("jumper data pair")?;
    chip.link(TX_CLOCK, RX_CLOCK).context("jumper clock pair")?;

    let registry = LineRegistry::new(chip);
    for line in [RX_DATA, RX_CLOCK, TX_DATA, TX_CLOCK] {
        registry.export(line)?;
        info!(%line, "exported");
    }

    let mut receiver = CredentialReceiver::new(
        registry.open_line(RX_DATA)?,
        registry.open_line(RX_CLOCK)?,
        secret.clone(),
    )?;
    let receiving = tokio::spawn(async move { receiver.run().await });

    let mut transmitter = CredentialTransmitter::new(
        registry.open_line(TX_DATA)?,
        registry.open_line(TX_CLOCK)?,
        secret,
    )?;

    let accepted = console_loop(&mut transmitter).await?;

    if accepted {
        receiving
            .await
            .context("receiver task panicked")?
            .context("receiver failed")?;
        println!("[UNLOCKED] Receiver accepted the credential.");
    } else {
        receiving.abort();
    }

    registry.teardown();
    Ok(())
}

/// Interactive transmitter console. Returns `true` once the secret was sent.
async fn console_loop(transmitter: &mut CredentialTransmitter) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let Some(remaining) = transmitter.lock_remaining() {
            println!("[LOCKED] Please wait {} seconds.", remaining.as_secs().max(1));
            tokio::time::sleep(remaining).await;
            continue;
        }

        print!("Enter a 4-digit credential (or 'exit' to quit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(false);
        };
        let input = line.trim();
        if input == "exit" {
            return Ok(false);
        }
        if input.is_empty() {
            continue;
        }

        match transmitter.send_candidate(input).await? {
            SendOutcome::Accepted => {
                println!("[CORRECT] Credential sent. Exiting.");
                return Ok(true);
            }
            SendOutcome::Denied { fail_count } => {
                println!("[DENIED] Failed attempts: {fail_count}");
            }
            SendOutcome::Locked { .. } => {
                println!(
                    "[LOCKED] {} failed attempts. Wait {} seconds.",
                    transmitter.policy().fail_count(),
                    gateline_core::constants::LOCK_DURATION.as_secs()
                );
            }
            SendOutcome::StillLocked { remaining } => {
                println!("[LOCKED] Please wait {} seconds.", remaining.as_secs().max(1));
            }
        }
    }
}
