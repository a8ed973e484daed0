//! Control node: owns the credential slot and the door motor.
//!
//! # States
//!
//! ```text
//! Idle ─► BootstrapCheck ─┬─► AwaitingCommand ◄──┬── Verifying
//!              ▲          │        │  │  │       ├── Provisioning
//!              └──────────┼────────┘  │  │       └── Actuating
//!                         │           └──┴──────────►  (one per request)
//!                         └─► Provisioning (forced)
//! ```
//!
//! After boot the node answers one request at a time. A blank slot forces
//! `Provisioning`: until a credential is committed, only set-credential is
//! served and everything else is answered with credential-not-found (or
//! dropped, for requests that carry no reply).
//!
//! # Failure Policy
//!
//! - A bus error while verifying is answered with mismatch.
//! - Provisioning commits only after a clean read-back. On any failure the
//!   previous slot contents are written back and the HMI is told
//!   credential-not-found. The old credential stays valid; a blank slot
//!   stays blank and provisioning remains forced.
//! - If the previous contents cannot be put back the node stops.
//! - A bus error while reporting slot status stops the node.

pub mod motor;

pub use motor::{DoorMotor, MotorDrive};

use crate::error::{ControlError, ControlResult};
use crate::state_machine::{NodeState, StateMachine};
use doorlock_core::config::{ControlConfig, DeviceConfig};
use doorlock_core::constants::CREDENTIAL_LEN;
use doorlock_core::{Credential, NodeRole};
use doorlock_hardware::timer::DelayTimer;
use doorlock_hardware::{ByteChannel, OutputPin, TwoWireBus};
use doorlock_protocol::{CommandLink, Opcode, ProtocolError};
use doorlock_storage::{CredentialSlot, Verification};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, trace, warn};

/// Control node states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    /// Powered, not yet synchronized with the HMI.
    Idle,

    /// Reading the slot to report whether a credential is stored.
    BootstrapCheck,

    /// Waiting for the next request.
    AwaitingCommand,

    /// Comparing a candidate with the stored credential.
    Verifying,

    /// Storing a new credential. Between requests this state means no
    /// credential is stored and only set-credential is served.
    Provisioning,

    /// Running the door cycle.
    Actuating,
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlState::Idle => "Idle",
            ControlState::BootstrapCheck => "BootstrapCheck",
            ControlState::AwaitingCommand => "AwaitingCommand",
            ControlState::Verifying => "Verifying",
            ControlState::Provisioning => "Provisioning",
            ControlState::Actuating => "Actuating",
        };
        write!(f, "{}", name)
    }
}

impl NodeState for ControlState {
    const INITIAL: Self = ControlState::Idle;

    /// ```
    /// use doorlock_emulator::{ControlState, NodeState};
    ///
    /// assert!(ControlState::BootstrapCheck.can_transition_to(&ControlState::Provisioning));
    /// assert!(!ControlState::Provisioning.can_transition_to(&ControlState::Actuating));
    /// ```
    fn can_transition_to(&self, target: &Self) -> bool {
        use ControlState::*;
        matches!(
            (self, target),
            (Idle, BootstrapCheck)
                | (BootstrapCheck, AwaitingCommand | Provisioning)
                | (
                    AwaitingCommand,
                    Verifying | Provisioning | Actuating | BootstrapCheck
                )
                | (Verifying, AwaitingCommand)
                | (Provisioning, AwaitingCommand)
                | (Actuating, AwaitingCommand)
        )
    }
}

/// Outcome of one handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Slot status reported in answer to a status query.
    StatusReported { present: bool },

    /// Candidate compared; `matched` is what was replied.
    Verified { matched: bool },

    /// New credential received; `committed` is what was replied.
    Provisioned { committed: bool },

    /// Door cycle completed.
    DoorCycled,

    /// Request refused because no credential is stored.
    Rejected(Opcode),

    /// Reply opcode received where a request was expected.
    Ignored(Opcode),

    /// Request byte that is not an opcode.
    Unknown(u8),
}

/// What a set-credential request did to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    /// New credential written and read back.
    Stored,
    /// Write failed; previous contents written back.
    Restored,
    /// Nothing was written.
    Untouched,
}

/// The Control node.
#[derive(Debug)]
pub struct ControlNode<C, B, P> {
    link: CommandLink<C>,
    slot: CredentialSlot<B>,
    motor: DoorMotor<P>,
    timer: DelayTimer,
    config: ControlConfig,
    machine: StateMachine<ControlState>,
}

impl<C: ByteChannel, B: TwoWireBus, P: OutputPin> ControlNode<C, B, P> {
    /// Assemble the node from its serial line, store bus and motor pins.
    ///
    /// The bus controller is programmed for the configured clock profile.
    pub fn new(channel: C, mut bus: B, motor_a: P, motor_b: P, config: &DeviceConfig) -> Self {
        let bit_rate = config.bus.clock.bit_rate_register(config.timer.cpu_hz);
        bus.set_bit_rate(bit_rate);
        debug!(
            "Two-wire bus at {} Hz (bit rate register {})",
            config.bus.clock.hz(),
            bit_rate
        );

        Self {
            link: CommandLink::new(channel, NodeRole::Control),
            slot: CredentialSlot::with_config(bus, &config.bus),
            motor: DoorMotor::new(motor_a, motor_b, config.control.motor_polarity),
            timer: DelayTimer::new(config.timer.clone()),
            config: config.control.clone(),
            machine: StateMachine::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ControlState {
        *self.machine.current_state()
    }

    /// The node's state machine.
    pub fn machine(&self) -> &StateMachine<ControlState> {
        &self.machine
    }

    /// The node's end of the command link.
    pub fn link(&self) -> &CommandLink<C> {
        &self.link
    }

    /// Access the credential slot.
    pub fn slot_mut(&mut self) -> &mut CredentialSlot<B> {
        &mut self.slot
    }

    /// The door motor.
    pub fn motor(&self) -> &DoorMotor<P> {
        &self.motor
    }

    /// Check whether only set-credential is being served.
    pub fn is_provisioning_forced(&self) -> bool {
        self.machine.is_in(ControlState::Provisioning)
    }

    /// Boot, then serve requests until the link fails.
    pub async fn run(&mut self) -> ControlResult<()> {
        self.boot().await?;
        loop {
            let event = self.handle_request().await?;
            debug!("Control handled request: {:?}", event);
        }
    }

    /// Wait for the HMI's boot token and report the slot status.
    ///
    /// Returns whether a credential is stored.
    pub async fn boot(&mut self) -> ControlResult<bool> {
        self.enter(ControlState::BootstrapCheck)?;
        self.link.wait_ready().await?;
        self.report_status().await
    }

    /// Accept one request and serve it.
    pub async fn handle_request(&mut self) -> ControlResult<ControlEvent> {
        let opcode = match self.link.accept_request().await {
            Ok(opcode) => opcode,
            Err(ProtocolError::UnknownOpcode { byte }) => {
                warn!("Ignoring unknown request byte 0x{:02X}", byte);
                return Ok(ControlEvent::Unknown(byte));
            }
            Err(e) => return Err(e.into()),
        };

        if self.is_provisioning_forced() {
            return self.handle_forced(opcode).await;
        }

        match opcode {
            Opcode::CheckCredential => self.verify().await,
            Opcode::SetCredential => {
                self.enter(ControlState::Provisioning)?;
                self.provision(false).await
            }
            Opcode::OpenDoor => self.actuate().await,
            Opcode::CredentialFound => {
                self.enter(ControlState::BootstrapCheck)?;
                let present = self.report_status().await?;
                Ok(ControlEvent::StatusReported { present })
            }
            other => {
                warn!("Ignoring {} received as a request", other);
                Ok(ControlEvent::Ignored(other))
            }
        }
    }

    async fn handle_forced(&mut self, opcode: Opcode) -> ControlResult<ControlEvent> {
        match opcode {
            Opcode::SetCredential => self.provision(true).await,
            Opcode::CheckCredential => {
                // Drain the candidate so the HMI reaches its reply read.
                self.link.recv_payload(CREDENTIAL_LEN).await?;
                self.reject(opcode).await
            }
            Opcode::CredentialFound => self.reject(opcode).await,
            Opcode::OpenDoor => {
                warn!("{} refused: no credential stored", opcode);
                Ok(ControlEvent::Rejected(opcode))
            }
            other => {
                warn!("Ignoring {} received as a request", other);
                Ok(ControlEvent::Ignored(other))
            }
        }
    }

    async fn reject(&mut self, opcode: Opcode) -> ControlResult<ControlEvent> {
        warn!("{} refused: no credential stored", opcode);
        self.link.send(Opcode::CredentialNotFound).await?;
        Ok(ControlEvent::Rejected(opcode))
    }

    async fn report_status(&mut self) -> ControlResult<bool> {
        let present = self.slot.has_credential().await?;

        if present {
            self.link.send(Opcode::CredentialFound).await?;
            info!("Credential present");
            self.enter(ControlState::AwaitingCommand)?;
        } else {
            self.link.send(Opcode::CredentialNotFound).await?;
            warn!("No credential stored, provisioning forced");
            self.enter(ControlState::Provisioning)?;
        }
        Ok(present)
    }

    async fn verify(&mut self) -> ControlResult<ControlEvent> {
        self.enter(ControlState::Verifying)?;
        let candidate = self.link.recv_payload(CREDENTIAL_LEN).await?;

        let matched = match self.slot.verify(&candidate).await {
            Ok(Verification::Match) => true,
            Ok(Verification::Mismatch { .. }) => false,
            Err(e) => {
                warn!("Verification aborted: {}", e);
                false
            }
        };

        let reply = if matched {
            Opcode::Match
        } else {
            Opcode::Mismatch
        };
        self.link.send(reply).await?;
        info!("Credential check: {}", if matched { "match" } else { "mismatch" });

        self.enter(ControlState::AwaitingCommand)?;
        Ok(ControlEvent::Verified { matched })
    }

    /// Receive and commit a new credential. The machine is already in
    /// `Provisioning`.
    async fn provision(&mut self, forced: bool) -> ControlResult<ControlEvent> {
        let payload = self.link.recv_payload(CREDENTIAL_LEN).await?;

        let outcome = match Credential::from_slice(&payload) {
            Ok(credential) => self.commit(&credential).await,
            Err(e) => {
                warn!("Rejected credential payload: {}", e);
                Ok(Commit::Untouched)
            }
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.link.send(Opcode::CredentialNotFound).await?;
                error!("Credential slot contents lost: {}", e);
                return Err(e);
            }
        };

        if outcome == Commit::Stored {
            self.link.send(Opcode::CredentialFound).await?;
            self.enter(ControlState::AwaitingCommand)?;
            return Ok(ControlEvent::Provisioned { committed: true });
        }

        self.link.send(Opcode::CredentialNotFound).await?;
        if forced {
            warn!("Credential not stored, provisioning still forced");
        } else {
            warn!("Credential not stored, previous credential kept");
            self.enter(ControlState::AwaitingCommand)?;
        }
        Ok(ControlEvent::Provisioned { committed: false })
    }

    /// Store `credential`, putting the previous cells back if it does not
    /// stick.
    async fn commit(&mut self, credential: &Credential) -> ControlResult<Commit> {
        let settle = self.config.write_settle();

        let previous = match self.slot.snapshot().await {
            Ok(cells) => cells,
            Err(e) => {
                warn!("Slot snapshot failed, nothing written: {}", e);
                return Ok(Commit::Untouched);
            }
        };

        match self.slot.provision(credential, &mut self.timer, settle).await {
            Ok(()) => return Ok(Commit::Stored),
            Err(e) => warn!("Provisioning failed: {}", e),
        }

        self.slot.restore(&previous, &mut self.timer, settle).await?;
        Ok(Commit::Restored)
    }

    async fn actuate(&mut self) -> ControlResult<ControlEvent> {
        self.enter(ControlState::Actuating)?;
        self.motor
            .cycle(
                &mut self.timer,
                self.config.door_open(),
                self.config.door_close(),
            )
            .await?;
        self.enter(ControlState::AwaitingCommand)?;
        Ok(ControlEvent::DoorCycled)
    }

    fn enter(&mut self, state: ControlState) -> ControlResult<()> {
        let transition = self
            .machine
            .transition_to(state)
            .map_err(ControlError::from)?;
        trace!("Control {} -> {}", transition.from, transition.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_core::config::BusClock;
    use doorlock_hardware::BusPhase;
    use doorlock_hardware::mock::{
        MockEeprom, MockEepromHandle, MockPin, MockPinHandle, MockSerialLink, MockSerialPort,
    };
    use rstest::rstest;
    use std::time::Duration;

    struct Rig {
        node: ControlNode<MockSerialPort, MockEeprom, MockPin>,
        hmi: CommandLink<MockSerialPort>,
        eeprom: MockEepromHandle,
        motor_a: MockPinHandle,
        motor_b: MockPinHandle,
    }

    fn rig(stored: Option<[u8; 5]>) -> Rig {
        let (control_port, hmi_port) = MockSerialLink::pair();
        let (bus, eeprom) = MockEeprom::new();
        let (a, motor_a) = MockPin::new("motor a");
        let (b, motor_b) = MockPin::new("motor b");
        if let Some(digits) = stored {
            eeprom.load(0x0100, &digits);
        }
        Rig {
            node: ControlNode::new(control_port, bus, a, b, &DeviceConfig::default()),
            hmi: CommandLink::new(hmi_port, NodeRole::Hmi),
            eeprom,
            motor_a,
            motor_b,
        }
    }

    async fn booted(stored: Option<[u8; 5]>) -> Rig {
        let mut rig = rig(stored);
        let (present, status) = tokio::join!(rig.node.boot(), rig.hmi.boot_exchange());
        assert_eq!(present.unwrap(), stored.is_some());
        assert_eq!(
            status.unwrap(),
            if stored.is_some() {
                Opcode::CredentialFound
            } else {
                Opcode::CredentialNotFound
            }
        );
        rig
    }

    async fn check(rig: &mut Rig, digits: [u8; 5]) -> (ControlEvent, Opcode) {
        let Rig { node, hmi, .. } = rig;
        let hmi_side = async {
            hmi.request(Opcode::CheckCredential).await?;
            hmi.send_payload(&digits).await?;
            hmi.recv_opcode().await
        };
        let (event, reply) = tokio::join!(node.handle_request(), hmi_side);
        (event.unwrap(), reply.unwrap())
    }

    async fn set(rig: &mut Rig, digits: [u8; 5]) -> (ControlEvent, Opcode) {
        let Rig { node, hmi, .. } = rig;
        let hmi_side = async {
            hmi.request(Opcode::SetCredential).await?;
            hmi.send_payload(&digits).await?;
            hmi.recv_opcode().await
        };
        let (event, reply) = tokio::join!(node.handle_request(), hmi_side);
        (event.unwrap(), reply.unwrap())
    }

    #[rstest]
    #[case(BusClock::Fast400k, 2)]
    #[case(BusClock::Standard100k, 32)]
    fn test_bus_clock_programmed_on_construction(
        #[case] clock: BusClock,
        #[case] register: u8,
    ) {
        let mut config = DeviceConfig::default();
        config.bus.clock = clock;
        let (port, _peer) = MockSerialLink::pair();
        let (bus, eeprom) = MockEeprom::new();
        let (a, _) = MockPin::new("motor a");
        let (b, _) = MockPin::new("motor b");

        let _node = ControlNode::new(port, bus, a, b, &config);

        assert_eq!(eeprom.bit_rate(), Some(register));
    }

    #[tokio::test]
    async fn test_boot_with_credential() {
        let rig = booted(Some([2, 6, 4, 9, 5])).await;
        assert_eq!(rig.node.state(), ControlState::AwaitingCommand);
        assert!(!rig.node.is_provisioning_forced());
    }

    #[tokio::test]
    async fn test_boot_blank_slot_forces_provisioning() {
        let rig = booted(None).await;
        assert_eq!(rig.node.state(), ControlState::Provisioning);
        assert_eq!(rig.eeprom.read_log().len(), 5);
    }

    #[tokio::test]
    async fn test_boot_one_written_byte_counts() {
        let mut rig = rig(None);
        rig.eeprom.load(0x0104, &[0]);

        let (present, _) = tokio::join!(rig.node.boot(), rig.hmi.boot_exchange());

        assert!(present.unwrap());
    }

    #[tokio::test]
    async fn test_check_match_and_mismatch() {
        let mut rig = booted(Some([2, 6, 4, 9, 5])).await;

        let (event, reply) = check(&mut rig, [2, 6, 4, 9, 5]).await;
        assert_eq!(event, ControlEvent::Verified { matched: true });
        assert_eq!(reply, Opcode::Match);

        rig.eeprom.clear_logs();
        let (event, reply) = check(&mut rig, [2, 0, 4, 9, 5]).await;
        assert_eq!(event, ControlEvent::Verified { matched: false });
        assert_eq!(reply, Opcode::Mismatch);
        assert_eq!(rig.eeprom.read_log(), vec![0x0100, 0x0101]);
        assert_eq!(rig.node.state(), ControlState::AwaitingCommand);
    }

    #[tokio::test]
    async fn test_check_bus_fault_replies_mismatch() {
        let mut rig = booted(Some([1, 1, 1, 1, 1])).await;
        rig.eeprom.fail_on(BusPhase::SelectRead, 0);

        let (event, reply) = check(&mut rig, [1, 1, 1, 1, 1]).await;

        assert_eq!(event, ControlEvent::Verified { matched: false });
        assert_eq!(reply, Opcode::Mismatch);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_provisioning_commits() {
        let mut rig = booted(None).await;

        let (event, reply) = set(&mut rig, [2, 6, 4, 9, 5]).await;

        assert_eq!(event, ControlEvent::Provisioned { committed: true });
        assert_eq!(reply, Opcode::CredentialFound);
        assert_eq!(rig.eeprom.dump(0x0100, 5), vec![2, 6, 4, 9, 5]);
        assert_eq!(rig.node.state(), ControlState::AwaitingCommand);
    }

    #[tokio::test]
    async fn test_forced_provisioning_rejects_check() {
        let mut rig = booted(None).await;

        let (event, reply) = check(&mut rig, [1, 2, 3, 4, 5]).await;

        assert_eq!(event, ControlEvent::Rejected(Opcode::CheckCredential));
        assert_eq!(reply, Opcode::CredentialNotFound);
        assert!(rig.node.is_provisioning_forced());
    }

    #[tokio::test]
    async fn test_forced_provisioning_refuses_open() {
        let mut rig = booted(None).await;

        let (event, sent) = tokio::join!(
            rig.node.handle_request(),
            rig.hmi.request(Opcode::OpenDoor)
        );
        sent.unwrap();

        assert_eq!(event.unwrap(), ControlEvent::Rejected(Opcode::OpenDoor));
        assert!(rig.motor_a.transitions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_change_keeps_old_credential() {
        let mut rig = booted(Some([9, 9, 9, 9, 9])).await;
        rig.eeprom.fail_on(BusPhase::WriteData, 2);

        let (event, reply) = set(&mut rig, [1, 2, 3, 4, 5]).await;

        assert_eq!(event, ControlEvent::Provisioned { committed: false });
        assert_eq!(reply, Opcode::CredentialNotFound);
        assert_eq!(rig.node.state(), ControlState::AwaitingCommand);
        assert!(!rig.node.is_provisioning_forced());
        assert_eq!(rig.eeprom.dump(0x0100, 5), vec![9; 5]);

        let (event, reply) = check(&mut rig, [9, 9, 9, 9, 9]).await;
        assert_eq!(event, ControlEvent::Verified { matched: true });
        assert_eq!(reply, Opcode::Match);

        let (event, reply) = set(&mut rig, [1, 2, 3, 4, 5]).await;
        assert_eq!(event, ControlEvent::Provisioned { committed: true });
        assert_eq!(reply, Opcode::CredentialFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_first_provisioning_stays_forced() {
        let mut rig = booted(None).await;
        rig.eeprom.fail_on(BusPhase::WriteData, 1);

        let (event, reply) = set(&mut rig, [1, 2, 3, 4, 5]).await;

        assert_eq!(event, ControlEvent::Provisioned { committed: false });
        assert_eq!(reply, Opcode::CredentialNotFound);
        assert!(rig.node.is_provisioning_forced());
        assert_eq!(rig.eeprom.dump(0x0100, 5), vec![0xFF; 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_slot_contents_stop_the_node() {
        let mut rig = booted(Some([9, 9, 9, 9, 9])).await;
        rig.eeprom.set_write_protect(true);
        // Provision read-back fails on the first cell; the restore read
        // that follows hits the injected fault.
        rig.eeprom.fail_on(BusPhase::SelectRead, 6);

        let Rig { node, hmi, .. } = &mut rig;
        let hmi_side = async {
            hmi.request(Opcode::SetCredential).await?;
            hmi.send_payload(&[1, 2, 3, 4, 5]).await?;
            hmi.recv_opcode().await
        };
        let (event, reply) = tokio::join!(node.handle_request(), hmi_side);

        assert!(matches!(event, Err(ControlError::Storage(_))));
        assert_eq!(reply.unwrap(), Opcode::CredentialNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_protected_store_is_not_committed() {
        let mut rig = booted(None).await;
        rig.eeprom.set_write_protect(true);

        let (event, reply) = set(&mut rig, [1, 2, 3, 4, 5]).await;

        assert_eq!(event, ControlEvent::Provisioned { committed: false });
        assert_eq!(reply, Opcode::CredentialNotFound);
        assert!(rig.node.is_provisioning_forced());
    }

    #[tokio::test]
    async fn test_status_query_after_boot() {
        let mut rig = booted(Some([3, 3, 3, 3, 3])).await;

        let (event, status) = tokio::join!(rig.node.handle_request(), rig.hmi.boot_exchange());

        assert_eq!(event.unwrap(), ControlEvent::StatusReported { present: true });
        assert_eq!(status.unwrap(), Opcode::CredentialFound);
        assert_eq!(rig.node.state(), ControlState::AwaitingCommand);
    }

    #[tokio::test]
    async fn test_status_query_while_forced() {
        let mut rig = booted(None).await;

        let (event, status) = tokio::join!(rig.node.handle_request(), rig.hmi.boot_exchange());

        assert_eq!(event.unwrap(), ControlEvent::Rejected(Opcode::CredentialFound));
        assert_eq!(status.unwrap(), Opcode::CredentialNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_door_runs_motor_cycle() {
        let mut rig = booted(Some([2, 6, 4, 9, 5])).await;

        let (event, sent) = tokio::join!(
            rig.node.handle_request(),
            rig.hmi.request(Opcode::OpenDoor)
        );
        sent.unwrap();

        assert_eq!(event.unwrap(), ControlEvent::DoorCycled);
        assert_eq!(rig.motor_a.high_periods(), vec![Duration::from_secs(10)]);
        assert_eq!(rig.motor_b.high_periods(), vec![Duration::from_secs(10)]);
        assert_eq!(rig.node.motor().drive(), MotorDrive::Stopped);
        assert_eq!(rig.node.machine().visits(ControlState::Actuating), 1);
    }

    #[tokio::test]
    async fn test_unknown_request_byte_ignored() {
        let Rig { mut node, mut hmi, .. } = booted(Some([2, 6, 4, 9, 5])).await;

        let hmi_side = async {
            hmi.send_ready_and_wait_ack().await?;
            hmi.channel_mut().send_byte(0x42).await?;
            Ok::<_, ProtocolError>(())
        };
        let (event, sent) = tokio::join!(node.handle_request(), hmi_side);
        sent.unwrap();

        assert_eq!(event.unwrap(), ControlEvent::Unknown(0x42));
        assert_eq!(node.state(), ControlState::AwaitingCommand);
    }

    #[rstest]
    #[case(ControlState::Idle, ControlState::BootstrapCheck, true)]
    #[case(ControlState::BootstrapCheck, ControlState::Provisioning, true)]
    #[case(ControlState::AwaitingCommand, ControlState::Actuating, true)]
    #[case(ControlState::AwaitingCommand, ControlState::BootstrapCheck, true)]
    #[case(ControlState::Provisioning, ControlState::AwaitingCommand, true)]
    #[case(ControlState::Idle, ControlState::AwaitingCommand, false)]
    #[case(ControlState::Verifying, ControlState::Provisioning, false)]
    #[case(ControlState::Provisioning, ControlState::Actuating, false)]
    #[case(ControlState::Actuating, ControlState::Idle, false)]
    fn test_transition_table(
        #[case] from: ControlState,
        #[case] to: ControlState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(&to), allowed);
    }
}
