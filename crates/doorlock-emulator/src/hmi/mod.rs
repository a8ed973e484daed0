//! HMI node: keypad entry, display prompts and the lockout policy.
//!
//! # States
//!
//! ```text
//! Boot ─┬─► MainMenu ─┬─► EnteringForChange ─┐
//!       │      ▲      ├─► EnteringForOpen ───┼─► AwaitingResult ─┬─► Provisioning ─► MainMenu
//!       │      │      └─► EnteringRoot ──────┼───────────────────┘         (match)
//!       │      │                             │         │  ▲
//!       │      │                             │         │  └── retry (mismatch)
//!       │      ├──────── Locked ◄────────────┼─────────┘      (last attempt)
//!       │      └──────── DoorCycle ◄─────────┘
//!       └─► Provisioning (blank slot)
//!
//! any key wait ──(watchdog)──► ForceRestart ─► Boot
//! ```
//!
//! # Input Watchdog
//!
//! Every key wait outside the main menu arms the [`InputWatchdog`]. If it
//! fires first, the configured [`TimeoutPolicy`] decides: `ForceRestart`
//! ends the session and the node reboots; `ReturnToMenu` abandons the
//! entry. Provisioning for a blank slot always restarts, since there is
//! no menu to return to without a credential.
//!
//! # Lockout
//!
//! Each operation (change, open) counts consecutive mismatches. Reaching
//! `max_attempts` asserts the buzzer for the lockout time, resets the
//! counter and returns to the menu. A match resets the counter.

pub mod messages;

use crate::error::{HmiError, HmiResult};
use crate::state_machine::{NodeState, StateMachine};
use doorlock_core::NodeRole;
use doorlock_core::config::{DeviceConfig, HmiConfig, TimeoutPolicy};
use doorlock_core::constants::CREDENTIAL_LEN;
use doorlock_hardware::timer::{DelayTimer, InputWatchdog};
use doorlock_hardware::{ByteChannel, DisplayDevice, KeypadDevice, KeypadInput, OutputPin};
use doorlock_protocol::{CommandLink, Opcode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// HMI node states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HmiState {
    /// Synchronizing with Control.
    Boot,
    MainMenu,
    EnteringForChange,
    EnteringForOpen,
    EnteringRoot,
    /// Candidate sent, waiting for match/mismatch.
    AwaitingResult,
    /// Collecting and storing a new credential.
    Provisioning,
    /// Mirroring the door cycle on the display.
    DoorCycle,
    /// Buzzer asserted after too many mismatches.
    Locked,
    /// Input watchdog fired; the node reboots.
    ForceRestart,
}

impl fmt::Display for HmiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HmiState::Boot => "Boot",
            HmiState::MainMenu => "MainMenu",
            HmiState::EnteringForChange => "EnteringForChange",
            HmiState::EnteringForOpen => "EnteringForOpen",
            HmiState::EnteringRoot => "EnteringRoot",
            HmiState::AwaitingResult => "AwaitingResult",
            HmiState::Provisioning => "Provisioning",
            HmiState::DoorCycle => "DoorCycle",
            HmiState::Locked => "Locked",
            HmiState::ForceRestart => "ForceRestart",
        };
        write!(f, "{}", name)
    }
}

impl NodeState for HmiState {
    const INITIAL: Self = HmiState::Boot;

    fn can_transition_to(&self, target: &Self) -> bool {
        use HmiState::*;
        matches!(
            (self, target),
            (Boot, MainMenu | Provisioning)
                | (MainMenu, EnteringForChange | EnteringForOpen | EnteringRoot)
                | (
                    EnteringForChange | EnteringForOpen,
                    AwaitingResult | MainMenu | ForceRestart
                )
                | (EnteringRoot, Provisioning | MainMenu | ForceRestart)
                | (
                    AwaitingResult,
                    EnteringForChange | EnteringForOpen | Provisioning | DoorCycle | Locked
                )
                | (Provisioning, MainMenu | ForceRestart)
                | (DoorCycle | Locked, MainMenu)
                | (ForceRestart, Boot)
        )
    }
}

/// Operations that verify the current credential first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ChangeCredential,
    OpenDoor,
}

impl Operation {
    fn entry_state(&self) -> HmiState {
        match self {
            Operation::ChangeCredential => HmiState::EnteringForChange,
            Operation::OpenDoor => HmiState::EnteringForOpen,
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            Operation::ChangeCredential => messages::ENTER_OLD,
            Operation::OpenDoor => messages::ENTER,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ChangeCredential => write!(f, "change credential"),
            Operation::OpenDoor => write!(f, "open door"),
        }
    }
}

/// Consecutive mismatches per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptCounter {
    change: u8,
    open: u8,
}

impl AttemptCounter {
    /// Current count for `op`.
    pub fn get(&self, op: Operation) -> u8 {
        match op {
            Operation::ChangeCredential => self.change,
            Operation::OpenDoor => self.open,
        }
    }

    /// Count one more mismatch for `op` and return the new count.
    pub fn record_mismatch(&mut self, op: Operation) -> u8 {
        let count = self.slot(op);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&mut self, op: Operation) {
        *self.slot(op) = 0;
    }

    fn slot(&mut self, op: Operation) -> &mut u8 {
        match op {
            Operation::ChangeCredential => &mut self.change,
            Operation::OpenDoor => &mut self.open,
        }
    }
}

/// Which path leads into provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProvisionPath {
    /// No credential stored.
    Bootstrap,
    /// Old credential verified.
    Change,
    /// Root credential entered.
    Root,
}

impl fmt::Display for ProvisionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionPath::Bootstrap => write!(f, "bootstrap"),
            ProvisionPath::Change => write!(f, "change"),
            ProvisionPath::Root => write!(f, "root override"),
        }
    }
}

/// Where the session goes after a flow completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Menu,
    Restart,
}

enum Entry {
    Digits([u8; CREDENTIAL_LEN]),
    TimedOut,
}

enum Verdict {
    Matched,
    Locked,
    /// Control holds no credential.
    NoCredential,
    TimedOut,
}

/// The HMI node.
#[derive(Debug)]
pub struct HmiNode<C, K, D, P> {
    link: CommandLink<C>,
    keypad: K,
    display: D,
    buzzer: P,
    timer: DelayTimer,
    watchdog: InputWatchdog,
    config: HmiConfig,
    door_open: Duration,
    door_close: Duration,
    attempts: AttemptCounter,
    machine: StateMachine<HmiState>,
    restarts: u32,
}

impl<C, K, D, P> HmiNode<C, K, D, P>
where
    C: ByteChannel,
    K: KeypadDevice,
    D: DisplayDevice,
    P: OutputPin,
{
    /// Assemble the node from its serial line, keypad, display and buzzer.
    pub fn new(channel: C, keypad: K, display: D, buzzer: P, config: &DeviceConfig) -> Self {
        let hmi = config.hmi.clone();
        Self {
            link: CommandLink::new(channel, NodeRole::Hmi),
            keypad,
            display,
            buzzer,
            timer: DelayTimer::new(config.timer.clone()),
            watchdog: InputWatchdog::new(hmi.timeout_tick(), hmi.timeout_ticks()),
            door_open: config.control.door_open(),
            door_close: config.control.door_close(),
            config: hmi,
            attempts: AttemptCounter::default(),
            machine: StateMachine::new(),
            restarts: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> HmiState {
        *self.machine.current_state()
    }

    /// The node's state machine.
    pub fn machine(&self) -> &StateMachine<HmiState> {
        &self.machine
    }

    /// The node's end of the command link.
    pub fn link(&self) -> &CommandLink<C> {
        &self.link
    }

    /// Consecutive mismatches counted for each operation.
    pub fn attempts(&self) -> AttemptCounter {
        self.attempts
    }

    /// Number of watchdog restarts so far.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Run sessions forever, rebooting after every forced restart.
    pub async fn run(&mut self) -> HmiResult<()> {
        loop {
            self.run_session().await?;
            self.restart()?;
        }
    }

    /// Boot and serve the menu until the watchdog forces a restart.
    ///
    /// Returns with the machine in [`HmiState::ForceRestart`].
    pub async fn run_session(&mut self) -> HmiResult<()> {
        let mut flow = self.boot().await?;
        loop {
            match flow {
                Flow::Menu => {
                    if !self.machine.is_in(HmiState::MainMenu) {
                        self.enter(HmiState::MainMenu)?;
                    }
                    flow = self.menu().await?;
                }
                Flow::Restart => {
                    self.enter(HmiState::ForceRestart)?;
                    warn!("Input watchdog forced a restart");
                    return Ok(());
                }
            }
        }
    }

    /// Come back from `ForceRestart` as if freshly powered.
    fn restart(&mut self) -> HmiResult<()> {
        self.watchdog.disarm();
        self.attempts = AttemptCounter::default();
        self.restarts += 1;
        self.enter(HmiState::Boot)?;
        info!("HMI restarted ({} so far)", self.restarts);
        Ok(())
    }

    async fn boot(&mut self) -> HmiResult<Flow> {
        self.display.clear().await?;
        match self.link.boot_exchange().await? {
            Opcode::CredentialFound => {
                info!("Control reports a stored credential");
                Ok(Flow::Menu)
            }
            _ => {
                warn!("No credential stored, starting provisioning");
                self.provision(ProvisionPath::Bootstrap).await
            }
        }
    }

    async fn menu(&mut self) -> HmiResult<Flow> {
        self.display.clear().await?;
        self.display.write_at(0, 0, messages::MENU_CHANGE).await?;
        self.display.write_at(1, 0, messages::MENU_OPEN).await?;

        match self.keypad.read_input().await? {
            KeypadInput::Plus => self.change_credential().await,
            KeypadInput::Minus => self.open_door().await,
            KeypadInput::Equals => self.root_override().await,
            other => {
                trace!("Ignoring {:?} at main menu", other);
                Ok(Flow::Menu)
            }
        }
    }

    async fn change_credential(&mut self) -> HmiResult<Flow> {
        match self.verify(Operation::ChangeCredential).await? {
            Verdict::Matched => self.provision(ProvisionPath::Change).await,
            Verdict::NoCredential => self.provision(ProvisionPath::Bootstrap).await,
            Verdict::Locked => Ok(Flow::Menu),
            Verdict::TimedOut => Ok(self.on_timeout(false)),
        }
    }

    async fn open_door(&mut self) -> HmiResult<Flow> {
        match self.verify(Operation::OpenDoor).await? {
            Verdict::Matched => {
                self.link.request(Opcode::OpenDoor).await?;
                self.enter(HmiState::DoorCycle)?;

                self.show(messages::DOOR_OPEN).await?;
                self.timer.delay(self.door_open).await;
                self.show(messages::DOOR_CLOSE).await?;
                self.timer.delay(self.door_close).await;
                Ok(Flow::Menu)
            }
            Verdict::NoCredential => self.provision(ProvisionPath::Bootstrap).await,
            Verdict::Locked => Ok(Flow::Menu),
            Verdict::TimedOut => Ok(self.on_timeout(false)),
        }
    }

    async fn root_override(&mut self) -> HmiResult<Flow> {
        self.timer.delay(self.config.root_hold()).await;
        if !self.keypad.is_held(KeypadInput::Equals).await? {
            debug!("Root key released early");
            return Ok(Flow::Menu);
        }

        self.enter(HmiState::EnteringRoot)?;
        self.show(messages::ENTER_ROOT).await?;

        let root = *self.config.root_credential.as_bytes();
        let settle = Duration::from_millis(self.config.key_settle_ms);
        for (position, expected) in root.iter().enumerate() {
            let Some(digit) = self.read_digit().await? else {
                return Ok(self.on_timeout(false));
            };
            self.timer.delay(settle).await;
            self.display.write_at(1, position, messages::DIGIT_ECHO).await?;

            if digit != *expected {
                warn!("Root credential rejected");
                return Ok(Flow::Menu);
            }
        }

        info!("Root override granted");
        self.provision(ProvisionPath::Root).await
    }

    /// Prompt for the current credential until it matches, the operation
    /// locks out, or input times out.
    async fn verify(&mut self, op: Operation) -> HmiResult<Verdict> {
        let settle = Duration::from_millis(self.config.verify_key_settle_ms);

        // Terminates: every pass either returns or raises the counter,
        // and the counter is capped by `max_attempts`.
        loop {
            self.enter(op.entry_state())?;
            self.show(op.prompt()).await?;

            let digits = match self.enter_credential(settle).await? {
                Entry::Digits(digits) => digits,
                Entry::TimedOut => return Ok(Verdict::TimedOut),
            };

            self.enter(HmiState::AwaitingResult)?;
            self.link.request(Opcode::CheckCredential).await?;
            self.link.send_payload(&digits).await?;
            let reply = self
                .link
                .expect_reply(
                    &[Opcode::Match, Opcode::Mismatch, Opcode::CredentialNotFound],
                    "match or mismatch",
                )
                .await?;

            match reply {
                Opcode::Match => {
                    self.attempts.reset(op);
                    info!("Credential accepted for {}", op);
                    return Ok(Verdict::Matched);
                }
                Opcode::CredentialNotFound => {
                    warn!("Control holds no credential");
                    self.attempts.reset(op);
                    return Ok(Verdict::NoCredential);
                }
                _ => {
                    let count = self.attempts.record_mismatch(op);
                    warn!(
                        "Credential rejected for {} ({}/{})",
                        op, count, self.config.max_attempts
                    );
                    if count >= self.config.max_attempts {
                        self.attempts.reset(op);
                        self.lockout().await?;
                        return Ok(Verdict::Locked);
                    }
                }
            }
        }
    }

    async fn lockout(&mut self) -> HmiResult<()> {
        self.enter(HmiState::Locked)?;
        warn!("Too many failed attempts, locked for {:?}", self.config.lockout());

        self.buzzer.set_high().await?;
        self.show(messages::BLOCKED).await?;
        self.timer.delay(self.config.lockout()).await;
        self.buzzer.set_low().await?;

        info!("Lockout over");
        Ok(())
    }

    /// Collect a new credential twice and have Control store it.
    async fn provision(&mut self, path: ProvisionPath) -> HmiResult<Flow> {
        self.enter(HmiState::Provisioning)?;
        let settle = Duration::from_millis(self.config.key_settle_ms);
        let bootstrap = path == ProvisionPath::Bootstrap;

        for round in 1..=self.config.max_provisioning_rounds {
            self.show(messages::ENTER_NEW).await?;
            let first = match self.enter_credential(settle).await? {
                Entry::Digits(digits) => digits,
                Entry::TimedOut => return Ok(self.on_timeout(bootstrap)),
            };

            self.show(messages::REENTER).await?;
            let second = match self.enter_credential(settle).await? {
                Entry::Digits(digits) => digits,
                Entry::TimedOut => return Ok(self.on_timeout(bootstrap)),
            };

            if first != second {
                debug!("Re-entered credential differs (round {})", round);
                self.show(messages::NOT_MATCHED).await?;
                self.timer
                    .delay(Duration::from_secs(self.config.mismatch_notice_secs))
                    .await;
                continue;
            }

            self.show(messages::CONFIRMED).await?;
            self.link.request(Opcode::SetCredential).await?;
            self.link.send_payload(&first).await?;
            let reply = self
                .link
                .expect_reply(
                    &[Opcode::CredentialFound, Opcode::CredentialNotFound],
                    "found or not-found",
                )
                .await?;
            self.timer
                .delay(Duration::from_millis(self.config.confirm_delay_ms))
                .await;

            if reply == Opcode::CredentialFound {
                info!("New credential stored ({})", path);
                return Ok(Flow::Menu);
            }
            warn!("Control could not store the credential (round {})", round);
        }

        warn!(
            "Provisioning abandoned after {} rounds",
            self.config.max_provisioning_rounds
        );
        Ok(if bootstrap { Flow::Restart } else { Flow::Menu })
    }

    fn on_timeout(&self, bootstrap: bool) -> Flow {
        match (self.config.timeout_policy, bootstrap) {
            (TimeoutPolicy::ReturnToMenu, false) => {
                warn!("Input timeout, back to menu");
                Flow::Menu
            }
            _ => {
                warn!("Input timeout after {:?}", self.watchdog.timeout());
                Flow::Restart
            }
        }
    }

    /// Read a full credential, echoing one `*` per digit.
    async fn enter_credential(&mut self, settle: Duration) -> HmiResult<Entry> {
        let mut digits = [0u8; CREDENTIAL_LEN];
        for (position, slot) in digits.iter_mut().enumerate() {
            let Some(digit) = self.read_digit().await? else {
                return Ok(Entry::TimedOut);
            };
            *slot = digit;
            self.timer.delay(settle).await;
            self.display.write_at(1, position, messages::DIGIT_ECHO).await?;
        }
        Ok(Entry::Digits(digits))
    }

    /// Wait for a digit key; `None` if the watchdog fired first.
    async fn read_digit(&mut self) -> HmiResult<Option<u8>> {
        loop {
            self.watchdog.arm();
            let key = tokio::select! {
                biased;
                key = self.keypad.read_input() => Some(key),
                () = self.watchdog.expired() => None,
            };
            self.watchdog.disarm();

            match key {
                None => return Ok(None),
                Some(key) => match key?.as_digit() {
                    Some(digit) => return Ok(Some(digit)),
                    None => trace!("Ignoring non-digit key during entry"),
                },
            }
        }
    }

    async fn show(&mut self, text: &str) -> HmiResult<()> {
        self.display.clear().await?;
        self.display.write_at(0, 0, text).await?;
        Ok(())
    }

    fn enter(&mut self, state: HmiState) -> HmiResult<()> {
        let transition = self.machine.transition_to(state).map_err(HmiError::from)?;
        trace!("HMI {} -> {}", transition.from, transition.to);
        Ok(())
    }
}
