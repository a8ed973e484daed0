//! Open-loop door motor on two driver pins.

use doorlock_core::config::MotorPolarity;
use doorlock_hardware::timer::DelayTimer;
use doorlock_hardware::{OutputPin, PinState, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Direction the motor is driven in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorDrive {
    Forward,
    Reverse,
    Stopped,
}

/// Door motor behind an H-bridge with two inputs.
///
/// Forward drives one input high and the other low, reverse swaps them,
/// stop pulls both low. [`MotorPolarity`] selects which input is high
/// for the opening stroke.
#[derive(Debug)]
pub struct DoorMotor<P> {
    pin_a: P,
    pin_b: P,
    polarity: MotorPolarity,
    drive: MotorDrive,
}

impl<P: OutputPin> DoorMotor<P> {
    pub fn new(pin_a: P, pin_b: P, polarity: MotorPolarity) -> Self {
        Self {
            pin_a,
            pin_b,
            polarity,
            drive: MotorDrive::Stopped,
        }
    }

    /// Current drive direction.
    pub fn drive(&self) -> MotorDrive {
        self.drive
    }

    pub async fn forward(&mut self) -> Result<()> {
        self.set(MotorDrive::Forward).await
    }

    pub async fn reverse(&mut self) -> Result<()> {
        self.set(MotorDrive::Reverse).await
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.set(MotorDrive::Stopped).await
    }

    /// Run the full door cycle: forward for `open`, reverse for `close`,
    /// then de-energize.
    pub async fn cycle(
        &mut self,
        timer: &mut DelayTimer,
        open: Duration,
        close: Duration,
    ) -> Result<()> {
        info!("Door opening");
        self.forward().await?;
        timer.delay(open).await;

        info!("Door closing");
        self.reverse().await?;
        timer.delay(close).await;

        self.stop().await
    }

    async fn set(&mut self, drive: MotorDrive) -> Result<()> {
        let (a, b) = match (drive, self.polarity) {
            (MotorDrive::Stopped, _) => (PinState::Low, PinState::Low),
            (MotorDrive::Forward, MotorPolarity::Normal)
            | (MotorDrive::Reverse, MotorPolarity::Inverted) => (PinState::High, PinState::Low),
            (MotorDrive::Reverse, MotorPolarity::Normal)
            | (MotorDrive::Forward, MotorPolarity::Inverted) => (PinState::Low, PinState::High),
        };

        // Release the active side first so both inputs are never high.
        if a == PinState::Low {
            self.pin_a.set_state(a).await?;
            self.pin_b.set_state(b).await?;
        } else {
            self.pin_b.set_state(b).await?;
            self.pin_a.set_state(a).await?;
        }

        debug!("Motor drive {:?}", drive);
        self.drive = drive;
        Ok(())
    }
}
