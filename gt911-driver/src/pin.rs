use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

/// The GT911 INT line.
///
/// During reset the host drives INT to pick the I2C address, afterwards the
/// chip drives it to signal new touch data. Implement this for a HAL pin
/// that can change direction at runtime, or wrap an open-drain output in
/// [`OpenDrainPin`].
pub trait InterruptPin: ErrorType {
    /// Drive the line as an open-drain output.
    fn set_open_drain(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Stop driving the line and listen to the chip.
    fn set_input(&mut self) -> Result<(), Self::Error>;
}

impl<T: InterruptPin + ?Sized> InterruptPin for &mut T {
    fn set_open_drain(&mut self, state: PinState) -> Result<(), Self::Error> {
        T::set_open_drain(self, state)
    }

    fn set_input(&mut self) -> Result<(), Self::Error> {
        T::set_input(self)
    }
}

/// Adapts a pin already configured as open-drain output.
///
/// Driving it high releases the line, which makes it behave as an input
/// pulled up externally.
#[derive(Debug)]
pub struct OpenDrainPin<P>(pub P);

impl<P> OpenDrainPin<P> {
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: ErrorType> ErrorType for OpenDrainPin<P> {
    type Error = P::Error;
}

impl<P: OutputPin> InterruptPin for OpenDrainPin<P> {
    fn set_open_drain(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.0.set_state(state)
    }

    fn set_input(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

impl<P: InputPin> InputPin for OpenDrainPin<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }
}

/// An INT line wired to a plain input.
///
/// It is never driven. It cannot strap the address either, so with a reset
/// line [`Config::int_high`](crate::Config::int_high) has to match the
/// board's pull on INT.
#[derive(Debug)]
pub struct InputOnlyPin<P>(pub P);

impl<P> InputOnlyPin<P> {
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: ErrorType> ErrorType for InputOnlyPin<P> {
    type Error = P::Error;
}

impl<P: InputPin> InterruptPin for InputOnlyPin<P> {
    fn set_open_drain(&mut self, _state: PinState) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_input(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<P: InputPin> InputPin for InputOnlyPin<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn open_drain_release_drives_high() {
        let mut pin = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::get(State::Low),
        ]);
        let mut line = OpenDrainPin(&mut pin);

        line.set_open_drain(PinState::Low).unwrap();
        line.set_input().unwrap();
        assert!(line.is_low().unwrap());

        pin.done();
    }

    #[test]
    fn input_only_never_touches_output() {
        let mut pin = PinMock::new(&[Transaction::get(State::High)]);
        let mut line = InputOnlyPin(&mut pin);

        line.set_open_drain(PinState::Low).unwrap();
        line.set_input().unwrap();
        assert!(line.is_high().unwrap());

        pin.done();
    }
}
