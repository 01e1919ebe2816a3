pub mod clock;
pub mod frame;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use frame::Frame;

pub trait Camera {
    fn acquire_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>>;
}

/// Write-only byte channel to the actuator firmware.
pub trait Actuator {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn acquire_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        (**self).acquire_frame()
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(bytes)
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}
