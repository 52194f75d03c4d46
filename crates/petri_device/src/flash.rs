//! Interface to the external device-flashing collaborator.

/// Errors reported by a flashing backend.
#[derive(Debug, thiserror::Error)]
pub enum FlashError {
    /// The external flashing tool failed.
    #[error("flashing tool failed: {0}")]
    Tool(String),

    /// An I/O error occurred while talking to the device.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A backend able to load a bitstream onto a physical device.
///
/// Implementations wrap external tooling (openFPGALoader, vendor cables);
/// the core only hands them finished bitstream bytes and a flag saying
/// whether the bytes are a partial image.
pub trait Flasher {
    /// Loads `bitstream` onto the device.
    ///
    /// `partial` must be true when the bytes were produced by a
    /// partial-reconfiguration emitter, so that the backend skips whole-chip
    /// initialization.
    fn flash(&mut self, bitstream: &[u8], partial: bool) -> Result<(), FlashError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fake backend recording each call for assertions.
    struct RecordingFlasher {
        calls: Vec<(usize, bool)>,
    }

    impl Flasher for RecordingFlasher {
        fn flash(&mut self, bitstream: &[u8], partial: bool) -> Result<(), FlashError> {
            self.calls.push((bitstream.len(), partial));
            Ok(())
        }
    }

    #[test]
    fn trait_is_object_safe() {
        let mut recorder = RecordingFlasher { calls: Vec::new() };
        let flasher: &mut dyn Flasher = &mut recorder;
        flasher.flash(&[0xAA, 0x99, 0x55, 0x66], true).unwrap();
        flasher.flash(&[], false).unwrap();
        assert_eq!(recorder.calls, vec![(4, true), (0, false)]);
    }

    #[test]
    fn tool_error_display() {
        let err = FlashError::Tool("exit status 2".into());
        assert_eq!(format!("{err}"), "flashing tool failed: exit status 2");
    }
}
