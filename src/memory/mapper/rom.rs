use log::debug;

/// Plain 32 KiB cartridge without a bank controller.
#[derive(Clone, Debug, Default)]
pub struct Rom {}

impl Rom {
    pub fn new() -> Rom {
        Rom {}
    }

    #[inline]
    pub fn handle_write(&mut self, addr: u16, data: u8) {
        // Nothing to switch. Games still poke these addresses now and then.
        debug!("ROM: Ignoring write of ${:02x} to ${:04x}", data, addr);
    }
}
