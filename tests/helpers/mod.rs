/// Test doubles for the controller, bootloader and application consumer.
use pdm_core::{
    config::ParameterLayout,
    infra::parameters::{MemoryParameterStore, ParameterStore},
    protocol::transport::{
        bitrate::BitTiming,
        can_frame::CanFrame,
        can_id::CanId,
        traits::{
            can_controller::{BootloaderEntry, CanController, Mailbox},
            consumer::CanConsumer,
            transmit::Transmit,
        },
    },
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[allow(dead_code)]
pub const SERIAL: [u8; 4] = [0x00, 0x01, 0xe2, 0x40];

#[allow(dead_code)]
pub type Store = MemoryParameterStore<0x400>;

#[allow(dead_code)]
/// Parameter region of a factory-programmed module with no bitrate stored.
pub fn factory_store() -> Store {
    let layout = ParameterLayout::DEFAULT;
    let mut store = Store::new();
    store.write_bytes(layout.serial, &SERIAL).unwrap();
    store.write_bytes(layout.bootloader_version, &[0x01, 0x15]).unwrap();
    store
}

#[derive(Default)]
#[allow(dead_code)]
/// Everything the controller was asked to do, shared with the test body.
pub struct BusLog {
    pub sent: Vec<(Mailbox, CanFrame)>,
    pub timing: Option<BitTiming>,
    pub rx_enabled: Vec<bool>,
}

#[allow(dead_code)]
impl BusLog {
    /// Frames sent on `id`, payloads only.
    pub fn payloads_on(&self, id: CanId) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter(|(_, frame)| frame.id() == id)
            .map(|(_, frame)| frame.payload().to_vec())
            .collect()
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Controller that accepts every frame immediately and records it.
pub struct MockController {
    pub log: Rc<RefCell<BusLog>>,
}

impl CanController for MockController {
    type Error = ();

    fn try_transmit(&mut self, mailbox: Mailbox, frame: &CanFrame) -> Result<bool, ()> {
        self.log.borrow_mut().sent.push((mailbox, *frame));
        Ok(true)
    }

    fn is_mailbox_idle(&self, _mailbox: Mailbox) -> bool {
        true
    }

    fn set_receive_enabled(&mut self, enabled: bool) {
        self.log.borrow_mut().rx_enabled.push(enabled);
    }

    fn apply_timing(&mut self, timing: BitTiming) {
        self.log.borrow_mut().timing = Some(timing);
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Counts bootloader entry requests instead of restarting.
pub struct MockBootloader {
    pub entries: Rc<Cell<u32>>,
}

impl BootloaderEntry for MockBootloader {
    fn enter_bootloader(&mut self) {
        self.entries.set(self.entries.get() + 1);
    }
}

#[derive(Default)]
#[allow(dead_code)]
/// Application consumer recording frames and idle edges.
pub struct RecordingApp {
    pub frames: Vec<CanFrame>,
    pub idle_edges: Vec<bool>,
}

impl CanConsumer for RecordingApp {
    fn on_frame<T: Transmit>(&mut self, frame: &CanFrame, _tx: &mut T) {
        self.frames.push(*frame);
    }

    fn on_idle_change(&mut self, is_idle: bool) {
        self.idle_edges.push(is_idle);
    }
}
