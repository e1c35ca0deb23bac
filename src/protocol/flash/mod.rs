//! Maintenance/flash protocol: discovery, selection, parameter access and
//! bootloader entry for a field diagnostic tool.
//!
//! The protocol is a request/response state machine multiplexed over the
//! reserved identifier block. Each inbound frame is matched against two
//! dispatch tables of `(identifier low nibble, minimum length, payload
//! prefix)`; the first match runs to completion. Anything else is traced as a
//! bad message and otherwise ignored. Nothing on the bus ever gets an error
//! frame back except a rejected parameter write.
//!
//! ```text
//!           scan / select(other)            select(own serial)
//!   Idle ◄─────────────────────── Selected ◄──────────────────── Idle
//!                                   │  ▲
//!                       unlock      ▼  │   lock / scan
//!                               Selected + WriteUnlocked
//! ```
pub mod messages;

use crate::config::ParameterLayout;
use crate::error::{invariant_violation, FlashError, ParameterError};
use crate::infra::parameters::{is_complement_pair, ModuleIdentity, ParameterStore};
use crate::protocol::transport::bitrate::BitRate;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::{
    is_maintenance, CanId, COMMAND_ID, PARAM_READ_ID, PARAM_WRITE_ID, RESPONSE_ID, SCAN_ID,
};
use crate::protocol::transport::trace::TraceCode;
use crate::protocol::transport::traits::{
    can_controller::BootloaderEntry, consumer::CanConsumer, transmit::Transmit,
};
use messages::{ReadRequest, WriteRequest};

//==================================================================================DISPATCH
/// Maintenance request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Scan,
    Select,
    EnterProgram,
    ReadParameter,
    WriteEnable,
    WriteDisable,
    WriteParameter,
}

/// One dispatch table entry.
struct Route {
    id_nibble: u8,
    min_len: usize,
    prefix: &'static [u8],
    command: Command,
}

impl Route {
    const fn command(prefix: &'static [u8], min_len: usize, command: Command) -> Self {
        Self {
            id_nibble: COMMAND_ID.low_nibble(),
            min_len,
            prefix,
            command,
        }
    }

    fn matches(&self, frame: &CanFrame) -> bool {
        frame.id().low_nibble() == self.id_nibble
            && frame.dlc() >= self.min_len
            && frame.payload().starts_with(self.prefix)
    }
}

/// Checked on every frame.
static ANY_STATE: [Route; 2] = [
    Route::command(&messages::SCAN, 2, Command::Scan),
    Route::command(&messages::SELECT, 6, Command::Select),
];

/// Checked only while this module is selected.
static SELECTED_ONLY: [Route; 5] = [
    Route::command(&messages::ENTER_PROGRAM, 2, Command::EnterProgram),
    Route::command(&messages::READ_PARAMETER, 5, Command::ReadParameter),
    Route::command(&messages::WRITE_ENABLE, 5, Command::WriteEnable),
    Route::command(&messages::WRITE_DISABLE, 2, Command::WriteDisable),
    Route {
        id_nibble: PARAM_WRITE_ID.low_nibble(),
        min_len: 3,
        prefix: &[],
        command: Command::WriteParameter,
    },
];

/// What [`FlashProtocol::handle`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// A handler ran.
    Handled(Command),
    /// No table entry matched, or the request was malformed. Nothing was sent.
    Ignored,
}

/// Whether a handler accepted the request it was routed.
enum Outcome {
    Done,
    Malformed,
}

//==================================================================================PROTOCOL
/// Maintenance protocol endpoint for this module.
///
/// Owns the selection state; one instance exists per module, constructed at
/// start-up and handed to the CAN listener as its maintenance consumer.
pub struct FlashProtocol<S, B> {
    store: S,
    bootloader: B,
    layout: ParameterLayout,
    identity: ModuleIdentity,
    selected: bool,
    write_unlocked: bool,
}

impl<S: ParameterStore, B: BootloaderEntry> FlashProtocol<S, B> {
    /// Load the module identity and start unselected and locked.
    pub fn new(store: S, bootloader: B, layout: ParameterLayout) -> Result<Self, ParameterError> {
        let identity = ModuleIdentity::load(&store, &layout)?;
        #[cfg(feature = "defmt")]
        defmt::info!("maintenance endpoint ready, serial {:02x}", identity.serial);

        Ok(Self {
            store,
            bootloader,
            layout,
            identity,
            selected: false,
            write_unlocked: false,
        })
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_write_unlocked(&self) -> bool {
        self.write_unlocked
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bootloader(&self) -> &B {
        &self.bootloader
    }

    /// Match `frame` against the dispatch tables and run its handler.
    ///
    /// Rejections are answered (or ignored) on the bus and reported as `Ok`.
    /// Only storage and controller faults are returned.
    pub fn handle<T: Transmit>(
        &mut self,
        frame: &CanFrame,
        tx: &mut T,
    ) -> Result<Dispatch, FlashError<T::Error>> {
        let Some(command) = self.route(frame) else {
            tx.trace(TraceCode::BadMessage);
            return Ok(Dispatch::Ignored);
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("maintenance request {}", command);

        let outcome = match command {
            Command::Scan => self.scan(tx)?,
            Command::Select => self.select(frame, tx)?,
            Command::EnterProgram => self.enter_program(tx)?,
            Command::ReadParameter => self.read_parameter(frame, tx)?,
            Command::WriteEnable => self.write_enable(tx)?,
            Command::WriteDisable => self.write_disable(tx)?,
            Command::WriteParameter => self.write_parameter(frame, tx)?,
        };

        match outcome {
            Outcome::Done => Ok(Dispatch::Handled(command)),
            Outcome::Malformed => {
                tx.trace(TraceCode::BadMessage);
                Ok(Dispatch::Ignored)
            }
        }
    }

    fn route(&self, frame: &CanFrame) -> Option<Command> {
        if !is_maintenance(frame.id()) {
            return None;
        }
        let selected_only: &[Route] = if self.selected { &SELECTED_ONLY } else { &[] };
        ANY_STATE
            .iter()
            .chain(selected_only)
            .find(|route| route.matches(frame))
            .map(|route| route.command)
    }

    //==============================================================================HANDLERS
    /// Report identity; every module drops selection and write access.
    fn scan<T: Transmit>(&mut self, tx: &mut T) -> Result<Outcome, FlashError<T::Error>> {
        tx.trace(TraceCode::Scan);
        self.selected = false;
        self.write_unlocked = false;
        send(tx, SCAN_ID, &messages::scan_response(&self.identity))?;
        Ok(Outcome::Done)
    }

    fn select<T: Transmit>(
        &mut self,
        frame: &CanFrame,
        tx: &mut T,
    ) -> Result<Outcome, FlashError<T::Error>> {
        let Some(target) = messages::select_target(frame.payload()) else {
            return Ok(Outcome::Malformed);
        };

        if target != self.identity.serial {
            // Another module is being addressed.
            #[cfg(feature = "defmt")]
            if self.selected {
                defmt::info!("deselected");
            }
            self.selected = false;
            self.write_unlocked = false;
            return Ok(Outcome::Done);
        }

        tx.trace(TraceCode::Select);
        send(tx, RESPONSE_ID, &messages::select_ack(&self.identity))?;
        #[cfg(feature = "defmt")]
        defmt::info!("selected for maintenance");
        self.selected = true;
        Ok(Outcome::Done)
    }

    /// Announce the restart, wait for it to leave the wire, then restart.
    fn enter_program<T: Transmit>(&mut self, tx: &mut T) -> Result<Outcome, FlashError<T::Error>> {
        tx.trace(TraceCode::EnterProgram);
        let frame = response_frame(RESPONSE_ID, &messages::will_reset(&self.identity));
        tx.send_blocking(&frame)?;

        #[cfg(feature = "defmt")]
        defmt::info!("entering bootloader");
        self.bootloader.enter_bootloader();
        Ok(Outcome::Done)
    }

    fn read_parameter<T: Transmit>(
        &mut self,
        frame: &CanFrame,
        tx: &mut T,
    ) -> Result<Outcome, FlashError<T::Error>> {
        let Some(request) = ReadRequest::parse(frame.payload()) else {
            return Ok(Outcome::Malformed);
        };
        tx.trace(TraceCode::ReadParameter);

        let mut data = [0u8; messages::MAX_READ_LEN as usize];
        let data = &mut data[..request.len as usize];
        match self.store.read_bytes(request.address, data) {
            Ok(()) => {}
            Err(ParameterError::OutOfRange { .. }) => return Ok(Outcome::Malformed),
            Err(err) => return Err(err.into()),
        }

        send(tx, PARAM_READ_ID, data)?;
        Ok(Outcome::Done)
    }

    fn write_enable<T: Transmit>(&mut self, tx: &mut T) -> Result<Outcome, FlashError<T::Error>> {
        tx.trace(TraceCode::WriteEnable);
        self.write_unlocked = true;
        send(tx, RESPONSE_ID, &messages::WRITE_ENABLE_ACK)?;
        Ok(Outcome::Done)
    }

    fn write_disable<T: Transmit>(&mut self, tx: &mut T) -> Result<Outcome, FlashError<T::Error>> {
        tx.trace(TraceCode::WriteDisable);
        self.write_unlocked = false;
        send(tx, RESPONSE_ID, &messages::WRITE_DISABLE_ACK)?;
        Ok(Outcome::Done)
    }

    /// Persist a parameter write if it is unlocked and allowed, then answer
    /// with the success or the generic failure payload.
    fn write_parameter<T: Transmit>(
        &mut self,
        frame: &CanFrame,
        tx: &mut T,
    ) -> Result<Outcome, FlashError<T::Error>> {
        let Some(request) = WriteRequest::parse(frame.payload()) else {
            return Ok(Outcome::Malformed);
        };
        tx.trace(TraceCode::WriteParameter);

        let written = self.write_unlocked && self.try_write(&request);
        let response = if written {
            messages::WRITE_OK
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "parameter write rejected at {=u16:#x} ({} bytes, unlocked: {})",
                request.address,
                request.data.len(),
                self.write_unlocked
            );
            messages::WRITE_FAILED
        };
        send(tx, RESPONSE_ID, &response)?;
        Ok(Outcome::Done)
    }

    /// Apply the write rules. Nothing is stored unless one of them holds.
    fn try_write(&mut self, request: &WriteRequest<'_>) -> bool {
        let stored = if self.is_bitrate_write(request) {
            // Backup copy first, so a power loss leaves one valid pair.
            self.store
                .write_bytes(self.layout.bitrate_secondary, request.data)
                .and_then(|()| self.store.write_bytes(request.address, request.data))
        } else if self
            .layout
            .in_user_range(request.address, request.data.len())
        {
            self.store.write_bytes(request.address, request.data)
        } else {
            return false;
        };

        match stored {
            Ok(()) => true,
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("parameter store failed: {}", _err);
                false
            }
        }
    }

    /// A self-checking `(check, value)` pair for a supported rate, written to
    /// the primary bitrate slot.
    fn is_bitrate_write(&self, request: &WriteRequest<'_>) -> bool {
        match *request.data {
            [check, value] => {
                request.address == self.layout.bitrate_primary
                    && is_complement_pair(check, value)
                    && BitRate::try_from(value).is_ok()
            }
            _ => false,
        }
    }
}

impl<S: ParameterStore, B: BootloaderEntry> CanConsumer for FlashProtocol<S, B> {
    fn on_frame<T: Transmit>(&mut self, frame: &CanFrame, tx: &mut T) {
        if let Err(_err) = self.handle(frame, tx) {
            #[cfg(feature = "defmt")]
            defmt::warn!("maintenance request failed: {}", defmt::Debug2Format(&_err));
        }
    }
}

//==================================================================================HELPERS
fn response_frame(id: CanId, payload: &[u8]) -> CanFrame {
    match CanFrame::new(id, payload) {
        Ok(frame) => frame,
        Err(_) => invariant_violation("maintenance response longer than 8 bytes"),
    }
}

/// Ordered send; responses keep their relative order on the bus.
fn send<T: Transmit>(
    tx: &mut T,
    id: CanId,
    payload: &[u8],
) -> Result<(), FlashError<T::Error>> {
    tx.send_ordered(&response_frame(id, payload))?;
    Ok(())
}
