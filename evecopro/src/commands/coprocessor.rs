use super::command_word::{command_words_for_bytes, round_up_4, CommandWord};
use super::options;
use super::waiter::{PollingWaiter, Waiter, WaiterError};
use crate::clock::Clock;
use crate::config::Config;
use crate::display_list::DLCmd;
use crate::error::Error;
use crate::graphics::{WidgetPos, WidgetRect, RGB};
use crate::interface::Interface;
use crate::low_level::{LowLevel, Register, CHIP_ID};
use crate::models::{Model, CMD_RING_LEN};
use crate::strings::Message;

/// The result type for coprocessor operations, where the error type is always
/// [`Error`](Error).
pub type Result<T, M, I, W> =
    core::result::Result<T, Error<<I as Interface>::Error, <W as Waiter<M, I>>::Error>>;

pub(crate) const CMD_DLSTART: u32 = 0xFFFFFF00;
pub(crate) const CMD_SWAP: u32 = 0xFFFFFF01;
pub(crate) const CMD_BGCOLOR: u32 = 0xFFFFFF09;
pub(crate) const CMD_FGCOLOR: u32 = 0xFFFFFF0A;
pub(crate) const CMD_TEXT: u32 = 0xFFFFFF0C;
pub(crate) const CMD_BUTTON: u32 = 0xFFFFFF0D;
pub(crate) const CMD_KEYS: u32 = 0xFFFFFF0E;
pub(crate) const CMD_SETFONT: u32 = 0xFFFFFF2B;
pub(crate) const CMD_COLDSTART: u32 = 0xFFFFFF32;
pub(crate) const CMD_GRADCOLOR: u32 = 0xFFFFFF34;
pub(crate) const CMD_SETFONT2: u32 = 0xFFFFFF3B;
pub(crate) const CMD_APILEVEL: u32 = 0xFFFFFF63;

// REG_CMD_READ holds this value while the coprocessor is faulted.
const FAULT_READ_POINTER: u16 = 0xfff;

/// An interface to the command ring buffer for the EVE chip's coprocessor
/// component.
///
/// This object encapsulates the handling of the ring buffer: it tracks the
/// host's write cursor, waits for the coprocessor to free space before each
/// command, and recovers from a desynchronized ring by resetting the
/// coprocessor.
pub struct Coprocessor<M: Model, I: Interface, W: Waiter<M, I>> {
    ll: LowLevel<M, I>,
    wait: W,

    // `known_space` tracks the amount of available buffer space (in bytes) that
    // we most recently knew about. The coprocessor asynchronously consumes
    // command words from the ring buffer, so there might actually be _more_
    // space than reported here, but there should always be at least this much
    // space because we keep decreasing this as we write more data into the
    // buffer.
    //
    // Once this value gets too low to append any more commands, we'll use
    // the waiter to wait for more space and then update `known_space` with
    // the new free space determined by the waiter.
    known_space: u16,

    // Byte offset in the ring where the next word goes. Always a multiple
    // of four and less than CMD_RING_LEN.
    cursor: u16,

    // The cursor value the chip was last told about. Only meaningful for
    // models where the host publishes its cursor.
    published: u16,

    // Set only once the chip has reported an empty ring, and cleared by
    // every write.
    ready: bool,

    api_level: Option<u32>,
    resetting: bool,
}

/// The methods which submit new commands into the coprocessor ringbuffer.
///
/// These will block using the waiter if they run out of coprocessor buffer
/// space, but they will not wait if there's enough buffer space available to
/// write into.
///
/// Although these commands do block for there being sufficient buffer space
/// to write them, they _don't_ wait for the coprocessor to actually execute
/// the instructions, because the goal is for the coprocessor to primarily
/// run concurrently with code on the host processor.
impl<M: Model, I: Interface, W: Waiter<M, I>> Coprocessor<M, I, W> {
    /// Consumes the given interface and waiter, resets the coprocessor into
    /// a known state and returns an interface to it.
    ///
    /// If `api_level` is set, the coprocessor is switched to that API level
    /// after this and every later reset.
    pub fn new(ei: I, wait: W, api_level: Option<u32>) -> Result<Self, M, I, W> {
        let mut ret = Self {
            ll: LowLevel::new(ei),
            wait: wait,
            known_space: 0,
            cursor: 0,
            published: 0,
            ready: false,
            api_level: api_level,
            resetting: false,
        };
        ret.restart()?;
        Ok(ret)
    }

    /// Sends just the coprocessor command to start a new display list, which
    /// waits for the display list memory to become writable before executing
    /// any subsequent commands and resets the pointer for new display list
    /// commands back to the top of display list memory.
    pub fn start_display_list(&mut self) -> Result<(), M, I, W> {
        self.write_command(CMD_DLSTART)
    }

    /// Sends just the coprocessor command to swap in the newly-populated
    /// display list commands.
    pub fn display_list_swap(&mut self) -> Result<(), M, I, W> {
        self.write_command(CMD_SWAP)
    }

    /// Resets the coprocessor's state to the boot-time defaults before
    /// continuing with later commands. For example, this discards the
    /// currently-selected widget colors and reverts to the default color
    /// scheme.
    pub fn cold_start(&mut self) -> Result<(), M, I, W> {
        self.write_command(CMD_COLDSTART)
    }

    /// Selects the coprocessor API level, and remembers it so that it can be
    /// selected again after a reset.
    pub fn use_api_level(&mut self, level: u32) -> Result<(), M, I, W> {
        self.write_command_with_options(CMD_APILEVEL, &[level], None)?;
        self.api_level = Some(level);
        Ok(())
    }

    pub fn fg_color(&mut self, color: RGB) -> Result<(), M, I, W> {
        self.write_command_with_options(CMD_FGCOLOR, &[color.to_raw()], None)
    }

    pub fn bg_color(&mut self, color: RGB) -> Result<(), M, I, W> {
        self.write_command_with_options(CMD_BGCOLOR, &[color.to_raw()], None)
    }

    /// Sets the highlight color used by widgets drawn in 3D style.
    pub fn gradient_color(&mut self, color: RGB) -> Result<(), M, I, W> {
        self.write_command_with_options(CMD_GRADCOLOR, &[color.to_raw()], None)
    }

    /// Registers the font whose metrics block is at `addr` as `handle`,
    /// with glyph images starting at `first_char`.
    pub fn set_font2(&mut self, handle: u8, addr: u32, first_char: u8) -> Result<(), M, I, W> {
        self.write_command_with_options(
            CMD_SETFONT2,
            &[handle as u32, addr, first_char as u32],
            None,
        )
    }

    /// The older form of [`set_font2`](Self::set_font2), for models without
    /// it. The font's glyphs must start at code point zero.
    pub fn set_font(&mut self, handle: u8, addr: u32) -> Result<(), M, I, W> {
        self.write_command_with_options(CMD_SETFONT, &[handle as u32, addr], None)
    }

    /// Draws a single line of text. Line breaks in the message are sent to
    /// the coprocessor as-is, so use
    /// [`draw_multiline_text`](Self::draw_multiline_text) for messages that
    /// might contain them.
    pub fn draw_text<'a, Pos, S>(
        &mut self,
        pos: Pos,
        font: options::FontRef,
        options: options::Text,
        msg: S,
    ) -> Result<(), M, I, W>
    where
        Pos: Into<WidgetPos>,
        S: Into<Message<'a>>,
    {
        let pos: WidgetPos = pos.into();
        self.write_command_with_options(
            CMD_TEXT,
            &[
                CommandWord::from((pos.x, pos.y)).to_raw(),
                CommandWord::from((font.to_raw() as u16, options.to_raw() as u16)).to_raw(),
            ],
            None,
        )?;
        self.write_string(msg)
    }

    /// Draws each line of the message as a separate `CMD_TEXT`, spaced by
    /// `line_height`. When the options center the text vertically, the block
    /// of lines as a whole is centered on `pos`.
    pub fn draw_multiline_text<'a, Pos, S>(
        &mut self,
        pos: Pos,
        font: options::FontRef,
        line_height: u16,
        options: options::Text,
        msg: S,
    ) -> Result<(), M, I, W>
    where
        Pos: Into<WidgetPos>,
        S: Into<Message<'a>>,
    {
        let pos: WidgetPos = pos.into();
        let msg: Message<'a> = msg.into();
        let line_height = line_height as i32;
        let mut y = pos.y as i32;
        if options.is_centered_y() {
            y -= (msg.newline_count() as i32 * line_height) / 2;
        }
        for (i, line) in msg.lines().enumerate() {
            let line_y = y + (i as i32) * line_height;
            let line_y = line_y.max(i16::MIN as i32).min(i16::MAX as i32) as i16;
            self.draw_text((pos.x, line_y), font, options, line)?;
        }
        Ok(())
    }

    pub fn draw_button<'a, Rect, S>(
        &mut self,
        rect: Rect,
        font: options::FontRef,
        options: options::Button,
        msg: S,
    ) -> Result<(), M, I, W>
    where
        Rect: Into<WidgetRect>,
        S: Into<Message<'a>>,
    {
        self.write_widget(CMD_BUTTON, rect.into(), font, options.to_raw())?;
        self.write_string(msg)
    }

    /// Draws a row of keys, one for each character of `keys`. Each key is
    /// tagged with its own character code.
    pub fn draw_keys<'a, Rect, S>(
        &mut self,
        rect: Rect,
        font: options::FontRef,
        options: options::Keys,
        keys: S,
    ) -> Result<(), M, I, W>
    where
        Rect: Into<WidgetRect>,
        S: Into<Message<'a>>,
    {
        self.write_widget(CMD_KEYS, rect.into(), font, options.to_raw())?;
        self.write_string(keys)
    }

    pub fn append_display_list(&mut self, cmd: DLCmd) -> Result<(), M, I, W> {
        self.write_command(cmd.as_raw())
    }

    /// Appends a single word to the command stream.
    pub fn write_command(&mut self, word: u32) -> Result<(), M, I, W> {
        self.write_stream(4, |cp| cp.write_to_buffer(word))
    }

    /// Appends a command word followed by its option words, and then the
    /// given data bytes padded with zeros to a whole number of words.
    ///
    /// The command and its options are written together once there's room
    /// for all of them. The data is written separately in chunks no larger
    /// than the model's limit, waiting for space before each one.
    pub fn write_command_with_options(
        &mut self,
        opcode: u32,
        options: &[u32],
        data: Option<&[u8]>,
    ) -> Result<(), M, I, W> {
        let len = 4 + options.len() * 4;
        if len > Self::space_when_empty() as usize {
            return Err(Error::InvalidArgument);
        }
        self.write_stream(len as u16, |cp| {
            cp.write_to_buffer(opcode)?;
            for word in options {
                cp.write_to_buffer(*word)?;
            }
            Ok(())
        })?;
        if let Some(data) = data {
            self.write_bytes_chunked(data.iter().copied())?;
        }
        Ok(())
    }

    /// Appends the message in the form the built-in fonts expect, with a
    /// null terminator and padding to a whole number of words.
    pub fn write_string<'a, S: Into<Message<'a>>>(&mut self, msg: S) -> Result<(), M, I, W> {
        let msg: Message<'a> = msg.into();
        self.write_bytes_chunked(msg.encoded().chain(core::iter::once(0)))
    }

    /// Blocks until at least `len` bytes (rounded up to a whole number of
    /// words) can be appended to the ring.
    ///
    /// If the chip reports a free space that isn't a multiple of four then
    /// the ring is considered desynchronized: the coprocessor is reset and
    /// the result is [`Error::DeviceReset`](Error::DeviceReset).
    pub fn ensure_space(&mut self, len: u16) -> Result<(), M, I, W> {
        let need = round_up_4(len as usize);
        if need > Self::space_when_empty() as usize {
            return Err(Error::InvalidArgument);
        }
        let need = need as u16;
        if self.known_space >= need {
            return Ok(());
        }

        // The chip can't free space for words it hasn't been told about.
        self.publish()?;
        match self.wait.wait_for_space(&mut self.ll, self.cursor, need) {
            Ok(space) => {
                self.known_space = space;
                Ok(())
            }
            Err(err) => {
                self.known_space = 0;
                Err(match err {
                    WaiterError::Comm(err) => Error::Waiter(err),
                    WaiterError::Timeout => {
                        log::warn!(
                            "timed out waiting for {} bytes of command space on {}",
                            need,
                            M::NAME
                        );
                        Error::Timeout
                    }
                    WaiterError::Unaligned(space) => self.recover_from_desync(space),
                })
            }
        }
    }

    /// Tells the chip about everything written so far, if it doesn't already
    /// know. Does nothing if nothing was written since the last flush.
    pub fn flush(&mut self) -> Result<(), M, I, W> {
        self.publish()
    }

    /// Checks whether the coprocessor has consumed everything written to the
    /// ring, and if so marks the coprocessor as ready for another display
    /// list session.
    pub fn poll_idle(&mut self) -> Result<bool, M, I, W> {
        self.publish()?;
        let space = Self::interface_result(M::read_free_space(&mut self.ll, self.cursor))?;
        if (space % 4) != 0 {
            return Err(self.recover_from_desync(space));
        }
        self.known_space = space;
        if space == Self::space_when_empty() {
            self.ready = true;
        }
        Ok(self.ready)
    }

    /// Marks the coprocessor as ready without checking the ring. This is
    /// for callers that learned of an empty ring some other way, such as
    /// the `CMDEMPTY` interrupt.
    pub fn mark_idle(&mut self) {
        self.ready = true;
    }

    /// True once the coprocessor has been seen to consume everything written
    /// to it, until the next write.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True while the coprocessor is being reset.
    pub fn is_resetting(&self) -> bool {
        self.resetting
    }

    /// Checks whether the coprocessor has stopped because of a fault.
    pub fn check_fault(&mut self) -> Result<bool, M, I, W> {
        if self.resetting {
            return Ok(false);
        }
        let read = Self::interface_result(self.ll.rd16(M::reg_addr(Register::CMD_READ)))?;
        Ok(read & 0xfff == FAULT_READ_POINTER)
    }

    /// Reads the fault message the coprocessor left behind, returning just
    /// the part before the null terminator. Models that don't report fault
    /// messages produce an empty message.
    ///
    /// It's only meaningful to call this after a fault, before resetting.
    pub fn read_fault_message<'b>(
        &mut self,
        into: &'b mut [u8; 128],
    ) -> Result<&'b [u8], M, I, W> {
        let addr = match M::FAULT_MESSAGE_ADDR {
            Some(addr) => addr,
            None => return Ok(&into[..0]),
        };
        Self::interface_result(self.ll.rd8s(addr, &mut into[..]))?;
        let len = into.iter().position(|b| *b == 0).unwrap_or(into.len());
        Ok(&into[..len])
    }

    /// Resets the coprocessor and the host's view of the command ring.
    ///
    /// Everything written but not yet executed is discarded.
    pub fn reset(&mut self) -> Result<(), M, I, W> {
        log::info!("resetting {} coprocessor", M::NAME);
        self.restart()
    }

    /// The byte offset in the ring where the next command word will go.
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// The cursor position the chip was last told about.
    pub fn published_cursor(&self) -> u16 {
        self.published
    }

    /// The free space in an empty ring buffer.
    pub const fn space_when_empty() -> u16 {
        CMD_RING_LEN - 4
    }

    /// Direct access to the chip's memory and registers.
    ///
    /// Everything written to the ring so far has already been sent, but not
    /// necessarily published. Call [`flush`](Self::flush) first if the chip
    /// needs to see it.
    pub fn low_level<'a>(&'a mut self) -> &'a mut LowLevel<M, I> {
        &mut self.ll
    }

    pub fn borrow_interface<'a>(&'a mut self) -> &'a mut I {
        self.ll.borrow_interface()
    }

    pub fn waiter<'a>(&'a mut self) -> &'a mut W {
        &mut self.wait
    }

    /// Consumes the coprocessor object and returns its underlying interface.
    pub fn take_interface(mut self) -> Result<I, M, I, W> {
        self.publish()?;
        Ok(self.ll.take_interface())
    }

    fn restart(&mut self) -> Result<(), M, I, W> {
        self.resetting = true;
        let result = self.restart_inner();
        self.resetting = false;
        result
    }

    fn restart_inner(&mut self) -> Result<(), M, I, W> {
        let ll = &mut self.ll;
        Self::interface_result(ll.wr8(M::reg_addr(Register::CPURESET), 1))?;
        Self::interface_result(ll.wr16(M::reg_addr(Register::CMD_READ), 0))?;
        Self::interface_result(ll.wr16(M::reg_addr(Register::CMD_WRITE), 0))?;
        Self::interface_result(ll.wr16(M::reg_addr(Register::CMD_DL), 0))?;
        Self::interface_result(ll.wr8(M::reg_addr(Register::CPURESET), 0))?;

        self.cursor = 0;
        self.published = 0;
        self.known_space = Self::space_when_empty();
        self.ready = true;

        let id = Self::interface_result(self.ll.rd8(M::reg_addr(Register::ID)))?;
        if id != CHIP_ID {
            log::error!(
                "{} did not respond after coprocessor reset (chip ID {:#04x})",
                M::NAME,
                id
            );
            return Err(Error::ReinitFailed);
        }

        if let Some(level) = self.api_level {
            self.write_stream(8, |cp| {
                cp.write_to_buffer(CMD_APILEVEL)?;
                cp.write_to_buffer(level)
            })?;
            self.publish()?;
        }
        Ok(())
    }

    fn recover_from_desync(&mut self, space: u16) -> Error<I::Error, W::Error> {
        if self.resetting {
            return Error::ReinitFailed;
        }
        log::error!(
            "{} reported {} bytes of command space, resetting coprocessor",
            M::NAME,
            space
        );
        match self.restart() {
            Ok(()) => Error::DeviceReset,
            Err(err) => err,
        }
    }

    fn publish(&mut self) -> Result<(), M, I, W> {
        if self.cursor == self.published {
            return Ok(());
        }
        Self::interface_result(M::publish_cursor(&mut self.ll, self.cursor))?;
        log::trace!("published command cursor {:#05x}", self.cursor);
        self.published = self.cursor;
        Ok(())
    }

    fn begin_stream(&mut self) -> Result<(), M, I, W> {
        let addr = M::command_stream_addr(self.cursor);
        Self::interface_result(self.ll.borrow_interface().begin_write(addr))
    }

    fn end_stream(&mut self) -> Result<(), M, I, W> {
        Self::interface_result(self.ll.borrow_interface().end_write())
    }

    // Waits for `len` bytes of space and then calls `f` inside a single write
    // transaction, which `f` should fill by calling `write_to_buffer`.
    fn write_stream<F: FnOnce(&mut Self) -> Result<(), M, I, W>>(
        &mut self,
        len: u16,
        f: F,
    ) -> Result<(), M, I, W> {
        self.ensure_space(len)?;
        self.begin_stream()?;
        let result = f(self);
        let ended = self.end_stream();
        result?;
        ended
    }

    fn write_to_buffer<V: Into<CommandWord>>(&mut self, v: V) -> Result<(), M, I, W> {
        let word: CommandWord = v.into();
        Self::interface_result(self.ll.borrow_interface().continue_write(&word.to_bytes()))?;
        // Only words that reached the ring may count toward the cursor.
        self.known_space = self.known_space.saturating_sub(4);
        self.cursor = (self.cursor + 4) & (CMD_RING_LEN - 1);
        self.ready = false;

        if M::STREAM_FOLLOWS_CURSOR && self.cursor == 0 {
            // The ring memory doesn't wrap within a single transaction.
            self.end_stream()?;
            self.begin_stream()?;
        }
        Ok(())
    }

    fn write_bytes_chunked<It>(&mut self, bytes: It) -> Result<(), M, I, W>
    where
        It: Iterator<Item = u8> + Clone,
    {
        let mut remain = bytes.clone().count();
        let mut words = command_words_for_bytes(bytes);
        while remain > 0 {
            let chunk = core::cmp::min(remain, M::MAX_DATA_CHUNK as usize);
            let chunk_words = round_up_4(chunk) / 4;
            self.write_stream((chunk_words * 4) as u16, |cp| {
                for word in words.by_ref().take(chunk_words) {
                    cp.write_to_buffer(word)?;
                }
                Ok(())
            })?;
            remain -= chunk;
        }
        Ok(())
    }

    fn write_widget(
        &mut self,
        opcode: u32,
        rect: WidgetRect,
        font: options::FontRef,
        options: u32,
    ) -> Result<(), M, I, W> {
        self.write_command_with_options(
            opcode,
            &[
                CommandWord::from((rect.x, rect.y)).to_raw(),
                CommandWord::from((rect.w, rect.h)).to_raw(),
                CommandWord::from((font.to_raw() as u16, options as u16)).to_raw(),
            ],
            None,
        )
    }

    fn interface_result<T>(result: core::result::Result<T, I::Error>) -> Result<T, M, I, W> {
        match result {
            Ok(v) => Ok(v),
            Err(err) => Err(Error::Interface(err)),
        }
    }
}

impl<M: Model, I: Interface, C: Clock> Coprocessor<M, I, PollingWaiter<C>> {
    /// Consumes the given interface and returns an interface to the
    /// coprocessor via the given interface, which will use busy-polling to
    /// wait when there isn't enough buffer space, giving up after the
    /// configured timeout as measured by `clock`.
    ///
    /// If your platform allows you to detect the EVE coprocessor space
    /// interrupt then you might prefer to call `new` and pass a custom
    /// waiter that can put your main processor to sleep while waiting,
    /// for better power usage compared to the default busy-polling
    /// implementation.
    pub fn new_polling(ei: I, clock: C, config: &Config) -> Result<Self, M, I, PollingWaiter<C>> {
        let w = PollingWaiter::new(clock, config.get_space_timeout_ms());
        Self::new(ei, w, config.get_api_level())
    }
}

impl<M, I, W> crate::display_list::Builder for Coprocessor<M, I, W>
where
    M: Model,
    I: Interface,
    W: Waiter<M, I>,
{
    type Error = Error<I::Error, W::Error>;

    fn append_raw_command(&mut self, raw: u32) -> core::result::Result<(), Self::Error> {
        self.write_command(raw)
    }

    fn append_command(&mut self, cmd: DLCmd) -> core::result::Result<(), Self::Error> {
        self.append_display_list(cmd)
    }
}
