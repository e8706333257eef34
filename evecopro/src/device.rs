//! The top-level driver for one EVE chip.
//!
//! [`Device`](Device) owns the coprocessor along with everything that lives
//! for the length of one display list session: which fonts are associated,
//! which widgets are tagged, and the current drawing color. It also owns the
//! touch dispatch state and the queue of tag events waiting for it.

use crate::clock::Clock;
use crate::commands::options::{self, FontRef};
use crate::commands::waiter::{PollingWaiter, Waiter};
use crate::commands::{Coprocessor, Result};
use crate::config::Config;
use crate::dispatch::{Dispatcher, TagEvent, EVENT_QUEUE_LEN};
use crate::display_list::options::PixelPrecision;
use crate::display_list::DLCmd;
use crate::error::{DeviceErrorCode, Error, ErrorHandler, LogErrors};
use crate::fonts::{FontError, FontTable, RamFont, MAX_RAM_FONT};
use crate::graphics::{WidgetPos, WidgetRect, RGB, RGBA};
use crate::interface::Interface;
use crate::interrupts::{InterruptFlag, Interrupts};
use crate::low_level::Register;
use crate::models::{Model, RAM_G};
use crate::strings::Message;
use crate::tags::{TagRegistry, WidgetArena, WidgetId, UNTAGGED};
use heapless::spsc::Queue;

pub struct Device<M, I, W, H = LogErrors>
where
    M: Model,
    I: Interface,
    W: Waiter<M, I>,
    H: ErrorHandler,
{
    cp: Coprocessor<M, I, W>,
    fonts: FontTable,
    tags: TagRegistry,
    dispatcher: Dispatcher,
    events: Queue<TagEvent, EVENT_QUEUE_LEN>,
    handler: H,

    // Per-session drawing state. `None` means nothing was set yet in this
    // session, so the next color is always emitted.
    color: Option<RGBA>,
    precision: PixelPrecision,

    first_session: bool,
    halted: bool,
    repaint: bool,
    // The tag most recently queued. `None` forces the next sample through.
    last_tag: Option<u8>,
}

impl<M, I, W> Device<M, I, W, LogErrors>
where
    M: Model,
    I: Interface,
    W: Waiter<M, I>,
{
    pub fn new(cp: Coprocessor<M, I, W>, config: &Config) -> Self {
        Self::with_error_handler(cp, config, LogErrors)
    }
}

impl<M, I, C> Device<M, I, PollingWaiter<C>, LogErrors>
where
    M: Model,
    I: Interface,
    C: Clock,
{
    /// Resets the coprocessor behind the given interface and returns a device
    /// that busy-polls when it runs out of command space.
    pub fn new_polling(ei: I, clock: C, config: &Config) -> Result<Self, M, I, PollingWaiter<C>> {
        let cp = Coprocessor::new_polling(ei, clock, config)?;
        Ok(Self::new(cp, config))
    }
}

impl<M, I, W, H> Device<M, I, W, H>
where
    M: Model,
    I: Interface,
    W: Waiter<M, I>,
    H: ErrorHandler,
{
    /// Creates a device that reports desyncs, faults and failed resets to
    /// `handler` as well as to the log.
    pub fn with_error_handler(cp: Coprocessor<M, I, W>, config: &Config, handler: H) -> Self {
        Self {
            cp: cp,
            fonts: FontTable::new(),
            tags: TagRegistry::new(),
            dispatcher: Dispatcher::new(config.get_min_touch_interval_ms()),
            events: Queue::new(),
            handler: handler,
            color: None,
            precision: PixelPrecision::default(),
            first_session: true,
            halted: false,
            repaint: false,
            last_tag: Some(0),
        }
    }

    /// True if a new session may begin: either none has begun yet, or the
    /// coprocessor has finished everything sent in the previous one.
    ///
    /// The coprocessor only notices that it's finished when told so by
    /// [`poll_ready`](Self::poll_ready) or [`service`](Self::service).
    pub fn can_begin_session(&self) -> bool {
        !self.halted && (self.first_session || self.cp.is_ready())
    }

    /// Starts a new display list, cleared to the given color.
    ///
    /// This forgets the previous session's tagged widgets, font
    /// associations, color and pixel precision. The caller is responsible
    /// for checking [`can_begin_session`](Self::can_begin_session) first.
    pub fn begin_session(&mut self, background: RGB) -> Result<(), M, I, W> {
        self.check_halted()?;
        log::debug!("beginning display list session");
        self.forget_session();
        self.first_session = false;
        let result = self.emit_session_start(background);
        self.track(result)
    }

    /// Finishes the display list and asks the chip to show it.
    pub fn end_session(&mut self) -> Result<(), M, I, W> {
        self.check_halted()?;
        log::debug!("ending display list session");
        let result = self.emit_session_end();
        self.track(result)
    }

    /// Draws text, one `CMD_TEXT` per line. Custom fonts are associated with
    /// their handle first if this session hasn't used them yet.
    pub fn text<'a, Pos, S>(
        &mut self,
        pos: Pos,
        font: FontRef,
        options: options::Text,
        msg: S,
    ) -> Result<(), M, I, W>
    where
        Pos: Into<WidgetPos>,
        S: Into<Message<'a>>,
    {
        self.check_halted()?;
        let result = match self.fonts.prepare(&mut self.cp, font) {
            Ok(height) => self.cp.draw_multiline_text(pos, font, height, options, msg),
            Err(err) => Err(err),
        };
        self.track(result)
    }

    /// Draws a button, tagged so that touches reach the widget `id` if one
    /// is given.
    pub fn button<'a, Rect, S>(
        &mut self,
        id: Option<WidgetId>,
        rect: Rect,
        font: FontRef,
        options: options::Button,
        msg: S,
    ) -> Result<(), M, I, W>
    where
        Rect: Into<WidgetRect>,
        S: Into<Message<'a>>,
    {
        self.check_halted()?;
        let result = self.emit_button(id, rect.into(), font, options, msg.into());
        self.track(result)
    }

    /// Draws a row of keys. Each key is tagged with its own character, and
    /// the key codes are sent to the widget `id` if one is given.
    pub fn keys<'a, Rect, S>(
        &mut self,
        id: Option<WidgetId>,
        rect: Rect,
        font: FontRef,
        options: options::Keys,
        keys: S,
    ) -> Result<(), M, I, W>
    where
        Rect: Into<WidgetRect>,
        S: Into<Message<'a>>,
    {
        self.check_halted()?;
        if let Some(id) = id {
            self.tags.set_key_target(id);
        }
        let result = match self.fonts.prepare(&mut self.cp, font) {
            Ok(_) => self.cp.draw_keys(rect, font, options, keys),
            Err(err) => Err(err),
        };
        self.track(result)
    }

    /// Tags everything drawn from now on with a new tag for the given
    /// widget. Returns the tag, or `None` if this session's tags are used up,
    /// in which case nothing is emitted and the drawing stays untagged.
    pub fn tag_widget(&mut self, id: WidgetId) -> Result<Option<u8>, M, I, W> {
        self.check_halted()?;
        let tag = match self.tags.register(id) {
            Some(tag) => tag,
            None => return Ok(None),
        };
        let result = self.cp.append_display_list(DLCmd::tag(tag));
        self.track(result)?;
        Ok(Some(tag))
    }

    /// Stops tagging whatever is drawn next.
    pub fn untag(&mut self) -> Result<(), M, I, W> {
        self.check_halted()?;
        let result = self.cp.append_display_list(DLCmd::tag(UNTAGGED));
        self.track(result)
    }

    /// Sets the color for subsequent drawing, emitting only the parts that
    /// differ from the current color.
    pub fn set_color<C: Into<RGBA>>(&mut self, color: C) -> Result<(), M, I, W> {
        self.check_halted()?;
        let color: RGBA = color.into();
        let result = self.emit_color(color);
        self.track(result)
    }

    /// Selects the unit of vertex coordinates. Models without
    /// `VERTEX_FORMAT` always use 1/16 pixel.
    pub fn set_pixel_precision(&mut self, precision: PixelPrecision) -> Result<(), M, I, W> {
        self.check_halted()?;
        if !M::HAS_VERTEX_FORMAT {
            return match precision {
                PixelPrecision::Sixteenth => Ok(()),
                _ => Err(Error::Unsupported),
            };
        }
        if precision == self.precision {
            return Ok(());
        }
        let result = self.cp.append_display_list(DLCmd::vertex_format(precision));
        self.track(result)?;
        self.precision = precision;
        Ok(())
    }

    pub fn fg_color(&mut self, color: RGB) -> Result<(), M, I, W> {
        self.check_halted()?;
        let result = self.cp.fg_color(color);
        self.track(result)
    }

    pub fn bg_color(&mut self, color: RGB) -> Result<(), M, I, W> {
        self.check_halted()?;
        let result = self.cp.bg_color(color);
        self.track(result)
    }

    pub fn gradient_color(&mut self, color: RGB) -> Result<(), M, I, W> {
        self.check_halted()?;
        let result = self.cp.gradient_color(color);
        self.track(result)
    }

    /// Copies a font blob into main memory at `addr` and makes it available
    /// under `handle`, which must be between zero and 14.
    ///
    /// The blob starts with the 148-byte metrics block. The font is
    /// associated with its handle lazily, the first time each session
    /// draws with it.
    pub fn load_font(&mut self, handle: u8, addr: u32, blob: &[u8], first_char: u8) -> Result<(), M, I, W> {
        self.check_halted()?;
        if handle > MAX_RAM_FONT {
            log::warn!("font handle {} can't hold a custom font", handle);
            return Err(FontError::BadHandle.into());
        }
        if !M::HAS_SETFONT2 && first_char != 0 {
            log::warn!("{} fonts must start at character zero", M::NAME);
            return Err(FontError::NeedsSetFont2.into());
        }
        let font = RamFont::parse(addr, blob, first_char, M::RAM_G_LEN)?;

        let ll = self.cp.low_level();
        if let Err(err) = ll.wr8s(RAM_G + addr, blob) {
            return Err(Error::Interface(err));
        }
        self.fonts.install(handle, font)?;
        log::debug!("loaded font {} ({} bytes at {:#08x})", handle, blob.len(), addr);
        Ok(())
    }

    /// Selects which interrupts the chip raises, and enables its interrupt
    /// output.
    pub fn enable_interrupts(&mut self, mask: Interrupts) -> Result<(), M, I, W> {
        self.check_halted()?;
        let ll = self.cp.low_level();
        let result = ll
            .wr8(M::reg_addr(Register::INT_MASK), mask.to_raw())
            .and_then(|_| ll.wr8(M::reg_addr(Register::INT_EN), if mask.is_empty() { 0 } else { 1 }));
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(Error::Interface(err)),
        }
    }

    /// Handles whatever the chip has flagged since the last call: marks the
    /// coprocessor ready once its ring has drained, queues a tag event when
    /// the touched tag changes, and checks for a coprocessor fault.
    ///
    /// Call this from the driving task, either when the chip's interrupt
    /// line is asserted or periodically. Returns the flags that were read.
    pub fn service(&mut self, now_ms: u64) -> Result<Interrupts, M, I, W> {
        self.check_halted()?;
        let ll = self.cp.low_level();
        let flags = match ll.rd8(M::reg_addr(Register::INT_FLAGS)) {
            Ok(raw) => Interrupts::from_raw(raw),
            Err(err) => return Err(Error::Interface(err)),
        };

        if flags.contains(InterruptFlag::CmdEmpty) {
            self.cp.mark_idle();
        }
        if flags.contains(InterruptFlag::Tag) || flags.contains(InterruptFlag::Touch) {
            let tag = match self.cp.low_level().rd8(M::reg_addr(Register::TOUCH_TAG)) {
                Ok(tag) => tag,
                Err(err) => return Err(Error::Interface(err)),
            };
            if self.last_tag != Some(tag) {
                self.last_tag = Some(tag);
                self.push_tag_event(TagEvent::new(tag, now_ms));
            }
        }

        if self.check_fault()? {
            return Err(Error::Fault);
        }
        Ok(flags)
    }

    /// Checks whether the coprocessor has faulted, reporting the fault
    /// message to the error handler if so.
    ///
    /// A faulted coprocessor stays stopped until [`reset`](Self::reset).
    pub fn check_fault(&mut self) -> Result<bool, M, I, W> {
        if !self.cp.check_fault()? {
            return Ok(false);
        }
        let mut buf = [0_u8; 128];
        let raw = self.cp.read_fault_message(&mut buf)?;
        let msg = core::str::from_utf8(raw).unwrap_or("(unreadable fault message)");
        log::error!("{} coprocessor fault: {}", M::NAME, msg);
        self.handler.on_device_error(DeviceErrorCode::CoprocessorFault, msg);
        Ok(true)
    }

    /// Queues a tag event for the next [`dispatch`](Self::dispatch). This
    /// is for systems where touches are reported by something other than
    /// [`service`](Self::service). Returns `false` if the queue is full and
    /// the event was dropped.
    pub fn push_tag_event(&mut self, event: TagEvent) -> bool {
        match self.events.enqueue(event) {
            Ok(()) => true,
            Err(dropped) => {
                log::warn!("tag event queue full, dropping tag {}", dropped.tag);
                false
            }
        }
    }

    /// Delivers queued tag events to the widgets and fires any deferred
    /// release that has come due. Returns `true` if what's pressed changed,
    /// in which case the screen needs repainting.
    pub fn dispatch<A>(&mut self, widgets: &mut A, now_ms: u64) -> bool
    where
        A: WidgetArena + ?Sized,
    {
        let mut changed = false;
        while let Some(event) = self.events.dequeue() {
            changed |= self.dispatcher.handle(&self.tags, widgets, event);
        }
        changed |= self.dispatcher.poll(widgets, now_ms);
        self.repaint |= changed;
        changed
    }

    /// Tells the touch dispatch that a different screen is now showing.
    /// Queued events belong to the old screen and are discarded, and the
    /// next tag sample is queued even if it repeats the last one, so that a
    /// discarded lift still reaches whatever is pressed.
    pub fn set_screen_changed(&mut self) {
        while self.events.dequeue().is_some() {}
        self.last_tag = None;
        self.dispatcher.set_screen_changed();
    }

    /// Returns whether a repaint was requested since the last call.
    pub fn take_repaint_request(&mut self) -> bool {
        core::mem::replace(&mut self.repaint, false)
    }

    /// Checks with the chip whether the coprocessor has finished everything
    /// written to it.
    pub fn poll_ready(&mut self) -> Result<bool, M, I, W> {
        self.check_halted()?;
        let result = self.cp.poll_idle();
        self.track(result)
    }

    /// Resets the coprocessor, discarding everything in its ring.
    pub fn reset(&mut self) -> Result<(), M, I, W> {
        self.check_halted()?;
        let result = self.cp.reset();
        if result.is_ok() {
            self.forget_session();
        }
        self.track(result)
    }

    /// Tries to bring back a device that was halted after a failed reset.
    pub fn rearm(&mut self) -> Result<(), M, I, W> {
        log::info!("re-arming {}", M::NAME);
        self.halted = false;
        self.reset()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Direct access to the coprocessor, for commands this type doesn't
    /// wrap. Errors returned from it bypass the error handler.
    pub fn coprocessor<'a>(&'a mut self) -> &'a mut Coprocessor<M, I, W> {
        &mut self.cp
    }

    pub fn take_coprocessor(self) -> Coprocessor<M, I, W> {
        self.cp
    }

    fn check_halted(&self) -> Result<(), M, I, W> {
        if self.halted {
            Err(Error::Halted)
        } else {
            Ok(())
        }
    }

    fn forget_session(&mut self) {
        self.fonts.forget_associations();
        self.tags.clear();
        self.color = None;
        self.precision = PixelPrecision::default();
    }

    // Notices the errors that change the device's own state, and reports
    // them to the error handler.
    fn track<T>(&mut self, result: Result<T, M, I, W>) -> Result<T, M, I, W> {
        match &result {
            Err(Error::DeviceReset) => {
                self.forget_session();
                self.handler
                    .on_device_error(DeviceErrorCode::Desync, "command ring desynchronized, coprocessor reset");
            }
            Err(Error::ReinitFailed) => {
                log::error!("{} stopped responding, halting until re-armed", M::NAME);
                self.halted = true;
                self.handler
                    .on_device_error(DeviceErrorCode::ReinitFailed, "chip did not respond after reset");
            }
            _ => {}
        }
        result
    }

    fn emit_session_start(&mut self, background: RGB) -> Result<(), M, I, W> {
        self.cp.start_display_list()?;
        self.cp.append_display_list(DLCmd::clear_color_rgb(background))?;
        self.cp.append_display_list(DLCmd::clear(true, true, true))?;
        self.cp.cold_start()
    }

    fn emit_session_end(&mut self) -> Result<(), M, I, W> {
        self.cp.append_display_list(DLCmd::DISPLAY)?;
        self.cp.display_list_swap()?;
        self.cp.flush()
    }

    fn emit_button(
        &mut self,
        id: Option<WidgetId>,
        rect: WidgetRect,
        font: FontRef,
        options: options::Button,
        msg: Message<'_>,
    ) -> Result<(), M, I, W> {
        self.fonts.prepare(&mut self.cp, font)?;
        let tag = id.and_then(|id| self.tags.register(id));
        if let Some(tag) = tag {
            self.cp.append_display_list(DLCmd::tag(tag))?;
        }
        self.cp.draw_button(rect, font, options, msg)?;
        if tag.is_some() {
            self.cp.append_display_list(DLCmd::tag(UNTAGGED))?;
        }
        Ok(())
    }

    fn emit_color(&mut self, color: RGBA) -> Result<(), M, I, W> {
        let current = self.color;
        if current.map(|c| c.as_rgb()) != Some(color.as_rgb()) {
            self.cp.append_display_list(DLCmd::color_rgb(color.as_rgb()))?;
        }
        if current.map(|c| c.a) != Some(color.a) {
            self.cp.append_display_list(DLCmd::color_alpha(color.a))?;
        }
        self.color = Some(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::commands::coprocessor::{
        CMD_BUTTON, CMD_COLDSTART, CMD_DLSTART, CMD_KEYS, CMD_SETFONT2, CMD_SWAP, CMD_TEXT,
    };
    use crate::interface::testing::{FakeChip, StepClock};
    use crate::models::{Ft80x, Ft81x};
    use crate::tags::Pressable;
    use options::Options;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::string::{String, ToString};
    use std::vec::Vec;

    type Reports = Rc<RefCell<Vec<(DeviceErrorCode, String)>>>;

    fn test_device<M: Model>() -> Device<M, FakeChip<M>, PollingWaiter<StepClock>> {
        let config = Config::new();
        let mut dev = Device::new_polling(FakeChip::new(), StepClock::new(10), &config).unwrap();
        dev.coprocessor().borrow_interface().clear_calls();
        dev
    }

    fn reporting_device(
        reports: &Reports,
    ) -> Device<Ft81x, FakeChip<Ft81x>, PollingWaiter<StepClock>, impl ErrorHandler> {
        let config = Config::new();
        let cp = Coprocessor::new_polling(FakeChip::new(), StepClock::new(10), &config).unwrap();
        let reports = reports.clone();
        let handler = move |code: DeviceErrorCode, msg: &str| {
            reports.borrow_mut().push((code, msg.to_string()));
        };
        let mut dev = Device::with_error_handler(cp, &config, handler);
        dev.coprocessor().borrow_interface().clear_calls();
        dev
    }

    fn words<M: Model, W: Waiter<M, FakeChip<M>>, H: ErrorHandler>(
        dev: &mut Device<M, FakeChip<M>, W, H>,
    ) -> Vec<u32> {
        let ei = dev.coprocessor().borrow_interface();
        let ret = ei.cmd_words();
        ei.clear_calls();
        ret
    }

    fn font_blob(height: u32) -> Vec<u8> {
        let mut blob = std::vec![0_u8; 200];
        blob[128..132].copy_from_slice(&2_u32.to_le_bytes());
        blob[132..136].copy_from_slice(&9_u32.to_le_bytes());
        blob[136..140].copy_from_slice(&18_u32.to_le_bytes());
        blob[140..144].copy_from_slice(&height.to_le_bytes());
        blob
    }

    struct Counter {
        presses: u32,
        releases: u32,
    }

    impl Pressable for Counter {
        fn on_press(&mut self) {
            self.presses += 1;
        }

        fn on_release(&mut self) {
            self.releases += 1;
        }
    }

    #[test]
    fn test_session() {
        let mut dev = test_device::<Ft81x>();
        assert!(dev.can_begin_session());
        dev.begin_session(RGB::new(0x10, 0x20, 0x30)).unwrap();
        assert_eq!(
            words(&mut dev),
            [CMD_DLSTART, 0x02102030, 0x26000007, CMD_COLDSTART]
        );

        dev.end_session().unwrap();
        assert_eq!(words(&mut dev), [0x00000000, CMD_SWAP]);
        assert!(!dev.can_begin_session());

        assert!(dev.poll_ready().unwrap());
        assert!(dev.can_begin_session());
    }

    #[test]
    fn test_gen1_session_end_publishes() {
        let mut dev = test_device::<Ft80x>();
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        dev.end_session().unwrap();
        let ei = dev.coprocessor().borrow_interface();
        assert_eq!(ei.writes_to(Register::CMD_WRITE), [std::vec![24_u8, 0]]);
    }

    #[test]
    fn test_text_with_rom_font() {
        let mut dev = test_device::<Ft81x>();
        dev.text(
            (0_i16, 100_i16),
            FontRef::new_raw(28),
            options::Text::new().center_y(),
            "a\nb",
        )
        .unwrap();
        let got = words(&mut dev);
        assert_eq!(got.len(), 8);
        assert_eq!(got[0], CMD_TEXT);
        assert_eq!(got[1], 88 << 16);
        assert_eq!(got[5], 113 << 16);
    }

    #[test]
    fn test_text_with_ram_font() {
        let mut dev = test_device::<Ft81x>();
        let blob = font_blob(20);
        dev.load_font(2, 0x2000, &blob, 32).unwrap();
        assert_eq!(dev.coprocessor().borrow_interface().mem(0x2000, 200), blob);
        assert_eq!(dev.fonts().height(FontRef::new_raw(2)), Some(20));

        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        words(&mut dev);
        let font = FontRef::new_raw(2);
        dev.text((0_i16, 0_i16), font, options::Text::new(), "x").unwrap();
        dev.text((0_i16, 20_i16), font, options::Text::new(), "y").unwrap();
        let got = words(&mut dev);
        assert_eq!(got[..8], [0x05000002, 0x01002080, 0x07101214, 0x08002414, CMD_SETFONT2, 2, 0x2000, 32]);
        assert_eq!(got[8], CMD_TEXT);
        assert_eq!(got.len(), 8 + 4 + 4);

        // The next session associates the font again.
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        words(&mut dev);
        dev.text((0_i16, 0_i16), font, options::Text::new(), "x").unwrap();
        assert_eq!(words(&mut dev)[0], 0x05000002);
    }

    #[test]
    fn test_text_with_unloaded_font() {
        let mut dev = test_device::<Ft81x>();
        match dev.text((0_i16, 0_i16), FontRef::new_raw(3), options::Text::new(), "x") {
            Err(Error::InvalidArgument) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(words(&mut dev).is_empty());
    }

    #[test]
    fn test_load_font_errors() {
        let mut dev = test_device::<Ft81x>();
        let blob = font_blob(20);
        match dev.load_font(15, 0, &blob, 0) {
            Err(Error::InvalidArgument) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match dev.load_font(0, 1024 * 1024 - 100, &blob, 0) {
            Err(Error::OutOfMemory) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match dev.load_font(0, 0, &blob[..100], 0) {
            Err(Error::InvalidArgument) => {}
            other => panic!("unexpected result {:?}", other),
        }

        let mut dev = test_device::<Ft80x>();
        match dev.load_font(0, 0, &blob, 32) {
            Err(Error::Unsupported) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_tagged_buttons() {
        let mut dev = test_device::<Ft81x>();
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        words(&mut dev);
        let font = FontRef::new_raw(27);
        dev.button(Some(WidgetId(0)), WidgetRect::new(0, 0, 10, 10), font, options::Button::new(), "A")
            .unwrap();
        let got = words(&mut dev);
        assert_eq!(got[0], 0x03000081);
        assert_eq!(got[1], CMD_BUTTON);
        assert_eq!(got[got.len() - 1], 0x030000ff);

        dev.button(None, WidgetRect::new(0, 0, 10, 10), font, options::Button::new(), "B")
            .unwrap();
        assert_eq!(words(&mut dev)[0], CMD_BUTTON);

        for i in 1..32 {
            dev.tag_widget(WidgetId(i)).unwrap();
        }
        words(&mut dev);
        dev.button(Some(WidgetId(32)), WidgetRect::new(0, 0, 10, 10), font, options::Button::new(), "C")
            .unwrap();
        let got = words(&mut dev);
        assert_eq!(got[0], CMD_BUTTON);
        assert_eq!(got.len(), 5);
    }

    #[test]
    fn test_keys() {
        let mut dev = test_device::<Ft81x>();
        dev.keys(Some(WidgetId(4)), WidgetRect::new(0, 0, 100, 20), FontRef::new_raw(26), options::Keys::new(), "ab")
            .unwrap();
        assert_eq!(words(&mut dev)[0], CMD_KEYS);
        assert_eq!(dev.tags().key_target(), Some(WidgetId(4)));
    }

    #[test]
    fn test_color_cache() {
        let mut dev = test_device::<Ft81x>();
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        words(&mut dev);
        dev.set_color(RGB::new(1, 2, 3)).unwrap();
        dev.set_color(RGB::new(1, 2, 3)).unwrap();
        assert_eq!(words(&mut dev), [0x04010203, 0x100000ff]);

        dev.set_color(RGBA::new(1, 2, 3, 0x80)).unwrap();
        assert_eq!(words(&mut dev), [0x10000080]);

        dev.set_color(RGBA::new(4, 5, 6, 0x80)).unwrap();
        assert_eq!(words(&mut dev), [0x04040506]);

        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        words(&mut dev);
        dev.set_color(RGBA::new(4, 5, 6, 0x80)).unwrap();
        assert_eq!(words(&mut dev), [0x04040506, 0x10000080]);
    }

    #[test]
    fn test_pixel_precision() {
        let mut dev = test_device::<Ft81x>();
        dev.set_pixel_precision(PixelPrecision::Sixteenth).unwrap();
        assert!(words(&mut dev).is_empty());
        dev.set_pixel_precision(PixelPrecision::Whole).unwrap();
        assert_eq!(words(&mut dev), [0x27000000]);

        let mut dev = test_device::<Ft80x>();
        dev.set_pixel_precision(PixelPrecision::Sixteenth).unwrap();
        match dev.set_pixel_precision(PixelPrecision::Whole) {
            Err(Error::Unsupported) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(words(&mut dev).is_empty());
    }

    #[test]
    fn test_service_and_dispatch() {
        let mut dev = test_device::<Ft81x>();
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        dev.button(Some(WidgetId(0)), WidgetRect::new(0, 0, 10, 10), FontRef::new_raw(27), options::Button::new(), "A")
            .unwrap();
        dev.end_session().unwrap();
        assert!(!dev.can_begin_session());

        let flags = InterruptFlag::Tag as u32 | InterruptFlag::CmdEmpty as u32;
        {
            let ei = dev.coprocessor().borrow_interface();
            ei.set_reg(Register::INT_FLAGS, flags);
            ei.set_reg(Register::TOUCH_TAG, 129);
        }
        let got = dev.service(1000).unwrap();
        assert!(got.contains(InterruptFlag::CmdEmpty));
        assert!(dev.can_begin_session());

        // The tag hasn't changed, so no second event is queued.
        dev.service(1010).unwrap();

        let mut widgets = [Counter {
            presses: 0,
            releases: 0,
        }];
        assert!(dev.dispatch(&mut widgets[..], 1020));
        assert_eq!(widgets[0].presses, 1);
        assert!(dev.take_repaint_request());
        assert!(!dev.take_repaint_request());

        dev.coprocessor()
            .borrow_interface()
            .set_reg(Register::TOUCH_TAG, 0);
        dev.service(2000).unwrap();
        assert!(dev.dispatch(&mut widgets[..], 2000));
        assert_eq!(widgets[0].releases, 1);
    }

    #[test]
    fn test_event_queue_overflow() {
        let mut dev = test_device::<Ft81x>();
        let accepted = (0..EVENT_QUEUE_LEN as u64 + 1)
            .filter(|i| dev.push_tag_event(TagEvent::new(129, *i)))
            .count();
        assert!(accepted < EVENT_QUEUE_LEN + 1);
        assert!(!dev.push_tag_event(TagEvent::new(0, 100)));
    }

    #[test]
    fn test_screen_change_discards_queued_events() {
        let mut dev = test_device::<Ft81x>();
        dev.tag_widget(WidgetId(0)).unwrap();
        dev.push_tag_event(TagEvent::new(129, 0));
        dev.set_screen_changed();
        let mut widgets = [Counter {
            presses: 0,
            releases: 0,
        }];
        assert!(!dev.dispatch(&mut widgets[..], 10));
        assert_eq!(widgets[0].presses, 0);
    }

    #[test]
    fn test_lift_discarded_by_screen_change_still_releases() {
        let mut dev = test_device::<Ft81x>();
        dev.tag_widget(WidgetId(0)).unwrap();
        let mut widgets = [Counter {
            presses: 0,
            releases: 0,
        }];
        {
            let ei = dev.coprocessor().borrow_interface();
            ei.set_reg(Register::INT_FLAGS, InterruptFlag::Tag as u32);
            ei.set_reg(Register::TOUCH_TAG, 129);
        }
        dev.service(1000).unwrap();
        assert!(dev.dispatch(&mut widgets[..], 1000));
        assert_eq!(widgets[0].presses, 1);

        // The press switches screens before the queued lift is dispatched.
        dev.coprocessor()
            .borrow_interface()
            .set_reg(Register::TOUCH_TAG, 0);
        dev.service(1200).unwrap();
        dev.set_screen_changed();
        assert!(!dev.dispatch(&mut widgets[..], 1300));
        assert_eq!(widgets[0].releases, 0);

        dev.service(1400).unwrap();
        assert!(dev.dispatch(&mut widgets[..], 1400));
        assert_eq!(widgets[0].releases, 1);
    }

    #[test]
    fn test_desync_is_reported() {
        let reports: Reports = Rc::new(RefCell::new(Vec::new()));
        let mut dev = reporting_device(&reports);
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
        dev.tag_widget(WidgetId(0)).unwrap();
        dev.coprocessor()
            .borrow_interface()
            .script_reads(Ft81x::REG_CMDB_SPACE, &[4090]);
        match dev.poll_ready() {
            Err(Error::DeviceReset) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(dev.tags().is_empty());
        assert_eq!(reports.borrow().len(), 1);
        assert_eq!(reports.borrow()[0].0, DeviceErrorCode::Desync);
        assert!(!dev.is_halted());
        assert!(dev.can_begin_session());
    }

    #[test]
    fn test_failed_reset_halts() {
        let reports: Reports = Rc::new(RefCell::new(Vec::new()));
        let mut dev = reporting_device(&reports);
        dev.coprocessor()
            .borrow_interface()
            .script_reads(0x302000, &[0]);
        match dev.reset() {
            Err(Error::ReinitFailed) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(dev.is_halted());
        assert!(!dev.can_begin_session());
        match dev.begin_session(RGB::new(0, 0, 0)) {
            Err(Error::Halted) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(reports.borrow()[0].0, DeviceErrorCode::ReinitFailed);

        dev.rearm().unwrap();
        assert!(!dev.is_halted());
        dev.begin_session(RGB::new(0, 0, 0)).unwrap();
    }

    #[test]
    fn test_fault_is_reported() {
        let reports: Reports = Rc::new(RefCell::new(Vec::new()));
        let mut dev = reporting_device(&reports);
        {
            let ei = dev.coprocessor().borrow_interface();
            ei.drain = false;
            ei.set_reg(Register::CMD_READ, 0xfff);
            ei.set_mem(0x309800, b"display list overflow\0");
        }
        match dev.service(0) {
            Err(Error::Fault) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(
            reports.borrow()[0],
            (DeviceErrorCode::CoprocessorFault, "display list overflow".to_string())
        );
    }

    #[test]
    fn test_enable_interrupts() {
        let mut dev = test_device::<Ft81x>();
        dev.enable_interrupts(Interrupts::SERVICED).unwrap();
        let ei = dev.coprocessor().borrow_interface();
        assert_eq!(ei.writes_to(Register::INT_MASK), [std::vec![0x26_u8]]);
        assert_eq!(ei.writes_to(Register::INT_EN), [std::vec![1_u8]]);
    }
}
